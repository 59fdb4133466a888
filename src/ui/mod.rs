pub mod chrome;
pub mod controls;
pub mod menu;
pub mod online;
