pub mod aspect;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod player;
pub mod poller;
pub mod shell;
pub mod timer;
pub mod ui;

pub use aspect::{compute_size, AspectMode, FittedSize};
pub use config::AppConfig;
pub use engine::PlaybackEngine;
pub use error::PlayerError;
pub use history::{HistoryEntry, HistoryFile, HistoryTracker, MAX_HISTORY};
pub use player::FfmpegEngine;
pub use poller::{PositionPoller, Progress};
pub use shell::{PlayerShell, ShellSettings, View};
pub use ui::controls::PlayerControls;
