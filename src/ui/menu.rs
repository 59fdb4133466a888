use egui::Ui;

use crate::config::LinkConfig;
use crate::history::HistoryEntry;

/// What the user picked from the menu bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Open,
    /// Index into the history list.
    Resume(usize),
    Online,
    OpenLink(String),
    About,
    Legal,
    Exit,
}

pub struct MenuBar;

impl MenuBar {
    pub fn show(ui: &mut Ui, history: &[HistoryEntry], links: &[LinkConfig]) -> Option<MenuAction> {
        let mut action = None;

        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open...").clicked() {
                    action = Some(MenuAction::Open);
                    ui.close_menu();
                }

                ui.menu_button("Recent", |ui| {
                    if let Some(index) = history_items(ui, history) {
                        action = Some(MenuAction::Resume(index));
                        ui.close_menu();
                    }
                });

                ui.separator();
                if ui.button("Exit").clicked() {
                    action = Some(MenuAction::Exit);
                    ui.close_menu();
                }
            });

            if ui.button("Online").clicked() {
                action = Some(MenuAction::Online);
            }

            if !links.is_empty() {
                ui.menu_button("Links", |ui| {
                    for link in links {
                        if ui
                            .button(link.label.as_str())
                            .on_hover_text(link.url.as_str())
                            .clicked()
                        {
                            action = Some(MenuAction::OpenLink(link.url.clone()));
                            ui.close_menu();
                        }
                    }
                });
            }

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    action = Some(MenuAction::About);
                    ui.close_menu();
                }
                if ui.button("Legal notice").clicked() {
                    action = Some(MenuAction::Legal);
                    ui.close_menu();
                }
            });
        });

        action
    }
}

/// One button per history entry, most recent first.
fn history_items(ui: &mut Ui, history: &[HistoryEntry]) -> Option<usize> {
    if history.is_empty() {
        ui.label("No recent files");
        return None;
    }

    let mut picked = None;
    for (index, entry) in history.iter().enumerate() {
        if ui.button(entry.label()).on_hover_text(entry.path.as_str()).clicked() {
            picked = Some(index);
        }
    }
    picked
}
