use egui::{Color32, Ui};

use crate::error::PlayerError;

/// Panel shown in place of the video for online content.
///
/// No web runtime ships with this build, so the page cannot be embedded. The
/// panel says so and offers to open the page in the system browser instead.
pub struct OnlinePanel {
    home_url: String,
    runtime: Result<(), PlayerError>,
}

fn embedded_runtime() -> Result<(), PlayerError> {
    Err(PlayerError::EngineUnavailable {
        component: "embedded browser",
        reason: "no web runtime is bundled with this build".into(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineAction {
    None,
    Close,
}

impl OnlinePanel {
    pub fn new(home_url: impl Into<String>) -> Self {
        let runtime = embedded_runtime();
        if let Err(e) = &runtime {
            tracing::warn!("{e}");
        }
        Self {
            home_url: home_url.into(),
            runtime,
        }
    }

    pub fn show(&self, ui: &mut Ui) -> OnlineAction {
        let mut action = OnlineAction::None;

        ui.horizontal(|ui| {
            if ui.button("✖ Back to video").clicked() {
                action = OnlineAction::Close;
            }
            ui.separator();
            ui.monospace(self.home_url.as_str());
        });
        ui.separator();

        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            if let Err(e) = &self.runtime {
                ui.colored_label(Color32::YELLOW, e.to_string());
                ui.add_space(10.0);
            }
            if ui.button("Open in system browser").clicked() {
                ui.ctx().open_url(egui::OpenUrl::new_tab(&self.home_url));
            }
        });

        action
    }
}
