use std::time::Instant;

use egui::{Slider, Ui};

use crate::aspect::{AspectMode, PRESETS};
use crate::engine::PlaybackEngine;
use crate::shell::PlayerShell;

/// Transport bar: buttons, seek bar, time, volume, aspect and fullscreen.
pub struct PlayerControls;

/// Requests the controls cannot carry out on the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlsAction {
    None,
    ToggleFullscreen,
}

impl PlayerControls {
    pub fn show<E: PlaybackEngine>(
        ui: &mut Ui,
        shell: &mut PlayerShell<E>,
        aspect: &mut AspectMode,
        now: Instant,
    ) -> ControlsAction {
        let mut action = ControlsAction::None;

        ui.horizontal(|ui| {
            if ui.button("⏪").on_hover_text("Back 10 s").clicked() {
                shell.rewind();
            }

            let play_pause = if shell.is_playing() { "⏸" } else { "▶" };
            if ui.button(play_pause).on_hover_text("Play/Pause (Space)").clicked() {
                shell.toggle_play_pause(now);
            }

            if ui.button("⏹").clicked() {
                shell.stop();
            }

            if ui.button("⏩").on_hover_text("Forward 10 s").clicked() {
                shell.forward();
            }

            ui.separator();

            let progress = shell.progress().unwrap_or_default();
            let total_secs = progress.total_ms as f64 / 1000.0;
            let elapsed_secs = progress.elapsed_ms as f64 / 1000.0;

            // Keep the dragged value in memory so polling doesn't yank the knob.
            let slider_id = ui.id().with("seek_slider");
            let mut position =
                ui.memory(|mem| mem.data.get_temp::<f64>(slider_id).unwrap_or(elapsed_secs));

            let response = ui.add(
                Slider::new(&mut position, 0.0..=total_secs)
                    .show_value(false)
                    .trailing_fill(true),
            );

            if response.dragged() {
                ui.memory_mut(|mem| mem.data.insert_temp(slider_id, position));
            } else {
                ui.memory_mut(|mem| mem.data.insert_temp(slider_id, elapsed_secs));
            }

            if response.drag_stopped() || response.clicked() {
                shell.seek_to((position * 1000.0) as u64);
            }

            ui.label(format!(
                "{} / {}",
                format_time(progress.elapsed_ms),
                format_time(progress.total_ms)
            ));

            ui.separator();

            ui.label("🔊");
            let mut volume = shell.volume_percent();
            if ui
                .add(Slider::new(&mut volume, 0..=100).show_value(false))
                .changed()
            {
                shell.set_volume_percent(volume);
            }

            ui.separator();

            ui.menu_button(format!("▭ {}", aspect_label(*aspect)), |ui| {
                for preset in PRESETS {
                    if ui
                        .selectable_label(*aspect == preset, aspect_label(preset))
                        .clicked()
                    {
                        *aspect = preset;
                        ui.close_menu();
                    }
                }
            });

            if ui.button("⛶").on_hover_text("Fullscreen (F11)").clicked() {
                action = ControlsAction::ToggleFullscreen;
            }
        });

        action
    }
}

fn aspect_label(mode: AspectMode) -> String {
    match mode {
        AspectMode::Fit => "Fit".to_owned(),
        ratio => ratio.to_string(),
    }
}

/// `mm:ss`, or `hh:mm:ss` from one hour on.
pub fn format_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
