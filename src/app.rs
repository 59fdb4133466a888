use std::path::PathBuf;
use std::time::{Duration, Instant};

use egui::{CentralPanel, Color32, CursorIcon, Key, TopBottomPanel, Vec2, ViewportCommand};
use isla_player::aspect::{compute_size, AspectMode, FittedSize};
use isla_player::config::{AppConfig, LinkConfig};
use isla_player::ui::chrome::{AutoHide, Splash};
use isla_player::ui::controls::ControlsAction;
use isla_player::ui::menu::{MenuAction, MenuBar};
use isla_player::ui::online::{OnlineAction, OnlinePanel};
use isla_player::{
    FfmpegEngine, HistoryFile, HistoryTracker, PlayerControls, PlayerError, PlayerShell,
    ShellSettings, View,
};

const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "avi"];
const LEGAL_NOTICE: &str = "The authors are not responsible for third-party content \
                            reached through this player.";

struct Notice {
    title: &'static str,
    body: String,
}

pub struct VideoPlayerApp {
    shell: Option<PlayerShell<FfmpegEngine>>,
    aspect: AspectMode,
    chrome: AutoHide,
    splash: Splash,
    online: OnlinePanel,
    links: Vec<LinkConfig>,
    notice: Option<Notice>,
    error_message: Option<String>,
    shut_down: bool,
}

impl VideoPlayerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let now = Instant::now();
        let history = HistoryTracker::load(HistoryFile::new(config.history_path()));

        let mut error_message = None;
        let shell = match FfmpegEngine::new(cc.egui_ctx.clone()) {
            Ok(engine) => Some(PlayerShell::new(
                engine,
                history,
                ShellSettings::from_config(&config),
            )),
            Err(e) => {
                tracing::error!("Playback disabled: {e}");
                error_message = Some(e.to_string());
                None
            }
        };

        Self {
            shell,
            aspect: config.playback.default_aspect,
            chrome: AutoHide::new(
                Duration::from_millis(config.interface.hide_controls_after_ms),
                now,
            ),
            splash: Splash::new(Duration::from_millis(config.interface.splash_ms), now),
            online: OnlinePanel::new(config.online.home_url.clone()),
            links: config.links,
            notice: None,
            error_message,
            shut_down: false,
        }
    }

    fn open_file(&mut self, now: Instant) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video Files", &VIDEO_EXTENSIONS)
            .pick_file()
        {
            self.load_video(path, now);
        }
    }

    fn load_video(&mut self, path: PathBuf, now: Instant) {
        let Some(shell) = self.shell.as_mut() else {
            return;
        };
        let result = shell.play_file(&path, 0, now);
        self.report(result);
    }

    fn report(&mut self, result: Result<(), PlayerError>) {
        match result {
            Ok(()) => self.error_message = None,
            // The file vanished since it was picked; nothing to show.
            Err(PlayerError::NotFound(path)) => {
                tracing::info!(path = %path.display(), "Media not found");
            }
            Err(e) => {
                tracing::warn!("{e}");
                self.error_message = Some(e.to_string());
            }
        }
    }

    fn handle_menu(&mut self, ctx: &egui::Context, action: MenuAction, now: Instant) {
        match action {
            MenuAction::Open => self.open_file(now),
            MenuAction::Resume(index) => {
                if let Some(shell) = self.shell.as_mut() {
                    let result = shell.open_from_history(index, now);
                    self.report(result);
                }
            }
            MenuAction::Online => {
                if let Some(shell) = self.shell.as_mut() {
                    shell.open_online();
                }
            }
            MenuAction::OpenLink(url) => ctx.open_url(egui::OpenUrl::new_tab(url)),
            MenuAction::About => {
                self.notice = Some(Notice {
                    title: "About",
                    body: format!("Isla Player {}", env!("CARGO_PKG_VERSION")),
                })
            }
            MenuAction::Legal => {
                self.notice = Some(Notice {
                    title: "Legal notice",
                    body: LEGAL_NOTICE.to_owned(),
                })
            }
            MenuAction::Exit => ctx.send_viewport_cmd(ViewportCommand::Close),
        }
    }

    fn toggle_fullscreen(ctx: &egui::Context) {
        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        ctx.send_viewport_cmd(ViewportCommand::Fullscreen(!fullscreen));
    }

    fn show_video(&mut self, ui: &mut egui::Ui, now: Instant) {
        let Some(shell) = self.shell.as_mut() else {
            return;
        };

        if shell.view() == View::Online {
            if self.online.show(ui) == OnlineAction::Close {
                shell.close_online();
            }
            return;
        }

        let engine = shell.engine();
        if let (Some(texture), Some(native)) = (engine.texture(), engine.video_size()) {
            if let Some(size) = display_size(ui.available_size(), native, self.aspect) {
                let texture_id = texture.id();
                let mut toggle = false;
                ui.centered_and_justified(|ui| {
                    toggle = ui.image((texture_id, size)).double_clicked();
                });
                if toggle {
                    Self::toggle_fullscreen(ui.ctx());
                }
            }
            return;
        }

        // No video loaded: drop zone and open button.
        let mut open = false;
        ui.centered_and_justified(|ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                if let Some(err) = &self.error_message {
                    ui.colored_label(Color32::RED, err.as_str());
                    ui.add_space(20.0);
                }
                ui.heading("No video loaded");
                ui.add_space(10.0);
                open = ui.button("Open Video File...").clicked();
                ui.add_space(10.0);
                ui.label("Or drag and drop a video file");
            });
        });
        if open {
            self.open_file(now);
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };
        let mut open = true;
        let mut dismissed = false;
        egui::Window::new(notice.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(notice.body.as_str());
                ui.add_space(8.0);
                dismissed = ui.button("OK").clicked();
            });
        if !open || dismissed {
            self.notice = None;
        }
    }

    fn show_splash(&self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("splash"))
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.add_space(24.0);
                    ui.heading("Isla Player");
                    ui.add_space(24.0);
                });
            });
    }

    /// Wake up for the next timer even when nothing else repaints.
    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let next = [
            self.shell.as_ref().and_then(|s| s.next_poll_in(now)),
            self.chrome.remaining(now),
            self.splash.remaining(now),
        ]
        .into_iter()
        .flatten()
        .min();
        if let Some(delay) = next {
            ctx.request_repaint_after(delay);
        }
    }
}

/// On-screen size of the video for the chosen aspect mode, or `None` when
/// there is no room to draw. Without a forced ratio the frame keeps its
/// native proportions.
fn display_size(available: Vec2, native: (u32, u32), mode: AspectMode) -> Option<Vec2> {
    let mode = match mode {
        AspectMode::Fit => AspectMode::ratio(native.0, native.1).unwrap_or(AspectMode::Fit),
        fixed => fixed,
    };
    let fitted = compute_size(available.x, available.y, mode);
    if fitted.is_empty() {
        return None;
    }
    match fitted {
        FittedSize::Unconstrained => Some(available),
        FittedSize::Sized { width, height } => Some(Vec2::new(width, height)),
    }
}

impl eframe::App for VideoPlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if ctx.input(|i| i.viewport().close_requested()) && !self.shut_down {
            if let Some(shell) = self.shell.as_mut() {
                shell.shutdown();
            }
            self.shut_down = true;
        }

        let (space, f11, pointer_moved, dropped) = ctx.input(|i| {
            (
                i.key_pressed(Key::Space),
                i.key_pressed(Key::F11),
                i.pointer.delta() != Vec2::ZERO,
                i.raw
                    .dropped_files
                    .iter()
                    .filter_map(|f| f.path.clone())
                    .collect::<Vec<_>>(),
            )
        });
        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));

        if pointer_moved {
            self.chrome.on_activity(now);
        }
        self.chrome.tick(now);

        if f11 {
            Self::toggle_fullscreen(ctx);
        }

        if let Some(shell) = self.shell.as_mut() {
            if space && !ctx.wants_keyboard_input() {
                shell.toggle_play_pause(now);
            }
            if !dropped.is_empty() {
                let result = shell.open_dropped(dropped, now);
                self.report(result);
            }
        }

        if let Some(shell) = self.shell.as_mut() {
            shell.engine_mut().update();
            shell.tick(now);
        }

        let controls_visible = self.chrome.controls_visible(fullscreen);

        if controls_visible {
            let history = self
                .shell
                .as_ref()
                .map(|s| s.history().to_vec())
                .unwrap_or_default();
            let action = TopBottomPanel::top("menu_bar")
                .show(ctx, |ui| MenuBar::show(ui, &history, &self.links))
                .inner;
            if let Some(action) = action {
                self.handle_menu(ctx, action, now);
            }

            let mut toggle_fullscreen = false;
            if let Some(shell) = self.shell.as_mut() {
                if shell.current().is_some() {
                    TopBottomPanel::bottom("controls").show(ctx, |ui| {
                        let action = PlayerControls::show(ui, shell, &mut self.aspect, now);
                        toggle_fullscreen = action == ControlsAction::ToggleFullscreen;
                    });
                }
            }
            if toggle_fullscreen {
                Self::toggle_fullscreen(ctx);
            }
        } else {
            ctx.set_cursor_icon(CursorIcon::None);
        }

        CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                if self.shell.is_some() {
                    self.show_video(ui, now);
                } else if let Some(err) = &self.error_message {
                    ui.centered_and_justified(|ui| {
                        ui.colored_label(Color32::RED, err.as_str());
                    });
                }
            });

        self.show_notice(ctx);
        if self.splash.is_visible(now) {
            self.show_splash(ctx);
        }

        self.schedule_repaint(ctx, now);
    }
}
