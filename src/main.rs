mod app;

use app::VideoPlayerApp;
use eframe::NativeOptions;
use isla_player::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("isla_player=info")),
        )
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default settings: {e}");
        AppConfig::default()
    });

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Isla Player")
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Isla Player",
        options,
        Box::new(|cc| Ok(Box::new(VideoPlayerApp::new(cc, config)))),
    )
}
