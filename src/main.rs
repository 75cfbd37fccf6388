use anyhow::anyhow;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod app;
mod classifier;
mod command;
mod download;
mod error;
mod localizations;
mod models;
mod preview;
mod process;
mod settings_store;
mod sites;
mod theme;
mod ui;

use app::GalleryDlApp;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // `log` records reach the subscriber through its tracing-log bridge.
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("logging already initialized: {}", e);
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    log::info!("starting gallery-dl GUI");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([700.0, 550.0])
            .with_title("Gallery-DL GUI"),
        ..Default::default()
    };

    let app = GalleryDlApp::from_environment();

    eframe::run_native(
        "Gallery-DL GUI",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow!("failed to start the interface: {}", e))
}
