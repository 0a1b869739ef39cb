mod app;
mod color;
mod config;
mod data;
mod error;
mod pipeline;
mod report;
mod state;
mod ui;

use std::path::PathBuf;

use app::RustyCutoffApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::discover().unwrap_or_else(|e| {
        log::warn!("Ignoring configuration: {e:#}");
        AppConfig::default()
    });

    // Files given on the command line are opened at start-up.
    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    let mut app = RustyCutoffApp::new(config);
    if !paths.is_empty() {
        app.state.open_paths(&paths);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Cutoff – College Admission Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
