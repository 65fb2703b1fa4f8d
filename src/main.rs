mod app;
mod error;
mod export;
mod geometry;
mod interaction;
mod loader;
mod regions;
mod render;
mod session;

use eframe::egui;
use std::path::PathBuf;

use app::AnnotatorApp;

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let initial_image = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &initial_image {
        if !path.exists() {
            log::error!("File not found: {}", path.display());
        }
    }
    let initial_image = initial_image.filter(|p| p.exists());

    let title = match &initial_image {
        Some(path) => format!(
            "Region Annotator — {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        ),
        None => "Region Annotator".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_drag_and_drop(true)
            .with_title(&title),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotatorApp::new(initial_image)))),
    ) {
        log::error!("Application error: {e}");
        std::process::exit(1);
    }
}
