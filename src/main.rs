mod app;
mod config;
mod error;
mod logging;
mod meta;
mod preview;
mod session;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use tracing::{info, warn};

use crate::config::Config;
use crate::meta::MemeMeta;
use crate::session::Session;

/// Describes a sidecar left by an earlier run; the session itself always starts empty.
fn existing_sidecar_note(image_path: &Path) -> Option<String> {
    let sidecar = meta::sidecar_path(image_path);
    if !sidecar.exists() {
        return None;
    }
    Some(match MemeMeta::load(&sidecar) {
        Ok(existing) => format!(
            "{} already holds {} inserts and will be overwritten on save",
            sidecar.display(),
            existing.inserts.len()
        ),
        Err(e) => format!("{} exists but is unreadable: {}", sidecar.display(), e),
    })
}

fn main() -> Result<()> {
    logging::init_logs();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: meme-inserts <image.png|jpg>");
        std::process::exit(1);
    }

    let image_path = PathBuf::from(&args[1]);
    info!("Opening file: {}", image_path.display());

    let config = Config::from_env()?;
    let session = Session::open(image_path.clone(), &config)
        .with_context(|| format!("Cannot annotate {}", image_path.display()))?;
    if let Some(note) = existing_sidecar_note(&image_path) {
        warn!("{}", note);
    }

    let title = format!(
        "meme-inserts - {}",
        image_path
            .file_name()
            .unwrap_or_default()
            .to_str()
            .unwrap_or("")
    );
    let (w, h) = session.preview().display_size();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([w as f32 + 32.0, h as f32 + 96.0])
            .with_title(&title),
        ..Default::default()
    };

    let fatal = app::FatalSlot::default();
    let app_fatal = fatal.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(app::MemeInsertsApp::new(session, app_fatal)))),
    )
    .map_err(|e| anyhow!("{e}"))?;

    if let Some(e) = fatal.borrow_mut().take() {
        return Err(e);
    }

    info!("Quitting.");
    Ok(())
}
