// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! imgmark - interactive image annotation editor
//!
//! A cross-platform desktop application for annotating images with
//! boxes and polygons, with pixel-accurate shape picking.

mod app;
mod editor;
mod io;
mod models;
mod store;
mod ui;
mod util;

use anyhow::Result;
use app::ImgmarkApp;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("imgmark - Image Annotation Editor"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "imgmark",
        options,
        Box::new(|_cc| Ok(Box::new(ImgmarkApp::new()))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
