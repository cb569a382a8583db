// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading.
//!
//! This module handles loading image files and converting them to a
//! format suitable for display in egui. Decoding also discovers the
//! image's natural dimensions, which the editor needs for its
//! image-to-surface scale.

use anyhow::Result;
use std::path::Path;

/// A decoded RGBA8 image.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Load and decode an image file to RGBA8.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();

    Ok(LoadedImage {
        width,
        height,
        pixels: img.into_raw(),
    })
}
