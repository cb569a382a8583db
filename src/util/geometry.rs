// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides utilities for coordinate transformations between
//! image-pixel coordinates (where annotation data is stored) and
//! surface-pixel coordinates (where pointer events arrive).

use crate::models::annotation::Point;

/// Ratio between the displayed surface size and the natural image size.
///
/// Annotation data lives in image space; everything drawn or clicked lives
/// in surface space. Multiplying by the scale goes image -> surface,
/// dividing goes surface -> image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Scale::IDENTITY
    }
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    /// Compute the scale from the displayed rect size and the natural image size.
    pub fn from_sizes(display_width: f32, display_height: f32, natural_width: u32, natural_height: u32) -> Self {
        if natural_width == 0 || natural_height == 0 {
            return Self::IDENTITY;
        }

        Self {
            x: display_width as f64 / natural_width as f64,
            y: display_height as f64 / natural_height as f64,
        }
    }

    /// Convert an image-space coordinate pair to surface space.
    pub fn to_surface(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.x, y * self.y)
    }

    /// Convert a surface-space coordinate pair to image space.
    pub fn to_image(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.x, y / self.y)
    }

    /// Surface-space position of an annotation point.
    pub fn point_to_surface(&self, point: &Point) -> egui::Pos2 {
        let (x, y) = self.to_surface(point.x, point.y);
        egui::pos2(x as f32, y as f32)
    }

    /// Image-space coordinates of a surface-local position.
    pub fn surface_to_image(&self, pos: egui::Pos2) -> (f64, f64) {
        self.to_image(pos.x as f64, pos.y as f64)
    }
}
