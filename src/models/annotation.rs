// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the core data structures for representing
//! box and polygon annotations and their control points.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a single control point.
pub type PointId = Uuid;

/// Stable identifier for an annotation.
pub type AnnotationId = Uuid;

/// A 2D control point in image-pixel coordinates.
///
/// Coordinates are always stored in image space, never surface space.
/// The id stays stable across edits so persistence can target
/// individual points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point with a fresh id.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
        }
    }
}

/// Kind of annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Axis-aligned box stored as two opposite corners, order-insensitive.
    Box,
    /// Closed polygon stored as an ordered cyclic vertex sequence (>= 3).
    Polygon,
}

/// An annotation with a class label and its control points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(rename = "class")]
    pub class_index: u32,
    pub points: Vec<Point>,
}

impl Annotation {
    /// Create a new annotation with a fresh id.
    pub fn new(kind: AnnotationKind, class_index: u32, points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            class_index,
            points,
        }
    }
}
