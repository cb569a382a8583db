// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Sample state management.
//!
//! A sample identifies one image under annotation and owns its ordered
//! annotation list. Exactly one sample is active in the editor at a time.

use super::annotation::Annotation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a sample.
pub type SampleId = Uuid;

/// One image and its annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    pub image_path: String,
    pub annotations: Vec<Annotation>,
}

impl Sample {
    /// Create a new empty sample for the given image.
    pub fn new(image_path: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_path,
            annotations: Vec::new(),
        }
    }
}
