// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project data serialization and deserialization.
//!
//! This module handles exporting and importing a sample's annotations
//! in YAML and JSON formats.

use crate::models::annotation::Annotation;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk project file: one image and its annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub image_path: String,
    pub image_width: u32,
    pub image_height: u32,
    pub annotations: Vec<Annotation>,
}

/// Export project data to YAML format.
pub fn export_yaml(data: &ProjectFile, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export project data to JSON format.
pub fn export_json(data: &ProjectFile, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import project data from YAML format.
pub fn import_yaml(path: &Path) -> Result<ProjectFile> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import project data from JSON format.
pub fn import_json(path: &Path) -> Result<ProjectFile> {
    let json = std::fs::read_to_string(path)?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{AnnotationKind, Point};

    fn project() -> ProjectFile {
        ProjectFile {
            image_path: "img.png".to_string(),
            image_width: 640,
            image_height: 480,
            annotations: vec![
                Annotation::new(
                    AnnotationKind::Box,
                    1,
                    vec![Point::new(10.0, 10.0), Point::new(100.0, 100.0)],
                ),
                Annotation::new(
                    AnnotationKind::Polygon,
                    0,
                    vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 10.0)],
                ),
            ],
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let data = project();
        let path = std::env::temp_dir().join("imgmark_test_roundtrip.json");

        export_json(&data, &path).unwrap();
        let loaded = import_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.image_width, 640);
        assert_eq!(loaded.annotations, data.annotations);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let data = project();
        let path = std::env::temp_dir().join("imgmark_test_roundtrip.yaml");

        export_yaml(&data, &path).unwrap();
        let loaded = import_yaml(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.image_path, "img.png");
        assert_eq!(loaded.annotations, data.annotations);
    }
}
