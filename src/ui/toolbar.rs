// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and mode selection UI.
//!
//! This module provides the toolbar interface for switching between
//! selection and the two annotation-creation modes.

use crate::editor::EditorMode;

/// Display the toolbar with mode selection buttons.
pub fn show(ui: &mut egui::Ui, current_mode: &mut EditorMode) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        // Select tool
        if ui.selectable_label(*current_mode == EditorMode::Select, "⬆ Select").clicked() {
            *current_mode = EditorMode::Select;
        }

        // Box tool
        if ui.selectable_label(*current_mode == EditorMode::CreateBox, "▭ Box").clicked() {
            *current_mode = EditorMode::CreateBox;
        }

        // Polygon tool
        if ui.selectable_label(*current_mode == EditorMode::CreateSegment, "▱ Polygon").clicked() {
            *current_mode = EditorMode::CreateSegment;
        }

        ui.separator();

        // Tool description
        let mode_text = match current_mode {
            EditorMode::Select => "Click to select shapes, drag bodies or handles to move them",
            EditorMode::CreateBox => "Press and drag to draw a box",
            EditorMode::CreateSegment => "Click to add vertices, right-click to finish the polygon",
        };

        ui.label(egui::RichText::new(mode_text).italics().weak());
    });
}
