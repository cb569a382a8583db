// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation properties panel.
//!
//! This module provides the side panel for viewing annotations of the
//! active sample, selecting them, editing their class index, and
//! deleting them.

use crate::models::annotation::AnnotationKind;
use crate::models::sample::Sample;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    SelectAnnotation(usize),
    DeleteAnnotation(usize),
    SetClass(usize, u32),
}

/// Display the properties panel for the active sample.
pub fn show(ui: &mut egui::Ui, sample: Option<&Sample>, selected: Option<usize>) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Annotations");
    ui.separator();

    let Some(sample) = sample else {
        ui.label(egui::RichText::new("No image loaded").weak());
        return action;
    };

    if sample.annotations.is_empty() {
        ui.label(egui::RichText::new("No annotations yet").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (idx, annotation) in sample.annotations.iter().enumerate() {
            let kind_label = match annotation.kind {
                AnnotationKind::Box => "Box",
                AnnotationKind::Polygon => "Polygon",
            };

            ui.horizontal(|ui| {
                let label = format!("{} {} ({} pts)", kind_label, idx + 1, annotation.points.len());
                if ui.selectable_label(selected == Some(idx), label).clicked() {
                    action = PropertiesAction::SelectAnnotation(idx);
                }

                let mut class_index = annotation.class_index;
                if ui
                    .add(egui::DragValue::new(&mut class_index).prefix("class ").range(0..=999))
                    .changed()
                {
                    action = PropertiesAction::SetClass(idx, class_index);
                }

                if ui.button("🗑").clicked() {
                    action = PropertiesAction::DeleteAnnotation(idx);
                }
            });
        }
    });

    action
}
