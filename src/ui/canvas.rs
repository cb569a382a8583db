// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and annotation.
//!
//! This module provides the main canvas area: it fits the image into
//! the available space, recomputes the image-to-surface scale, feeds
//! pointer events to the editor or the creation controller, and drives
//! both per-frame draw passes (visible surface and hit-test surface).

use crate::editor::creation::CreationController;
use crate::editor::input;
use crate::editor::{Editor, EditorMode};
use crate::models::sample::SampleId;
use crate::store::{AnnotationStore, MemoryStore};
use crate::util::geometry::Scale;

const CROSSHAIR_RADIUS: f32 = 5.0;
const CROSSHAIR_SPACING: f32 = 5.0;
const CROSSHAIR_DASH: f32 = 100.0;

/// Display the main canvas area and run one editor frame.
#[allow(clippy::too_many_arguments)]
pub fn show(
    ui: &mut egui::Ui,
    mode: EditorMode,
    editor: &mut Editor,
    mut creation: Option<&mut CreationController>,
    store: &mut MemoryStore,
    sample_id: Option<SampleId>,
    image_texture: &Option<egui::TextureHandle>,
    image_size: Option<(u32, u32)>,
    status_notice: Option<&str>,
) {
    // Set background color
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    // Create a frame for the canvas
    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some((img_width, img_height)), Some(sample_id)) =
            (image_texture.as_ref(), image_size, sample_id)
        else {
            show_welcome(ui);
            return;
        };

        // Calculate scaling to fit the image in the available space
        let available = ui.available_size();
        let img_aspect = img_width as f32 / img_height as f32;
        let available_aspect = available.x / available.y;

        let (display_width, display_height) = if img_aspect > available_aspect {
            // Image is wider - fit to width
            let width = available.x;
            let height = width / img_aspect;
            (width, height)
        } else {
            // Image is taller - fit to height
            let height = available.y;
            let width = height * img_aspect;
            (width, height)
        };

        // Center the image
        let x_offset = (available.x - display_width) / 2.0;
        let y_offset = (available.y - display_height) / 2.0;

        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(x_offset, y_offset),
            egui::vec2(display_width, display_height),
        );

        // Draw the image
        ui.painter().image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let scale = Scale::from_sizes(display_width, display_height, img_width, img_height);

        if editor.is_active() {
            editor.set_surface_size(display_width, display_height);
        } else {
            editor.on_begin(display_width, display_height);
        }

        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
        let events = input::gather(ui, &response, image_rect);

        // Pointer input goes to exactly one state machine: shape
        // interaction in select mode, the creation controller otherwise
        match (mode, creation.as_deref_mut()) {
            (EditorMode::Select, _) => editor.handle_events(&events, sample_id, store),
            (_, Some(creation)) => creation.handle_events(&events, scale, sample_id, store),
            _ => {}
        }

        if let Some(sample) = store.sample(sample_id) {
            editor.reconcile(&sample.annotations, mode, scale);
        }

        // Hit buffer first, then the visible layer in the same order
        editor.draw_hit();

        let painter = ui.painter();
        editor.paint(painter, image_rect.min);

        if let Some(creation) = creation.as_deref() {
            creation.paint(painter, image_rect.min, scale);
        }

        if mode != EditorMode::Select {
            if let Some(pos) = response.hover_pos() {
                draw_crosshair(painter, image_rect, pos);
            }
        }

        // Context menu for the shape under the right click
        if mode == EditorMode::Select {
            if let Some(target) = editor.menu_target() {
                response.context_menu(|ui| {
                    if ui.button("Delete").clicked() {
                        if store.remove_annotations(sample_id, &[target.annotation_id]).is_some() {
                            editor.set_selected_index(None);
                        } else {
                            log::warn!("failed to delete annotation {}", target.annotation_id);
                        }
                        editor.clear_menu_target();
                        ui.close_menu();
                    }
                });
            }
        }

        // The editor is frame-driven; keep the draw loop running
        ui.ctx().request_repaint();
    });

    // Display current mode info at the bottom
    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Mode: {:?}", mode));
        ui.separator();

        match sample_id.and_then(|id| store.sample(id)) {
            Some(sample) => {
                ui.label(format!("{} annotations", sample.annotations.len()));
            }
            None => {
                ui.label("No file loaded");
            }
        }

        if let Some(notice) = status_notice {
            ui.separator();
            ui.label(egui::RichText::new(notice).color(egui::Color32::LIGHT_RED));
        }
    });
}

/// Dashed guide lines plus a cursor circle, shown while creating shapes.
fn draw_crosshair(painter: &egui::Painter, rect: egui::Rect, pos: egui::Pos2) {
    let stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    let gap = CROSSHAIR_RADIUS + CROSSHAIR_SPACING;

    painter.circle_stroke(pos, CROSSHAIR_RADIUS, stroke);

    let lines = [
        (egui::pos2(pos.x - gap, pos.y), egui::pos2(rect.left(), pos.y)),
        (egui::pos2(pos.x, pos.y - gap), egui::pos2(pos.x, rect.top())),
        (egui::pos2(pos.x + gap, pos.y), egui::pos2(rect.right(), pos.y)),
        (egui::pos2(pos.x, pos.y + gap), egui::pos2(pos.x, rect.bottom())),
    ];

    for (start, end) in lines {
        painter.extend(egui::Shape::dashed_line(
            &[start, end],
            stroke,
            CROSSHAIR_DASH,
            CROSSHAIR_SPACING,
        ));
    }
}

/// Welcome message shown before any image is loaded.
fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("IMGMARK")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Interactive image annotation")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open an image to begin annotating")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → Open Image...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}
