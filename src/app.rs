// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait, wiring the annotation store, the editor and
//! creation controllers, and the UI panels together.

use crate::editor::creation::{CreateKind, CreationController};
use crate::editor::{Editor, EditorMode};
use crate::io::serialization::ProjectFile;
use crate::models::sample::{Sample, SampleId};
use crate::store::{AnnotationFieldPatch, AnnotationStore, MemoryStore};
use crate::ui::{canvas, properties, toolbar};
use std::sync::mpsc::{channel, Receiver};

/// Result of background image loading operation.
struct LoadedImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    sample: Sample,
}

/// Main application state.
pub struct ImgmarkApp {
    /// Current editing mode
    mode: EditorMode,

    /// Annotation persistence
    store: MemoryStore,

    /// Rendering, hit-testing and interaction engine
    editor: Editor,

    /// Creation state machine, alive only in create modes
    creation: Option<CreationController>,

    /// The sample currently being edited
    active_sample: Option<SampleId>,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Natural image dimensions (width, height)
    image_size: Option<(u32, u32)>,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImageData, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last persistence failure surfaced to the user
    status_notice: Option<String>,
}

impl Default for ImgmarkApp {
    fn default() -> Self {
        Self::new()
    }
}

impl ImgmarkApp {
    /// Create a new imgmark application instance.
    pub fn new() -> Self {
        Self {
            mode: EditorMode::Select,
            store: MemoryStore::new(),
            editor: Editor::new(),
            creation: None,
            active_sample: None,
            image_texture: None,
            image_size: None,
            image_loader: None,
            loading_message: None,
            status_notice: None,
        }
    }

    /// Swap the creation controller to match the new mode. In-progress
    /// points die with the old controller.
    fn on_mode_changed(&mut self) {
        self.creation = match self.mode {
            EditorMode::Select => None,
            EditorMode::CreateBox => Some(CreationController::new(CreateKind::Box)),
            EditorMode::CreateSegment => Some(CreationController::new(CreateKind::Segment)),
        };
        log::info!("switched to mode {:?}", self.mode);
    }

    /// Delete the currently selected annotation, if any.
    fn delete_selected(&mut self) {
        let (Some(sample_id), Some(index)) = (self.active_sample, self.editor.selected_index()) else {
            return;
        };

        let Some(annotation_id) = self
            .store
            .sample(sample_id)
            .and_then(|s| s.annotations.get(index))
            .map(|a| a.id)
        else {
            return;
        };

        if self.store.remove_annotations(sample_id, &[annotation_id]).is_some() {
            self.editor.set_selected_index(None);
        } else {
            log::warn!("failed to delete annotation {annotation_id}");
        }
    }

    /// Export the active sample's annotations to a file.
    fn export_annotations(&self, path: std::path::PathBuf) {
        let Some(sample) = self.active_sample.and_then(|id| self.store.sample(id)) else {
            return;
        };

        let (width, height) = self.image_size.unwrap_or((0, 0));
        let project = ProjectFile {
            image_path: sample.image_path.clone(),
            image_width: width,
            image_height: height,
            annotations: sample.annotations.clone(),
        };

        let extension = path.extension().and_then(|s| s.to_str());
        let result = match extension {
            Some("yaml") | Some("yml") => crate::io::serialization::export_yaml(&project, &path),
            Some("json") => crate::io::serialization::export_json(&project, &path),
            _ => {
                log::error!("Unsupported file extension: {:?}", extension);
                return;
            }
        };

        match result {
            Ok(_) => log::info!("Exported annotations to {}", path.display()),
            Err(e) => log::error!("Failed to export annotations: {}", e),
        }
    }

    /// Import annotations from a file and load the referenced image
    /// (asynchronously).
    fn import_annotations(&mut self, path: std::path::PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading annotations and image...".to_string());

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = (|| -> Result<LoadedImageData, String> {
                let extension = path.extension().and_then(|s| s.to_str());
                let project = match extension {
                    Some("yaml") | Some("yml") => crate::io::serialization::import_yaml(&path)
                        .map_err(|e| format!("Failed to import YAML: {}", e))?,
                    Some("json") => crate::io::serialization::import_json(&path)
                        .map_err(|e| format!("Failed to import JSON: {}", e))?,
                    _ => return Err(format!("Unsupported file extension: {:?}", extension)),
                };

                log::info!("Imported {} annotations from {}", project.annotations.len(), path.display());

                let image_path = std::path::PathBuf::from(&project.image_path);
                if !image_path.exists() {
                    return Err(format!("Referenced image not found: {}", image_path.display()));
                }

                let loaded = crate::io::media::load_image(&image_path)
                    .map_err(|e| format!("Failed to load image: {}", e))?;

                let mut sample = Sample::new(project.image_path.clone());
                sample.annotations = project.annotations;

                Ok(LoadedImageData {
                    width: loaded.width,
                    height: loaded.height,
                    pixels: loaded.pixels,
                    sample,
                })
            })();

            let _ = sender.send(result);
        });
    }

    /// Load an image file and create a texture for display (asynchronously).
    pub fn load_image_file(&mut self, path: std::path::PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        let path_string = path.to_string_lossy().to_string();

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = (|| -> Result<LoadedImageData, String> {
                let loaded = crate::io::media::load_image(&path)
                    .map_err(|e| format!("Failed to load image: {}", e))?;

                log::info!("Loaded image: {} ({}x{})", path.display(), loaded.width, loaded.height);

                Ok(LoadedImageData {
                    width: loaded.width,
                    height: loaded.height,
                    pixels: loaded.pixels,
                    sample: Sample::new(path_string),
                })
            })();

            let _ = sender.send(result);
        });
    }

    /// Install a finished background load: upload the texture and make
    /// the new sample active.
    fn install_loaded_image(&mut self, ctx: &egui::Context, loaded: LoadedImageData) {
        let size = [loaded.width as usize, loaded.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &loaded.pixels);
        let texture = ctx.load_texture("loaded_image", color_image, egui::TextureOptions::LINEAR);

        self.image_texture = Some(texture);
        self.image_size = Some((loaded.width, loaded.height));

        // Tear the editor down so the next canvas frame starts a fresh
        // session (new arena, new surface size) for the new sample
        if self.editor.is_active() {
            self.editor.on_end();
        }

        self.active_sample = Some(loaded.sample.id);
        self.store.insert_sample(loaded.sample);
        self.mode = EditorMode::Select;
        self.creation = None;

        log::info!("Image loaded successfully");
    }
}

impl eframe::App for ImgmarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed image loading
        if let Some(ref receiver) = self.image_loader {
            if let Ok(result) = receiver.try_recv() {
                self.image_loader = None;
                self.loading_message = None;

                match result {
                    Ok(loaded) => self.install_loaded_image(ctx, loaded),
                    Err(e) => {
                        log::error!("Failed to load image: {}", e);
                        self.status_notice = Some(e);
                    }
                }
            }
        }

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image...").clicked() {
                        // Open native file picker
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "tiff", "tif"])
                            .pick_file()
                        {
                            self.load_image_file(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Load Annotations...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Annotations", &["yaml", "yml", "json"])
                            .pick_file()
                        {
                            self.import_annotations(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.menu_button("Export Annotations", |ui| {
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("annotations.yaml")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("annotations.json")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    // Undo
                    if ui.add_enabled(self.store.can_undo(), egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        if self.store.undo().is_some() {
                            self.editor.set_selected_index(None);
                            log::info!("Undo from menu");
                        }
                        ui.close_menu();
                    }

                    // Redo
                    if ui.add_enabled(self.store.can_redo(), egui::Button::new("Redo (Ctrl+Shift+Z)")).clicked() {
                        if self.store.redo().is_some() {
                            self.editor.set_selected_index(None);
                            log::info!("Redo from menu");
                        }
                        ui.close_menu();
                    }

                    ui.separator();

                    // Delete Selected
                    let has_selection = self.editor.selected_index().is_some();
                    if ui.add_enabled(has_selection, egui::Button::new("Delete Selected")).clicked() {
                        self.delete_selected();
                        ui.close_menu();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let previous_mode = self.mode;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.mode);
        });
        if previous_mode != self.mode {
            self.on_mode_changed();
        }

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                let sample = self.active_sample.and_then(|id| self.store.sample(id));
                properties::show(ui, sample, self.editor.selected_index())
            })
            .inner;

        // Handle properties panel actions
        match properties_action {
            properties::PropertiesAction::SelectAnnotation(idx) => {
                self.editor.set_selected_index(Some(idx));
            }
            properties::PropertiesAction::DeleteAnnotation(idx) => {
                let annotation_id = self
                    .active_sample
                    .and_then(|id| self.store.sample(id))
                    .and_then(|s| s.annotations.get(idx))
                    .map(|a| a.id);

                if let (Some(sample_id), Some(annotation_id)) = (self.active_sample, annotation_id) {
                    if self.store.remove_annotations(sample_id, &[annotation_id]).is_some() {
                        self.editor.set_selected_index(None);
                        log::info!("Deleted annotation from panel");
                    }
                }
            }
            properties::PropertiesAction::SetClass(idx, class_index) => {
                let annotation_id = self
                    .active_sample
                    .and_then(|id| self.store.sample(id))
                    .and_then(|s| s.annotations.get(idx))
                    .map(|a| a.id);

                if let Some(annotation_id) = annotation_id {
                    if self
                        .store
                        .update_annotation_fields(vec![AnnotationFieldPatch {
                            id: annotation_id,
                            class_index: Some(class_index),
                        }])
                        .is_none()
                    {
                        log::warn!("failed to update class of annotation {annotation_id}");
                    }
                }
            }
            properties::PropertiesAction::None => {}
        }

        // Handle keyboard events
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if let Some(ref mut creation) = self.creation {
                // Abort the shape being drawn
                creation.cancel();
            } else {
                self.editor.set_selected_index(None);
            }
        }

        // Only process if no text field is focused (to avoid deleting while editing)
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
                self.delete_selected();
            }

            // Handle undo (Ctrl+Z)
            if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
                if self.store.undo().is_some() {
                    self.editor.set_selected_index(None);
                    log::info!("Undo");
                }
            }

            // Handle redo (Ctrl+Shift+Z or Ctrl+Y)
            if ctx.input(|i| {
                (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                    || (i.modifiers.command && i.key_pressed(egui::Key::Y))
            }) {
                if self.store.redo().is_some() {
                    self.editor.set_selected_index(None);
                    log::info!("Redo");
                }
            }
        }

        // Surface persistence failures from the editor
        if let Some(notice) = self.editor.take_notice() {
            self.status_notice = Some(notice);
        }

        // Main canvas (center)
        egui::CentralPanel::default().show(ctx, |ui| {
            // Show loading overlay if loading
            if let Some(ref message) = self.loading_message {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.spinner();
                        ui.add_space(10.0);
                        ui.label(
                            egui::RichText::new(message)
                                .size(16.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                    });
                });
            } else {
                canvas::show(
                    ui,
                    self.mode,
                    &mut self.editor,
                    self.creation.as_mut(),
                    &mut self.store,
                    self.active_sample,
                    &self.image_texture,
                    self.image_size,
                    self.status_notice.as_deref(),
                );
            }
        });
    }
}
