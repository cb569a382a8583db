// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation creation.
//!
//! A separate state machine, alive only while the editor is in a create
//! mode. One instance exists per mode entry; leaving the mode discards
//! it along with any in-progress points.
//!
//! Boxes are drawn in one press-drag-release gesture; polygons are
//! accumulated click by click and committed with a right click.

use egui::{Color32, Pos2, Stroke};

use super::input::{PointerEvent, PointerKind};
use crate::models::annotation::{Annotation, AnnotationKind, Point};
use crate::models::sample::SampleId;
use crate::store::AnnotationStore;
use crate::util::geometry::Scale;

/// Boxes whose smaller dimension lands under this many image pixels are
/// treated as accidental clicks and discarded.
const MIN_PIXEL_DISTANCE: f64 = 30.0;

const PREVIEW_STROKE: f32 = 2.0;
const PREVIEW_COLOR: Color32 = Color32::LIGHT_BLUE;
const PREVIEW_VERTEX_RADIUS: f32 = 4.0;

/// Which kind of shape is being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateKind {
    Box,
    Segment,
}

/// Accumulates new points from pointer input and commits finished shapes
/// to the persistence collaborator.
#[derive(Debug)]
pub struct CreationController {
    kind: CreateKind,
    points: Vec<Point>,
    dragging: bool,
    cursor: Pos2,
}

impl CreationController {
    pub fn new(kind: CreateKind) -> Self {
        Self {
            kind,
            points: Vec::new(),
            dragging: false,
            cursor: Pos2::ZERO,
        }
    }

    pub fn in_progress(&self) -> &[Point] {
        &self.points
    }

    /// Drop the in-progress points without committing anything.
    pub fn cancel(&mut self) {
        if !self.points.is_empty() {
            log::info!("cancelled in-progress annotation ({} points)", self.points.len());
        }
        self.points.clear();
        self.dragging = false;
    }

    pub fn handle_events(
        &mut self,
        events: &[PointerEvent],
        scale: Scale,
        sample_id: SampleId,
        store: &mut dyn AnnotationStore,
    ) {
        for event in events {
            match event.kind {
                PointerKind::Move => {
                    self.cursor = event.pos;
                    if self.dragging && self.kind == CreateKind::Box {
                        // The second corner tracks the live cursor
                        let (x, y) = scale.surface_to_image(event.pos);
                        if let Some(corner) = self.points.get_mut(1) {
                            corner.x = x;
                            corner.y = y;
                        }
                    }
                }
                PointerKind::Down if self.kind == CreateKind::Box => {
                    // Seed two coincident corners so the box has a
                    // visible extent immediately
                    let (x, y) = scale.surface_to_image(event.pos);
                    self.points.clear();
                    self.points.push(Point::new(x, y));
                    self.points.push(Point::new(x, y));
                    self.dragging = true;
                }
                PointerKind::Up if self.kind == CreateKind::Box => {
                    if self.dragging {
                        self.dragging = false;
                        self.commit(sample_id, store);
                    }
                }
                PointerKind::Click if self.kind == CreateKind::Segment => {
                    let (x, y) = scale.surface_to_image(event.pos);
                    self.points.push(Point::new(x, y));
                    log::debug!("segment point {} at ({x:.1}, {y:.1})", self.points.len());
                }
                PointerKind::ContextMenu if self.kind == CreateKind::Segment => {
                    self.commit(sample_id, store);
                }
                _ => {}
            }
        }
    }

    /// Commit the accumulated points if they form a valid shape, then
    /// clear the buffer either way.
    fn commit(&mut self, sample_id: SampleId, store: &mut dyn AnnotationStore) {
        let (kind, required) = match self.kind {
            CreateKind::Box => (AnnotationKind::Box, 2),
            CreateKind::Segment => (AnnotationKind::Polygon, 3),
        };

        if self.points.len() >= required {
            if self.kind == CreateKind::Box {
                let min_dimension = f64::min(
                    (self.points[0].x - self.points[1].x).abs(),
                    (self.points[0].y - self.points[1].y).abs(),
                );
                if min_dimension < MIN_PIXEL_DISTANCE {
                    log::debug!("discarding box below minimum size ({min_dimension:.1}px)");
                    self.points.clear();
                    return;
                }
            }

            let annotation = Annotation::new(kind, 0, std::mem::take(&mut self.points));
            log::info!("committing new {kind:?} annotation with {} points", annotation.points.len());

            if store.create_annotations(sample_id, vec![annotation]).is_none() {
                log::warn!("failed to persist new annotation");
            }
        }

        self.points.clear();
    }

    /// Paint the in-progress preview. Polygons get a virtual last vertex
    /// tracking the cursor so the pending edge is visible before it is
    /// committed.
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, scale: Scale) {
        let mut outline: Vec<Pos2> = match self.kind {
            CreateKind::Box => {
                if self.points.len() != 2 {
                    return;
                }
                let a = self.points[0];
                let b = self.points[1];
                [(a.x, a.y), (b.x, a.y), (b.x, b.y), (a.x, b.y)]
                    .iter()
                    .map(|&(x, y)| {
                        let (sx, sy) = scale.to_surface(x, y);
                        egui::pos2(sx as f32, sy as f32)
                    })
                    .collect()
            }
            CreateKind::Segment => {
                if self.points.is_empty() {
                    return;
                }
                let mut pts: Vec<Pos2> = self.points.iter().map(|p| scale.point_to_surface(p)).collect();
                pts.push(self.cursor);
                pts
            }
        };

        for p in &mut outline {
            *p = origin + p.to_vec2();
        }

        if self.kind == CreateKind::Segment {
            for p in &outline {
                painter.circle_filled(*p, PREVIEW_VERTEX_RADIUS, Color32::WHITE);
            }
        }

        painter.add(egui::Shape::closed_line(outline, Stroke::new(PREVIEW_STROKE, PREVIEW_COLOR)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample::Sample;
    use crate::store::MemoryStore;
    use egui::{pos2, vec2};

    fn setup() -> (MemoryStore, SampleId) {
        let mut store = MemoryStore::new();
        let sample = Sample::new("img.png".to_string());
        let id = sample.id;
        store.insert_sample(sample);
        (store, id)
    }

    fn down(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(PointerKind::Down, pos2(x, y))
    }

    fn up(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(PointerKind::Up, pos2(x, y))
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::moved(pos2(x, y), vec2(1.0, 1.0))
    }

    fn click(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(PointerKind::Click, pos2(x, y))
    }

    fn context_menu(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(PointerKind::ContextMenu, pos2(x, y))
    }

    #[test]
    fn test_small_box_is_discarded() {
        let (mut store, sample_id) = setup();
        let mut creation = CreationController::new(CreateKind::Box);

        creation.handle_events(
            &[down(10.0, 10.0), moved(15.0, 12.0), up(15.0, 12.0)],
            Scale::IDENTITY,
            sample_id,
            &mut store,
        );

        assert!(store.sample(sample_id).unwrap().annotations.is_empty());
        assert!(creation.in_progress().is_empty());
    }

    #[test]
    fn test_box_commit() {
        let (mut store, sample_id) = setup();
        let mut creation = CreationController::new(CreateKind::Box);

        creation.handle_events(
            &[down(10.0, 10.0), moved(100.0, 100.0), up(100.0, 100.0)],
            Scale::IDENTITY,
            sample_id,
            &mut store,
        );

        let annotations = &store.sample(sample_id).unwrap().annotations;
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, AnnotationKind::Box);
        assert_eq!(annotations[0].class_index, 0);
        assert_eq!(annotations[0].points.len(), 2);
        assert!((annotations[0].points[0].x - 10.0).abs() < 1e-6);
        assert!((annotations[0].points[1].x - 100.0).abs() < 1e-6);
        assert!((annotations[0].points[1].y - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_box_respects_scale() {
        let (mut store, sample_id) = setup();
        let mut creation = CreationController::new(CreateKind::Box);

        // Surface is half the image size in both axes
        let scale = Scale { x: 0.5, y: 0.5 };
        creation.handle_events(
            &[down(10.0, 10.0), moved(60.0, 60.0), up(60.0, 60.0)],
            scale,
            sample_id,
            &mut store,
        );

        let annotations = &store.sample(sample_id).unwrap().annotations;
        assert_eq!(annotations.len(), 1);
        assert!((annotations[0].points[0].x - 20.0).abs() < 1e-6);
        assert!((annotations[0].points[1].x - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_polygon_needs_three_points() {
        let (mut store, sample_id) = setup();
        let mut creation = CreationController::new(CreateKind::Segment);

        creation.handle_events(
            &[click(0.0, 0.0), click(10.0, 0.0), context_menu(5.0, 5.0)],
            Scale::IDENTITY,
            sample_id,
            &mut store,
        );

        assert!(store.sample(sample_id).unwrap().annotations.is_empty());
        // A failed commit still clears the buffer
        assert!(creation.in_progress().is_empty());
    }

    #[test]
    fn test_polygon_commit_preserves_click_order() {
        let (mut store, sample_id) = setup();
        let mut creation = CreationController::new(CreateKind::Segment);

        creation.handle_events(
            &[
                click(0.0, 0.0),
                click(10.0, 0.0),
                click(5.0, 10.0),
                context_menu(5.0, 5.0),
            ],
            Scale::IDENTITY,
            sample_id,
            &mut store,
        );

        let annotations = &store.sample(sample_id).unwrap().annotations;
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, AnnotationKind::Polygon);
        let coords: Vec<(f64, f64)> = annotations[0].points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_cancel_clears_in_progress_points() {
        let (mut store, sample_id) = setup();
        let mut creation = CreationController::new(CreateKind::Segment);

        creation.handle_events(
            &[click(0.0, 0.0), click(10.0, 0.0)],
            Scale::IDENTITY,
            sample_id,
            &mut store,
        );
        assert_eq!(creation.in_progress().len(), 2);

        creation.cancel();
        assert!(creation.in_progress().is_empty());
        assert!(store.sample(sample_id).unwrap().annotations.is_empty());
    }
}
