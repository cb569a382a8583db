// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation persistence.
//!
//! The editor never mutates annotation state directly; every edit goes
//! through the [`AnnotationStore`] contract, which returns the updated
//! sample snapshot on success and `None` on failure. The caller merges
//! the snapshot into its own state and the editor's reconciliation pass
//! picks the change up on the next frame.
//!
//! [`MemoryStore`] is the in-process adapter. It also keeps a bounded
//! undo/redo history of whole annotation lists, so edits made deep in
//! the interaction engine (drags, vertex splices) are undoable too.

use std::collections::HashMap;

use crate::models::annotation::{Annotation, AnnotationId, Point, PointId};
use crate::models::sample::{Sample, SampleId};

/// Partial field patch for an annotation, addressed by id.
#[derive(Debug, Clone)]
pub struct AnnotationFieldPatch {
    pub id: AnnotationId,
    pub class_index: Option<u32>,
}

/// The persistence collaborator contract.
///
/// All operations are idempotent-safe to retry. A `None` result means
/// the edit was not applied and the caller keeps its last-known-good
/// state.
pub trait AnnotationStore {
    fn create_annotations(&mut self, sample_id: SampleId, annotations: Vec<Annotation>) -> Option<Sample>;

    fn update_annotation_fields(&mut self, patches: Vec<AnnotationFieldPatch>) -> Option<Sample>;

    fn remove_annotations(&mut self, sample_id: SampleId, annotation_ids: &[AnnotationId]) -> Option<Sample>;

    /// Positional patch: each given point overwrites the stored point
    /// with the same id.
    fn update_points(&mut self, sample_id: SampleId, annotation_id: AnnotationId, points: Vec<Point>) -> Option<Sample>;

    /// Full structural replace of an annotation's point list.
    fn replace_points(&mut self, sample_id: SampleId, annotation_id: AnnotationId, points: Vec<Point>) -> Option<Sample>;

    fn remove_points(&mut self, sample_id: SampleId, annotation_id: AnnotationId, point_ids: &[PointId]) -> Option<Sample>;
}

/// Undo/redo history of annotation lists, bounded to the last 50 states.
#[derive(Debug, Default)]
struct History {
    undo_stack: Vec<(SampleId, Vec<Annotation>)>,
    redo_stack: Vec<(SampleId, Vec<Annotation>)>,
}

const MAX_HISTORY: usize = 50;

impl History {
    fn push(&mut self, sample_id: SampleId, annotations: Vec<Annotation>) {
        self.undo_stack.push((sample_id, annotations));
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.remove(0);
        }
        // New edits invalidate the redo branch
        self.redo_stack.clear();
    }

    fn undo(&mut self, current: impl FnOnce(SampleId) -> Option<Vec<Annotation>>) -> Option<(SampleId, Vec<Annotation>)> {
        let (sample_id, previous) = self.undo_stack.pop()?;
        if let Some(now) = current(sample_id) {
            self.redo_stack.push((sample_id, now));
        }
        Some((sample_id, previous))
    }

    fn redo(&mut self, current: impl FnOnce(SampleId) -> Option<Vec<Annotation>>) -> Option<(SampleId, Vec<Annotation>)> {
        let (sample_id, next) = self.redo_stack.pop()?;
        if let Some(now) = current(sample_id) {
            self.undo_stack.push((sample_id, now));
        }
        Some((sample_id, next))
    }
}

/// In-memory annotation store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    samples: HashMap<SampleId, Sample>,
    history: History,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sample(&mut self, sample: Sample) {
        self.samples.insert(sample.id, sample);
    }

    pub fn sample(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(&id)
    }

    pub fn can_undo(&self) -> bool {
        !self.history.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redo_stack.is_empty()
    }

    /// Restore the previous annotation list; returns the affected sample.
    pub fn undo(&mut self) -> Option<Sample> {
        let samples = &self.samples;
        let (sample_id, annotations) = self
            .history
            .undo(|id| samples.get(&id).map(|s| s.annotations.clone()))?;

        let sample = self.samples.get_mut(&sample_id)?;
        sample.annotations = annotations;
        log::info!("undo restored {} annotations", sample.annotations.len());
        Some(sample.clone())
    }

    /// Restore the next annotation list; returns the affected sample.
    pub fn redo(&mut self) -> Option<Sample> {
        let samples = &self.samples;
        let (sample_id, annotations) = self
            .history
            .redo(|id| samples.get(&id).map(|s| s.annotations.clone()))?;

        let sample = self.samples.get_mut(&sample_id)?;
        sample.annotations = annotations;
        log::info!("redo restored {} annotations", sample.annotations.len());
        Some(sample.clone())
    }

    /// Push the sample's current annotation list onto the undo stack.
    fn snapshot(&mut self, sample_id: SampleId) {
        if let Some(sample) = self.samples.get(&sample_id) {
            self.history.push(sample_id, sample.annotations.clone());
        }
    }

    fn sample_of_annotation(&self, annotation_id: AnnotationId) -> Option<SampleId> {
        self.samples
            .values()
            .find(|s| s.annotations.iter().any(|a| a.id == annotation_id))
            .map(|s| s.id)
    }
}

impl AnnotationStore for MemoryStore {
    fn create_annotations(&mut self, sample_id: SampleId, annotations: Vec<Annotation>) -> Option<Sample> {
        if !self.samples.contains_key(&sample_id) {
            return None;
        }

        self.snapshot(sample_id);
        let sample = self.samples.get_mut(&sample_id)?;
        sample.annotations.extend(annotations);
        log::info!("created annotations, total: {}", sample.annotations.len());
        Some(sample.clone())
    }

    fn update_annotation_fields(&mut self, patches: Vec<AnnotationFieldPatch>) -> Option<Sample> {
        let sample_id = self.sample_of_annotation(patches.first()?.id)?;

        self.snapshot(sample_id);
        let sample = self.samples.get_mut(&sample_id)?;
        for patch in patches {
            let annotation = sample.annotations.iter_mut().find(|a| a.id == patch.id)?;
            if let Some(class_index) = patch.class_index {
                annotation.class_index = class_index;
            }
        }
        Some(sample.clone())
    }

    fn remove_annotations(&mut self, sample_id: SampleId, annotation_ids: &[AnnotationId]) -> Option<Sample> {
        if !self.samples.contains_key(&sample_id) {
            return None;
        }

        self.snapshot(sample_id);
        let sample = self.samples.get_mut(&sample_id)?;
        sample.annotations.retain(|a| !annotation_ids.contains(&a.id));
        log::info!("removed annotations, total: {}", sample.annotations.len());
        Some(sample.clone())
    }

    fn update_points(&mut self, sample_id: SampleId, annotation_id: AnnotationId, points: Vec<Point>) -> Option<Sample> {
        if !self.samples.contains_key(&sample_id) {
            return None;
        }

        self.snapshot(sample_id);
        let sample = self.samples.get_mut(&sample_id)?;
        let annotation = sample.annotations.iter_mut().find(|a| a.id == annotation_id)?;

        for update in points {
            let point = annotation.points.iter_mut().find(|p| p.id == update.id)?;
            point.x = update.x;
            point.y = update.y;
        }
        Some(sample.clone())
    }

    fn replace_points(&mut self, sample_id: SampleId, annotation_id: AnnotationId, points: Vec<Point>) -> Option<Sample> {
        if !self.samples.contains_key(&sample_id) {
            return None;
        }

        self.snapshot(sample_id);
        let sample = self.samples.get_mut(&sample_id)?;
        let annotation = sample.annotations.iter_mut().find(|a| a.id == annotation_id)?;
        annotation.points = points;
        Some(sample.clone())
    }

    fn remove_points(&mut self, sample_id: SampleId, annotation_id: AnnotationId, point_ids: &[PointId]) -> Option<Sample> {
        if !self.samples.contains_key(&sample_id) {
            return None;
        }

        self.snapshot(sample_id);
        let sample = self.samples.get_mut(&sample_id)?;
        let annotation = sample.annotations.iter_mut().find(|a| a.id == annotation_id)?;
        annotation.points.retain(|p| !point_ids.contains(&p.id));
        Some(sample.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::AnnotationKind;

    fn store_with_sample() -> (MemoryStore, SampleId) {
        let mut store = MemoryStore::new();
        let sample = Sample::new("test.png".to_string());
        let id = sample.id;
        store.insert_sample(sample);
        (store, id)
    }

    fn box_annotation() -> Annotation {
        Annotation::new(
            AnnotationKind::Box,
            0,
            vec![Point::new(10.0, 10.0), Point::new(100.0, 100.0)],
        )
    }

    #[test]
    fn test_create_and_remove_annotations() {
        let (mut store, sample_id) = store_with_sample();
        let annotation = box_annotation();
        let annotation_id = annotation.id;

        let sample = store.create_annotations(sample_id, vec![annotation]).unwrap();
        assert_eq!(sample.annotations.len(), 1);

        let sample = store.remove_annotations(sample_id, &[annotation_id]).unwrap();
        assert!(sample.annotations.is_empty());
    }

    #[test]
    fn test_unknown_sample_fails() {
        let mut store = MemoryStore::new();
        assert!(store.create_annotations(uuid::Uuid::new_v4(), vec![box_annotation()]).is_none());
    }

    #[test]
    fn test_update_points_patches_by_id() {
        let (mut store, sample_id) = store_with_sample();
        let annotation = box_annotation();
        let annotation_id = annotation.id;
        let mut corner = annotation.points[1];
        store.create_annotations(sample_id, vec![annotation]).unwrap();

        corner.x = 200.0;
        corner.y = 150.0;
        let sample = store.update_points(sample_id, annotation_id, vec![corner]).unwrap();

        let points = &sample.annotations[0].points;
        assert_eq!(points[0].x, 10.0);
        assert_eq!(points[1].x, 200.0);
        assert_eq!(points[1].y, 150.0);
    }

    #[test]
    fn test_replace_points_is_structural() {
        let (mut store, sample_id) = store_with_sample();
        let annotation = Annotation::new(
            AnnotationKind::Polygon,
            0,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 10.0)],
        );
        let annotation_id = annotation.id;
        let mut points = annotation.points.clone();
        store.create_annotations(sample_id, vec![annotation]).unwrap();

        points.insert(1, Point::new(5.0, 0.0));
        let sample = store.replace_points(sample_id, annotation_id, points.clone()).unwrap();
        assert_eq!(sample.annotations[0].points.len(), 4);
        assert_eq!(sample.annotations[0].points[1].x, 5.0);
    }

    #[test]
    fn test_remove_points_by_id() {
        let (mut store, sample_id) = store_with_sample();
        let annotation = Annotation::new(
            AnnotationKind::Polygon,
            0,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
        );
        let annotation_id = annotation.id;
        let doomed = annotation.points[2].id;
        store.create_annotations(sample_id, vec![annotation]).unwrap();

        let sample = store.remove_points(sample_id, annotation_id, &[doomed]).unwrap();
        assert_eq!(sample.annotations[0].points.len(), 3);
        assert!(sample.annotations[0].points.iter().all(|p| p.id != doomed));
    }

    #[test]
    fn test_field_patch_updates_class() {
        let (mut store, sample_id) = store_with_sample();
        let annotation = box_annotation();
        let annotation_id = annotation.id;
        store.create_annotations(sample_id, vec![annotation]).unwrap();

        let sample = store
            .update_annotation_fields(vec![AnnotationFieldPatch {
                id: annotation_id,
                class_index: Some(7),
            }])
            .unwrap();
        assert_eq!(sample.annotations[0].class_index, 7);
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let (mut store, sample_id) = store_with_sample();
        store.create_annotations(sample_id, vec![box_annotation()]).unwrap();
        assert!(store.can_undo());

        let sample = store.undo().unwrap();
        assert!(sample.annotations.is_empty());
        assert!(store.can_redo());

        let sample = store.redo().unwrap();
        assert_eq!(sample.annotations.len(), 1);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let (mut store, sample_id) = store_with_sample();
        store.create_annotations(sample_id, vec![box_annotation()]).unwrap();
        store.undo().unwrap();
        assert!(store.can_redo());

        store.create_annotations(sample_id, vec![box_annotation()]).unwrap();
        assert!(!store.can_redo());
    }
}
