// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation editing engine.
//!
//! The [`Editor`] owns the hit-test surface and the drawable set. Each
//! frame the host feeds it the pointer events that arrived since the
//! last frame, hands it the current annotation list for reconciliation,
//! and asks it to redraw both buffers. Events resolve against the hit
//! buffer drawn on the previous frame; handlers only mutate drawable
//! clones and issue persistence calls, so both buffers are consistent
//! again by the next draw.

pub mod creation;
pub mod drag;
pub mod drawable;
pub mod hit;
pub mod input;

use egui::{Pos2, Vec2};

use crate::models::annotation::{Annotation, AnnotationId, Point};
use crate::models::sample::SampleId;
use crate::store::AnnotationStore;
use crate::util::geometry::Scale;

use drag::DragWatch;
use drawable::Drawable;
use hit::{HitBindings, HitIdArena, HitSurface, HitTarget};
use input::{PointerEvent, PointerKind};

/// Editing mode. Creation modes suspend shape interaction and route
/// pointer input to the creation controller instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Select,
    CreateBox,
    CreateSegment,
}

/// What an open context menu refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuTarget {
    pub drawable: usize,
    pub annotation_id: AnnotationId,
}

#[derive(Debug)]
enum DragKind {
    /// Whole-shape drag; holds the surface-space snapshot of every point
    /// at gesture start.
    Shape { starts: Vec<Pos2> },
    /// Single control-point drag.
    Point { point: usize, start: Pos2 },
}

#[derive(Debug)]
struct DragState {
    drawable: usize,
    kind: DragKind,
    watch: DragWatch,
}

/// The annotation editor controller.
#[derive(Debug, Default)]
pub struct Editor {
    active: bool,
    scale: Scale,
    drawables: Vec<Drawable>,
    /// Deep copy of the annotation list the drawables were last built
    /// from; reconciliation compares against it structurally.
    snapshot: Vec<Annotation>,
    selected: Option<usize>,
    last_mode: Option<EditorMode>,
    arena: HitIdArena,
    bindings: HitBindings,
    hit: HitSurface,
    drag: Option<DragState>,
    menu_target: Option<MenuTarget>,
    notice: Option<String>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate the editor for a surface of the given pixel size.
    pub fn on_begin(&mut self, width: f32, height: f32) {
        self.active = true;
        self.arena.reset();
        self.bindings.clear();
        self.hit.resize(width.round().max(0.0) as usize, height.round().max(0.0) as usize);
        self.drawables.clear();
        self.snapshot.clear();
        self.selected = None;
        self.last_mode = None;
        self.drag = None;
        self.menu_target = None;
        log::info!("editor activated ({width:.0}x{height:.0})");
    }

    /// Deactivate: destroy all drawables and release their bindings.
    pub fn on_end(&mut self) {
        for drawable in &self.drawables {
            drawable.unbind(&mut self.bindings);
        }
        self.drawables.clear();
        self.snapshot.clear();
        self.bindings.clear();
        self.arena.reset();
        self.selected = None;
        self.last_mode = None;
        self.drag = None;
        self.menu_target = None;
        self.active = false;
        log::info!("editor deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Match the hit buffer to the current surface size.
    pub fn set_surface_size(&mut self, width: f32, height: f32) {
        self.hit
            .resize(width.round().max(0.0) as usize, height.round().max(0.0) as usize);
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_selected_index(&mut self, index: Option<usize>) {
        if self.selected != index {
            log::info!("selection changed to {index:?}");
        }
        self.selected = index;
    }

    pub fn menu_target(&self) -> Option<MenuTarget> {
        self.menu_target
    }

    pub fn clear_menu_target(&mut self) {
        self.menu_target = None;
    }

    /// Most recent user-facing failure notice, if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Feed this frame's pointer events through hit-testing and the drag
    /// state machine.
    pub fn handle_events(
        &mut self,
        events: &[PointerEvent],
        sample_id: SampleId,
        store: &mut dyn AnnotationStore,
    ) {
        if !self.active {
            return;
        }

        for event in events {
            // An armed drag watches moves and releases directly, without
            // hit-testing, so it keeps tracking outside the shape.
            if self.drag.is_some() {
                match event.kind {
                    PointerKind::Move => {
                        self.apply_drag_motion(event.delta);
                        continue;
                    }
                    PointerKind::Up => {
                        self.finish_drag(sample_id, store);
                        continue;
                    }
                    _ => {}
                }
            }

            self.dispatch(event, sample_id, store);
        }
    }

    fn dispatch(&mut self, event: &PointerEvent, sample_id: SampleId, store: &mut dyn AnnotationStore) {
        let Some(hit_id) = self.hit.read(event.pos) else {
            // Nothing drawn under the cursor
            if event.kind == PointerKind::Down && self.selected.is_some() {
                self.set_selected_index(None);
            }
            if event.kind == PointerKind::ContextMenu {
                self.menu_target = None;
            }
            return;
        };

        // Dangling ids (from destroyed drawables) simply miss here
        let Some(target) = self.bindings.lookup(event.kind, hit_id) else {
            return;
        };

        match (event.kind, target) {
            (PointerKind::Down, HitTarget::Body { drawable }) => {
                if self.selected != Some(drawable) {
                    // First press selects; it must not start a drag
                    self.set_selected_index(Some(drawable));
                } else if let Some(d) = self.drawables.get(drawable) {
                    self.drag = Some(DragState {
                        drawable,
                        kind: DragKind::Shape { starts: d.surface_points() },
                        watch: DragWatch::new(),
                    });
                }
            }
            (PointerKind::Down, HitTarget::ControlPoint { drawable, point }) => {
                if let Some(d) = self.drawables.get(drawable) {
                    if let Some(start) = d.surface_points().get(point).copied() {
                        self.drag = Some(DragState {
                            drawable,
                            kind: DragKind::Point { point, start },
                            watch: DragWatch::new(),
                        });
                    }
                }
            }
            (PointerKind::Click, HitTarget::Edge { drawable, edge }) => {
                self.insert_vertex(drawable, edge, event.pos, sample_id, store);
            }
            (PointerKind::ContextMenu, HitTarget::Body { drawable }) => {
                if let Some(d) = self.drawables.get(drawable) {
                    self.menu_target = Some(MenuTarget {
                        drawable,
                        annotation_id: d.annotation().id,
                    });
                }
            }
            (PointerKind::ContextMenu, HitTarget::ControlPoint { drawable, point }) => {
                self.remove_vertex(drawable, point, sample_id, store);
            }
            _ => {}
        }
    }

    fn apply_drag_motion(&mut self, delta: Vec2) {
        let scale = self.scale;
        let Some(drag) = &mut self.drag else { return };
        let cumulative = drag.watch.advance(delta);

        let Some(d) = self.drawables.get_mut(drag.drawable) else { return };

        match &drag.kind {
            DragKind::Shape { starts } => {
                for (i, start) in starts.iter().enumerate() {
                    let pos = *start + cumulative;
                    let (x, y) = scale.surface_to_image(pos);
                    d.set_point_image(i, x, y);
                }
            }
            DragKind::Point { point, start } => {
                let pos = *start + cumulative;
                let (x, y) = scale.surface_to_image(pos);
                d.set_point_image(*point, x, y);
            }
        }
    }

    fn finish_drag(&mut self, sample_id: SampleId, store: &mut dyn AnnotationStore) {
        let Some(drag) = self.drag.take() else { return };

        // A press-release with no motion is a click, not an edit
        if !drag.watch.moved() {
            return;
        }

        let Some(d) = self.drawables.get(drag.drawable) else { return };
        let annotation_id = d.annotation().id;

        let result = match drag.kind {
            DragKind::Shape { .. } => {
                log::info!("drag finished, committing {} points", d.points().len());
                store.update_points(sample_id, annotation_id, d.points().to_vec())
            }
            DragKind::Point { point, .. } => match d.points().get(point) {
                Some(p) => {
                    log::info!("control point drag finished, committing point {point}");
                    store.update_points(sample_id, annotation_id, vec![*p])
                }
                None => return,
            },
        };

        if result.is_none() {
            log::warn!("failed to persist dragged points for annotation {annotation_id}");
            self.notice = Some("Failed to save edit".to_string());
        }
    }

    /// Splice a new vertex into a polygon immediately after the clicked
    /// edge's first endpoint.
    fn insert_vertex(
        &mut self,
        drawable: usize,
        edge: usize,
        pos: Pos2,
        sample_id: SampleId,
        store: &mut dyn AnnotationStore,
    ) {
        let Some(d) = self.drawables.get(drawable) else { return };

        let (x, y) = self.scale.surface_to_image(pos);
        let mut points = d.points().to_vec();
        let insert_at = (edge + 1).min(points.len());
        points.insert(insert_at, Point::new(x, y));

        log::info!("inserting vertex at edge {edge} of annotation {}", d.annotation().id);

        if store.replace_points(sample_id, d.annotation().id, points).is_none() {
            log::warn!("failed to persist inserted vertex");
            self.notice = Some("Failed to save edit".to_string());
        }
    }

    /// Remove one polygon vertex, refusing to go below the 3-point
    /// minimum that keeps the polygon valid.
    fn remove_vertex(
        &mut self,
        drawable: usize,
        point: usize,
        sample_id: SampleId,
        store: &mut dyn AnnotationStore,
    ) {
        let Some(d) = self.drawables.get(drawable) else { return };

        if d.points().len() <= 3 {
            log::debug!("refusing vertex removal at minimum polygon size");
            return;
        }

        let Some(p) = d.points().get(point) else { return };
        log::info!("removing vertex {point} of annotation {}", d.annotation().id);

        if store.remove_points(sample_id, d.annotation().id, &[p.id]).is_none() {
            log::warn!("failed to persist vertex removal");
            self.notice = Some("Failed to save edit".to_string());
        }
    }

    /// Rebuild drawables when the mode, the scale, or the annotation
    /// content actually changed.
    pub fn reconcile(&mut self, annotations: &[Annotation], mode: EditorMode, scale: Scale) {
        if !self.active {
            return;
        }

        let mode_changed = self.last_mode != Some(mode);
        let scale_changed = self.scale != scale;
        self.last_mode = Some(mode);
        self.scale = scale;

        if mode_changed || scale_changed || self.should_rebuild(annotations) {
            self.rebuild(annotations);
        }
    }

    /// Structural comparison against the last-rendered snapshot. The
    /// external state may replace objects on every mutation, so only
    /// content differences count.
    pub fn should_rebuild(&self, annotations: &[Annotation]) -> bool {
        if annotations.len() != self.snapshot.len() {
            return true;
        }

        for (current, snapshot) in annotations.iter().zip(&self.snapshot) {
            if current.id != snapshot.id || current.points.len() != snapshot.points.len() {
                return true;
            }
            if current.points != snapshot.points {
                return true;
            }
        }

        false
    }

    fn rebuild(&mut self, annotations: &[Annotation]) {
        for drawable in &self.drawables {
            drawable.unbind(&mut self.bindings);
        }
        self.drawables.clear();
        self.drag = None;
        self.menu_target = None;

        for (index, annotation) in annotations.iter().enumerate() {
            let drawable = Drawable::new(annotation.clone(), index, self.scale, &mut self.arena);
            drawable.bind(&mut self.bindings);
            self.drawables.push(drawable);
        }

        self.snapshot = annotations.to_vec();

        if let Some(selected) = self.selected {
            if selected >= self.drawables.len() {
                self.selected = None;
            }
        }

        log::debug!("rebuilt {} drawables", self.drawables.len());
    }

    /// Clear and fully redraw the hit buffer: bodies in list order, then
    /// the selected drawable's control-point footprints on top so its
    /// handles stay clickable even under overlapping shapes.
    pub fn draw_hit(&mut self) {
        if !self.active {
            return;
        }

        self.hit.clear();

        for (index, drawable) in self.drawables.iter().enumerate() {
            drawable.draw_bounds(&mut self.hit, self.selected == Some(index));
        }

        if let Some(selected) = self.selected {
            if let Some(drawable) = self.drawables.get(selected) {
                drawable.draw_control_point_bounds(&mut self.hit);
            }
        }
    }

    /// Paint every drawable on the visible surface, in the same order as
    /// the hit buffer.
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2) {
        for (index, drawable) in self.drawables.iter().enumerate() {
            drawable.draw(painter, origin, self.selected == Some(index));
        }
    }
}
