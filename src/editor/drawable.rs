// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Renderable, interactive projections of annotations.
//!
//! A [`Drawable`] owns a private clone of its source annotation — drags
//! mutate the clone, never the live external state — plus the hit ids
//! for its body, its control points and (for polygons) its edges. It
//! knows how to paint itself anti-aliased on the visible surface and
//! how to lay its flat-color footprints into the hit-test surface.
//!
//! Drawables are disposable: reconciliation destroys and recreates them
//! whenever the underlying annotation data actually changes.

use egui::{Color32, Pos2, Stroke};

use super::hit::{HitBindings, HitId, HitIdArena, HitSurface, HitTarget};
use super::input::PointerKind;
use crate::models::annotation::{Annotation, AnnotationKind, Point};
use crate::util::geometry::Scale;

const SHAPE_STROKE: f32 = 2.0;
const CONTROL_POINT_RADIUS: f32 = 4.0;
const HIT_POINT_RADIUS: f32 = 5.0;
const EDGE_HIT_WIDTH: f32 = 7.0;

const SHAPE_COLOR: Color32 = Color32::YELLOW;

/// Variant-specific drawable state.
#[derive(Debug)]
pub enum DrawableShape {
    Box,
    Polygon {
        /// One id per edge; edge `i` runs from point `i` to point `i + 1`
        /// (wrapping), and a click on it splices a new vertex in at `i + 1`.
        edge_ids: Vec<HitId>,
    },
}

/// One annotation as it exists on screen.
#[derive(Debug)]
pub struct Drawable {
    annotation: Annotation,
    index: usize,
    scale: Scale,
    body_id: HitId,
    point_ids: Vec<HitId>,
    shape: DrawableShape,
}

impl Drawable {
    pub fn new(annotation: Annotation, index: usize, scale: Scale, arena: &mut HitIdArena) -> Self {
        let body_id = arena.allocate();
        let point_ids = annotation.points.iter().map(|_| arena.allocate()).collect();

        let shape = match annotation.kind {
            AnnotationKind::Box => DrawableShape::Box,
            AnnotationKind::Polygon => DrawableShape::Polygon {
                edge_ids: annotation.points.iter().map(|_| arena.allocate()).collect(),
            },
        };

        Self {
            annotation,
            index,
            scale,
            body_id,
            point_ids,
            shape,
        }
    }

    /// Register this drawable's interaction bindings.
    pub fn bind(&self, bindings: &mut HitBindings) {
        let body = HitTarget::Body { drawable: self.index };
        bindings.bind(self.body_id, PointerKind::Down, body);
        bindings.bind(self.body_id, PointerKind::ContextMenu, body);

        for (point, id) in self.point_ids.iter().enumerate() {
            let target = HitTarget::ControlPoint { drawable: self.index, point };
            bindings.bind(*id, PointerKind::Down, target);

            // Vertex deletion only makes sense on polygons
            if matches!(self.shape, DrawableShape::Polygon { .. }) {
                bindings.bind(*id, PointerKind::ContextMenu, target);
            }
        }

        if let DrawableShape::Polygon { edge_ids } = &self.shape {
            for (edge, id) in edge_ids.iter().enumerate() {
                bindings.bind(*id, PointerKind::Click, HitTarget::Edge { drawable: self.index, edge });
            }
        }
    }

    /// Remove every binding this drawable registered.
    pub fn unbind(&self, bindings: &mut HitBindings) {
        bindings.unbind(self.body_id);
        for id in &self.point_ids {
            bindings.unbind(*id);
        }
        if let DrawableShape::Polygon { edge_ids } = &self.shape {
            for id in edge_ids {
                bindings.unbind(*id);
            }
        }
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    pub fn points(&self) -> &[Point] {
        &self.annotation.points
    }

    /// Overwrite one point of the private clone, in image coordinates.
    pub fn set_point_image(&mut self, index: usize, x: f64, y: f64) {
        if let Some(point) = self.annotation.points.get_mut(index) {
            point.x = x;
            point.y = y;
        }
    }

    /// Surface-space positions of the stored points.
    pub fn surface_points(&self) -> Vec<Pos2> {
        self.annotation
            .points
            .iter()
            .map(|p| self.scale.point_to_surface(p))
            .collect()
    }

    /// All hit ids owned by this drawable.
    pub fn hit_ids(&self) -> Vec<HitId> {
        let mut ids = vec![self.body_id];
        ids.extend(&self.point_ids);
        if let DrawableShape::Polygon { edge_ids } = &self.shape {
            ids.extend(edge_ids);
        }
        ids
    }

    /// Surface-space outline of the shape body.
    ///
    /// A box stores only two opposite corners (in either order); the four
    /// rectangle corners are reconstructed from their min/max extents.
    fn outline(&self) -> Vec<Pos2> {
        match self.annotation.kind {
            AnnotationKind::Box => {
                if self.annotation.points.len() < 2 {
                    return Vec::new();
                }
                let a = self.annotation.points[0];
                let b = self.annotation.points[1];
                let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
                let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));

                [
                    (min_x, min_y),
                    (max_x, min_y),
                    (max_x, max_y),
                    (min_x, max_y),
                ]
                .iter()
                .map(|&(x, y)| {
                    let (sx, sy) = self.scale.to_surface(x, y);
                    egui::pos2(sx as f32, sy as f32)
                })
                .collect()
            }
            AnnotationKind::Polygon => self.surface_points(),
        }
    }

    /// Paint the shape on the visible surface. `origin` is the screen
    /// position of the surface's top-left corner.
    pub fn draw(&self, painter: &egui::Painter, origin: Pos2, selected: bool) {
        let outline: Vec<Pos2> = self
            .outline()
            .into_iter()
            .map(|p| origin + p.to_vec2())
            .collect();

        if outline.len() >= 2 {
            painter.add(egui::Shape::closed_line(outline, Stroke::new(SHAPE_STROKE, SHAPE_COLOR)));
        }

        if selected {
            for point in self.surface_points() {
                let center = origin + point.to_vec2();
                painter.circle_filled(center, CONTROL_POINT_RADIUS, Color32::WHITE);
                painter.circle_stroke(center, CONTROL_POINT_RADIUS, Stroke::new(1.0, Color32::BLACK));
            }
        }
    }

    /// Fill the body footprint into the hit surface; a selected polygon
    /// also lays down its edge footprints so edges stay clickable.
    pub fn draw_bounds(&self, hit: &mut HitSurface, selected: bool) {
        let outline = self.outline();
        hit.fill_polygon(&outline, self.body_id);

        if selected {
            if let DrawableShape::Polygon { edge_ids } = &self.shape {
                for (i, id) in edge_ids.iter().enumerate() {
                    let a = outline[i];
                    let b = outline[(i + 1) % outline.len()];
                    hit.stroke_segment(a, b, EDGE_HIT_WIDTH, *id);
                }
            }
        }
    }

    /// Fill the control-point footprints. Only called for the selected
    /// drawable, and always after everything else so handles stay on top.
    pub fn draw_control_point_bounds(&self, hit: &mut HitSurface) {
        for (point, id) in self.surface_points().into_iter().zip(&self.point_ids) {
            hit.fill_circle(point, HIT_POINT_RADIUS, *id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn make(kind: AnnotationKind, points: Vec<Point>) -> (Drawable, HitIdArena) {
        let mut arena = HitIdArena::new();
        let annotation = Annotation::new(kind, 0, points);
        let drawable = Drawable::new(annotation, 0, Scale::IDENTITY, &mut arena);
        (drawable, arena)
    }

    #[test]
    fn test_box_outline_is_corner_order_insensitive() {
        // Stored corners are bottom-right then top-left
        let (drawable, _) = make(
            AnnotationKind::Box,
            vec![Point::new(100.0, 80.0), Point::new(10.0, 20.0)],
        );

        let outline = drawable.outline();
        assert_eq!(
            outline,
            vec![pos2(10.0, 20.0), pos2(100.0, 20.0), pos2(100.0, 80.0), pos2(10.0, 80.0)]
        );
    }

    #[test]
    fn test_hit_ids_are_distinct_per_region() {
        let (drawable, _) = make(
            AnnotationKind::Polygon,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 10.0)],
        );

        let ids = drawable.hit_ids();
        // body + 3 points + 3 edges
        assert_eq!(ids.len(), 7);
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_box_binds_no_edge_or_vertex_delete_targets() {
        let mut bindings = HitBindings::new();
        let (drawable, _) = make(
            AnnotationKind::Box,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
        );
        drawable.bind(&mut bindings);

        // body down + body contextmenu + two point downs
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn test_polygon_binds_edges_and_vertex_delete() {
        let mut bindings = HitBindings::new();
        let (drawable, _) = make(
            AnnotationKind::Polygon,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 10.0)],
        );
        drawable.bind(&mut bindings);

        // body (2) + points down (3) + points contextmenu (3) + edges click (3)
        assert_eq!(bindings.len(), 11);

        drawable.unbind(&mut bindings);
        assert!(bindings.is_empty());
    }
}
