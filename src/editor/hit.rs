// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hit-test surface.
//!
//! Picking works without a scene graph: every interactive region (a
//! shape body, a control point, a polygon edge) is filled into an
//! off-screen raster buffer with a unique flat color that encodes a
//! small integer id. Resolving a pointer event reads back the single
//! pixel under the cursor and maps the decoded id to a registered
//! target. Zero alpha means nothing was drawn there.
//!
//! Fills here are deliberately not anti-aliased: a blended edge pixel
//! would decode to a color that identifies nothing.

use std::collections::HashMap;

use super::input::PointerKind;

const MAX_HIT_INDEX: u32 = 0x00FF_FFFF;

/// A process-unique identifier for one interactive region, encodable as
/// an opaque RGB triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitId(u32);

impl HitId {
    pub fn to_rgb(self) -> [u8; 3] {
        let HitId(i) = self;
        [(i >> 16) as u8, (i >> 8) as u8, i as u8]
    }

    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        HitId(((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32)
    }
}

/// Monotonic allocator for hit ids.
///
/// Owned by the editor controller and reset when it is torn down, so ids
/// never leak across editing sessions. Ids are never reused while their
/// region is alive.
#[derive(Debug, Default)]
pub struct HitIdArena {
    next: u32,
}

impl HitIdArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> HitId {
        if self.next > MAX_HIT_INDEX {
            // 24 bits of id space exhausted within one session; wrap
            // rather than abort. Stale bindings were unbound long ago.
            log::warn!("hit id space exhausted, wrapping allocator");
            self.next = 0;
        }

        let id = HitId(self.next);
        self.next += 1;
        id
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// What a hit id resolves to when a pointer event lands on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The whole shape: select, drag, context menu.
    Body { drawable: usize },
    /// One control point: reshape, point deletion.
    ControlPoint { drawable: usize, point: usize },
    /// One polygon edge: vertex insertion.
    Edge { drawable: usize, edge: usize },
}

/// Picking table mapping (event kind, hit id) to a target.
///
/// Binding the same id for several event kinds never multiplies any
/// event plumbing; dispatch is a single lookup per incoming event.
/// Lookups against ids whose drawable has been destroyed simply miss.
#[derive(Debug, Default)]
pub struct HitBindings {
    targets: HashMap<(PointerKind, HitId), HitTarget>,
}

impl HitBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, id: HitId, kind: PointerKind, target: HitTarget) {
        self.targets.insert((kind, id), target);
    }

    /// Remove every binding for the given id, across all event kinds.
    pub fn unbind(&mut self, id: HitId) {
        self.targets.retain(|(_, bound), _| *bound != id);
    }

    pub fn lookup(&self, kind: PointerKind, id: HitId) -> Option<HitTarget> {
        self.targets.get(&(kind, id)).copied()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// The off-screen RGBA raster buffer, sized to match the visible surface.
#[derive(Debug)]
pub struct HitSurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Default for HitSurface {
    fn default() -> Self {
        HitSurface::new(0, 0)
    }
}

impl HitSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height * 4];
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Read back the 1x1 pixel under a surface-local position.
    ///
    /// Returns `None` when out of bounds or when nothing was drawn there.
    pub fn read(&self, pos: egui::Pos2) -> Option<HitId> {
        let x = pos.x.round() as i64;
        let y = pos.y.round() as i64;

        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }

        let offset = (y as usize * self.width + x as usize) * 4;
        let px = &self.pixels[offset..offset + 4];

        if px[3] == 0 {
            return None;
        }

        Some(HitId::from_rgb([px[0], px[1], px[2]]))
    }

    fn set_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }

        let offset = (y as usize * self.width + x as usize) * 4;
        self.pixels[offset] = rgb[0];
        self.pixels[offset + 1] = rgb[1];
        self.pixels[offset + 2] = rgb[2];
        self.pixels[offset + 3] = 255;
    }

    /// Fill a polygon (even-odd rule) with a flat id color.
    pub fn fill_polygon(&mut self, points: &[egui::Pos2], id: HitId) {
        if points.len() < 3 {
            return;
        }

        let rgb = id.to_rgb();

        let y_min = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let y_max = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

        let y_start = (y_min.floor() as i64).max(0);
        let y_end = (y_max.ceil() as i64).min(self.height as i64 - 1);

        let mut crossings: Vec<f32> = Vec::new();

        for y in y_start..=y_end {
            let yc = y as f32 + 0.5;
            crossings.clear();

            for i in 0..points.len() {
                let a = points[i];
                let b = points[(i + 1) % points.len()];

                if (a.y <= yc) != (b.y <= yc) {
                    let t = (yc - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }

            crossings.sort_by(|a, b| a.total_cmp(b));

            for pair in crossings.chunks_exact(2) {
                let x_start = (pair[0] - 0.5).ceil() as i64;
                let x_end = (pair[1] - 0.5).floor() as i64;
                for x in x_start..=x_end {
                    self.set_pixel(x, y, rgb);
                }
            }
        }
    }

    /// Fill a circle with a flat id color.
    pub fn fill_circle(&mut self, center: egui::Pos2, radius: f32, id: HitId) {
        let rgb = id.to_rgb();
        let r2 = radius * radius;

        let x_start = (center.x - radius).floor() as i64;
        let x_end = (center.x + radius).ceil() as i64;
        let y_start = (center.y - radius).floor() as i64;
        let y_end = (center.y + radius).ceil() as i64;

        for y in y_start..=y_end {
            for x in x_start..=x_end {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(x, y, rgb);
                }
            }
        }
    }

    /// Stroke a line segment of the given width with a flat id color.
    pub fn stroke_segment(&mut self, a: egui::Pos2, b: egui::Pos2, width: f32, id: HitId) {
        let rgb = id.to_rgb();
        let half = width / 2.0;
        let half2 = half * half;

        let x_start = (a.x.min(b.x) - half).floor() as i64;
        let x_end = (a.x.max(b.x) + half).ceil() as i64;
        let y_start = (a.y.min(b.y) - half).floor() as i64;
        let y_end = (a.y.max(b.y) + half).ceil() as i64;

        let ab = b - a;
        let len2 = ab.length_sq();

        for y in y_start..=y_end {
            for x in x_start..=x_end {
                let p = egui::pos2(x as f32 + 0.5, y as f32 + 0.5);
                let ap = p - a;

                let t = if len2 > 0.0 {
                    (ap.dot(ab) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };

                let closest = a + ab * t;
                if (p - closest).length_sq() <= half2 {
                    self.set_pixel(x, y, rgb);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_id_rgb_roundtrip() {
        let mut arena = HitIdArena::new();
        for _ in 0..1000 {
            let id = arena.allocate();
            assert_eq!(HitId::from_rgb(id.to_rgb()), id);
        }
    }

    #[test]
    fn test_arena_allocates_unique_ids() {
        let mut arena = HitIdArena::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..4096 {
            assert!(seen.insert(arena.allocate()));
        }
    }

    #[test]
    fn test_read_misses_where_nothing_drawn() {
        let surface = HitSurface::new(32, 32);
        assert_eq!(surface.read(pos2(10.0, 10.0)), None);
        assert_eq!(surface.read(pos2(-1.0, 5.0)), None);
        assert_eq!(surface.read(pos2(5.0, 100.0)), None);
    }

    #[test]
    fn test_polygon_fill_and_readback() {
        let mut surface = HitSurface::new(64, 64);
        let mut arena = HitIdArena::new();
        let id = arena.allocate();

        let square = [pos2(10.0, 10.0), pos2(50.0, 10.0), pos2(50.0, 50.0), pos2(10.0, 50.0)];
        surface.fill_polygon(&square, id);

        assert_eq!(surface.read(pos2(30.0, 30.0)), Some(id));
        assert_eq!(surface.read(pos2(5.0, 5.0)), None);
        assert_eq!(surface.read(pos2(55.0, 30.0)), None);
    }

    #[test]
    fn test_later_fill_wins() {
        let mut surface = HitSurface::new(64, 64);
        let mut arena = HitIdArena::new();
        let below = arena.allocate();
        let above = arena.allocate();

        let square = [pos2(0.0, 0.0), pos2(40.0, 0.0), pos2(40.0, 40.0), pos2(0.0, 40.0)];
        surface.fill_polygon(&square, below);
        surface.fill_circle(pos2(20.0, 20.0), 5.0, above);

        assert_eq!(surface.read(pos2(20.0, 20.0)), Some(above));
        assert_eq!(surface.read(pos2(35.0, 35.0)), Some(below));
    }

    #[test]
    fn test_segment_stroke_covers_midpoint() {
        let mut surface = HitSurface::new(64, 64);
        let mut arena = HitIdArena::new();
        let id = arena.allocate();

        surface.stroke_segment(pos2(10.0, 20.0), pos2(50.0, 20.0), 7.0, id);

        assert_eq!(surface.read(pos2(30.0, 20.0)), Some(id));
        assert_eq!(surface.read(pos2(30.0, 22.0)), Some(id));
        assert_eq!(surface.read(pos2(30.0, 30.0)), None);
    }

    #[test]
    fn test_clear_resets_every_pixel() {
        let mut surface = HitSurface::new(16, 16);
        let mut arena = HitIdArena::new();
        surface.fill_circle(pos2(8.0, 8.0), 4.0, arena.allocate());

        surface.clear();
        assert_eq!(surface.read(pos2(8.0, 8.0)), None);
    }

    #[test]
    fn test_bindings_unbind_removes_all_kinds() {
        let mut bindings = HitBindings::new();
        let mut arena = HitIdArena::new();
        let id = arena.allocate();

        bindings.bind(id, PointerKind::Down, HitTarget::Body { drawable: 0 });
        bindings.bind(id, PointerKind::ContextMenu, HitTarget::Body { drawable: 0 });
        assert_eq!(bindings.len(), 2);

        bindings.unbind(id);
        assert!(bindings.is_empty());
        assert_eq!(bindings.lookup(PointerKind::Down, id), None);
    }
}
