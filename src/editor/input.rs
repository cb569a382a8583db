// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer event synthesis.
//!
//! The editor consumes a small stream of pointer events with
//! surface-local coordinates. This module defines those events and
//! builds them from egui's per-frame input state, so the rest of the
//! engine never touches egui input directly.

/// Pointer event kinds the hit-test surface can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Up,
    Move,
    Click,
    ContextMenu,
}

/// A pointer event in surface-local pixel coordinates.
///
/// `delta` is only meaningful for `Move` events.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pos: egui::Pos2,
    pub delta: egui::Vec2,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, pos: egui::Pos2) -> Self {
        Self {
            kind,
            pos,
            delta: egui::Vec2::ZERO,
        }
    }

    pub fn moved(pos: egui::Pos2, delta: egui::Vec2) -> Self {
        Self {
            kind: PointerKind::Move,
            pos,
            delta,
        }
    }
}

/// Collect this frame's pointer events for a surface occupying `rect`.
///
/// Presses are only reported when they originate inside the rect; moves
/// and releases are always reported so an in-flight drag keeps tracking
/// after the cursor leaves the surface.
pub fn gather(ui: &egui::Ui, response: &egui::Response, rect: egui::Rect) -> Vec<PointerEvent> {
    let mut events = Vec::new();

    let (pressed, released, delta, latest_pos, press_origin) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.delta(),
            i.pointer.latest_pos(),
            i.pointer.press_origin(),
        )
    });

    let to_local = |pos: egui::Pos2| (pos - rect.min).to_pos2();

    if pressed {
        if let Some(origin) = press_origin {
            if rect.contains(origin) {
                events.push(PointerEvent::new(PointerKind::Down, to_local(origin)));
            }
        }
    }

    if delta != egui::Vec2::ZERO {
        if let Some(pos) = latest_pos {
            events.push(PointerEvent::moved(to_local(pos), delta));
        }
    }

    if released {
        if let Some(pos) = latest_pos {
            events.push(PointerEvent::new(PointerKind::Up, to_local(pos)));
        }
    }

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(PointerEvent::new(PointerKind::Click, to_local(pos)));
        }
    }

    if response.secondary_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(PointerEvent::new(PointerKind::ContextMenu, to_local(pos)));
        }
    }

    events
}
