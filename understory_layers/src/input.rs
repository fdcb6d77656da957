// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw input events handed to the dispatcher once per host callback.

use kurbo::{Point, Vec2};
use understory_element_tree::KeyCode;

/// Category of a [`RawInputEvent`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A mouse button went down.
    MouseDown,
    /// A mouse button went up.
    MouseUp,
    /// The pointer moved with a button held.
    MouseDrag,
    /// The pointer moved without a button held.
    MouseMove,
    /// The wheel turned.
    ScrollWheel,
    /// A key went down.
    KeyDown,
    /// A key went up.
    KeyUp,
    /// The host is drawing a frame.
    Repaint,
}

/// One host input event.
///
/// Every event carries the current pointer position; a change of position
/// against the previous event is treated as a mouse move regardless of kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawInputEvent {
    /// What happened.
    pub kind: EventKind,
    /// Pointer position in screen coordinates.
    pub mouse_position: Point,
    /// Key for key events.
    pub key: Option<KeyCode>,
    /// Wheel delta for scroll events.
    pub scroll_delta: Vec2,
}

impl RawInputEvent {
    /// A pointer-only event of `kind` at `position`.
    pub fn pointer(kind: EventKind, position: Point) -> Self {
        Self {
            kind,
            mouse_position: position,
            key: None,
            scroll_delta: Vec2::ZERO,
        }
    }

    /// A key event at the current pointer position.
    pub fn key(kind: EventKind, key: KeyCode, position: Point) -> Self {
        Self {
            key: Some(key),
            ..Self::pointer(kind, position)
        }
    }

    /// A wheel event.
    pub fn scroll(position: Point, delta: Vec2) -> Self {
        Self {
            scroll_delta: delta,
            ..Self::pointer(EventKind::ScrollWheel, position)
        }
    }

    /// A repaint at the current pointer position.
    pub fn repaint(position: Point) -> Self {
        Self::pointer(EventKind::Repaint, position)
    }
}
