// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher configuration.

use kurbo::Vec2;
use understory_element_tree::KeyCode;

/// Global settings of a [`LayerManager`](crate::LayerManager).
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Highest z-index a regular layer may use. The topmost modal layer sits at
    /// `max_z_index + 1` and the console above that.
    pub max_z_index: i32,
    /// Key that toggles the console layer on key-up.
    pub console_key: KeyCode,
    /// Number of messages the console keeps.
    pub log_message_limit: usize,
    /// Scroll positions moved per unit of wheel delta.
    pub scroll_wheel_factor: f64,
    /// Initial drag threshold in pixels, per axis.
    pub drag_threshold: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_z_index: 999_999,
            console_key: KeyCode::F(12),
            log_message_limit: 500,
            scroll_wheel_factor: 5.0,
            drag_threshold: 5.0,
        }
    }
}

/// How a drag session is presented.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSettings {
    /// The host draws its own marker when no drag visual was supplied, so no
    /// clone of the dragged element is shown.
    pub show_own_drag_marker: bool,
    /// Hide the pointer while a drag is in progress.
    pub hide_cursor_while_dragging: bool,
    /// Offset of the drag visual from the pointer.
    pub mouse_offset: Vec2,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            show_own_drag_marker: false,
            hide_cursor_while_dragging: false,
            mouse_offset: Vec2::new(10.0, 10.0),
        }
    }
}

/// Tooltip placement and sizing.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipSettings {
    /// Place the tooltip next to the pointer on every repaint.
    pub follow_mouse: bool,
    /// Offset of the tooltip from the pointer.
    pub mouse_offset: Vec2,
    /// Wider text is wrapped to this width.
    pub max_width: f64,
}

impl Default for TooltipSettings {
    fn default() -> Self {
        Self {
            follow_mouse: true,
            mouse_offset: Vec2::new(15.0, 15.0),
            max_width: 150.0,
        }
    }
}
