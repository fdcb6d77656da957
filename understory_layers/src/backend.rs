// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host boundary: drawing, text measurement, keyboard focus, cursor, clock.

use kurbo::{Rect, Size};
use understory_element_tree::{ElementId, WidgetKind};
use understory_style::ResolvedState;

/// One element to draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem<'a> {
    /// The element.
    pub element: ElementId,
    /// Its widget kind.
    pub kind: WidgetKind,
    /// Screen-space bounds.
    pub bounds: Rect,
    /// Text content.
    pub text: &'a str,
    /// Rendering snapshot for the element's current interaction state.
    pub style: &'a ResolvedState,
}

/// Immediate-mode rendering and input services of the host.
///
/// The dispatcher calls into this once per visible element per frame and for
/// the focus bridge; it never stores anything the host hands back.
pub trait Backend {
    /// Draw one element.
    fn draw_element(&mut self, item: &DrawItem<'_>);

    /// Draw the tooltip box.
    fn draw_tooltip(&mut self, text: &str, bounds: Rect, style: &ResolvedState);

    /// Size of `text` rendered with `style`, wrapped at `max_width` if given.
    fn measure_text(&self, text: &str, style: &ResolvedState, max_width: Option<f64>) -> Size;

    /// Screen size in pixels.
    fn screen_size(&self) -> Size;

    /// Seconds since an arbitrary fixed point; drives animations.
    fn now(&self) -> f64;

    /// Give the host's native text input focus to the control named `guid`.
    fn focus_text_input(&mut self, guid: &str);

    /// Drop the host's native keyboard focus.
    fn clear_keyboard_focus(&mut self);

    /// Show or hide the pointer.
    fn set_cursor_visible(&mut self, visible: bool);
}
