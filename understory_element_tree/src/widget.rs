// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Widget`] trait and the capability traits a widget may opt into.
//!
//! The dispatcher never inspects concrete widget types. It reads
//! [`Widget::capabilities`] and then asks for the matching trait object:
//!
//! | Capability | Accessor | Trait |
//! |---|---|---|
//! | `CLICK` | [`Widget::as_clickable`] | [`Clickable`] |
//! | `CHANGE` | [`Widget::as_changeable`] | [`Changeable`] |
//! | `KEY` | [`Widget::as_key_aware`] | [`KeyAware`] |
//! | `DRAG` | [`Widget::as_draggable`] | [`Draggable`] |
//! | `SELECT` | [`Widget::as_selectable`] | [`Selectable`] |
//! | `SCROLL` | [`Widget::as_scrollable`] | [`Scrollable`] |
//!
//! Mouse enter/move/exit handlers are common to every element and live on the
//! tree, not on the widget.
//!
//! Handlers receive the [`ElementId`] they fire for. They run while the tree is
//! borrowed, so they cannot mutate it directly; record what happened in shared
//! state and act on it after dispatch.

use core::any::Any;
use core::fmt;

use kurbo::{Point, Rect, Size, Vec2};
use understory_style::{DefaultStyleKind, Insets, StylePropertyType, StyleValue};

use crate::types::{Capabilities, ElementId, KeyCode, WidgetKind};

/// Plain notification handler.
pub type Handler = Box<dyn FnMut(ElementId)>;
/// Key handler; returns whether the key was consumed.
pub type KeyHandler = Box<dyn FnMut(ElementId, KeyCode) -> bool>;
/// Pointer handler for enter/move/exit.
pub type MouseHandler = Box<dyn FnMut(ElementId, Point)>;
/// Drag-start handler; returns whether the drag may start.
pub type DragStartHandler = Box<dyn FnMut(ElementId) -> bool>;
/// Drag-over / drop handler receiving `(target, dragged)`; returns acceptance.
pub type DragHandler = Box<dyn FnMut(ElementId, ElementId) -> bool>;

/// Where a pointer event happened.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerContext {
    /// The element receiving the event.
    pub element: ElementId,
    /// Pointer position in screen space.
    pub position: Point,
    /// The element's absolute bounds.
    pub bounds: Rect,
}

/// Geometry handed to [`Widget::refresh`] after the element or its children changed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RefreshContext {
    /// The element's own size.
    pub size: Size,
    /// Resolved Normal-state padding.
    pub padding: Insets,
    /// Extent of the children's local bounds (right and bottom edges).
    pub content: Size,
}

/// Mouse down, mouse up and click.
///
/// Each returns whether the event was used; the dispatcher only fires an event
/// on the topmost element that uses it.
pub trait Clickable {
    /// The button went down over the element.
    fn on_mouse_down(&mut self, cx: &PointerContext) -> bool;
    /// The button went up over the element.
    fn on_mouse_up(&mut self, cx: &PointerContext) -> bool;
    /// The button went down and up over the element.
    fn on_click(&mut self, cx: &PointerContext) -> bool;
}

/// Widgets with an editable value.
pub trait Changeable {
    /// Whether the user may change the value.
    fn is_changeable(&self) -> bool;
    /// Allow or forbid user changes.
    fn set_changeable(&mut self, changeable: bool);
    /// The value changed; returns whether a handler ran.
    fn on_change(&mut self, element: ElementId) -> bool;
}

/// Keyboard events.
pub trait KeyAware {
    /// A key went down; returns whether it was consumed.
    fn on_key_down(&mut self, element: ElementId, key: KeyCode) -> bool;
    /// A key went up; returns whether it was consumed.
    fn on_key_up(&mut self, element: ElementId, key: KeyCode) -> bool;
}

/// Drag sources and drop targets.
pub trait Draggable {
    /// Whether dragging is switched on for this element.
    fn is_draggable(&self) -> bool;
    /// Switch dragging on or off.
    fn set_draggable(&mut self, draggable: bool);
    /// Application-supplied element shown under the pointer while dragging.
    ///
    /// `None` means a clone of the dragged element is shown.
    fn drag_visual(&self) -> Option<ElementId>;
    /// A drag of this element is about to start; returns whether it may.
    fn on_drag_start(&mut self, element: ElementId) -> bool;
    /// `dragged` hovers over this element; returns whether it would accept a drop.
    fn on_drag_over(&mut self, element: ElementId, dragged: ElementId) -> bool;
    /// `dragged` was dropped on this element; returns whether it was accepted.
    fn on_drag_drop(&mut self, element: ElementId, dragged: ElementId) -> bool;
}

/// Widgets with a selection.
pub trait Selectable {
    /// The selection changed.
    fn on_select(&mut self, element: ElementId);
}

/// Widgets the scroll wheel can move.
pub trait Scrollable {
    /// Current scroll position; 0 while no scroll bar is shown.
    fn scroll_position(&self) -> f64;
    /// Largest accepted scroll position; 0 while no scroll bar is shown.
    fn scroll_maximum(&self) -> f64;
    /// Set the position. Values outside `0..=scroll_maximum()` are rejected.
    fn set_scroll_position(&mut self, position: f64) -> bool;
}

/// Behavior and state specific to one kind of element.
///
/// The tree owns common element state (geometry, flags, text, styles); a widget
/// carries what only its kind needs.
pub trait Widget: Any + fmt::Debug {
    /// The widget variant.
    fn kind(&self) -> WidgetKind;

    /// Event categories this widget handles.
    fn capabilities(&self) -> Capabilities;

    /// Which default style the element binds to.
    fn default_style(&self) -> DefaultStyleKind {
        DefaultStyleKind::Base
    }

    /// Whether other elements may be added as children.
    fn accepts_children(&self) -> bool {
        false
    }

    /// Offset subtracted from the absolute position of every child.
    fn scroll_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    /// Copy of the widget's state without its handlers.
    fn clone_widget(&self) -> Box<dyn Widget>;

    /// A resolved style value changed. `value` is the Normal-state value.
    fn style_changed(&mut self, _property: StylePropertyType, _value: &StyleValue) {}

    /// Size, padding or children changed.
    fn refresh(&mut self, _cx: &RefreshContext) {}

    /// See [`Clickable`].
    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        None
    }

    /// See [`Changeable`].
    fn as_changeable(&mut self) -> Option<&mut dyn Changeable> {
        None
    }

    /// See [`KeyAware`].
    fn as_key_aware(&mut self) -> Option<&mut dyn KeyAware> {
        None
    }

    /// See [`Draggable`].
    fn as_draggable(&mut self) -> Option<&mut dyn Draggable> {
        None
    }

    /// See [`Selectable`].
    fn as_selectable(&mut self) -> Option<&mut dyn Selectable> {
        None
    }

    /// See [`Scrollable`].
    fn as_scrollable(&mut self) -> Option<&mut dyn Scrollable> {
        None
    }

    /// Read-only view of [`Widget::as_scrollable`].
    fn scrollable(&self) -> Option<&dyn Scrollable> {
        None
    }

    /// Upcast for downcasting to the concrete widget.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete widget.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

fn fire(handler: &mut Option<Handler>, element: ElementId) -> bool {
    match handler {
        Some(h) => {
            h(element);
            true
        }
        None => false,
    }
}

/// Click handler slots shared by the clickable widgets.
///
/// Each event reports "used" exactly when a handler is installed.
#[derive(Default)]
pub struct ClickHandlers {
    click: Option<Handler>,
    mouse_down: Option<Handler>,
    mouse_up: Option<Handler>,
}

impl fmt::Debug for ClickHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHandlers")
            .field("click", &self.click.is_some())
            .field("mouse_down", &self.mouse_down.is_some())
            .field("mouse_up", &self.mouse_up.is_some())
            .finish()
    }
}

impl ClickHandlers {
    /// Install the click handler, replacing any previous one.
    pub fn set_on_click(&mut self, handler: impl FnMut(ElementId) + 'static) {
        self.click = Some(Box::new(handler));
    }

    /// Install the mouse-down handler.
    pub fn set_on_mouse_down(&mut self, handler: impl FnMut(ElementId) + 'static) {
        self.mouse_down = Some(Box::new(handler));
    }

    /// Install the mouse-up handler.
    pub fn set_on_mouse_up(&mut self, handler: impl FnMut(ElementId) + 'static) {
        self.mouse_up = Some(Box::new(handler));
    }

    /// Remove every handler.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Clickable for ClickHandlers {
    fn on_mouse_down(&mut self, cx: &PointerContext) -> bool {
        fire(&mut self.mouse_down, cx.element)
    }

    fn on_mouse_up(&mut self, cx: &PointerContext) -> bool {
        fire(&mut self.mouse_up, cx.element)
    }

    fn on_click(&mut self, cx: &PointerContext) -> bool {
        fire(&mut self.click, cx.element)
    }
}

/// Key handler slots.
#[derive(Default)]
pub struct KeyHandlers {
    key_down: Option<KeyHandler>,
    key_up: Option<KeyHandler>,
}

impl fmt::Debug for KeyHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandlers")
            .field("key_down", &self.key_down.is_some())
            .field("key_up", &self.key_up.is_some())
            .finish()
    }
}

impl KeyHandlers {
    /// Install the key-down handler.
    pub fn set_on_key_down(&mut self, handler: impl FnMut(ElementId, KeyCode) -> bool + 'static) {
        self.key_down = Some(Box::new(handler));
    }

    /// Install the key-up handler.
    pub fn set_on_key_up(&mut self, handler: impl FnMut(ElementId, KeyCode) -> bool + 'static) {
        self.key_up = Some(Box::new(handler));
    }
}

impl KeyAware for KeyHandlers {
    fn on_key_down(&mut self, element: ElementId, key: KeyCode) -> bool {
        self.key_down.as_mut().is_some_and(|h| h(element, key))
    }

    fn on_key_up(&mut self, element: ElementId, key: KeyCode) -> bool {
        self.key_up.as_mut().is_some_and(|h| h(element, key))
    }
}

/// Drag state and handler slots shared by the draggable widgets.
#[derive(Default)]
pub struct DragHandlers {
    draggable: bool,
    visual: Option<ElementId>,
    start: Option<DragStartHandler>,
    over: Option<DragHandler>,
    drop: Option<DragHandler>,
}

impl fmt::Debug for DragHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragHandlers")
            .field("draggable", &self.draggable)
            .field("visual", &self.visual)
            .field("start", &self.start.is_some())
            .field("over", &self.over.is_some())
            .field("drop", &self.drop.is_some())
            .finish()
    }
}

impl DragHandlers {
    /// Copy of the flag, without handlers or visual.
    pub fn clone_flags(&self) -> Self {
        Self {
            draggable: self.draggable,
            ..Self::default()
        }
    }

    /// Element shown under the pointer while dragging, instead of a clone.
    pub fn set_drag_visual(&mut self, visual: Option<ElementId>) {
        self.visual = visual;
    }

    /// Install the drag-start veto. Without one, a draggable element always starts.
    pub fn set_on_drag_start(&mut self, handler: impl FnMut(ElementId) -> bool + 'static) {
        self.start = Some(Box::new(handler));
    }

    /// Install the drag-over handler.
    pub fn set_on_drag_over(
        &mut self,
        handler: impl FnMut(ElementId, ElementId) -> bool + 'static,
    ) {
        self.over = Some(Box::new(handler));
    }

    /// Install the drop handler.
    pub fn set_on_drag_drop(
        &mut self,
        handler: impl FnMut(ElementId, ElementId) -> bool + 'static,
    ) {
        self.drop = Some(Box::new(handler));
    }
}

impl Draggable for DragHandlers {
    fn is_draggable(&self) -> bool {
        self.draggable
    }

    fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
    }

    fn drag_visual(&self) -> Option<ElementId> {
        self.visual
    }

    fn on_drag_start(&mut self, element: ElementId) -> bool {
        self.draggable && self.start.as_mut().is_none_or(|h| h(element))
    }

    fn on_drag_over(&mut self, element: ElementId, dragged: ElementId) -> bool {
        self.over.as_mut().is_some_and(|h| h(element, dragged))
    }

    fn on_drag_drop(&mut self, element: ElementId, dragged: ElementId) -> bool {
        self.drop.as_mut().is_some_and(|h| h(element, dragged))
    }
}

/// An optional change or select handler.
#[derive(Default)]
pub struct NotifySlot(Option<Handler>);

impl fmt::Debug for NotifySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NotifySlot").field(&self.0.is_some()).finish()
    }
}

impl NotifySlot {
    /// Install the handler.
    pub fn set(&mut self, handler: impl FnMut(ElementId) + 'static) {
        self.0 = Some(Box::new(handler));
    }

    /// Run the handler; returns whether one is installed.
    pub fn fire(&mut self, element: ElementId) -> bool {
        fire(&mut self.0, element)
    }
}

macro_rules! any_methods {
    () => {
        fn as_any(&self) -> &dyn core::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
            self
        }
    };
}

pub(crate) use any_methods;

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use std::rc::Rc;

    fn cx() -> PointerContext {
        PointerContext {
            element: ElementId::new(0, 1),
            position: Point::ZERO,
            bounds: Rect::ZERO,
        }
    }

    #[test]
    fn click_used_only_with_handler() {
        let mut h = ClickHandlers::default();
        assert!(!h.on_click(&cx()), "no handler means unused");
        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();
        h.set_on_click(move |_| seen.set(seen.get() + 1));
        assert!(h.on_click(&cx()));
        assert!(!h.on_mouse_up(&cx()), "other slots stay empty");
        assert_eq!(hits.get(), 1, "handler ran once");
    }

    #[test]
    fn drag_start_needs_flag_and_allows_without_handler() {
        let id = ElementId::new(0, 1);
        let mut d = DragHandlers::default();
        assert!(!d.on_drag_start(id), "not draggable by default");
        d.set_draggable(true);
        assert!(d.on_drag_start(id), "no veto handler");
        d.set_on_drag_start(|_| false);
        assert!(!d.on_drag_start(id), "vetoed");
        assert!(!d.on_drag_over(id, id), "no handler refuses");
        assert!(d.clone_flags().is_draggable(), "flag survives cloning");
    }
}
