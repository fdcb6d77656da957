// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrolling widgets: [`ScrollBox`] and [`ListBox`].
//!
//! Both keep their scroll bars as plain [`ScrollBar`] models rather than child
//! elements. A hidden bar reads position 0 and maximum 0, and position writes
//! outside `0..=maximum` are rejected, not clamped. Wheel input clamps before
//! writing.

use kurbo::{Point, Size, Vec2};
use understory_style::{DefaultStyleKind, Insets, StylePropertyType, StyleValue};

use crate::types::{Capabilities, ElementId, ScrollBarPolicy, WidgetKind};
use crate::widget::{
    ClickHandlers, Clickable, DragHandlers, Draggable, KeyAware, KeyHandlers, NotifySlot,
    PointerContext, RefreshContext, Scrollable, Selectable, Widget, any_methods,
};
use crate::widgets::SliderModel;

/// Cross-axis size of a scroll bar.
pub const SCROLL_BAR_THICKNESS: f64 = 10.0;

/// One scroll bar: visibility, drawn length and a `0..=maximum` slider model.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollBar {
    model: SliderModel,
    visible: bool,
    length: f64,
}

impl ScrollBar {
    /// Whether the bar is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Drawn length along the scroll axis.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Scroll position; 0 while hidden.
    pub fn position(&self) -> f64 {
        if self.visible { self.model.value() } else { 0.0 }
    }

    /// Largest position; 0 while hidden.
    pub fn maximum(&self) -> f64 {
        if self.visible {
            self.model.maximum()
        } else {
            0.0
        }
    }

    /// Set the position; out-of-range values are rejected.
    pub fn set_position(&mut self, position: f64) -> bool {
        if position >= 0.0 && position <= self.maximum() {
            self.model.set_value(position);
            true
        } else {
            false
        }
    }

    fn show(&mut self, maximum: f64) {
        self.visible = true;
        self.model.set_maximum(maximum.max(0.0));
    }

    fn hide(&mut self) {
        self.visible = false;
        self.model.set_value(0.0);
    }
}

/// A container whose children scroll under two scroll bars.
///
/// The extents come from the children's local bounds; the wheel moves the
/// vertical bar.
#[derive(Debug, Default)]
pub struct ScrollBox {
    policy: ScrollBarPolicy,
    vertical: ScrollBar,
    horizontal: ScrollBar,
    /// Drag source and drop target state.
    pub drag: DragHandlers,
}

impl ScrollBox {
    /// A scroll box showing the bars `policy` allows.
    pub fn new(policy: ScrollBarPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Which bars may be shown.
    pub fn policy(&self) -> ScrollBarPolicy {
        self.policy
    }

    /// Change the policy. Takes effect on the next refresh.
    pub fn set_policy(&mut self, policy: ScrollBarPolicy) {
        self.policy = policy;
    }

    /// The vertical bar.
    pub fn vertical(&self) -> &ScrollBar {
        &self.vertical
    }

    /// The horizontal bar.
    pub fn horizontal(&self) -> &ScrollBar {
        &self.horizontal
    }

    /// Set the vertical position; out-of-range values are rejected.
    pub fn set_vertical_position(&mut self, position: f64) -> bool {
        self.vertical.set_position(position)
    }

    /// Set the horizontal position; out-of-range values are rejected.
    pub fn set_horizontal_position(&mut self, position: f64) -> bool {
        self.horizontal.set_position(position)
    }

    /// Recompute bar visibility, lengths and maxima for a box of size `own`
    /// holding content of size `content`.
    pub fn refresh_extents(&mut self, own: Size, content: Size) {
        let needs_vertical = self.policy.allows_vertical() && content.height > own.height;
        let needs_horizontal = self.policy.allows_horizontal() && content.width > own.width;
        if needs_vertical {
            self.vertical.show(content.height - own.height);
        } else {
            self.vertical.hide();
        }
        if needs_horizontal {
            self.horizontal.show(content.width - own.width);
        } else {
            self.horizontal.hide();
        }
        match (self.vertical.visible, self.horizontal.visible) {
            (true, true) => {
                self.vertical.length = own.height - SCROLL_BAR_THICKNESS;
                self.horizontal.length = own.width - SCROLL_BAR_THICKNESS;
            }
            (true, false) => self.vertical.length = own.height,
            (false, true) => self.horizontal.length = own.width,
            (false, false) => {}
        }
    }
}

impl Scrollable for ScrollBox {
    fn scroll_position(&self) -> f64 {
        self.vertical.position()
    }

    fn scroll_maximum(&self) -> f64 {
        self.vertical.maximum()
    }

    fn set_scroll_position(&mut self, position: f64) -> bool {
        self.vertical.set_position(position)
    }
}

impl Widget for ScrollBox {
    fn kind(&self) -> WidgetKind {
        WidgetKind::ScrollBox
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::MOUSE | Capabilities::DRAG | Capabilities::SCROLL
    }

    fn default_style(&self) -> DefaultStyleKind {
        DefaultStyleKind::Box
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn scroll_offset(&self) -> Vec2 {
        Vec2::new(self.horizontal.position(), self.vertical.position())
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(Self {
            policy: self.policy,
            vertical: self.vertical,
            horizontal: self.horizontal,
            drag: self.drag.clone_flags(),
        })
    }

    fn refresh(&mut self, cx: &RefreshContext) {
        self.refresh_extents(cx.size, cx.content);
    }

    fn as_draggable(&mut self) -> Option<&mut dyn Draggable> {
        Some(&mut self.drag)
    }

    fn as_scrollable(&mut self) -> Option<&mut dyn Scrollable> {
        Some(self)
    }

    fn scrollable(&self) -> Option<&dyn Scrollable> {
        Some(self)
    }

    any_methods!();
}

/// A scrollable list of text items with at most one selected item.
#[derive(Debug)]
pub struct ListBox {
    items: Vec<String>,
    selected: Option<usize>,
    item_height: f64,
    padding: Insets,
    size: Size,
    bar: ScrollBar,
    /// Click handlers, run after selection handling.
    pub click: ClickHandlers,
    /// Key handlers.
    pub keys: KeyHandlers,
    /// Runs when a mouse press selects an item.
    pub on_select: NotifySlot,
}

impl Default for ListBox {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            item_height: 20.0,
            padding: Insets::default(),
            size: Size::ZERO,
            bar: ScrollBar::default(),
            click: ClickHandlers::default(),
            keys: KeyHandlers::default(),
            on_select: NotifySlot::default(),
        }
    }
}

impl ListBox {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The items in display order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item.
    pub fn add_item(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
        self.update_bar();
    }

    /// Insert an item at `index`; returns `false` if `index > len()`.
    pub fn insert_item(&mut self, index: usize, item: impl Into<String>) -> bool {
        if index > self.items.len() {
            return false;
        }
        self.items.insert(index, item.into());
        self.update_bar();
        true
    }

    /// Remove the first item equal to `item`.
    pub fn remove_item(&mut self, item: &str) -> bool {
        let Some(index) = self.items.iter().position(|i| i == item) else {
            return false;
        };
        self.remove_at(index).is_some()
    }

    /// Remove the item at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        self.update_bar();
        Some(removed)
    }

    /// The selected index.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Select an item or clear the selection; out-of-range indices are rejected.
    pub fn set_selected(&mut self, selected: Option<usize>) -> bool {
        match selected {
            Some(i) if i >= self.items.len() => false,
            _ => {
                self.selected = selected;
                true
            }
        }
    }

    /// Height of one item.
    pub fn item_height(&self) -> f64 {
        self.item_height
    }

    /// The list's scroll bar.
    pub fn scroll_bar(&self) -> &ScrollBar {
        &self.bar
    }

    fn inner_height(&self) -> f64 {
        self.size.height - f64::from(self.padding.top) - f64::from(self.padding.bottom)
    }

    fn update_bar(&mut self) {
        #[allow(
            clippy::cast_precision_loss,
            reason = "item counts are far below 2^52"
        )]
        let total = self.items.len() as f64 * self.item_height;
        let inner = self.inner_height();
        if total > inner {
            self.bar.show(total - inner);
            self.bar.length = inner;
        } else {
            self.bar.hide();
        }
    }

    /// The item under `position`, given the list's absolute origin.
    fn item_at(&self, origin: Point, position: Point) -> Option<usize> {
        let y = position.y - origin.y + self.bar.position() - f64::from(self.padding.top);
        if y < 0.0 || self.item_height <= 0.0 {
            return None;
        }
        let right = if self.bar.visible {
            origin.x + self.size.width - SCROLL_BAR_THICKNESS - f64::from(self.padding.right)
        } else {
            f64::INFINITY
        };
        let inside_x = !self.bar.visible
            || (position.x < right && position.x > origin.x + f64::from(self.padding.left));
        let inside_y = position.y < origin.y + self.size.height - f64::from(self.padding.bottom);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "y is non-negative and bounded by the list height"
        )]
        let index = (y / self.item_height) as usize;
        (index < self.items.len() && inside_x && inside_y).then_some(index)
    }
}

impl Clickable for ListBox {
    fn on_mouse_down(&mut self, cx: &PointerContext) -> bool {
        if let Some(index) = self.item_at(cx.bounds.origin(), cx.position) {
            self.selected = Some(index);
            self.on_select(cx.element);
        }
        self.click.on_mouse_down(cx);
        true
    }

    fn on_mouse_up(&mut self, cx: &PointerContext) -> bool {
        self.click.on_mouse_up(cx)
    }

    fn on_click(&mut self, cx: &PointerContext) -> bool {
        self.click.on_click(cx);
        true
    }
}

impl Selectable for ListBox {
    fn on_select(&mut self, element: ElementId) {
        self.on_select.fire(element);
    }
}

impl Scrollable for ListBox {
    fn scroll_position(&self) -> f64 {
        self.bar.position()
    }

    fn scroll_maximum(&self) -> f64 {
        self.bar.maximum()
    }

    fn set_scroll_position(&mut self, position: f64) -> bool {
        self.bar.set_position(position)
    }
}

impl Widget for ListBox {
    fn kind(&self) -> WidgetKind {
        WidgetKind::ListBox
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CLICK
            | Capabilities::KEY
            | Capabilities::MOUSE
            | Capabilities::SELECT
            | Capabilities::SCROLL
    }

    fn default_style(&self) -> DefaultStyleKind {
        DefaultStyleKind::ListBox
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(Self {
            items: self.items.clone(),
            selected: self.selected,
            item_height: self.item_height,
            padding: self.padding,
            size: self.size,
            bar: self.bar,
            ..Self::default()
        })
    }

    fn style_changed(&mut self, property: StylePropertyType, value: &StyleValue) {
        if property == StylePropertyType::ItemHeight {
            if let Some(h) = value.as_float() {
                self.item_height = h;
                self.update_bar();
            }
        }
    }

    fn refresh(&mut self, cx: &RefreshContext) {
        self.size = cx.size;
        self.padding = cx.padding;
        self.update_bar();
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        Some(self)
    }

    fn as_key_aware(&mut self) -> Option<&mut dyn KeyAware> {
        Some(&mut self.keys)
    }

    fn as_selectable(&mut self) -> Option<&mut dyn Selectable> {
        Some(self)
    }

    fn as_scrollable(&mut self) -> Option<&mut dyn Scrollable> {
        Some(self)
    }

    fn scrollable(&self) -> Option<&dyn Scrollable> {
        Some(self)
    }

    any_methods!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    #[test]
    fn vertical_bar_appears_on_overflow() {
        let mut b = ScrollBox::new(ScrollBarPolicy::Both);
        b.refresh_extents(Size::new(100.0, 100.0), Size::new(50.0, 200.0));
        assert!(b.vertical().is_visible());
        assert!(!b.horizontal().is_visible());
        assert_eq!(b.scroll_maximum(), 100.0, "content minus viewport");
        assert_eq!(b.vertical().length(), 100.0);
    }

    #[test]
    fn hidden_bar_reads_zero_and_rejects_writes() {
        let mut b = ScrollBox::new(ScrollBarPolicy::Horizontal);
        b.refresh_extents(Size::new(100.0, 100.0), Size::new(50.0, 200.0));
        assert!(!b.vertical().is_visible(), "policy forbids the vertical bar");
        assert_eq!(b.scroll_maximum(), 0.0);
        assert!(!b.set_scroll_position(10.0), "nothing to scroll");
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let mut b = ScrollBox::default();
        b.refresh_extents(Size::new(100.0, 100.0), Size::new(300.0, 200.0));
        assert!(b.set_scroll_position(100.0));
        assert!(!b.set_scroll_position(101.0), "rejected, not clamped");
        assert!(!b.set_scroll_position(-1.0));
        assert_eq!(b.scroll_position(), 100.0, "value unchanged");
        assert_eq!(b.scroll_offset(), Vec2::new(0.0, 100.0));
        assert_eq!(b.vertical().length(), 90.0, "both bars share the corner");
    }

    #[test]
    fn shrinking_content_hides_and_resets() {
        let mut b = ScrollBox::default();
        b.refresh_extents(Size::new(100.0, 100.0), Size::new(50.0, 200.0));
        b.set_scroll_position(60.0);
        b.refresh_extents(Size::new(100.0, 100.0), Size::new(50.0, 80.0));
        assert_eq!(b.scroll_position(), 0.0);
        b.refresh_extents(Size::new(100.0, 100.0), Size::new(50.0, 200.0));
        assert_eq!(b.scroll_position(), 0.0, "hidden bars reset their value");
    }

    fn list(items: usize) -> ListBox {
        let mut l = ListBox::new();
        for i in 0..items {
            l.add_item(format!("item {i}"));
        }
        l.refresh(&RefreshContext {
            size: Size::new(100.0, 100.0),
            padding: Insets::default(),
            content: Size::ZERO,
        });
        l
    }

    #[test]
    fn list_scroll_maximum_from_items() {
        let l = list(3);
        assert_eq!(l.scroll_maximum(), 0.0, "60px of items fit");
        let l = list(10);
        assert_eq!(l.scroll_maximum(), 100.0, "200px of items in 100px");
    }

    #[test]
    fn list_bar_resets_when_items_fit() {
        let mut l = list(10);
        assert!(l.set_scroll_position(60.0));
        while l.len() > 3 {
            l.remove_at(0);
        }
        assert!(!l.scroll_bar().is_visible());
        for i in 0..7 {
            l.add_item(format!("again {i}"));
        }
        assert_eq!(l.scroll_maximum(), 100.0);
        assert_eq!(l.scroll_position(), 0.0, "hidden bar dropped its value");
    }

    #[test]
    fn list_selection_bounds() {
        let mut l = list(3);
        assert!(l.set_selected(Some(2)));
        assert!(!l.set_selected(Some(3)), "out of range");
        assert_eq!(l.selected(), Some(2));
        assert!(l.set_selected(None));
        l.set_selected(Some(2));
        l.remove_at(0);
        assert_eq!(l.selected(), Some(1), "selection follows its item");
    }

    #[test]
    fn mouse_down_selects_item_under_pointer() {
        let mut l = list(10);
        l.set_scroll_position(20.0);
        let cx = PointerContext {
            element: ElementId::new(0, 1),
            position: Point::new(20.0, 45.0),
            bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
        };
        assert!(l.on_mouse_down(&cx), "list boxes always use mouse down");
        assert_eq!(l.selected(), Some(3), "(45 + 20) / 20");
        let on_bar = PointerContext {
            position: Point::new(95.0, 45.0),
            ..cx
        };
        l.set_selected(None);
        l.on_mouse_down(&on_bar);
        assert_eq!(l.selected(), None, "presses on the bar do not select");
    }
}
