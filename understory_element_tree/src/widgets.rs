// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stock widgets: panels, labels, buttons, check boxes, text inputs, sliders and
//! layer roots. Scrolling widgets live in [`crate::scroll`].

use understory_style::{DefaultStyleKind, StylePropertyType, StyleValue};

use crate::types::{Capabilities, ElementId, Orientation, WidgetKind};
use crate::widget::{
    Changeable, ClickHandlers, Clickable, DragHandlers, Draggable, KeyAware, KeyHandlers,
    NotifySlot, PointerContext, Selectable, Widget, any_methods,
};

/// A plain container.
#[derive(Debug, Default)]
pub struct Panel {
    /// Drag source and drop target state.
    pub drag: DragHandlers,
}

impl Widget for Panel {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Panel
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::MOUSE | Capabilities::DRAG
    }

    fn default_style(&self) -> DefaultStyleKind {
        DefaultStyleKind::Box
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(Self {
            drag: self.drag.clone_flags(),
        })
    }

    fn as_draggable(&mut self) -> Option<&mut dyn Draggable> {
        Some(&mut self.drag)
    }

    any_methods!();
}

/// Static text.
#[derive(Debug, Default)]
pub struct Label;

impl Widget for Label {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Label
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::MOUSE
    }

    fn default_style(&self) -> DefaultStyleKind {
        DefaultStyleKind::Label
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(Self)
    }

    any_methods!();
}

/// A push button.
#[derive(Debug, Default)]
pub struct Button {
    /// Click handlers.
    pub click: ClickHandlers,
    /// Key handlers.
    pub keys: KeyHandlers,
    /// Drag source and drop target state.
    pub drag: DragHandlers,
}

impl Widget for Button {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Button
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CLICK | Capabilities::KEY | Capabilities::MOUSE | Capabilities::DRAG
    }

    fn default_style(&self) -> DefaultStyleKind {
        DefaultStyleKind::Button
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(Self {
            drag: self.drag.clone_flags(),
            ..Self::default()
        })
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        Some(&mut self.click)
    }

    fn as_key_aware(&mut self) -> Option<&mut dyn KeyAware> {
        Some(&mut self.keys)
    }

    fn as_draggable(&mut self) -> Option<&mut dyn Draggable> {
        Some(&mut self.drag)
    }

    any_methods!();
}

/// A toggle. Clicking flips [`CheckBox::checked`] and fires the select handler.
#[derive(Debug, Default)]
pub struct CheckBox {
    checked: bool,
    /// Click handlers, run after the toggle.
    pub click: ClickHandlers,
    /// Key handlers.
    pub keys: KeyHandlers,
    /// Runs after every toggle.
    pub on_select: NotifySlot,
}

impl CheckBox {
    /// Whether the box is checked.
    pub fn checked(&self) -> bool {
        self.checked
    }

    /// Check or uncheck without firing handlers.
    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }
}

impl Clickable for CheckBox {
    fn on_mouse_down(&mut self, cx: &PointerContext) -> bool {
        self.click.on_mouse_down(cx)
    }

    fn on_mouse_up(&mut self, cx: &PointerContext) -> bool {
        self.click.on_mouse_up(cx)
    }

    fn on_click(&mut self, cx: &PointerContext) -> bool {
        self.checked = !self.checked;
        self.click.on_click(cx);
        self.on_select(cx.element);
        true
    }
}

impl Selectable for CheckBox {
    fn on_select(&mut self, element: ElementId) {
        self.on_select.fire(element);
    }
}

impl Widget for CheckBox {
    fn kind(&self) -> WidgetKind {
        WidgetKind::CheckBox
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CLICK | Capabilities::KEY | Capabilities::MOUSE | Capabilities::SELECT
    }

    fn default_style(&self) -> DefaultStyleKind {
        DefaultStyleKind::CheckBox
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(Self {
            checked: self.checked,
            ..Self::default()
        })
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

    any_methods!();
}

/// Single- or multi-line text input.
///
/// The text itself is the element's text. The host edits it natively and reports
/// the result through [`Tree::input_text`](crate::Tree::input_text).
#[derive(Debug)]
pub struct TextInput {
    multiline: bool,
    masked: bool,
    changeable: bool,
    /// Click handlers.
    pub click: ClickHandlers,
    /// Key handlers.
    pub keys: KeyHandlers,
    /// Runs after the text changed through input.
    pub on_change: NotifySlot,
}

impl TextInput {
    /// A single-line edit box.
    pub fn edit_box() -> Self {
        Self::new(false)
    }

    /// A multi-line, word-wrapping text area.
    pub fn text_area() -> Self {
        Self::new(true)
    }

    fn new(multiline: bool) -> Self {
        Self {
            multiline,
            masked: false,
            changeable: true,
            click: ClickHandlers::default(),
            keys: KeyHandlers::default(),
            on_change: NotifySlot::default(),
        }
    }

    /// Whether the input accepts several lines.
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// Whether the text is drawn masked (password entry).
    pub fn masked(&self) -> bool {
        self.masked
    }

    /// Mask or unmask the text.
    pub fn set_masked(&mut self, masked: bool) {
        self.masked = masked;
    }
}

impl Changeable for TextInput {
    fn is_changeable(&self) -> bool {
        self.changeable
    }

    fn set_changeable(&mut self, changeable: bool) {
        self.changeable = changeable;
    }

    fn on_change(&mut self, element: ElementId) -> bool {
        self.on_change.fire(element)
    }
}

impl Widget for TextInput {
    fn kind(&self) -> WidgetKind {
        if self.multiline {
            WidgetKind::TextArea
        } else {
            WidgetKind::EditBox
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CLICK | Capabilities::KEY | Capabilities::MOUSE | Capabilities::CHANGE
    }

    fn default_style(&self) -> DefaultStyleKind {
        if self.multiline {
            DefaultStyleKind::TextArea
        } else {
            DefaultStyleKind::EditBox
        }
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        let mut copy = Self::new(self.multiline);
        copy.masked = self.masked;
        copy.changeable = self.changeable;
        Box::new(copy)
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        Some(&mut self.click)
    }

    fn as_changeable(&mut self) -> Option<&mut dyn Changeable> {
        Some(self)
    }

    fn as_key_aware(&mut self) -> Option<&mut dyn KeyAware> {
        Some(&mut self.keys)
    }

    any_methods!();
}

/// Range, value and step of a slider.
///
/// With a positive step, written values are snapped to the step and clamped to
/// the range. Moving a bound past the value drags the value along.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SliderModel {
    minimum: f64,
    maximum: f64,
    value: f64,
    step: f64,
}

impl SliderModel {
    /// A model over `minimum..=maximum` starting at `value`.
    pub fn new(minimum: f64, maximum: f64, value: f64) -> Self {
        Self {
            minimum,
            maximum,
            value,
            step: 0.0,
        }
    }

    /// Lower bound.
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Set the lower bound, raising the value if it falls below.
    pub fn set_minimum(&mut self, minimum: f64) {
        self.minimum = minimum;
        self.value = self.value.max(minimum);
    }

    /// Upper bound.
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// Set the upper bound, lowering the value if it exceeds it.
    pub fn set_maximum(&mut self, maximum: f64) {
        self.maximum = maximum;
        self.value = self.value.min(maximum);
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value, snapped when a step is set.
    pub fn set_value(&mut self, value: f64) {
        self.value = self.snap(value);
    }

    /// Step size; 0 means continuous.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Set the step. Non-positive values mean continuous.
    pub fn set_step(&mut self, step: f64) {
        self.step = if step > 0.0 { step } else { 0.0 };
    }

    /// `value` as it would be stored.
    pub fn snap(&self, value: f64) -> f64 {
        if self.step > 0.0 {
            ((value / self.step).round() * self.step).clamp(self.minimum, self.maximum)
        } else {
            value
        }
    }
}

/// A horizontal or vertical slider.
#[derive(Debug)]
pub struct Slider {
    /// Range and value.
    pub model: SliderModel,
    orientation: Orientation,
    changeable: bool,
    default_value: f64,
    reset_on_release: bool,
    thumb_width: f64,
    thumb_height: f64,
    /// Click handlers.
    pub click: ClickHandlers,
    /// Key handlers.
    pub keys: KeyHandlers,
    /// Runs when input changed the value.
    pub on_change: NotifySlot,
    /// Runs when the thumb is released.
    pub on_release: NotifySlot,
}

impl Slider {
    /// A slider over `minimum..=maximum` starting (and resetting) at `value`.
    pub fn new(orientation: Orientation, minimum: f64, maximum: f64, value: f64) -> Self {
        Self {
            model: SliderModel::new(minimum, maximum, value),
            orientation,
            changeable: true,
            default_value: value,
            reset_on_release: false,
            thumb_width: 0.0,
            thumb_height: 0.0,
            click: ClickHandlers::default(),
            keys: KeyHandlers::default(),
            on_change: NotifySlot::default(),
            on_release: NotifySlot::default(),
        }
    }

    /// Slider orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Value restored on release when [`Slider::reset_on_release`] is set.
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Set the value restored on release.
    pub fn set_default_value(&mut self, value: f64) {
        self.default_value = value;
    }

    /// Whether releasing the thumb restores the default value.
    pub fn reset_on_release(&self) -> bool {
        self.reset_on_release
    }

    /// Restore the default value on release.
    pub fn set_reset_on_release(&mut self, reset: bool) {
        self.reset_on_release = reset;
    }

    /// Fixed thumb size from the style; 0 stretches.
    pub fn thumb_size(&self) -> (f64, f64) {
        (self.thumb_width, self.thumb_height)
    }

    /// Apply a value produced by user input.
    ///
    /// Returns `true` and fires the change handler if the stored value changed.
    pub fn input(&mut self, element: ElementId, raw: f64) -> bool {
        if !self.changeable {
            return false;
        }
        let snapped = self.model.snap(raw);
        if snapped == self.model.value() {
            return false;
        }
        self.model.set_value(snapped);
        self.on_change(element);
        true
    }

    /// The user released the thumb.
    pub fn release(&mut self, element: ElementId) {
        if !self.changeable {
            return;
        }
        self.on_release.fire(element);
        if self.reset_on_release {
            self.input(element, self.default_value);
        }
    }
}

impl Changeable for Slider {
    fn is_changeable(&self) -> bool {
        self.changeable
    }

    fn set_changeable(&mut self, changeable: bool) {
        self.changeable = changeable;
    }

    fn on_change(&mut self, element: ElementId) -> bool {
        self.on_change.fire(element)
    }
}

impl Widget for Slider {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Slider
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CLICK | Capabilities::KEY | Capabilities::MOUSE | Capabilities::CHANGE
    }

    fn default_style(&self) -> DefaultStyleKind {
        match self.orientation {
            Orientation::Horizontal => DefaultStyleKind::HorizontalSlider,
            Orientation::Vertical => DefaultStyleKind::VerticalSlider,
        }
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        let mut copy = Self::new(
            self.orientation,
            self.model.minimum(),
            self.model.maximum(),
            self.model.value(),
        );
        copy.model.set_step(self.model.step());
        copy.changeable = self.changeable;
        copy.default_value = self.default_value;
        copy.reset_on_release = self.reset_on_release;
        copy.thumb_width = self.thumb_width;
        copy.thumb_height = self.thumb_height;
        Box::new(copy)
    }

    fn style_changed(&mut self, property: StylePropertyType, value: &StyleValue) {
        match property {
            StylePropertyType::ThumbWidth => {
                self.thumb_width = value.as_float().unwrap_or(self.thumb_width);
            }
            StylePropertyType::ThumbHeight => {
                self.thumb_height = value.as_float().unwrap_or(self.thumb_height);
            }
            _ => {}
        }
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        Some(&mut self.click)
    }

    fn as_changeable(&mut self) -> Option<&mut dyn Changeable> {
        Some(self)
    }

    fn as_key_aware(&mut self) -> Option<&mut dyn KeyAware> {
        Some(&mut self.keys)
    }

    any_methods!();
}

/// Root element of a top-level layer.
///
/// Layer roots are never children of another element.
#[derive(Debug, Default)]
pub struct LayerRoot {
    /// Key handlers, the last stop of key bubbling.
    pub keys: KeyHandlers,
}

impl Widget for LayerRoot {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Layer
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::KEY
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(Self::default())
    }

    fn as_key_aware(&mut self) -> Option<&mut dyn KeyAware> {
        Some(&mut self.keys)
    }

    any_methods!();
}
