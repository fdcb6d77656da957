// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Style`]: state-independent properties plus four [`StyleState`]s.

use core::cell::RefCell;
use core::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::notify::{StyleListener, Subscribers};
use crate::state::StyleState;
use crate::types::{
    Color, EdgeFamily, Fill, FontFace, ImagePosition, StylePropertyType, StyleStateType,
    StyleValue, TextAnchor, TextClipping,
};

/// Shared handle to a style.
///
/// Default and class styles are shared by many elements; the asset registry keeps
/// weak handles to styles waiting on a bundle.
pub type StyleRef = Rc<RefCell<Style>>;

/// A named bundle of optional property overrides.
///
/// Mutating any property notifies every live subscriber with the property tag.
/// Per-state properties are edited through [`Style::state_mut`], whose guard
/// delivers the notifications when it is dropped.
#[derive(Debug, Default)]
pub struct Style {
    name: Option<String>,
    text: Option<String>,
    top: Option<f64>,
    left: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    enabled: Option<bool>,
    visible: Option<bool>,
    word_wrap: Option<bool>,
    clipping: Option<TextClipping>,
    check_image_position: Option<ImagePosition>,
    thumb_height: Option<f64>,
    thumb_width: Option<f64>,
    item_height: Option<f64>,
    states: [StyleState; 4],
    subscribers: Subscribers,
}

macro_rules! independent {
    ($(($field:ident, $set:ident, $ty:ty, $tag:ident, $doc:literal)),* $(,)?) => {
        $(
            #[doc = concat!("The ", $doc, ", if set.")]
            pub fn $field(&self) -> Option<$ty> {
                self.$field
            }

            #[doc = concat!("Set or clear the ", $doc, ".")]
            pub fn $set(&mut self, value: impl Into<Option<$ty>>) {
                self.$field = value.into();
                self.subscribers.notify(StylePropertyType::$tag);
            }
        )*
    };
}

impl Style {
    /// Create an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> StyleRef {
        Rc::new(RefCell::new(self))
    }

    /// The element name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set or clear the element name.
    pub fn set_name(&mut self, value: impl Into<Option<String>>) {
        self.name = value.into();
        self.subscribers.notify(StylePropertyType::Name);
    }

    /// The element text, if set.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Set or clear the element text.
    pub fn set_text(&mut self, value: impl Into<Option<String>>) {
        self.text = value.into();
        self.subscribers.notify(StylePropertyType::Text);
    }

    independent! {
        (top, set_top, f64, Top, "local top offset"),
        (left, set_left, f64, Left, "local left offset"),
        (width, set_width, f64, Width, "width"),
        (height, set_height, f64, Height, "height"),
        (enabled, set_enabled, bool, Enabled, "enabled flag"),
        (visible, set_visible, bool, Visible, "visible flag"),
        (word_wrap, set_word_wrap, bool, WordWrap, "word wrapping flag"),
        (clipping, set_clipping, TextClipping, Clipping, "text clipping mode"),
        (
            check_image_position,
            set_check_image_position,
            ImagePosition,
            CheckImagePosition,
            "check image position"
        ),
        (thumb_height, set_thumb_height, f64, ThumbHeight, "slider thumb height"),
        (thumb_width, set_thumb_width, f64, ThumbWidth, "slider thumb width"),
        (item_height, set_item_height, f64, ItemHeight, "list item height"),
    }

    /// Read access to one interaction state.
    pub fn state(&self, kind: StyleStateType) -> &StyleState {
        &self.states[kind.index()]
    }

    /// Mutable access to one interaction state.
    ///
    /// Changes are delivered to subscribers when the returned guard drops.
    pub fn state_mut(&mut self, kind: StyleStateType) -> StateMut<'_> {
        StateMut {
            style: self,
            index: kind.index(),
        }
    }

    /// Typed value of `property` at `state` on this style alone, without cascading.
    ///
    /// State-independent properties ignore `state`.
    pub fn get_property(
        &self,
        property: StylePropertyType,
        state: StyleStateType,
    ) -> Option<StyleValue> {
        use StylePropertyType as P;
        match property {
            P::Name => self.name.clone().map(StyleValue::Text),
            P::Text => self.text.clone().map(StyleValue::Text),
            P::Top => self.top.map(StyleValue::Float),
            P::Left => self.left.map(StyleValue::Float),
            P::Width => self.width.map(StyleValue::Float),
            P::Height => self.height.map(StyleValue::Float),
            P::Enabled => self.enabled.map(StyleValue::Bool),
            P::Visible => self.visible.map(StyleValue::Bool),
            P::WordWrap => self.word_wrap.map(StyleValue::Bool),
            P::Clipping => self.clipping.map(StyleValue::Clipping),
            P::CheckImagePosition => self.check_image_position.map(StyleValue::ImagePosition),
            P::ThumbHeight => self.thumb_height.map(StyleValue::Float),
            P::ThumbWidth => self.thumb_width.map(StyleValue::Float),
            P::ItemHeight => self.item_height.map(StyleValue::Float),
            _ => self.state(state).get(property),
        }
    }

    /// Copy all values into a fresh style with no subscribers.
    ///
    /// Each state is duplicated independently; edits to the copy never reach
    /// the original. Unresolved asset paths travel with the copy.
    pub fn copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            text: self.text.clone(),
            top: self.top,
            left: self.left,
            width: self.width,
            height: self.height,
            enabled: self.enabled,
            visible: self.visible,
            word_wrap: self.word_wrap,
            clipping: self.clipping,
            check_image_position: self.check_image_position,
            thumb_height: self.thumb_height,
            thumb_width: self.thumb_width,
            item_height: self.item_height,
            states: self.states.each_ref().map(StyleState::copy),
            subscribers: Subscribers::new(),
        }
    }

    /// Register a listener for property changes.
    pub fn subscribe<L: StyleListener + 'static>(&mut self, listener: &Rc<L>) {
        self.subscribers.add(listener);
    }

    /// Remove a listener.
    pub fn unsubscribe<L: StyleListener + 'static>(&mut self, listener: &Rc<L>) {
        self.subscribers.remove(listener);
    }

    /// Number of subscriber entries, including not yet swept dead ones.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Notify subscribers of `property` without changing anything.
    ///
    /// Used after an asset bundle arrives so dependents re-resolve.
    pub fn touch(&mut self, property: StylePropertyType) {
        self.subscribers.notify(property);
    }

    // Normal-state conveniences.

    /// Set all four sides of an edge family in the Normal state.
    pub fn set_edges(&mut self, family: EdgeFamily, left: i32, right: i32, top: i32, bottom: i32) {
        self.state_mut(StyleStateType::Normal)
            .set_edges(family, left, right, top, bottom);
    }

    /// Set the padding in the Normal state.
    pub fn set_padding(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        self.set_edges(EdgeFamily::Padding, left, right, top, bottom);
    }

    /// Set the same padding on every side in the Normal state.
    pub fn set_padding_uniform(&mut self, value: i32) {
        self.set_padding(value, value, value, value);
    }

    /// Set the margin in the Normal state.
    pub fn set_margin(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        self.set_edges(EdgeFamily::Margin, left, right, top, bottom);
    }

    /// Set the background border in the Normal state.
    pub fn set_border(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        self.set_edges(EdgeFamily::Border, left, right, top, bottom);
    }

    /// Set the background overflow in the Normal state.
    pub fn set_overflow(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        self.set_edges(EdgeFamily::Overflow, left, right, top, bottom);
    }

    /// Set the list item padding in the Normal state.
    pub fn set_item_padding(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        self.set_edges(EdgeFamily::ItemPadding, left, right, top, bottom);
    }

    /// Set the slider thumb border in the Normal state.
    pub fn set_thumb_border(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        self.set_edges(EdgeFamily::ThumbBorder, left, right, top, bottom);
    }

    /// Set the text color in the Normal state.
    pub fn set_text_color(&mut self, color: impl Into<Option<Color>>) {
        self.state_mut(StyleStateType::Normal).set_text_color(color);
    }

    /// Set the background in the Normal state.
    pub fn set_background(&mut self, fill: impl Into<Option<Fill>>) {
        self.state_mut(StyleStateType::Normal).set_background(fill);
    }

    /// Declare the Normal-state background by texture path.
    pub fn set_background_path(&mut self, path: impl Into<String>) {
        self.state_mut(StyleStateType::Normal)
            .set_fill_path(StylePropertyType::Background, path.into());
    }

    /// Set the font face in the Normal state.
    pub fn set_font(&mut self, font: impl Into<Option<FontFace>>) {
        self.state_mut(StyleStateType::Normal).set_font(font);
    }

    /// Set the font size in the Normal state.
    pub fn set_font_size(&mut self, size: impl Into<Option<i32>>) {
        self.state_mut(StyleStateType::Normal).set_font_size(size);
    }

    /// Set the text anchor in the Normal state.
    pub fn set_alignment(&mut self, anchor: impl Into<Option<TextAnchor>>) {
        self.state_mut(StyleStateType::Normal).set_alignment(anchor);
    }
}

/// Mutable access to one state of a [`Style`].
///
/// Dropping the guard notifies the style's subscribers of every property that
/// was changed through it.
#[derive(Debug)]
pub struct StateMut<'a> {
    style: &'a mut Style,
    index: usize,
}

impl Deref for StateMut<'_> {
    type Target = StyleState;

    fn deref(&self) -> &StyleState {
        &self.style.states[self.index]
    }
}

impl DerefMut for StateMut<'_> {
    fn deref_mut(&mut self) -> &mut StyleState {
        &mut self.style.states[self.index]
    }
}

impl Drop for StateMut<'_> {
    fn drop(&mut self) {
        let pending = self.style.states[self.index].take_pending();
        for property in pending.iter() {
            self.style.subscribers.notify(property);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Edge;
    use core::cell::Cell;

    #[derive(Default)]
    struct Counter(Cell<usize>, Cell<Option<StylePropertyType>>);

    impl StyleListener for Counter {
        fn property_changed(&self, property: StylePropertyType) {
            self.0.set(self.0.get() + 1);
            self.1.set(Some(property));
        }
    }

    #[test]
    fn independent_setter_notifies() {
        let counter = Rc::new(Counter::default());
        let mut style = Style::new();
        style.subscribe(&counter);
        style.set_width(120.0);
        assert_eq!(counter.0.get(), 1);
        assert_eq!(counter.1.get(), Some(StylePropertyType::Width));
        assert_eq!(
            style.get_property(StylePropertyType::Width, StyleStateType::Hover),
            Some(StyleValue::Float(120.0)),
            "state-independent properties ignore the state"
        );
        style.set_width(None);
        assert_eq!(style.width(), None);
        assert_eq!(counter.0.get(), 2, "clearing notifies too");
    }

    #[test]
    fn state_guard_flushes_on_drop() {
        let counter = Rc::new(Counter::default());
        let mut style = Style::new();
        style.subscribe(&counter);
        {
            let mut hover = style.state_mut(StyleStateType::Hover);
            hover.set_text_color(Color::RED);
            hover.set_edges(EdgeFamily::Margin, 1, 2, 3, 4);
        }
        assert_eq!(counter.0.get(), 5, "one notification per changed tag");
        assert_eq!(
            style.get_property(StylePropertyType::TextColor, StyleStateType::Hover),
            Some(StyleValue::Color(Color::RED))
        );
        assert_eq!(
            style.get_property(StylePropertyType::TextColor, StyleStateType::Normal),
            None,
            "other states untouched"
        );
    }

    #[test]
    fn copy_is_independent() {
        let counter = Rc::new(Counter::default());
        let mut original = Style::new();
        original.subscribe(&counter);
        original.set_padding_uniform(3);
        let before = counter.0.get();

        let mut copy = original.copy();
        assert_eq!(copy.subscriber_count(), 0, "subscribers are not copied");
        copy.state_mut(StyleStateType::Normal)
            .set_edge(EdgeFamily::Padding, Edge::Left, 9);
        let left = StylePropertyType::Edge(EdgeFamily::Padding, Edge::Left);
        assert_eq!(
            original.get_property(left, StyleStateType::Normal),
            Some(StyleValue::Int(3))
        );
        assert_eq!(
            copy.get_property(left, StyleStateType::Normal),
            Some(StyleValue::Int(9))
        );
        assert_eq!(counter.0.get(), before, "copy edits do not reach the original");
    }
}
