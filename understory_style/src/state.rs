// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One interaction state's worth of visual properties.

use crate::types::{
    Color, Edge, EdgeFamily, Fill, FontFace, FontStyle, PropertySet, StylePropertyType,
    StyleValue, TextAnchor,
};

/// Four optional sides of an edge family.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeValues {
    /// Left side.
    pub left: Option<i32>,
    /// Right side.
    pub right: Option<i32>,
    /// Top side.
    pub top: Option<i32>,
    /// Bottom side.
    pub bottom: Option<i32>,
}

impl EdgeValues {
    /// The value of one side.
    pub fn get(&self, edge: Edge) -> Option<i32> {
        match edge {
            Edge::Left => self.left,
            Edge::Right => self.right,
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
        }
    }

    fn slot(&mut self, edge: Edge) -> &mut Option<i32> {
        match edge {
            Edge::Left => &mut self.left,
            Edge::Right => &mut self.right,
            Edge::Top => &mut self.top,
            Edge::Bottom => &mut self.bottom,
        }
    }
}

/// An asset-backed value that may still be waiting on its path to resolve.
///
/// Setting the value directly forgets the path. Setting a path keeps the current
/// value until the asset registry resolves it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetSlot<T> {
    value: Option<T>,
    path: Option<String>,
}

impl<T: Copy> AssetSlot<T> {
    /// The resolved value, if any.
    pub fn value(&self) -> Option<T> {
        self.value
    }

    /// The asset path this slot was declared with, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn set(&mut self, value: Option<T>) {
        self.value = value;
        self.path = None;
    }

    fn set_path(&mut self, path: Option<String>) {
        self.path = path;
    }

    fn resolve(&mut self, value: T) {
        self.value = Some(value);
    }
}

/// Which kind of host asset a path refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// A texture.
    Texture,
    /// A font.
    Font,
}

const FILL_SLOTS: [StylePropertyType; 6] = [
    StylePropertyType::Background,
    StylePropertyType::CheckImage,
    StylePropertyType::UncheckImage,
    StylePropertyType::ThumbBackground,
    StylePropertyType::ItemBackground,
    StylePropertyType::SelectedBackground,
];

/// Visual properties of a single [`StyleStateType`](crate::StyleStateType).
///
/// Every field is optional; `None` means "not set here". Mutations are recorded
/// as pending property tags which the owning [`Style`](crate::Style) delivers to
/// its subscribers when the [`StateMut`](crate::StateMut) guard is released.
#[derive(Clone, Debug, Default)]
pub struct StyleState {
    edges: [EdgeValues; 6],
    alignment: Option<TextAnchor>,
    content_offset_left: Option<f64>,
    content_offset_top: Option<f64>,
    font: AssetSlot<FontFace>,
    font_size: Option<i32>,
    font_style: Option<FontStyle>,
    text_color: Option<Color>,
    selected_text_color: Option<Color>,
    background: AssetSlot<Fill>,
    check_image: AssetSlot<Fill>,
    uncheck_image: AssetSlot<Fill>,
    thumb_background: AssetSlot<Fill>,
    item_background: AssetSlot<Fill>,
    selected_background: AssetSlot<Fill>,
    pending: PropertySet,
}

fn family_index(family: EdgeFamily) -> usize {
    match family {
        EdgeFamily::Padding => 0,
        EdgeFamily::Margin => 1,
        EdgeFamily::Border => 2,
        EdgeFamily::Overflow => 3,
        EdgeFamily::ThumbBorder => 4,
        EdgeFamily::ItemPadding => 5,
    }
}

impl StyleState {
    /// Create a state with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the values of this state, without its pending notifications.
    pub fn copy(&self) -> Self {
        Self {
            pending: PropertySet::new(),
            ..self.clone()
        }
    }

    /// Typed value of `property` in this state.
    ///
    /// State-independent properties and asset slots still waiting on their path
    /// report `None`.
    pub fn get(&self, property: StylePropertyType) -> Option<StyleValue> {
        use StylePropertyType as P;
        match property {
            P::Edge(family, edge) => self.edges[family_index(family)]
                .get(edge)
                .map(StyleValue::Int),
            P::Alignment => self.alignment.map(StyleValue::Anchor),
            P::ContentOffsetLeft => self.content_offset_left.map(StyleValue::Float),
            P::ContentOffsetTop => self.content_offset_top.map(StyleValue::Float),
            P::FontAsset => self.font.value().map(StyleValue::Font),
            P::FontSize => self.font_size.map(StyleValue::Int),
            P::FontStyling => self.font_style.map(StyleValue::FontStyle),
            P::TextColor => self.text_color.map(StyleValue::Color),
            P::SelectedTextColor => self.selected_text_color.map(StyleValue::Color),
            P::Background
            | P::CheckImage
            | P::UncheckImage
            | P::ThumbBackground
            | P::ItemBackground
            | P::SelectedBackground => self
                .fill_slot(property)
                .and_then(|s| s.value())
                .map(StyleValue::Fill),
            _ => None,
        }
    }

    /// The values of one edge family.
    pub fn edges(&self, family: EdgeFamily) -> EdgeValues {
        self.edges[family_index(family)]
    }

    /// Set one side of an edge family.
    pub fn set_edge(&mut self, family: EdgeFamily, edge: Edge, value: impl Into<Option<i32>>) {
        *self.edges[family_index(family)].slot(edge) = value.into();
        self.touch(StylePropertyType::Edge(family, edge));
    }

    /// Set all four sides of an edge family.
    pub fn set_edges(&mut self, family: EdgeFamily, left: i32, right: i32, top: i32, bottom: i32) {
        self.set_edge(family, Edge::Left, left);
        self.set_edge(family, Edge::Right, right);
        self.set_edge(family, Edge::Top, top);
        self.set_edge(family, Edge::Bottom, bottom);
    }

    /// Text anchor.
    pub fn alignment(&self) -> Option<TextAnchor> {
        self.alignment
    }

    /// Set the text anchor.
    pub fn set_alignment(&mut self, value: impl Into<Option<TextAnchor>>) {
        self.alignment = value.into();
        self.touch(StylePropertyType::Alignment);
    }

    /// Set the horizontal content offset.
    pub fn set_content_offset_left(&mut self, value: impl Into<Option<f64>>) {
        self.content_offset_left = value.into();
        self.touch(StylePropertyType::ContentOffsetLeft);
    }

    /// Set the vertical content offset.
    pub fn set_content_offset_top(&mut self, value: impl Into<Option<f64>>) {
        self.content_offset_top = value.into();
        self.touch(StylePropertyType::ContentOffsetTop);
    }

    /// Font slot.
    pub fn font(&self) -> &AssetSlot<FontFace> {
        &self.font
    }

    /// Set the font face, forgetting any font path.
    pub fn set_font(&mut self, value: impl Into<Option<FontFace>>) {
        self.font.set(value.into());
        self.touch(StylePropertyType::FontAsset);
    }

    /// Declare the font by asset path, resolved later.
    pub fn set_font_path(&mut self, path: impl Into<Option<String>>) {
        self.font.set_path(path.into());
        self.touch(StylePropertyType::FontAsset);
    }

    /// Set the font size.
    pub fn set_font_size(&mut self, value: impl Into<Option<i32>>) {
        self.font_size = value.into();
        self.touch(StylePropertyType::FontSize);
    }

    /// Set the font styling.
    pub fn set_font_style(&mut self, value: impl Into<Option<FontStyle>>) {
        self.font_style = value.into();
        self.touch(StylePropertyType::FontStyling);
    }

    /// Text color.
    pub fn text_color(&self) -> Option<Color> {
        self.text_color
    }

    /// Set the text color.
    pub fn set_text_color(&mut self, value: impl Into<Option<Color>>) {
        self.text_color = value.into();
        self.touch(StylePropertyType::TextColor);
    }

    /// Set the text color of a selected list item.
    pub fn set_selected_text_color(&mut self, value: impl Into<Option<Color>>) {
        self.selected_text_color = value.into();
        self.touch(StylePropertyType::SelectedTextColor);
    }

    /// Background slot.
    pub fn background(&self) -> &AssetSlot<Fill> {
        &self.background
    }

    /// Set a fill-valued property (background, check images, thumb and item
    /// backgrounds), forgetting any path.
    ///
    /// Ignored for properties that are not fills.
    pub fn set_fill(&mut self, property: StylePropertyType, value: impl Into<Option<Fill>>) {
        if let Some(slot) = self.fill_slot_mut(property) {
            slot.set(value.into());
            self.touch(property);
        }
    }

    /// Declare a fill-valued property by texture path, resolved later.
    pub fn set_fill_path(&mut self, property: StylePropertyType, path: impl Into<Option<String>>) {
        if let Some(slot) = self.fill_slot_mut(property) {
            slot.set_path(path.into());
            self.touch(property);
        }
    }

    /// Set the background.
    pub fn set_background(&mut self, value: impl Into<Option<Fill>>) {
        self.set_fill(StylePropertyType::Background, value);
    }

    /// Declared asset paths of this state, with the kind of asset each needs.
    pub fn asset_paths(&self) -> impl Iterator<Item = (StylePropertyType, AssetKind, &str)> + '_ {
        let font = self
            .font
            .path()
            .map(|p| (StylePropertyType::FontAsset, AssetKind::Font, p));
        font.into_iter().chain(FILL_SLOTS.into_iter().filter_map(move |prop| {
            self.fill_slot(prop)
                .and_then(|s| s.path())
                .map(|p| (prop, AssetKind::Texture, p))
        }))
    }

    /// Store the asset a declared path resolved to. The path is kept so the
    /// asset can be reloaded after the bundle changes.
    pub fn resolve_asset(&mut self, property: StylePropertyType, asset: crate::AssetId) {
        match property {
            StylePropertyType::FontAsset => self.font.resolve(FontFace::Asset(asset)),
            _ => match self.fill_slot_mut(property) {
                Some(slot) => slot.resolve(Fill::Texture(asset)),
                None => return,
            },
        }
        self.touch(property);
    }

    pub(crate) fn take_pending(&mut self) -> PropertySet {
        self.pending.take()
    }

    fn touch(&mut self, property: StylePropertyType) {
        self.pending.insert(property);
    }

    fn fill_slot(&self, property: StylePropertyType) -> Option<&AssetSlot<Fill>> {
        use StylePropertyType as P;
        Some(match property {
            P::Background => &self.background,
            P::CheckImage => &self.check_image,
            P::UncheckImage => &self.uncheck_image,
            P::ThumbBackground => &self.thumb_background,
            P::ItemBackground => &self.item_background,
            P::SelectedBackground => &self.selected_background,
            _ => return None,
        })
    }

    fn fill_slot_mut(&mut self, property: StylePropertyType) -> Option<&mut AssetSlot<Fill>> {
        use StylePropertyType as P;
        Some(match property {
            P::Background => &mut self.background,
            P::CheckImage => &mut self.check_image,
            P::UncheckImage => &mut self.uncheck_image,
            P::ThumbBackground => &mut self.thumb_background,
            P::ItemBackground => &mut self.item_background,
            P::SelectedBackground => &mut self.selected_background,
            _ => return None,
        })
    }
}
