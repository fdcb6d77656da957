// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tags, interaction states, and the typed values a style can carry.
//!
//! ## Overview
//!
//! Every style property is identified by a [`StylePropertyType`] tag. Values travel
//! through the cascade as [`StyleValue`], a closed sum type over the concrete value
//! kinds ([`Color`], [`TextAnchor`], [`Fill`], ...). An unset property is simply
//! `None` at the level that does not define it.

use core::fmt;

/// One of the four mutually exclusive interaction states of a widget.
///
/// Each [`Style`](crate::Style) carries one [`StyleState`](crate::StyleState) per
/// variant. The discriminant order is the storage order inside a style.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StyleStateType {
    /// No interaction.
    #[default]
    Normal,
    /// Pressed (mouse button held over the widget).
    Active,
    /// Pointer over the widget.
    Hover,
    /// Widget owns logical focus.
    Focused,
}

impl StyleStateType {
    /// All states in storage order.
    pub const ALL: [Self; 4] = [Self::Normal, Self::Active, Self::Hover, Self::Focused];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Normal => 0,
            Self::Active => 1,
            Self::Hover => 2,
            Self::Focused => 3,
        }
    }
}

/// One side of a four-sided value (padding, margin, border, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Left side.
    Left,
    /// Right side.
    Right,
    /// Top side.
    Top,
    /// Bottom side.
    Bottom,
}

impl Edge {
    /// All edges in declaration order.
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];
}

/// The four-sided property families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeFamily {
    /// Inner spacing.
    Padding,
    /// Outer spacing.
    Margin,
    /// Nine-slice border of the background.
    Border,
    /// Extra space added around the background image.
    Overflow,
    /// Nine-slice border of a slider thumb.
    ThumbBorder,
    /// Inner spacing of list items.
    ItemPadding,
}

/// Tag identifying a single style property.
///
/// Passed to [`StyleListener::property_changed`](crate::StyleListener::property_changed)
/// and used as the key of the cascade resolver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StylePropertyType {
    /// Element height.
    Height,
    /// Element width.
    Width,
    /// Local top offset.
    Top,
    /// Local left offset.
    Left,
    /// Element text.
    Text,
    /// Element name.
    Name,
    /// Enabled flag.
    Enabled,
    /// Visible flag.
    Visible,
    /// Word wrapping.
    WordWrap,
    /// Text clipping mode.
    Clipping,
    /// A side of a four-sided value.
    Edge(EdgeFamily, Edge),
    /// Text anchor inside the content rectangle.
    Alignment,
    /// Horizontal content offset.
    ContentOffsetLeft,
    /// Vertical content offset.
    ContentOffsetTop,
    /// Font face.
    FontAsset,
    /// Font size in points.
    FontSize,
    /// Font styling (bold, italic).
    FontStyling,
    /// Text color.
    TextColor,
    /// Background fill.
    Background,
    /// Position of a check image relative to the text.
    CheckImagePosition,
    /// Image shown when checked.
    CheckImage,
    /// Image shown when unchecked.
    UncheckImage,
    /// Background of a slider thumb.
    ThumbBackground,
    /// Fixed thumb height; zero stretches.
    ThumbHeight,
    /// Fixed thumb width; zero stretches.
    ThumbWidth,
    /// Background of list items.
    ItemBackground,
    /// Text color of the selected list item.
    SelectedTextColor,
    /// Background of the selected list item.
    SelectedBackground,
    /// Height of a list item.
    ItemHeight,
}

impl StylePropertyType {
    /// Every property tag, four-sided families expanded per edge.
    pub fn all() -> impl Iterator<Item = Self> {
        const SIMPLE: [StylePropertyType; 28] = [
            StylePropertyType::Height,
            StylePropertyType::Width,
            StylePropertyType::Top,
            StylePropertyType::Left,
            StylePropertyType::Text,
            StylePropertyType::Name,
            StylePropertyType::Enabled,
            StylePropertyType::Visible,
            StylePropertyType::WordWrap,
            StylePropertyType::Clipping,
            StylePropertyType::Alignment,
            StylePropertyType::ContentOffsetLeft,
            StylePropertyType::ContentOffsetTop,
            StylePropertyType::FontAsset,
            StylePropertyType::FontSize,
            StylePropertyType::FontStyling,
            StylePropertyType::TextColor,
            StylePropertyType::Background,
            StylePropertyType::CheckImagePosition,
            StylePropertyType::CheckImage,
            StylePropertyType::UncheckImage,
            StylePropertyType::ThumbBackground,
            StylePropertyType::ThumbHeight,
            StylePropertyType::ThumbWidth,
            StylePropertyType::ItemBackground,
            StylePropertyType::SelectedTextColor,
            StylePropertyType::SelectedBackground,
            StylePropertyType::ItemHeight,
        ];
        const FAMILIES: [EdgeFamily; 6] = [
            EdgeFamily::Padding,
            EdgeFamily::Margin,
            EdgeFamily::Border,
            EdgeFamily::Overflow,
            EdgeFamily::ThumbBorder,
            EdgeFamily::ItemPadding,
        ];
        SIMPLE.into_iter().chain(
            FAMILIES
                .into_iter()
                .flat_map(|f| Edge::ALL.into_iter().map(move |e| Self::Edge(f, e))),
        )
    }

    /// Whether this property lives on [`Style`](crate::Style) itself rather than
    /// on a per-state [`StyleState`](crate::StyleState).
    pub fn is_state_independent(self) -> bool {
        matches!(
            self,
            Self::Height
                | Self::Width
                | Self::Top
                | Self::Left
                | Self::Text
                | Self::Name
                | Self::Enabled
                | Self::Visible
                | Self::WordWrap
                | Self::Clipping
                | Self::CheckImagePosition
                | Self::ThumbHeight
                | Self::ThumbWidth
                | Self::ItemHeight
        )
    }

    /// Dense index used by [`PropertySet`].
    pub(crate) fn bit(self) -> u32 {
        match self {
            Self::Height => 0,
            Self::Width => 1,
            Self::Top => 2,
            Self::Left => 3,
            Self::Text => 4,
            Self::Name => 5,
            Self::Enabled => 6,
            Self::Visible => 7,
            Self::WordWrap => 8,
            Self::Clipping => 9,
            Self::Alignment => 10,
            Self::ContentOffsetLeft => 11,
            Self::ContentOffsetTop => 12,
            Self::FontAsset => 13,
            Self::FontSize => 14,
            Self::FontStyling => 15,
            Self::TextColor => 16,
            Self::Background => 17,
            Self::CheckImagePosition => 18,
            Self::CheckImage => 19,
            Self::UncheckImage => 20,
            Self::ThumbBackground => 21,
            Self::ThumbHeight => 22,
            Self::ThumbWidth => 23,
            Self::ItemBackground => 24,
            Self::SelectedTextColor => 25,
            Self::SelectedBackground => 26,
            Self::ItemHeight => 27,
            Self::Edge(family, edge) => {
                let f = match family {
                    EdgeFamily::Padding => 0,
                    EdgeFamily::Margin => 1,
                    EdgeFamily::Border => 2,
                    EdgeFamily::Overflow => 3,
                    EdgeFamily::ThumbBorder => 4,
                    EdgeFamily::ItemPadding => 5,
                };
                let e = match edge {
                    Edge::Left => 0,
                    Edge::Right => 1,
                    Edge::Top => 2,
                    Edge::Bottom => 3,
                };
                28 + f * 4 + e
            }
        }
    }
}

/// A small set of property tags, used to coalesce pending notifications.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertySet(u64);

impl PropertySet {
    /// Empty set.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Set containing every property.
    pub fn full() -> Self {
        let mut s = Self::new();
        for p in StylePropertyType::all() {
            s.insert(p);
        }
        s
    }

    /// Add a property.
    pub fn insert(&mut self, property: StylePropertyType) {
        self.0 |= 1 << property.bit();
    }

    /// Whether the set contains `property`.
    pub fn contains(&self, property: StylePropertyType) -> bool {
        self.0 & (1 << property.bit()) != 0
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Merge another set into this one.
    pub fn extend(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Take the contents, leaving the set empty.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Iterate members in tag order.
    pub fn iter(self) -> impl Iterator<Item = StylePropertyType> {
        StylePropertyType::all().filter(move |p| self.contains(*p))
    }
}

/// Linear RGBA color with `f32` components in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque red; also the fallback for malformed color strings.
    pub const RED: Self = Self::rgba(1.0, 0.0, 0.0, 1.0);
    /// Opaque yellow.
    pub const YELLOW: Self = Self::rgba(1.0, 1.0, 0.0, 1.0);
    /// Mid gray.
    pub const GRAY: Self = Self::rgba(0.5, 0.5, 0.5, 1.0);

    /// Construct from components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Anchor of text inside its content rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// Top left.
    #[default]
    UpperLeft,
    /// Top center.
    UpperCenter,
    /// Top right.
    UpperRight,
    /// Middle left.
    MiddleLeft,
    /// Middle center.
    MiddleCenter,
    /// Middle right.
    MiddleRight,
    /// Bottom left.
    LowerLeft,
    /// Bottom center.
    LowerCenter,
    /// Bottom right.
    LowerRight,
}

/// Font styling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Regular.
    #[default]
    Normal,
    /// Bold.
    Bold,
    /// Italic.
    Italic,
    /// Bold and italic.
    BoldAndItalic,
}

/// Placement of an image relative to text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImagePosition {
    /// Image to the left of the text.
    #[default]
    ImageLeft,
    /// Image above the text.
    ImageAbove,
    /// Only the image.
    ImageOnly,
    /// Only the text.
    TextOnly,
}

/// How text that does not fit is handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextClipping {
    /// Text may overflow its rectangle.
    #[default]
    Overflow,
    /// Text is clipped to its rectangle.
    Clip,
}

/// Opaque handle of a texture or font issued by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(pub u64);

/// A background-like fill.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Fill {
    /// Nothing is drawn.
    #[default]
    Empty,
    /// A flat color.
    Color(Color),
    /// A host texture.
    Texture(AssetId),
}

/// Font face selection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// The host's built-in font.
    #[default]
    Builtin,
    /// A loaded font asset.
    Asset(AssetId),
}

/// A resolved property value as it travels through the cascade.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    /// Text value (name, text).
    Text(String),
    /// Floating point value (positions, sizes, offsets).
    Float(f64),
    /// Integer value (edges, font size).
    Int(i32),
    /// Boolean value.
    Bool(bool),
    /// Color.
    Color(Color),
    /// Text anchor.
    Anchor(TextAnchor),
    /// Font styling.
    FontStyle(FontStyle),
    /// Image position.
    ImagePosition(ImagePosition),
    /// Clipping mode.
    Clipping(TextClipping),
    /// Fill.
    Fill(Fill),
    /// Font face.
    Font(FontFace),
}

impl StyleValue {
    /// Float payload, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer payload, if any.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Color payload, if any.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Fill payload, if any.
    pub fn as_fill(&self) -> Option<Fill> {
        match self {
            Self::Fill(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for StyleStateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Active => "active",
            Self::Hover => "hover",
            Self::Focused => "focused",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_bits_are_unique() {
        let mut seen = PropertySet::new();
        let mut count = 0;
        for p in StylePropertyType::all() {
            assert!(!seen.contains(p), "duplicate bit for {p:?}");
            seen.insert(p);
            count += 1;
        }
        assert_eq!(count, 28 + 24, "every tag enumerated once");
        assert_eq!(PropertySet::full(), seen);
    }

    #[test]
    fn property_set_take_clears() {
        let mut s = PropertySet::new();
        s.insert(StylePropertyType::TextColor);
        s.insert(StylePropertyType::Edge(EdgeFamily::Margin, Edge::Top));
        let taken = s.take();
        assert!(s.is_empty());
        let members: Vec<_> = taken.iter().collect();
        assert_eq!(
            members,
            vec![
                StylePropertyType::TextColor,
                StylePropertyType::Edge(EdgeFamily::Margin, Edge::Top)
            ]
        );
    }

    #[test]
    fn state_storage_order() {
        for (i, s) in StyleStateType::ALL.into_iter().enumerate() {
            assert_eq!(s.index(), i, "storage index of {s}");
        }
    }
}
