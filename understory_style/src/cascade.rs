// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element → class → default cascade.
//!
//! For a requested state the probe order is:
//!
//! 1. element and class at the requested state, then (for Active only) at
//!    Hover and at Focused;
//! 2. element and class at Normal;
//! 3. default at the requested state, then (for Active only) at Hover and at
//!    Focused;
//! 4. default at Normal.
//!
//! The first `Some` wins. State-independent properties skip the state probes
//! and are read element → class → default.

use crate::style::Style;
use crate::types::{
    Color, Edge, EdgeFamily, Fill, FontFace, FontStyle, ImagePosition, StylePropertyType,
    StyleStateType, StyleValue, TextAnchor, TextClipping,
};

/// The three style levels bound to one element.
#[derive(Copy, Clone, Debug)]
pub struct StyleLayers<'a> {
    /// The element's own instance style (highest priority).
    pub element: &'a Style,
    /// The optional shared class style.
    pub class: Option<&'a Style>,
    /// The per-kind default style (final fallback).
    pub default: &'a Style,
}

fn probe_states(state: StyleStateType) -> &'static [StyleStateType] {
    use StyleStateType as S;
    match state {
        S::Normal => &[],
        S::Hover => &[S::Hover],
        S::Focused => &[S::Focused],
        S::Active => &[S::Active, S::Hover, S::Focused],
    }
}

impl StyleLayers<'_> {
    /// Resolve `property` at `state` through the cascade.
    pub fn resolve(&self, property: StylePropertyType, state: StyleStateType) -> Option<StyleValue> {
        let normal = StyleStateType::Normal;
        if property.is_state_independent() {
            return self
                .element
                .get_property(property, normal)
                .or_else(|| self.class.and_then(|c| c.get_property(property, normal)))
                .or_else(|| self.default.get_property(property, normal));
        }
        let probes = probe_states(state);
        for &s in probes.iter().chain(&[normal]) {
            if let Some(v) = self.element.get_property(property, s) {
                return Some(v);
            }
            if let Some(v) = self.class.and_then(|c| c.get_property(property, s)) {
                return Some(v);
            }
        }
        probes
            .iter()
            .chain(&[normal])
            .find_map(|&s| self.default.get_property(property, s))
    }

    /// Resolve every per-state property at `state`.
    ///
    /// Properties missing at every level keep their [`ResolvedState::default`] value.
    pub fn resolve_state(&self, state: StyleStateType) -> ResolvedState {
        let mut out = ResolvedState::default();
        for property in StylePropertyType::all() {
            if property.is_state_independent() && !ResolvedState::carries(property) {
                continue;
            }
            if let Some(v) = self.resolve(property, state) {
                out.apply(property, &v);
            }
        }
        out
    }
}

/// Four resolved sides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Insets {
    /// Left side.
    pub left: i32,
    /// Right side.
    pub right: i32,
    /// Top side.
    pub top: i32,
    /// Bottom side.
    pub bottom: i32,
}

impl Insets {
    /// Same value on every side.
    pub const fn uniform(v: i32) -> Self {
        Self {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }

    fn set(&mut self, edge: Edge, v: i32) {
        match edge {
            Edge::Left => self.left = v,
            Edge::Right => self.right = v,
            Edge::Top => self.top = v,
            Edge::Bottom => self.bottom = v,
        }
    }
}

/// Concrete values of one interaction state, as handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedState {
    /// Inner spacing.
    pub padding: Insets,
    /// Outer spacing.
    pub margin: Insets,
    /// Background nine-slice border.
    pub border: Insets,
    /// Background overflow.
    pub overflow: Insets,
    /// Slider thumb border.
    pub thumb_border: Insets,
    /// List item padding.
    pub item_padding: Insets,
    /// Text anchor.
    pub alignment: TextAnchor,
    /// Horizontal content offset.
    pub content_offset_left: f64,
    /// Vertical content offset.
    pub content_offset_top: f64,
    /// Font face.
    pub font: FontFace,
    /// Font size.
    pub font_size: i32,
    /// Font styling.
    pub font_style: FontStyle,
    /// Text color.
    pub text_color: Color,
    /// Text color of a selected item.
    pub selected_text_color: Color,
    /// Background fill.
    pub background: Fill,
    /// Checked image.
    pub check_image: Fill,
    /// Unchecked image.
    pub uncheck_image: Fill,
    /// Slider thumb background.
    pub thumb_background: Fill,
    /// List item background.
    pub item_background: Fill,
    /// Selected list item background.
    pub selected_background: Fill,
    /// Word wrapping.
    pub word_wrap: bool,
    /// Text clipping.
    pub clipping: TextClipping,
    /// Check image placement.
    pub check_image_position: ImagePosition,
}

impl Default for ResolvedState {
    fn default() -> Self {
        Self {
            padding: Insets::default(),
            margin: Insets::default(),
            border: Insets::default(),
            overflow: Insets::default(),
            thumb_border: Insets::default(),
            item_padding: Insets::default(),
            alignment: TextAnchor::UpperLeft,
            content_offset_left: 0.0,
            content_offset_top: 0.0,
            font: FontFace::Builtin,
            font_size: 12,
            font_style: FontStyle::Normal,
            text_color: Color::BLACK,
            selected_text_color: Color::BLACK,
            background: Fill::Empty,
            check_image: Fill::Empty,
            uncheck_image: Fill::Empty,
            thumb_background: Fill::Empty,
            item_background: Fill::Empty,
            selected_background: Fill::Empty,
            word_wrap: false,
            clipping: TextClipping::Clip,
            check_image_position: ImagePosition::TextOnly,
        }
    }
}

impl ResolvedState {
    /// Whether a state-independent `property` is mirrored into every state.
    pub fn carries(property: StylePropertyType) -> bool {
        matches!(
            property,
            StylePropertyType::WordWrap
                | StylePropertyType::Clipping
                | StylePropertyType::CheckImagePosition
        )
    }

    /// Store a resolved value. Mismatched value kinds are ignored.
    pub fn apply(&mut self, property: StylePropertyType, value: &StyleValue) {
        use StylePropertyType as P;
        match (property, value) {
            (P::Edge(family, edge), StyleValue::Int(v)) => {
                let insets = match family {
                    EdgeFamily::Padding => &mut self.padding,
                    EdgeFamily::Margin => &mut self.margin,
                    EdgeFamily::Border => &mut self.border,
                    EdgeFamily::Overflow => &mut self.overflow,
                    EdgeFamily::ThumbBorder => &mut self.thumb_border,
                    EdgeFamily::ItemPadding => &mut self.item_padding,
                };
                insets.set(edge, *v);
            }
            (P::Alignment, StyleValue::Anchor(a)) => self.alignment = *a,
            (P::ContentOffsetLeft, StyleValue::Float(v)) => self.content_offset_left = *v,
            (P::ContentOffsetTop, StyleValue::Float(v)) => self.content_offset_top = *v,
            (P::FontAsset, StyleValue::Font(f)) => self.font = *f,
            (P::FontSize, StyleValue::Int(v)) => self.font_size = *v,
            (P::FontStyling, StyleValue::FontStyle(s)) => self.font_style = *s,
            (P::TextColor, StyleValue::Color(c)) => self.text_color = *c,
            (P::SelectedTextColor, StyleValue::Color(c)) => self.selected_text_color = *c,
            (P::Background, StyleValue::Fill(f)) => self.background = *f,
            (P::CheckImage, StyleValue::Fill(f)) => self.check_image = *f,
            (P::UncheckImage, StyleValue::Fill(f)) => self.uncheck_image = *f,
            (P::ThumbBackground, StyleValue::Fill(f)) => self.thumb_background = *f,
            (P::ItemBackground, StyleValue::Fill(f)) => self.item_background = *f,
            (P::SelectedBackground, StyleValue::Fill(f)) => self.selected_background = *f,
            (P::WordWrap, StyleValue::Bool(b)) => self.word_wrap = *b,
            (P::Clipping, StyleValue::Clipping(c)) => self.clipping = *c,
            (P::CheckImagePosition, StyleValue::ImagePosition(p)) => {
                self.check_image_position = *p;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(n: u8) -> Color {
        Color::rgba(f32::from(n) / 10.0, 0.0, 0.0, 1.0)
    }

    fn with_color(entries: &[(StyleStateType, u8)]) -> Style {
        let mut s = Style::new();
        for &(state, n) in entries {
            s.state_mut(state).set_text_color(color(n));
        }
        s
    }

    #[test]
    fn instance_value_wins_at_every_state() {
        use StyleStateType as S;
        for state in S::ALL {
            let element = with_color(&[(state, 1)]);
            let class = with_color(&[(S::Normal, 2), (S::Hover, 2), (S::Active, 2), (S::Focused, 2)]);
            let default = with_color(&[(S::Normal, 3), (S::Hover, 3), (S::Active, 3), (S::Focused, 3)]);
            let layers = StyleLayers {
                element: &element,
                class: Some(&class),
                default: &default,
            };
            assert_eq!(
                layers.resolve(StylePropertyType::TextColor, state),
                Some(StyleValue::Color(color(1))),
                "instance value at {state} must win"
            );
        }
    }

    #[test]
    fn cascade_table() {
        use StyleStateType as S;
        // (element, class, default, requested, expected)
        let cases: &[(&[(S, u8)], &[(S, u8)], &[(S, u8)], S, u8)] = &[
            (&[(S::Normal, 1)], &[(S::Hover, 2)], &[(S::Normal, 3)], S::Hover, 2),
            (&[(S::Normal, 1)], &[], &[(S::Hover, 3), (S::Normal, 4)], S::Hover, 1),
            (&[], &[(S::Normal, 2)], &[(S::Hover, 3)], S::Hover, 2),
            (&[], &[], &[(S::Hover, 3), (S::Normal, 4)], S::Hover, 3),
            (&[], &[], &[(S::Normal, 4)], S::Focused, 4),
            (&[(S::Focused, 1)], &[(S::Hover, 2)], &[], S::Active, 2),
            (&[(S::Focused, 1)], &[], &[(S::Active, 3)], S::Active, 1),
            (&[], &[], &[(S::Focused, 3), (S::Normal, 4)], S::Active, 3),
            (&[(S::Hover, 1)], &[], &[(S::Normal, 4)], S::Normal, 4),
        ];
        for (i, (e, c, d, requested, expected)) in cases.iter().enumerate() {
            let element = with_color(e);
            let class = with_color(c);
            let default = with_color(d);
            let layers = StyleLayers {
                element: &element,
                class: Some(&class),
                default: &default,
            };
            assert_eq!(
                layers.resolve(StylePropertyType::TextColor, *requested),
                Some(StyleValue::Color(color(*expected))),
                "case {i}"
            );
        }
    }

    #[test]
    fn active_falls_back_to_normal() {
        let element = Style::new();
        let mut default = Style::new();
        default.set_font_size(12);
        default.set_width(40.0);
        let layers = StyleLayers {
            element: &element,
            class: None,
            default: &default,
        };
        assert_eq!(
            layers.resolve(StylePropertyType::FontSize, StyleStateType::Active),
            Some(StyleValue::Int(12))
        );
        assert_eq!(
            layers.resolve(StylePropertyType::Width, StyleStateType::Active),
            Some(StyleValue::Float(40.0))
        );
    }

    #[test]
    fn resolve_state_fills_snapshot() {
        let mut element = Style::new();
        element.set_word_wrap(true);
        element
            .state_mut(StyleStateType::Hover)
            .set_edge(EdgeFamily::Padding, Edge::Top, 6);
        let default = Style::new();
        let layers = StyleLayers {
            element: &element,
            class: None,
            default: &default,
        };
        let hover = layers.resolve_state(StyleStateType::Hover);
        assert_eq!(hover.padding.top, 6);
        assert!(hover.word_wrap, "word wrap mirrored into every state");
        let normal = layers.resolve_state(StyleStateType::Normal);
        assert_eq!(normal.padding.top, 0);
    }
}
