// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! String → typed value conversion for stylesheet values.
//!
//! Malformed input never fails: a warning is logged with the identifier and
//! file being read, and a fixed fallback is returned.

use tracing::warn;

use crate::types::{Color, FontStyle, ImagePosition, TextAnchor, TextClipping};

/// Converts attribute strings into typed values, logging with context.
#[derive(Copy, Clone, Debug, Default)]
pub struct ValueParser<'a> {
    /// Identifier of the block being read.
    pub identifier: &'a str,
    /// Name of the stylesheet file.
    pub file: &'a str,
}

impl<'a> ValueParser<'a> {
    /// Parser reporting against `identifier` in `file`.
    pub fn new(identifier: &'a str, file: &'a str) -> Self {
        Self { identifier, file }
    }

    /// Parse a boolean; anything unrecognized warns and yields `false`.
    pub fn parse_bool(&self, value: &str) -> bool {
        try_parse_bool(value).unwrap_or_else(|| {
            self.warn("bool", value);
            false
        })
    }

    /// Parse a float with the `.` decimal separator; failures warn and yield `0.0`.
    pub fn parse_float(&self, value: &str) -> f64 {
        value.trim().parse::<f64>().unwrap_or_else(|_| {
            self.warn("float", value);
            0.0
        })
    }

    /// Parse an integer; failures warn and yield `-1`.
    pub fn parse_int(&self, value: &str) -> i32 {
        value.trim().parse::<i32>().unwrap_or_else(|_| {
            self.warn("int", value);
            -1
        })
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`; anything else warns and yields opaque red.
    pub fn parse_color(&self, value: &str) -> Color {
        try_parse_color(value).unwrap_or_else(|| {
            self.warn("color", value);
            Color::RED
        })
    }

    /// Parse a text anchor name; unknown names warn and yield upper-left.
    pub fn parse_anchor(&self, value: &str) -> TextAnchor {
        use TextAnchor as A;
        match value.trim().to_ascii_lowercase().as_str() {
            "upperleft" | "left" => A::UpperLeft,
            "uppercenter" | "top" => A::UpperCenter,
            "upperright" | "right" => A::UpperRight,
            "middleleft" => A::MiddleLeft,
            "middlecenter" | "center" => A::MiddleCenter,
            "middleright" => A::MiddleRight,
            "lowerleft" => A::LowerLeft,
            "lowercenter" | "bottom" => A::LowerCenter,
            "lowerright" => A::LowerRight,
            _ => {
                self.warn("alignment", value);
                A::UpperLeft
            }
        }
    }

    /// Parse a font style; unknown names warn and yield normal.
    pub fn parse_font_style(&self, value: &str) -> FontStyle {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => FontStyle::Normal,
            "bold" => FontStyle::Bold,
            "italic" => FontStyle::Italic,
            "boldanditalic" => FontStyle::BoldAndItalic,
            _ => {
                self.warn("font style", value);
                FontStyle::Normal
            }
        }
    }

    /// Parse an image position; unknown names warn and yield image-left.
    pub fn parse_image_position(&self, value: &str) -> ImagePosition {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "imageleft" => ImagePosition::ImageLeft,
            "above" | "imageabove" => ImagePosition::ImageAbove,
            "imageonly" => ImagePosition::ImageOnly,
            "textonly" => ImagePosition::TextOnly,
            _ => {
                self.warn("image position", value);
                ImagePosition::ImageLeft
            }
        }
    }

    /// Parse a clipping mode; unknown names warn and yield overflow.
    pub fn parse_clipping(&self, value: &str) -> TextClipping {
        match value.trim().to_ascii_lowercase().as_str() {
            "overflow" => TextClipping::Overflow,
            "clip" => TextClipping::Clip,
            _ => {
                self.warn("text clipping", value);
                TextClipping::Overflow
            }
        }
    }

    fn warn(&self, kind: &'static str, value: &str) {
        warn!(
            identifier = self.identifier,
            file = self.file,
            kind,
            value,
            "unparsable style value, using fallback"
        );
    }
}

/// Parse a boolean, case-insensitively: `true`/`on`/`1` or `false`/`off`/`0`.
pub fn try_parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Some(true),
        "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn try_parse_color(value: &str) -> Option<Color> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }
    let channel = |i: usize| -> Option<f32> {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        Some(f32::from(byte) / 255.0)
    };
    let alpha = if hex.len() == 8 { channel(6)? } else { 1.0 };
    Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.005
    }

    #[test]
    fn color_hex_with_alpha() {
        let p = ValueParser::new("DefaultStyle", "test.style");
        let c = p.parse_color("#FF8000FF");
        assert!(close(c.r, 1.0), "red channel {}", c.r);
        assert!(close(c.g, 0.502), "green channel {}", c.g);
        assert!(close(c.b, 0.0), "blue channel {}", c.b);
        assert!(close(c.a, 1.0), "alpha channel {}", c.a);
    }

    #[test]
    fn malformed_color_is_red() {
        let p = ValueParser::default();
        assert_eq!(p.parse_color("bogus"), Color::RED);
        assert_eq!(p.parse_color("#12345"), Color::RED, "wrong digit count");
        assert_eq!(p.parse_color("#GG0000"), Color::RED, "not hex");
        assert_eq!(p.parse_color("#000000"), Color::BLACK);
    }

    #[test]
    fn bool_tables() {
        for s in ["On", "TRUE", "1", " true "] {
            assert_eq!(try_parse_bool(s), Some(true), "{s:?} parses true");
        }
        for s in ["off", "false", "0", "OFF"] {
            assert_eq!(try_parse_bool(s), Some(false), "{s:?} parses false");
        }
        for s in ["yes", "", "2"] {
            assert_eq!(try_parse_bool(s), None, "{s:?} has no value");
        }
        assert!(!ValueParser::default().parse_bool("maybe"), "fallback is false");
    }

    #[test]
    fn numeric_fallbacks() {
        let p = ValueParser::default();
        assert_eq!(p.parse_float("12.5"), 12.5);
        assert_eq!(p.parse_float("12,5"), 0.0, "comma is not a decimal separator");
        assert_eq!(p.parse_int("42"), 42);
        assert_eq!(p.parse_int("x"), -1);
    }

    #[test]
    fn anchor_aliases() {
        let p = ValueParser::default();
        assert_eq!(p.parse_anchor("MiddleCenter"), TextAnchor::MiddleCenter);
        assert_eq!(p.parse_anchor("top"), TextAnchor::UpperCenter);
        assert_eq!(p.parse_anchor("bottom"), TextAnchor::LowerCenter);
        assert_eq!(p.parse_anchor("center"), TextAnchor::MiddleCenter);
        assert_eq!(p.parse_anchor("right"), TextAnchor::UpperRight);
        assert_eq!(p.parse_anchor("sideways"), TextAnchor::UpperLeft);
    }

    #[test]
    fn enum_tables() {
        let p = ValueParser::default();
        assert_eq!(p.parse_font_style("BoldAndItalic"), FontStyle::BoldAndItalic);
        assert_eq!(p.parse_image_position("above"), ImagePosition::ImageAbove);
        assert_eq!(p.parse_image_position("?"), ImagePosition::ImageLeft);
        assert_eq!(p.parse_clipping("Clip"), TextClipping::Clip);
        assert_eq!(p.parse_clipping("?"), TextClipping::Overflow);
    }
}
