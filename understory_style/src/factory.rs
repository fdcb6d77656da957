// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Materialize [`Style`]s from parsed [`StyleSheet`] blocks.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{error, warn};

use crate::parse::ValueParser;
use crate::sheet::{StyleBlock, StyleSheet};
use crate::state::StyleState;
use crate::style::{Style, StyleRef};
use crate::types::{Edge, EdgeFamily, Fill, StylePropertyType, StyleStateType};

/// Attribute names that live on the style itself, read from the Normal block only.
pub const MAJOR_PROPERTIES: [&str; 14] = [
    "name",
    "text",
    "wordwrap",
    "enabled",
    "visible",
    "top",
    "left",
    "height",
    "width",
    "textclipping",
    "checkimageposition",
    "thumbheight",
    "thumbwidth",
    "itemheight",
];

/// Builds styles from stylesheet blocks and caches them by identifier.
#[derive(Debug, Default)]
pub struct StyleFactory {
    cache: FxHashMap<String, StyleRef>,
}

impl StyleFactory {
    /// Create a factory with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared style for `identifier`, built on first request.
    ///
    /// Unknown identifiers log an error and yield `None`.
    pub fn get_style(&mut self, identifier: &str, sheet: &StyleSheet) -> Option<StyleRef> {
        if let Some(style) = self.cache.get(identifier) {
            return Some(style.clone());
        }
        let Some(block) = sheet.get(identifier) else {
            error!(identifier, "cannot find style for identifier");
            return None;
        };
        let mut style = Style::new();
        make_style(identifier, block, &mut style);
        let style = style.into_ref();
        self.cache.insert(identifier.to_owned(), style.clone());
        Some(style)
    }

    /// Apply the block for `identifier` onto an existing style.
    ///
    /// Returns `false` and logs an error if the identifier is unknown.
    pub fn update_style(&self, identifier: &str, target: &mut Style, sheet: &StyleSheet) -> bool {
        match sheet.get(identifier) {
            Some(block) => {
                make_style(identifier, block, target);
                true
            }
            None => {
                error!(identifier, "cannot find style for identifier, doing nothing");
                false
            }
        }
    }

    /// Forget every cached style.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

fn make_style(identifier: &str, block: &StyleBlock, target: &mut Style) {
    let parser = ValueParser::new(identifier, &block.file);
    major_properties(&parser, target, block.attributes(StyleStateType::Normal));
    for state in StyleStateType::ALL {
        let mut guard = target.state_mut(state);
        state_properties(&parser, &mut guard, block.attributes(state));
    }
}

fn major_properties(
    parser: &ValueParser<'_>,
    target: &mut Style,
    entries: &IndexMap<String, String>,
) {
    for (key, value) in entries {
        match key.as_str() {
            "name" => target.set_name(value.clone()),
            "text" => target.set_text(value.clone()),
            "enabled" => target.set_enabled(parser.parse_bool(value)),
            "visible" => target.set_visible(parser.parse_bool(value)),
            "wordwrap" => target.set_word_wrap(parser.parse_bool(value)),
            "top" => target.set_top(parser.parse_float(value)),
            "left" => target.set_left(parser.parse_float(value)),
            "width" => target.set_width(parser.parse_float(value)),
            "height" => target.set_height(parser.parse_float(value)),
            "textclipping" => target.set_clipping(parser.parse_clipping(value)),
            "checkimageposition" => {
                target.set_check_image_position(parser.parse_image_position(value));
            }
            "thumbheight" => target.set_thumb_height(parser.parse_float(value)),
            "thumbwidth" => target.set_thumb_width(parser.parse_float(value)),
            "itemheight" => target.set_item_height(parser.parse_float(value)),
            _ => {}
        }
    }
}

fn edge_key(key: &str) -> Option<(EdgeFamily, Edge)> {
    const FAMILIES: [(&str, EdgeFamily); 6] = [
        ("thumbborder", EdgeFamily::ThumbBorder),
        ("itempadding", EdgeFamily::ItemPadding),
        ("padding", EdgeFamily::Padding),
        ("margin", EdgeFamily::Margin),
        ("border", EdgeFamily::Border),
        ("overflow", EdgeFamily::Overflow),
    ];
    let (family, rest) = FAMILIES
        .iter()
        .find_map(|(prefix, family)| key.strip_prefix(prefix).map(|rest| (*family, rest)))?;
    let edge = match rest {
        "left" => Edge::Left,
        "right" => Edge::Right,
        "top" => Edge::Top,
        "bottom" => Edge::Bottom,
        _ => return None,
    };
    Some((family, edge))
}

fn fill_key(key: &str) -> Option<StylePropertyType> {
    use StylePropertyType as P;
    Some(match key.strip_suffix("path").unwrap_or(key) {
        "background" => P::Background,
        "checkimage" => P::CheckImage,
        "uncheckimage" => P::UncheckImage,
        "thumbbackground" => P::ThumbBackground,
        "itembackground" => P::ItemBackground,
        "selectedbackground" => P::SelectedBackground,
        _ => return None,
    })
}

fn state_properties(
    parser: &ValueParser<'_>,
    target: &mut StyleState,
    entries: &IndexMap<String, String>,
) {
    for (key, value) in entries {
        if let Some((family, edge)) = edge_key(key) {
            target.set_edge(family, edge, parser.parse_int(value));
            continue;
        }
        if let Some(property) = fill_key(key) {
            target.set_fill_path(property, value.clone());
            continue;
        }
        match key.as_str() {
            "contentoffsetleft" => target.set_content_offset_left(parser.parse_float(value)),
            "contentoffsettop" => target.set_content_offset_top(parser.parse_float(value)),
            "textcolor" => target.set_text_color(parser.parse_color(value)),
            "backgroundcolor" => {
                target.set_background(Fill::Color(parser.parse_color(value)));
            }
            "alignment" => target.set_alignment(parser.parse_anchor(value)),
            "font" | "fontpath" => target.set_font_path(value.clone()),
            "fontsize" => target.set_font_size(parser.parse_int(value)),
            "fontstyle" => target.set_font_style(parser.parse_font_style(value)),
            "selectedtextcolor" => target.set_selected_text_color(parser.parse_color(value)),
            _ if MAJOR_PROPERTIES.contains(&key.as_str()) => {}
            _ => warn!(
                identifier = parser.identifier,
                file = parser.file,
                property = %key,
                "not a valid property, skipping"
            ),
        }
    }
}
