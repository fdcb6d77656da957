// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_style --heading-base-level=0

//! Understory Style: cascading, state-aware widget styles.
//!
//! A [`Style`] is a bundle of optional property overrides: a handful of
//! state-independent values (position, size, text, flags) plus one [`StyleState`]
//! per interaction state ([`StyleStateType::Normal`], `Active`, `Hover`,
//! `Focused`). `None` means "not set at this level".
//!
//! Every element binds three styles, from most to least specific: its own
//! instance style, an optional shared class style, and the default style of its
//! widget kind. [`StyleLayers::resolve`] walks that cascade for one property and
//! one state; see the [`cascade`] module for the exact probe order.
//!
//! ## Change notification
//!
//! Styles do not own the widgets rendering with them. Listeners subscribe with an
//! [`Rc`](std::rc::Rc) and are held weakly, so dropping a widget is enough to stop
//! its notifications. Stale entries are swept on the next notification.
//!
//! ## Stylesheets and assets
//!
//! - [`StyleSheet`] parses the text format into `identifier → state → attribute`
//!   tables.
//! - [`StyleFactory`] turns those tables into typed [`Style`]s, using the
//!   [`ValueParser`] fallbacks for malformed values.
//! - [`DefaultStyles`] holds the per-kind defaults, optionally refined by a sheet.
//! - [`AssetRegistry`] resolves texture and font paths, parking styles on a
//!   bundle's waiting list until the bundle is registered.
//!
//! ## Minimal usage
//!
//! ```
//! use understory_style::{Color, Style, StyleLayers, StylePropertyType, StyleStateType, StyleValue};
//!
//! let mut default = Style::new();
//! default.set_text_color(Color::BLACK);
//!
//! let mut class = Style::new();
//! class
//!     .state_mut(StyleStateType::Hover)
//!     .set_text_color(Color::RED);
//!
//! let element = Style::new();
//! let layers = StyleLayers { element: &element, class: Some(&class), default: &default };
//!
//! assert_eq!(
//!     layers.resolve(StylePropertyType::TextColor, StyleStateType::Hover),
//!     Some(StyleValue::Color(Color::RED)),
//! );
//! assert_eq!(
//!     layers.resolve(StylePropertyType::TextColor, StyleStateType::Normal),
//!     Some(StyleValue::Color(Color::BLACK)),
//! );
//! ```

pub mod assets;
pub mod cascade;
pub mod defaults;
pub mod factory;
pub mod notify;
pub mod parse;
pub mod sheet;
pub mod state;
pub mod style;
pub mod types;

pub use assets::{AssetBundle, AssetRegistry, BundleDownload, LoadCompleted, ResourceLoader};
pub use cascade::{Insets, ResolvedState, StyleLayers};
pub use defaults::{DefaultStyleKind, DefaultStyles, base_style};
pub use factory::StyleFactory;
pub use notify::{StyleListener, Subscribers};
pub use parse::{ValueParser, try_parse_bool, try_parse_color};
pub use sheet::{StyleBlock, StyleSheet, StyleSheetError};
pub use state::{AssetKind, AssetSlot, EdgeValues, StyleState};
pub use style::{StateMut, Style, StyleRef};
pub use types::{
    AssetId, Color, Edge, EdgeFamily, Fill, FontFace, FontStyle, ImagePosition, PropertySet,
    StylePropertyType, StyleStateType, StyleValue, TextAnchor, TextClipping,
};
