// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_element_tree --heading-base-level=0

//! Understory Element Tree: an arena of widgets with cascading styles.
//!
//! Elements live in a [`Tree`] and are addressed by generational [`ElementId`]s.
//! A stale handle never aliases a newer element; operations on it are no-ops.
//!
//! - Collections ([`Panel`], [`ScrollBox`], [`LayerRoot`]) own an ordered child
//!   list. Order is draw order, so the last child is topmost.
//! - Parent links are non-owning. Every link is created by
//!   [`Tree::add_element`] / [`Tree::insert_element`], which refuse cycles,
//!   double parents, layer roots and out-of-range indices.
//! - Each element binds a default, an optional class and an instance
//!   [`Style`](understory_style::Style). Geometry, name, text and the
//!   enabled/visible flags come from the cascade; the setters write the
//!   instance style.
//! - [`Tree::is_enabled`] and [`Tree::is_visible`] fold in every ancestor.
//!   [`Tree::absolute_position`] subtracts the scroll offset of scrolling
//!   ancestors.
//!
//! ## Widgets and capabilities
//!
//! A [`Widget`] declares which event categories it handles through
//! [`Capabilities`] and exposes them through the `as_*` accessors
//! ([`Widget::as_clickable`], [`Widget::as_draggable`], ...). Dispatchers ask
//! for a capability instead of testing concrete types.
//!
//! ## Minimal usage
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_element_tree::{Button, LayerRoot, Panel, QueryFilter, Tree};
//!
//! let mut tree = Tree::new();
//! let layer = tree.create(LayerRoot::default());
//! let panel = tree.create(Panel::default());
//! tree.set_bounds(panel, Rect::new(10.0, 10.0, 210.0, 110.0));
//! assert!(tree.add_element(layer, panel));
//!
//! let ok = tree.create(Button::default());
//! tree.set_bounds(ok, Rect::new(5.0, 5.0, 85.0, 35.0));
//! tree.set_text(ok, "OK");
//! assert!(tree.add_element(panel, ok));
//!
//! assert_eq!(tree.absolute_position(ok), Point::new(15.0, 15.0));
//! let hits = tree.elements_at(Point::new(20.0, 20.0), layer, QueryFilter::default());
//! assert_eq!(hits.as_slice(), &[ok, panel]);
//!
//! // A layer root is never a child.
//! let other = tree.create(LayerRoot::default());
//! assert!(!tree.add_element(panel, other));
//! ```

pub mod scroll;
mod skin;
pub mod tree;
pub mod types;
pub mod widget;
pub mod widgets;

pub use scroll::{ListBox, SCROLL_BAR_THICKNESS, ScrollBar, ScrollBox};
pub use tree::{HitList, QueryFilter, Tree};
pub use types::{
    Capabilities, ElementFlags, ElementId, KeyCode, Orientation, ScrollBarPolicy, WidgetKind,
};
pub use widget::{
    Changeable, ClickHandlers, Clickable, DragHandler, DragHandlers, DragStartHandler, Draggable,
    Handler, KeyAware, KeyHandler, KeyHandlers, MouseHandler, NotifySlot, PointerContext,
    RefreshContext, Scrollable, Selectable, Widget,
};
pub use widgets::{Button, CheckBox, Label, LayerRoot, Panel, Slider, SliderModel, TextInput};
