// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_layers --heading-base-level=0

//! Understory Layers: z-ordered layers over an element tree, and the per-frame
//! dispatcher that turns host input into widget events.
//!
//! A [`LayerManager`] owns the [`Tree`](understory_element_tree::Tree) and a
//! host [`Backend`]. The host forwards every input callback as a
//! [`RawInputEvent`]; the manager computes hit lists, tracks hover, focus,
//! the pressed control and drag sessions, and draws on repaint.
//!
//! - Layers are sorted by z-index. Modal layers sit above every regular layer
//!   and, while present, receive all pointer input.
//! - Clicks, drops and wheel scrolling go to the topmost element that uses
//!   them. Keys go to the focused element, then its nearest key-aware
//!   ancestor, then every layer root.
//! - [`animation`] steps time-driven changes once per repaint.
//! - [`console`] provides a bounded message log and text commands for
//!   inspecting the UI.
//!
//! ## Minimal usage
//!
//! ```
//! use kurbo::{Point, Rect, Size};
//! use understory_element_tree::Button;
//! use understory_layers::{Backend, DrawItem, EventKind, LayerManager, RawInputEvent};
//! use understory_style::ResolvedState;
//!
//! struct Headless;
//!
//! impl Backend for Headless {
//!     fn draw_element(&mut self, _: &DrawItem<'_>) {}
//!     fn draw_tooltip(&mut self, _: &str, _: Rect, _: &ResolvedState) {}
//!     fn measure_text(&self, text: &str, _: &ResolvedState, _: Option<f64>) -> Size {
//!         Size::new(8.0 * text.len() as f64, 16.0)
//!     }
//!     fn screen_size(&self) -> Size { Size::new(640.0, 480.0) }
//!     fn now(&self) -> f64 { 0.0 }
//!     fn focus_text_input(&mut self, _: &str) {}
//!     fn clear_keyboard_focus(&mut self) {}
//!     fn set_cursor_visible(&mut self, _: bool) {}
//! }
//!
//! let mut ui = LayerManager::new(Headless);
//! let layer = ui.create_layer(0, false).unwrap();
//! let tree = ui.tree_mut();
//! let ok = tree.create(Button::default());
//! tree.set_bounds(ok, Rect::new(10.0, 10.0, 90.0, 40.0));
//! tree.add_element(layer, ok);
//!
//! let at = Point::new(20.0, 20.0);
//! ui.handle_event(&RawInputEvent::pointer(EventKind::MouseDown, at));
//! assert_eq!(ui.focus(), Some(ok));
//! assert_eq!(ui.active_control(), Some(ok));
//! ```

pub mod animation;
pub mod backend;
pub mod config;
pub mod console;
pub mod hover;
pub mod input;
mod manager;

pub use animation::{
    Animation, AnimationRef, MoveAnimation, MultiAnimation, ResizeAnimation, Timeline,
};
pub use backend::{Backend, DrawItem};
pub use config::{Configuration, DragSettings, TooltipSettings};
pub use console::{
    CommandProc, CommandRegistry, CommandTable, Console, ElementMask, parse_bool_param,
    ui_commands,
};
pub use input::{EventKind, RawInputEvent};
pub use manager::{LayerError, LayerHook, LayerManager};
