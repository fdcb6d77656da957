// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the element tree: identifiers, flags, capabilities, keys.

/// Identifier for an element in the tree.
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On destroy, the slot is freed; any existing `ElementId` that pointed to that
///   slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new,
///   distinct `ElementId`.
///
/// Stale identifiers never alias a different live element because the generation
/// must match. Every tree operation treats a stale identifier as absent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Cached per-element state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// The element's own enabled flag (ancestors are not considered).
        const ENABLED = 0b0000_0001;
        /// The element's own visible flag (ancestors are not considered).
        const VISIBLE = 0b0000_0010;
        /// The pointer is over the element, as of the last mouse move.
        const HOVERED = 0b0000_0100;
    }
}

impl Default for ElementFlags {
    fn default() -> Self {
        Self::ENABLED | Self::VISIBLE
    }
}

bitflags::bitflags! {
    /// Event categories a widget opts into.
    ///
    /// The dispatcher checks these before asking the widget for the matching
    /// capability trait object.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Mouse down, mouse up and click.
        const CLICK  = 0b0000_0001;
        /// Value changes.
        const CHANGE = 0b0000_0010;
        /// Mouse enter, move and exit.
        const MOUSE  = 0b0000_0100;
        /// Key down and key up.
        const KEY    = 0b0000_1000;
        /// Drag start, drag over and drop.
        const DRAG   = 0b0001_0000;
        /// Item selection.
        const SELECT = 0b0010_0000;
        /// Scroll wheel.
        const SCROLL = 0b0100_0000;
    }
}

/// The stock widget variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Plain container (a "box").
    Panel,
    /// Static text.
    Label,
    /// Push button.
    Button,
    /// Single-line text input.
    EditBox,
    /// Multi-line text input.
    TextArea,
    /// Toggle with a check image.
    CheckBox,
    /// Horizontal or vertical slider.
    Slider,
    /// Scrollable list of text items.
    ListBox,
    /// Container with scroll bars.
    ScrollBox,
    /// Root of a top-level layer.
    Layer,
    /// Application-defined widget.
    Custom,
}

impl WidgetKind {
    /// Whether the kind is a text-input widget that owns the host's keyboard focus.
    pub fn is_text_input(self) -> bool {
        matches!(self, Self::EditBox | Self::TextArea)
    }
}

/// Slider orientation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

/// Which scroll bars a scroll box may show.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollBarPolicy {
    /// Never show a scroll bar.
    None,
    /// Show either bar when its content overflows.
    #[default]
    Both,
    /// Only the vertical bar.
    Vertical,
    /// Only the horizontal bar.
    Horizontal,
}

impl ScrollBarPolicy {
    /// Whether the vertical bar is allowed.
    pub fn allows_vertical(self) -> bool {
        matches!(self, Self::Both | Self::Vertical)
    }

    /// Whether the horizontal bar is allowed.
    pub fn allows_horizontal(self) -> bool {
        matches!(self, Self::Both | Self::Horizontal)
    }
}

/// A keyboard key as reported by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Return / Enter.
    Enter,
    /// Escape.
    Escape,
    /// Tab.
    Tab,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Function key `F1`..=`F15`.
    F(u8),
    /// A printable character key.
    Char(char),
    /// Any other host key code.
    Other(u32),
}
