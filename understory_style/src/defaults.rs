// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in default styles, one per widget kind.
//!
//! Every kind derives from a base style that sets a Normal value for every
//! property except name and text, so the cascade always ends in a value.
//! A stylesheet may refine any of them through its `Default*Style` blocks.

use crate::factory::StyleFactory;
use crate::sheet::StyleSheet;
use crate::style::{Style, StyleRef};
use crate::types::{
    Color, EdgeFamily, Fill, FontFace, FontStyle, ImagePosition, StylePropertyType,
    StyleStateType, TextAnchor, TextClipping,
};

/// Which default style a widget binds to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefaultStyleKind {
    /// Fallback for widgets without a dedicated style (panels, layers, scroll boxes).
    Base,
    /// Labels.
    Label,
    /// Boxes.
    Box,
    /// Buttons.
    Button,
    /// Single-line text input.
    EditBox,
    /// Multi-line text input.
    TextArea,
    /// Check boxes.
    CheckBox,
    /// Horizontal sliders.
    HorizontalSlider,
    /// Vertical sliders.
    VerticalSlider,
    /// Tooltips.
    Tooltip,
    /// List boxes.
    ListBox,
}

impl DefaultStyleKind {
    /// All kinds in storage order.
    pub const ALL: [Self; 11] = [
        Self::Base,
        Self::Label,
        Self::Box,
        Self::Button,
        Self::EditBox,
        Self::TextArea,
        Self::CheckBox,
        Self::HorizontalSlider,
        Self::VerticalSlider,
        Self::Tooltip,
        Self::ListBox,
    ];

    /// Stylesheet identifier that refines this kind.
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Base => "DefaultStyle",
            Self::Label => "DefaultLabelStyle",
            Self::Box => "DefaultBoxStyle",
            Self::Button => "DefaultButtonStyle",
            Self::EditBox => "DefaultEditBoxStyle",
            Self::TextArea => "DefaultTextAreaStyle",
            Self::CheckBox => "DefaultCheckBoxStyle",
            Self::HorizontalSlider => "DefaultHorizontalSliderStyle",
            Self::VerticalSlider => "DefaultVerticalSliderStyle",
            Self::Tooltip => "DefaultTooltipStyle",
            Self::ListBox => "DefaultListBoxStyle",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Base => 0,
            Self::Label => 1,
            Self::Box => 2,
            Self::Button => 3,
            Self::EditBox => 4,
            Self::TextArea => 5,
            Self::CheckBox => 6,
            Self::HorizontalSlider => 7,
            Self::VerticalSlider => 8,
            Self::Tooltip => 9,
            Self::ListBox => 10,
        }
    }
}

/// The shared default style of every widget kind.
#[derive(Debug)]
pub struct DefaultStyles {
    styles: [StyleRef; 11],
}

impl Default for DefaultStyles {
    fn default() -> Self {
        Self::new()
    }
}

const BACKGROUNDS: [Color; 5] = [
    Color::rgba(0.75, 0.0, 0.0, 0.75),
    Color::rgba(0.0, 0.0, 0.75, 0.75),
    Color::rgba(1.0, 0.0, 0.0, 0.75),
    Color::rgba(0.0, 1.0, 0.0, 0.75),
    Color::rgba(1.0, 1.0, 0.0, 0.75),
];

/// Base style with a Normal value for every resolvable property.
pub fn base_style() -> Style {
    let mut s = Style::new();
    s.set_enabled(true);
    s.set_visible(true);
    s.set_left(0.0);
    s.set_top(0.0);
    s.set_width(0.0);
    s.set_height(0.0);
    s.set_clipping(TextClipping::Clip);
    s.set_word_wrap(false);
    s.set_check_image_position(ImagePosition::TextOnly);
    s.set_thumb_width(0.0);
    s.set_thumb_height(0.0);
    s.set_item_height(0.0);
    {
        let mut n = s.state_mut(StyleStateType::Normal);
        n.set_content_offset_left(0.0);
        n.set_content_offset_top(0.0);
        n.set_font(FontFace::Builtin);
        n.set_alignment(TextAnchor::UpperLeft);
        n.set_text_color(Color::BLACK);
        n.set_font_size(12);
        n.set_font_style(FontStyle::Normal);
        for family in [
            EdgeFamily::Padding,
            EdgeFamily::Margin,
            EdgeFamily::Border,
            EdgeFamily::Overflow,
            EdgeFamily::ThumbBorder,
            EdgeFamily::ItemPadding,
        ] {
            n.set_edges(family, 0, 0, 0, 0);
        }
        for fill in [
            StylePropertyType::Background,
            StylePropertyType::CheckImage,
            StylePropertyType::UncheckImage,
            StylePropertyType::ThumbBackground,
            StylePropertyType::ItemBackground,
            StylePropertyType::SelectedBackground,
        ] {
            n.set_fill(fill, Fill::Empty);
        }
        n.set_selected_text_color(Color::BLACK);
    }
    s
}

fn state_backgrounds(s: &mut Style, property: StylePropertyType, with_focused: bool) {
    use StyleStateType as S;
    let mut states = vec![(S::Normal, 0), (S::Active, 1), (S::Hover, 2)];
    if with_focused {
        states.push((S::Focused, 3));
    }
    for (state, i) in states {
        s.state_mut(state)
            .set_fill(property, Fill::Color(BACKGROUNDS[i]));
    }
}

impl DefaultStyles {
    /// Built-in defaults.
    pub fn new() -> Self {
        let base = base_style();
        let styles = DefaultStyleKind::ALL.map(|kind| {
            let mut s = base.copy();
            match kind {
                DefaultStyleKind::Base | DefaultStyleKind::Label | DefaultStyleKind::Box => {}
                DefaultStyleKind::Button => {
                    state_backgrounds(&mut s, StylePropertyType::Background, true);
                }
                DefaultStyleKind::EditBox => {
                    s.set_word_wrap(false);
                    state_backgrounds(&mut s, StylePropertyType::Background, true);
                }
                DefaultStyleKind::TextArea => {
                    s.set_word_wrap(true);
                    state_backgrounds(&mut s, StylePropertyType::Background, true);
                }
                DefaultStyleKind::CheckBox => {
                    s.set_check_image_position(ImagePosition::ImageLeft);
                    let mut n = s.state_mut(StyleStateType::Normal);
                    n.set_fill(StylePropertyType::CheckImage, Fill::Color(Color::BLACK));
                    n.set_fill(StylePropertyType::UncheckImage, Fill::Color(Color::GRAY));
                }
                DefaultStyleKind::HorizontalSlider => {
                    s.set_height(10.0);
                    s.set_thumb_width(10.0);
                    s.set_background(Fill::Color(BACKGROUNDS[4]));
                    state_backgrounds(&mut s, StylePropertyType::ThumbBackground, false);
                }
                DefaultStyleKind::VerticalSlider => {
                    s.set_width(10.0);
                    s.set_thumb_height(10.0);
                    s.set_background(Fill::Color(BACKGROUNDS[4]));
                    state_backgrounds(&mut s, StylePropertyType::ThumbBackground, false);
                }
                DefaultStyleKind::Tooltip => {
                    s.set_word_wrap(true);
                    s.set_padding_uniform(5);
                    s.set_background(Fill::Color(Color::YELLOW));
                }
                DefaultStyleKind::ListBox => {
                    s.set_item_height(20.0);
                    state_backgrounds(&mut s, StylePropertyType::Background, true);
                }
            }
            s.into_ref()
        });
        Self { styles }
    }

    /// Built-in defaults refined by the `Default*Style` blocks of `sheet`.
    ///
    /// Kinds without a block keep their built-in values.
    pub fn from_sheet(factory: &StyleFactory, sheet: &StyleSheet) -> Self {
        let defaults = Self::new();
        for kind in DefaultStyleKind::ALL {
            let identifier = kind.identifier();
            if sheet.contains(identifier) {
                factory.update_style(identifier, &mut defaults.get(kind).borrow_mut(), sheet);
            }
        }
        defaults
    }

    /// Shared handle to the default style of `kind`.
    pub fn get(&self, kind: DefaultStyleKind) -> StyleRef {
        self.styles[kind.index()].clone()
    }
}
