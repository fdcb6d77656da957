// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug console: a bounded message log, named command tables, and the
//! built-in UI inspection commands.
//!
//! A command line is split at the first space into a command name and its
//! parameter string. The first registered [`CommandTable`] that knows the name
//! runs it.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::{debug, info};
use understory_element_tree::{ElementId, LayerRoot, Tree};
use understory_style::{Color, Fill, FontStyle, StyleStateType, TextAnchor, try_parse_bool};

use crate::manager::LayerManager;

/// A console command: receives the manager and the parameter string.
pub type CommandProc = Box<dyn FnMut(&mut LayerManager, &str)>;

/// Parse a boolean command parameter. Anything but a false word is true.
pub fn parse_bool_param(value: &str) -> bool {
    try_parse_bool(value).unwrap_or(true)
}

/// A named set of commands.
pub struct CommandTable {
    name: String,
    commands: FxHashMap<String, CommandProc>,
}

impl core::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CommandTable")
            .field("name", &self.name)
            .field("commands", &names)
            .finish()
    }
}

impl CommandTable {
    /// An empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: FxHashMap::default(),
        }
    }

    /// The table's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a command.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        command: impl FnMut(&mut LayerManager, &str) + 'static,
    ) {
        self.commands.insert(name.into(), Box::new(command));
    }

    /// Builder form of [`CommandTable::add`].
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        command: impl FnMut(&mut LayerManager, &str) + 'static,
    ) -> Self {
        self.add(name, command);
        self
    }

    /// Whether the table has `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Command names.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.keys().map(String::as_str)
    }

    fn run(&mut self, name: &str, ui: &mut LayerManager, params: &str) -> bool {
        match self.commands.get_mut(name) {
            Some(command) => {
                command(ui, params);
                true
            }
            None => false,
        }
    }
}

/// Registered command tables, searched in registration order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    tables: Vec<CommandTable>,
}

impl CommandRegistry {
    /// Register a table. A table with the same name is replaced.
    pub fn register(&mut self, table: CommandTable) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    /// Remove the table named `name`.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.tables.len();
        self.tables.retain(|t| t.name != name);
        self.tables.len() != before
    }

    /// Move every table of `other` into this registry.
    pub fn merge(&mut self, other: Self) {
        for table in other.tables {
            self.register(table);
        }
    }

    /// Run `input`. Returns whether a command of that name exists.
    pub fn execute_command(&mut self, input: &str, ui: &mut LayerManager) -> bool {
        let input = input.trim();
        let (name, params) = input.split_once(' ').unwrap_or((input, ""));
        for table in &mut self.tables {
            if table.run(name, ui, params.trim()) {
                debug!(command = name, table = %table.name, "console command executed");
                return true;
            }
        }
        info!(command = name, "unknown console command");
        false
    }

    /// Command names starting with `prefix`, sorted.
    pub fn commands(&self, prefix: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .tables
            .iter()
            .flat_map(CommandTable::names)
            .filter(|n| n.starts_with(prefix))
            .map(str::to_owned)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// The console's message log.
#[derive(Clone, Debug)]
pub struct Console {
    layer: ElementId,
    messages: VecDeque<String>,
    limit: usize,
}

impl Console {
    pub(crate) fn new(layer: ElementId, limit: usize) -> Self {
        Self {
            layer,
            messages: VecDeque::new(),
            limit,
        }
    }

    /// Root of the console layer.
    pub fn layer(&self) -> ElementId {
        self.layer
    }

    /// Append a message, dropping the oldest beyond the limit.
    pub fn print(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "understory_layers::console", "{message}");
        self.messages.push_back(format!("[Console] {message}"));
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    /// Logged messages, oldest first.
    pub fn messages(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.messages.iter().map(String::as_str)
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

const MASK_USAGE: &str = "Usage: \"ui_show_mask [visible|updateInterval|layerName [updateInterval]]\".";
const DEFAULT_MASK_INTERVAL: u32 = 100;

/// The built-in UI commands: `ping`, `ui_layer_info`, `ui_remove_layer`,
/// `ui_show` and `ui_show_mask`.
pub fn ui_commands() -> CommandTable {
    CommandTable::new("ui")
        .with("ping", |ui, _| ui.print("PONG!"))
        .with("ui_layer_info", layer_info)
        .with("ui_remove_layer", |ui, name| {
            let doomed: Vec<ElementId> = ui
                .layers()
                .filter(|&root| ui.tree().name(root) == Some(name))
                .collect();
            for &root in &doomed {
                ui.remove_layer(root);
            }
            ui.print(format!("{} layers have been removed.", doomed.len()));
        })
        .with("ui_show", |ui, params| {
            let visible = parse_bool_param(params);
            let console = ui.console().map(Console::layer);
            let roots: Vec<ElementId> = ui.layers().filter(|&r| Some(r) != console).collect();
            for root in roots {
                ui.tree_mut().set_visible(root, visible);
            }
        })
        .with("ui_show_mask", show_mask)
}

fn layer_info(ui: &mut LayerManager, params: &str) {
    let layers: Vec<ElementId> = ui.layers().rev().collect();
    let count = params
        .trim()
        .parse::<i64>()
        .map_or(layers.len(), |n| usize::try_from(n).unwrap_or(0).min(layers.len()));
    let modal = ui.modal_layer();
    let lines: Vec<String> = layers[..count]
        .iter()
        .enumerate()
        .map(|(i, &root)| {
            let tree = ui.tree();
            let modal = if modal == Some(root) { "Modal: true, " } else { "" };
            format!(
                "{} {} ({modal}Visible: {}, Enabled: {}, ZIndex: {})",
                i + 1,
                tree.display_name(root),
                tree.visible(root),
                tree.enabled(root),
                ui.z_index(root).unwrap_or_default(),
            )
        })
        .collect();
    for line in lines {
        ui.print(line);
    }
}

fn show_mask(ui: &mut LayerManager, params: &str) {
    let args: Vec<&str> = params.split_whitespace().collect();
    let request = match args.as_slice() {
        [] => Ok((DEFAULT_MASK_INTERVAL, None)),
        [first, ..] if try_parse_bool(first).is_some() => {
            if parse_bool_param(first) {
                Ok((DEFAULT_MASK_INTERVAL, None))
            } else {
                ui.remove_mask();
                return;
            }
        }
        [first] => match parse_interval(first) {
            Some(ms) => positive(ms).map(|ms| (ms, None)),
            None => Ok((DEFAULT_MASK_INTERVAL, Some(*first))),
        },
        [name, ms, ..] => match parse_interval(ms) {
            Some(ms) => positive(ms).map(|ms| (ms, Some(*name))),
            None => Err(MASK_USAGE),
        },
    };
    match request {
        Ok((interval_ms, layer)) => {
            ui.remove_mask();
            ui.print("Showing user interface mask.");
            ui.show_mask(interval_ms, layer.map(str::to_owned));
        }
        Err(message) => ui.print(message),
    }
}

fn parse_interval(value: &str) -> Option<i64> {
    value.parse().ok()
}

fn positive(ms: i64) -> Result<u32, &'static str> {
    u32::try_from(ms)
        .ok()
        .filter(|&ms| ms > 0)
        .ok_or("Error: updateInterval parameter has to be positive.")
}

/// Debug overlay outlining every element of the other layers.
///
/// Each refresh mirrors the elements as labelled, non-interactive buttons at
/// their absolute bounds. Buttons are reused between refreshes.
#[derive(Debug)]
pub struct ElementMask {
    root: ElementId,
    interval: f64,
    layer_name: Option<String>,
    last_refresh: Option<f64>,
    buttons: Vec<ElementId>,
    shown: usize,
}

impl ElementMask {
    pub(crate) fn new(tree: &mut Tree, interval_ms: u32, layer_name: Option<String>) -> Self {
        let root = tree.create(LayerRoot::default());
        tree.set_name(root, "ElementMask");
        tree.set_enabled(root, false);
        Self {
            root,
            interval: f64::from(interval_ms) / 1000.0,
            layer_name,
            last_refresh: None,
            buttons: Vec::new(),
            shown: 0,
        }
    }

    /// Root of the mask layer.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Only layers with this name are mirrored.
    pub fn layer_name(&self) -> Option<&str> {
        self.layer_name.as_deref()
    }

    /// Refresh period in seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Mirror buttons currently shown.
    pub fn buttons(&self) -> &[ElementId] {
        &self.buttons[..self.shown]
    }

    /// Rebuild the mirror from `layers` if the interval has elapsed.
    pub(crate) fn refresh(&mut self, tree: &mut Tree, layers: &[ElementId], now: f64) {
        if self.last_refresh.is_some_and(|t| now - t < self.interval) {
            return;
        }
        self.last_refresh = Some(now);

        let mut targets = Vec::new();
        for &layer in layers {
            if self
                .layer_name
                .as_deref()
                .is_none_or(|name| tree.name(layer) == Some(name))
            {
                collect_descendants(tree, layer, &mut targets);
            }
        }

        for &button in &self.buttons[targets.len().min(self.shown)..self.shown] {
            tree.remove_element(self.root, button);
        }
        for (i, &target) in targets.iter().enumerate() {
            let button = match self.buttons.get(i) {
                Some(&b) => b,
                None => {
                    let b = mask_button(tree);
                    self.buttons.push(b);
                    b
                }
            };
            if i >= self.shown {
                tree.add_element(self.root, button);
            }
            let label = tree.display_name(target);
            let bounds = tree.absolute_bounds(target);
            tree.set_text(button, label);
            tree.set_bounds(button, bounds);
        }
        self.shown = targets.len();
    }
}

fn collect_descendants(tree: &Tree, parent: ElementId, out: &mut Vec<ElementId>) {
    for &child in tree.children(parent) {
        collect_descendants(tree, child, out);
        out.push(child);
    }
}

fn mask_button(tree: &mut Tree) -> ElementId {
    let button = tree.create(understory_element_tree::Button::default());
    if let Some(style) = tree.element_style(button) {
        let mut style = style.borrow_mut();
        style.set_border(2, 2, 2, 2);
        style.set_alignment(TextAnchor::MiddleCenter);
        style.set_text_color(Color::rgba(0.0, 0.0, 0.0, 0.4));
        style.set_font_size(12);
        style.set_background(Fill::Color(Color::rgba(0.0, 0.6, 0.0, 0.25)));
        style
            .state_mut(StyleStateType::Normal)
            .set_font_style(FontStyle::Bold);
    }
    tree.sync_element(button);
    button
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use kurbo::{Rect, Size};
    use std::rc::Rc;
    use understory_element_tree::Label;
    use understory_style::ResolvedState;

    use crate::backend::{Backend, DrawItem};
    use crate::input::RawInputEvent;

    struct NullBackend;

    impl Backend for NullBackend {
        fn draw_element(&mut self, _item: &DrawItem<'_>) {}
        fn draw_tooltip(&mut self, _text: &str, _bounds: Rect, _style: &ResolvedState) {}
        fn measure_text(&self, _text: &str, _style: &ResolvedState, _max: Option<f64>) -> Size {
            Size::ZERO
        }
        fn screen_size(&self) -> Size {
            Size::new(800.0, 600.0)
        }
        fn now(&self) -> f64 {
            0.0
        }
        fn focus_text_input(&mut self, _guid: &str) {}
        fn clear_keyboard_focus(&mut self) {}
        fn set_cursor_visible(&mut self, _visible: bool) {}
    }

    fn ui() -> LayerManager {
        let mut ui = LayerManager::new(NullBackend);
        ui.install_console();
        ui
    }

    fn last_message(ui: &LayerManager) -> Option<String> {
        ui.console()?.messages().last().map(str::to_owned)
    }

    fn named_layer(ui: &mut LayerManager, name: &str, z: i32) -> ElementId {
        let root = ui.create_layer(z, false).unwrap();
        ui.tree_mut().set_name(root, name);
        root
    }

    #[test]
    fn commands_split_at_the_first_space() {
        let mut ui = ui();
        let seen = Rc::new(RefCell::new(String::new()));
        let out = seen.clone();
        ui.register_commands(
            CommandTable::new("test").with("echo", move |_, params| *out.borrow_mut() = params.to_owned()),
        );
        assert!(ui.execute_command("echo hello  world"));
        assert_eq!(seen.borrow().as_str(), "hello  world");
        assert!(!ui.execute_command("nope"));

        ui.execute_command("ping");
        assert_eq!(last_message(&ui).as_deref(), Some("[Console] PONG!"));
    }

    #[test]
    fn command_listing_is_sorted_and_filtered() {
        let ui = ui();
        assert_eq!(
            ui.commands().commands("ui_show"),
            vec!["ui_show".to_owned(), "ui_show_mask".to_owned()]
        );
        assert_eq!(ui.commands().commands("").first().map(String::as_str), Some("ping"));
    }

    #[test]
    fn tables_can_be_replaced_and_removed() {
        let mut registry = CommandRegistry::default();
        registry.register(CommandTable::new("a").with("x", |_, _| {}));
        registry.register(CommandTable::new("a").with("y", |_, _| {}));
        assert_eq!(registry.commands(""), vec!["y".to_owned()]);
        assert!(registry.unregister("a"));
        assert!(registry.commands("").is_empty());
    }

    #[test]
    fn console_log_is_bounded() {
        let mut tree = Tree::new();
        let mut console = Console::new(tree.create(LayerRoot::default()), 2);
        for m in ["one", "two", "three"] {
            console.print(m);
        }
        assert_eq!(
            console.messages().collect::<Vec<_>>(),
            vec!["[Console] two", "[Console] three"],
            "oldest message is dropped"
        );
    }

    #[test]
    fn bool_params_default_to_true() {
        assert!(parse_bool_param("on"));
        assert!(parse_bool_param("whatever"));
        assert!(!parse_bool_param("0"));
        assert!(!parse_bool_param("Off"));
    }

    #[test]
    fn layer_info_lists_from_the_top() {
        let mut ui = ui();
        named_layer(&mut ui, "hud", 1);
        named_layer(&mut ui, "world", 0);
        let dialog = ui.create_layer(0, true).unwrap();
        ui.tree_mut().set_name(dialog, "dialog");

        ui.execute_command("ui_layer_info 2");
        let messages: Vec<&str> = ui.console().unwrap().messages().collect();
        let max = ui.config().max_z_index;
        assert_eq!(
            messages,
            vec![
                format!("[Console] 1 dialog (Modal: true, Visible: true, Enabled: true, ZIndex: {})", max + 1),
                "[Console] 2 hud (Visible: true, Enabled: true, ZIndex: 1)".to_owned(),
            ]
        );
    }

    #[test]
    fn remove_layer_by_name() {
        let mut ui = ui();
        named_layer(&mut ui, "hud", 1);
        named_layer(&mut ui, "hud", 2);
        let world = named_layer(&mut ui, "world", 0);
        ui.execute_command("ui_remove_layer hud");
        assert_eq!(last_message(&ui).as_deref(), Some("[Console] 2 layers have been removed."));
        assert_eq!(ui.layers().collect::<Vec<_>>(), vec![world]);
    }

    #[test]
    fn ui_show_spares_the_console() {
        let mut ui = ui();
        let hud = named_layer(&mut ui, "hud", 1);
        let console = ui.console().unwrap().layer();
        ui.toggle_console();
        ui.execute_command("ui_show off");
        assert!(!ui.tree().visible(hud));
        assert!(ui.tree().visible(console), "the console stays visible");
        ui.execute_command("ui_show");
        assert!(ui.tree().visible(hud), "no parameter means true");
    }

    #[test]
    fn show_mask_parameters() {
        let mut ui = ui();
        named_layer(&mut ui, "hud", 1);

        ui.execute_command("ui_show_mask -5");
        assert_eq!(
            last_message(&ui).as_deref(),
            Some("[Console] Error: updateInterval parameter has to be positive.")
        );
        ui.execute_command("ui_show_mask hud soon");
        assert_eq!(last_message(&ui).as_deref(), Some(format!("[Console] {MASK_USAGE}").as_str()));
        assert!(ui.mask().is_none());

        ui.execute_command("ui_show_mask hud 250");
        let mask = ui.mask().unwrap();
        assert_eq!(mask.layer_name(), Some("hud"));
        assert_eq!(mask.interval(), 0.25);
        assert_eq!(last_message(&ui).as_deref(), Some("[Console] Showing user interface mask."));

        ui.execute_command("ui_show_mask 40");
        assert_eq!(ui.mask().map(ElementMask::layer_name), Some(None));

        ui.execute_command("ui_show_mask false");
        assert!(ui.mask().is_none(), "false removes the mask");
    }

    #[test]
    fn mask_mirrors_elements_descendants_first() {
        let mut ui = ui();
        let hud = named_layer(&mut ui, "hud", 1);
        let tree = ui.tree_mut();
        let panel = tree.create(understory_element_tree::Panel::default());
        tree.set_bounds(panel, Rect::new(10.0, 10.0, 110.0, 60.0));
        tree.set_name(panel, "panel");
        tree.add_element(hud, panel);
        let label = tree.create(Label);
        tree.set_bounds(label, Rect::new(5.0, 5.0, 25.0, 15.0));
        tree.set_text(label, "hi");
        tree.add_element(panel, label);

        let mask_root = ui.show_mask(100, None);
        assert_eq!(ui.z_index(mask_root), Some(ui.config().max_z_index));
        ui.handle_event(&RawInputEvent::repaint(kurbo::Point::new(500.0, 500.0)));

        let tree = ui.tree();
        let buttons = ui.mask().unwrap().buttons();
        let texts: Vec<Option<&str>> = buttons.iter().map(|&b| tree.text(b)).collect();
        assert_eq!(texts, vec![Some("[content: hi]"), Some("panel")]);
        assert_eq!(tree.absolute_bounds(buttons[0]), Rect::new(15.0, 15.0, 35.0, 25.0));
        assert!(!tree.is_enabled(buttons[0]), "mask buttons never take input");
    }
}
