// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`LayerManager`]: z-ordered layers, the modal stack, and per-frame
//! dispatch of host input to the element tree.
//!
//! ## Dispatch order
//!
//! For every [`RawInputEvent`] the manager
//! 1. treats a changed pointer position as a mouse move (hover transitions and
//!    tooltip lookup),
//! 2. dispatches the event itself; a repaint first polls the attached
//!    [`AssetRegistry`] for finished bundle downloads,
//! 3. applies pending style changes and, on repaint, draws every visible layer,
//!    then the drag visual, then the tooltip,
//! 4. forwards focus requests to the host.
//!
//! Pointer events go to the hit list: elements under the pointer, topmost
//! first, limited to the top modal layer while one exists.

use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, error, warn};
use understory_element_tree::{
    Capabilities, ElementId, HitList, KeyCode, LayerRoot, QueryFilter, Slider, Tree, WidgetKind,
};
use understory_style::{
    AssetRegistry, DefaultStyleKind, ResolvedState, Style, StyleLayers, StyleStateType,
};

use crate::animation::{Animation, AnimationRef, MultiAnimation};
use crate::backend::{Backend, DrawItem};
use crate::config::{Configuration, DragSettings, TooltipSettings};
use crate::console::{CommandRegistry, CommandTable, Console, ElementMask, ui_commands};
use crate::hover::{HoverEvent, HoverState};
use crate::input::{EventKind, RawInputEvent};

/// Errors reported by [`LayerManager`] queries.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LayerError {
    /// Text can only be measured while an event is being handled.
    #[error("text can only be measured while an event is being handled")]
    OutsideRender,
    /// The element does not exist.
    #[error("element {0:?} does not exist")]
    UnknownElement(ElementId),
}

/// Called once per repaint for a layer, with the layer's root.
pub type LayerHook = Box<dyn FnMut(&mut LayerManager, ElementId)>;

const HITS_ANY: QueryFilter = QueryFilter {
    visible_only: true,
    enabled_only: false,
};

const HITS_ENABLED: QueryFilter = QueryFilter {
    visible_only: true,
    enabled_only: true,
};

struct Layer {
    root: ElementId,
    z_index: i32,
    modal: bool,
    console: bool,
    on_repaint: Option<LayerHook>,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("root", &self.root)
            .field("z_index", &self.z_index)
            .field("modal", &self.modal)
            .field("console", &self.console)
            .field("on_repaint", &self.on_repaint.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct DragSession {
    element: ElementId,
    visual: Option<ElementId>,
    owns_visual: bool,
    cursor_hidden: bool,
}

#[derive(Debug)]
struct Tooltip {
    source: ElementId,
    text: String,
    anchor: Point,
    size: Size,
}

/// Owns the element tree and the layers drawn from it, and routes host input.
///
/// There is one manager per UI; everything that would otherwise be global
/// (focus, the drag session, the console) lives here.
pub struct LayerManager {
    tree: Tree,
    backend: Box<dyn Backend>,
    config: Configuration,
    drag_settings: DragSettings,
    tooltip_settings: TooltipSettings,
    layers: Vec<Layer>,
    modal_layers: Vec<ElementId>,
    focus: Option<ElementId>,
    active: Option<ElementId>,
    hover: HoverState<ElementId>,
    mouse_position: Option<Point>,
    down_list: HitList,
    drag_start: Point,
    drag_threshold: f64,
    drag: Option<DragSession>,
    accepting: Option<ElementId>,
    tooltip: Option<Tooltip>,
    clear_focus_requested: bool,
    reset_focus_requested: bool,
    inside_render: bool,
    animations: Option<Rc<RefCell<MultiAnimation>>>,
    console: Option<Console>,
    commands: CommandRegistry,
    mask: Option<ElementMask>,
    assets: Option<Rc<AssetRegistry>>,
}

impl fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerManager")
            .field("layers", &self.layers)
            .field("modal_layers", &self.modal_layers)
            .field("focus", &self.focus)
            .field("active", &self.active)
            .field("dragging", &self.drag.is_some())
            .field("tooltip", &self.tooltip.as_ref().map(|t| &t.text))
            .finish_non_exhaustive()
    }
}

impl LayerManager {
    /// A manager with default settings drawing through `backend`.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::with_config(backend, Configuration::default())
    }

    /// A manager with custom settings.
    pub fn with_config(backend: impl Backend + 'static, config: Configuration) -> Self {
        let drag_threshold = if config.drag_threshold >= 1.0 {
            config.drag_threshold
        } else {
            warn!(
                threshold = config.drag_threshold,
                "drag threshold below 1, using 5"
            );
            5.0
        };
        Self {
            tree: Tree::new(),
            backend: Box::new(backend),
            config,
            drag_settings: DragSettings::default(),
            tooltip_settings: TooltipSettings::default(),
            layers: Vec::new(),
            modal_layers: Vec::new(),
            focus: None,
            active: None,
            hover: HoverState::new(),
            mouse_position: None,
            down_list: HitList::new(),
            drag_start: Point::ZERO,
            drag_threshold,
            drag: None,
            accepting: None,
            tooltip: None,
            clear_focus_requested: false,
            reset_focus_requested: false,
            inside_render: false,
            animations: None,
            console: None,
            commands: CommandRegistry::default(),
            mask: None,
            assets: None,
        }
    }

    /// The element tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The shared asset registry, if one is attached.
    pub fn asset_registry(&self) -> Option<&Rc<AssetRegistry>> {
        self.assets.as_ref()
    }

    /// Attach the asset registry. Its downloads are polled on every repaint and
    /// the tree resolves copied styles through it.
    pub fn set_asset_registry(&mut self, assets: Option<Rc<AssetRegistry>>) {
        self.tree.set_asset_registry(assets.clone());
        self.assets = assets;
    }

    /// The element tree, mutably.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// The host backend.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Global settings.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Drag presentation settings.
    pub fn drag_settings_mut(&mut self) -> &mut DragSettings {
        &mut self.drag_settings
    }

    /// Tooltip settings.
    pub fn tooltip_settings_mut(&mut self) -> &mut TooltipSettings {
        &mut self.tooltip_settings
    }

    // --- Layers ---

    /// Create a layer root and add it as a layer.
    ///
    /// Returns `None` if the z-index is rejected.
    pub fn create_layer(&mut self, z_index: i32, modal: bool) -> Option<ElementId> {
        let root = self.tree.create(LayerRoot::default());
        if self.add_layer(root, z_index, modal) {
            Some(root)
        } else {
            self.tree.destroy(root);
            None
        }
    }

    /// Add an existing layer root.
    ///
    /// Modal layers ignore `z_index` and sit above every regular layer, most
    /// recently added on top. A regular layer's z-index may not exceed
    /// [`Configuration::max_z_index`].
    pub fn add_layer(&mut self, root: ElementId, z_index: i32, modal: bool) -> bool {
        if self.tree.kind(root) != Some(WidgetKind::Layer) {
            error!(element = %self.tree.display_name(root), "only layer roots can be added as layers");
            return false;
        }
        if self.tree.parent(root).is_some() {
            error!(element = %self.tree.display_name(root), "a layer root cannot have a parent");
            return false;
        }
        if self.contains_layer(root) {
            warn!(element = %self.tree.display_name(root), "layer was already added");
            return false;
        }
        let max = self.config.max_z_index;
        if modal {
            self.insert_layer(root, max.saturating_add(1), true, false);
        } else if z_index > max {
            warn!(z_index, max, "z-index of a regular layer exceeds the maximum");
            return false;
        } else {
            self.insert_layer(root, z_index, false, false);
        }
        true
    }

    fn insert_layer(&mut self, root: ElementId, z_index: i32, modal: bool, console: bool) {
        let at = self
            .layers
            .iter()
            .position(|l| l.z_index > z_index)
            .unwrap_or(self.layers.len());
        self.layers.insert(
            at,
            Layer {
                root,
                z_index,
                modal,
                console,
                on_repaint: None,
            },
        );
        if modal {
            let console_on_top = self
                .modal_layers
                .last()
                .is_some_and(|&top| self.is_console_layer(top));
            if console_on_top && !console {
                let below = self.modal_layers.len() - 1;
                self.modal_layers.insert(below, root);
            } else {
                self.modal_layers.push(root);
            }
        }
        self.tree.set_modal_root(self.modal_layer());
        debug!(element = %self.tree.display_name(root), z_index, modal, "layer added");
    }

    /// Remove a layer. The root element stays alive.
    pub fn remove_layer(&mut self, root: ElementId) -> bool {
        let Some(at) = self.layers.iter().position(|l| l.root == root) else {
            return false;
        };
        self.layers.remove(at);
        self.modal_layers.retain(|&m| m != root);
        self.tree.set_modal_root(self.modal_layer());
        debug!(element = %self.tree.display_name(root), "layer removed");
        true
    }

    /// Remove a layer and destroy its element subtree.
    pub fn destroy_layer(&mut self, root: ElementId) -> bool {
        let removed = self.remove_layer(root);
        if removed {
            self.tree.destroy(root);
        }
        removed
    }

    /// Whether `root` is a layer of this manager.
    pub fn contains_layer(&self, root: ElementId) -> bool {
        self.layers.iter().any(|l| l.root == root)
    }

    /// Layer roots in draw order (lowest first).
    pub fn layers(&self) -> impl DoubleEndedIterator<Item = ElementId> + ExactSizeIterator + '_ {
        self.layers.iter().map(|l| l.root)
    }

    /// The z-index of a layer.
    pub fn z_index(&self, root: ElementId) -> Option<i32> {
        self.layer(root).map(|l| l.z_index)
    }

    /// Whether a layer is modal.
    pub fn is_modal(&self, root: ElementId) -> bool {
        self.layer(root).is_some_and(|l| l.modal)
    }

    /// Change a layer's z-index and re-sort.
    ///
    /// Modal layers keep their z-index; regular layers cannot exceed the
    /// maximum. The console layer is exempt from both rules.
    pub fn set_z_index(&mut self, root: ElementId, z_index: i32) -> bool {
        let max = self.config.max_z_index;
        let Some(layer) = self.layers.iter_mut().find(|l| l.root == root) else {
            warn!("z-index set on an element that is not a layer");
            return false;
        };
        if layer.modal && !layer.console {
            error!("the z-index of a modal layer cannot be changed");
            return false;
        }
        if z_index > max && !layer.console {
            warn!(z_index, max, "z-index of a regular layer exceeds the maximum");
            return false;
        }
        layer.z_index = z_index;
        self.sort_layers();
        true
    }

    /// Restore draw order: by z-index, modal layers by their stacking order.
    pub fn sort_layers(&mut self) {
        let modal = &self.modal_layers;
        self.layers.sort_by_key(|l| {
            let rank = if l.modal {
                modal.iter().position(|&m| m == l.root).unwrap_or(0)
            } else {
                0
            };
            (l.z_index, rank)
        });
    }

    /// The topmost modal layer, if any.
    pub fn modal_layer(&self) -> Option<ElementId> {
        self.modal_layers.last().copied()
    }

    /// Run `hook` once per repaint for the layer `root`.
    pub fn set_on_repaint(
        &mut self,
        root: ElementId,
        hook: impl FnMut(&mut Self, ElementId) + 'static,
    ) -> bool {
        match self.layers.iter_mut().find(|l| l.root == root) {
            Some(layer) => {
                layer.on_repaint = Some(Box::new(hook));
                true
            }
            None => false,
        }
    }

    fn layer(&self, root: ElementId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.root == root)
    }

    fn is_console_layer(&self, root: ElementId) -> bool {
        self.layer(root).is_some_and(|l| l.console)
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.tree.is_alive(id) && self.contains_layer(self.tree.root_of(id))
    }

    // --- Interaction state ---

    /// The focused element.
    pub fn focus(&self) -> Option<ElementId> {
        self.focus
    }

    /// Focus `id` and hand native text input to it on the next event.
    pub fn set_focus(&mut self, id: ElementId) {
        self.focus = Some(id);
        self.reset_focus_requested = true;
    }

    /// Drop focus and the host's keyboard focus.
    pub fn clear_focus(&mut self) {
        self.focus = None;
        self.clear_focus_requested = true;
    }

    /// The control pressed and still under the pointer.
    pub fn active_control(&self) -> Option<ElementId> {
        self.active.filter(|&a| self.tree.hovered(a))
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The element being dragged.
    pub fn dragged(&self) -> Option<ElementId> {
        self.drag.as_ref().map(|d| d.element)
    }

    /// The drag visual drawn under the pointer.
    pub fn drag_visual(&self) -> Option<ElementId> {
        self.drag.as_ref().and_then(|d| d.visual)
    }

    /// The last element that accepted the dragged element.
    pub fn accepting(&self) -> Option<ElementId> {
        self.accepting
    }

    /// Per-axis pointer travel before a press becomes a drag.
    pub fn drag_threshold(&self) -> f64 {
        self.drag_threshold
    }

    /// Set the drag threshold; values below 1 are rejected.
    pub fn set_drag_threshold(&mut self, threshold: f64) -> bool {
        if threshold < 1.0 {
            warn!(threshold, "drag threshold must be at least 1");
            return false;
        }
        self.drag_threshold = threshold;
        true
    }

    /// Whether `id` shows as hovered. During a drag only the accepting
    /// element does.
    pub fn is_hovered(&self, id: ElementId) -> bool {
        self.tree.hovered(id) && (self.drag.is_none() || self.accepting == Some(id))
    }

    /// Which style state `id` is drawn in.
    pub fn interaction_state(&self, id: ElementId) -> StyleStateType {
        if self.active_control() == Some(id) {
            StyleStateType::Active
        } else if self.is_hovered(id) {
            StyleStateType::Hover
        } else if self.focus == Some(id) {
            StyleStateType::Focused
        } else {
            StyleStateType::Normal
        }
    }

    /// Elements under `point`, topmost first.
    ///
    /// While a modal layer exists only its elements are considered.
    pub fn hit_list(&self, point: Point, filter: QueryFilter) -> HitList {
        let roots: SmallVec<[ElementId; 8]> = match self.modal_layer() {
            Some(modal) => SmallVec::from_slice(&[modal]),
            None => self.layers.iter().map(|l| l.root).collect(),
        };
        let mut hits = HitList::new();
        for &root in roots.iter().rev() {
            if filter.visible_only && !self.tree.is_visible(root) {
                continue;
            }
            if filter.enabled_only && !self.tree.is_enabled(root) {
                continue;
            }
            hits.extend(self.tree.elements_at(point, root, filter));
        }
        hits
    }

    // --- Tooltip ---

    /// Text of the tooltip currently shown.
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_ref().map(|t| t.text.as_str())
    }

    /// The element whose tooltip is shown.
    pub fn tooltip_source(&self) -> Option<ElementId> {
        self.tooltip.as_ref().map(|t| t.source)
    }

    /// Screen bounds of the tooltip as of the last repaint.
    pub fn tooltip_bounds(&self) -> Option<Rect> {
        let tip = self.tooltip.as_ref()?;
        let offset = self.tooltip_settings.mouse_offset;
        let at = if self.tooltip_settings.follow_mouse {
            self.mouse_position.unwrap_or(tip.anchor)
        } else {
            tip.anchor
        };
        let screen = self.backend.screen_size();
        let (w, h) = (tip.size.width, tip.size.height);
        let top = if at.y + h + offset.y < screen.height {
            at.y + offset.y
        } else {
            at.y - h - offset.y
        }
        .max(0.0);
        let left = (at.x + offset.x).min(screen.width - w).max(0.0);
        Some(Rect::from_origin_size((left, top), tip.size))
    }

    fn tooltip_style(&self) -> ResolvedState {
        let style = self.tree.default_styles().get(DefaultStyleKind::Tooltip);
        let default = style.borrow();
        let layers = StyleLayers {
            element: &Style::new(),
            class: None,
            default: &default,
        };
        layers.resolve_state(StyleStateType::Normal)
    }

    // --- Measurement ---

    /// Size of an element's text in its current style.
    ///
    /// Only available while an event is being handled.
    pub fn calc_size(&self, id: ElementId) -> Result<Size, LayerError> {
        self.measure(id, None)
    }

    /// Height of an element's text wrapped at `width`.
    pub fn calc_height(&self, id: ElementId, width: f64) -> Result<f64, LayerError> {
        self.measure(id, Some(width)).map(|s| s.height)
    }

    /// Size of the tooltip box for `text`, wrapped at the maximum tooltip width.
    pub fn calc_tooltip_size(&self, text: &str) -> Result<Size, LayerError> {
        if !self.inside_render {
            return Err(LayerError::OutsideRender);
        }
        let style = self.tooltip_style();
        let max_width = self.tooltip_settings.max_width;
        let size = self.backend.measure_text(text, &style, None);
        if size.width <= max_width {
            return Ok(size);
        }
        let height = self.backend.measure_text(text, &style, Some(max_width)).height;
        Ok(Size::new(max_width, height))
    }

    fn measure(&self, id: ElementId, max_width: Option<f64>) -> Result<Size, LayerError> {
        if !self.inside_render {
            return Err(LayerError::OutsideRender);
        }
        let text = self.tree.text(id).ok_or(LayerError::UnknownElement(id))?;
        let style = self
            .tree
            .resolved_state(id, self.interaction_state(id))
            .ok_or(LayerError::UnknownElement(id))?;
        Ok(self.backend.measure_text(text, style, max_width))
    }

    // --- Animation ---

    /// The bundle stepped on every repaint, created on first use.
    pub fn animations(&mut self) -> Rc<RefCell<MultiAnimation>> {
        self.animations
            .get_or_insert_with(|| Rc::new(RefCell::new(MultiAnimation::new(0.0))))
            .clone()
    }

    /// Add an animation to the per-repaint bundle.
    pub fn animate(&mut self, animation: AnimationRef) -> bool {
        self.animations().borrow_mut().add(animation)
    }

    // --- Console and commands ---

    /// Create the console layer and register the built-in UI commands.
    ///
    /// The console starts hidden; the console key toggles it.
    pub fn install_console(&mut self) -> ElementId {
        if let Some(console) = &self.console {
            return console.layer();
        }
        let root = self.tree.create(LayerRoot::default());
        self.tree.set_name(root, "Console");
        self.tree.set_visible(root, false);
        self.console = Some(Console::new(root, self.config.log_message_limit));
        self.commands.register(ui_commands());
        root
    }

    /// The console, if installed.
    pub fn console(&self) -> Option<&Console> {
        self.console.as_ref()
    }

    /// Print to the console, if installed.
    pub fn print(&mut self, message: impl Into<String>) {
        if let Some(console) = &mut self.console {
            console.print(message);
        }
    }

    /// Show or hide the console layer. Returns whether it is now shown.
    pub fn toggle_console(&mut self) -> bool {
        let Some(root) = self.console.as_ref().map(Console::layer) else {
            return false;
        };
        let shown = !self.contains_layer(root);
        self.tree.set_visible(root, shown);
        if shown {
            let z_index = self.config.max_z_index.saturating_add(2);
            self.insert_layer(root, z_index, true, true);
        } else {
            self.remove_layer(root);
        }
        shown
    }

    /// Register a command table.
    pub fn register_commands(&mut self, table: CommandTable) {
        self.commands.register(table);
    }

    /// The registered commands.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Run a console command line. Returns whether a command was found.
    pub fn execute_command(&mut self, input: &str) -> bool {
        let mut registry = core::mem::take(&mut self.commands);
        let found = registry.execute_command(input, self);
        let registered_meanwhile = core::mem::replace(&mut self.commands, registry);
        self.commands.merge(registered_meanwhile);
        found
    }

    /// Show the element mask, mirroring elements of every layer (or of the
    /// layers named `layer_name`) every `interval_ms` milliseconds.
    pub fn show_mask(&mut self, interval_ms: u32, layer_name: Option<String>) -> ElementId {
        self.remove_mask();
        let mask = ElementMask::new(&mut self.tree, interval_ms, layer_name);
        let root = mask.root();
        self.mask = Some(mask);
        self.insert_layer(root, self.config.max_z_index, false, false);
        root
    }

    /// Remove the element mask. Returns whether one was shown.
    pub fn remove_mask(&mut self) -> bool {
        let Some(mask) = self.mask.take() else {
            return false;
        };
        self.destroy_layer(mask.root());
        true
    }

    /// The element mask, if shown.
    pub fn mask(&self) -> Option<&ElementMask> {
        self.mask.as_ref()
    }

    // --- Dispatch ---

    /// Handle one host event.
    pub fn handle_event(&mut self, event: &RawInputEvent) {
        self.inside_render = true;
        self.forget_stale();
        let position = event.mouse_position;
        if self.mouse_position != Some(position) {
            self.mouse_moved(position);
        }
        match event.kind {
            EventKind::Repaint => self.repaint(),
            EventKind::MouseDown => self.mouse_down(position),
            EventKind::MouseUp => self.mouse_up(position),
            EventKind::MouseDrag => self.mouse_drag(position),
            EventKind::ScrollWheel => self.scroll(position, event.scroll_delta),
            EventKind::KeyDown => {
                if let Some(key) = event.key {
                    self.key(key, true);
                }
            }
            EventKind::KeyUp => {
                if let Some(key) = event.key {
                    if key == self.config.console_key && self.console.is_some() {
                        self.toggle_console();
                    }
                    self.key(key, false);
                }
            }
            EventKind::MouseMove => {}
        }
        self.tree.sync_styles();
        if event.kind == EventKind::Repaint {
            self.draw();
        }
        self.apply_focus_requests();
        self.inside_render = false;
    }

    fn forget_stale(&mut self) {
        if self.focus.is_some_and(|f| !self.tree.is_alive(f)) {
            self.focus = None;
        }
        if self.active.is_some_and(|a| !self.tree.is_alive(a)) {
            self.active = None;
        }
        let stale: SmallVec<[ElementId; 4]> = self
            .hover
            .current()
            .iter()
            .copied()
            .filter(|&h| !self.tree.is_alive(h))
            .collect();
        for id in stale {
            self.hover.forget(id);
        }
        if self
            .drag
            .as_ref()
            .is_some_and(|d| !self.is_attached(d.element))
        {
            debug!("dragged element was detached, ending the drag");
            self.end_drag();
        }
    }

    fn mouse_moved(&mut self, position: Point) {
        self.tooltip = None;
        let previous = self.mouse_position.unwrap_or(position);
        self.mouse_position = Some(position);
        let screen = Rect::from_origin_size(Point::ZERO, self.backend.screen_size());
        if !screen.contains(position) {
            return;
        }
        let hits = self.hit_list(position, HITS_ANY);
        let mouse_hits: HitList = hits
            .iter()
            .copied()
            .filter(|&id| self.tree.capabilities(id).contains(Capabilities::MOUSE))
            .collect();
        for event in self.hover.update(&mouse_hits) {
            match event {
                HoverEvent::Enter(id) => {
                    self.tree.mouse_enter(id, position);
                }
                HoverEvent::Move(id) => {
                    self.tree.mouse_move(id, position);
                }
                HoverEvent::Leave(id) => {
                    self.tree.mouse_exit(id, previous);
                }
            }
        }
        self.tooltip = hits.iter().find_map(|&id| {
            self.tree.tooltip(id).map(|text| Tooltip {
                source: id,
                text: text.to_owned(),
                anchor: position,
                size: Size::ZERO,
            })
        });
    }

    fn mouse_down(&mut self, position: Point) {
        let hits = self.hit_list(position, HITS_ENABLED);
        self.drag_start = position;
        let target = hits.iter().copied().find(|&id| {
            self.tree
                .capabilities(id)
                .intersects(Capabilities::CLICK | Capabilities::CHANGE)
        });
        match target {
            Some(id) => {
                self.set_focus(id);
                self.active = Some(id);
            }
            None => self.clear_focus(),
        }
        for &id in &hits {
            if !self.tree.capabilities(id).contains(Capabilities::CLICK) {
                continue;
            }
            let cx = self.tree.pointer_context(id, position);
            let used = self
                .tree
                .widget_mut(id)
                .and_then(|w| w.as_clickable())
                .is_some_and(|c| c.on_mouse_down(&cx));
            if used {
                break;
            }
        }
        self.down_list = hits;
    }

    fn mouse_up(&mut self, position: Point) {
        let hits = self.hit_list(position, HITS_ENABLED);
        if let Some(dragged) = self.dragged() {
            for &id in &hits {
                if !self.tree.capabilities(id).contains(Capabilities::DRAG) {
                    continue;
                }
                let accepted = self
                    .tree
                    .widget_mut(id)
                    .and_then(|w| w.as_draggable())
                    .is_some_and(|d| d.on_drag_drop(id, dragged));
                if accepted {
                    debug!(target_element = %self.tree.display_name(id), "drop accepted");
                    break;
                }
            }
            self.end_drag();
        } else {
            let mut clicked = false;
            let mut released = false;
            for &id in &hits {
                if clicked && released {
                    break;
                }
                if !self.tree.capabilities(id).contains(Capabilities::CLICK) {
                    continue;
                }
                let cx = self.tree.pointer_context(id, position);
                let Some(c) = self.tree.widget_mut(id).and_then(|w| w.as_clickable()) else {
                    continue;
                };
                if !clicked && self.down_list.contains(&id) {
                    clicked = c.on_click(&cx);
                }
                if !released {
                    released = c.on_mouse_up(&cx);
                }
            }
            if let Some(active) = self.active {
                if let Some(slider) = self.tree.widget_as_mut::<Slider>(active) {
                    slider.release(active);
                }
            }
        }
        self.reset_focus_requested = true;
        self.active = None;
    }

    fn mouse_drag(&mut self, position: Point) {
        let Some(dragged) = self.dragged() else {
            let travel = position - self.drag_start;
            if travel.x.abs() > self.drag_threshold || travel.y.abs() > self.drag_threshold {
                self.try_start_drag();
            }
            return;
        };
        let hits = self.hit_list(position, HITS_ENABLED);
        self.accepting = None;
        for &id in &hits {
            if !self.tree.capabilities(id).contains(Capabilities::DRAG) {
                continue;
            }
            let accepts = self
                .tree
                .widget_mut(id)
                .and_then(|w| w.as_draggable())
                .is_some_and(|d| d.on_drag_over(id, dragged));
            if accepts {
                self.accepting = Some(id);
            }
        }
    }

    fn try_start_drag(&mut self) {
        let candidates = self.down_list.clone();
        for id in candidates {
            if self.tree.kind(id) == Some(WidgetKind::Slider) {
                break;
            }
            if !self.tree.capabilities(id).contains(Capabilities::DRAG) {
                continue;
            }
            let Some(draggable) = self.tree.widget_mut(id).and_then(|w| w.as_draggable()) else {
                continue;
            };
            if !draggable.on_drag_start(id) {
                continue;
            }
            let supplied = draggable.drag_visual();
            let (visual, owns_visual) = match supplied {
                Some(visual) => (Some(visual), false),
                None if self.drag_settings.show_own_drag_marker => (None, false),
                None => {
                    let clone = self.tree.clone_element(id);
                    (clone, clone.is_some())
                }
            };
            let cursor_hidden = self.drag_settings.hide_cursor_while_dragging;
            if cursor_hidden {
                self.backend.set_cursor_visible(false);
            }
            self.accepting = None;
            self.drag = Some(DragSession {
                element: id,
                visual,
                owns_visual,
                cursor_hidden,
            });
            self.active = None;
            self.clear_focus();
            debug!(element = %self.tree.display_name(id), "drag started");
            return;
        }
    }

    fn end_drag(&mut self) {
        let Some(session) = self.drag.take() else {
            return;
        };
        if session.cursor_hidden {
            self.backend.set_cursor_visible(true);
        }
        if session.owns_visual {
            if let Some(visual) = session.visual {
                self.tree.destroy(visual);
            }
        }
    }

    fn scroll(&mut self, position: Point, delta: Vec2) {
        let hits = self.hit_list(position, HITS_ENABLED);
        let factor = self.config.scroll_wheel_factor;
        for &id in &hits {
            if !self.tree.capabilities(id).contains(Capabilities::SCROLL) {
                continue;
            }
            if let Some(s) = self.tree.widget_mut(id).and_then(|w| w.as_scrollable()) {
                let target = (s.scroll_position() + delta.y * factor)
                    .max(0.0)
                    .min(s.scroll_maximum());
                s.set_scroll_position(target);
                break;
            }
        }
    }

    fn key(&mut self, key: KeyCode, down: bool) {
        let Some(focus) = self.focus else {
            return;
        };
        let mut chain: SmallVec<[ElementId; 8]> = SmallVec::new();
        if self.tree.capabilities(focus).contains(Capabilities::KEY) {
            chain.push(focus);
        }
        let mut parent = self.tree.parent(focus);
        while let Some(id) = parent {
            if self.tree.capabilities(id).contains(Capabilities::KEY) {
                chain.push(id);
                break;
            }
            parent = self.tree.parent(id);
        }
        // Layers under an open modal are disabled and miss the broadcast.
        for layer in &self.layers {
            if !chain.contains(&layer.root) && self.tree.is_enabled(layer.root) {
                chain.push(layer.root);
            }
        }
        for id in chain {
            let consumed = self
                .tree
                .widget_mut(id)
                .and_then(|w| w.as_key_aware())
                .is_some_and(|k| {
                    if down {
                        k.on_key_down(id, key)
                    } else {
                        k.on_key_up(id, key)
                    }
                });
            if consumed {
                return;
            }
        }
    }

    fn repaint(&mut self) {
        if let Some(assets) = &self.assets {
            assets.poll();
        }

        let tooltip_size = match &self.tooltip {
            Some(tip) => self.calc_tooltip_size(&tip.text).ok(),
            None => None,
        };
        if let (Some(tip), Some(size)) = (&mut self.tooltip, tooltip_size) {
            tip.size = size;
        }

        let roots: SmallVec<[ElementId; 8]> = self.layers.iter().map(|l| l.root).collect();
        for root in roots {
            let hook = self
                .layers
                .iter_mut()
                .find(|l| l.root == root)
                .and_then(|l| l.on_repaint.take());
            if let Some(mut hook) = hook {
                hook(self, root);
                if let Some(layer) = self.layers.iter_mut().find(|l| l.root == root) {
                    layer.on_repaint.get_or_insert(hook);
                }
            }
        }

        let now = self.backend.now();
        if let Some(animations) = self.animations.clone() {
            animations.borrow_mut().step(&mut self.tree, now);
        }

        if let Some(mask) = &mut self.mask {
            let mask_root = mask.root();
            let sources: SmallVec<[ElementId; 8]> = self
                .layers
                .iter()
                .map(|l| l.root)
                .filter(|&r| r != mask_root)
                .collect();
            mask.refresh(&mut self.tree, &sources, now);
        }
    }

    fn draw(&mut self) {
        let roots: SmallVec<[ElementId; 8]> = self.layers.iter().map(|l| l.root).collect();
        for root in roots {
            if !self.tree.is_visible(root) {
                continue;
            }
            for id in self.tree.draw_order(root) {
                self.draw_element(id, Vec2::ZERO);
            }
        }

        if let (Some(visual), Some(pointer)) = (self.drag_visual(), self.mouse_position) {
            let origin = self.tree.absolute_position(visual);
            let offset = (pointer + self.drag_settings.mouse_offset) - origin;
            self.draw_element(visual, offset);
            for id in self.tree.draw_order(visual) {
                self.draw_element(id, offset);
            }
        }

        if let Some(bounds) = self.tooltip_bounds() {
            let style = self.tooltip_style();
            if let Some(tip) = &self.tooltip {
                self.backend.draw_tooltip(&tip.text, bounds, &style);
            }
        }
    }

    fn draw_element(&mut self, id: ElementId, offset: Vec2) {
        let state = self.interaction_state(id);
        let Some(style) = self.tree.resolved_state(id, state) else {
            return;
        };
        let item = DrawItem {
            element: id,
            kind: self.tree.kind(id).unwrap_or(WidgetKind::Custom),
            bounds: self.tree.absolute_bounds(id) + offset,
            text: self.tree.text(id).unwrap_or_default(),
            style,
        };
        self.backend.draw_element(&item);
    }

    fn apply_focus_requests(&mut self) {
        if core::mem::take(&mut self.clear_focus_requested) {
            self.backend.clear_keyboard_focus();
        }
        if core::mem::take(&mut self.reset_focus_requested) {
            let text_input = self
                .focus
                .filter(|&f| self.tree.kind(f).is_some_and(WidgetKind::is_text_input));
            match text_input.and_then(|f| self.tree.guid(f)) {
                Some(guid) => self.backend.focus_text_input(guid),
                None => self.backend.clear_keyboard_focus(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use understory_element_tree::{
        Button, Draggable, Label, Orientation, Panel, ScrollBox, TextInput, Widget,
    };
    use understory_style::{AssetBundle, AssetId, BundleDownload, Fill, ResourceLoader};

    #[derive(Debug, Default)]
    struct Record {
        drawn: Vec<ElementId>,
        tooltips: Vec<(String, Rect)>,
        focused: Vec<String>,
        keyboard_cleared: usize,
        cursor: Vec<bool>,
    }

    struct RecordingBackend {
        record: Rc<RefCell<Record>>,
        clock: Rc<Cell<f64>>,
    }

    impl Backend for RecordingBackend {
        fn draw_element(&mut self, item: &DrawItem<'_>) {
            self.record.borrow_mut().drawn.push(item.element);
        }

        fn draw_tooltip(&mut self, text: &str, bounds: Rect, _style: &ResolvedState) {
            self.record
                .borrow_mut()
                .tooltips
                .push((text.to_owned(), bounds));
        }

        fn measure_text(&self, text: &str, _style: &ResolvedState, max_width: Option<f64>) -> Size {
            #[allow(clippy::cast_precision_loss, reason = "test strings are short")]
            let width = text.chars().count() as f64 * 10.0;
            match max_width {
                Some(max) if width > max => Size::new(max, 20.0 * (width / max).ceil()),
                _ => Size::new(width, 20.0),
            }
        }

        fn screen_size(&self) -> Size {
            Size::new(800.0, 600.0)
        }

        fn now(&self) -> f64 {
            self.clock.get()
        }

        fn focus_text_input(&mut self, guid: &str) {
            self.record.borrow_mut().focused.push(guid.to_owned());
        }

        fn clear_keyboard_focus(&mut self) {
            self.record.borrow_mut().keyboard_cleared += 1;
        }

        fn set_cursor_visible(&mut self, visible: bool) {
            self.record.borrow_mut().cursor.push(visible);
        }
    }

    struct Harness {
        ui: LayerManager,
        record: Rc<RefCell<Record>>,
        clock: Rc<Cell<f64>>,
    }

    impl Harness {
        fn new() -> Self {
            let record = Rc::new(RefCell::new(Record::default()));
            let clock = Rc::new(Cell::new(0.0));
            let ui = LayerManager::new(RecordingBackend {
                record: record.clone(),
                clock: clock.clone(),
            });
            Self { ui, record, clock }
        }

        fn send(&mut self, kind: EventKind, x: f64, y: f64) {
            self.ui
                .handle_event(&RawInputEvent::pointer(kind, Point::new(x, y)));
        }

        fn click(&mut self, x: f64, y: f64) {
            self.send(EventKind::MouseDown, x, y);
            self.send(EventKind::MouseUp, x, y);
        }

        fn key_up(&mut self, key: KeyCode) {
            let at = self.ui.mouse_position.unwrap_or_default();
            self.ui
                .handle_event(&RawInputEvent::key(EventKind::KeyUp, key, at));
        }

        fn add(&mut self, parent: ElementId, widget: impl Widget, bounds: Rect) -> ElementId {
            let tree = self.ui.tree_mut();
            let id = tree.create(widget);
            tree.set_bounds(id, bounds);
            assert!(tree.add_element(parent, id), "child is accepted");
            id
        }
    }

    fn counting_button(clicks: &Rc<Cell<u32>>) -> Button {
        let mut button = Button::default();
        let clicks = clicks.clone();
        button.click.set_on_click(move |_| clicks.set(clicks.get() + 1));
        button
    }

    #[test]
    fn topmost_element_receives_the_click() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let (a_clicks, b_clicks) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
        h.add(layer, counting_button(&a_clicks), Rect::new(0.0, 0.0, 100.0, 100.0));
        h.add(layer, counting_button(&b_clicks), Rect::new(50.0, 50.0, 150.0, 150.0));

        h.click(75.0, 75.0);
        assert_eq!(b_clicks.get(), 1, "later sibling is on top");
        assert_eq!(a_clicks.get(), 0, "click is consumed by the topmost button");

        h.click(25.0, 25.0);
        assert_eq!(a_clicks.get(), 1);
    }

    #[test]
    fn click_needs_press_and_release_on_the_same_element() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let clicks = Rc::new(Cell::new(0));
        h.add(layer, counting_button(&clicks), Rect::new(0.0, 0.0, 50.0, 50.0));

        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.send(EventKind::MouseUp, 200.0, 200.0);
        h.send(EventKind::MouseDown, 200.0, 200.0);
        h.send(EventKind::MouseUp, 10.0, 10.0);
        assert_eq!(clicks.get(), 0, "press and release were on different elements");
    }

    #[test]
    fn modal_layer_is_exclusive() {
        let mut h = Harness::new();
        let base = h.ui.create_layer(10, false).unwrap();
        let below = h.add(base, Button::default(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let modal = h.ui.create_layer(0, true).unwrap();
        let dialog = h.add(modal, Panel::default(), Rect::new(50.0, 50.0, 150.0, 150.0));

        assert_eq!(h.ui.modal_layer(), Some(modal));
        assert_eq!(
            h.ui.z_index(modal),
            Some(h.ui.config().max_z_index + 1),
            "modal layers sit above the maximum"
        );
        assert_eq!(h.ui.hit_list(Point::new(75.0, 75.0), HITS_ANY).as_slice(), &[dialog]);
        assert!(h.ui.hit_list(Point::new(10.0, 10.0), HITS_ANY).is_empty(), "base layer is masked");
        assert!(!h.ui.tree().is_enabled(below), "elements under a modal layer are disabled");

        assert!(h.ui.remove_layer(modal));
        assert_eq!(h.ui.hit_list(Point::new(10.0, 10.0), HITS_ENABLED).as_slice(), &[below]);
    }

    #[test]
    fn z_index_rules_and_ordering() {
        let mut h = Harness::new();
        let high = h.ui.create_layer(5, false).unwrap();
        let low = h.ui.create_layer(1, false).unwrap();
        let modal = h.ui.create_layer(0, true).unwrap();
        assert_eq!(h.ui.layers().collect::<Vec<_>>(), vec![low, high, modal]);

        let max = h.ui.config().max_z_index;
        assert!(h.ui.create_layer(max + 1, false).is_none(), "above the maximum");
        assert!(!h.ui.set_z_index(high, max + 1));
        assert!(!h.ui.set_z_index(modal, 3), "modal z-index is fixed");
        assert!(h.ui.set_z_index(high, 0));
        assert_eq!(h.ui.layers().collect::<Vec<_>>(), vec![high, low, modal]);
    }

    #[test]
    fn drag_threshold_is_per_axis() {
        let mut h = Harness::new();
        assert!(!h.ui.set_drag_threshold(0.0), "below one is rejected");
        assert_eq!(h.ui.drag_threshold(), 5.0);

        let layer = h.ui.create_layer(0, false).unwrap();
        let mut panel = Panel::default();
        panel.drag.set_draggable(true);
        let source = h.add(layer, panel, Rect::new(0.0, 0.0, 100.0, 100.0));

        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.send(EventKind::MouseDrag, 14.0, 14.0);
        assert!(!h.ui.is_dragging(), "4px on each axis stays below the threshold");
        h.send(EventKind::MouseDrag, 16.0, 10.0);
        assert_eq!(h.ui.dragged(), Some(source));
        let visual = h.ui.drag_visual().unwrap();
        assert_ne!(visual, source, "a clone is dragged around");
        assert_eq!(h.ui.focus(), None, "starting a drag clears focus");

        h.send(EventKind::MouseUp, 16.0, 10.0);
        assert!(!h.ui.is_dragging());
        assert!(!h.ui.tree().is_alive(visual), "the clone is dropped with the drag");
    }

    #[test]
    fn drop_goes_to_the_accepting_target() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let mut source = Panel::default();
        source.drag.set_draggable(true);
        let source = h.add(layer, source, Rect::new(0.0, 0.0, 50.0, 50.0));
        let drops = Rc::new(RefCell::new(Vec::new()));
        let mut target = Panel::default();
        target.drag.set_on_drag_over(|_, _| true);
        let seen = drops.clone();
        target.drag.set_on_drag_drop(move |t, d| {
            seen.borrow_mut().push((t, d));
            true
        });
        let target = h.add(layer, target, Rect::new(200.0, 0.0, 300.0, 100.0));

        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.send(EventKind::MouseDrag, 30.0, 10.0);
        h.send(EventKind::MouseDrag, 250.0, 50.0);
        assert_eq!(h.ui.accepting(), Some(target));
        assert!(h.ui.is_hovered(target), "the accepting target shows as hovered");
        h.send(EventKind::MouseUp, 250.0, 50.0);
        assert_eq!(drops.borrow().as_slice(), &[(target, source)]);
    }

    #[test]
    fn sliders_never_start_a_drag() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let mut panel = Panel::default();
        panel.drag.set_draggable(true);
        let panel = h.add(layer, panel, Rect::new(0.0, 0.0, 200.0, 200.0));
        h.add(
            panel,
            Slider::new(Orientation::Horizontal, 0.0, 10.0, 0.0),
            Rect::new(0.0, 0.0, 100.0, 20.0),
        );

        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.send(EventKind::MouseDrag, 60.0, 10.0);
        assert!(!h.ui.is_dragging(), "a slider under the pointer blocks dragging");
    }

    #[test]
    fn hidden_cursor_is_restored_after_the_drag() {
        let mut h = Harness::new();
        h.ui.drag_settings_mut().hide_cursor_while_dragging = true;
        h.ui.drag_settings_mut().show_own_drag_marker = true;
        let layer = h.ui.create_layer(0, false).unwrap();
        let mut panel = Panel::default();
        panel.drag.set_draggable(true);
        h.add(layer, panel, Rect::new(0.0, 0.0, 100.0, 100.0));

        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.send(EventKind::MouseDrag, 10.0, 40.0);
        assert!(h.ui.is_dragging());
        assert_eq!(h.ui.drag_visual(), None, "the host draws its own marker");
        h.send(EventKind::MouseUp, 10.0, 40.0);
        assert_eq!(h.record.borrow().cursor, vec![false, true]);
    }

    #[test]
    fn destroying_the_dragged_element_ends_the_drag() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let mut panel = Panel::default();
        panel.drag.set_draggable(true);
        let source = h.add(layer, panel, Rect::new(0.0, 0.0, 100.0, 100.0));
        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.send(EventKind::MouseDrag, 10.0, 40.0);
        assert!(h.ui.is_dragging());

        h.ui.tree_mut().destroy(source);
        h.send(EventKind::Repaint, 10.0, 40.0);
        assert!(!h.ui.is_dragging());
    }

    #[test]
    fn wheel_scrolls_and_clamps() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let scroll = h.add(layer, ScrollBox::default(), Rect::new(0.0, 0.0, 100.0, 100.0));
        h.add(scroll, Label, Rect::new(0.0, 0.0, 50.0, 200.0));
        let scrollable = |ui: &mut LayerManager| {
            ui.tree_mut()
                .widget_mut(scroll)
                .and_then(|w| w.as_scrollable())
                .map(|s| (s.scroll_position(), s.scroll_maximum()))
        };
        assert_eq!(scrollable(&mut h.ui), Some((0.0, 100.0)));
        h.ui.tree_mut()
            .widget_as_mut::<ScrollBox>(scroll)
            .unwrap()
            .set_vertical_position(95.0);

        h.ui
            .handle_event(&RawInputEvent::scroll(Point::new(75.0, 50.0), Vec2::new(0.0, 10.0)));
        assert_eq!(scrollable(&mut h.ui), Some((100.0, 100.0)), "clamped to the maximum");
        h.ui
            .handle_event(&RawInputEvent::scroll(Point::new(75.0, 50.0), Vec2::new(0.0, -3.0)));
        assert_eq!(scrollable(&mut h.ui), Some((85.0, 100.0)));
    }

    #[test]
    fn keys_bubble_from_focus_to_ancestor_to_layers() {
        let mut h = Harness::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let layer = h.ui.create_layer(0, false).unwrap();
        let other = h.ui.create_layer(1, false).unwrap();
        for (root, name) in [(layer, "layer"), (other, "other")] {
            let seen = log.clone();
            h.ui.tree_mut()
                .widget_as_mut::<LayerRoot>(root)
                .unwrap()
                .keys
                .set_on_key_up(move |_, _| {
                    seen.borrow_mut().push(name);
                    name == "other"
                });
        }
        let panel = h.add(layer, Panel::default(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut button = Button::default();
        let seen = log.clone();
        button.keys.set_on_key_up(move |_, _| {
            seen.borrow_mut().push("button");
            false
        });
        h.add(panel, button, Rect::new(0.0, 0.0, 50.0, 50.0));

        h.key_up(KeyCode::Enter);
        assert!(log.borrow().is_empty(), "nothing is focused yet");

        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.key_up(KeyCode::Enter);
        assert_eq!(log.borrow().as_slice(), &["button", "layer", "other"]);
    }

    #[test]
    fn layers_under_a_modal_miss_the_key_broadcast() {
        let mut h = Harness::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let base = h.ui.create_layer(0, false).unwrap();
        let seen = log.clone();
        h.ui.tree_mut()
            .widget_as_mut::<LayerRoot>(base)
            .unwrap()
            .keys
            .set_on_key_up(move |_, _| {
                seen.borrow_mut().push("base");
                true
            });
        let modal = h.ui.create_layer(0, true).unwrap();
        let mut button = Button::default();
        let seen = log.clone();
        button.keys.set_on_key_up(move |_, _| {
            seen.borrow_mut().push("button");
            false
        });
        h.add(modal, button, Rect::new(0.0, 0.0, 50.0, 50.0));

        h.send(EventKind::MouseDown, 10.0, 10.0);
        h.key_up(KeyCode::Enter);
        assert_eq!(log.borrow().as_slice(), &["button"], "base layer is disabled");
    }

    #[test]
    fn hover_enter_and_exit() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let button = h.add(layer, Button::default(), Rect::new(0.0, 0.0, 50.0, 50.0));
        let log = Rc::new(RefCell::new(Vec::new()));
        let seen = log.clone();
        h.ui.tree_mut()
            .set_on_mouse_enter(button, move |_, _| seen.borrow_mut().push("enter"));
        let seen = log.clone();
        h.ui.tree_mut()
            .set_on_mouse_exit(button, move |_, _| seen.borrow_mut().push("exit"));

        h.send(EventKind::MouseMove, 10.0, 10.0);
        assert!(h.ui.is_hovered(button));
        assert_eq!(h.ui.interaction_state(button), StyleStateType::Hover);
        h.send(EventKind::MouseDown, 10.0, 10.0);
        assert_eq!(h.ui.active_control(), Some(button));
        assert_eq!(h.ui.interaction_state(button), StyleStateType::Active);
        h.send(EventKind::MouseUp, 10.0, 10.0);
        assert_eq!(h.ui.interaction_state(button), StyleStateType::Hover);
        h.send(EventKind::MouseMove, 100.0, 100.0);
        assert_eq!(h.ui.interaction_state(button), StyleStateType::Focused);
        assert_eq!(log.borrow().as_slice(), &["enter", "exit"]);
    }

    #[test]
    fn focus_bridge_tracks_text_inputs() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let edit = h.add(layer, TextInput::edit_box(), Rect::new(0.0, 0.0, 100.0, 20.0));
        let guid = h.ui.tree().guid(edit).unwrap().to_owned();

        h.send(EventKind::MouseDown, 10.0, 10.0);
        assert_eq!(h.ui.focus(), Some(edit));
        assert_eq!(h.record.borrow().focused, vec![guid]);

        let cleared = h.record.borrow().keyboard_cleared;
        h.send(EventKind::MouseDown, 300.0, 300.0);
        assert_eq!(h.ui.focus(), None, "pressing on nothing clears focus");
        assert!(h.record.borrow().keyboard_cleared > cleared);
    }

    #[test]
    fn console_key_toggles_the_console_layer() {
        let mut h = Harness::new();
        let console = h.ui.install_console();
        assert!(!h.ui.contains_layer(console), "starts hidden");

        h.key_up(KeyCode::F(12));
        assert_eq!(h.ui.modal_layer(), Some(console));
        assert!(h.ui.tree().visible(console));

        let dialog = h.ui.create_layer(0, true).unwrap();
        assert_eq!(h.ui.modal_layer(), Some(console), "the console stays on top");
        assert_eq!(h.ui.layers().last(), Some(console));

        h.key_up(KeyCode::F(12));
        assert!(!h.ui.contains_layer(console));
        assert_eq!(h.ui.modal_layer(), Some(dialog));
    }

    #[test]
    fn measuring_is_limited_to_event_handling() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let label = h.add(layer, Label, Rect::new(0.0, 0.0, 10.0, 10.0));
        h.ui.tree_mut().set_text(label, "hello");
        assert_eq!(h.ui.calc_size(label), Err(LayerError::OutsideRender));
        assert_eq!(h.ui.calc_tooltip_size("tip"), Err(LayerError::OutsideRender));

        let measured = Rc::new(Cell::new(None));
        let out = measured.clone();
        h.ui.set_on_repaint(layer, move |ui, _| {
            out.set(ui.calc_size(label).ok());
        });
        h.send(EventKind::Repaint, 500.0, 500.0);
        assert_eq!(measured.get(), Some(Size::new(50.0, 20.0)));
    }

    #[test]
    fn repaint_draws_layers_in_order_then_the_tooltip() {
        let mut h = Harness::new();
        let top = h.ui.create_layer(2, false).unwrap();
        let bottom = h.ui.create_layer(1, false).unwrap();
        assert_eq!(h.ui.layers().collect::<Vec<_>>(), vec![bottom, top]);
        let upper = h.add(top, Label, Rect::new(0.0, 0.0, 10.0, 10.0));
        let lower = h.add(bottom, Button::default(), Rect::new(0.0, 0.0, 50.0, 50.0));
        h.ui.tree_mut()
            .set_tooltip(lower, Some("a rather long tooltip text".into()));

        h.send(EventKind::Repaint, 20.0, 20.0);
        assert_eq!(h.ui.tooltip(), Some("a rather long tooltip text"));
        let record = h.record.borrow();
        assert_eq!(record.drawn, vec![lower, upper], "lower layer first, roots are not drawn");
        let (text, bounds) = &record.tooltips[0];
        assert_eq!(text, "a rather long tooltip text");
        assert_eq!(
            *bounds,
            Rect::new(35.0, 35.0, 185.0, 75.0),
            "wrapped at the maximum width, offset from the pointer"
        );
    }

    #[test]
    fn repaint_steps_animations() {
        let mut h = Harness::new();
        let layer = h.ui.create_layer(0, false).unwrap();
        let label = h.add(layer, Label, Rect::new(0.0, 0.0, 10.0, 10.0));
        let anim = crate::animation::shared(crate::animation::MoveAnimation::new(
            label,
            Vec2::new(40.0, 0.0),
            1.0,
            0.0,
        ));
        assert!(h.ui.animate(anim.clone()));
        for t in [0.0, 0.5, 1.0, 1.5] {
            h.clock.set(t);
            h.send(EventKind::Repaint, 500.0, 500.0);
        }
        assert!(anim.borrow().is_done());
        assert_eq!(h.ui.tree().bounds(label).map(|b| b.x0), Some(40.0));
    }

    struct NoResources;

    impl ResourceLoader for NoResources {
        fn load_texture(&self, _path: &str) -> Option<AssetId> {
            None
        }

        fn load_font(&self, _path: &str) -> Option<AssetId> {
            None
        }
    }

    struct PanelBundle;

    impl AssetBundle for PanelBundle {
        fn load_texture(&self, name: &str) -> Option<AssetId> {
            (name == "panel").then_some(AssetId(7))
        }

        fn load_font(&self, _name: &str) -> Option<AssetId> {
            None
        }
    }

    struct Download(Rc<Cell<bool>>);

    impl BundleDownload for Download {
        fn is_done(&self) -> bool {
            self.0.get()
        }

        fn progress(&self) -> f32 {
            if self.0.get() { 1.0 } else { 0.0 }
        }

        fn take_bundle(&mut self) -> Option<Rc<dyn AssetBundle>> {
            Some(Rc::new(PanelBundle))
        }
    }

    #[test]
    fn repaint_polls_bundle_downloads() {
        let mut h = Harness::new();
        let assets = Rc::new(AssetRegistry::new(NoResources));
        h.ui.set_asset_registry(Some(assets.clone()));
        let layer = h.ui.create_layer(0, false).unwrap();
        let panel = h.add(layer, Panel::default(), Rect::new(0.0, 0.0, 50.0, 50.0));
        let style = h.ui.tree().element_style(panel).unwrap();
        style.borrow_mut().set_background_path("skin|panel");
        assets.check_load_assets(&style);
        let clone = h.ui.tree_mut().clone_element(panel).unwrap();

        let done = Rc::new(Cell::new(false));
        assets.load_bundle("skin", Download(done.clone()), None);
        h.send(EventKind::Repaint, 500.0, 500.0);
        assert!(assets.is_loading("skin"), "download still running");

        done.set(true);
        h.send(EventKind::Repaint, 500.0, 500.0);
        assert!(assets.contains("skin"));
        let texture = Fill::Texture(AssetId(7));
        for id in [panel, clone] {
            let resolved = h.ui.tree().resolved_state(id, StyleStateType::Normal);
            assert_eq!(resolved.map(|r| r.background), Some(texture));
        }
    }
}
