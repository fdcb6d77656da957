// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, collections, styles, queries.

use core::fmt;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;
use tracing::{debug, error, warn};
use understory_style::{
    AssetRegistry, DefaultStyles, ResolvedState, Style, StylePropertyType, StyleRef,
    StyleStateType, StyleValue,
};

use crate::skin::StyleBinding;
use crate::types::{Capabilities, ElementFlags, ElementId, WidgetKind};
use crate::widget::{MouseHandler, PointerContext, RefreshContext, Widget};

/// Elements under a point, topmost first.
pub type HitList = SmallVec<[ElementId; 8]>;

/// Filters applied during hit testing.
///
/// Used by [`Tree::elements_at`].
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryFilter {
    /// If true, skip elements that are not [visible](Tree::is_visible).
    pub visible_only: bool,
    /// If true, skip elements that are not [enabled](Tree::is_enabled).
    pub enabled_only: bool,
}

#[derive(Default)]
struct MouseHandlers {
    enter: Option<MouseHandler>,
    exit: Option<MouseHandler>,
    moved: Option<MouseHandler>,
}

impl fmt::Debug for MouseHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseHandlers")
            .field("enter", &self.enter.is_some())
            .field("exit", &self.exit.is_some())
            .field("moved", &self.moved.is_some())
            .finish()
    }
}

fn fire_mouse(handler: &mut Option<MouseHandler>, id: ElementId, position: Point) -> bool {
    match handler {
        Some(h) => {
            h(id, position);
            true
        }
        None => false,
    }
}

#[derive(Debug)]
pub(crate) struct Element {
    generation: u32,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    guid: String,
    name: String,
    text: String,
    flags: ElementFlags,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    tooltip: Option<String>,
    mouse: MouseHandlers,
    styles: StyleBinding,
    widget: Box<dyn Widget>,
}

impl Element {
    fn new(generation: u32, widget: Box<dyn Widget>, styles: StyleBinding) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            guid: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            text: String::new(),
            flags: ElementFlags::default(),
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            tooltip: None,
            mouse: MouseHandlers::default(),
            styles,
            widget,
        }
    }

    /// Copy a state-independent value into the cached element fields.
    fn apply_independent(&mut self, property: StylePropertyType, value: &StyleValue) {
        use StylePropertyType as P;
        match (property, value) {
            (P::Left, StyleValue::Float(v)) => self.left = *v,
            (P::Top, StyleValue::Float(v)) => self.top = *v,
            (P::Width, StyleValue::Float(v)) => self.width = *v,
            (P::Height, StyleValue::Float(v)) => self.height = *v,
            (P::Name, StyleValue::Text(s)) => self.name.clone_from(s),
            (P::Text, StyleValue::Text(s)) => self.text.clone_from(s),
            (P::Enabled, StyleValue::Bool(b)) => self.flags.set(ElementFlags::ENABLED, *b),
            (P::Visible, StyleValue::Bool(b)) => self.flags.set(ElementFlags::VISIBLE, *b),
            _ => {}
        }
    }
}

/// Arena of elements.
///
/// Elements are created detached and linked into collections with
/// [`Tree::add_element`] / [`Tree::insert_element`]. Parent links are
/// non-owning handles; a child can only ever point at a collection that lists
/// it. Collection operations return `false` and log on invalid input instead of
/// panicking.
///
/// Geometry, name, text and the enabled/visible flags are read from the element's
/// resolved styles. The setters here write the element's instance style and
/// resync at once; edits made directly on a [`StyleRef`] take effect on the next
/// [`Tree::sync_styles`].
pub struct Tree {
    nodes: Vec<Option<Element>>, // slots
    generations: Vec<u32>,       // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    defaults: DefaultStyles,
    modal_root: Option<ElementId>,
    assets: Option<Rc<AssetRegistry>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("modal_root", &self.modal_root)
            .field("assets", &self.assets.is_some())
            .finish_non_exhaustive()
    }
}

impl Tree {
    /// Create an empty tree with the built-in default styles.
    pub fn new() -> Self {
        Self::with_default_styles(DefaultStyles::new())
    }

    /// Create an empty tree whose elements bind to `defaults`.
    pub fn with_default_styles(defaults: DefaultStyles) -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            defaults,
            modal_root: None,
            assets: None,
        }
    }

    /// The default styles new elements bind to.
    pub fn default_styles(&self) -> &DefaultStyles {
        &self.defaults
    }

    /// The registry resolving asset paths of copied styles.
    pub fn asset_registry(&self) -> Option<&Rc<AssetRegistry>> {
        self.assets.as_ref()
    }

    /// Set the registry used by [`Tree::clone_element`] to resolve the asset
    /// paths of copied instance styles.
    pub fn set_asset_registry(&mut self, assets: Option<Rc<AssetRegistry>>) {
        self.assets = assets;
    }

    // --- lifecycle ---

    /// Create a detached element around `widget`.
    pub fn create(&mut self, widget: impl Widget) -> ElementId {
        self.create_boxed(Box::new(widget))
    }

    /// Create a detached element around a boxed widget.
    pub fn create_boxed(&mut self, widget: Box<dyn Widget>) -> ElementId {
        let default = self.defaults.get(widget.default_style());
        let styles = StyleBinding::new(default, Style::new().into_ref());
        let id = self.alloc(|generation| Element::new(generation, widget, styles));
        self.sync_element(id);
        id
    }

    fn alloc(&mut self, make: impl FnOnce(u32) -> Element) -> ElementId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(make(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(make(generation)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        ElementId::new(idx, generation)
    }

    /// Destroy an element and its subtree, unlinking it from its collection.
    ///
    /// Its style subscriptions die with it.
    pub fn destroy(&mut self, id: ElementId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
            self.refresh(parent);
        }
        self.destroy_subtree(id);
    }

    fn destroy_subtree(&mut self, id: ElementId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.destroy_subtree(child);
        }
        if self.modal_root == Some(id) {
            self.modal_root = None;
        }
        self.nodes[id.idx()] = None;
        // A slot whose generation is exhausted is retired for good.
        if self.generations[id.idx()] < u32::MAX {
            self.free_list.push(id.idx());
        }
    }

    /// Returns true if `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.node(id).is_some()
    }

    /// Live elements in slot order.
    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| {
            n.as_ref().map(|n| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "ElementId uses 32-bit indices by design."
                )]
                ElementId::new(i as u32, n.generation)
            })
        })
    }

    /// Deep-copy an element and its subtree.
    ///
    /// The copy gets fresh GUIDs, a copied instance style, the same default and
    /// class styles, and no handlers. It is detached. Pending asset paths of the
    /// copied style are resolved through the [asset registry](Tree::asset_registry).
    pub fn clone_element(&mut self, id: ElementId) -> Option<ElementId> {
        let node = self.node(id)?;
        let widget = node.widget.clone_widget();
        let styles = node.styles.copy(self.assets.as_deref());
        let name = node.name.clone();
        let text = node.text.clone();
        let flags = node.flags - ElementFlags::HOVERED;
        let (left, top, width, height) = (node.left, node.top, node.width, node.height);
        let tooltip = node.tooltip.clone();
        let children = node.children.clone();
        let copy = self.alloc(|generation| {
            let mut e = Element::new(generation, widget, styles);
            e.name = name;
            e.text = text;
            e.flags = flags;
            e.left = left;
            e.top = top;
            e.width = width;
            e.height = height;
            e.tooltip = tooltip;
            e
        });
        for child in children {
            if let Some(c) = self.clone_element(child) {
                self.link_parent(c, copy, None);
            }
        }
        self.sync_element(copy);
        self.refresh(copy);
        Some(copy)
    }

    // --- structure ---

    /// The collection containing `id`.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id)?.parent
    }

    /// Children of `id` in draw order (last is topmost). Empty for stale ids.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Number of children of `id`.
    pub fn child_count(&self, id: ElementId) -> usize {
        self.children(id).len()
    }

    /// Whether `ancestor` is `id` or on its parent chain.
    pub fn is_ancestor(&self, ancestor: ElementId, mut id: ElementId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    /// Append `child` to the collection `parent`. See [`Tree::insert_element`].
    pub fn add_element(&mut self, parent: ElementId, child: ElementId) -> bool {
        let index = self.child_count(parent);
        self.insert_element(parent, index, child)
    }

    /// Insert `child` into the collection `parent` at `index`.
    ///
    /// Fails (returns `false` and logs) if either handle is stale, `parent` is
    /// not a collection, `child` is a layer root or already has a parent, `index`
    /// is outside `0..=count`, or the insertion would create a cycle.
    pub fn insert_element(&mut self, parent: ElementId, index: usize, child: ElementId) -> bool {
        let Some(p) = self.node(parent) else {
            error!("cannot insert into a destroyed collection");
            return false;
        };
        let Some(c) = self.node(child) else {
            error!(collection = %self.display_name(parent), "cannot insert a destroyed element");
            return false;
        };
        if !p.widget.accepts_children() {
            warn!(
                collection = %self.display_name(parent),
                "element does not accept children"
            );
            return false;
        }
        if c.widget.kind() == WidgetKind::Layer {
            error!(
                element = %self.display_name(child),
                "a layer cannot be added to a collection"
            );
            return false;
        }
        if c.parent.is_some() {
            warn!(
                element = %self.display_name(child),
                "element already has a parent, remove it first"
            );
            return false;
        }
        let count = p.children.len();
        if index > count {
            warn!(
                element = %self.display_name(child),
                index,
                count,
                "index out of range"
            );
            return false;
        }
        if self.is_ancestor(child, parent) {
            warn!(
                element = %self.display_name(child),
                collection = %self.display_name(parent),
                "insertion would create a cycle"
            );
            return false;
        }
        self.link_parent(child, parent, Some(index));
        self.refresh(parent);
        true
    }

    /// Remove `child` from the collection `parent`. The child stays alive, detached.
    pub fn remove_element(&mut self, parent: ElementId, child: ElementId) -> bool {
        if self.parent(child) != Some(parent) || !self.is_alive(parent) {
            warn!(
                element = %self.display_name(child),
                "element is not a child of this collection"
            );
            return false;
        }
        self.unlink_parent(child, parent);
        self.refresh(parent);
        true
    }

    /// Detach every child of `parent`.
    pub fn clear(&mut self, parent: ElementId) {
        let children = self.children(parent).to_vec();
        for child in children {
            self.unlink_parent(child, parent);
        }
        self.refresh(parent);
    }

    /// Validate a parent assignment.
    ///
    /// Links are only created by the collection operations, so this never
    /// changes the tree. `Some(p)` is accepted only if `p` already lists `id`;
    /// `None` is rejected while `id` is still a child of some collection.
    pub fn set_parent(&mut self, id: ElementId, parent: Option<ElementId>) -> bool {
        match parent {
            Some(p) if self.children(p).contains(&id) => true,
            Some(_) => {
                warn!(
                    element = %self.display_name(id),
                    "the collection does not contain this element, add it first"
                );
                false
            }
            None if self.parent(id).is_some() => {
                warn!(
                    element = %self.display_name(id),
                    "cannot clear the parent of an element that is still a child"
                );
                false
            }
            None => true,
        }
    }

    fn link_parent(&mut self, id: ElementId, parent: ElementId, index: Option<usize>) {
        if let Some(p) = self.node_mut(parent) {
            match index {
                Some(i) => p.children.insert(i, id),
                None => p.children.push(id),
            }
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: ElementId, parent: ElementId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
            n.flags.remove(ElementFlags::HOVERED);
        }
    }

    /// Path from the outermost ancestor to `id` (inclusive).
    pub fn path_to_root(&self, mut id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        while self.is_alive(id) {
            out.push(id);
            match self.parent(id) {
                Some(p) => id = p,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// The outermost ancestor of `id`.
    pub fn root_of(&self, id: ElementId) -> ElementId {
        self.path_to_root(id).first().copied().unwrap_or(id)
    }

    // --- element state ---

    /// The element's GUID.
    pub fn guid(&self, id: ElementId) -> Option<&str> {
        self.node(id).map(|n| n.guid.as_str())
    }

    /// Live element with the given GUID.
    pub fn find_by_guid(&self, guid: &str) -> Option<ElementId> {
        self.iter().find(|&id| self.guid(id) == Some(guid))
    }

    /// The element's name as set, possibly empty.
    pub fn name(&self, id: ElementId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    /// The name, or `[content: <text>]` when the name is empty.
    pub fn display_name(&self, id: ElementId) -> String {
        match self.node(id) {
            Some(n) if !n.name.is_empty() => n.name.clone(),
            Some(n) => format!("[content: {}]", n.text),
            None => String::from("[destroyed]"),
        }
    }

    /// The element's text.
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.node(id).map(|n| n.text.as_str())
    }

    /// Tooltip text shown while the pointer rests on the element.
    pub fn tooltip(&self, id: ElementId) -> Option<&str> {
        self.node(id)?.tooltip.as_deref()
    }

    /// Set or clear the tooltip.
    pub fn set_tooltip(&mut self, id: ElementId, tooltip: Option<String>) {
        if let Some(n) = self.node_mut(id) {
            n.tooltip = tooltip;
        }
    }

    /// The widget variant.
    pub fn kind(&self, id: ElementId) -> Option<WidgetKind> {
        self.node(id).map(|n| n.widget.kind())
    }

    /// Event categories of the element; empty for stale ids.
    pub fn capabilities(&self, id: ElementId) -> Capabilities {
        self.node(id)
            .map_or(Capabilities::empty(), |n| n.widget.capabilities())
    }

    /// The element's widget.
    pub fn widget(&self, id: ElementId) -> Option<&dyn Widget> {
        self.node(id).map(|n| n.widget.as_ref())
    }

    /// The element's widget, mutably.
    pub fn widget_mut(&mut self, id: ElementId) -> Option<&mut dyn Widget> {
        self.node_mut(id).map(|n| n.widget.as_mut())
    }

    /// The element's widget as a concrete type.
    pub fn widget_as<T: Widget>(&self, id: ElementId) -> Option<&T> {
        self.widget(id)?.as_any().downcast_ref()
    }

    /// The element's widget as a concrete type, mutably.
    pub fn widget_as_mut<T: Widget>(&mut self, id: ElementId) -> Option<&mut T> {
        self.widget_mut(id)?.as_any_mut().downcast_mut()
    }

    /// Local bounds relative to the parent.
    pub fn bounds(&self, id: ElementId) -> Option<Rect> {
        self.node(id)
            .map(|n| Rect::new(n.left, n.top, n.left + n.width, n.top + n.height))
    }

    /// Element size.
    pub fn size(&self, id: ElementId) -> Size {
        self.node(id)
            .map_or(Size::ZERO, |n| Size::new(n.width, n.height))
    }

    /// The element's own enabled flag.
    pub fn enabled(&self, id: ElementId) -> bool {
        self.flag(id, ElementFlags::ENABLED)
    }

    /// The element's own visible flag.
    pub fn visible(&self, id: ElementId) -> bool {
        self.flag(id, ElementFlags::VISIBLE)
    }

    /// Whether the pointer was over the element at the last mouse move.
    pub fn hovered(&self, id: ElementId) -> bool {
        self.flag(id, ElementFlags::HOVERED)
    }

    fn flag(&self, id: ElementId, flag: ElementFlags) -> bool {
        self.node(id).is_some_and(|n| n.flags.contains(flag))
    }

    /// Enabled, considering every ancestor.
    ///
    /// A layer root additionally counts as disabled while another layer is the
    /// [modal root](Tree::set_modal_root).
    pub fn is_enabled(&self, id: ElementId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if !node.flags.contains(ElementFlags::ENABLED) {
            return false;
        }
        match node.parent {
            Some(p) => self.is_enabled(p),
            None => {
                node.widget.kind() != WidgetKind::Layer
                    || self.modal_root.is_none_or(|m| m == id)
            }
        }
    }

    /// Visible, considering every ancestor.
    pub fn is_visible(&self, id: ElementId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        node.flags.contains(ElementFlags::VISIBLE) && node.parent.is_none_or(|p| self.is_visible(p))
    }

    /// The layer root that exclusively receives input, if any.
    pub fn modal_root(&self) -> Option<ElementId> {
        self.modal_root
    }

    /// Make `root` the only enabled layer root, or lift modality with `None`.
    pub fn set_modal_root(&mut self, root: Option<ElementId>) {
        self.modal_root = root;
    }

    /// Screen-space position.
    ///
    /// Each ancestor adds its offset; children of a scrolling container are
    /// shifted back by the container's scroll position.
    pub fn absolute_position(&self, id: ElementId) -> Point {
        let Some(node) = self.node(id) else {
            return Point::ZERO;
        };
        let local = Point::new(node.left, node.top);
        match node.parent.and_then(|p| Some((p, self.node(p)?))) {
            Some((p, parent)) => {
                self.absolute_position(p) + local.to_vec2() - parent.widget.scroll_offset()
            }
            None => local,
        }
    }

    /// Screen-space bounds.
    pub fn absolute_bounds(&self, id: ElementId) -> Rect {
        Rect::from_origin_size(self.absolute_position(id), self.size(id))
    }

    // --- style-backed setters ---

    fn edit_element_style(&mut self, id: ElementId, edit: impl FnOnce(&mut Style)) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let style = node.styles.element_style().clone();
        edit(&mut style.borrow_mut());
        self.sync_element(id);
        true
    }

    /// Set the name.
    pub fn set_name(&mut self, id: ElementId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.edit_element_style(id, |s| s.set_name(name))
    }

    /// Set the text.
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) -> bool {
        let text = text.into();
        self.edit_element_style(id, |s| s.set_text(text))
    }

    /// Set the local left offset.
    pub fn set_left(&mut self, id: ElementId, left: f64) -> bool {
        self.edit_element_style(id, |s| s.set_left(left))
    }

    /// Set the local top offset.
    pub fn set_top(&mut self, id: ElementId, top: f64) -> bool {
        self.edit_element_style(id, |s| s.set_top(top))
    }

    /// Set the width.
    pub fn set_width(&mut self, id: ElementId, width: f64) -> bool {
        self.edit_element_style(id, |s| s.set_width(width))
    }

    /// Set the height.
    pub fn set_height(&mut self, id: ElementId, height: f64) -> bool {
        self.edit_element_style(id, |s| s.set_height(height))
    }

    /// Set local position and size at once.
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) -> bool {
        self.edit_element_style(id, |s| {
            s.set_left(bounds.x0);
            s.set_top(bounds.y0);
            s.set_width(bounds.width());
            s.set_height(bounds.height());
        })
    }

    /// Set the own enabled flag.
    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) -> bool {
        self.edit_element_style(id, |s| s.set_enabled(enabled))
    }

    /// Set the own visible flag.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> bool {
        self.edit_element_style(id, |s| s.set_visible(visible))
    }

    /// Apply text typed into a text input.
    ///
    /// If the element is changeable and enabled and the text differs, stores it
    /// and fires the change handler. Returns whether the text changed.
    pub fn input_text(&mut self, id: ElementId, text: &str) -> bool {
        if !self.is_enabled(id) || self.text(id) == Some(text) {
            return false;
        }
        let changeable = self
            .widget_mut(id)
            .and_then(|w| w.as_changeable())
            .is_some_and(|c| c.is_changeable());
        if !changeable {
            return false;
        }
        self.set_text(id, text);
        if let Some(c) = self.widget_mut(id).and_then(|w| w.as_changeable()) {
            c.on_change(id);
        }
        true
    }

    // --- styles ---

    /// Shared default style.
    pub fn default_style(&self, id: ElementId) -> Option<StyleRef> {
        self.node(id).map(|n| n.styles.default_style().clone())
    }

    /// Shared class style, if bound.
    pub fn class_style(&self, id: ElementId) -> Option<StyleRef> {
        self.node(id)?.styles.class_style().cloned()
    }

    /// The element's own instance style.
    pub fn element_style(&self, id: ElementId) -> Option<StyleRef> {
        self.node(id).map(|n| n.styles.element_style().clone())
    }

    /// Rebind the default style.
    pub fn set_default_style(&mut self, id: ElementId, style: StyleRef) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.styles.set_default(style);
        self.sync_element(id);
        true
    }

    /// Bind or unbind a class style.
    pub fn set_class_style(&mut self, id: ElementId, style: Option<StyleRef>) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.styles.set_class(style);
        self.sync_element(id);
        true
    }

    /// Replace the instance style.
    pub fn set_element_style(&mut self, id: ElementId, style: StyleRef) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.styles.set_element(style);
        self.sync_element(id);
        true
    }

    /// Resolve one property through the element's cascade.
    pub fn resolve(
        &self,
        id: ElementId,
        property: StylePropertyType,
        state: StyleStateType,
    ) -> Option<StyleValue> {
        self.node(id)?.styles.resolve(property, state)
    }

    /// The rendering snapshot of one interaction state, as of the last sync.
    pub fn resolved_state(&self, id: ElementId, state: StyleStateType) -> Option<&ResolvedState> {
        self.node(id).map(|n| n.styles.resolved(state))
    }

    /// Apply pending style changes of every element.
    pub fn sync_styles(&mut self) {
        let ids: Vec<ElementId> = self.iter().collect();
        for id in ids {
            self.sync_element(id);
        }
    }

    /// Apply pending style changes of one element. Returns whether any were pending.
    ///
    /// A property whose Normal value resolves to nothing is left untouched.
    pub fn sync_element(&mut self, id: ElementId) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let pending = node.styles.take_pending();
        if pending.is_empty() {
            return false;
        }
        let mut geometry = false;
        for property in pending.iter() {
            let Some(normal) = node.styles.resolve(property, StyleStateType::Normal) else {
                continue;
            };
            if property.is_state_independent() {
                node.apply_independent(property, &normal);
                geometry |= matches!(
                    property,
                    StylePropertyType::Left
                        | StylePropertyType::Top
                        | StylePropertyType::Width
                        | StylePropertyType::Height
                );
                if ResolvedState::carries(property) {
                    node.styles.apply_all(property, &normal);
                }
            } else {
                node.styles.apply_per_state(property);
            }
            node.widget.style_changed(property, &normal);
        }
        let parent = node.parent;
        debug!(element = %self.display_name(id), "styles synced");
        self.refresh(id);
        if let Some(p) = parent.filter(|_| geometry) {
            self.refresh(p);
        }
        true
    }

    // --- widget refresh ---

    /// Right and bottom extent of the children's local bounds.
    pub fn content_size(&self, id: ElementId) -> Size {
        self.children(id)
            .iter()
            .filter_map(|&c| self.bounds(c))
            .fold(Size::ZERO, |acc, r| {
                Size::new(acc.width.max(r.x1), acc.height.max(r.y1))
            })
    }

    /// Hand current geometry to the widget.
    pub fn refresh(&mut self, id: ElementId) {
        let content = self.content_size(id);
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let cx = RefreshContext {
            size: Size::new(node.width, node.height),
            padding: node.styles.resolved(StyleStateType::Normal).padding,
            content,
        };
        node.widget.refresh(&cx);
    }

    // --- mouse ---

    /// Install the mouse-enter handler.
    pub fn set_on_mouse_enter(&mut self, id: ElementId, handler: impl FnMut(ElementId, Point) + 'static) {
        if let Some(n) = self.node_mut(id) {
            n.mouse.enter = Some(Box::new(handler));
        }
    }

    /// Install the mouse-exit handler.
    pub fn set_on_mouse_exit(&mut self, id: ElementId, handler: impl FnMut(ElementId, Point) + 'static) {
        if let Some(n) = self.node_mut(id) {
            n.mouse.exit = Some(Box::new(handler));
        }
    }

    /// Install the mouse-move handler.
    pub fn set_on_mouse_move(&mut self, id: ElementId, handler: impl FnMut(ElementId, Point) + 'static) {
        if let Some(n) = self.node_mut(id) {
            n.mouse.moved = Some(Box::new(handler));
        }
    }

    /// The pointer entered the element. Returns whether a handler ran.
    pub fn mouse_enter(&mut self, id: ElementId, position: Point) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.flags.insert(ElementFlags::HOVERED);
        fire_mouse(&mut n.mouse.enter, id, position)
    }

    /// The pointer moved within the element. Returns whether a handler ran.
    pub fn mouse_move(&mut self, id: ElementId, position: Point) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        fire_mouse(&mut n.mouse.moved, id, position)
    }

    /// The pointer left the element. Returns whether a handler ran.
    pub fn mouse_exit(&mut self, id: ElementId, position: Point) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.flags.remove(ElementFlags::HOVERED);
        fire_mouse(&mut n.mouse.exit, id, position)
    }

    /// Event context for a pointer event on `id` at `position`.
    pub fn pointer_context(&self, id: ElementId, position: Point) -> PointerContext {
        PointerContext {
            element: id,
            position,
            bounds: self.absolute_bounds(id),
        }
    }

    // --- queries ---

    /// Descendants of `root` under `point`, topmost first.
    ///
    /// Children are visited last-to-first; a matching collection's own matches
    /// come before the collection itself. `root` is not included.
    pub fn elements_at(&self, point: Point, root: ElementId, filter: QueryFilter) -> HitList {
        let mut out = HitList::new();
        self.collect_at(point, root, filter, &mut out);
        out
    }

    fn collect_at(&self, point: Point, parent: ElementId, filter: QueryFilter, out: &mut HitList) {
        for &child in self.children(parent).iter().rev() {
            if filter.visible_only && !self.is_visible(child) {
                continue;
            }
            if filter.enabled_only && !self.is_enabled(child) {
                continue;
            }
            if !self.absolute_bounds(child).contains(point) {
                continue;
            }
            self.collect_at(point, child, filter, out);
            out.push(child);
        }
    }

    /// Visible descendants of `root` in draw order (parents before children).
    pub fn draw_order(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !self.visible(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    // --- internals ---

    fn node(&self, id: ElementId) -> Option<&Element> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::scroll::ScrollBox;
    use crate::types::ScrollBarPolicy;
    use crate::widget::Scrollable;
    use crate::widgets::{Button, Label, LayerRoot, Panel};
    use understory_style::{AssetBundle, AssetId, Color, Fill, ResourceLoader};

    fn panel(tree: &mut Tree, bounds: Rect) -> ElementId {
        let id = tree.create(Panel::default());
        tree.set_bounds(id, bounds);
        id
    }

    #[test]
    fn new_elements_read_defaults() {
        let mut tree = Tree::new();
        let b = tree.create(Button::default());
        assert!(tree.enabled(b) && tree.visible(b), "base style enables and shows");
        assert_eq!(tree.bounds(b), Some(Rect::ZERO));
        assert_eq!(tree.guid(b).map(str::len), Some(36), "hyphenated uuid");
        assert_eq!(tree.display_name(b), "[content: ]");
        tree.set_text(b, "OK");
        assert_eq!(tree.display_name(b), "[content: OK]");
        tree.set_name(b, "ok_button");
        assert_eq!(tree.display_name(b), "ok_button");
    }

    #[test]
    fn insert_validation() {
        let mut tree = Tree::new();
        let p = panel(&mut tree, Rect::new(0.0, 0.0, 100.0, 100.0));
        let a = tree.create(Label);
        let b = tree.create(Label);
        let layer = tree.create(LayerRoot::default());
        assert!(!tree.insert_element(p, 1, a), "index past count");
        assert!(tree.insert_element(p, 0, a));
        assert!(!tree.add_element(p, a), "already parented");
        assert!(!tree.add_element(a, b), "labels are not collections");
        assert!(!tree.add_element(p, layer), "layers are never children");
        assert!(tree.insert_element(p, 0, b));
        assert_eq!(tree.children(p), &[b, a], "inserted before");
        assert!(!tree.remove_element(a, b), "wrong collection");
        assert!(tree.remove_element(p, b));
        assert_eq!(tree.parent(b), None);
        assert!(tree.is_alive(b), "removal does not destroy");
    }

    #[test]
    fn cycle_is_rejected_and_trees_untouched() {
        let mut tree = Tree::new();
        let a = panel(&mut tree, Rect::ZERO);
        let b = panel(&mut tree, Rect::ZERO);
        let c = panel(&mut tree, Rect::ZERO);
        assert!(tree.add_element(a, b));
        assert!(tree.add_element(b, c));
        // Detach a so it is eligible, then try putting it under its own descendant.
        assert!(!tree.add_element(c, a), "a is an ancestor of c");
        assert!(!tree.add_element(a, a), "self insertion");
        assert_eq!(tree.children(a), &[b]);
        assert_eq!(tree.children(b), &[c]);
        assert!(tree.children(c).is_empty());
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn set_parent_only_validates() {
        let mut tree = Tree::new();
        let p = panel(&mut tree, Rect::ZERO);
        let c = tree.create(Label);
        assert!(!tree.set_parent(c, Some(p)), "not listed by p");
        tree.add_element(p, c);
        assert!(tree.set_parent(c, Some(p)));
        assert!(!tree.set_parent(c, None), "still a child");
        assert_eq!(tree.parent(c), Some(p));
    }

    #[test]
    fn enabled_and_visible_inherit() {
        let mut tree = Tree::new();
        let outer = panel(&mut tree, Rect::ZERO);
        let inner = tree.create(Button::default());
        tree.add_element(outer, inner);
        assert!(tree.is_enabled(inner));
        tree.set_enabled(outer, false);
        assert!(!tree.is_enabled(inner), "parent disables");
        assert!(tree.enabled(inner), "own flag untouched");
        tree.set_enabled(outer, true);
        tree.set_visible(outer, false);
        assert!(!tree.is_visible(inner), "parent hides");
        assert!(tree.is_enabled(inner));
    }

    #[test]
    fn modal_root_disables_other_layers() {
        let mut tree = Tree::new();
        let base = tree.create(LayerRoot::default());
        let modal = tree.create(LayerRoot::default());
        let b = tree.create(Button::default());
        tree.add_element(base, b);
        tree.set_modal_root(Some(modal));
        assert!(!tree.is_enabled(base));
        assert!(!tree.is_enabled(b), "children of disabled layers");
        assert!(tree.is_enabled(modal));
        tree.destroy(modal);
        assert_eq!(tree.modal_root(), None, "destroying the modal lifts it");
        assert!(tree.is_enabled(b));
    }

    #[test]
    fn absolute_position_subtracts_scroll() {
        let mut tree = Tree::new();
        let layer = tree.create(LayerRoot::default());
        let sb = tree.create(ScrollBox::new(ScrollBarPolicy::Both));
        tree.set_bounds(sb, Rect::new(10.0, 20.0, 110.0, 120.0));
        tree.add_element(layer, sb);
        let child = tree.create(Label);
        tree.set_bounds(child, Rect::new(5.0, 0.0, 55.0, 200.0));
        tree.add_element(sb, child);
        assert_eq!(tree.absolute_position(child), Point::new(15.0, 20.0));
        let scroll = tree.widget_as_mut::<ScrollBox>(sb).expect("scroll box");
        assert_eq!(scroll.scroll_maximum(), 100.0, "200 high content in 100");
        assert!(scroll.set_scroll_position(30.0));
        assert_eq!(tree.absolute_position(child), Point::new(15.0, -10.0));
    }

    #[test]
    fn moving_a_child_refreshes_scroll_extents() {
        let mut tree = Tree::new();
        let sb = tree.create(ScrollBox::default());
        tree.set_bounds(sb, Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = tree.create(Label);
        tree.add_element(sb, child);
        let max = |t: &Tree| t.widget(sb).and_then(|w| w.scrollable()).map(|s| s.scroll_maximum());
        assert_eq!(max(&tree), Some(0.0));
        tree.set_bounds(child, Rect::new(0.0, 0.0, 10.0, 150.0));
        assert_eq!(max(&tree), Some(50.0));
    }

    #[test]
    fn hits_are_topmost_first_with_descendants_before_parents() {
        let mut tree = Tree::new();
        let layer = tree.create(LayerRoot::default());
        let a = panel(&mut tree, Rect::new(0.0, 0.0, 100.0, 100.0));
        let a_child = panel(&mut tree, Rect::new(10.0, 10.0, 50.0, 50.0));
        let b = panel(&mut tree, Rect::new(20.0, 20.0, 80.0, 80.0));
        tree.add_element(layer, a);
        tree.add_element(a, a_child);
        tree.add_element(layer, b);
        let filter = QueryFilter {
            visible_only: true,
            enabled_only: true,
        };
        let hits = tree.elements_at(Point::new(30.0, 30.0), layer, filter);
        assert_eq!(hits.as_slice(), &[b, a_child, a]);
        tree.set_enabled(b, false);
        let hits = tree.elements_at(Point::new(30.0, 30.0), layer, filter);
        assert_eq!(hits.as_slice(), &[a_child, a], "disabled elements filtered");
        let all = tree.elements_at(Point::new(30.0, 30.0), layer, QueryFilter::default());
        assert_eq!(all.len(), 3, "unfiltered query sees it");
        assert!(
            tree.elements_at(Point::new(100.0, 5.0), layer, filter).is_empty(),
            "right edge is exclusive"
        );
    }

    #[test]
    fn clone_is_independent() {
        let mut tree = Tree::new();
        let source = panel(&mut tree, Rect::new(0.0, 0.0, 40.0, 40.0));
        let inner = tree.create(Label);
        tree.add_element(source, inner);
        tree.element_style(source)
            .expect("live")
            .borrow_mut()
            .set_text_color(Color::WHITE);
        tree.sync_styles();
        let copy = tree.clone_element(source).expect("live");
        assert_eq!(tree.parent(copy), None, "detached");
        assert_eq!(tree.child_count(copy), 1, "deep copy");
        assert_ne!(tree.guid(copy), tree.guid(source));
        assert!(Rc::ptr_eq(
            &tree.default_style(copy).expect("live"),
            &tree.default_style(source).expect("live")
        ));
        tree.element_style(copy)
            .expect("live")
            .borrow_mut()
            .set_text_color(Color::RED);
        tree.sync_styles();
        let text = |t: &Tree, id| {
            t.resolved_state(id, StyleStateType::Normal)
                .map(|r| r.text_color)
        };
        assert_eq!(text(&tree, source), Some(Color::WHITE), "source untouched");
        assert_eq!(text(&tree, copy), Some(Color::RED));
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

    struct CheckBundle;

    impl AssetBundle for CheckBundle {
        fn load_texture(&self, name: &str) -> Option<AssetId> {
            (name == "check").then_some(AssetId(42))
        }

        fn load_font(&self, _name: &str) -> Option<AssetId> {
            None
        }
    }

    #[test]
    fn clone_resolves_pending_assets_when_the_bundle_arrives() {
        let assets = Rc::new(AssetRegistry::new(NoResources));
        let mut tree = Tree::new();
        tree.set_asset_registry(Some(assets.clone()));
        let source = panel(&mut tree, Rect::new(0.0, 0.0, 40.0, 40.0));
        let style = tree.element_style(source).expect("live");
        style.borrow_mut().set_background_path("ui|check");
        assets.check_load_assets(&style);
        let copy = tree.clone_element(source).expect("live");
        assert_eq!(assets.waiting_count("ui"), 2, "source and clone both wait");

        assert!(assets.register("ui", Rc::new(CheckBundle)));
        let background = |t: &Tree, id| {
            t.element_style(id)
                .expect("live")
                .borrow()
                .get_property(StylePropertyType::Background, StyleStateType::Normal)
        };
        let loaded = Some(StyleValue::Fill(Fill::Texture(AssetId(42))));
        assert_eq!(background(&tree, source), loaded);
        assert_eq!(background(&tree, copy), loaded, "clone resolved too");
    }

    #[test]
    fn exhausted_slots_are_retired() {
        let mut tree = Tree::new();
        let a = tree.create(Label);
        tree.destroy(a);
        tree.generations[a.idx()] = u32::MAX - 1;
        let b = tree.create(Label);
        assert_eq!(b.idx(), a.idx(), "slot reused");
        tree.destroy(b);
        let c = tree.create(Label);
        assert_ne!(c.idx(), b.idx(), "slot at the last generation is not reused");
        assert!(!tree.is_alive(a) && !tree.is_alive(b));
        assert!(tree.is_alive(c));
    }

    #[test]
    fn destroyed_elements_are_pruned_from_shared_styles() {
        let mut tree = Tree::new();
        let a = tree.create(Label);
        let b = tree.create(Label);
        let default = tree.default_style(a).expect("live");
        assert_eq!(default.borrow().subscriber_count(), 2);
        tree.destroy(a);
        assert!(!tree.is_alive(a));
        assert_eq!(default.borrow().subscriber_count(), 2, "swept lazily");
        default.borrow_mut().set_word_wrap(true);
        assert_eq!(default.borrow().subscriber_count(), 1, "stale entry removed");
        tree.sync_styles();
        assert_eq!(
            tree.resolved_state(b, StyleStateType::Hover)
                .map(|r| r.word_wrap),
            Some(true),
            "live elements still follow the default"
        );
    }

    #[test]
    fn stale_ids_are_absent() {
        let mut tree = Tree::new();
        let a = tree.create(Label);
        tree.destroy(a);
        let b = tree.create(Label);
        assert_eq!(a.idx(), b.idx(), "slot reused");
        assert!(!tree.is_alive(a));
        assert!(!tree.set_text(a, "x"));
        assert_eq!(tree.text(a), None);
        assert!(tree.children(a).is_empty());
    }

    #[test]
    fn class_style_sits_between_instance_and_default() {
        let mut tree = Tree::new();
        let b = tree.create(Button::default());
        let class = Style::new().into_ref();
        class.borrow_mut().set_font_size(30);
        tree.set_class_style(b, Some(class.clone()));
        let size = |t: &Tree| {
            t.resolved_state(b, StyleStateType::Active)
                .map(|r| r.font_size)
        };
        assert_eq!(size(&tree), Some(30));
        tree.element_style(b)
            .expect("live")
            .borrow_mut()
            .set_font_size(40);
        tree.sync_element(b);
        assert_eq!(size(&tree), Some(40), "instance wins");
    }

    #[test]
    fn input_text_fires_change() {
        use crate::widgets::TextInput;
        use core::cell::Cell;

        let mut tree = Tree::new();
        let edit = tree.create(TextInput::edit_box());
        let changes = Rc::new(Cell::new(0));
        let seen = changes.clone();
        tree.widget_as_mut::<TextInput>(edit)
            .expect("edit box")
            .on_change
            .set(move |_| seen.set(seen.get() + 1));
        assert!(tree.input_text(edit, "hello"));
        assert!(!tree.input_text(edit, "hello"), "unchanged");
        assert_eq!(tree.text(edit), Some("hello"));
        assert_eq!(changes.get(), 1, "one change");
    }
}
