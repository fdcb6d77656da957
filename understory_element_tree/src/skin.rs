// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element style binding and the resolved per-state snapshot.
//!
//! An element subscribes a small listener to each of its three styles. The
//! listener only records which properties changed; the tree re-resolves them
//! on the next sync. Dropping the element drops the listener, which the styles
//! then sweep on their next notification.

use core::cell::Cell;
use std::rc::Rc;

use understory_style::{
    AssetRegistry, PropertySet, ResolvedState, StyleLayers, StyleListener, StylePropertyType,
    StyleRef, StyleStateType, StyleValue,
};

#[derive(Debug, Default)]
pub(crate) struct PendingChanges(Cell<PropertySet>);

impl StyleListener for PendingChanges {
    fn property_changed(&self, property: StylePropertyType) {
        let mut set = self.0.get();
        set.insert(property);
        self.0.set(set);
    }
}

impl PendingChanges {
    fn mark_all(&self) {
        self.0.set(PropertySet::full());
    }

    fn take(&self) -> PropertySet {
        self.0.take()
    }
}

pub(crate) const fn state_slot(state: StyleStateType) -> usize {
    match state {
        StyleStateType::Normal => 0,
        StyleStateType::Active => 1,
        StyleStateType::Hover => 2,
        StyleStateType::Focused => 3,
    }
}

/// The three styles of one element plus its resolved snapshots.
#[derive(Debug)]
pub(crate) struct StyleBinding {
    default: StyleRef,
    class: Option<StyleRef>,
    element: StyleRef,
    listener: Rc<PendingChanges>,
    resolved: [ResolvedState; 4],
}

impl StyleBinding {
    pub(crate) fn new(default: StyleRef, element: StyleRef) -> Self {
        let listener = Rc::new(PendingChanges::default());
        default.borrow_mut().subscribe(&listener);
        element.borrow_mut().subscribe(&listener);
        listener.mark_all();
        Self {
            default,
            class: None,
            element,
            listener,
            resolved: core::array::from_fn(|_| ResolvedState::default()),
        }
    }

    /// Copy for a cloned element: a deep copy of the instance style, shared
    /// default and class styles, and a fresh listener.
    pub(crate) fn copy(&self, assets: Option<&AssetRegistry>) -> Self {
        let element = match assets {
            Some(assets) => assets.copy_style(&self.element),
            None => self.element.borrow().copy().into_ref(),
        };
        let mut copy = Self::new(self.default.clone(), element);
        if let Some(class) = &self.class {
            copy.set_class(Some(class.clone()));
        }
        copy.resolved = self.resolved.clone();
        copy
    }

    pub(crate) fn default_style(&self) -> &StyleRef {
        &self.default
    }

    pub(crate) fn class_style(&self) -> Option<&StyleRef> {
        self.class.as_ref()
    }

    pub(crate) fn element_style(&self) -> &StyleRef {
        &self.element
    }

    pub(crate) fn set_default(&mut self, style: StyleRef) {
        if Rc::ptr_eq(&style, &self.default) {
            return;
        }
        self.default.borrow_mut().unsubscribe(&self.listener);
        style.borrow_mut().subscribe(&self.listener);
        self.default = style;
        self.listener.mark_all();
    }

    pub(crate) fn set_class(&mut self, style: Option<StyleRef>) {
        if let (Some(old), Some(new)) = (&self.class, &style) {
            if Rc::ptr_eq(old, new) {
                return;
            }
        }
        if let Some(old) = &self.class {
            old.borrow_mut().unsubscribe(&self.listener);
        }
        if let Some(new) = &style {
            new.borrow_mut().subscribe(&self.listener);
        }
        self.class = style;
        self.listener.mark_all();
    }

    pub(crate) fn set_element(&mut self, style: StyleRef) {
        if Rc::ptr_eq(&style, &self.element) {
            return;
        }
        self.element.borrow_mut().unsubscribe(&self.listener);
        style.borrow_mut().subscribe(&self.listener);
        self.element = style;
        self.listener.mark_all();
    }

    pub(crate) fn take_pending(&self) -> PropertySet {
        self.listener.take()
    }

    pub(crate) fn resolve(
        &self,
        property: StylePropertyType,
        state: StyleStateType,
    ) -> Option<StyleValue> {
        let element = self.element.borrow();
        let default = self.default.borrow();
        let class = self.class.as_ref().map(|c| c.borrow());
        StyleLayers {
            element: &element,
            class: class.as_deref(),
            default: &default,
        }
        .resolve(property, state)
    }

    pub(crate) fn resolved(&self, state: StyleStateType) -> &ResolvedState {
        &self.resolved[state_slot(state)]
    }

    /// Store a resolved value into every state snapshot.
    pub(crate) fn apply_all(&mut self, property: StylePropertyType, value: &StyleValue) {
        for r in &mut self.resolved {
            r.apply(property, value);
        }
    }

    /// Re-resolve a per-state property into each state snapshot.
    pub(crate) fn apply_per_state(&mut self, property: StylePropertyType) {
        for state in StyleStateType::ALL {
            if let Some(v) = self.resolve(property, state) {
                self.resolved[state_slot(state)].apply(property, &v);
            }
        }
    }
}
