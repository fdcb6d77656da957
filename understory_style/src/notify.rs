// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weak multicast of property changes.
//!
//! A [`Style`](crate::Style) does not own the widgets that render with it. Listeners
//! are therefore held as [`Weak`] handles: dropping the last strong reference to a
//! listener is the whole unsubscribe story. Dead entries are swept lazily on the
//! next notification and on explicit [`Subscribers::remove`].

use std::rc::{Rc, Weak};

use crate::types::StylePropertyType;

/// Receiver of property-change notifications.
///
/// Implementations must not borrow the notifying style; the notification is
/// delivered while the style is being mutated. Record the tag and act on it later.
pub trait StyleListener {
    /// Called once per mutated property.
    fn property_changed(&self, property: StylePropertyType);
}

/// A list of non-owning listener handles.
#[derive(Default)]
pub struct Subscribers {
    entries: Vec<Weak<dyn StyleListener>>,
}

impl core::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let live = self.entries.iter().filter(|w| w.strong_count() > 0).count();
        f.debug_struct("Subscribers")
            .field("entries", &self.entries.len())
            .field("live", &live)
            .finish()
    }
}

impl Subscribers {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same listener twice is a no-op.
    pub fn add<L: StyleListener + 'static>(&mut self, listener: &Rc<L>) {
        let weak: Weak<L> = Rc::downgrade(listener);
        let weak: Weak<dyn StyleListener> = weak;
        if self.entries.iter().any(|w| Weak::ptr_eq(w, &weak)) {
            return;
        }
        self.entries.push(weak);
    }

    /// Remove a listener, sweeping dead entries on the way.
    pub fn remove<L: StyleListener + 'static>(&mut self, listener: &Rc<L>) {
        let weak: Weak<L> = Rc::downgrade(listener);
        let weak: Weak<dyn StyleListener> = weak;
        self.entries
            .retain(|w| w.strong_count() > 0 && !Weak::ptr_eq(w, &weak));
    }

    /// Deliver `property` to every live listener and drop the dead ones.
    pub fn notify(&mut self, property: StylePropertyType) {
        self.entries.retain(|w| match w.upgrade() {
            Some(listener) => {
                listener.property_changed(property);
                true
            }
            None => false,
        });
    }

    /// Number of entries, including dead ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<StylePropertyType>>);

    impl StyleListener for Recorder {
        fn property_changed(&self, property: StylePropertyType) {
            self.0.borrow_mut().push(property);
        }
    }

    #[test]
    fn live_listener_receives_tags() {
        let rec = Rc::new(Recorder::default());
        let mut subs = Subscribers::new();
        subs.add(&rec);
        subs.add(&rec);
        assert_eq!(subs.len(), 1, "duplicate registration ignored");
        subs.notify(StylePropertyType::Width);
        subs.notify(StylePropertyType::TextColor);
        assert_eq!(
            *rec.0.borrow(),
            vec![StylePropertyType::Width, StylePropertyType::TextColor]
        );
    }

    #[derive(Default)]
    struct Counter(core::cell::Cell<u32>);

    impl StyleListener for Counter {
        fn property_changed(&self, _property: StylePropertyType) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn listeners_of_different_types_share_a_list() {
        let rec = Rc::new(Recorder::default());
        let count = Rc::new(Counter::default());
        let mut subs = Subscribers::new();
        subs.add(&rec);
        subs.add(&count);
        subs.notify(StylePropertyType::Left);
        subs.remove(&rec);
        subs.notify(StylePropertyType::Left);
        assert_eq!(rec.0.borrow().len(), 1, "removed after the first change");
        assert_eq!(count.0.get(), 2);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn dropped_listener_is_pruned_on_notify() {
        let keep = Rc::new(Recorder::default());
        let gone = Rc::new(Recorder::default());
        let mut subs = Subscribers::new();
        subs.add(&keep);
        subs.add(&gone);
        drop(gone);
        assert_eq!(subs.len(), 2, "sweep is lazy");
        subs.notify(StylePropertyType::Top);
        assert_eq!(subs.len(), 1, "stale entry removed by notification");
        assert_eq!(keep.0.borrow().len(), 1);
    }

    #[test]
    fn remove_sweeps_dead_entries() {
        let a = Rc::new(Recorder::default());
        let b = Rc::new(Recorder::default());
        let mut subs = Subscribers::new();
        subs.add(&a);
        subs.add(&b);
        drop(b);
        subs.remove(&a);
        assert!(subs.is_empty());
    }
}
