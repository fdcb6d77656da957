// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover state helper: compute enter/move/leave transitions from hit lists.
//!
//! ## Minimal example
//!
//! ```
//! use understory_layers::hover::{HoverEvent, HoverState};
//! let mut h: HoverState<u32> = HoverState::new();
//! assert_eq!(h.update(&[2, 1]), vec![HoverEvent::Enter(2), HoverEvent::Enter(1)]);
//! assert_eq!(h.update(&[3, 1]), vec![HoverEvent::Enter(3), HoverEvent::Move(1), HoverEvent::Leave(2)]);
//! ```

/// A hover state machine over topmost-first hit lists.
///
/// Unlike a path, a hit list may hold siblings and elements of several layers,
/// so transitions are computed by membership rather than by common prefix.
///
/// Ordering semantics:
/// - Enter and move events follow the new list (topmost first).
/// - Leave events follow the previous list and come last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoverState<K: Copy + Eq> {
    current: Vec<K>,
}

/// A hover transition event.
///
/// Returned by [`HoverState::update`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoverEvent<K> {
    /// Pointer entered the element.
    Enter(K),
    /// Pointer moved within an element it was already over.
    Move(K),
    /// Pointer left the element.
    Leave(K),
}

impl<K: Copy + Eq> HoverState<K> {
    /// Create an empty hover state.
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
        }
    }

    /// The current hit list (topmost first).
    pub fn current(&self) -> &[K] {
        &self.current
    }

    /// Whether `k` is in the current hit list.
    pub fn contains(&self, k: K) -> bool {
        self.current.contains(&k)
    }

    /// Clear the hover state, returning leave events in list order.
    pub fn clear(&mut self) -> Vec<HoverEvent<K>> {
        let out = self.current.iter().map(|&k| HoverEvent::Leave(k)).collect();
        self.current.clear();
        out
    }

    /// Forget `k` without emitting anything (it was destroyed).
    pub fn forget(&mut self, k: K) {
        self.current.retain(|c| *c != k);
    }

    /// Replace the hit list and return the transitions from the previous one.
    pub fn update(&mut self, hits: &[K]) -> Vec<HoverEvent<K>> {
        let mut out = Vec::with_capacity(hits.len());
        for &k in hits {
            if self.current.contains(&k) {
                out.push(HoverEvent::Move(k));
            } else {
                out.push(HoverEvent::Enter(k));
            }
        }
        for &k in &self.current {
            if !hits.contains(&k) {
                out.push(HoverEvent::Leave(k));
            }
        }
        self.current.clear();
        self.current.extend_from_slice(hits);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_list_enters_in_order() {
        let mut h: HoverState<u32> = HoverState::new();
        let ev = h.update(&[3, 2, 1]);
        assert_eq!(
            ev,
            vec![
                HoverEvent::Enter(3),
                HoverEvent::Enter(2),
                HoverEvent::Enter(1)
            ]
        );
        assert_eq!(h.current(), &[3, 2, 1]);
    }

    #[test]
    fn leaving_everything() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update(&[2, 1]);
        assert_eq!(
            h.update(&[]),
            vec![HoverEvent::Leave(2), HoverEvent::Leave(1)],
            "leaves follow the previous order"
        );
        assert!(h.current().is_empty());
    }

    // Siblings swap under the pointer while the shared parent stays hovered.
    #[test]
    fn sibling_change_keeps_parent_moving() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update(&[2, 1]);
        let ev = h.update(&[3, 1]);
        assert_eq!(
            ev,
            vec![HoverEvent::Enter(3), HoverEvent::Move(1), HoverEvent::Leave(2)]
        );
    }

    #[test]
    fn same_list_only_moves() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update(&[7, 8]);
        assert_eq!(h.update(&[7, 8]), vec![HoverEvent::Move(7), HoverEvent::Move(8)]);
    }

    #[test]
    fn forgotten_elements_do_not_leave() {
        let mut h: HoverState<u32> = HoverState::new();
        let _ = h.update(&[5, 6]);
        h.forget(5);
        assert_eq!(h.clear(), vec![HoverEvent::Leave(6)]);
    }
}
