// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-driven animations, stepped once per repaint.
//!
//! An animation owns a [`Timeline`] and does its work in [`Animation::update`],
//! which only runs for steps that overlap its active window. Animations are
//! shared as [`AnimationRef`] so callers can keep a handle to one they handed
//! to a [`MultiAnimation`].

use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use kurbo::Vec2;
use tracing::error;
use understory_element_tree::{ElementId, Tree};

/// Clock state shared by every animation.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    current: f64,
    runtime: f64,
    time_stamp: f64,
    delta: f64,
    first_step: bool,
}

impl Timeline {
    /// A timeline of `runtime` seconds starting after `delay` seconds.
    pub fn new(runtime: f64, delay: f64) -> Self {
        Self {
            current: -delay,
            runtime,
            time_stamp: 0.0,
            delta: 0.0,
            first_step: true,
        }
    }

    /// Seconds since the start; negative while delayed.
    pub fn current_time(&self) -> f64 {
        self.current
    }

    /// Total runtime in seconds.
    pub fn runtime(&self) -> f64 {
        self.runtime
    }

    /// Seconds of the active window covered by the last step.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Progress in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.current >= self.runtime {
            1.0
        } else if self.current <= 0.0 {
            0.0
        } else {
            self.current / self.runtime
        }
    }

    /// Whether the runtime has elapsed.
    pub fn is_done(&self) -> bool {
        self.current >= self.runtime
    }

    /// Whether the timeline is strictly inside its active window.
    pub fn is_running(&self) -> bool {
        0.0 < self.current && self.current < self.runtime
    }

    /// Advance to `now`. The first call only records the timestamp.
    ///
    /// Returns whether the step covered part of the active window; the covered
    /// length is then available as [`Timeline::delta`].
    pub fn advance(&mut self, now: f64) -> bool {
        if self.first_step {
            self.first_step = false;
            self.time_stamp = now;
            self.delta = 0.0;
            return false;
        }
        let before = self.current;
        self.current += now - self.time_stamp;
        self.time_stamp = now;
        let start = before.max(0.0);
        let end = self.current.min(self.runtime);
        self.delta = (end - start).max(0.0);
        self.delta > 0.0
    }
}

/// A time-driven change to the element tree.
pub trait Animation: fmt::Debug {
    /// The animation's clock.
    fn timeline(&self) -> &Timeline;

    /// The animation's clock, mutably.
    fn timeline_mut(&mut self) -> &mut Timeline;

    /// Whether the animation has finished.
    fn is_done(&self) -> bool {
        self.timeline().is_done()
    }

    /// Whether the animation is currently running.
    fn is_running(&self) -> bool {
        self.timeline().is_running()
    }

    /// Apply one step's worth of change.
    fn update(&mut self, tree: &mut Tree, now: f64);

    /// Advance the clock to `now` and update if the step was active.
    fn step(&mut self, tree: &mut Tree, now: f64) {
        if self.timeline_mut().advance(now) {
            self.update(tree, now);
        }
    }
}

/// Shared handle to an animation.
pub type AnimationRef = Rc<RefCell<dyn Animation>>;

/// Wrap an animation in a shared handle.
pub fn shared(animation: impl Animation + 'static) -> AnimationRef {
    Rc::new(RefCell::new(animation))
}

/// A bundle of animations stepped together.
///
/// Finished children are dropped on the following step. The bundle is done
/// once it has started and holds no children.
pub struct MultiAnimation {
    timeline: Timeline,
    animations: Vec<AnimationRef>,
}

impl fmt::Debug for MultiAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiAnimation")
            .field("timeline", &self.timeline)
            .field("animations", &self.animations.len())
            .finish()
    }
}

impl MultiAnimation {
    /// An empty bundle starting after `delay` seconds.
    pub fn new(delay: f64) -> Self {
        Self {
            timeline: Timeline::new(0.0, delay),
            animations: Vec::new(),
        }
    }

    /// Add an animation. Adding the bundle to itself is refused.
    pub fn add(&mut self, animation: AnimationRef) -> bool {
        if core::ptr::addr_eq(animation.as_ptr(), self as *const Self) {
            error!("an animation cannot be added to itself");
            return false;
        }
        self.animations.push(animation);
        true
    }

    /// Number of unfinished children.
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Whether no children are left.
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

impl Animation for MultiAnimation {
    fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    fn is_done(&self) -> bool {
        self.timeline.current_time() > 0.0 && self.animations.is_empty()
    }

    fn is_running(&self) -> bool {
        self.timeline.current_time() > 0.0 && !self.animations.is_empty()
    }

    fn update(&mut self, tree: &mut Tree, now: f64) {
        self.animations.retain(|a| match a.try_borrow_mut() {
            Ok(a) if a.is_done() => false,
            Ok(mut a) => {
                a.step(tree, now);
                true
            }
            Err(_) => {
                error!("animation is nested inside itself, dropping it");
                false
            }
        });
    }

    fn step(&mut self, tree: &mut Tree, now: f64) {
        self.timeline.advance(now);
        if self.is_running() {
            self.update(tree, now);
        }
    }
}

/// Moves an element by a total offset over the runtime.
#[derive(Debug)]
pub struct MoveAnimation {
    timeline: Timeline,
    element: ElementId,
    offset: Vec2,
}

impl MoveAnimation {
    /// Move `element` by `offset` over `runtime` seconds after `delay` seconds.
    pub fn new(element: ElementId, offset: Vec2, runtime: f64, delay: f64) -> Self {
        Self {
            timeline: Timeline::new(runtime, delay),
            element,
            offset,
        }
    }
}

impl Animation for MoveAnimation {
    fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    fn update(&mut self, tree: &mut Tree, _now: f64) {
        let Some(bounds) = tree.bounds(self.element) else {
            return;
        };
        let step = self.offset * (self.timeline.delta() / self.timeline.runtime());
        tree.set_left(self.element, bounds.x0 + step.x);
        tree.set_top(self.element, bounds.y0 + step.y);
    }
}

/// Grows or shrinks an element by a total amount over the runtime.
#[derive(Debug)]
pub struct ResizeAnimation {
    timeline: Timeline,
    element: ElementId,
    amount: Vec2,
}

impl ResizeAnimation {
    /// Change the width by `amount.x` and the height by `amount.y`.
    pub fn new(element: ElementId, amount: Vec2, runtime: f64, delay: f64) -> Self {
        Self {
            timeline: Timeline::new(runtime, delay),
            element,
            amount,
        }
    }
}

impl Animation for ResizeAnimation {
    fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    fn update(&mut self, tree: &mut Tree, _now: f64) {
        let size = tree.size(self.element);
        let step = self.amount * (self.timeline.delta() / self.timeline.runtime());
        tree.set_width(self.element, size.width + step.x);
        tree.set_height(self.element, size.height + step.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use understory_element_tree::Label;

    #[test]
    fn timeline_delay_and_progress() {
        let mut t = Timeline::new(2.0, 1.0);
        assert_eq!(t.current_time(), -1.0, "delay starts below zero");
        assert!(!t.advance(5.0), "first step only records the time");
        assert!(!t.advance(6.0), "still inside the delay");
        assert_eq!(t.progress(), 0.0);
        assert!(t.advance(7.0));
        assert!(t.is_running());
        assert_eq!(t.progress(), 0.5);
        assert!(t.advance(9.5), "overshoot still covers the tail");
        assert_eq!(t.delta(), 1.0, "only the active part counts");
        assert!(t.is_done() && !t.is_running());
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn move_animation_covers_the_full_offset() {
        let mut tree = Tree::new();
        let label = tree.create(Label);
        tree.set_bounds(label, Rect::new(10.0, 20.0, 60.0, 40.0));
        let mut anim = MoveAnimation::new(label, Vec2::new(100.0, -20.0), 1.0, 0.0);
        for now in [0.0, 0.25, 0.5, 0.75, 1.0, 1.5] {
            anim.step(&mut tree, now);
        }
        assert!(anim.is_done());
        assert_eq!(tree.bounds(label), Some(Rect::new(110.0, 0.0, 160.0, 20.0)));
    }

    #[test]
    fn resize_animation_grows() {
        let mut tree = Tree::new();
        let label = tree.create(Label);
        tree.set_bounds(label, Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut anim = ResizeAnimation::new(label, Vec2::new(30.0, 10.0), 0.5, 0.0);
        for now in [1.0, 1.25, 1.5] {
            anim.step(&mut tree, now);
        }
        assert_eq!(tree.size(label), kurbo::Size::new(40.0, 20.0));
    }

    #[test]
    fn multi_refuses_itself_and_drops_finished_children() {
        let mut tree = Tree::new();
        let label = tree.create(Label);
        let multi = Rc::new(RefCell::new(MultiAnimation::new(0.0)));
        let as_dyn: AnimationRef = multi.clone();
        assert!(!multi.borrow_mut().add(as_dyn), "self insertion is refused");
        let child = shared(MoveAnimation::new(label, Vec2::new(10.0, 0.0), 1.0, 0.0));
        assert!(multi.borrow_mut().add(child.clone()));
        assert!(!multi.borrow().is_done(), "not started");

        let mut now = 0.0;
        while !multi.borrow().is_done() && now < 10.0 {
            multi.borrow_mut().step(&mut tree, now);
            now += 0.5;
        }
        assert!(multi.borrow().is_empty(), "finished child removed");
        assert!(child.borrow().is_done());
        assert_eq!(tree.bounds(label).map(|b| b.x0), Some(10.0));
    }
}
