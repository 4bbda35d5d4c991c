#![forbid(unsafe_code)]

//! Canonical motion and back-progress event types.
//!
//! [`MotionEvent`] is what the touch dispatcher feeds the coordinator;
//! [`BackEvent`] is what the coordinator relays to back callbacks.
//!
//! # Design Notes
//!
//! - Coordinates are window pixels as `f32`.
//! - `Cancel` is handled like `Up`; the gesture owner is expected to have
//!   left `trigger_back` false before cancelling.
//! - `Down` only marks a gesture boundary. The session starts on the first
//!   `Move` that follows.

use crate::target::RemoteAnimationTarget;

/// Action carried by a motion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionAction {
    Down,
    Move,
    Up,
    Cancel,
}

impl MotionAction {
    /// Whether this action terminates a gesture.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Up | Self::Cancel)
    }
}

/// Screen edge the back swipe originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwipeEdge {
    Left,
    Right,
    /// Non-touch origin (keyboard back, accessibility action).
    #[default]
    None,
}

/// A single touch sample from the gesture owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    pub x: f32,
    pub y: f32,
    pub action: MotionAction,
    pub edge: SwipeEdge,
}

impl MotionEvent {
    /// Create a motion event.
    #[must_use]
    pub const fn new(x: f32, y: f32, action: MotionAction, edge: SwipeEdge) -> Self {
        Self { x, y, action, edge }
    }

    #[must_use]
    pub const fn down(x: f32, y: f32, edge: SwipeEdge) -> Self {
        Self::new(x, y, MotionAction::Down, edge)
    }

    #[must_use]
    pub const fn moved(x: f32, y: f32, edge: SwipeEdge) -> Self {
        Self::new(x, y, MotionAction::Move, edge)
    }

    #[must_use]
    pub const fn up(x: f32, y: f32, edge: SwipeEdge) -> Self {
        Self::new(x, y, MotionAction::Up, edge)
    }

    #[must_use]
    pub const fn cancel(x: f32, y: f32, edge: SwipeEdge) -> Self {
        Self::new(x, y, MotionAction::Cancel, edge)
    }
}

/// Structured progress event delivered to back callbacks.
///
/// `progress` is always within `[0.0, 1.0]`; [`BackEvent::new`] clamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackEvent {
    pub touch_x: f32,
    pub touch_y: f32,
    pub progress: f32,
    pub swipe_edge: SwipeEdge,
    /// Animation target of the departing window, when one was resolved.
    pub target: Option<RemoteAnimationTarget>,
}

impl BackEvent {
    /// Create a back event, clamping `progress` into `[0.0, 1.0]`.
    ///
    /// A NaN progress is reported as `0.0`.
    #[must_use]
    pub fn new(
        touch_x: f32,
        touch_y: f32,
        progress: f32,
        swipe_edge: SwipeEdge,
        target: Option<RemoteAnimationTarget>,
    ) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        Self {
            touch_x,
            touch_y,
            progress,
            swipe_edge,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_actions() {
        assert!(MotionAction::Up.is_terminal());
        assert!(MotionAction::Cancel.is_terminal());
        assert!(!MotionAction::Move.is_terminal());
        assert!(!MotionAction::Down.is_terminal());
    }

    #[test]
    fn back_event_clamps_progress() {
        let high = BackEvent::new(0.0, 0.0, 5.0, SwipeEdge::Left, None);
        assert_eq!(high.progress, 1.0);
        let low = BackEvent::new(0.0, 0.0, -0.3, SwipeEdge::Left, None);
        assert_eq!(low.progress, 0.0);
        let nan = BackEvent::new(0.0, 0.0, f32::NAN, SwipeEdge::Right, None);
        assert_eq!(nan.progress, 0.0);
    }

    #[test]
    fn constructors_set_action() {
        assert_eq!(
            MotionEvent::moved(1.0, 2.0, SwipeEdge::Left).action,
            MotionAction::Move
        );
        assert_eq!(
            MotionEvent::cancel(1.0, 2.0, SwipeEdge::Right).action,
            MotionAction::Cancel
        );
        assert_eq!(SwipeEdge::default(), SwipeEdge::None);
    }
}
