#![forbid(unsafe_code)]

//! Back gesture tracking: thresholds and per-gesture session state.
//!
//! [`GestureSession`] holds what one physical back swipe needs between its
//! first `Move` and its terminal `Up`/`Cancel`: where it started, whether the
//! gesture owner currently intends to commit, and how far along it is.
//!
//! # Invariants
//!
//! 1. Progress is always within `[0.0, 1.0]` regardless of touch delta.
//! 2. Progress depends only on horizontal displacement from the initial touch.
//! 3. After `reset()`, the session is indistinguishable from a new one.
//! 4. `trigger_back` is never derived from progress here; only the gesture
//!    owner sets it.
//!
//! # Failure Modes
//!
//! - A non-positive progress threshold reports `1.0` for any non-zero
//!   displacement rather than dividing by zero.

use crate::event::{BackEvent, MotionEvent, SwipeEdge};
use crate::geometry::PointF;
use crate::target::RemoteAnimationTarget;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Distance thresholds for back gestures, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GestureThresholds {
    /// Distance beyond which commit becomes the default intent (default: 100).
    ///
    /// Interpreted by the gesture owner, not by the coordinator.
    pub trigger: f32,
    /// Distance that maps to a progress of 1.0 (default: 300).
    pub progress: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            trigger: 100.0,
            progress: 300.0,
        }
    }
}

impl GestureThresholds {
    /// Create thresholds from explicit distances.
    #[must_use]
    pub const fn new(trigger: f32, progress: f32) -> Self {
        Self { trigger, progress }
    }

    /// Progress threshold after applying a process-level override.
    ///
    /// The override wins only when it is non-negative.
    #[inline]
    #[must_use]
    pub fn effective_progress(&self, override_threshold: f32) -> f32 {
        if override_threshold >= 0.0 {
            override_threshold
        } else {
            self.progress
        }
    }
}

// ---------------------------------------------------------------------------
// GestureSession
// ---------------------------------------------------------------------------

/// Ephemeral state for one physical back gesture.
#[derive(Clone, Default)]
pub struct GestureSession {
    initial_touch: PointF,
    started: bool,
    trigger_back: bool,
    swipe_edge: SwipeEdge,
}

impl std::fmt::Debug for GestureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureSession")
            .field("started", &self.started)
            .field("trigger_back", &self.trigger_back)
            .finish()
    }
}

impl GestureSession {
    /// Create an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the first move of a gesture.
    pub fn begin(&mut self, event: &MotionEvent) {
        self.initial_touch = PointF::new(event.x, event.y);
        self.swipe_edge = event.edge;
        self.started = true;
        #[cfg(feature = "tracing")]
        tracing::trace!(
            x = event.x,
            y = event.y,
            edge = ?event.edge,
            "back gesture session started"
        );
    }

    /// Whether navigation resolution has been requested for this gesture.
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Mark the gesture boundary without discarding the trigger intent.
    ///
    /// The next move is treated as the first move of a new gesture.
    pub fn end(&mut self) {
        self.started = false;
    }

    #[inline]
    #[must_use]
    pub fn initial_touch(&self) -> PointF {
        self.initial_touch
    }

    #[inline]
    #[must_use]
    pub fn swipe_edge(&self) -> SwipeEdge {
        self.swipe_edge
    }

    #[inline]
    #[must_use]
    pub fn trigger_back(&self) -> bool {
        self.trigger_back
    }

    /// Update the gesture owner's current commit intent.
    pub fn set_trigger_back(&mut self, trigger_back: bool) {
        self.trigger_back = trigger_back;
    }

    /// Normalized progress for a touch at `x` given a progress threshold.
    #[must_use]
    pub fn progress_at(&self, x: f32, threshold: f32) -> f32 {
        let delta = PointF::new(x, self.initial_touch.y).horizontal_distance(self.initial_touch);
        if delta == 0.0 || delta.is_nan() {
            return 0.0;
        }
        if threshold <= 0.0 {
            return 1.0;
        }
        (delta / threshold).clamp(0.0, 1.0)
    }

    /// Build the progress event for a move sample.
    #[must_use]
    pub fn back_event(
        &self,
        event: &MotionEvent,
        threshold: f32,
        target: Option<RemoteAnimationTarget>,
    ) -> BackEvent {
        BackEvent::new(
            event.x,
            event.y,
            self.progress_at(event.x, threshold),
            event.edge,
            target,
        )
    }

    /// Return every field to its initial value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn started_at(x: f32, y: f32) -> GestureSession {
        let mut session = GestureSession::new();
        session.begin(&MotionEvent::moved(x, y, SwipeEdge::Left));
        session
    }

    #[test]
    fn default_thresholds() {
        let t = GestureThresholds::default();
        assert_eq!(t.trigger, 100.0);
        assert_eq!(t.progress, 300.0);
    }

    #[test]
    fn override_applies_only_when_non_negative() {
        let t = GestureThresholds::new(50.0, 300.0);
        assert_eq!(t.effective_progress(-1.0), 300.0);
        assert_eq!(t.effective_progress(0.0), 0.0);
        assert_eq!(t.effective_progress(120.0), 120.0);
    }

    #[test]
    fn progress_is_half_way() {
        let session = started_at(100.0, 200.0);
        assert_eq!(session.progress_at(250.0, 300.0), 0.5);
    }

    #[test]
    fn progress_clamps_at_one() {
        let session = started_at(500.0, 0.0);
        assert_eq!(session.progress_at(1500.0, 200.0), 1.0);
    }

    #[test]
    fn progress_uses_absolute_delta() {
        let session = started_at(500.0, 0.0);
        assert_eq!(session.progress_at(400.0, 200.0), 0.5);
    }

    #[test]
    fn zero_threshold_does_not_divide_by_zero() {
        let session = started_at(10.0, 0.0);
        assert_eq!(session.progress_at(10.0, 0.0), 0.0);
        assert_eq!(session.progress_at(11.0, 0.0), 1.0);
    }

    #[test]
    fn back_event_carries_touch_and_edge() {
        let session = started_at(100.0, 200.0);
        let ev = session.back_event(
            &MotionEvent::moved(250.0, 210.0, SwipeEdge::Right),
            300.0,
            None,
        );
        assert_eq!(ev.touch_x, 250.0);
        assert_eq!(ev.touch_y, 210.0);
        assert_eq!(ev.progress, 0.5);
        assert_eq!(ev.swipe_edge, SwipeEdge::Right);
        assert!(ev.target.is_none());
    }

    #[test]
    fn end_keeps_trigger_intent() {
        let mut session = started_at(0.0, 0.0);
        session.set_trigger_back(true);
        session.end();
        assert!(!session.is_started());
        assert!(session.trigger_back());
    }

    #[test]
    fn reset_clears_all_state() {
        let mut session = started_at(42.0, 7.0);
        session.set_trigger_back(true);
        session.reset();
        assert!(!session.is_started());
        assert!(!session.trigger_back());
        assert_eq!(session.initial_touch(), PointF::default());
        assert_eq!(session.swipe_edge(), SwipeEdge::None);
    }

    #[test]
    fn debug_format() {
        let dbg = format!("{:?}", GestureSession::new());
        assert!(dbg.contains("GestureSession"));
    }
}
