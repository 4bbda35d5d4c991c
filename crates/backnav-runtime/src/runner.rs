#![forbid(unsafe_code)]

//! Binding between a remote back callback and its animation runner.
//!
//! An [`AnimationRunnerBinding`] is registered once per "back to X"
//! integration (back-to-launcher today). It pairs the callback that hears
//! lifecycle events with the runner that plays the remote's own surface
//! animation, and polices the single in-flight start.
//!
//! # Invariants
//!
//! 1. At most one start is outstanding: `waiting` is a single flag.
//! 2. [`start_gesture`](AnimationRunnerBinding::start_gesture) always clears
//!    `cancelled`.
//! 3. `start_animation` forwards even after `cancel_animation`; callers that
//!    care must check [`is_animation_cancelled`](AnimationRunnerBinding::is_animation_cancelled).

use std::sync::Arc;

use backnav_core::RemoteAnimationTarget;

use crate::error::RemoteError;
use crate::remote::{BackInvokedCallback, FinishedCallback, RemoteAnimationRunner};

/// A remote callback handle paired with a remote runner handle.
pub struct AnimationRunnerBinding {
    callback: Arc<dyn BackInvokedCallback>,
    runner: Arc<dyn RemoteAnimationRunner>,
    waiting: bool,
    cancelled: bool,
}

impl std::fmt::Debug for AnimationRunnerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationRunnerBinding")
            .field("waiting", &self.waiting)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl AnimationRunnerBinding {
    #[must_use]
    pub fn new(
        callback: Arc<dyn BackInvokedCallback>,
        runner: Arc<dyn RemoteAnimationRunner>,
    ) -> Self {
        Self {
            callback,
            runner,
            waiting: false,
            cancelled: false,
        }
    }

    /// Callback handle receiving back lifecycle events.
    #[must_use]
    pub fn callback(&self) -> &Arc<dyn BackInvokedCallback> {
        &self.callback
    }

    /// Arm for a new gesture: a start is now expected.
    pub fn start_gesture(&mut self) {
        self.waiting = true;
        self.cancelled = false;
    }

    /// Forward the remote's targets to the runner.
    ///
    /// `on_finished` runs exactly once, when the runner signals completion.
    /// A failed remote call is logged and returned; the waiting flag is
    /// cleared either way.
    pub fn start_animation(
        &mut self,
        apps: &[RemoteAnimationTarget],
        wallpapers: &[RemoteAnimationTarget],
        non_apps: &[RemoteAnimationTarget],
        on_finished: impl FnOnce() + Send + 'static,
    ) -> Result<(), RemoteError> {
        self.waiting = false;
        let finished = FinishedCallback::new(on_finished);
        self.runner
            .on_animation_start(apps, wallpapers, non_apps, finished)
            .inspect_err(|err| {
                tracing::warn!(
                    target: "backnav.runner",
                    error = %err,
                    "failed to start remote back animation"
                );
            })
    }

    /// The gesture ended before the remote acknowledged the start.
    pub fn cancel_animation(&mut self) {
        self.waiting = false;
        self.cancelled = true;
    }

    #[inline]
    #[must_use]
    pub fn is_waiting_animation(&self) -> bool {
        self.waiting
    }

    #[inline]
    #[must_use]
    pub fn is_animation_cancelled(&self) -> bool {
        self.cancelled
    }
}
