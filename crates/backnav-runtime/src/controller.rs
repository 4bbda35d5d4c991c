#![forbid(unsafe_code)]

//! Back gesture animation coordinator.
//!
//! [`BackAnimationController`] turns a touch stream into back lifecycle
//! callbacks on whichever target is active, and produces exactly one final
//! commit-or-cancel decision per gesture.
//!
//! # State Machine
//!
//! ```text
//! Idle --Move(first)--> GestureActive --Up|Cancel--> Committing | Cancelling --> Idle
//! ```
//!
//! - **Idle → GestureActive**: the first move records the initial touch and
//!   asks the [`NavigationResolver`] for a target. `on_back_started` goes to
//!   the back-to-launcher binding for animated return-to-home gestures, and to
//!   the resolved target's own callback otherwise.
//! - **GestureActive → GestureActive**: later moves relay normalized progress.
//! - **GestureActive → Committing | Cancelling**: the terminal event relays
//!   the gesture owner's `trigger_back` as `on_back_invoked` or
//!   `on_back_cancelled`. Animated return-to-home gestures then hold the
//!   transition guard until the remote animation finishes; everything else
//!   cleans up immediately.
//!
//! # Invariants
//!
//! 1. Per gesture: `started` precedes every `progressed`, which precede
//!    exactly one of `invoked`/`cancelled`.
//! 2. While the transition guard is active, motion events are ignored.
//! 3. The guard always clears: on the remote finish signal or on timeout,
//!    whichever comes first; the later one is a no-op.
//! 4. Cleanup releases surfaces and reports the decision to the target's
//!    finish hook exactly once.
//!
//! # Failure Modes
//!
//! Nothing propagates out of the public entry points. Resolver failures end
//! the gesture silently, dispatch failures are logged and the gesture carries
//! on, a stale gesture is force-finished before the next one starts, and a
//! missing finish signal is covered by the watchdog. See [`BackFailure`].

use std::sync::{Arc, mpsc};

use web_time::Instant;

use backnav_core::{
    BackEvent, BackNavigationType, GestureSession, GestureThresholds, MotionAction, MotionEvent,
    RectF, RemoteAnimationTarget, ScreenshotBuffer,
};

use crate::config::BackConfig;
use crate::error::{BackFailure, DispatchPhase};
use crate::remote::{BackInvokedCallback, BackNavigationInfo, NavigationResolver};
use crate::runner::AnimationRunnerBinding;
use crate::settings::AnimationsEnabled;
use crate::surface::{Compositor, NoopCompositor, SurfaceId, SurfaceTransaction};

const LOG_TARGET: &str = "backnav.controller";

/// Wakes the executor that owns the controller when an asynchronous signal
/// lands in its inbox.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

// ---------------------------------------------------------------------------
// Public state
// ---------------------------------------------------------------------------

/// Coarse controller state, for hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    GestureActive,
    /// Committed; waiting for the remote animation to finish.
    Committing,
    /// Cancelled; waiting for the remote animation to finish.
    Cancelling,
}

/// Monotonic counters for one controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackStats {
    pub gestures_started: u64,
    pub invoked: u64,
    pub cancelled: u64,
    pub dispatch_failures: u64,
    pub resolution_failures: u64,
    pub stale_gestures: u64,
    pub transition_timeouts: u64,
}

impl BackStats {
    fn record(&mut self, failure: &BackFailure) {
        match failure {
            BackFailure::Resolution(_) => self.resolution_failures += 1,
            BackFailure::Dispatch { .. } => self.dispatch_failures += 1,
            BackFailure::StaleGesture => self.stale_gestures += 1,
            BackFailure::TransitionTimeout { .. } => self.transition_timeouts += 1,
        }
        tracing::warn!(target: LOG_TARGET, error = %failure, "back gesture failure");
    }
}

/// Time-bounded mutual exclusion between back transitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransitionGuard {
    deadline: Option<Instant>,
}

impl TransitionGuard {
    /// Activate the guard until `deadline` at the latest.
    pub fn start(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Deactivate the guard. Returns `true` if it was active.
    pub fn clear(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the watchdog should fire at `now`.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Asynchronous signals posted from remote threads.
#[derive(Debug)]
enum Signal {
    RemoteAnimationFinished { generation: u64 },
}

#[derive(Clone)]
struct SignalSender {
    tx: mpsc::Sender<Signal>,
    waker: Option<Waker>,
}

impl SignalSender {
    fn send(&self, signal: Signal) {
        if self.tx.send(signal).is_ok()
            && let Some(wake) = &self.waker
        {
            wake();
        }
    }
}

/// Resolved target state for the gesture in flight.
struct ActiveGesture {
    generation: u64,
    info: BackNavigationInfo,
    /// Callback receiving lifecycle events for this gesture.
    target: Option<Arc<dyn BackInvokedCallback>>,
    to_launcher: bool,
    screenshot_surface: Option<SurfaceId>,
    /// Terminal callback dispatched; waiting on the remote finish signal.
    awaiting_remote: bool,
    /// The remote finished before the gesture ended.
    remote_finished: bool,
}

enum Call<'a> {
    Started(&'a BackEvent),
    Progressed(&'a BackEvent),
    Invoked,
    Cancelled,
}

impl Call<'_> {
    fn phase(&self) -> DispatchPhase {
        match self {
            Self::Started(_) => DispatchPhase::Started,
            Self::Progressed(_) => DispatchPhase::Progressed,
            Self::Invoked => DispatchPhase::Invoked,
            Self::Cancelled => DispatchPhase::Cancelled,
        }
    }
}

/// Best-effort delivery: failures are counted and logged, never returned.
fn dispatch(stats: &mut BackStats, target: Option<&Arc<dyn BackInvokedCallback>>, call: Call<'_>) {
    let phase = call.phase();
    let Some(target) = target else {
        tracing::trace!(target: LOG_TARGET, phase = %phase, "no back callback to dispatch to");
        return;
    };
    let result = match call {
        Call::Started(event) => target.on_back_started(event),
        Call::Progressed(event) => target.on_back_progressed(event),
        Call::Invoked => target.on_back_invoked(),
        Call::Cancelled => target.on_back_cancelled(),
    };
    if let Err(source) = result {
        stats.record(&BackFailure::Dispatch { phase, source });
    }
}

// ---------------------------------------------------------------------------
// BackAnimationController
// ---------------------------------------------------------------------------

/// Coordinates one back gesture at a time.
///
/// All methods are meant to run on a single executor. Time is passed in
/// explicitly; call [`poll`](Self::poll) at [`next_deadline`](Self::next_deadline)
/// and whenever the [`Waker`] fires.
pub struct BackAnimationController {
    config: BackConfig,
    animations_enabled: AnimationsEnabled,
    resolver: Box<dyn NavigationResolver>,
    compositor: Arc<dyn Compositor>,

    session: GestureSession,
    active: Option<ActiveGesture>,
    generation: u64,

    launcher: Option<AnimationRunnerBinding>,
    guard: TransitionGuard,

    inbox_tx: mpsc::Sender<Signal>,
    inbox_rx: mpsc::Receiver<Signal>,
    waker: Option<Waker>,

    stats: BackStats,
}

impl std::fmt::Debug for BackAnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackAnimationController")
            .field("state", &self.state())
            .field("generation", &self.generation)
            .field("launcher_registered", &self.launcher.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

impl BackAnimationController {
    /// Create a controller with its own animation flag seeded from `config`.
    #[must_use]
    pub fn new(config: BackConfig, resolver: Box<dyn NavigationResolver>) -> Self {
        let animations_enabled = AnimationsEnabled::new(config.animations_enabled);
        let (inbox_tx, inbox_rx) = mpsc::channel();
        Self {
            config,
            animations_enabled,
            resolver,
            compositor: Arc::new(NoopCompositor),
            session: GestureSession::new(),
            active: None,
            generation: 0,
            launcher: None,
            guard: TransitionGuard::default(),
            inbox_tx,
            inbox_rx,
            waker: None,
            stats: BackStats::default(),
        }
    }

    /// Use `compositor` for screenshot surfaces.
    #[must_use]
    pub fn with_compositor(mut self, compositor: Arc<dyn Compositor>) -> Self {
        self.compositor = compositor;
        self
    }

    /// Share an externally observed animation flag (see
    /// [`SettingObserver`](crate::settings::SettingObserver)).
    #[must_use]
    pub fn with_animations_flag(mut self, flag: AnimationsEnabled) -> Self {
        self.animations_enabled = flag;
        self
    }

    /// Handle to the animation flag read at every gesture start.
    #[must_use]
    pub fn animations_flag(&self) -> AnimationsEnabled {
        self.animations_enabled.clone()
    }

    /// Install the executor wake-up hook.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    #[must_use]
    pub fn config(&self) -> &BackConfig {
        &self.config
    }

    /// Swap in a new configuration. An in-flight gesture keeps its target;
    /// a new timeout applies from the next transition.
    pub fn reload_config(&mut self, config: BackConfig) {
        tracing::info!(
            target: LOG_TARGET,
            progress_threshold = config.effective_progress_threshold(),
            animations_enabled = config.animations_enabled,
            timeout_ms = config.transition_timeout.as_millis() as u64,
            "back config reloaded"
        );
        self.animations_enabled.set(config.animations_enabled);
        self.config = config;
    }

    #[must_use]
    pub fn stats(&self) -> BackStats {
        self.stats
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        match &self.active {
            None => ControllerState::Idle,
            Some(active) if !active.awaiting_remote => ControllerState::GestureActive,
            Some(_) if self.session.trigger_back() => ControllerState::Committing,
            Some(_) => ControllerState::Cancelling,
        }
    }

    /// Whether a transition holds the guard.
    #[inline]
    #[must_use]
    pub fn is_transition_in_progress(&self) -> bool {
        self.guard.is_active()
    }

    /// When [`poll`](Self::poll) must run next, if anything is scheduled.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.guard.deadline()
    }

    /// Registered back-to-launcher binding, if any.
    #[must_use]
    pub fn launcher_binding(&self) -> Option<&AnimationRunnerBinding> {
        self.launcher.as_ref()
    }

    // -- Entry points --------------------------------------------------------

    /// Feed one touch sample.
    pub fn on_motion_event(&mut self, event: MotionEvent, now: Instant) {
        self.poll(now);

        if self.guard.is_active() {
            tracing::trace!(
                target: LOG_TARGET,
                action = ?event.action,
                "transition in progress, ignoring motion"
            );
            return;
        }

        match event.action {
            MotionAction::Down => {
                if self.session.is_started() {
                    // The previous gesture never saw Up/Cancel; its intent
                    // must not leak into the next one.
                    self.session.end();
                    self.session.set_trigger_back(false);
                }
            }
            MotionAction::Move => {
                if self.session.is_started() {
                    self.on_move(&event);
                } else {
                    self.on_gesture_started(&event);
                }
            }
            MotionAction::Up | MotionAction::Cancel => self.on_gesture_finished(now),
        }
    }

    /// Record the gesture owner's commit intent. Ignored during a transition.
    pub fn set_trigger_back(&mut self, trigger_back: bool) {
        if self.guard.is_active() {
            tracing::debug!(
                target: LOG_TARGET,
                trigger_back,
                "transition in progress, ignoring trigger update"
            );
            return;
        }
        self.session.set_trigger_back(trigger_back);
    }

    pub fn set_swipe_thresholds(&mut self, trigger: f32, progress: f32) {
        self.config.thresholds = GestureThresholds::new(trigger, progress);
    }

    /// Register the launcher's callback and runner for return-to-home.
    pub fn set_back_to_launcher_callback(&mut self, binding: AnimationRunnerBinding) {
        tracing::debug!(target: LOG_TARGET, "back-to-launcher binding registered");
        self.launcher = Some(binding);
    }

    pub fn clear_back_to_launcher_callback(&mut self) {
        if self.launcher.take().is_some() {
            tracing::debug!(target: LOG_TARGET, "back-to-launcher binding cleared");
        }
    }

    /// The launcher's own signal that its return-to-home animation is done.
    ///
    /// A no-op when no transition is pending, so a signal arriving after the
    /// watchdog already cleaned up is harmless.
    pub fn on_back_to_launcher_animation_finished(&mut self, now: Instant) {
        self.drain_inbox();
        if !self.guard.is_active() {
            tracing::debug!(
                target: LOG_TARGET,
                "launcher animation finished with no transition pending"
            );
            return;
        }
        tracing::debug!(target: LOG_TARGET, ?now, "launcher animation finished");
        let committed = self.session.trigger_back();
        self.finish_back_navigation(committed);
    }

    /// The remote's acknowledgement that its animation can start.
    ///
    /// Dropped when no start is pending or the gesture was already cancelled.
    pub fn on_animation_start(
        &mut self,
        apps: &[RemoteAnimationTarget],
        wallpapers: &[RemoteAnimationTarget],
        non_apps: &[RemoteAnimationTarget],
    ) {
        let generation = self
            .active
            .as_ref()
            .map_or(self.generation, |active| active.generation);
        let sender = self.signal_sender();

        let Some(binding) = self.launcher.as_mut() else {
            tracing::debug!(target: LOG_TARGET, "animation start with no launcher binding");
            return;
        };
        if binding.is_animation_cancelled() {
            tracing::debug!(target: LOG_TARGET, "dropping animation start after cancel");
            return;
        }
        if !binding.is_waiting_animation() {
            tracing::debug!(target: LOG_TARGET, "dropping unexpected animation start");
            return;
        }

        let started = binding.start_animation(apps, wallpapers, non_apps, move || {
            sender.send(Signal::RemoteAnimationFinished { generation });
        });

        if let Err(source) = started {
            self.stats.record(&BackFailure::Dispatch {
                phase: DispatchPhase::AnimationStart,
                source,
            });
            // No remote animation will report back; don't wait for one.
            self.on_remote_animation_finished(generation);
        }
    }

    /// Drain asynchronous signals and fire the watchdog if it is due.
    pub fn poll(&mut self, now: Instant) {
        self.drain_inbox();
        if self.guard.is_expired(now) {
            self.stats.record(&BackFailure::TransitionTimeout {
                timeout_ms: self.config.transition_timeout.as_millis() as u64,
            });
            let committed = self.session.trigger_back();
            self.finish_back_navigation(committed);
        }
    }

    // -- Gesture handling ----------------------------------------------------

    fn on_gesture_started(&mut self, event: &MotionEvent) {
        if self.active.is_some() {
            self.stats.record(&BackFailure::StaleGesture);
            // The stale target never saw a terminal callback: report cancel,
            // and keep any intent already set for the new gesture.
            let pending = self.session.trigger_back();
            self.finish_back_navigation(false);
            self.session.set_trigger_back(pending);
        }

        self.session.begin(event);
        self.generation += 1;
        let request_animation = self.animations_enabled.get();

        let info = match self.resolver.start_back_navigation(request_animation) {
            Ok(Some(info)) => info,
            Ok(None) => {
                self.stats
                    .record(&BackFailure::Resolution("no back target resolved".into()));
                self.finish_back_navigation(false);
                return;
            }
            Err(err) => {
                self.stats.record(&BackFailure::Resolution(err.to_string()));
                self.finish_back_navigation(false);
                return;
            }
        };

        let kind = info.kind();
        let launcher_callback = match self.launcher.as_mut() {
            Some(binding) if kind == BackNavigationType::ReturnToHome && request_animation => {
                binding.start_gesture();
                Some(binding.callback().clone())
            }
            _ => None,
        };
        let to_launcher = launcher_callback.is_some();

        let screenshot_surface = match info.screenshot() {
            Some((buffer, window)) if kind == BackNavigationType::CrossActivity => {
                self.show_screenshot(buffer, window)
            }
            _ => None,
        };

        let target = launcher_callback.or_else(|| info.callback().cloned());
        let started = BackEvent::new(
            event.x,
            event.y,
            0.0,
            event.edge,
            info.animation_target().cloned(),
        );

        self.stats.gestures_started += 1;
        tracing::debug!(
            target: LOG_TARGET,
            generation = self.generation,
            kind = %kind,
            request_animation,
            to_launcher,
            "back gesture started"
        );

        dispatch(&mut self.stats, target.as_ref(), Call::Started(&started));
        self.active = Some(ActiveGesture {
            generation: self.generation,
            info,
            target,
            to_launcher,
            screenshot_surface,
            awaiting_remote: false,
            remote_finished: false,
        });
    }

    fn on_move(&mut self, event: &MotionEvent) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let threshold = self.config.effective_progress_threshold();
        let progressed =
            self.session
                .back_event(event, threshold, active.info.animation_target().cloned());
        dispatch(
            &mut self.stats,
            active.target.as_ref(),
            Call::Progressed(&progressed),
        );
    }

    fn on_gesture_finished(&mut self, now: Instant) {
        self.session.end();
        let trigger_back = self.session.trigger_back();
        let Some(active) = self.active.as_mut() else {
            self.session.reset();
            return;
        };

        // The launcher only keeps the gesture if it is still registered and
        // animations are still on; otherwise fall back to the app's callback.
        if active.to_launcher && (self.launcher.is_none() || !self.animations_enabled.get()) {
            tracing::debug!(
                target: LOG_TARGET,
                generation = active.generation,
                launcher_registered = self.launcher.is_some(),
                "back-to-launcher no longer applies, finishing on the app callback"
            );
            active.to_launcher = false;
            active.target = active.info.callback().cloned();
        }

        if active.to_launcher
            && !trigger_back
            && let Some(binding) = self.launcher.as_mut()
            && binding.is_waiting_animation()
        {
            binding.cancel_animation();
        }

        if trigger_back {
            self.stats.invoked += 1;
            dispatch(&mut self.stats, active.target.as_ref(), Call::Invoked);
        } else {
            self.stats.cancelled += 1;
            dispatch(&mut self.stats, active.target.as_ref(), Call::Cancelled);
        }

        if active.to_launcher && !active.remote_finished {
            active.awaiting_remote = true;
            self.guard.start(now + self.config.transition_timeout);
            tracing::debug!(
                target: LOG_TARGET,
                generation = active.generation,
                trigger_back,
                "waiting for remote back animation"
            );
        } else {
            self.finish_back_navigation(trigger_back);
        }
    }

    /// Release surfaces, clear the guard, report `committed`, go Idle.
    fn finish_back_navigation(&mut self, committed: bool) {
        self.guard.clear();

        if let Some(binding) = self.launcher.as_mut()
            && binding.is_waiting_animation()
        {
            binding.cancel_animation();
        }

        if let Some(mut active) = self.active.take() {
            if let Some(surface) = active.screenshot_surface
                && let Err(source) = self
                    .compositor
                    .apply(SurfaceTransaction::new().remove(surface))
            {
                self.stats.record(&BackFailure::Dispatch {
                    phase: DispatchPhase::Surface,
                    source,
                });
            }
            active.info.on_back_navigation_finished(committed);
            tracing::debug!(
                target: LOG_TARGET,
                generation = active.generation,
                committed,
                "back navigation finished"
            );
        }

        self.session.reset();
    }

    fn show_screenshot(&mut self, buffer: ScreenshotBuffer, window: RectF) -> Option<SurfaceId> {
        let surface = match self.compositor.create_surface("back-screenshot") {
            Ok(surface) => surface,
            Err(source) => {
                self.stats.record(&BackFailure::Dispatch {
                    phase: DispatchPhase::Surface,
                    source,
                });
                return None;
            }
        };
        let (sx, sy) = buffer.bounds().scale_to(window);
        let txn = SurfaceTransaction::new()
            .set_buffer(surface, buffer)
            .set_scale(surface, sx, sy)
            .set_position(surface, window.x, window.y)
            .show(surface);
        if let Err(source) = self.compositor.apply(txn) {
            self.stats.record(&BackFailure::Dispatch {
                phase: DispatchPhase::Surface,
                source,
            });
        }
        Some(surface)
    }

    // -- Inbox ---------------------------------------------------------------

    fn signal_sender(&self) -> SignalSender {
        SignalSender {
            tx: self.inbox_tx.clone(),
            waker: self.waker.clone(),
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(signal) = self.inbox_rx.try_recv() {
            match signal {
                Signal::RemoteAnimationFinished { generation } => {
                    self.on_remote_animation_finished(generation);
                }
            }
        }
    }

    fn on_remote_animation_finished(&mut self, generation: u64) {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.generation == generation)
        else {
            tracing::debug!(
                target: LOG_TARGET,
                generation,
                "ignoring finish signal for a completed gesture"
            );
            return;
        };
        if active.awaiting_remote {
            let committed = self.session.trigger_back();
            self.finish_back_navigation(committed);
        } else {
            active.remote_finished = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
