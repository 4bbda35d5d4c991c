#![forbid(unsafe_code)]

//! Recording fakes for the remote interfaces.
//!
//! Hosts use these to exercise the coordinator without a window manager or
//! launcher; the crate's own tests use them throughout.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use backnav_core::{BackEvent, BackNavigationType, RemoteAnimationTarget};

use crate::error::RemoteError;
use crate::remote::{
    BackInvokedCallback, BackNavigationInfo, FinishedCallback, NavigationResolver,
    RemoteAnimationRunner,
};
use crate::surface::{Compositor, SurfaceId, SurfaceTransaction};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// One delivered lifecycle callback.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackCall {
    Started(BackEvent),
    Progressed(BackEvent),
    Invoked,
    Cancelled,
}

/// Back callback that records every successfully delivered call.
#[derive(Debug, Default)]
pub struct RecordingCallback {
    calls: Mutex<Vec<CallbackCall>>,
    dead: AtomicBool,
}

impl RecordingCallback {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent call fail with a dead-object error.
    pub fn set_dead(&self, dead: bool) {
        self.dead.store(dead, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<CallbackCall> {
        lock(&self.calls).clone()
    }

    /// Progress values of every delivered `Progressed` call, in order.
    #[must_use]
    pub fn progress(&self) -> Vec<f32> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                CallbackCall::Progressed(ev) => Some(ev.progress),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn count(&self, pred: impl Fn(&CallbackCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: CallbackCall) -> Result<(), RemoteError> {
        if self.dead.load(Ordering::SeqCst) {
            return Err(RemoteError::dead("IOnBackInvokedCallback"));
        }
        lock(&self.calls).push(call);
        Ok(())
    }
}

impl BackInvokedCallback for RecordingCallback {
    fn on_back_started(&self, event: &BackEvent) -> Result<(), RemoteError> {
        self.record(CallbackCall::Started(event.clone()))
    }

    fn on_back_progressed(&self, event: &BackEvent) -> Result<(), RemoteError> {
        self.record(CallbackCall::Progressed(event.clone()))
    }

    fn on_back_invoked(&self) -> Result<(), RemoteError> {
        self.record(CallbackCall::Invoked)
    }

    fn on_back_cancelled(&self) -> Result<(), RemoteError> {
        self.record(CallbackCall::Cancelled)
    }
}

/// Animation runner that stashes finish callbacks for the test to fire.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pending: Mutex<Vec<FinishedCallback>>,
    starts: AtomicU64,
    dead: AtomicBool,
}

impl RecordingRunner {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_dead(&self, dead: bool) {
        self.dead.store(dead, Ordering::SeqCst);
    }

    /// Number of start requests received, including failed ones.
    #[must_use]
    pub fn starts(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Finish the most recently started animation.
    pub fn finish_last(&self) -> bool {
        let last = lock(&self.pending).pop();
        last.is_some_and(|cb| cb.finish())
    }
}

impl RemoteAnimationRunner for RecordingRunner {
    fn on_animation_start(
        &self,
        _apps: &[RemoteAnimationTarget],
        _wallpapers: &[RemoteAnimationTarget],
        _non_apps: &[RemoteAnimationTarget],
        finished: FinishedCallback,
    ) -> Result<(), RemoteError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.dead.load(Ordering::SeqCst) {
            return Err(RemoteError::dead("IRemoteAnimationRunner"));
        }
        lock(&self.pending).push(finished);
        Ok(())
    }
}

type Scripted = Result<Option<BackNavigationInfo>, RemoteError>;

/// Resolver that replays scripted answers, then falls back to a default
/// target whose finish hook is recorded.
pub struct ScriptedResolver {
    script: Mutex<VecDeque<Scripted>>,
    default_kind: Option<BackNavigationType>,
    default_callback: Mutex<Option<Arc<dyn BackInvokedCallback>>>,
    requests: Mutex<Vec<bool>>,
    finished: Arc<Mutex<Vec<bool>>>,
}

impl std::fmt::Debug for ScriptedResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedResolver")
            .field("scripted", &lock(&self.script).len())
            .field("default_kind", &self.default_kind)
            .finish()
    }
}

impl ScriptedResolver {
    /// Resolver answering every request with `kind`, dispatching to `callback`.
    #[must_use]
    pub fn new(kind: BackNavigationType, callback: Arc<dyn BackInvokedCallback>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            default_kind: Some(kind),
            default_callback: Mutex::new(Some(callback)),
            requests: Mutex::new(Vec::new()),
            finished: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Resolver that finds nothing to navigate back to.
    #[must_use]
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            default_kind: None,
            default_callback: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            finished: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Queue a one-off answer ahead of the default.
    pub fn push(&self, answer: Scripted) {
        lock(&self.script).push_back(answer);
    }

    /// `request_animation` values of every call so far.
    #[must_use]
    pub fn requests(&self) -> Vec<bool> {
        lock(&self.requests).clone()
    }

    /// Commit decisions reported to default targets' finish hooks.
    #[must_use]
    pub fn finished(&self) -> Vec<bool> {
        lock(&self.finished).clone()
    }
}

impl NavigationResolver for ScriptedResolver {
    fn start_back_navigation(&self, request_animation: bool) -> Scripted {
        lock(&self.requests).push(request_animation);
        if let Some(answer) = lock(&self.script).pop_front() {
            return answer;
        }
        let Some(kind) = self.default_kind else {
            return Ok(None);
        };
        let finished = self.finished.clone();
        let mut info = BackNavigationInfo::new(kind)
            .with_finished_hook(move |committed| lock(&finished).push(committed));
        if let Some(callback) = lock(&self.default_callback).clone() {
            info = info.with_callback(callback);
        }
        Ok(Some(info))
    }
}

/// Compositor that records every applied transaction.
#[derive(Debug, Default)]
pub struct RecordingCompositor {
    next_id: AtomicU64,
    applied: Mutex<Vec<SurfaceTransaction>>,
    dead: AtomicBool,
}

impl RecordingCompositor {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_dead(&self, dead: bool) {
        self.dead.store(dead, Ordering::SeqCst);
    }

    #[must_use]
    pub fn applied(&self) -> Vec<SurfaceTransaction> {
        lock(&self.applied).clone()
    }
}

impl Compositor for RecordingCompositor {
    fn create_surface(&self, _name: &str) -> Result<SurfaceId, RemoteError> {
        if self.dead.load(Ordering::SeqCst) {
            return Err(RemoteError::dead("SurfaceComposer"));
        }
        Ok(SurfaceId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn apply(&self, transaction: SurfaceTransaction) -> Result<(), RemoteError> {
        if self.dead.load(Ordering::SeqCst) {
            return Err(RemoteError::dead("SurfaceComposer"));
        }
        lock(&self.applied).push(transaction);
        Ok(())
    }
}
