#![forbid(unsafe_code)]

//! Remote collaborator interfaces.
//!
//! Each trait stands in for a cross-process interface: a back-invoked
//! callback living in an app or launcher, a remote surface animation runner,
//! and the window manager's navigation resolver. Implementations may be
//! in-process objects or RPC stubs; either way a broken call surfaces as a
//! [`RemoteError`] and never as a panic.

use std::sync::{Arc, Mutex};

use backnav_core::{BackEvent, BackNavigationType, RectF, RemoteAnimationTarget, ScreenshotBuffer};

use crate::error::RemoteError;

/// Receives back lifecycle callbacks for one back target.
pub trait BackInvokedCallback: Send + Sync {
    fn on_back_started(&self, event: &BackEvent) -> Result<(), RemoteError>;
    fn on_back_progressed(&self, event: &BackEvent) -> Result<(), RemoteError>;
    fn on_back_invoked(&self) -> Result<(), RemoteError>;
    fn on_back_cancelled(&self) -> Result<(), RemoteError>;
}

/// Drives a remote party's own surface animation.
pub trait RemoteAnimationRunner: Send + Sync {
    /// Start animating the given targets; call `finished` once done.
    fn on_animation_start(
        &self,
        apps: &[RemoteAnimationTarget],
        wallpapers: &[RemoteAnimationTarget],
        non_apps: &[RemoteAnimationTarget],
        finished: FinishedCallback,
    ) -> Result<(), RemoteError>;
}

/// Resolves what a back gesture should navigate to.
pub trait NavigationResolver: Send {
    /// Returns `Ok(None)` when there is nothing to navigate back to.
    fn start_back_navigation(
        &self,
        request_animation: bool,
    ) -> Result<Option<BackNavigationInfo>, RemoteError>;
}

impl<T: NavigationResolver + Sync + ?Sized> NavigationResolver for Arc<T> {
    fn start_back_navigation(
        &self,
        request_animation: bool,
    ) -> Result<Option<BackNavigationInfo>, RemoteError> {
        (**self).start_back_navigation(request_animation)
    }
}

type FinishedFn = Box<dyn FnOnce() + Send>;

/// Completion handle given to a remote runner.
///
/// Clones share one underlying closure, which runs at most once no matter
/// how many clones call [`finish`](Self::finish).
#[derive(Clone)]
pub struct FinishedCallback {
    inner: Arc<Mutex<Option<FinishedFn>>>,
}

impl FinishedCallback {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::new(f)))),
        }
    }

    /// Signal completion. Returns `true` if this call ran the closure.
    pub fn finish(&self) -> bool {
        let f = self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match f {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }

    /// Whether completion has already been signalled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

impl std::fmt::Debug for FinishedCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinishedCallback")
            .field("finished", &self.is_finished())
            .finish()
    }
}

type NavigationFinishedHook = Box<dyn FnOnce(bool) + Send>;

/// Resolved back target: what kind of back this is and what it needs.
pub struct BackNavigationInfo {
    kind: BackNavigationType,
    screenshot: Option<(ScreenshotBuffer, RectF)>,
    animation_target: Option<RemoteAnimationTarget>,
    callback: Option<Arc<dyn BackInvokedCallback>>,
    on_finished: Option<NavigationFinishedHook>,
}

impl BackNavigationInfo {
    #[must_use]
    pub fn new(kind: BackNavigationType) -> Self {
        Self {
            kind,
            screenshot: None,
            animation_target: None,
            callback: None,
            on_finished: None,
        }
    }

    /// Attach a screenshot and the bounds of the window it was taken from.
    #[must_use]
    pub fn with_screenshot(mut self, buffer: ScreenshotBuffer, window_bounds: RectF) -> Self {
        self.screenshot = Some((buffer, window_bounds));
        self
    }

    #[must_use]
    pub fn with_animation_target(mut self, target: RemoteAnimationTarget) -> Self {
        self.animation_target = Some(target);
        self
    }

    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn BackInvokedCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Hook run once when back navigation finishes, with the commit decision.
    #[must_use]
    pub fn with_finished_hook(mut self, hook: impl FnOnce(bool) + Send + 'static) -> Self {
        self.on_finished = Some(Box::new(hook));
        self
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> BackNavigationType {
        self.kind
    }

    #[must_use]
    pub fn screenshot(&self) -> Option<(ScreenshotBuffer, RectF)> {
        self.screenshot
    }

    #[must_use]
    pub fn animation_target(&self) -> Option<&RemoteAnimationTarget> {
        self.animation_target.as_ref()
    }

    #[must_use]
    pub fn callback(&self) -> Option<&Arc<dyn BackInvokedCallback>> {
        self.callback.as_ref()
    }

    /// Report the final decision to the resolver side. Runs at most once.
    pub fn on_back_navigation_finished(&mut self, committed: bool) {
        if let Some(hook) = self.on_finished.take() {
            hook(committed);
        }
    }
}

impl std::fmt::Debug for BackNavigationInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackNavigationInfo")
            .field("kind", &self.kind)
            .field("screenshot", &self.screenshot.map(|(b, _)| b.id))
            .field("has_animation_target", &self.animation_target.is_some())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn finished_callback_runs_once_across_clones() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let cb = FinishedCallback::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let clone = cb.clone();
        assert!(!cb.is_finished());
        assert!(clone.finish());
        assert!(!cb.finish());
        assert!(cb.is_finished());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finished_hook_runs_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let mut info = BackNavigationInfo::new(BackNavigationType::CrossTask)
            .with_finished_hook(move |committed| s.lock().unwrap().push(committed));
        info.on_back_navigation_finished(true);
        info.on_back_navigation_finished(false);
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn builder_populates_fields() {
        let target = RemoteAnimationTarget::new(
            3,
            backnav_core::TargetMode::Closing,
            RectF::from_size(100.0, 200.0),
        );
        let info = BackNavigationInfo::new(BackNavigationType::CrossActivity)
            .with_screenshot(
                ScreenshotBuffer::new(9, 50, 100),
                RectF::from_size(100.0, 200.0),
            )
            .with_animation_target(target.clone());
        assert_eq!(info.kind(), BackNavigationType::CrossActivity);
        assert_eq!(info.screenshot().map(|(b, _)| b.id), Some(9));
        assert_eq!(info.animation_target(), Some(&target));
        assert!(info.callback().is_none());
        assert!(format!("{info:?}").contains("CrossActivity"));
    }
}
