#![forbid(unsafe_code)]

//! Live observation of the "animate back" setting.
//!
//! A persisted toggle decides whether gesture starts request a remote
//! animation. [`SettingObserver`] watches it on a background thread and
//! publishes the latest value into an [`AnimationsEnabled`] flag. The
//! observer never touches controller state; the controller reads the flag
//! on its own executor when a gesture starts.
//!
//! # How it works
//!
//! 1. The host's settings layer calls [`SettingNotifier::notify_change`]
//!    whenever the setting may have changed.
//! 2. The observer thread wakes, coalesces queued notifications, re-reads
//!    the [`SettingSource`], and stores the result.
//! 3. [`SettingObserver::stop`] signals the thread and joins it.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

/// Shared, lock-free view of the animation toggle.
#[derive(Debug, Clone, Default)]
pub struct AnimationsEnabled {
    inner: Arc<AtomicBool>,
}

impl AnimationsEnabled {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Arc::new(AtomicBool::new(enabled)),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    /// Store a new value, returning the previous one.
    pub fn set(&self, enabled: bool) -> bool {
        self.inner.swap(enabled, Ordering::AcqRel)
    }
}

/// Backing store for the persisted toggle.
pub trait SettingSource: Send + Sync + 'static {
    /// Current value, or `None` when the setting is unset.
    fn read(&self) -> Option<bool>;
}

/// Stop flag shared between the observer and its thread.
///
/// The thread only blocks on the notification channel, so stopping sets the
/// flag and then sends one notification to wake it.
#[derive(Debug, Clone, Default)]
pub(crate) struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Change notification handle held by the host settings layer.
#[derive(Debug, Clone)]
pub struct SettingNotifier {
    tx: mpsc::Sender<()>,
}

impl SettingNotifier {
    /// Ask the observer to re-read the setting. Returns `false` once the
    /// observer has shut down.
    pub fn notify_change(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Background observer publishing the setting into an [`AnimationsEnabled`].
pub struct SettingObserver {
    stop: StopSignal,
    notifier: SettingNotifier,
    thread: Option<thread::JoinHandle<()>>,
}

impl SettingObserver {
    /// Read the setting once, then keep `flag` current on a background thread.
    pub fn spawn(source: Arc<dyn SettingSource>, flag: AnimationsEnabled) -> io::Result<Self> {
        refresh(source.as_ref(), &flag);

        let (tx, rx) = mpsc::channel();
        let stop = StopSignal::new();
        let signal = stop.clone();
        let thread = thread::Builder::new()
            .name("backnav-settings".into())
            .spawn(move || observe_loop(source, flag, rx, signal))?;

        Ok(Self {
            stop,
            notifier: SettingNotifier { tx },
            thread: Some(thread),
        })
    }

    #[must_use]
    pub fn notifier(&self) -> SettingNotifier {
        self.notifier.clone()
    }

    /// Stop the observer and join its thread.
    pub fn stop(mut self) {
        self.stop.stop();
        self.notifier.notify_change();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SettingObserver {
    fn drop(&mut self) {
        self.stop.stop();
        self.notifier.notify_change();
        // Don't join in drop to avoid blocking
    }
}

fn observe_loop(
    source: Arc<dyn SettingSource>,
    flag: AnimationsEnabled,
    rx: mpsc::Receiver<()>,
    stop: StopSignal,
) {
    while rx.recv().is_ok() {
        if stop.is_stopped() {
            break;
        }
        // Coalesce bursts into a single read.
        while rx.try_recv().is_ok() {}
        refresh(source.as_ref(), &flag);
    }
    tracing::debug!(target: "backnav.settings", "setting observer stopped");
}

fn refresh(source: &dyn SettingSource, flag: &AnimationsEnabled) {
    match source.read() {
        Some(enabled) => {
            let previous = flag.set(enabled);
            if previous != enabled {
                tracing::info!(
                    target: "backnav.settings",
                    enabled,
                    "back animation setting changed"
                );
            }
        }
        None => {
            tracing::debug!(
                target: "backnav.settings",
                enabled = flag.get(),
                "back animation setting unset, keeping current value"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    struct FakeSetting(Mutex<Option<bool>>);

    impl FakeSetting {
        fn new(value: Option<bool>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(value)))
        }

        fn put(&self, value: Option<bool>) {
            *self.0.lock().unwrap() = value;
        }
    }

    impl SettingSource for FakeSetting {
        fn read(&self) -> Option<bool> {
            *self.0.lock().unwrap()
        }
    }

    fn wait_for(flag: &AnimationsEnabled, expected: bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if flag.get() == expected {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn flag_set_returns_previous() {
        let flag = AnimationsEnabled::new(false);
        assert!(!flag.set(true));
        assert!(flag.get());
        let clone = flag.clone();
        clone.set(false);
        assert!(!flag.get());
    }

    #[test]
    fn spawn_reads_initial_value() {
        let flag = AnimationsEnabled::new(false);
        let observer = SettingObserver::spawn(FakeSetting::new(Some(true)), flag.clone()).unwrap();
        assert!(flag.get());
        observer.stop();
    }

    #[test]
    fn change_notification_updates_flag() {
        let setting = FakeSetting::new(Some(false));
        let flag = AnimationsEnabled::new(true);
        let observer = SettingObserver::spawn(setting.clone(), flag.clone()).unwrap();
        assert!(!flag.get());

        setting.put(Some(true));
        assert!(observer.notifier().notify_change());
        assert!(wait_for(&flag, true));

        setting.put(Some(false));
        observer.notifier().notify_change();
        assert!(wait_for(&flag, false));
        observer.stop();
    }

    #[test]
    fn unset_setting_keeps_current_value() {
        let flag = AnimationsEnabled::new(true);
        let observer = SettingObserver::spawn(FakeSetting::new(None), flag.clone()).unwrap();
        assert!(flag.get());
        observer.stop();
    }

    #[test]
    fn notifier_reports_shutdown() {
        let flag = AnimationsEnabled::new(false);
        let observer = SettingObserver::spawn(FakeSetting::new(None), flag).unwrap();
        let notifier = observer.notifier();
        observer.stop();
        assert!(!notifier.notify_change());
    }

    #[test]
    fn stop_signal_is_shared_across_clones() {
        let signal = StopSignal::new();
        let observed = signal.clone();
        assert!(!observed.is_stopped());
        signal.stop();
        assert!(observed.is_stopped());
    }

    #[test]
    fn stop_joins_idle_observer_promptly() {
        let flag = AnimationsEnabled::new(false);
        let observer = SettingObserver::spawn(FakeSetting::new(Some(false)), flag).unwrap();
        let started = Instant::now();
        observer.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn stopped_loop_skips_pending_reads() {
        let setting = FakeSetting::new(Some(true));
        let flag = AnimationsEnabled::new(false);
        let (tx, rx) = mpsc::channel();
        let signal = StopSignal::new();
        signal.stop();
        tx.send(()).unwrap();
        drop(tx);

        observe_loop(setting, flag.clone(), rx, signal);
        assert!(!flag.get());
    }
}
