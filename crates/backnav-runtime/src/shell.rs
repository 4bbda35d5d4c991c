#![forbid(unsafe_code)]

//! Dedicated executor thread for a [`BackAnimationController`].
//!
//! [`BackAnimationShell`] moves the controller onto its own thread so every
//! entry point, remote finish signal, and watchdog expiry is handled in one
//! serial order. Other threads talk to it through the cloneable
//! [`BackAnimation`] handle.
//!
//! # Scheduling
//!
//! - The loop blocks on its inbox until the controller's next deadline, then
//!   polls with the current time.
//! - Remote finish signals wake the loop through the controller's waker.
//! - `Shutdown` stops the loop and hands the controller back.

use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use web_time::Instant;

use backnav_core::{MotionEvent, RemoteAnimationTarget};

use crate::config::BackConfig;
use crate::controller::{BackAnimationController, BackStats, ControllerState};
use crate::error::ShellError;
use crate::runner::AnimationRunnerBinding;

/// Messages delivered to the shell thread.
#[derive(Debug)]
pub enum ShellMsg {
    Motion(MotionEvent),
    SetTriggerBack(bool),
    SetSwipeThresholds {
        trigger: f32,
        progress: f32,
    },
    SetBackToLauncher(AnimationRunnerBinding),
    ClearBackToLauncher,
    LauncherAnimationFinished,
    AnimationStart {
        apps: Vec<RemoteAnimationTarget>,
        wallpapers: Vec<RemoteAnimationTarget>,
        non_apps: Vec<RemoteAnimationTarget>,
    },
    ReloadConfig(BackConfig),
    Snapshot(mpsc::Sender<ShellSnapshot>),
    /// An asynchronous signal is waiting in the controller's inbox.
    Wake,
    Shutdown,
}

/// Point-in-time view of the controller, taken on the shell thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellSnapshot {
    pub state: ControllerState,
    pub transition_in_progress: bool,
    pub stats: BackStats,
}

/// Owns the shell thread.
pub struct BackAnimationShell {
    sender: mpsc::Sender<ShellMsg>,
    handle: Option<JoinHandle<BackAnimationController>>,
}

impl BackAnimationShell {
    /// Move `controller` onto a new `backnav-shell` thread.
    pub fn start(mut controller: BackAnimationController) -> Result<Self, ShellError> {
        let (tx, rx) = mpsc::channel::<ShellMsg>();

        let wake_tx = tx.clone();
        controller.set_waker(Arc::new(move || {
            let _ = wake_tx.send(ShellMsg::Wake);
        }));

        let handle = thread::Builder::new()
            .name("backnav-shell".into())
            .spawn(move || shell_loop(controller, rx))?;

        tracing::debug!(target: "backnav.shell", "back animation shell started");
        Ok(Self {
            sender: tx,
            handle: Some(handle),
        })
    }

    /// A handle for posting to the shell from any thread.
    #[must_use]
    pub fn handle(&self) -> BackAnimation {
        BackAnimation {
            sender: self.sender.clone(),
        }
    }

    /// Stop the thread and take the controller back.
    ///
    /// Returns `None` if the shell thread panicked.
    pub fn shutdown(mut self) -> Option<BackAnimationController> {
        let _ = self.sender.send(ShellMsg::Shutdown);
        self.handle.take().and_then(|handle| handle.join().ok())
    }
}

impl Drop for BackAnimationShell {
    fn drop(&mut self) {
        let _ = self.sender.send(ShellMsg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for BackAnimationShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackAnimationShell")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

/// Cloneable, thread-safe front for a running shell.
///
/// Every method fails with [`ShellError::Closed`] once the shell stopped.
#[derive(Debug, Clone)]
pub struct BackAnimation {
    sender: mpsc::Sender<ShellMsg>,
}

impl BackAnimation {
    fn send(&self, msg: ShellMsg) -> Result<(), ShellError> {
        self.sender.send(msg).map_err(|_| ShellError::Closed)
    }

    pub fn on_motion_event(&self, event: MotionEvent) -> Result<(), ShellError> {
        self.send(ShellMsg::Motion(event))
    }

    pub fn set_trigger_back(&self, trigger_back: bool) -> Result<(), ShellError> {
        self.send(ShellMsg::SetTriggerBack(trigger_back))
    }

    pub fn set_swipe_thresholds(&self, trigger: f32, progress: f32) -> Result<(), ShellError> {
        self.send(ShellMsg::SetSwipeThresholds { trigger, progress })
    }

    pub fn set_back_to_launcher_callback(
        &self,
        binding: AnimationRunnerBinding,
    ) -> Result<(), ShellError> {
        self.send(ShellMsg::SetBackToLauncher(binding))
    }

    pub fn clear_back_to_launcher_callback(&self) -> Result<(), ShellError> {
        self.send(ShellMsg::ClearBackToLauncher)
    }

    pub fn on_back_to_launcher_animation_finished(&self) -> Result<(), ShellError> {
        self.send(ShellMsg::LauncherAnimationFinished)
    }

    pub fn on_animation_start(
        &self,
        apps: Vec<RemoteAnimationTarget>,
        wallpapers: Vec<RemoteAnimationTarget>,
        non_apps: Vec<RemoteAnimationTarget>,
    ) -> Result<(), ShellError> {
        self.send(ShellMsg::AnimationStart {
            apps,
            wallpapers,
            non_apps,
        })
    }

    pub fn reload_config(&self, config: BackConfig) -> Result<(), ShellError> {
        self.send(ShellMsg::ReloadConfig(config))
    }

    /// Round-trip to the shell thread; every earlier message has been
    /// handled when this returns.
    pub fn snapshot(&self) -> Result<ShellSnapshot, ShellError> {
        let (tx, rx) = mpsc::channel();
        self.send(ShellMsg::Snapshot(tx))?;
        rx.recv().map_err(|_| ShellError::Closed)
    }
}

fn shell_loop(
    mut controller: BackAnimationController,
    rx: mpsc::Receiver<ShellMsg>,
) -> BackAnimationController {
    loop {
        let msg = match controller.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(timeout) {
                    Ok(msg) => msg,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        controller.poll(Instant::now());
                        continue;
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(msg) => msg,
                Err(_) => break,
            },
        };

        if !handle_msg(&mut controller, msg) {
            break;
        }
    }
    tracing::debug!(target: "backnav.shell", "back animation shell stopped");
    controller
}

/// Returns `false` on shutdown.
fn handle_msg(controller: &mut BackAnimationController, msg: ShellMsg) -> bool {
    let now = Instant::now();
    match msg {
        ShellMsg::Motion(event) => controller.on_motion_event(event, now),
        ShellMsg::SetTriggerBack(trigger_back) => controller.set_trigger_back(trigger_back),
        ShellMsg::SetSwipeThresholds { trigger, progress } => {
            controller.set_swipe_thresholds(trigger, progress);
        }
        ShellMsg::SetBackToLauncher(binding) => controller.set_back_to_launcher_callback(binding),
        ShellMsg::ClearBackToLauncher => controller.clear_back_to_launcher_callback(),
        ShellMsg::LauncherAnimationFinished => {
            controller.on_back_to_launcher_animation_finished(now);
        }
        ShellMsg::AnimationStart {
            apps,
            wallpapers,
            non_apps,
        } => {
            controller.poll(now);
            controller.on_animation_start(&apps, &wallpapers, &non_apps);
        }
        ShellMsg::ReloadConfig(config) => controller.reload_config(config),
        ShellMsg::Snapshot(reply) => {
            controller.poll(now);
            let _ = reply.send(ShellSnapshot {
                state: controller.state(),
                transition_in_progress: controller.is_transition_in_progress(),
                stats: controller.stats(),
            });
        }
        ShellMsg::Wake => controller.poll(now),
        ShellMsg::Shutdown => return false,
    }
    true
}
