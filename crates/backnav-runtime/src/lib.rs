#![forbid(unsafe_code)]

//! backnav Runtime
//!
//! This crate coordinates predictive back gestures: it relays a touch stream
//! as back lifecycle callbacks, hands return-to-home animations to the
//! launcher, and guarantees every gesture ends in exactly one commit or
//! cancel decision.
//!
//! # Key Components
//!
//! - [`BackAnimationController`] - Gesture state machine and dispatcher
//! - [`AnimationRunnerBinding`] - Remote callback paired with its animation runner
//! - [`TransitionGuard`] - Watchdog-bounded exclusion between transitions
//! - [`BackAnimationShell`] - Dedicated executor thread with a [`BackAnimation`] handle
//! - [`SettingObserver`] - Background observer for the animation toggle
//! - [`BackConfig`] - Thresholds, overrides, and timeouts
//!
//! # Role in backnav
//! `backnav-runtime` is the orchestrator. It consumes [`backnav_core`]
//! gesture and target types, talks to remote processes through the traits in
//! [`remote`], and never lets a remote failure escape its entry points.

pub mod config;
pub mod controller;
pub mod error;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod remote;
pub mod runner;
pub mod settings;
pub mod shell;
pub mod surface;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use config::BackConfig;
pub use controller::{BackAnimationController, BackStats, ControllerState, TransitionGuard, Waker};
pub use error::{BackFailure, ConfigError, DispatchPhase, RemoteError, ShellError};
pub use remote::{
    BackInvokedCallback, BackNavigationInfo, FinishedCallback, NavigationResolver,
    RemoteAnimationRunner,
};
pub use runner::AnimationRunnerBinding;
pub use settings::{AnimationsEnabled, SettingNotifier, SettingObserver, SettingSource};
pub use shell::{BackAnimation, BackAnimationShell, ShellSnapshot};
pub use surface::{Compositor, NoopCompositor, SurfaceId, SurfaceOp, SurfaceTransaction};
