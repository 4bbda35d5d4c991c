//! Error types for remote calls, configuration, and the shell thread.
//!
//! Remote failures are values, not panics: every remote interface returns
//! [`RemoteError`], and the controller turns each one into a logged
//! [`BackFailure`] instead of propagating it.

use std::io;

use thiserror::Error;

/// A cross-process (or cross-component) call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The remote end is gone.
    #[error("remote {interface} is dead")]
    DeadObject { interface: &'static str },

    /// The remote end refused the call.
    #[error("remote {interface} rejected call: {reason}")]
    Rejected {
        interface: &'static str,
        reason: String,
    },
}

impl RemoteError {
    #[must_use]
    pub fn dead(interface: &'static str) -> Self {
        Self::DeadObject { interface }
    }

    #[must_use]
    pub fn rejected(interface: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            interface,
            reason: reason.into(),
        }
    }
}

/// Lifecycle callback being dispatched when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchPhase {
    Started,
    Progressed,
    Invoked,
    Cancelled,
    AnimationStart,
    Surface,
}

impl DispatchPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Progressed => "progressed",
            Self::Invoked => "invoked",
            Self::Cancelled => "cancelled",
            Self::AnimationStart => "animation_start",
            Self::Surface => "surface",
        }
    }
}

impl std::fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gesture-terminal failures. Logged and counted, never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackFailure {
    /// The navigation resolver failed or produced no target.
    #[error("back navigation resolution failed: {0}")]
    Resolution(String),

    /// A lifecycle callback could not be delivered.
    #[error("failed to dispatch {phase}: {source}")]
    Dispatch {
        phase: DispatchPhase,
        #[source]
        source: RemoteError,
    },

    /// A new gesture began before the previous one was cleaned up.
    #[error("stale back gesture state detected")]
    StaleGesture,

    /// The remote animation never signalled completion.
    #[error("back transition timed out after {timeout_ms}ms")]
    TransitionTimeout { timeout_ms: u64 },
}

/// Errors loading or validating [`BackConfig`](crate::config::BackConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config-file")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Errors talking to the shell thread.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The shell thread has shut down.
    #[error("back animation shell is closed")]
    Closed,

    #[error("failed to spawn shell thread: {0}")]
    Spawn(#[from] io::Error),
}
