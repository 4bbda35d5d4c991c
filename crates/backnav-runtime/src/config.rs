#![forbid(unsafe_code)]

//! Configuration for the back animation coordinator.
//!
//! Replaces process-wide static flags with a single [`BackConfig`] passed to
//! the controller at construction. It can be loaded from TOML or JSON (with
//! the `config-file` feature) and tuned on-device through environment
//! overrides, then swapped in with
//! [`BackAnimationController::reload_config`](crate::controller::BackAnimationController::reload_config).
//!
//! ```toml
//! # backnav.toml
//! animations_enabled = true
//! progress_threshold_override = -1.0
//! transition_timeout_ms = 2000
//!
//! [thresholds]
//! trigger = 100.0
//! progress = 300.0
//! ```
//!
//! # Environment overrides
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `BACKNAV_PROGRESS_THRESHOLD` | sets `progress_threshold_override` |
//! | `BACKNAV_ANIMATIONS_ENABLED` | `1`/`true`/`0`/`false` |

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use backnav_core::GestureThresholds;

use crate::error::ConfigError;

/// Environment variable overriding the effective progress threshold.
pub const ENV_PROGRESS_THRESHOLD: &str = "BACKNAV_PROGRESS_THRESHOLD";
/// Environment variable overriding the initial animation toggle.
pub const ENV_ANIMATIONS_ENABLED: &str = "BACKNAV_ANIMATIONS_ENABLED";

/// Default bound on waiting for a remote animation to finish.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_millis(2000);

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct BackConfig {
    /// Trigger and progress distances supplied by the gesture owner.
    pub thresholds: GestureThresholds,

    /// Forces the effective progress threshold when non-negative.
    pub progress_threshold_override: f32,

    /// Initial value of the "request remote animations" toggle.
    pub animations_enabled: bool,

    /// How long the transition guard waits for a remote finish signal.
    #[cfg_attr(
        feature = "config-file",
        serde(rename = "transition_timeout_ms", with = "duration_ms")
    )]
    pub transition_timeout: Duration,
}

impl Default for BackConfig {
    fn default() -> Self {
        Self {
            thresholds: GestureThresholds::default(),
            progress_threshold_override: -1.0,
            animations_enabled: false,
            transition_timeout: DEFAULT_TRANSITION_TIMEOUT,
        }
    }
}

impl BackConfig {
    /// Progress threshold actually used to normalize gesture progress.
    #[must_use]
    pub fn effective_progress_threshold(&self) -> f32 {
        self.thresholds
            .effective_progress(self.progress_threshold_override)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.thresholds.trigger.is_nan() || self.thresholds.trigger <= 0.0 {
            errors.push(format!(
                "thresholds.trigger must be > 0, got {}",
                self.thresholds.trigger
            ));
        }
        if self.thresholds.progress.is_nan() || self.thresholds.progress <= 0.0 {
            errors.push(format!(
                "thresholds.progress must be > 0, got {}",
                self.thresholds.progress
            ));
        }
        if self.progress_threshold_override.is_nan() {
            errors.push("progress_threshold_override must not be NaN".into());
        }
        if self.transition_timeout.is_zero() {
            errors.push("transition_timeout must be > 0".into());
        }

        errors
    }

    /// Return `self` if valid, otherwise every validation message.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Apply `BACKNAV_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are
    /// logged and ignored.
    #[must_use]
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_PROGRESS_THRESHOLD) {
            match raw.trim().parse::<f32>() {
                Ok(value) if !value.is_nan() => self.progress_threshold_override = value,
                _ => tracing::warn!(
                    target: "backnav.config",
                    var = ENV_PROGRESS_THRESHOLD,
                    value = %raw,
                    "ignoring unparseable override"
                ),
            }
        }
        if let Some(raw) = lookup(ENV_ANIMATIONS_ENABLED) {
            match parse_flag(&raw) {
                Some(enabled) => self.animations_enabled = enabled,
                None => tracing::warn!(
                    target: "backnav.config",
                    var = ENV_ANIMATIONS_ENABLED,
                    value = %raw,
                    "ignoring unparseable override"
                ),
            }
        }
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(feature = "config-file")]
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = BackConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.transition_timeout, Duration::from_millis(2000));
        assert!(!config.animations_enabled);
        assert_eq!(config.effective_progress_threshold(), 300.0);
    }

    #[test]
    fn invalid_values_are_reported() {
        let config = BackConfig {
            thresholds: GestureThresholds::new(0.0, -5.0),
            transition_timeout: Duration::ZERO,
            ..BackConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            config.validated(),
            Err(ConfigError::Validation(v)) if v.len() == 3
        ));
    }

    #[test]
    fn env_override_sets_progress_threshold() {
        let config = BackConfig::default().apply_env_with(lookup(&[(ENV_PROGRESS_THRESHOLD, "120")]));
        assert_eq!(config.progress_threshold_override, 120.0);
        assert_eq!(config.effective_progress_threshold(), 120.0);
    }

    #[test]
    fn negative_env_override_keeps_caller_threshold() {
        let config = BackConfig::default().apply_env_with(lookup(&[(ENV_PROGRESS_THRESHOLD, "-1")]));
        assert_eq!(config.effective_progress_threshold(), 300.0);
    }

    #[test]
    fn env_override_toggles_animations() {
        let config = BackConfig::default().apply_env_with(lookup(&[(ENV_ANIMATIONS_ENABLED, "1")]));
        assert!(config.animations_enabled);
        let config = config.apply_env_with(lookup(&[(ENV_ANIMATIONS_ENABLED, "off")]));
        assert!(!config.animations_enabled);
    }

    #[test]
    fn garbage_env_values_are_ignored() {
        let config = BackConfig::default().apply_env_with(lookup(&[
            (ENV_PROGRESS_THRESHOLD, "wide"),
            (ENV_ANIMATIONS_ENABLED, "maybe"),
        ]));
        assert_eq!(config, BackConfig::default());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_round_trip_of_partial_file() {
        let config = BackConfig::from_toml_str(
            "animations_enabled = true\ntransition_timeout_ms = 1500\n[thresholds]\nprogress = 200.0\n",
        )
        .expect("valid toml");
        assert!(config.animations_enabled);
        assert_eq!(config.transition_timeout, Duration::from_millis(1500));
        assert_eq!(config.thresholds.progress, 200.0);
        assert_eq!(config.thresholds.trigger, 100.0);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn json_with_invalid_timeout_is_rejected() {
        let err = BackConfig::from_json_str(r#"{"transition_timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
