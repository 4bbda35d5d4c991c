#![forbid(unsafe_code)]

//! JSON log output for production hosts.
//!
//! Everything in this crate logs through `tracing`; this module only installs
//! a subscriber. Controller events use the `backnav.controller` target, so a
//! filter such as `BACKNAV_LOG=backnav.controller=debug` isolates them.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const ENV_LOG: &str = "BACKNAV_LOG";

/// Build the filter from [`ENV_LOG`], falling back to `default_filter`.
#[must_use]
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install a global JSON subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_json(default_filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_names(true),
        )
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_filter_is_used_when_env_is_unset() {
        if std::env::var_os(ENV_LOG).is_some() {
            return;
        }
        let filter = env_filter("backnav.controller=debug");
        assert!(filter.to_string().contains("backnav.controller=debug"));
    }

    #[test]
    fn second_init_fails() {
        let _ = init_json("warn");
        assert!(init_json("warn").is_err());
    }
}
