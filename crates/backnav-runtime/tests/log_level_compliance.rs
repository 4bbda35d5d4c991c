#![forbid(unsafe_code)]

//! Log level checks for the back gesture coordinator.
//!
//! Verify that controller logging follows the project's policy:
//! - Remote failures are logged at WARN with an `error` field
//! - Routine lifecycle steps stay at DEBUG or below
//! - Controller events carry the `backnav.controller` target
//!
//! Run:
//!   cargo test -p backnav-runtime --test log_level_compliance

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backnav_core::{BackNavigationType, MotionEvent, SwipeEdge};
use backnav_runtime::testing::{RecordingCallback, RecordingRunner, ScriptedResolver};
use backnav_runtime::{AnimationRunnerBinding, BackAnimationController, BackConfig, RemoteError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::Instant;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(EventCapture {
            events: events.clone(),
        });
    tracing::subscriber::with_default(subscriber, f);
    events.lock().unwrap().clone()
}

fn controller_events(events: &[CapturedEvent]) -> Vec<&CapturedEvent> {
    events
        .iter()
        .filter(|e| e.target == "backnav.controller")
        .collect()
}

const EDGE: SwipeEdge = SwipeEdge::Left;

// ============================================================================
// Tests
// ============================================================================

#[test]
fn dispatch_failure_logged_at_warn() {
    let events = with_captured_events(|| {
        let app = RecordingCallback::new();
        app.set_dead(true);
        let resolver = ScriptedResolver::new(BackNavigationType::Callback, app);
        let mut ctrl = BackAnimationController::new(BackConfig::default(), Box::new(resolver));
        let t = Instant::now();
        ctrl.on_motion_event(MotionEvent::moved(0.0, 0.0, EDGE), t);
        ctrl.on_motion_event(MotionEvent::up(0.0, 0.0, EDGE), t);
    });

    let warns: Vec<_> = controller_events(&events)
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warns.len(), 2, "started + cancelled failures: {warns:#?}");
    for warn in warns {
        let error = warn.fields.get("error").expect("warn carries error field");
        assert!(error.contains("is dead"), "unexpected error text: {error}");
    }
}

#[test]
fn resolution_failure_logged_at_warn() {
    let events = with_captured_events(|| {
        let resolver = ScriptedResolver::new(BackNavigationType::Callback, RecordingCallback::new());
        resolver.push(Err(RemoteError::dead("IActivityTaskManager")));
        let mut ctrl = BackAnimationController::new(BackConfig::default(), Box::new(resolver));
        ctrl.on_motion_event(MotionEvent::moved(0.0, 0.0, EDGE), Instant::now());
    });

    let warns: Vec<_> = controller_events(&events)
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warns.len(), 1);
    assert!(warns[0].fields["error"].contains("IActivityTaskManager"));
}

#[test]
fn timeout_logged_at_warn() {
    let events = with_captured_events(|| {
        let resolver = ScriptedResolver::new(BackNavigationType::ReturnToHome, RecordingCallback::new());
        let config = BackConfig {
            animations_enabled: true,
            ..BackConfig::default()
        };
        let mut ctrl = BackAnimationController::new(config, Box::new(resolver));
        ctrl.set_back_to_launcher_callback(AnimationRunnerBinding::new(
            RecordingCallback::new(),
            RecordingRunner::new(),
        ));
        let t = Instant::now();
        ctrl.on_motion_event(MotionEvent::moved(0.0, 0.0, EDGE), t);
        ctrl.on_motion_event(MotionEvent::up(0.0, 0.0, EDGE), t);
        ctrl.poll(t + Duration::from_millis(2000));
    });

    let warns: Vec<_> = controller_events(&events)
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warns.len(), 1);
    assert!(warns[0].fields["error"].contains("2000"));
}

#[test]
fn healthy_gesture_logs_nothing_above_debug() {
    let events = with_captured_events(|| {
        let resolver = ScriptedResolver::new(BackNavigationType::CrossTask, RecordingCallback::new());
        let mut ctrl = BackAnimationController::new(BackConfig::default(), Box::new(resolver));
        let t = Instant::now();
        ctrl.on_motion_event(MotionEvent::down(0.0, 0.0, EDGE), t);
        ctrl.on_motion_event(MotionEvent::moved(0.0, 0.0, EDGE), t);
        ctrl.on_motion_event(MotionEvent::moved(120.0, 0.0, EDGE), t);
        ctrl.set_trigger_back(true);
        ctrl.on_motion_event(MotionEvent::up(120.0, 0.0, EDGE), t);
    });

    let ctrl_events = controller_events(&events);
    assert!(
        ctrl_events
            .iter()
            .any(|e| e.message() == "back gesture started"),
        "missing start event: {ctrl_events:#?}"
    );
    assert!(
        ctrl_events
            .iter()
            .any(|e| e.message() == "back navigation finished")
    );
    for event in &events {
        assert!(
            event.level >= tracing::Level::DEBUG,
            "unexpected {} event: {}",
            event.level,
            event.message()
        );
    }
}
