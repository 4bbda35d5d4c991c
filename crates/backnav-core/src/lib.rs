#![forbid(unsafe_code)]

//! Core: gesture thresholds, motion events, and back target descriptors.
//!
//! # Role in backnav
//! `backnav-core` is the data layer. It owns the plain types that describe a
//! back gesture (motion events, normalized progress, thresholds) and the
//! resolved back target (navigation kind, screenshot, animation target).
//!
//! # Primary responsibilities
//! - **MotionEvent**: the raw touch stream fed into the coordinator.
//! - **BackEvent**: the structured event relayed to back callbacks.
//! - **GestureSession**: per-gesture state and progress normalization.
//! - **GestureThresholds**: trigger/progress distances with override support.
//!
//! # How it fits in the system
//! The runtime (`backnav-runtime`) consumes these types and drives the
//! controller state machine. Nothing here performs I/O or talks to a remote.

pub mod event;
pub mod geometry;
pub mod gesture;
pub mod target;

pub use event::{BackEvent, MotionAction, MotionEvent, SwipeEdge};
pub use geometry::{PointF, RectF};
pub use gesture::{GestureSession, GestureThresholds};
pub use target::{BackNavigationType, RemoteAnimationTarget, ScreenshotBuffer, TargetMode};
