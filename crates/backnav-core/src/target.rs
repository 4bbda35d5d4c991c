#![forbid(unsafe_code)]

//! Resolved back target data: navigation kind, screenshot, animation target.

use crate::geometry::RectF;

/// Kind of back transition the navigation resolver selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackNavigationType {
    /// Back to a previous activity in the same task.
    CrossActivity,
    /// Back to the previous task.
    CrossTask,
    /// Back out of the last activity onto the home screen.
    ReturnToHome,
    /// The focused window handles back itself through its callback.
    Callback,
}

impl BackNavigationType {
    /// Short stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CrossActivity => "cross_activity",
            Self::CrossTask => "cross_task",
            Self::ReturnToHome => "return_to_home",
            Self::Callback => "callback",
        }
    }
}

impl std::fmt::Display for BackNavigationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a target window is appearing or leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetMode {
    Opening,
    Closing,
}

/// A window surface a remote animation may drive.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAnimationTarget {
    pub task_id: i32,
    pub mode: TargetMode,
    pub bounds: RectF,
}

impl RemoteAnimationTarget {
    #[must_use]
    pub const fn new(task_id: i32, mode: TargetMode, bounds: RectF) -> Self {
        Self {
            task_id,
            mode,
            bounds,
        }
    }
}

/// Opaque handle to a screenshot of the window being navigated back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenshotBuffer {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

impl ScreenshotBuffer {
    #[must_use]
    pub const fn new(id: u64, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Buffer extent as a rectangle at the origin.
    #[must_use]
    pub fn bounds(&self) -> RectF {
        RectF::from_size(self.width as f32, self.height as f32)
    }
}
