#![forbid(unsafe_code)]

//! Transactional surface updates for screenshot and animation layers.
//!
//! The controller never mutates surfaces directly; it builds a
//! [`SurfaceTransaction`] and hands it to a [`Compositor`], which applies
//! every op atomically or not at all.

use backnav_core::ScreenshotBuffer;

use crate::error::RemoteError;

/// Compositor-assigned surface identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// One mutation inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    SetBuffer {
        surface: SurfaceId,
        buffer: ScreenshotBuffer,
    },
    SetScale {
        surface: SurfaceId,
        sx: f32,
        sy: f32,
    },
    SetPosition {
        surface: SurfaceId,
        x: f32,
        y: f32,
    },
    Show(SurfaceId),
    Remove(SurfaceId),
}

/// Ordered batch of surface ops applied as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceTransaction {
    ops: Vec<SurfaceOp>,
}

impl SurfaceTransaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set_buffer(mut self, surface: SurfaceId, buffer: ScreenshotBuffer) -> Self {
        self.ops.push(SurfaceOp::SetBuffer { surface, buffer });
        self
    }

    #[must_use]
    pub fn set_scale(mut self, surface: SurfaceId, sx: f32, sy: f32) -> Self {
        self.ops.push(SurfaceOp::SetScale { surface, sx, sy });
        self
    }

    #[must_use]
    pub fn set_position(mut self, surface: SurfaceId, x: f32, y: f32) -> Self {
        self.ops.push(SurfaceOp::SetPosition { surface, x, y });
        self
    }

    #[must_use]
    pub fn show(mut self, surface: SurfaceId) -> Self {
        self.ops.push(SurfaceOp::Show(surface));
        self
    }

    #[must_use]
    pub fn remove(mut self, surface: SurfaceId) -> Self {
        self.ops.push(SurfaceOp::Remove(surface));
        self
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<SurfaceOp> {
        self.ops
    }
}

/// Creates surfaces and applies transactions.
pub trait Compositor: Send + Sync {
    fn create_surface(&self, name: &str) -> Result<SurfaceId, RemoteError>;
    fn apply(&self, transaction: SurfaceTransaction) -> Result<(), RemoteError>;
}

/// Compositor for hosts without a surface layer. Accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCompositor;

impl Compositor for NoopCompositor {
    fn create_surface(&self, _name: &str) -> Result<SurfaceId, RemoteError> {
        Ok(SurfaceId(0))
    }

    fn apply(&self, _transaction: SurfaceTransaction) -> Result<(), RemoteError> {
        Ok(())
    }
}
