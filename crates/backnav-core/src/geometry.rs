#![forbid(unsafe_code)]

//! Geometric primitives in window coordinates.

/// A point in window coordinates (pixels, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal displacement from `origin` to `self`, ignoring direction.
    #[inline]
    pub fn horizontal_distance(&self, origin: PointF) -> f32 {
        (self.x - origin.x).abs()
    }
}

/// An axis-aligned rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RectF {
    /// Left edge (inclusive).
    pub x: f32,
    /// Top edge (inclusive).
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: PointF) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Per-axis scale factors that stretch a surface of this size onto `target`.
    ///
    /// A zero-sized source axis maps to a scale of `1.0` so callers never
    /// push an infinite or NaN transform to the compositor.
    pub fn scale_to(&self, target: RectF) -> (f32, f32) {
        let sx = if self.width > 0.0 {
            target.width / self.width
        } else {
            1.0
        };
        let sy = if self.height > 0.0 {
            target.height / self.height
        } else {
            1.0
        };
        (sx, sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_distance_ignores_direction() {
        let origin = PointF::new(100.0, 200.0);
        assert_eq!(PointF::new(250.0, 0.0).horizontal_distance(origin), 150.0);
        assert_eq!(PointF::new(40.0, 900.0).horizontal_distance(origin), 60.0);
    }

    #[test]
    fn rect_edges_and_contains() {
        let r = RectF::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert!(r.contains(PointF::new(10.0, 20.0)));
        assert!(!r.contains(PointF::new(110.0, 20.0)));
        assert!(!r.is_empty());
        assert!(RectF::from_size(0.0, 10.0).is_empty());
    }

    #[test]
    fn scale_to_window_bounds() {
        let buffer = RectF::from_size(540.0, 1200.0);
        let window = RectF::new(0.0, 0.0, 1080.0, 2400.0);
        assert_eq!(buffer.scale_to(window), (2.0, 2.0));
    }

    #[test]
    fn scale_from_empty_source_is_identity() {
        let buffer = RectF::from_size(0.0, 0.0);
        let window = RectF::from_size(1080.0, 2400.0);
        assert_eq!(buffer.scale_to(window), (1.0, 1.0));
    }
}
