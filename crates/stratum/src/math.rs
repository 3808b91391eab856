//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Rect`] is the axis-aligned rectangle used for
//! viewports, destination boxes, containers, and culling.
//!
//! ## Coordinate Conventions
//!
//! Both world and screen space are Y-down: `(0, 0)` is the top-left corner of
//! the screen, and a positive rotation turns clockwise on screen. Angles are in
//! degrees at every public boundary; conversion to radians happens only inside
//! the helpers here.

pub use glam::{Affine2, Mat2, Vec2};

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle: top-left corner plus size.
///
/// A rectangle with a non-positive width or height is *degenerate*. A
/// zero-area rectangle still overlaps anything whose interior contains it, so
/// hairline shapes survive culling. Callers that must reject degenerate boxes
/// check [`Rect::is_degenerate`] first.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from two opposite corners. The corners may be given in any order.
    pub fn from_min_max(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Bounding box of a point set. Returns `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::from_min_max(min, max))
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the width or height is not strictly positive (or is NaN).
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Strict overlap test.
    ///
    /// Rectangles that only share an edge do not overlap, so a sprite sitting
    /// exactly on the viewport border is culled. The test is symmetric.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// The overlapping region, or `None` when the rectangles don't overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Rect::from_min_max(
            self.min().max(other.min()),
            self.max().min(other.max()),
        ))
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Half-open containment: the left/top edges are inside, right/bottom are not.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Grow the rectangle by `margin` on every side. Negative margins shrink it.
    pub fn expand(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.right(), self.y),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.x, self.bottom()),
        ]
    }

    /// Bounding box of this rectangle after rotating it by `degrees` about `pivot`.
    ///
    /// Returns `self` unchanged for a zero rotation.
    pub fn rotated_bounds(&self, pivot: Vec2, degrees: f32) -> Rect {
        if degrees == 0.0 {
            return *self;
        }
        let rot = Mat2::from_angle(degrees.to_radians());
        let corners = self.corners().map(|c| pivot + rot * (c - pivot));
        Rect::from_points(corners).unwrap_or(*self)
    }
}

/// Rotate `point` about `pivot` by `degrees` (clockwise on a Y-down screen).
pub fn rotate_about(point: Vec2, pivot: Vec2, degrees: f32) -> Vec2 {
    if degrees == 0.0 {
        return point;
    }
    pivot + Mat2::from_angle(degrees.to_radians()) * (point - pivot)
}

/// Size of the bounding box of a `size` rectangle rotated by `degrees`.
pub fn rotated_extent(size: Vec2, degrees: f32) -> Vec2 {
    if degrees == 0.0 {
        return size;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    Vec2::new(
        size.x * cos + size.y * sin,
        size.x * sin + size.y * cos,
    )
}
