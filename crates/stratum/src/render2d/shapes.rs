//! # Shapes — Vector Primitives
//!
//! Draw circles, rectangles, lines, triangles, polygons, arrows and rays with a
//! single visual record instead of texture hacks.
//!
//! ```ignore
//! store.add_shape(
//!     Vec2::new(100.0, 80.0),
//!     ShapeVisual::new(Shape::circle(20.0)).color(Color::RED),
//! );
//! ```
//!
//! All geometry is relative to the shape's position. Rotation turns the
//! geometry about the position (for rectangles, that is the top-left corner).
//! Circles ignore rotation.
//!
//! [`ShapeVisual::bounds`] gives the world-space bounding box used for culling.

use serde::{Deserialize, Serialize};

use super::Color;
use crate::layer::LayerId;
use crate::math::{Rect, Vec2, rotate_about};

/// Filled or outlined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStyle {
    #[default]
    Fill,
    Outline { thickness: f32 },
}

/// Geometry of a shape, relative to its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Circle { radius: f32 },
    /// Top-left corner at the position.
    Rectangle { width: f32, height: f32 },
    Line { end: Vec2, thickness: f32 },
    /// First vertex at the position; `b` and `c` are offsets from it.
    Triangle { b: Vec2, c: Vec2 },
    /// Convex polygon; vertices are offsets from the position.
    Polygon { points: Vec<Vec2> },
    Arrow { end: Vec2, head_size: f32, thickness: f32 },
    Ray { direction: Vec2, length: f32, thickness: f32 },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Shape::Rectangle { width, height }
    }

    pub fn line(end: Vec2, thickness: f32) -> Self {
        Shape::Line { end, thickness }
    }

    pub fn triangle(b: Vec2, c: Vec2) -> Self {
        Shape::Triangle { b, c }
    }

    pub fn polygon(points: Vec<Vec2>) -> Self {
        Shape::Polygon { points }
    }

    /// A regular polygon with `sides` vertices on a circle of `radius`
    /// centered on the position.
    pub fn regular_polygon(sides: u32, radius: f32) -> Self {
        let sides = sides.max(3);
        let points = (0..sides)
            .map(|i| {
                let theta = i as f32 / sides as f32 * std::f32::consts::TAU;
                Vec2::new(theta.cos() * radius, theta.sin() * radius)
            })
            .collect();
        Shape::Polygon { points }
    }

    pub fn arrow(end: Vec2, head_size: f32, thickness: f32) -> Self {
        Shape::Arrow { end, head_size, thickness }
    }

    pub fn ray(direction: Vec2, length: f32, thickness: f32) -> Self {
        Shape::Ray { direction, length, thickness }
    }
}

/// A shape visual record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeVisual {
    pub shape: Shape,
    pub color: Color,
    pub style: DrawStyle,
    /// Rotation in degrees about the position.
    pub rotation: f32,
    pub layer: LayerId,
    pub visible: bool,
    pub z_index: i32,
}

impl ShapeVisual {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            color: Color::WHITE,
            style: DrawStyle::Fill,
            rotation: 0.0,
            layer: LayerId::WORLD,
            visible: true,
            z_index: 0,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn outline(mut self, thickness: f32) -> Self {
        self.style = DrawStyle::Outline { thickness };
        self
    }

    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn layer(mut self, layer: LayerId) -> Self {
        self.layer = layer;
        self
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    /// Rotate a relative offset into world space.
    pub(crate) fn point(&self, position: Vec2, offset: Vec2) -> Vec2 {
        rotate_about(position + offset, position, self.rotation)
    }

    /// Axis-aligned world bounds for culling. Line-like shapes are padded by
    /// half their thickness, arrows by their head size.
    pub fn bounds(&self, position: Vec2) -> Rect {
        let outline = match self.style {
            DrawStyle::Outline { thickness } => thickness.max(0.0) * 0.5,
            DrawStyle::Fill => 0.0,
        };
        let raw = match &self.shape {
            Shape::Circle { radius } => {
                let r = radius.abs();
                Rect::new(position.x - r, position.y - r, r * 2.0, r * 2.0)
            }
            Shape::Rectangle { width, height } => {
                let rect = Rect::from_min_max(position, position + Vec2::new(*width, *height));
                rect.rotated_bounds(position, self.rotation)
            }
            Shape::Line { end, thickness } => {
                self.segment_bounds(position, *end).expand(thickness.abs() * 0.5)
            }
            Shape::Triangle { b, c } => {
                let pts = [position, self.point(position, *b), self.point(position, *c)];
                Rect::from_points(pts).unwrap_or(Rect::new(position.x, position.y, 0.0, 0.0))
            }
            Shape::Polygon { points } => {
                Rect::from_points(points.iter().map(|p| self.point(position, *p)))
                    .unwrap_or(Rect::new(position.x, position.y, 0.0, 0.0))
            }
            Shape::Arrow { end, head_size, thickness } => self
                .segment_bounds(position, *end)
                .expand(head_size.abs().max(thickness.abs() * 0.5)),
            Shape::Ray { direction, length, thickness } => {
                let end = direction.normalize_or_zero() * *length;
                self.segment_bounds(position, end).expand(thickness.abs() * 0.5)
            }
        };
        if outline > 0.0 { raw.expand(outline) } else { raw }
    }

    fn segment_bounds(&self, position: Vec2, end: Vec2) -> Rect {
        Rect::from_min_max(position, self.point(position, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn circle_bounds() {
        let s = ShapeVisual::new(Shape::circle(10.0));
        assert_eq!(s.bounds(Vec2::new(50.0, 60.0)), Rect::new(40.0, 50.0, 20.0, 20.0));
    }

    #[test]
    fn rectangle_bounds_top_left_anchor() {
        let s = ShapeVisual::new(Shape::rectangle(30.0, 20.0));
        assert_eq!(s.bounds(Vec2::new(5.0, 5.0)), Rect::new(5.0, 5.0, 30.0, 20.0));
    }

    #[test]
    fn rotated_rectangle_bounds() {
        let s = ShapeVisual::new(Shape::rectangle(30.0, 10.0)).rotation(90.0);
        let b = s.bounds(Vec2::ZERO);
        assert!(approx_eq(b.x, -10.0));
        assert!(approx_eq(b.width, 10.0));
        assert!(approx_eq(b.height, 30.0));
    }

    #[test]
    fn triangle_bounds_from_vertices() {
        let s = ShapeVisual::new(Shape::triangle(Vec2::new(10.0, 0.0), Vec2::new(5.0, -8.0)));
        assert_eq!(s.bounds(Vec2::new(1.0, 1.0)), Rect::new(1.0, -7.0, 10.0, 8.0));
    }

    #[test]
    fn line_bounds_from_endpoints() {
        let s = ShapeVisual::new(Shape::line(Vec2::new(-10.0, 20.0), 0.0));
        assert_eq!(s.bounds(Vec2::ZERO), Rect::new(-10.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn ray_bounds_use_normalized_direction() {
        let s = ShapeVisual::new(Shape::ray(Vec2::new(3.0, 0.0), 50.0, 2.0));
        assert_eq!(s.bounds(Vec2::ZERO), Rect::new(-1.0, -1.0, 52.0, 2.0));
    }

    #[test]
    fn regular_polygon_has_requested_sides() {
        match Shape::regular_polygon(6, 10.0) {
            Shape::Polygon { points } => assert_eq!(points.len(), 6),
            other => panic!("unexpected shape {other:?}"),
        }
    }
}
