//! # Backends — The Drawing Capability Interface
//!
//! The renderer never talks to a graphics API directly. It drives a
//! [`Backend`]: an immediate-mode interface in the style of raylib, with
//! textured quads, a handful of shape primitives, a 2D camera transform and a
//! scissor rectangle.
//!
//! ```text
//!  Renderer ──► &mut dyn Backend
//!                 ├── RecordingBackend   headless, records DrawCommands
//!                 └── SoftwareBackend    CPU rasterizer into an RgbaImage
//! ```
//!
//! ## Conventions
//!
//! - Screen space is Y-down, in pixels, origin at the top-left.
//! - Angles are degrees, positive is clockwise on screen.
//! - [`Backend::draw_texture_pro`] follows raylib's `DrawTexturePro`: the
//!   `origin` point of `dest` (relative to its top-left) is placed at
//!   `(dest.x, dest.y)` and rotation happens about it. A negative `src` width
//!   or height flips the image on that axis.
//! - `begin_mode_2d` / `end_mode_2d` do not nest; the renderer pairs them.
//! - `begin_scissor` replaces the current scissor; `end_scissor` removes it.
//!
//! ## Comparison
//!
//! - **raylib**: the same call shapes, bound to one OpenGL context.
//! - **macroquad**: a similar immediate API with an internal batcher.
//!
//! A trait object keeps the renderer independent of which backend is plugged
//! in. The cost is one virtual call per draw, which is noise next to the draw.

pub mod recording;
#[cfg(feature = "software")]
pub mod software;

pub use recording::{DrawCommand, RecordingBackend};
#[cfg(feature = "software")]
pub use software::SoftwareBackend;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::math::{Affine2, Rect, Vec2};
use crate::render2d::{Color, DrawStyle};

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors raised by texture management in a [`Backend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to read texture: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "software")]
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[cfg(feature = "software")]
    #[error("failed to parse font: {0}")]
    Font(&'static str),
    #[error("unknown texture {0:?}")]
    InvalidTexture(TextureHandle),
    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    InvalidDimensions { width: u32, height: u32, len: usize },
}

// ── Handles ─────────────────────────────────────────────────────────────

/// Handle to a texture owned by a backend.
///
/// A plain index; backends decide what it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// An integer clip rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScissorRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Snap a float rectangle outward to whole pixels.
    pub fn from_rect(rect: Rect) -> Self {
        let x0 = rect.x.floor() as i32;
        let y0 = rect.y.floor() as i32;
        let x1 = rect.right().ceil() as i32;
        let y1 = rect.bottom().ceil() as i32;
        Self::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.x as f32, self.y as f32, self.width as f32, self.height as f32)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// A raylib-style 2D view transform.
///
/// ```text
/// screen = offset + R(rotation) · ((world − target) · zoom)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera2d {
    /// Screen point the target is drawn at.
    pub offset: Vec2,
    /// World point at the center of the view.
    pub target: Vec2,
    /// Degrees, clockwise on screen.
    pub rotation: f32,
    pub zoom: f32,
}

impl Camera2d {
    /// A pure translation by `offset` (zoom 1, no rotation).
    pub fn translation(offset: Vec2) -> Self {
        Self {
            offset,
            target: Vec2::ZERO,
            rotation: 0.0,
            zoom: 1.0,
        }
    }

    /// World → screen matrix.
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_translation(self.offset)
            * Affine2::from_angle(self.rotation.to_radians())
            * Affine2::from_scale(Vec2::splat(self.zoom))
            * Affine2::from_translation(-self.target)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.matrix().transform_point2(world)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.matrix().inverse().transform_point2(screen)
    }
}

impl Default for Camera2d {
    fn default() -> Self {
        Self::translation(Vec2::ZERO)
    }
}

// ── Backend ─────────────────────────────────────────────────────────────

/// An immediate-mode 2D drawing target.
pub trait Backend {
    fn screen_width(&self) -> u32;
    fn screen_height(&self) -> u32;

    fn begin_frame(&mut self, clear: Color);
    fn end_frame(&mut self);

    /// Apply a view transform to subsequent draws.
    fn begin_mode_2d(&mut self, camera: Camera2d);
    fn end_mode_2d(&mut self);

    /// Clip subsequent draws to `rect` (screen pixels, ignores the camera).
    fn begin_scissor(&mut self, rect: ScissorRect);
    fn end_scissor(&mut self);

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, BackendError>;
    fn load_texture_rgba(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, BackendError>;
    fn unload_texture(&mut self, texture: TextureHandle);
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)>;

    fn draw_texture_pro(
        &mut self,
        texture: TextureHandle,
        src: Rect,
        dest: Rect,
        origin: Vec2,
        rotation: f32,
        tint: Color,
    );

    fn draw_circle(&mut self, center: Vec2, radius: f32, style: DrawStyle, color: Color);
    fn draw_rectangle(&mut self, rect: Rect, style: DrawStyle, color: Color);
    fn draw_triangle(&mut self, points: [Vec2; 3], style: DrawStyle, color: Color);
    /// Convex polygon.
    fn draw_polygon(&mut self, points: &[Vec2], style: DrawStyle, color: Color);
    fn draw_line(&mut self, start: Vec2, end: Vec2, thickness: f32, color: Color);
    /// Text with its top-left corner at `position`.
    fn draw_text(&mut self, text: &str, position: Vec2, size: f32, color: Color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn camera2d_maps_target_to_offset() {
        let cam = Camera2d {
            offset: Vec2::new(400.0, 300.0),
            target: Vec2::new(100.0, 50.0),
            rotation: 30.0,
            zoom: 2.0,
        };
        assert!(approx_eq(cam.world_to_screen(cam.target), cam.offset));
        let p = Vec2::new(-7.0, 12.5);
        assert!(approx_eq(cam.screen_to_world(cam.world_to_screen(p)), p));
    }

    #[test]
    fn camera2d_zoom_scales_distance() {
        let cam = Camera2d {
            offset: Vec2::ZERO,
            target: Vec2::ZERO,
            rotation: 0.0,
            zoom: 3.0,
        };
        assert!(approx_eq(cam.world_to_screen(Vec2::new(10.0, -2.0)), Vec2::new(30.0, -6.0)));
    }

    #[test]
    fn scissor_snaps_outward() {
        let s = ScissorRect::from_rect(Rect::new(10.5, 20.2, 99.0, 50.0));
        assert_eq!(s, ScissorRect::new(10, 20, 100, 51));
        assert!(ScissorRect::new(0, 0, 0, 10).is_empty());
    }
}
