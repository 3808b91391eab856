//! # Camera — 2D View Transform
//!
//! A [`Camera`] looks at a world point (its *position*) with a zoom factor and
//! a rotation, and maps that view onto the screen or onto a sub-rectangle of
//! it (its *screen viewport*, used for split screen).
//!
//! ```text
//!         world                                  screen
//!  ┌───────────────────────┐            ┌──────────────────────┐
//!  │      viewport()       │            │                      │
//!  │   ┌─────────────┐     │  zoom,     │   ┌──────────────┐   │
//!  │   │      ●      │     │  rotation  │   │      ●       │   │
//!  │   │  position   │ ────┼───────────►│   │ offset (view │   │
//!  │   └─────────────┘     │            │   │  center)     │   │
//!  │                       │            │   └──────────────┘   │
//!  └───────────────────────┘            └──────────────────────┘
//! ```
//!
//! The transform is `screen = offset + R(rotation) · ((world − position) · zoom)`,
//! where `offset` is the center of the screen viewport (or of the whole screen
//! when there is none).
//!
//! ## Bounds
//!
//! With bounds set, every change that can move the visible rectangle (pan,
//! zoom, rotation, resize) re-clamps the position so [`Camera::viewport`]
//! stays inside the bounds. When the visible extent on an axis is at least as
//! large as the bounds on that axis, the camera is centered on the bounds on
//! that axis instead; there is no valid clamp, and centering is stable.
//!
//! ## Rotation
//!
//! [`Camera::viewport`] returns the axis-aligned bounding box of the rotated
//! visible rectangle. It over-covers at angles that are not multiples of 90°,
//! which only means a few extra items survive culling.

pub mod manager;

pub use manager::{CameraManager, MAX_CAMERAS, SplitScreenLayout};

use crate::config::CameraConfig;
use crate::math::{Rect, Vec2, rotated_extent};
use crate::render::Camera2d;

/// Errors raised by camera setup calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("invalid zoom {0}: zoom must be finite and greater than zero")]
    InvalidZoom(f32),
    #[error("invalid zoom limits [{min}, {max}]")]
    InvalidZoomLimits { min: f32, max: f32 },
    #[error("invalid camera bounds: max must be greater than min on both axes")]
    InvalidBounds,
    #[error("camera index {0} out of range (maximum is 4 cameras)")]
    IndexOutOfRange(usize),
}

pub const DEFAULT_MIN_ZOOM: f32 = 0.1;
pub const DEFAULT_MAX_ZOOM: f32 = 10.0;

/// A 2D camera with pan, zoom, rotation and optional world bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec2,
    zoom: f32,
    rotation: f32,
    bounds: Option<Rect>,
    screen_viewport: Option<Rect>,
    screen_size: Vec2,
    min_zoom: f32,
    max_zoom: f32,
}

impl Camera {
    /// A camera for a `width`×`height` screen, looking at the screen center so
    /// that world and screen coordinates coincide.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(width * 0.5, height * 0.5),
            zoom: 1.0,
            rotation: 0.0,
            bounds: None,
            screen_viewport: None,
            screen_size: Vec2::new(width, height),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    /// Build from a [`CameraConfig`], validating its zoom settings.
    pub fn from_config(config: &CameraConfig, width: f32, height: f32) -> Result<Self, CameraError> {
        let mut camera = Self::new(width, height);
        camera.set_zoom_limits(config.min_zoom, config.max_zoom)?;
        camera.set_zoom(config.zoom)?;
        Ok(camera)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Degrees, clockwise on screen.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn screen_viewport(&self) -> Option<Rect> {
        self.screen_viewport
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    pub fn zoom_limits(&self) -> (f32, f32) {
        (self.min_zoom, self.max_zoom)
    }

    // ── Movement ────────────────────────────────────────────────────────

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.clamp_to_bounds();
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.position += Vec2::new(dx, dy);
        self.clamp_to_bounds();
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.clamp_to_bounds();
    }

    // ── Zoom ────────────────────────────────────────────────────────────

    /// Set the zoom, clamped to the zoom limits. Non-positive or non-finite
    /// values are rejected and the current zoom is kept.
    pub fn set_zoom(&mut self, zoom: f32) -> Result<(), CameraError> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(CameraError::InvalidZoom(zoom));
        }
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.clamp_to_bounds();
        Ok(())
    }

    /// Add `delta` to the zoom.
    pub fn zoom_by(&mut self, delta: f32) -> Result<(), CameraError> {
        self.set_zoom(self.zoom + delta)
    }

    /// Multiply the zoom by `factor`.
    pub fn zoom_scaled(&mut self, factor: f32) -> Result<(), CameraError> {
        self.set_zoom(self.zoom * factor)
    }

    /// Change the zoom limits and re-clamp the current zoom into them.
    pub fn set_zoom_limits(&mut self, min: f32, max: f32) -> Result<(), CameraError> {
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(CameraError::InvalidZoomLimits { min, max });
        }
        self.min_zoom = min;
        self.max_zoom = max;
        self.zoom = self.zoom.clamp(min, max);
        self.clamp_to_bounds();
        Ok(())
    }

    // ── Bounds ──────────────────────────────────────────────────────────

    /// Restrict the visible area to a world rectangle and re-clamp now.
    pub fn set_bounds(&mut self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Result<(), CameraError> {
        let valid = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite())
            && max_x > min_x
            && max_y > min_y;
        if !valid {
            return Err(CameraError::InvalidBounds);
        }
        self.bounds = Some(Rect::from_min_max(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y)));
        self.clamp_to_bounds();
        Ok(())
    }

    pub fn clear_bounds(&mut self) {
        self.bounds = None;
    }

    // ── Screen mapping ──────────────────────────────────────────────────

    /// Render into a sub-rectangle of the screen. `None` uses the whole screen.
    pub fn set_screen_viewport(&mut self, viewport: Option<Rect>) {
        self.screen_viewport = viewport;
        self.clamp_to_bounds();
    }

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_size = Vec2::new(width, height);
        self.clamp_to_bounds();
    }

    /// Size of the screen area this camera renders into, in pixels.
    pub fn view_size(&self) -> Vec2 {
        self.screen_viewport.map_or(self.screen_size, |v| v.size())
    }

    /// The screen area this camera renders into.
    pub fn view_rect(&self) -> Rect {
        self.screen_viewport
            .unwrap_or(Rect::new(0.0, 0.0, self.screen_size.x, self.screen_size.y))
    }

    /// Screen point the camera position maps to.
    pub fn offset(&self) -> Vec2 {
        self.view_rect().center()
    }

    pub fn to_camera2d(&self) -> Camera2d {
        Camera2d {
            offset: self.offset(),
            target: self.position,
            rotation: self.rotation,
            zoom: self.zoom,
        }
    }

    pub fn world_to_screen(&self, x: f32, y: f32) -> Vec2 {
        self.to_camera2d().world_to_screen(Vec2::new(x, y))
    }

    pub fn screen_to_world(&self, x: f32, y: f32) -> Vec2 {
        self.to_camera2d().screen_to_world(Vec2::new(x, y))
    }

    /// The axis-aligned world rectangle currently visible.
    pub fn viewport(&self) -> Rect {
        let extent = self.visible_extent();
        Rect::new(
            self.position.x - extent.x * 0.5,
            self.position.y - extent.y * 0.5,
            extent.x,
            extent.y,
        )
    }

    /// A copy of this camera for a parallax layer: position scaled per axis,
    /// bounds dropped (the scaled position would fight the clamp).
    pub fn with_parallax(&self, parallax_x: f32, parallax_y: f32) -> Camera {
        if parallax_x == 1.0 && parallax_y == 1.0 {
            return self.clone();
        }
        Camera {
            position: self.position * Vec2::new(parallax_x, parallax_y),
            bounds: None,
            ..self.clone()
        }
    }

    fn visible_extent(&self) -> Vec2 {
        rotated_extent(self.view_size() / self.zoom, self.rotation)
    }

    fn clamp_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let half = self.visible_extent() * 0.5;
        self.position.x = clamp_axis(self.position.x, half.x, bounds.x, bounds.right());
        self.position.y = clamp_axis(self.position.y, half.y, bounds.y, bounds.bottom());
    }
}

/// Clamp a center coordinate so `[center - half, center + half]` stays in
/// `[min, max]`; center on the range when it can't fit.
fn clamp_axis(center: f32, half: f32, min: f32, max: f32) -> f32 {
    if half * 2.0 >= max - min {
        (min + max) * 0.5
    } else {
        center.clamp(min + half, max - half)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    fn approx_vec(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    #[test]
    fn default_maps_world_to_screen_identity() {
        let cam = Camera::new(800.0, 600.0);
        assert_eq!(cam.viewport(), Rect::new(0.0, 0.0, 800.0, 600.0));
        assert!(approx_vec(cam.world_to_screen(12.0, 34.0), Vec2::new(12.0, 34.0)));
    }

    #[test]
    fn zoom_shrinks_viewport() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_zoom(2.0).unwrap();
        assert_eq!(cam.viewport(), Rect::new(200.0, 150.0, 400.0, 300.0));
    }

    #[test]
    fn invalid_zoom_keeps_previous() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_zoom(2.0).unwrap();
        assert_eq!(cam.set_zoom(0.0), Err(CameraError::InvalidZoom(0.0)));
        assert!(cam.set_zoom(-1.0).is_err());
        assert!(cam.set_zoom(f32::NAN).is_err());
        assert!(cam.zoom_by(-5.0).is_err());
        assert_eq!(cam.zoom(), 2.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_zoom(50.0).unwrap();
        assert_eq!(cam.zoom(), DEFAULT_MAX_ZOOM);
        cam.set_zoom(0.01).unwrap();
        assert_eq!(cam.zoom(), DEFAULT_MIN_ZOOM);
    }

    #[test]
    fn zoom_by_negation_restores() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_zoom(1.3).unwrap();
        for d in [0.25, -0.4, 1.7, 0.001] {
            cam.zoom_by(d).unwrap();
            cam.zoom_by(-d).unwrap();
            assert!(approx_eq(cam.zoom(), 1.3), "delta {d}");
        }
    }

    #[test]
    fn zoom_scaled_is_multiplicative() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.zoom_scaled(1.5).unwrap();
        cam.zoom_scaled(2.0).unwrap();
        assert!(approx_eq(cam.zoom(), 3.0));
        assert!(cam.zoom_scaled(0.0).is_err());
    }

    #[test]
    fn zoom_limits_validate_and_reclamp() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_zoom(5.0).unwrap();
        assert!(cam.set_zoom_limits(2.0, 1.0).is_err());
        assert!(cam.set_zoom_limits(0.0, 1.0).is_err());
        cam.set_zoom_limits(0.5, 3.0).unwrap();
        assert_eq!(cam.zoom(), 3.0);
    }

    #[test]
    fn round_trip_screen_world() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_position(-250.0, 1234.5);
        for zoom in [0.25, 1.0, 3.7] {
            cam.set_zoom(zoom).unwrap();
            for p in [Vec2::ZERO, Vec2::new(-999.0, 42.0), Vec2::new(3.3, -0.7)] {
                let s = cam.world_to_screen(p.x, p.y);
                let back = cam.screen_to_world(s.x, s.y);
                assert!(approx_vec(back, p), "zoom {zoom}: {p} -> {back}");
            }
        }
    }

    #[test]
    fn bounds_keep_viewport_inside_after_pans() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_bounds(0.0, 0.0, 1600.0, 1200.0).unwrap();
        let pans = [
            (-5000.0, 0.0),
            (300.0, -20.0),
            (10_000.0, 10_000.0),
            (-123.0, -456.0),
            (0.5, 700.0),
        ];
        for (dx, dy) in pans {
            cam.pan(dx, dy);
            let v = cam.viewport();
            assert!(v.x >= -EPS && v.right() <= 1600.0 + EPS, "{v:?}");
            assert!(v.y >= -EPS && v.bottom() <= 1200.0 + EPS, "{v:?}");
        }
    }

    #[test]
    fn oversized_viewport_is_centered() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_bounds(0.0, 0.0, 400.0, 2000.0).unwrap();
        cam.pan(1000.0, 0.0);
        assert_eq!(cam.position().x, 200.0);
        cam.pan(-3000.0, 0.0);
        assert_eq!(cam.position().x, 200.0);
        // Y still clamps normally.
        cam.set_position(0.0, 0.0);
        assert_eq!(cam.position().y, 300.0);
    }

    #[test]
    fn setting_bounds_reclamps_immediately() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_position(5000.0, 5000.0);
        cam.set_bounds(0.0, 0.0, 1600.0, 1200.0).unwrap();
        assert_eq!(cam.position(), Vec2::new(1200.0, 900.0));
    }

    #[test]
    fn invalid_bounds_rejected() {
        let mut cam = Camera::new(800.0, 600.0);
        assert_eq!(cam.set_bounds(10.0, 0.0, 10.0, 5.0), Err(CameraError::InvalidBounds));
        assert_eq!(cam.bounds(), None);
    }

    #[test]
    fn rotated_viewport_is_conservative() {
        let mut cam = Camera::new(200.0, 100.0);
        cam.set_rotation(90.0);
        let v = cam.viewport();
        assert!(approx_eq(v.width, 100.0));
        assert!(approx_eq(v.height, 200.0));
        // Every screen corner maps into the viewport.
        for corner in Rect::new(0.0, 0.0, 200.0, 100.0).corners() {
            let w = cam.screen_to_world(corner.x, corner.y);
            assert!(w.x >= v.x - EPS && w.x <= v.right() + EPS);
            assert!(w.y >= v.y - EPS && w.y <= v.bottom() + EPS);
        }
    }

    #[test]
    fn screen_viewport_moves_offset() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_screen_viewport(Some(Rect::new(400.0, 0.0, 400.0, 600.0)));
        cam.set_position(0.0, 0.0);
        assert_eq!(cam.offset(), Vec2::new(600.0, 300.0));
        assert!(approx_vec(cam.world_to_screen(0.0, 0.0), Vec2::new(600.0, 300.0)));
        assert_eq!(cam.viewport(), Rect::new(-200.0, -300.0, 400.0, 600.0));
    }

    #[test]
    fn parallax_scales_position() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.set_bounds(0.0, 0.0, 4000.0, 4000.0).unwrap();
        cam.set_position(1000.0, 800.0);
        let far = cam.with_parallax(0.5, 0.0);
        assert_eq!(far.position(), Vec2::new(500.0, 0.0));
        assert_eq!(far.bounds(), None);
    }
}
