//! # Render2d — Layered Sprite, Shape and Text Drawing
//!
//! The renderer walks every active camera, every visible layer of that camera
//! in priority order, and every item of that layer in z order. World-space
//! items are culled against the camera viewport before any backend call is
//! made.
//!
//! ## Architecture
//!
//! ```text
//!  FrameContext (screen size, cameras)
//!         │
//!         ▼
//!  ┌──────────────┐  for each active camera
//!  │  scissor to   │─────────────────────────────────────┐
//!  │  its viewport │                                     │
//!  └──────┬───────┘                                     │
//!         ▼                                              │
//!  ┌──────────────┐  for each layer (priority order)     │
//!  │ world layer? │── yes ─► push parallax camera ──┐    │
//!  │              │── no ──► translate to viewport ─┤    │
//!  └──────────────┘                                 ▼    │
//!                                     ┌───────────────────┐
//!                                     │ z-bucket iterate  │
//!                                     │ cull → resolve →  │
//!                                     │ backend draw call │
//!                                     └───────────────────┘
//! ```
//!
//! - [`visual`]: the sprite and text records.
//! - [`shapes`]: vector primitives and their bounds.
//! - [`sizing`]: `background-size`-style placement math.
//! - [`cull`]: world-space bounds of sprites against viewports.
//! - [`draw`]: the [`Renderer`] that ties it together.
//!
//! ## Design Decisions
//!
//! **Painter's algorithm, no sorting per frame.** Draw order comes from the
//! z-buckets, which stay sorted as items change. A frame is a straight walk.
//!
//! **Fail open on missing sprites.** An unknown sprite name can't be culled
//! (its size is unknown), so it counts as visible and its draw is skipped.
//! A missing asset shows up as a gap on screen and a warning in the log.

pub mod cull;
pub mod draw;
pub mod shapes;
pub mod sizing;
pub mod visual;

pub use draw::{CameraSet, FrameContext, RenderStats, Renderer};
pub use shapes::{DrawStyle, Shape, ShapeVisual};
pub use sizing::Placement;
pub use visual::{Container, Pivot, SizeMode, SpriteVisual, TextVisual};

use serde::{Deserialize, Serialize};

/// An RGBA color with floating-point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Self = Self::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::rgba(0.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Self = Self::rgba(1.0, 1.0, 0.0, 1.0);
    pub const GRAY: Self = Self::rgba(0.5, 0.5, 0.5, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from RGB (alpha = 1).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// From 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Quantize to 8-bit channels, clamping out-of-range components.
    pub fn to_rgba8(self) -> [u8; 4] {
        self.to_array()
            .map(|c| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
