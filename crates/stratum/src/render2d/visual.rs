//! Sprite and text visual records.
//!
//! These are plain data owned by the [`VisualStore`](crate::store::VisualStore).
//! The renderer only ever reads them.

use serde::{Deserialize, Serialize};

use super::Color;
use crate::layer::LayerId;
use crate::math::Vec2;

/// Anchor point of a sprite, normalized to its bounding box.
///
/// The pivot is the point aligned to the sprite's position and the center of
/// its rotation. `(0, 0)` is the top-left corner, `(1, 1)` the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pivot {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    /// Explicit normalized coordinates. Values are clamped to `[0, 1]`.
    Custom { x: f32, y: f32 },
}

impl Pivot {
    /// The normalized `(px, py)` anchor.
    pub fn normalized(self) -> Vec2 {
        match self {
            Pivot::TopLeft => Vec2::new(0.0, 0.0),
            Pivot::TopCenter => Vec2::new(0.5, 0.0),
            Pivot::TopRight => Vec2::new(1.0, 0.0),
            Pivot::CenterLeft => Vec2::new(0.0, 0.5),
            Pivot::Center => Vec2::new(0.5, 0.5),
            Pivot::CenterRight => Vec2::new(1.0, 0.5),
            Pivot::BottomLeft => Vec2::new(0.0, 1.0),
            Pivot::BottomCenter => Vec2::new(0.5, 1.0),
            Pivot::BottomRight => Vec2::new(1.0, 1.0),
            Pivot::Custom { x, y } => Vec2::new(clamp_unit(x), clamp_unit(y)),
        }
    }

    /// The anchor snapped to the nearest named preset (0, 0.5 or 1 per axis).
    ///
    /// Tiling only distinguishes corners, edge midpoints and the center.
    pub fn tiling_anchor(self) -> Vec2 {
        let p = self.normalized();
        Vec2::new(snap_half(p.x), snap_half(p.y))
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) }
}

fn snap_half(v: f32) -> f32 {
    (v * 2.0).round() * 0.5
}

/// How a sprite fills its [`Container`], like CSS `background-size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    /// Natural size times `scale`; the container is ignored.
    #[default]
    None,
    /// Fill the container exactly, ignoring aspect ratio.
    Stretch,
    /// Uniform scale so the sprite covers the container; overflow is kept.
    Cover,
    /// Uniform scale so the sprite fits inside the container, centered.
    Contain,
    /// Like `Contain`, but never upscales.
    ScaleDown,
    /// Tile the scaled sprite across the container, clipped to it.
    Repeat,
}

/// The rectangle a sized sprite fills.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// A fixed size whose top-left corner sits at the sprite's position.
    Explicit { width: f32, height: f32 },
    /// The current screen (or camera screen viewport) dimensions.
    #[default]
    Viewport,
    /// The active camera's world-space visible rectangle, recomputed every frame.
    CameraViewport,
}

/// A sprite drawn from a texture atlas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteVisual {
    /// Atlas key of the sprite, e.g. `"player_idle_0001"`.
    pub sprite_name: String,
    pub scale: f32,
    /// Rotation in degrees about the pivot, clockwise on screen.
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub tint: Color,
    pub pivot: Pivot,
    pub size_mode: SizeMode,
    pub container: Container,
    pub layer: LayerId,
    pub visible: bool,
    pub z_index: i32,
}

impl SpriteVisual {
    pub fn new(sprite_name: impl Into<String>) -> Self {
        Self {
            sprite_name: sprite_name.into(),
            scale: 1.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            tint: Color::WHITE,
            pivot: Pivot::Center,
            size_mode: SizeMode::None,
            container: Container::Viewport,
            layer: LayerId::WORLD,
            visible: true,
            z_index: 0,
        }
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn flip(mut self, x: bool, y: bool) -> Self {
        self.flip_x = x;
        self.flip_y = y;
        self
    }

    pub fn tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn pivot(mut self, pivot: Pivot) -> Self {
        self.pivot = pivot;
        self
    }

    /// Set the size mode and the container it fills.
    pub fn sized(mut self, mode: SizeMode, container: Container) -> Self {
        self.size_mode = mode;
        self.container = container;
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

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// A run of text. Text is never culled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextVisual {
    pub text: String,
    /// Font size in layer units (pixels on screen-space layers).
    pub size: f32,
    pub color: Color,
    pub layer: LayerId,
    pub visible: bool,
    pub z_index: i32,
}

impl TextVisual {
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            size,
            color: Color::WHITE,
            layer: LayerId::UI,
            visible: true,
            z_index: 0,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
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
}
