//! Convenience re-exports: `use stratum::prelude::*` brings in the common items.

pub use crate::animation::{Animation, AnimationPlayer};
pub use crate::atlas::{Atlas, AtlasError, ResourceRegistry, SpriteData, SpriteRef};
pub use crate::camera::{Camera, CameraError, CameraManager, MAX_CAMERAS, SplitScreenLayout};
pub use crate::config::{CameraConfig, RenderConfig};
pub use crate::layer::{LayerConfig, LayerDescriptor, LayerEnum, LayerId, LayerMask, LayerRegistry, LayerSpace};
pub use crate::math::{Rect, Vec2};
pub use crate::render::{Backend, BackendError, Camera2d, DrawCommand, RecordingBackend, ScissorRect, TextureHandle};
#[cfg(feature = "software")]
pub use crate::render::SoftwareBackend;
pub use crate::render2d::{
    CameraSet, Color, Container, DrawStyle, FrameContext, Pivot, RenderStats, Renderer, Shape,
    ShapeVisual, SizeMode, SpriteVisual, TextVisual,
};
pub use crate::store::{EntityId, VisualStore};
#[cfg(feature = "hot-reload")]
pub use crate::asset::AtlasWatcher;
