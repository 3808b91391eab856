//! Sprite layout and viewport culling.
//!
//! A sprite's box is its untrimmed source rectangle, scaled and placed so its
//! pivot lands on the entity position. Rotation turns the box about that
//! pivot; the culling test uses the axis-aligned bounds of the turned box.
//!
//! ```text
//!        position (pivot = Center)
//!            │
//!   ┌────────┼────────┐
//!   │   ┌────▼───┐    │  ◄── bounds of the box rotated 30°
//!   │   │   ●    │    │
//!   │   └────────┘    │
//!   └─────────────────┘
//! ```

use super::sizing::{self, ContainerContext, Placement};
use super::visual::{SizeMode, SpriteVisual};
use crate::atlas::SpriteData;
use crate::math::{Rect, Vec2};

/// Lay out a sprite: a single box at natural size, or the result of its
/// size mode when one is set and resolvable.
pub fn layout_sprite(
    visual: &SpriteVisual,
    data: &SpriteData,
    position: Vec2,
    ctx: &ContainerContext,
) -> Placement {
    let source = data.source_size();
    if visual.size_mode != SizeMode::None {
        let container = sizing::resolve_container(visual.container, position, ctx);
        let anchor = visual.pivot.tiling_anchor();
        if let Some(placement) = sizing::fit(visual.size_mode, source, container, visual.scale, anchor) {
            return placement;
        }
    }
    Placement::Single(natural_box(visual, source, position))
}

/// The untrimmed box at natural size with its pivot at `position`.
pub fn natural_box(visual: &SpriteVisual, source: Vec2, position: Vec2) -> Rect {
    let size = source * visual.scale.abs();
    let min = position - visual.pivot.normalized() * size;
    Rect::new(min.x, min.y, size.x, size.y)
}

/// The point a box rotates about.
pub fn pivot_point(bounds: Rect, visual: &SpriteVisual) -> Vec2 {
    bounds.min() + visual.pivot.normalized() * bounds.size()
}

/// Axis-aligned bounds of a laid-out sprite in layer coordinates.
///
/// Tiled sprites never draw outside their container.
pub fn placement_bounds(placement: &Placement, visual: &SpriteVisual) -> Rect {
    match placement {
        Placement::Single(b) => b.rotated_bounds(pivot_point(*b, visual), visual.rotation),
        Placement::Tiled(tiling) => tiling.clip,
    }
}

/// Bounds of a sprite drawn at natural size, ignoring its size mode.
///
/// Same as [`placement_bounds`] on the natural box.
pub fn sprite_bounds(visual: &SpriteVisual, data: &SpriteData, position: Vec2) -> Rect {
    let placement = Placement::Single(natural_box(visual, data.source_size(), position));
    placement_bounds(&placement, visual)
}

/// True when `bounds` overlaps the viewport. Degenerate bounds never do.
pub fn is_visible(bounds: &Rect, viewport: &Rect) -> bool {
    !bounds.is_degenerate() && bounds.overlaps(viewport)
}
