//! # Sizing — `background-size` for Sprites
//!
//! A sprite with a [`SizeMode`] other than `None` is laid out against a
//! container rectangle instead of at its natural size:
//!
//! ```text
//!  container 150×100, sprite 64×64
//!
//!  Stretch          Cover             Contain          Repeat
//!  ┌──────────┐   ┌┄┄┄┄┄┄┄┄┄┄┐      ┌──┬──────┬──┐   ┌───┬───┬──┐
//!  │██████████│   ┆██████████┆      │  │██████│  │   │▓▓▓│▓▓▓│▓▓│
//!  │██████████│   │██████████│      │  │██████│  │   ├───┼───┼──┤
//!  │██████████│   │██████████│      │  │██████│  │   │▓▓▓│▓▓▓│▓▓│
//!  └──────────┘   ┆██████████┆      └──┴──────┴──┘   └───┴───┴──┘
//!  aspect lost    overflow kept      letterboxed      clipped tiles
//! ```
//!
//! Everything here is pure math on rectangles in the layer's coordinate
//! space; the renderer turns the result into draw calls.

use super::visual::{Container, SizeMode};
use crate::math::{Rect, Vec2};

/// Upper bound on tiles drawn for one repeating sprite.
pub const MAX_TILES: usize = 16_384;

/// What a container resolves against for one layer pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerContext {
    /// Pixel size of the screen area being drawn into.
    pub view_size: Vec2,
    /// Visible rectangle in layer coordinates (the camera's world viewport for
    /// world layers, `(0, 0, view_size)` for screen layers).
    pub visible: Rect,
}

/// Resolve a container to a rectangle in layer coordinates.
///
/// - `Explicit` is anchored with its top-left corner at `position`.
/// - `Viewport` is `(0, 0, view_size)`.
/// - `CameraViewport` is the currently visible rectangle.
pub fn resolve_container(container: Container, position: Vec2, ctx: &ContainerContext) -> Rect {
    match container {
        Container::Explicit { width, height } => Rect::new(position.x, position.y, width, height),
        Container::Viewport => Rect::new(0.0, 0.0, ctx.view_size.x, ctx.view_size.y),
        Container::CameraViewport => ctx.visible,
    }
}

/// Result of laying out a sized sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// One box covering the sprite's untrimmed source area.
    Single(Rect),
    /// A grid of tiles clipped to a container.
    Tiled(Tiling),
}

/// A tile grid: tiles of size `tile` laid out from `start`, covering `clip`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tiling {
    pub clip: Rect,
    pub start: Vec2,
    pub tile: Vec2,
}

impl Tiling {
    fn columns(&self) -> usize {
        ((self.clip.right() - self.start.x) / self.tile.x).ceil().max(0.0) as usize
    }

    fn rows(&self) -> usize {
        ((self.clip.bottom() - self.start.y) / self.tile.y).ceil().max(0.0) as usize
    }

    /// Tiles needed to cover the clip rectangle.
    pub fn tile_count(&self) -> usize {
        self.columns().saturating_mul(self.rows())
    }

    /// Tile boxes row by row, at most [`MAX_TILES`].
    pub fn tiles(&self) -> impl Iterator<Item = Rect> + '_ {
        let columns = self.columns();
        (0..self.rows())
            .flat_map(move |row| (0..columns).map(move |col| (row, col)))
            .take(MAX_TILES)
            .map(|(row, col)| {
                Rect::new(
                    self.start.x + col as f32 * self.tile.x,
                    self.start.y + row as f32 * self.tile.y,
                    self.tile.x,
                    self.tile.y,
                )
            })
    }
}

/// Lay out a `source`-sized sprite in `container`.
///
/// `scale` is only used by `Repeat`. `anchor` is the normalized tiling anchor
/// (see [`Pivot::tiling_anchor`](super::Pivot::tiling_anchor)): the tile grid
/// is aligned so one tile sits at that point of the container.
///
/// Returns `None` for `SizeMode::None` and for degenerate inputs; the caller
/// then draws the sprite at its natural size.
pub fn fit(mode: SizeMode, source: Vec2, container: Rect, scale: f32, anchor: Vec2) -> Option<Placement> {
    if container.is_degenerate() || !(source.x > 0.0 && source.y > 0.0) {
        return None;
    }
    let ratio = container.size() / source;
    let uniform = |s: f32| Placement::Single(centered(container, source * s));
    let placement = match mode {
        SizeMode::None => return None,
        SizeMode::Stretch => Placement::Single(container),
        SizeMode::Cover => uniform(ratio.max_element()),
        SizeMode::Contain => uniform(ratio.min_element()),
        SizeMode::ScaleDown => uniform(ratio.min_element().min(1.0)),
        SizeMode::Repeat => {
            let tile = source * scale.abs();
            if !(tile.x > 0.0 && tile.y > 0.0) {
                return None;
            }
            Placement::Tiled(Tiling {
                clip: container,
                start: tiling_start(container, tile, anchor),
                tile,
            })
        }
    };
    Some(placement)
}

fn centered(container: Rect, size: Vec2) -> Rect {
    let min = container.center() - size * 0.5;
    Rect::new(min.x, min.y, size.x, size.y)
}

/// Top-left of the first tile: the anchored tile, stepped back whole tiles
/// until it reaches the container's top-left edge.
fn tiling_start(container: Rect, tile: Vec2, anchor: Vec2) -> Vec2 {
    let anchored = container.min() + anchor * container.size() - anchor * tile;
    let back = ((anchored - container.min()) / tile).ceil().max(Vec2::ZERO);
    anchored - back * tile
}
