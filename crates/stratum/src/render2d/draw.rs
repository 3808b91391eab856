//! The per-frame renderer.
//!
//! [`Renderer::render`] brackets a frame with `begin_frame`/`end_frame` and
//! draws every active camera. [`Renderer::render_layers_for_camera`] draws
//! one camera's layers into a frame the caller manages.
//!
//! Nothing here returns errors. A stale handle, an unknown sprite name or a
//! degenerate container skips that one item and the frame carries on.

use std::collections::HashSet;

use super::cull;
use super::shapes::{DrawStyle, Shape, ShapeVisual};
use super::sizing::{ContainerContext, MAX_TILES, Placement, Tiling};
use super::visual::{SpriteVisual, TextVisual};
use crate::atlas::{ResourceRegistry, SpriteData};
use crate::camera::{Camera, CameraManager};
use crate::config::RenderConfig;
use crate::layer::{LayerConfig, LayerId, LayerMask, LayerRegistry};
use crate::math::{Rect, Vec2};
use crate::render::{Backend, Camera2d, ScissorRect, TextureHandle};
use crate::render2d::Color;
use crate::store::{Entry, ItemKind, RenderItem, VisualStore};

// ── Frame input ─────────────────────────────────────────────────────────

/// The cameras a frame is drawn through.
#[derive(Debug, Clone, Copy)]
pub enum CameraSet<'a> {
    /// One camera, filtered by the renderer's global layer visibility.
    Single(&'a Camera),
    /// Every active slot of a manager, each with its own layer mask.
    Multi(&'a CameraManager),
}

/// Everything a frame needs besides the store and the atlases.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Screen size in pixels. Clips repeat-mode sprites when no camera
    /// scissor is active.
    pub screen_size: Vec2,
    pub cameras: CameraSet<'a>,
}

impl<'a> FrameContext<'a> {
    pub fn single(camera: &'a Camera) -> Self {
        Self {
            screen_size: camera.screen_size(),
            cameras: CameraSet::Single(camera),
        }
    }

    pub fn split(manager: &'a CameraManager) -> Self {
        Self {
            screen_size: manager.screen_size(),
            cameras: CameraSet::Multi(manager),
        }
    }
}

/// Counters for the last rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub cameras: u32,
    /// Layer passes with at least one item (counted per camera).
    pub layers: u32,
    pub sprites_drawn: u32,
    pub sprites_culled: u32,
    pub shapes_drawn: u32,
    pub shapes_culled: u32,
    pub texts_drawn: u32,
    /// Sprite names not found in any atlas.
    pub missing_sprites: u32,
    /// Bucket entries whose entity no longer resolves.
    pub stale_items: u32,
}

// ── Layer pass ──────────────────────────────────────────────────────────

/// State for drawing one layer through one camera.
struct LayerPass {
    /// `None` draws in raw screen coordinates.
    transform: Option<Camera2d>,
    /// `None` disables culling (screen-space layers).
    cull: Option<Rect>,
    containers: ContainerContext,
    /// Scissor in effect for the whole pass.
    outer_clip: ScissorRect,
    /// Whether `outer_clip` was set on the backend and must be restored.
    outer_active: bool,
}

impl LayerPass {
    fn world(camera: &Camera, config: &LayerConfig, margin: f32, clip: ScissorRect, clip_active: bool) -> Self {
        let view = camera.with_parallax(config.parallax_x, config.parallax_y);
        let visible = view.viewport();
        Self {
            transform: Some(view.to_camera2d()),
            cull: Some(visible.expand(margin)),
            containers: ContainerContext {
                view_size: camera.view_size(),
                visible,
            },
            outer_clip: clip,
            outer_active: clip_active,
        }
    }

    /// Screen layers draw relative to the camera's screen viewport.
    fn screen(camera: &Camera, clip: ScissorRect, clip_active: bool) -> Self {
        let view = camera.view_rect();
        let origin = view.min();
        Self {
            transform: (origin != Vec2::ZERO).then(|| Camera2d::translation(origin)),
            cull: None,
            containers: ContainerContext {
                view_size: view.size(),
                visible: Rect::new(0.0, 0.0, view.width, view.height),
            },
            outer_clip: clip,
            outer_active: clip_active,
        }
    }

    /// Screen-pixel bounds of a layer-space rectangle.
    fn to_screen(&self, rect: Rect) -> Rect {
        match &self.transform {
            Some(t) => Rect::from_points(rect.corners().map(|c| t.world_to_screen(c))).unwrap_or(rect),
            None => rect,
        }
    }
}

// ── Sprite quads ────────────────────────────────────────────────────────

/// Arguments for one `draw_texture_pro` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextureQuad {
    pub src: Rect,
    pub dest: Rect,
    pub origin: Vec2,
    pub rotation: f32,
}

/// Map a sprite's untrimmed box to a textured quad.
///
/// `pivot` is normalized within `bounds` and is the rotation center. Trim
/// offsets are mirrored when flipped so the content stays inside the box.
/// Atlas-rotated regions are drawn turned by -90°.
pub(crate) fn texture_quad(
    data: &SpriteData,
    bounds: Rect,
    pivot: Vec2,
    rotation: f32,
    flip_x: bool,
    flip_y: bool,
) -> TextureQuad {
    let source = data.source_size();
    let scale = bounds.size() / source;
    let display = data.display_size();

    let mut offset = data.content_offset();
    if flip_x {
        offset.x = source.x - offset.x - display.x;
    }
    if flip_y {
        offset.y = source.y - offset.y - display.y;
    }

    let content_min = bounds.min() + offset * scale;
    let content = display * scale;
    let pivot_point = bounds.min() + pivot * bounds.size();
    // Pivot relative to the content's top-left.
    let local = pivot_point - content_min;

    let mut src = data.region();
    if data.rotated {
        // Display x runs along the region's height.
        if flip_x {
            src.height = -src.height;
        }
        if flip_y {
            src.width = -src.width;
        }
        TextureQuad {
            src,
            dest: Rect::new(pivot_point.x, pivot_point.y, content.y, content.x),
            origin: Vec2::new(content.y - local.y, local.x),
            rotation: rotation - 90.0,
        }
    } else {
        if flip_x {
            src.width = -src.width;
        }
        if flip_y {
            src.height = -src.height;
        }
        TextureQuad {
            src,
            dest: Rect::new(pivot_point.x, pivot_point.y, content.x, content.y),
            origin: local,
            rotation,
        }
    }
}

fn draw_quad(backend: &mut dyn Backend, texture: TextureHandle, quad: TextureQuad, tint: Color) {
    backend.draw_texture_pro(texture, quad.src, quad.dest, quad.origin, quad.rotation, tint);
}

// ── Renderer ────────────────────────────────────────────────────────────

/// Draws a [`VisualStore`] through one or more cameras.
pub struct Renderer {
    layers: LayerRegistry,
    visible: LayerMask,
    config: RenderConfig,
    stats: RenderStats,
    warned_missing: HashSet<String>,
}

impl Renderer {
    pub fn new(layers: LayerRegistry, config: RenderConfig) -> Self {
        let visible = layers.default_visible();
        Self {
            layers,
            visible,
            config,
            stats: RenderStats::default(),
            warned_missing: HashSet::new(),
        }
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    /// Counters from the last [`render`](Self::render) call.
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Globally show or hide a layer for every camera.
    pub fn set_layer_visible(&mut self, layer: LayerId, visible: bool) {
        self.visible.set(layer, visible);
    }

    pub fn is_layer_visible(&self, layer: LayerId) -> bool {
        self.visible.contains(layer)
    }

    pub fn visible_layers(&self) -> LayerMask {
        self.visible
    }

    pub fn set_visible_layers(&mut self, mask: LayerMask) {
        self.visible = mask;
    }

    /// Draw a full frame.
    pub fn render(
        &mut self,
        backend: &mut dyn Backend,
        frame: &FrameContext<'_>,
        store: &VisualStore,
        resources: &ResourceRegistry,
    ) {
        self.stats = RenderStats::default();
        backend.begin_frame(self.config.clear_color);

        let screen = ScissorRect::from_rect(Rect::new(0.0, 0.0, frame.screen_size.x, frame.screen_size.y));
        match frame.cameras {
            CameraSet::Single(camera) => {
                self.draw_camera(backend, camera, self.visible, screen, false, store, resources);
            }
            CameraSet::Multi(manager) => {
                for (index, camera) in manager.active_cameras() {
                    let mask = manager.layer_mask(index).unwrap_or(LayerMask::ALL).intersect(self.visible);
                    if self.config.split_scissor {
                        let clip = ScissorRect::from_rect(camera.view_rect());
                        backend.begin_scissor(clip);
                        self.draw_camera(backend, camera, mask, clip, true, store, resources);
                        backend.end_scissor();
                    } else {
                        self.draw_camera(backend, camera, mask, screen, false, store, resources);
                    }
                }
            }
        }

        backend.end_frame();
        log::trace!("Frame stats: {:?}", self.stats);
    }

    /// Draw the layers in `mask` (intersected with global visibility) through
    /// `camera`, without beginning or ending a frame. Counters accumulate
    /// until the next [`render`](Self::render).
    pub fn render_layers_for_camera(
        &mut self,
        backend: &mut dyn Backend,
        camera: &Camera,
        mask: LayerMask,
        store: &VisualStore,
        resources: &ResourceRegistry,
    ) {
        let size = camera.screen_size();
        let screen = ScissorRect::from_rect(Rect::new(0.0, 0.0, size.x, size.y));
        let mask = mask.intersect(self.visible);
        self.draw_camera(backend, camera, mask, screen, false, store, resources);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_camera(
        &mut self,
        backend: &mut dyn Backend,
        camera: &Camera,
        mask: LayerMask,
        clip: ScissorRect,
        clip_active: bool,
        store: &VisualStore,
        resources: &ResourceRegistry,
    ) {
        self.stats.cameras += 1;

        for i in 0..self.layers.sorted().len() {
            let layer = self.layers.sorted()[i];
            if !mask.contains(layer) {
                continue;
            }
            let Some(config) = self.layers.config(layer).copied() else {
                continue;
            };
            let Some(bucket) = store.bucket(layer).filter(|b| !b.is_empty()) else {
                continue;
            };

            let pass = if config.is_screen_space() {
                LayerPass::screen(camera, clip, clip_active)
            } else {
                LayerPass::world(camera, &config, self.config.cull_margin, clip, clip_active)
            };
            self.stats.layers += 1;

            if let Some(transform) = pass.transform {
                backend.begin_mode_2d(transform);
            }
            for item in bucket.iter() {
                self.draw_item(backend, &pass, item, store, resources);
            }
            if pass.transform.is_some() {
                backend.end_mode_2d();
            }
        }
    }

    fn draw_item(
        &mut self,
        backend: &mut dyn Backend,
        pass: &LayerPass,
        item: &RenderItem,
        store: &VisualStore,
        resources: &ResourceRegistry,
    ) {
        match item.kind {
            ItemKind::Sprite => match store.sprite(item.entity) {
                Some(entry) => self.draw_sprite(backend, pass, entry, resources),
                None => self.stale(item),
            },
            ItemKind::Shape => match store.shape(item.entity) {
                Some(entry) => self.draw_shape(backend, pass, entry),
                None => self.stale(item),
            },
            ItemKind::Text => match store.text(item.entity) {
                Some(entry) => self.draw_text(backend, entry),
                None => self.stale(item),
            },
        }
    }

    fn stale(&mut self, item: &RenderItem) {
        self.stats.stale_items += 1;
        log::trace!("Skipping stale {:?} {:?}", item.kind, item.entity);
    }

    fn missing(&mut self, name: &str) {
        self.stats.missing_sprites += 1;
        if self.warned_missing.contains(name) {
            log::trace!("Sprite '{name}' not found");
        } else {
            log::warn!("Sprite '{name}' not found in any loaded atlas");
            self.warned_missing.insert(name.to_owned());
        }
    }

    fn draw_sprite(
        &mut self,
        backend: &mut dyn Backend,
        pass: &LayerPass,
        entry: Entry<'_, SpriteVisual>,
        resources: &ResourceRegistry,
    ) {
        let visual = entry.visual;
        if !visual.visible {
            return;
        }
        // Unknown size, so it can't be culled. Counted visible, nothing drawn.
        let Some(sprite) = resources.find_sprite(&visual.sprite_name) else {
            self.missing(&visual.sprite_name);
            return;
        };

        let placement = cull::layout_sprite(visual, sprite.data, entry.position, &pass.containers);
        if let Some(viewport) = &pass.cull {
            if !cull::is_visible(&cull::placement_bounds(&placement, visual), viewport) {
                self.stats.sprites_culled += 1;
                return;
            }
        }

        let texture = sprite.atlas.texture();
        match placement {
            Placement::Single(bounds) => {
                if bounds.is_degenerate() {
                    return;
                }
                let quad = texture_quad(
                    sprite.data,
                    bounds,
                    visual.pivot.normalized(),
                    visual.rotation,
                    visual.flip_x,
                    visual.flip_y,
                );
                draw_quad(backend, texture, quad, visual.tint);
            }
            Placement::Tiled(tiling) => {
                if !draw_tiled(backend, pass, &tiling, sprite.data, texture, visual) {
                    return;
                }
            }
        }
        self.stats.sprites_drawn += 1;
    }

    fn draw_shape(&mut self, backend: &mut dyn Backend, pass: &LayerPass, entry: Entry<'_, ShapeVisual>) {
        let visual = entry.visual;
        if !visual.visible {
            return;
        }
        if let Some(viewport) = &pass.cull {
            // Zero-area bounds (a horizontal hairline) still overlap when inside.
            if !visual.bounds(entry.position).overlaps(viewport) {
                self.stats.shapes_culled += 1;
                return;
            }
        }
        draw_shape(backend, visual, entry.position);
        self.stats.shapes_drawn += 1;
    }

    fn draw_text(&mut self, backend: &mut dyn Backend, entry: Entry<'_, TextVisual>) {
        let visual = entry.visual;
        if !visual.visible || visual.text.is_empty() {
            return;
        }
        backend.draw_text(&visual.text, entry.position, visual.size, visual.color);
        self.stats.texts_drawn += 1;
    }
}

/// Tile a sprite over its container, clipped to the container's screen
/// bounds. Returns `false` when the clip is empty and nothing was drawn.
fn draw_tiled(
    backend: &mut dyn Backend,
    pass: &LayerPass,
    tiling: &Tiling,
    data: &SpriteData,
    texture: TextureHandle,
    visual: &SpriteVisual,
) -> bool {
    let Some(clip) = pass
        .to_screen(tiling.clip)
        .intersection(&pass.outer_clip.to_rect())
    else {
        return false;
    };
    let count = tiling.tile_count();
    if count > MAX_TILES {
        log::debug!("Sprite '{}' needs {count} tiles, drawing {MAX_TILES}", visual.sprite_name);
    }

    backend.begin_scissor(ScissorRect::from_rect(clip));
    for tile in tiling.tiles() {
        let quad = texture_quad(data, tile, Vec2::ZERO, 0.0, visual.flip_x, visual.flip_y);
        draw_quad(backend, texture, quad, visual.tint);
    }
    backend.end_scissor();
    if pass.outer_active {
        backend.begin_scissor(pass.outer_clip);
    }
    true
}

/// Issue the backend calls for one shape.
fn draw_shape(backend: &mut dyn Backend, visual: &ShapeVisual, position: Vec2) {
    let color = visual.color;
    let style = visual.style;
    match &visual.shape {
        Shape::Circle { radius } => backend.draw_circle(position, radius.abs(), style, color),
        Shape::Rectangle { width, height } => {
            let rect = Rect::from_min_max(position, position + Vec2::new(*width, *height));
            if visual.rotation == 0.0 {
                backend.draw_rectangle(rect, style, color);
            } else {
                let corners = rect.corners().map(|c| visual.point(position, c - position));
                backend.draw_polygon(&corners, style, color);
            }
        }
        Shape::Line { end, thickness } => {
            backend.draw_line(position, visual.point(position, *end), *thickness, color);
        }
        Shape::Triangle { b, c } => {
            let points = [position, visual.point(position, *b), visual.point(position, *c)];
            backend.draw_triangle(points, style, color);
        }
        Shape::Polygon { points } => {
            if points.len() < 3 {
                return;
            }
            let world: Vec<Vec2> = points.iter().map(|p| visual.point(position, *p)).collect();
            backend.draw_polygon(&world, style, color);
        }
        Shape::Arrow { end, head_size, thickness } => {
            let tip = visual.point(position, *end);
            let dir = (tip - position).normalize_or_zero();
            if dir == Vec2::ZERO {
                return;
            }
            let head = head_size.abs().min((tip - position).length());
            let base = tip - dir * head;
            let side = dir.perp() * head * 0.5;
            backend.draw_line(position, base, *thickness, color);
            backend.draw_triangle([tip, base + side, base - side], DrawStyle::Fill, color);
        }
        Shape::Ray { direction, length, thickness } => {
            let end = visual.point(position, direction.normalize_or_zero() * *length);
            backend.draw_line(position, end, *thickness, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::Atlas;
    use crate::camera::SplitScreenLayout;
    use crate::math::{Mat2, rotate_about};
    use crate::render::{DrawCommand, RecordingBackend};
    use crate::render2d::{Container, Pivot, SizeMode};

    const EPS: f32 = 1e-3;

    fn approx_vec(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < EPS
    }

    fn approx_rect(a: Rect, b: Rect) -> bool {
        approx_vec(a.min(), b.min()) && approx_vec(a.size(), b.size())
    }

    fn resources() -> ResourceRegistry {
        let mut atlas = Atlas::new("sprites", TextureHandle::new(0));
        atlas.insert_sprite("box", SpriteData::new(0.0, 0.0, 64.0, 64.0));
        atlas.insert_sprite("tile", SpriteData::new(64.0, 0.0, 64.0, 64.0));
        let mut registry = ResourceRegistry::new();
        registry.insert_atlas(atlas).unwrap();
        registry
    }

    fn renderer() -> Renderer {
        Renderer::new(LayerRegistry::default(), RenderConfig::default())
    }

    /// Screen-space corners of a recorded texture quad (rotation about dest.xy).
    fn quad_corners(quad: &TextureQuad) -> [Vec2; 4] {
        let rot = Mat2::from_angle(quad.rotation.to_radians());
        let at = quad.dest.min();
        [
            Vec2::new(0.0, 0.0),
            Vec2::new(quad.dest.width, 0.0),
            Vec2::new(quad.dest.width, quad.dest.height),
            Vec2::new(0.0, quad.dest.height),
        ]
        .map(|c| at + rot * (c - quad.origin))
    }

    fn quad_bounds(quad: &TextureQuad) -> Rect {
        Rect::from_points(quad_corners(quad)).unwrap()
    }

    // ── Quads ───────────────────────────────────────────────────────────

    #[test]
    fn centered_quad() {
        let data = SpriteData::new(0.0, 0.0, 32.0, 32.0);
        let quad = texture_quad(&data, Rect::new(84.0, 84.0, 32.0, 32.0), Vec2::splat(0.5), 0.0, false, false);
        assert_eq!(quad.dest, Rect::new(100.0, 100.0, 32.0, 32.0));
        assert_eq!(quad.origin, Vec2::new(16.0, 16.0));
        assert_eq!(quad.src, data.region());
    }

    #[test]
    fn flips_negate_source() {
        let data = SpriteData::new(8.0, 8.0, 16.0, 24.0);
        let quad = texture_quad(&data, Rect::new(0.0, 0.0, 16.0, 24.0), Vec2::ZERO, 0.0, true, true);
        assert_eq!(quad.src, Rect::new(8.0, 8.0, -16.0, -24.0));
        assert!(approx_rect(quad_bounds(&quad), Rect::new(0.0, 0.0, 16.0, 24.0)));
    }

    #[test]
    fn trimmed_content_mirrors_when_flipped() {
        // 10×10 content at (2, 3) inside a 20×20 source box.
        let data = SpriteData::new(0.0, 0.0, 10.0, 10.0).trimmed(2.0, 3.0, 20.0, 20.0);
        let bounds = Rect::new(100.0, 100.0, 40.0, 40.0);
        let quad = texture_quad(&data, bounds, Vec2::ZERO, 0.0, false, false);
        assert!(approx_rect(quad_bounds(&quad), Rect::new(104.0, 106.0, 20.0, 20.0)));

        let flipped = texture_quad(&data, bounds, Vec2::ZERO, 0.0, true, false);
        // Mirrored: 20 - 2 - 10 = 8 from the left.
        assert!(approx_rect(quad_bounds(&flipped), Rect::new(116.0, 106.0, 20.0, 20.0)));
    }

    #[test]
    fn atlas_rotated_quad_lands_upright() {
        // Packed 40 wide × 10 tall, displayed 10 wide × 40 tall.
        let data = SpriteData::new(0.0, 0.0, 40.0, 10.0).rotated();
        assert_eq!(data.source_size(), Vec2::new(10.0, 40.0));
        let bounds = Rect::new(50.0, 60.0, 10.0, 40.0);
        let quad = texture_quad(&data, bounds, Vec2::splat(0.5), 0.0, false, false);
        assert_eq!(quad.rotation, -90.0);
        assert_eq!(quad.dest.size(), Vec2::new(40.0, 10.0));
        assert!(approx_rect(quad_bounds(&quad), bounds));
    }

    #[test]
    fn rotation_turns_about_pivot() {
        let data = SpriteData::new(0.0, 0.0, 20.0, 10.0);
        let bounds = Rect::new(0.0, 0.0, 20.0, 10.0);
        let quad = texture_quad(&data, bounds, Vec2::ZERO, 90.0, false, false);
        let corners = quad_corners(&quad);
        let expected = bounds.corners().map(|c| rotate_about(c, Vec2::ZERO, 90.0));
        for (a, b) in corners.iter().zip(expected.iter()) {
            assert!(approx_vec(*a, *b), "{a} vs {b}");
        }
    }

    // ── Culling ─────────────────────────────────────────────────────────

    #[test]
    fn offscreen_sprite_is_culled() {
        let mut store = VisualStore::new();
        store.add_sprite(Vec2::new(-1000.0, -1000.0), SpriteVisual::new("box"));
        store.add_sprite(Vec2::new(400.0, 300.0), SpriteVisual::new("box"));
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();

        renderer.render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        assert_eq!(backend.texture_draws().count(), 1);
        assert_eq!(renderer.stats().sprites_drawn, 1);
        assert_eq!(renderer.stats().sprites_culled, 1);
        assert!(matches!(backend.commands().first(), Some(DrawCommand::BeginFrame { .. })));
        assert!(matches!(backend.commands().last(), Some(DrawCommand::EndFrame)));
    }

    #[test]
    fn only_visible_sprites_reach_the_backend() {
        let mut store = VisualStore::new();
        for i in 0..1000 {
            let x = 100.0 + (i % 40) as f32 * 15.0;
            let y = 100.0 + (i / 40) as f32 * 15.0;
            store.add_sprite(Vec2::new(x, y), SpriteVisual::new("box"));
            store.add_sprite(Vec2::new(5000.0 + x, -5000.0 - y), SpriteVisual::new("box"));
        }
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();

        renderer.render_layers_for_camera(&mut backend, &camera, LayerMask::ALL, &store, &resources());

        assert_eq!(backend.texture_draws().count(), 1000);
        assert_eq!(renderer.stats().sprites_culled, 1000);
    }

    #[test]
    fn cull_margin_keeps_near_sprites() {
        let mut store = VisualStore::new();
        // Box spans 832..896 horizontally, just right of the viewport.
        store.add_sprite(Vec2::new(864.0, 300.0), SpriteVisual::new("box"));
        let camera = Camera::new(800.0, 600.0);
        let res = resources();

        let mut backend = RecordingBackend::new(800, 600);
        let mut tight = renderer();
        tight.render(&mut backend, &FrameContext::single(&camera), &store, &res);
        assert_eq!(tight.stats().sprites_drawn, 0);

        let mut loose = Renderer::new(
            LayerRegistry::default(),
            RenderConfig { cull_margin: 50.0, ..RenderConfig::default() },
        );
        loose.render(&mut backend, &FrameContext::single(&camera), &store, &res);
        assert_eq!(loose.stats().sprites_drawn, 1);
    }

    #[test]
    fn shapes_are_culled_by_bounds() {
        let mut store = VisualStore::new();
        store.add_shape(Vec2::new(100.0, 100.0), ShapeVisual::new(Shape::circle(10.0)));
        store.add_shape(Vec2::new(-500.0, 100.0), ShapeVisual::new(Shape::circle(10.0)));
        store.add_shape(Vec2::new(-50.0, 100.0), ShapeVisual::new(Shape::line(Vec2::new(100.0, 0.0), 2.0)));
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();

        renderer.render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        assert_eq!(renderer.stats().shapes_drawn, 2);
        assert_eq!(renderer.stats().shapes_culled, 1);
    }

    // ── Ordering and visibility ─────────────────────────────────────────

    #[test]
    fn items_draw_in_z_order_within_a_layer() {
        let mut store = VisualStore::new();
        for (z, r) in [(5, 1.0), (-1, 2.0), (3, 3.0), (3, 4.0)] {
            store.add_shape(Vec2::new(100.0, 100.0), ShapeVisual::new(Shape::circle(r)).z_index(z));
        }
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        let radii: Vec<f32> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect();
        assert_eq!(radii, [2.0, 3.0, 4.0, 1.0]);
    }

    #[test]
    fn layers_draw_in_priority_order() {
        let mut store = VisualStore::new();
        let text = TextVisual::new("hud", 16.0);
        store.add_text(Vec2::new(10.0, 10.0), text);
        store.add_shape(Vec2::new(100.0, 100.0), ShapeVisual::new(Shape::circle(4.0)));
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        let circle = backend.commands().iter().position(|c| matches!(c, DrawCommand::Circle { .. }));
        let text = backend.commands().iter().position(|c| matches!(c, DrawCommand::Text { .. }));
        assert!(circle.unwrap() < text.unwrap());
    }

    #[test]
    fn hidden_layers_and_items_are_skipped() {
        let mut store = VisualStore::new();
        store.add_sprite(Vec2::new(400.0, 300.0), SpriteVisual::new("box"));
        store.add_sprite(Vec2::new(400.0, 300.0), SpriteVisual::new("box").visible(false));
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        let res = resources();
        let mut renderer = renderer();

        renderer.render(&mut backend, &FrameContext::single(&camera), &store, &res);
        assert_eq!(renderer.stats().sprites_drawn, 1);

        renderer.set_layer_visible(LayerId::WORLD, false);
        backend.clear();
        renderer.render(&mut backend, &FrameContext::single(&camera), &store, &res);
        assert_eq!(backend.draw_count(), 0);
        assert!(!renderer.is_layer_visible(LayerId::WORLD));
    }

    #[test]
    fn missing_sprites_warn_once_and_draw_nothing() {
        let mut store = VisualStore::new();
        store.add_sprite(Vec2::new(400.0, 300.0), SpriteVisual::new("ghost"));
        store.add_sprite(Vec2::new(-4000.0, 300.0), SpriteVisual::new("ghost"));
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();

        renderer.render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        assert_eq!(renderer.stats().missing_sprites, 2);
        assert_eq!(renderer.stats().sprites_culled, 0);
        assert_eq!(backend.texture_draws().count(), 0);
        assert_eq!(renderer.warned_missing.len(), 1);
    }

    #[test]
    fn animated_sprite_resolves_current_frame() {
        let mut atlas = Atlas::new("anim", TextureHandle::new(3));
        atlas.insert_sprite("walk_0001", SpriteData::new(0.0, 0.0, 16.0, 16.0));
        atlas.insert_sprite("walk_0002", SpriteData::new(16.0, 0.0, 16.0, 16.0));
        let mut res = ResourceRegistry::new();
        res.insert_atlas(atlas).unwrap();

        let mut store = VisualStore::new();
        let id = store.add_sprite(Vec2::new(100.0, 100.0), SpriteVisual::new("walk"));
        store.attach_animation(id, crate::animation::Animation::new("walk", 2, 0.1));
        store.advance_animations(0.15);

        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::single(&camera), &store, &res);

        let Some(DrawCommand::Texture { src, .. }) = backend.texture_draws().next() else {
            panic!("no texture drawn");
        };
        assert_eq!(src.x, 16.0);
    }

    // ── Cameras ─────────────────────────────────────────────────────────

    #[test]
    fn world_layer_pushes_camera_and_parallax() {
        let mut store = VisualStore::new();
        store.add_sprite(Vec2::new(200.0, 150.0), SpriteVisual::new("box").layer(LayerId::BACKGROUND));
        store.add_sprite(Vec2::new(400.0, 300.0), SpriteVisual::new("box"));
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        let targets: Vec<Vec2> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginMode2d(cam) => Some(cam.target),
                _ => None,
            })
            .collect();
        // Background (parallax 0.5) first, then the world layer.
        assert_eq!(targets, [Vec2::new(200.0, 150.0), Vec2::new(400.0, 300.0)]);
        assert_eq!(backend.texture_draws().count(), 2);
    }

    #[test]
    fn screen_layer_needs_no_transform_full_screen() {
        let mut store = VisualStore::new();
        store.add_text(Vec2::new(10.0, 10.0), TextVisual::new("score", 20.0));
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        assert!(!backend.commands().iter().any(|c| matches!(c, DrawCommand::BeginMode2d(_))));
        assert_eq!(backend.draw_count(), 1);
    }

    #[test]
    fn split_screen_draws_hud_per_camera() {
        let mut manager = CameraManager::new(800.0, 600.0);
        manager.setup_split_screen(SplitScreenLayout::VerticalSplit);
        let mut store = VisualStore::new();
        store.add_text(Vec2::new(10.0, 10.0), TextVisual::new("P", 20.0));
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();

        renderer.render(&mut backend, &FrameContext::split(&manager), &store, &resources());

        assert_eq!(renderer.stats().cameras, 2);
        assert_eq!(renderer.stats().texts_drawn, 2);
        let scissors: Vec<ScissorRect> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginScissor(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(scissors, [ScissorRect::new(0, 0, 400, 600), ScissorRect::new(400, 0, 400, 600)]);
        // The second HUD is translated to its viewport.
        assert!(backend.commands().iter().any(|c| matches!(
            c,
            DrawCommand::BeginMode2d(cam) if *cam == Camera2d::translation(Vec2::new(400.0, 0.0))
        )));
    }

    #[test]
    fn camera_layer_masks_filter_layers() {
        let mut manager = CameraManager::new(800.0, 600.0);
        manager.setup_split_screen(SplitScreenLayout::HorizontalSplit);
        manager.set_layer_mask(1, LayerMask::ALL.without(LayerId::UI)).unwrap();
        let mut store = VisualStore::new();
        store.add_text(Vec2::new(10.0, 10.0), TextVisual::new("P1 only", 20.0));
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();

        renderer.render(&mut backend, &FrameContext::split(&manager), &store, &resources());

        assert_eq!(renderer.stats().texts_drawn, 1);
    }

    // ── Size modes ──────────────────────────────────────────────────────

    #[test]
    fn cover_sprite_fills_container() {
        let mut store = VisualStore::new();
        let visual = SpriteVisual::new("box")
            .pivot(Pivot::TopLeft)
            .sized(SizeMode::Cover, Container::Explicit { width: 150.0, height: 100.0 });
        store.add_sprite(Vec2::new(100.0, 100.0), visual);
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        let Some(DrawCommand::Texture { src, dest, origin, rotation, .. }) = backend.texture_draws().next() else {
            panic!("no texture drawn");
        };
        let quad = TextureQuad { src: *src, dest: *dest, origin: *origin, rotation: *rotation };
        assert!(approx_rect(quad_bounds(&quad), Rect::new(100.0, 75.0, 150.0, 150.0)));
    }

    #[test]
    fn repeat_sprite_tiles_inside_a_scissor() {
        let mut store = VisualStore::new();
        let visual = SpriteVisual::new("tile")
            .layer(LayerId::UI)
            .pivot(Pivot::TopLeft)
            .sized(SizeMode::Repeat, Container::Explicit { width: 150.0, height: 100.0 });
        store.add_sprite(Vec2::new(20.0, 30.0), visual);
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();
        renderer.render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        assert_eq!(backend.texture_draws().count(), 6);
        assert_eq!(renderer.stats().sprites_drawn, 1);
        assert!(backend
            .commands()
            .contains(&DrawCommand::BeginScissor(ScissorRect::new(20, 30, 150, 100))));
        // No outer scissor in single-camera mode, so nothing is restored.
        let scissors = backend.commands().iter().filter(|c| matches!(c, DrawCommand::BeginScissor(_))).count();
        assert_eq!(scissors, 1);
    }

    #[test]
    fn repeat_restores_camera_scissor() {
        let mut manager = CameraManager::new(800.0, 600.0);
        manager.setup_split_screen(SplitScreenLayout::VerticalSplit);
        manager.set_active(1, false).unwrap();
        let mut store = VisualStore::new();
        let visual = SpriteVisual::new("tile")
            .layer(LayerId::UI)
            .sized(SizeMode::Repeat, Container::Viewport);
        store.add_sprite(Vec2::ZERO, visual);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::split(&manager), &store, &resources());

        let scissors: Vec<ScissorRect> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginScissor(s) => Some(*s),
                _ => None,
            })
            .collect();
        let camera_clip = ScissorRect::new(0, 0, 400, 600);
        assert_eq!(scissors, [camera_clip, camera_clip, camera_clip]);
    }

    #[test]
    fn world_repeat_clips_to_projected_container() {
        let mut store = VisualStore::new();
        let visual = SpriteVisual::new("tile")
            .pivot(Pivot::TopLeft)
            .sized(SizeMode::Repeat, Container::Explicit { width: 100.0, height: 50.0 });
        store.add_sprite(Vec2::new(400.0, 300.0), visual);
        let mut camera = Camera::new(800.0, 600.0);
        camera.set_zoom(2.0).unwrap();
        let mut backend = RecordingBackend::new(800, 600);
        let mut renderer = renderer();
        renderer.render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        // 100×50 world units at zoom 2, with (400, 300) at the screen center.
        assert!(backend
            .commands()
            .contains(&DrawCommand::BeginScissor(ScissorRect::new(400, 300, 200, 100))));
        assert_eq!(renderer.stats().sprites_drawn, 1);
        // Tiles are drawn in world units under the camera transform.
        let Some(DrawCommand::Texture { dest, origin, .. }) = backend.texture_draws().next() else {
            panic!("no tile drawn");
        };
        assert!(approx_vec(dest.min() - *origin, Vec2::new(400.0, 300.0)));
        assert_eq!(dest.size(), Vec2::new(64.0, 64.0));
    }

    #[test]
    fn camera_viewport_container_follows_the_camera() {
        let mut store = VisualStore::new();
        let visual = SpriteVisual::new("box").sized(SizeMode::Stretch, Container::CameraViewport);
        store.add_sprite(Vec2::ZERO, visual);
        let mut camera = Camera::new(800.0, 600.0);
        let mut renderer = renderer();

        let drawn_bounds = |renderer: &mut Renderer, camera: &Camera| {
            let mut backend = RecordingBackend::new(800, 600);
            renderer.render(&mut backend, &FrameContext::single(camera), &store, &resources());
            let Some(DrawCommand::Texture { src, dest, origin, rotation, .. }) = backend.texture_draws().next()
            else {
                panic!("no texture drawn");
            };
            quad_bounds(&TextureQuad { src: *src, dest: *dest, origin: *origin, rotation: *rotation })
        };

        let first = drawn_bounds(&mut renderer, &camera);
        assert!(approx_rect(first, Rect::new(0.0, 0.0, 800.0, 600.0)));

        camera.pan(1000.0, 500.0);
        let second = drawn_bounds(&mut renderer, &camera);
        assert!(approx_rect(second, Rect::new(1000.0, 500.0, 800.0, 600.0)));
        assert_eq!(renderer.stats().sprites_culled, 0);
    }

    // ── Shapes ──────────────────────────────────────────────────────────

    #[test]
    fn shape_dispatch() {
        let mut store = VisualStore::new();
        store.add_shape(Vec2::new(100.0, 100.0), ShapeVisual::new(Shape::rectangle(20.0, 10.0)));
        store.add_shape(
            Vec2::new(200.0, 100.0),
            ShapeVisual::new(Shape::rectangle(20.0, 10.0)).rotation(45.0).z_index(1),
        );
        store.add_shape(
            Vec2::new(300.0, 100.0),
            ShapeVisual::new(Shape::arrow(Vec2::new(50.0, 0.0), 10.0, 2.0)).z_index(2),
        );
        let camera = Camera::new(800.0, 600.0);
        let mut backend = RecordingBackend::new(800, 600);
        renderer().render(&mut backend, &FrameContext::single(&camera), &store, &resources());

        let draws: Vec<&DrawCommand> = backend.commands().iter().filter(|c| c.is_draw()).collect();
        assert!(matches!(draws[0], DrawCommand::Rectangle { .. }));
        assert!(matches!(draws[1], DrawCommand::Polygon { points, .. } if points.len() == 4));
        match (draws[2], draws[3]) {
            (DrawCommand::Line { end, .. }, DrawCommand::Triangle { points, .. }) => {
                assert_eq!(*end, Vec2::new(340.0, 100.0));
                assert_eq!(points[0], Vec2::new(350.0, 100.0));
            }
            other => panic!("unexpected arrow calls {other:?}"),
        }
    }
}
