//! # Software Backend — CPU Rasterizer
//!
//! [`SoftwareBackend`] draws into an [`RgbaImage`]. It exists for demos,
//! screenshots and pixel tests on machines with no GPU.
//!
//! Every primitive becomes a convex polygon (or a circle) in screen space,
//! filled by testing pixel centers:
//!
//! ```text
//!  world points ──► view transform ──► screen polygon ──► clip to scissor
//!                                                          │
//!                         pixel center inside? ◄───────────┘
//!                           │ yes
//!                           ▼
//!             texture quads: inverse-map to (u, v), nearest texel, × tint
//!                           │
//!                           ▼
//!                   source-over blend into the target
//! ```
//!
//! ## Design Decisions
//!
//! **Nearest sampling, no antialiasing.** Output is exact and reproducible,
//! which is what pixel tests need.
//!
//! **Text is optional.** Without a font loaded through
//! [`with_font`](SoftwareBackend::with_font), `draw_text` draws nothing.
//! Glyphs are positioned through the view transform but not scaled by it.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use super::{Backend, BackendError, Camera2d, ScissorRect, TextureHandle};
use crate::math::{Affine2, Rect, Vec2};
use crate::render2d::{Color, DrawStyle};

/// Segments per full circle for outlines.
const CIRCLE_SEGMENTS: usize = 48;

/// Rasterizes backend calls into an in-memory image.
pub struct SoftwareBackend {
    target: RgbaImage,
    textures: Vec<Option<RgbaImage>>,
    view: Option<Affine2>,
    scissor: Option<ScissorRect>,
    font: Option<fontdue::Font>,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: RgbaImage::new(width, height),
            textures: Vec::new(),
            view: None,
            scissor: None,
            font: None,
        }
    }

    /// Use a TrueType/OpenType font for `draw_text` (builder pattern).
    pub fn with_font(mut self, bytes: &[u8]) -> Result<Self, BackendError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(BackendError::Font)?;
        self.font = Some(font);
        Ok(self)
    }

    /// The framebuffer.
    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.target.width() && y < self.target.height()).then(|| self.target.get_pixel(x, y).0)
    }

    /// Write the framebuffer as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), BackendError> {
        self.target.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    /// Resize the framebuffer. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.target = RgbaImage::new(width, height);
    }

    fn transform(&self) -> Affine2 {
        self.view.unwrap_or(Affine2::IDENTITY)
    }

    fn to_screen(&self, p: Vec2) -> Vec2 {
        self.transform().transform_point2(p)
    }

    /// Pixel bounds draws may touch: the target, narrowed by the scissor.
    fn clip(&self) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (self.target.width() as i64, self.target.height() as i64);
        let (mut x0, mut y0, mut x1, mut y1) = (0i64, 0i64, w, h);
        if let Some(s) = self.scissor {
            x0 = x0.max(s.x as i64);
            y0 = y0.max(s.y as i64);
            x1 = x1.min(s.x as i64 + s.width as i64);
            y1 = y1.min(s.y as i64 + s.height as i64);
        }
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    /// Pixel range covering `bounds`, clipped.
    fn pixel_range(&self, bounds: Rect) -> Option<(u32, u32, u32, u32)> {
        let (cx0, cy0, cx1, cy1) = self.clip()?;
        let x0 = (bounds.x.floor().max(cx0 as f32)) as u32;
        let y0 = (bounds.y.floor().max(cy0 as f32)) as u32;
        let x1 = (bounds.right().ceil().min(cx1 as f32)).max(0.0) as u32;
        let y1 = (bounds.bottom().ceil().min(cy1 as f32)).max(0.0) as u32;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    fn blend(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let a = color[3].clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.target.get_pixel_mut(x, y);
        let inv = 1.0 - a;
        for i in 0..3 {
            let d = dst.0[i] as f32 / 255.0;
            let out = color[i].clamp(0.0, 1.0) * a + d * inv;
            dst.0[i] = (out * 255.0 + 0.5) as u8;
        }
        let da = dst.0[3] as f32 / 255.0;
        dst.0[3] = ((a + da * inv) * 255.0 + 0.5) as u8;
    }

    /// Fill a convex polygon given in world coordinates.
    fn fill_convex(&mut self, points: &[Vec2], color: Color) {
        let screen: Vec<Vec2> = points.iter().map(|p| self.to_screen(*p)).collect();
        self.fill_convex_screen(&screen, color);
    }

    fn fill_convex_screen(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 {
            return;
        }
        let Some(bounds) = Rect::from_points(points.iter().copied()) else {
            return;
        };
        let Some((x0, y0, x1, y1)) = self.pixel_range(bounds) else {
            return;
        };
        let winding = signed_area(points).signum();
        if winding == 0.0 {
            return;
        }
        let rgba = color.to_array();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if inside_convex(points, p, winding) {
                    self.blend(x, y, rgba);
                }
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Vec2], thickness: f32, color: Color) {
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            self.draw_line(a, b, thickness, color);
        }
    }
}

fn signed_area(points: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        area += a.perp_dot(b);
    }
    area * 0.5
}

fn inside_convex(points: &[Vec2], p: Vec2, winding: f32) -> bool {
    (0..points.len()).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        (b - a).perp_dot(p - a) * winding >= 0.0
    })
}

fn circle_points(center: Vec2, radius: f32) -> Vec<Vec2> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let t = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
            center + Vec2::new(t.cos(), t.sin()) * radius
        })
        .collect()
}

impl Backend for SoftwareBackend {
    fn screen_width(&self) -> u32 {
        self.target.width()
    }

    fn screen_height(&self) -> u32 {
        self.target.height()
    }

    fn begin_frame(&mut self, clear: Color) {
        self.view = None;
        self.scissor = None;
        let px = Rgba(clear.to_rgba8());
        for p in self.target.pixels_mut() {
            *p = px;
        }
    }

    fn end_frame(&mut self) {
        if self.view.is_some() || self.scissor.is_some() {
            log::debug!("Frame ended with a camera or scissor still active");
        }
        self.view = None;
        self.scissor = None;
    }

    fn begin_mode_2d(&mut self, camera: Camera2d) {
        self.view = Some(camera.matrix());
    }

    fn end_mode_2d(&mut self) {
        self.view = None;
    }

    fn begin_scissor(&mut self, rect: ScissorRect) {
        self.scissor = Some(rect);
    }

    fn end_scissor(&mut self) {
        self.scissor = None;
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, BackendError> {
        let image = image::open(path)?.to_rgba8();
        log::debug!("Loaded texture '{}' ({}x{})", path.display(), image.width(), image.height());
        self.textures.push(Some(image));
        Ok(TextureHandle::new(self.textures.len() as u32 - 1))
    }

    fn load_texture_rgba(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, BackendError> {
        let image = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or(
            BackendError::InvalidDimensions { width, height, len: rgba.len() },
        )?;
        self.textures.push(Some(image));
        Ok(TextureHandle::new(self.textures.len() as u32 - 1))
    }

    fn unload_texture(&mut self, texture: TextureHandle) {
        if let Some(slot) = self.textures.get_mut(texture.index() as usize) {
            *slot = None;
        }
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        let t = self.textures.get(texture.index() as usize)?.as_ref()?;
        Some(t.dimensions())
    }

    fn draw_texture_pro(
        &mut self,
        texture: TextureHandle,
        src: Rect,
        dest: Rect,
        origin: Vec2,
        rotation: f32,
        tint: Color,
    ) {
        if dest.width == 0.0 || dest.height == 0.0 || src.width == 0.0 || src.height == 0.0 {
            return;
        }
        // Unit square → quad in screen space.
        let quad = self.transform()
            * Affine2::from_translation(dest.min())
            * Affine2::from_angle(rotation.to_radians())
            * Affine2::from_translation(-origin)
            * Affine2::from_scale(dest.size());
        if quad.matrix2.determinant().abs() < f32::EPSILON {
            return;
        }
        let corners = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y].map(|c| quad.transform_point2(c));
        let Some(bounds) = Rect::from_points(corners) else {
            return;
        };
        let Some((x0, y0, x1, y1)) = self.pixel_range(bounds) else {
            return;
        };
        let Some(Some(image)) = self.textures.get(texture.index() as usize) else {
            log::trace!("draw_texture_pro with unknown texture {texture:?}");
            return;
        };
        let (tw, th) = image.dimensions();
        if tw == 0 || th == 0 {
            return;
        }

        let inverse = quad.inverse();
        let (flip_x, flip_y) = (src.width < 0.0, src.height < 0.0);
        let (sw, sh) = (src.width.abs(), src.height.abs());
        let tint = tint.to_array();

        // Sample first, blend after: `image` borrows `self.textures`.
        let mut writes = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                let uv = inverse.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
                    continue;
                }
                let u = if flip_x { 1.0 - uv.x } else { uv.x };
                let v = if flip_y { 1.0 - uv.y } else { uv.y };
                let tx = ((src.x + u * sw).floor().max(0.0) as u32).min(tw - 1);
                let ty = ((src.y + v * sh).floor().max(0.0) as u32).min(th - 1);
                let texel = image.get_pixel(tx, ty).0;
                let color = [
                    texel[0] as f32 / 255.0 * tint[0],
                    texel[1] as f32 / 255.0 * tint[1],
                    texel[2] as f32 / 255.0 * tint[2],
                    texel[3] as f32 / 255.0 * tint[3],
                ];
                writes.push((x, y, color));
            }
        }
        for (x, y, color) in writes {
            self.blend(x, y, color);
        }
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, style: DrawStyle, color: Color) {
        match style {
            DrawStyle::Fill => self.fill_convex(&circle_points(center, radius), color),
            DrawStyle::Outline { thickness } => {
                self.stroke_polyline(&circle_points(center, radius), thickness, color);
            }
        }
    }

    fn draw_rectangle(&mut self, rect: Rect, style: DrawStyle, color: Color) {
        let corners = rect.corners();
        match style {
            DrawStyle::Fill => self.fill_convex(&corners, color),
            DrawStyle::Outline { thickness } => self.stroke_polyline(&corners, thickness, color),
        }
    }

    fn draw_triangle(&mut self, points: [Vec2; 3], style: DrawStyle, color: Color) {
        match style {
            DrawStyle::Fill => self.fill_convex(&points, color),
            DrawStyle::Outline { thickness } => self.stroke_polyline(&points, thickness, color),
        }
    }

    fn draw_polygon(&mut self, points: &[Vec2], style: DrawStyle, color: Color) {
        match style {
            DrawStyle::Fill => self.fill_convex(points, color),
            DrawStyle::Outline { thickness } => self.stroke_polyline(points, thickness, color),
        }
    }

    fn draw_line(&mut self, start: Vec2, end: Vec2, thickness: f32, color: Color) {
        let dir = (end - start).normalize_or_zero();
        if dir == Vec2::ZERO {
            return;
        }
        let half = dir.perp() * thickness.max(1.0) * 0.5;
        self.fill_convex(&[start + half, end + half, end - half, start - half], color);
    }

    fn draw_text(&mut self, text: &str, position: Vec2, size: f32, color: Color) {
        let Some(font) = &self.font else {
            return;
        };
        let ascent = font
            .horizontal_line_metrics(size)
            .map_or(size, |m| m.ascent);
        let origin = self.to_screen(position);
        let mut pen = 0.0;
        let mut glyphs = Vec::new();
        for ch in text.chars() {
            let (metrics, coverage) = font.rasterize(ch, size);
            // fontdue's ymin is baseline-relative, Y-up.
            let left = origin.x + pen + metrics.xmin as f32;
            let top = origin.y + ascent - metrics.height as f32 - metrics.ymin as f32;
            pen += metrics.advance_width;
            if metrics.width > 0 && metrics.height > 0 {
                glyphs.push((left.round() as i64, top.round() as i64, metrics.width, coverage));
            }
        }

        let Some((cx0, cy0, cx1, cy1)) = self.clip() else {
            return;
        };
        let rgba = color.to_array();
        for (left, top, width, coverage) in glyphs {
            for (i, alpha) in coverage.iter().enumerate() {
                if *alpha == 0 {
                    continue;
                }
                let x = left + (i % width) as i64;
                let y = top + (i / width) as i64;
                if x < cx0 as i64 || y < cy0 as i64 || x >= cx1 as i64 || y >= cy1 as i64 {
                    continue;
                }
                let a = rgba[3] * *alpha as f32 / 255.0;
                self.blend(x as u32, y as u32, [rgba[0], rgba[1], rgba[2], a]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn backend() -> SoftwareBackend {
        let mut b = SoftwareBackend::new(64, 64);
        b.begin_frame(Color::BLACK);
        b
    }

    /// 2×2 texture: red, green / blue, white.
    fn checker(b: &mut SoftwareBackend) -> TextureHandle {
        let pixels = [
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ];
        b.load_texture_rgba(2, 2, &pixels).unwrap()
    }

    #[test]
    fn clear_fills_target() {
        let b = backend();
        assert_eq!(b.pixel(0, 0), Some(BLACK));
        assert_eq!(b.pixel(63, 63), Some(BLACK));
        assert_eq!(b.pixel(64, 0), None);
    }

    #[test]
    fn filled_rectangle_covers_pixel_centers() {
        let mut b = backend();
        b.draw_rectangle(Rect::new(10.0, 10.0, 5.0, 5.0), DrawStyle::Fill, Color::RED);
        assert_eq!(b.pixel(10, 10), Some(RED));
        assert_eq!(b.pixel(14, 14), Some(RED));
        assert_eq!(b.pixel(15, 15), Some(BLACK));
        assert_eq!(b.pixel(9, 10), Some(BLACK));
    }

    #[test]
    fn scissor_clips() {
        let mut b = backend();
        b.begin_scissor(ScissorRect::new(0, 0, 12, 64));
        b.draw_rectangle(Rect::new(10.0, 10.0, 5.0, 5.0), DrawStyle::Fill, Color::RED);
        b.end_scissor();
        assert_eq!(b.pixel(11, 10), Some(RED));
        assert_eq!(b.pixel(12, 10), Some(BLACK));
    }

    #[test]
    fn camera_transform_applies() {
        let mut b = backend();
        b.begin_mode_2d(Camera2d::translation(Vec2::new(20.0, 0.0)));
        b.draw_rectangle(Rect::new(0.0, 0.0, 2.0, 2.0), DrawStyle::Fill, Color::RED);
        b.end_mode_2d();
        assert_eq!(b.pixel(0, 0), Some(BLACK));
        assert_eq!(b.pixel(20, 0), Some(RED));
    }

    #[test]
    fn textures_sample_nearest_and_flip() {
        let mut b = backend();
        let tex = checker(&mut b);
        b.draw_texture_pro(tex, Rect::new(0.0, 0.0, 2.0, 2.0), Rect::new(0.0, 0.0, 8.0, 8.0), Vec2::ZERO, 0.0, Color::WHITE);
        assert_eq!(b.pixel(1, 1), Some(RED));
        assert_eq!(b.pixel(6, 1), Some([0, 255, 0, 255]));
        assert_eq!(b.pixel(1, 6), Some([0, 0, 255, 255]));

        // Negative source width mirrors horizontally.
        b.draw_texture_pro(tex, Rect::new(0.0, 0.0, -2.0, 2.0), Rect::new(16.0, 0.0, 8.0, 8.0), Vec2::ZERO, 0.0, Color::WHITE);
        assert_eq!(b.pixel(17, 1), Some([0, 255, 0, 255]));
        assert_eq!(b.pixel(22, 1), Some(RED));
    }

    #[test]
    fn texture_origin_and_rotation() {
        let mut b = backend();
        let tex = checker(&mut b);
        // Origin at the quad center, placed at (32, 32), turned 90° clockwise:
        // the top-left (red) quarter ends up top-right.
        b.draw_texture_pro(
            tex,
            Rect::new(0.0, 0.0, 2.0, 2.0),
            Rect::new(32.0, 32.0, 8.0, 8.0),
            Vec2::new(4.0, 4.0),
            90.0,
            Color::WHITE,
        );
        assert_eq!(b.pixel(34, 29), Some(RED));
        assert_eq!(b.pixel(29, 29), Some([0, 0, 255, 255]));
    }

    #[test]
    fn tint_multiplies_and_alpha_blends() {
        let mut b = backend();
        let white = b.load_texture_rgba(1, 1, &[255, 255, 255, 255]).unwrap();
        b.draw_texture_pro(white, Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(0.0, 0.0, 4.0, 4.0), Vec2::ZERO, 0.0, Color::rgba(1.0, 0.0, 0.0, 0.5));
        let [r, g, _, a] = b.pixel(1, 1).unwrap();
        assert!((127..=128).contains(&r));
        assert_eq!(g, 0);
        assert_eq!(a, 255);
    }

    #[test]
    fn line_has_thickness() {
        let mut b = backend();
        b.draw_line(Vec2::new(0.0, 10.0), Vec2::new(30.0, 10.0), 4.0, Color::RED);
        assert_eq!(b.pixel(5, 8), Some(RED));
        assert_eq!(b.pixel(5, 11), Some(RED));
        assert_eq!(b.pixel(5, 13), Some(BLACK));
    }

    #[test]
    fn circle_fill() {
        let mut b = backend();
        b.draw_circle(Vec2::new(32.0, 32.0), 10.0, DrawStyle::Fill, Color::RED);
        assert_eq!(b.pixel(32, 32), Some(RED));
        assert_eq!(b.pixel(32, 45), Some(BLACK));
    }

    #[test]
    fn texture_lifecycle_and_bad_buffers() {
        let mut b = backend();
        let tex = checker(&mut b);
        assert_eq!(b.texture_size(tex), Some((2, 2)));
        b.unload_texture(tex);
        assert_eq!(b.texture_size(tex), None);
        assert!(matches!(
            b.load_texture_rgba(4, 4, &[0; 8]),
            Err(BackendError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn text_without_font_is_a_no_op() {
        let mut b = backend();
        b.draw_text("hello", Vec2::new(1.0, 1.0), 12.0, Color::WHITE);
        assert!(b.image().pixels().all(|p| p.0 == BLACK));
    }
}
