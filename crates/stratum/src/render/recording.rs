//! A headless [`Backend`] that records every call.
//!
//! Used by the test suite and by anyone who wants to inspect the draw list a
//! frame produces without rasterizing it.

use std::path::{Path, PathBuf};

use super::{Backend, BackendError, Camera2d, ScissorRect, TextureHandle};
use crate::math::{Rect, Vec2};
use crate::render2d::{Color, DrawStyle};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginFrame { clear: Color },
    EndFrame,
    BeginMode2d(Camera2d),
    EndMode2d,
    BeginScissor(ScissorRect),
    EndScissor,
    Texture {
        texture: TextureHandle,
        src: Rect,
        dest: Rect,
        origin: Vec2,
        rotation: f32,
        tint: Color,
    },
    Circle { center: Vec2, radius: f32, style: DrawStyle, color: Color },
    Rectangle { rect: Rect, style: DrawStyle, color: Color },
    Triangle { points: [Vec2; 3], style: DrawStyle, color: Color },
    Polygon { points: Vec<Vec2>, style: DrawStyle, color: Color },
    Line { start: Vec2, end: Vec2, thickness: f32, color: Color },
    Text { text: String, position: Vec2, size: f32, color: Color },
}

impl DrawCommand {
    /// True for calls that put pixels on screen.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DrawCommand::Texture { .. }
                | DrawCommand::Circle { .. }
                | DrawCommand::Rectangle { .. }
                | DrawCommand::Triangle { .. }
                | DrawCommand::Polygon { .. }
                | DrawCommand::Line { .. }
                | DrawCommand::Text { .. }
        )
    }
}

struct RecordedTexture {
    path: Option<PathBuf>,
    width: u32,
    height: u32,
}

/// Records [`DrawCommand`]s instead of drawing.
///
/// Textures loaded from a path get the size configured with
/// [`with_texture_size`](Self::with_texture_size) (default 0×0); the file is
/// never opened.
pub struct RecordingBackend {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    textures: Vec<Option<RecordedTexture>>,
    path_texture_size: (u32, u32),
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            textures: Vec::new(),
            path_texture_size: (0, 0),
        }
    }

    /// Size reported for textures loaded by path.
    pub fn with_texture_size(mut self, width: u32, height: u32) -> Self {
        self.path_texture_size = (width, height);
        self
    }

    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every textured quad, in call order.
    pub fn texture_draws(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Texture { .. }))
    }

    /// Number of calls that put pixels on screen.
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.iter().filter(|t| t.is_some()).count()
    }

    /// Path a texture was loaded from, if any.
    pub fn texture_path(&self, texture: TextureHandle) -> Option<&Path> {
        self.textures
            .get(texture.index() as usize)?
            .as_ref()?
            .path
            .as_deref()
    }

    fn push_texture(&mut self, texture: RecordedTexture) -> TextureHandle {
        let handle = TextureHandle::new(self.textures.len() as u32);
        self.textures.push(Some(texture));
        handle
    }
}

impl Backend for RecordingBackend {
    fn screen_width(&self) -> u32 {
        self.width
    }

    fn screen_height(&self) -> u32 {
        self.height
    }

    fn begin_frame(&mut self, clear: Color) {
        self.commands.push(DrawCommand::BeginFrame { clear });
    }

    fn end_frame(&mut self) {
        self.commands.push(DrawCommand::EndFrame);
    }

    fn begin_mode_2d(&mut self, camera: Camera2d) {
        self.commands.push(DrawCommand::BeginMode2d(camera));
    }

    fn end_mode_2d(&mut self) {
        self.commands.push(DrawCommand::EndMode2d);
    }

    fn begin_scissor(&mut self, rect: ScissorRect) {
        self.commands.push(DrawCommand::BeginScissor(rect));
    }

    fn end_scissor(&mut self) {
        self.commands.push(DrawCommand::EndScissor);
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, BackendError> {
        let (width, height) = self.path_texture_size;
        Ok(self.push_texture(RecordedTexture {
            path: Some(path.to_path_buf()),
            width,
            height,
        }))
    }

    fn load_texture_rgba(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, BackendError> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(BackendError::InvalidDimensions { width, height, len: rgba.len() });
        }
        Ok(self.push_texture(RecordedTexture { path: None, width, height }))
    }

    fn unload_texture(&mut self, texture: TextureHandle) {
        if let Some(slot) = self.textures.get_mut(texture.index() as usize) {
            *slot = None;
        }
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        let t = self.textures.get(texture.index() as usize)?.as_ref()?;
        Some((t.width, t.height))
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
        self.commands.push(DrawCommand::Texture { texture, src, dest, origin, rotation, tint });
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, style: DrawStyle, color: Color) {
        self.commands.push(DrawCommand::Circle { center, radius, style, color });
    }

    fn draw_rectangle(&mut self, rect: Rect, style: DrawStyle, color: Color) {
        self.commands.push(DrawCommand::Rectangle { rect, style, color });
    }

    fn draw_triangle(&mut self, points: [Vec2; 3], style: DrawStyle, color: Color) {
        self.commands.push(DrawCommand::Triangle { points, style, color });
    }

    fn draw_polygon(&mut self, points: &[Vec2], style: DrawStyle, color: Color) {
        self.commands.push(DrawCommand::Polygon { points: points.to_vec(), style, color });
    }

    fn draw_line(&mut self, start: Vec2, end: Vec2, thickness: f32, color: Color) {
        self.commands.push(DrawCommand::Line { start, end, thickness, color });
    }

    fn draw_text(&mut self, text: &str, position: Vec2, size: f32, color: Color) {
        self.commands.push(DrawCommand::Text { text: text.to_owned(), position, size, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_call_order() {
        let mut backend = RecordingBackend::new(320, 240);
        backend.begin_frame(Color::BLACK);
        backend.draw_circle(Vec2::new(1.0, 2.0), 3.0, DrawStyle::Fill, Color::RED);
        backend.draw_text("hi", Vec2::ZERO, 12.0, Color::WHITE);
        backend.end_frame();
        assert_eq!(backend.commands().len(), 4);
        assert_eq!(backend.draw_count(), 2);
        assert!(matches!(backend.commands()[0], DrawCommand::BeginFrame { .. }));
        assert!(matches!(backend.commands()[3], DrawCommand::EndFrame));
    }

    #[test]
    fn texture_lifecycle() {
        let mut backend = RecordingBackend::new(1, 1).with_texture_size(64, 32);
        let a = backend.load_texture(Path::new("sheet.png")).unwrap();
        let b = backend.load_texture_rgba(2, 2, &[0; 16]).unwrap();
        assert_eq!(backend.texture_size(a), Some((64, 32)));
        assert_eq!(backend.texture_size(b), Some((2, 2)));
        assert_eq!(backend.texture_path(a), Some(Path::new("sheet.png")));
        backend.unload_texture(a);
        assert_eq!(backend.texture_size(a), None);
        assert_eq!(backend.texture_count(), 1);
    }

    #[test]
    fn rgba_length_is_checked() {
        let mut backend = RecordingBackend::new(1, 1);
        assert!(matches!(
            backend.load_texture_rgba(2, 2, &[0; 15]),
            Err(BackendError::InvalidDimensions { len: 15, .. })
        ));
    }
}
