//! # Atlases — Named Sprites in Packed Textures
//!
//! An atlas is one texture holding many sprites, plus a table saying where
//! each sprite lives in it. The [`ResourceRegistry`] owns every loaded atlas
//! and answers the renderer's one question: *where is the sprite called
//! `"player_idle_0003"`?*
//!
//! ```text
//! ResourceRegistry
//! ┌──────────────────────────────────────────────────────────┐
//! │ atlases (load order)                                     │
//! │   [0] "characters"  texture 1   {player_idle_0001, ...}  │
//! │   [1] "tiles"       texture 2   {grass, stone, ...}      │
//! │                                                          │
//! │ index: sprite name → atlas slot                          │
//! │   "player_idle_0001" → 0                                 │
//! │   "grass"            → 1                                 │
//! │                                                          │
//! │ version: bumped on every load / unload / reload          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atlas Format
//!
//! The JSON is TexturePacker's, in either the "Hash" (`frames` is an object
//! keyed by file name) or the "Array" (`frames` is a list with a `filename`
//! field) flavor. Image extensions are stripped from sprite names, so
//! `"grass.png"` is looked up as `"grass"`.
//!
//! ```json
//! { "frames": { "grass.png": {
//!     "frame": { "x": 2, "y": 2, "w": 30, "h": 28 },
//!     "rotated": false, "trimmed": true,
//!     "spriteSourceSize": { "x": 1, "y": 4, "w": 30, "h": 28 },
//!     "sourceSize": { "w": 32, "h": 32 } } } }
//! ```
//!
//! ## Trimming and Rotation
//!
//! A *trimmed* sprite had its transparent border cut away when packing.
//! `offset_x/offset_y` say where the trimmed content sits inside the
//! original `source_width × source_height` box, and pivots are measured
//! against that original box so trimming never shifts a sprite on screen.
//!
//! A *rotated* sprite was packed turned 90° clockwise to save space. Its
//! region in the texture is `height × width` of how it is displayed; the
//! renderer draws it turned back by −90°.
//!
//! ## Name Collisions
//!
//! Sprite names are global across atlases. When two atlases define the same
//! name, the one loaded first owns it and a warning is logged. Unloading the
//! owner uncovers the other one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::math::{Rect, Vec2};
use crate::render::{Backend, BackendError, TextureHandle};

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors raised while loading, reloading or unloading atlases.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid atlas JSON for '{name}': {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load texture for atlas '{name}': {source}")]
    Texture {
        name: String,
        #[source]
        source: BackendError,
    },
    #[error("atlas '{0}' is already loaded")]
    Duplicate(String),
    #[error("atlas '{0}' is not loaded")]
    NotFound(String),
    #[error("atlas '{0}' was not loaded from files and cannot be reloaded")]
    NoSource(String),
}

// ── Sprite data ─────────────────────────────────────────────────────────

/// Where a sprite lives in its atlas texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteData {
    /// Region in the texture, in pixels (as packed, so `height × width` of the
    /// displayed size when `rotated`).
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub trimmed: bool,
    /// Position of the trimmed content inside the untrimmed box. Zero unless
    /// `trimmed`.
    pub offset_x: f32,
    pub offset_y: f32,
    /// Untrimmed size.
    pub source_width: f32,
    pub source_height: f32,
    /// Packed turned 90° clockwise.
    pub rotated: bool,
}

impl SpriteData {
    /// An untrimmed, unrotated sprite.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            trimmed: false,
            offset_x: 0.0,
            offset_y: 0.0,
            source_width: width,
            source_height: height,
            rotated: false,
        }
    }

    /// Mark as trimmed out of a `source_width × source_height` box.
    pub fn trimmed(mut self, offset_x: f32, offset_y: f32, source_width: f32, source_height: f32) -> Self {
        self.trimmed = true;
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.source_width = source_width;
        self.source_height = source_height;
        self
    }

    /// Mark as packed rotated. `width`/`height` must already be the packed
    /// region; an untrimmed source box becomes the region turned upright.
    pub fn rotated(mut self) -> Self {
        if !self.rotated && !self.trimmed {
            self.source_width = self.height;
            self.source_height = self.width;
        }
        self.rotated = true;
        self
    }

    /// The packed region in the texture.
    pub fn region(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Size of the (trimmed) content as displayed.
    pub fn display_size(&self) -> Vec2 {
        if self.rotated {
            Vec2::new(self.height, self.width)
        } else {
            Vec2::new(self.width, self.height)
        }
    }

    /// Untrimmed size as displayed. Pivots and size modes work on this box.
    pub fn source_size(&self) -> Vec2 {
        Vec2::new(self.source_width, self.source_height)
    }

    /// Top-left of the content inside the untrimmed box.
    pub fn content_offset(&self) -> Vec2 {
        if self.trimmed {
            Vec2::new(self.offset_x, self.offset_y)
        } else {
            Vec2::ZERO
        }
    }
}

// ── TexturePacker JSON ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct PackerRect {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    w: f32,
    h: f32,
}

#[derive(Deserialize)]
struct PackerSize {
    w: f32,
    h: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackerFrame {
    frame: PackerRect,
    #[serde(default)]
    rotated: bool,
    #[serde(default)]
    trimmed: bool,
    sprite_source_size: Option<PackerRect>,
    source_size: Option<PackerSize>,
}

#[derive(Deserialize)]
struct PackerNamedFrame {
    filename: String,
    #[serde(flatten)]
    frame: PackerFrame,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PackerFrames {
    Array(Vec<PackerNamedFrame>),
    Hash(HashMap<String, PackerFrame>),
}

#[derive(Deserialize)]
struct PackerSheet {
    frames: PackerFrames,
}

impl PackerFrame {
    fn into_sprite(self) -> SpriteData {
        let PackerRect { x, y, w, h } = self.frame;
        // TexturePacker reports the frame in display orientation.
        let (width, height) = if self.rotated { (h, w) } else { (w, h) };
        let mut data = SpriteData {
            x,
            y,
            width,
            height,
            ..SpriteData::new(x, y, w, h)
        };
        if self.trimmed {
            let offset = self.sprite_source_size.map_or((0.0, 0.0), |r| (r.x, r.y));
            let source = self.source_size.map_or((w, h), |s| (s.w, s.h));
            data = data.trimmed(offset.0, offset.1, source.0, source.1);
        }
        data.rotated = self.rotated;
        data
    }
}

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".bmp", ".tga", ".gif", ".webp"];

fn sprite_key(filename: &str) -> &str {
    let lower = filename.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map_or(filename, |ext| &filename[..filename.len() - ext.len()])
}

/// Parse TexturePacker JSON into sprite entries, sorted by name.
pub fn parse_texture_packer(json: &str) -> Result<Vec<(String, SpriteData)>, serde_json::Error> {
    let sheet: PackerSheet = serde_json::from_str(json)?;
    let mut sprites: Vec<(String, SpriteData)> = match sheet.frames {
        PackerFrames::Array(frames) => frames
            .into_iter()
            .map(|f| (sprite_key(&f.filename).to_owned(), f.frame.into_sprite()))
            .collect(),
        PackerFrames::Hash(frames) => frames
            .into_iter()
            .map(|(name, f)| (sprite_key(&name).to_owned(), f.into_sprite()))
            .collect(),
    };
    sprites.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(sprites)
}

// ── Atlas ───────────────────────────────────────────────────────────────

/// A texture and the sprites packed into it.
#[derive(Debug, Clone)]
pub struct Atlas {
    name: String,
    texture: TextureHandle,
    sprites: HashMap<String, SpriteData>,
    json_path: Option<PathBuf>,
    texture_path: Option<PathBuf>,
}

impl Atlas {
    pub fn new(name: impl Into<String>, texture: TextureHandle) -> Self {
        Self {
            name: name.into(),
            texture,
            sprites: HashMap::new(),
            json_path: None,
            texture_path: None,
        }
    }

    /// Build from TexturePacker JSON and an already-loaded texture.
    pub fn from_json_str(name: impl Into<String>, json: &str, texture: TextureHandle) -> Result<Self, AtlasError> {
        let name = name.into();
        let sprites = parse_texture_packer(json).map_err(|source| AtlasError::Json {
            name: name.clone(),
            source,
        })?;
        let mut atlas = Self::new(name, texture);
        for (sprite, data) in sprites {
            if atlas.sprites.contains_key(&sprite) {
                log::warn!("Atlas '{}': duplicate sprite '{sprite}', keeping the first", atlas.name);
                continue;
            }
            atlas.sprites.insert(sprite, data);
        }
        Ok(atlas)
    }

    /// Add or replace a sprite.
    pub fn insert_sprite(&mut self, name: impl Into<String>, data: SpriteData) {
        self.sprites.insert(name.into(), data);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn sprite(&self, name: &str) -> Option<&SpriteData> {
        self.sprites.get(name)
    }

    pub fn sprite_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sprites.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn json_path(&self) -> Option<&Path> {
        self.json_path.as_deref()
    }

    pub fn texture_path(&self) -> Option<&Path> {
        self.texture_path.as_deref()
    }
}

/// A resolved sprite: the atlas it lives in and its data.
#[derive(Debug, Clone, Copy)]
pub struct SpriteRef<'a> {
    pub atlas: &'a Atlas,
    pub data: &'a SpriteData,
}

// ── Registry ────────────────────────────────────────────────────────────

/// Owns loaded atlases and resolves sprite names.
///
/// Mutate only between frames.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    atlases: Vec<Atlas>,
    index: HashMap<String, usize>,
    version: u64,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an atlas from a TexturePacker JSON file and its texture.
    pub fn load_atlas(
        &mut self,
        backend: &mut dyn Backend,
        name: &str,
        json_path: impl AsRef<Path>,
        texture_path: impl AsRef<Path>,
    ) -> Result<(), AtlasError> {
        let json_path = json_path.as_ref();
        self.ensure_new(name)?;
        let json = read_json(json_path)?;
        self.load_atlas_from_str(backend, name, &json, texture_path)?;
        if let Some(slot) = self.index_of(name) {
            self.atlases[slot].json_path = Some(json_path.to_path_buf());
        }
        Ok(())
    }

    /// Load an atlas from JSON already in memory plus a texture file.
    pub fn load_atlas_from_str(
        &mut self,
        backend: &mut dyn Backend,
        name: &str,
        json: &str,
        texture_path: impl AsRef<Path>,
    ) -> Result<(), AtlasError> {
        let texture_path = texture_path.as_ref();
        self.ensure_new(name)?;
        let mut atlas = build_atlas(backend, name, json, texture_path)?;
        atlas.texture_path = Some(texture_path.to_path_buf());
        log::info!(
            "Loaded atlas '{name}' ({} sprites) from '{}'",
            atlas.len(),
            texture_path.display()
        );
        self.push(atlas);
        Ok(())
    }

    /// Register an atlas built in code.
    pub fn insert_atlas(&mut self, atlas: Atlas) -> Result<(), AtlasError> {
        self.ensure_new(&atlas.name)?;
        log::info!("Inserted atlas '{}' ({} sprites)", atlas.name, atlas.len());
        self.push(atlas);
        Ok(())
    }

    /// Remove an atlas and release its texture.
    pub fn unload_atlas(&mut self, backend: &mut dyn Backend, name: &str) -> Result<(), AtlasError> {
        let slot = self
            .index_of(name)
            .ok_or_else(|| AtlasError::NotFound(name.to_owned()))?;
        let atlas = self.atlases.remove(slot);
        backend.unload_texture(atlas.texture);
        self.rebuild_index();
        log::info!("Unloaded atlas '{name}'");
        Ok(())
    }

    /// Re-read an atlas from the files it was loaded from.
    ///
    /// The atlas keeps its load position. On failure the old atlas stays.
    pub fn reload_atlas(&mut self, backend: &mut dyn Backend, name: &str) -> Result<(), AtlasError> {
        let slot = self
            .index_of(name)
            .ok_or_else(|| AtlasError::NotFound(name.to_owned()))?;
        let old = &self.atlases[slot];
        let Some(texture_path) = old.texture_path.clone() else {
            return Err(AtlasError::NoSource(name.to_owned()));
        };
        let json_path = old.json_path.clone();
        let json = match &json_path {
            Some(path) => read_json(path)?,
            None => return Err(AtlasError::NoSource(name.to_owned())),
        };

        let mut atlas = build_atlas(backend, name, &json, &texture_path)?;
        atlas.json_path = json_path;
        atlas.texture_path = Some(texture_path);
        let old = std::mem::replace(&mut self.atlases[slot], atlas);
        backend.unload_texture(old.texture);
        self.rebuild_index();
        log::info!("Reloaded atlas '{name}' ({} sprites)", self.atlases[slot].len());
        Ok(())
    }

    pub fn atlas(&self, name: &str) -> Option<&Atlas> {
        self.atlases.iter().find(|a| a.name == name)
    }

    /// Atlases in load order.
    pub fn atlases(&self) -> impl Iterator<Item = &Atlas> + '_ {
        self.atlases.iter()
    }

    pub fn find_sprite(&self, name: &str) -> Option<SpriteRef<'_>> {
        let atlas = self.atlases.get(*self.index.get(name)?)?;
        let data = atlas.sprites.get(name)?;
        Some(SpriteRef { atlas, data })
    }

    /// Number of distinct sprite names.
    pub fn sprite_count(&self) -> usize {
        self.index.len()
    }

    /// Bumped on every mutation. Compare against a saved value to invalidate caches.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.atlases.iter().position(|a| a.name == name)
    }

    fn ensure_new(&self, name: &str) -> Result<(), AtlasError> {
        if self.index_of(name).is_some() {
            return Err(AtlasError::Duplicate(name.to_owned()));
        }
        Ok(())
    }

    fn push(&mut self, atlas: Atlas) {
        self.atlases.push(atlas);
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (slot, atlas) in self.atlases.iter().enumerate() {
            for sprite in atlas.sprites.keys() {
                match index.get(sprite) {
                    Some(&owner) => log::warn!(
                        "Sprite '{sprite}' in atlas '{}' is shadowed by atlas '{}'",
                        atlas.name,
                        self.atlases[owner].name
                    ),
                    None => {
                        index.insert(sprite.clone(), slot);
                    }
                }
            }
        }
        self.index = index;
        self.version += 1;
    }
}

fn read_json(path: &Path) -> Result<String, AtlasError> {
    std::fs::read_to_string(path).map_err(|source| AtlasError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse first so a bad JSON never leaks a texture.
fn build_atlas(backend: &mut dyn Backend, name: &str, json: &str, texture_path: &Path) -> Result<Atlas, AtlasError> {
    let sprites = parse_texture_packer(json).map_err(|source| AtlasError::Json {
        name: name.to_owned(),
        source,
    })?;
    let texture = backend
        .load_texture(texture_path)
        .map_err(|source| AtlasError::Texture {
            name: name.to_owned(),
            source,
        })?;
    let mut atlas = Atlas::new(name, texture);
    for (sprite, data) in sprites {
        atlas.sprites.entry(sprite).or_insert(data);
    }
    Ok(atlas)
}
