//! # Layers — Closed, Ordered Render Groups
//!
//! Every drawable belongs to exactly one layer. A layer carries static
//! configuration that never changes after startup:
//!
//! - **space**: world-space layers are drawn through the camera transform and
//!   culled against the camera viewport; screen-space layers (HUD, debug
//!   overlays) are drawn in screen pixels and never culled.
//! - **visible**: the default global visibility.
//! - **parallax**: multipliers applied to the camera position for this layer.
//!   `1.0` scrolls with the world, `0.0` stays fixed to the screen.
//! - **priority**: draw order. Lower priorities draw first (further back).
//!
//! The set of layers is built once into a [`LayerRegistry`]. Layers are
//! addressed by a small [`LayerId`] index, which lets per-camera visibility be
//! a single `u64` bitset ([`LayerMask`]).
//!
//! ```text
//! LayerRegistry
//! ┌─────────────────────────────────────────────────────────┐
//! │ layers:  [background, world, effects, ui, debug]        │ declaration order
//! │ sorted:  [0, 1, 2, 3, 4]                                │ priority order (stable)
//! │ visible: 0b11111                                        │ default visibility
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Applications with their own closed layer enum implement [`LayerEnum`] and
//! call [`LayerRegistry::from_enum`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Maximum number of layers. Bounded by the width of [`LayerMask`].
pub const MAX_LAYERS: usize = 64;

/// Errors raised while building a [`LayerRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("too many layers: {0} (maximum is 64)")]
    TooManyLayers(usize),
    #[error("duplicate layer name '{0}'")]
    DuplicateName(String),
    #[error("layer registry must contain at least one layer")]
    Empty,
    #[error("invalid layer table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("layer id {0} out of range (maximum is 64 layers)")]
    InvalidId(usize),
}

/// Coordinate space a layer is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSpace {
    #[default]
    World,
    Screen,
}

fn default_true() -> bool {
    true
}

fn default_parallax() -> f32 {
    1.0
}

/// Static per-layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    #[serde(default)]
    pub space: LayerSpace,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_parallax")]
    pub parallax_x: f32,
    #[serde(default = "default_parallax")]
    pub parallax_y: f32,
    #[serde(default)]
    pub priority: i32,
}

impl LayerConfig {
    /// A visible world-space layer with no parallax.
    pub const fn world(priority: i32) -> Self {
        Self {
            space: LayerSpace::World,
            visible: true,
            parallax_x: 1.0,
            parallax_y: 1.0,
            priority,
        }
    }

    /// A visible screen-space layer.
    pub const fn screen(priority: i32) -> Self {
        Self {
            space: LayerSpace::Screen,
            ..Self::world(priority)
        }
    }

    pub const fn parallax(mut self, x: f32, y: f32) -> Self {
        self.parallax_x = x;
        self.parallax_y = y;
        self
    }

    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn is_screen_space(&self) -> bool {
        self.space == LayerSpace::Screen
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self::world(0)
    }
}

/// Index of a layer within its [`LayerRegistry`] (declaration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LayerId(pub(crate) u8);

impl LayerId {
    // Ids of the layers in `LayerRegistry::default()`.
    pub const BACKGROUND: Self = Self(0);
    pub const WORLD: Self = Self(1);
    pub const EFFECTS: Self = Self(2);
    pub const UI: Self = Self(3);
    pub const DEBUG: Self = Self(4);

    /// Build an id from a raw index. Returns `None` past [`MAX_LAYERS`].
    pub fn new(index: usize) -> Option<Self> {
        (index < MAX_LAYERS).then_some(Self(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for LayerId {
    type Error = LayerError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index as usize).ok_or(LayerError::InvalidId(index as usize))
    }
}

impl From<LayerId> for u8 {
    fn from(id: LayerId) -> Self {
        id.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::WORLD
    }
}

/// A named layer entry in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub config: LayerConfig,
}

impl LayerDescriptor {
    pub fn new(name: impl Into<String>, config: LayerConfig) -> Self {
        Self { name: name.into(), config }
    }
}

/// A set of layers, one bit per [`LayerId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(u64);

impl LayerMask {
    pub const ALL: Self = Self(u64::MAX);
    pub const NONE: Self = Self(0);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    fn bit(layer: LayerId) -> u64 {
        1u64.checked_shl(u32::from(layer.0)).unwrap_or(0)
    }

    pub fn only(layer: LayerId) -> Self {
        Self(Self::bit(layer))
    }

    pub fn with(self, layer: LayerId) -> Self {
        Self(self.0 | Self::bit(layer))
    }

    pub fn without(self, layer: LayerId) -> Self {
        Self(self.0 & !Self::bit(layer))
    }

    pub fn set(&mut self, layer: LayerId, on: bool) {
        *self = if on { self.with(layer) } else { self.without(layer) };
    }

    pub fn contains(self, layer: LayerId) -> bool {
        self.0 & Self::bit(layer) != 0
    }

    pub fn intersect(self, other: LayerMask) -> Self {
        Self(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<LayerId> for LayerMask {
    fn from_iter<I: IntoIterator<Item = LayerId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |mask, id| mask.with(id))
    }
}

/// Implemented by an application's closed layer enum.
///
/// ```ignore
/// #[derive(Clone, Copy)]
/// enum GameLayer { Sky, Level, Hud }
///
/// impl LayerEnum for GameLayer {
///     const ALL: &'static [Self] = &[GameLayer::Sky, GameLayer::Level, GameLayer::Hud];
///     fn index(self) -> usize { self as usize }
///     fn name(self) -> &'static str { ... }
///     fn config(self) -> LayerConfig { ... }
/// }
/// ```
pub trait LayerEnum: Copy + 'static {
    /// Every variant, in declaration order. `ALL[v.index()]` must be `v`.
    const ALL: &'static [Self];

    fn index(self) -> usize;
    fn name(self) -> &'static str;
    fn config(self) -> LayerConfig;

    /// `None` when the index is past [`MAX_LAYERS`].
    fn id(self) -> Option<LayerId> {
        LayerId::new(self.index())
    }
}

/// The fixed, priority-sorted set of layers.
#[derive(Debug, Clone)]
pub struct LayerRegistry {
    layers: Vec<LayerDescriptor>,
    sorted: Vec<LayerId>,
}

impl LayerRegistry {
    /// Build a registry. Order of `layers` defines each [`LayerId`]; draw order
    /// is ascending priority with ties broken by declaration order.
    pub fn new(layers: Vec<LayerDescriptor>) -> Result<Self, LayerError> {
        if layers.is_empty() {
            return Err(LayerError::Empty);
        }
        if layers.len() > MAX_LAYERS {
            return Err(LayerError::TooManyLayers(layers.len()));
        }
        let mut seen = HashSet::new();
        for layer in &layers {
            if !seen.insert(layer.name.as_str()) {
                return Err(LayerError::DuplicateName(layer.name.clone()));
            }
        }

        let mut sorted: Vec<LayerId> = (0..layers.len()).map(|i| LayerId(i as u8)).collect();
        // Stable sort keeps declaration order among equal priorities.
        sorted.sort_by_key(|id| layers[id.index()].config.priority);

        log::debug!(
            "Layer registry: {}",
            sorted
                .iter()
                .map(|id| layers[id.index()].name.as_str())
                .collect::<Vec<_>>()
                .join(" < ")
        );

        Ok(Self { layers, sorted })
    }

    /// Build from a JSON array of `{ name, space, visible, parallax_x, parallax_y, priority }`.
    pub fn from_json_str(json: &str) -> Result<Self, LayerError> {
        let layers: Vec<LayerDescriptor> = serde_json::from_str(json)?;
        Self::new(layers)
    }

    /// Build from an application layer enum.
    pub fn from_enum<L: LayerEnum>() -> Result<Self, LayerError> {
        Self::new(
            L::ALL
                .iter()
                .map(|l| LayerDescriptor::new(l.name(), l.config()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        id.index() < self.layers.len()
    }

    pub fn get(&self, id: LayerId) -> Option<&LayerDescriptor> {
        self.layers.get(id.index())
    }

    pub fn config(&self, id: LayerId) -> Option<&LayerConfig> {
        self.get(id).map(|d| &d.config)
    }

    pub fn by_name(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|d| d.name == name)
            .map(|i| LayerId(i as u8))
    }

    /// Layer ids in draw order.
    pub fn sorted(&self) -> &[LayerId] {
        &self.sorted
    }

    /// Mask of all layers whose config says `visible`.
    pub fn default_visible(&self) -> LayerMask {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, d)| d.config.visible)
            .map(|(i, _)| LayerId(i as u8))
            .collect()
    }

    /// Mask of every layer in the registry.
    pub fn all(&self) -> LayerMask {
        (0..self.layers.len()).map(|i| LayerId(i as u8)).collect()
    }
}

impl Default for LayerRegistry {
    /// `background` (parallax 0.5), `world`, `effects`, `ui` (screen), `debug` (screen).
    fn default() -> Self {
        let layers = vec![
            LayerDescriptor::new("background", LayerConfig::world(-100).parallax(0.5, 0.5)),
            LayerDescriptor::new("world", LayerConfig::world(0)),
            LayerDescriptor::new("effects", LayerConfig::world(50)),
            LayerDescriptor::new("ui", LayerConfig::screen(100)),
            LayerDescriptor::new("debug", LayerConfig::screen(1000)),
        ];
        let sorted = (0..layers.len()).map(|i| LayerId(i as u8)).collect();
        Self { layers, sorted }
    }
}
