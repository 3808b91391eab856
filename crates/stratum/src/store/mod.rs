//! # Visual Store — Authoritative Drawables
//!
//! The [`VisualStore`] owns every drawable's position and visual record and
//! keeps the per-layer [`ZBucket`]s in step with them. The renderer only ever
//! reads from it.
//!
//! ```text
//! VisualStore
//! ┌──────────────────────────────────────────────────────────────┐
//! │ allocator: EntityAllocator         generational ids           │
//! │ slots:     [Some(Slot), None, Some(Slot), ...]   by index     │
//! │              └─ position, visual (sprite|shape|text),         │
//! │                 optional AnimationPlayer                      │
//! │ buckets:   [ZBucket; per layer]    draw order per layer       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Re-bucketing
//!
//! Changing a visual's layer or z-index moves its [`RenderItem`] between
//! buckets inside the same `&mut self` call that made the change, so no
//! render pass can see an item half-moved. The `update_*` closures get the
//! same treatment: layer and z are compared before and after the closure runs.
//!
//! ## Stale Handles
//!
//! Every lookup checks the id's generation. A removed id returns `None` from
//! lookups and `false` from mutators, even after its slot is reused.

mod bucket;
mod entity;

pub use bucket::{ItemKind, RenderItem, ZBucket};
pub use entity::EntityId;

use entity::EntityAllocator;

use crate::animation::{Animation, AnimationPlayer};
use crate::layer::LayerId;
use crate::math::Vec2;
use crate::render2d::{ShapeVisual, SpriteVisual, TextVisual};

/// A read-only snapshot of one drawable, valid for the borrow of the store.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a, V> {
    pub visual: &'a V,
    pub position: Vec2,
}

#[derive(Debug, Clone)]
enum Visual {
    Sprite(SpriteVisual),
    Shape(ShapeVisual),
    Text(TextVisual),
}

impl Visual {
    fn kind(&self) -> ItemKind {
        match self {
            Visual::Sprite(_) => ItemKind::Sprite,
            Visual::Shape(_) => ItemKind::Shape,
            Visual::Text(_) => ItemKind::Text,
        }
    }

    fn layer(&self) -> LayerId {
        match self {
            Visual::Sprite(v) => v.layer,
            Visual::Shape(v) => v.layer,
            Visual::Text(v) => v.layer,
        }
    }

    fn z_index(&self) -> i32 {
        match self {
            Visual::Sprite(v) => v.z_index,
            Visual::Shape(v) => v.z_index,
            Visual::Text(v) => v.z_index,
        }
    }

    fn set_layer(&mut self, layer: LayerId) {
        match self {
            Visual::Sprite(v) => v.layer = layer,
            Visual::Shape(v) => v.layer = layer,
            Visual::Text(v) => v.layer = layer,
        }
    }

    fn set_z_index(&mut self, z: i32) {
        match self {
            Visual::Sprite(v) => v.z_index = z,
            Visual::Shape(v) => v.z_index = z,
            Visual::Text(v) => v.z_index = z,
        }
    }

    fn set_visible(&mut self, visible: bool) {
        match self {
            Visual::Sprite(v) => v.visible = visible,
            Visual::Shape(v) => v.visible = visible,
            Visual::Text(v) => v.visible = visible,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    position: Vec2,
    visual: Visual,
    animation: Option<AnimationPlayer>,
}

/// Owns positions, visuals and per-layer draw order.
pub struct VisualStore {
    allocator: EntityAllocator,
    slots: Vec<Option<Slot>>,
    buckets: Vec<ZBucket>,
}

impl VisualStore {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            slots: Vec::new(),
            buckets: Vec::new(),
        }
    }

    // ── Creation / removal ──────────────────────────────────────────────

    pub fn add_sprite(&mut self, position: Vec2, visual: SpriteVisual) -> EntityId {
        self.insert(position, Visual::Sprite(visual))
    }

    pub fn add_shape(&mut self, position: Vec2, visual: ShapeVisual) -> EntityId {
        self.insert(position, Visual::Shape(visual))
    }

    pub fn add_text(&mut self, position: Vec2, visual: TextVisual) -> EntityId {
        self.insert(position, Visual::Text(visual))
    }

    /// Remove a drawable. Returns `false` for a stale id.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if !self.allocator.deallocate(id) {
            return false;
        }
        if let Some(slot) = self.slots.get_mut(id.index as usize).and_then(Option::take) {
            if let Some(bucket) = self.buckets.get_mut(slot.visual.layer().index()) {
                bucket.remove(id);
            }
        }
        true
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    /// Number of live drawables.
    pub fn len(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots allocated so far, live or waiting for reuse.
    pub fn capacity(&self) -> usize {
        self.allocator.total_slots()
    }

    pub fn kind(&self, id: EntityId) -> Option<ItemKind> {
        self.slot(id).map(|s| s.visual.kind())
    }

    // ── Position ────────────────────────────────────────────────────────

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.slot(id).map(|s| s.position)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        self.slot_mut(id).map(|s| s.position = position).is_some()
    }

    pub fn translate(&mut self, id: EntityId, delta: Vec2) -> bool {
        self.slot_mut(id).map(|s| s.position += delta).is_some()
    }

    // ── Draw order and visibility ───────────────────────────────────────

    /// Move to a new z-index within the same layer.
    pub fn set_z_index(&mut self, id: EntityId, z_index: i32) -> bool {
        self.restack(id, |visual| visual.set_z_index(z_index))
    }

    /// Move to another layer, keeping the z-index.
    pub fn set_layer(&mut self, id: EntityId, layer: LayerId) -> bool {
        self.restack(id, |visual| visual.set_layer(layer))
    }

    pub fn set_visible(&mut self, id: EntityId, visible: bool) -> bool {
        self.slot_mut(id).map(|s| s.visual.set_visible(visible)).is_some()
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    pub fn sprite(&self, id: EntityId) -> Option<Entry<'_, SpriteVisual>> {
        let slot = self.slot(id)?;
        match &slot.visual {
            Visual::Sprite(visual) => Some(Entry { visual, position: slot.position }),
            _ => None,
        }
    }

    pub fn shape(&self, id: EntityId) -> Option<Entry<'_, ShapeVisual>> {
        let slot = self.slot(id)?;
        match &slot.visual {
            Visual::Shape(visual) => Some(Entry { visual, position: slot.position }),
            _ => None,
        }
    }

    pub fn text(&self, id: EntityId) -> Option<Entry<'_, TextVisual>> {
        let slot = self.slot(id)?;
        match &slot.visual {
            Visual::Text(visual) => Some(Entry { visual, position: slot.position }),
            _ => None,
        }
    }

    /// Draw list of a layer, if anything was ever added to it.
    pub fn bucket(&self, layer: LayerId) -> Option<&ZBucket> {
        self.buckets.get(layer.index())
    }

    // ── Mutation through closures ───────────────────────────────────────

    /// Edit a sprite in place. Returns `false` for a stale id or a non-sprite.
    pub fn update_sprite(&mut self, id: EntityId, f: impl FnOnce(&mut SpriteVisual)) -> bool {
        self.restack(id, |visual| {
            if let Visual::Sprite(v) = visual {
                f(v);
            }
        }) && self.kind(id) == Some(ItemKind::Sprite)
    }

    pub fn update_shape(&mut self, id: EntityId, f: impl FnOnce(&mut ShapeVisual)) -> bool {
        self.restack(id, |visual| {
            if let Visual::Shape(v) = visual {
                f(v);
            }
        }) && self.kind(id) == Some(ItemKind::Shape)
    }

    pub fn update_text(&mut self, id: EntityId, f: impl FnOnce(&mut TextVisual)) -> bool {
        self.restack(id, |visual| {
            if let Visual::Text(v) = visual {
                f(v);
            }
        }) && self.kind(id) == Some(ItemKind::Text)
    }

    // ── Animation ───────────────────────────────────────────────────────

    /// Drive a sprite's name from an animation. The first frame's key is
    /// written immediately. Returns `false` for a stale id or a non-sprite.
    pub fn attach_animation(&mut self, id: EntityId, animation: Animation) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        let Visual::Sprite(sprite) = &mut slot.visual else {
            return false;
        };
        let player = AnimationPlayer::new(animation);
        sprite.sprite_name = player.frame_name();
        slot.animation = Some(player);
        true
    }

    pub fn detach_animation(&mut self, id: EntityId) -> Option<AnimationPlayer> {
        self.slot_mut(id)?.animation.take()
    }

    pub fn animation(&self, id: EntityId) -> Option<&AnimationPlayer> {
        self.slot(id)?.animation.as_ref()
    }

    pub fn animation_mut(&mut self, id: EntityId) -> Option<&mut AnimationPlayer> {
        self.slot_mut(id)?.animation.as_mut()
    }

    /// Advance every animation by `dt` seconds and write changed frame keys
    /// into the sprites. Returns how many sprites changed frame.
    pub fn advance_animations(&mut self, dt: f32) -> usize {
        let mut changed = 0;
        for slot in self.slots.iter_mut().flatten() {
            let (Some(player), Visual::Sprite(sprite)) = (&mut slot.animation, &mut slot.visual) else {
                continue;
            };
            if player.advance(dt) {
                sprite.sprite_name = player.frame_name();
                changed += 1;
            }
        }
        changed
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn insert(&mut self, position: Vec2, visual: Visual) -> EntityId {
        let id = self.allocator.allocate();
        let index = id.index as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        let item = RenderItem::new(id, visual.kind());
        self.bucket_mut(visual.layer()).insert(visual.z_index(), item);
        self.slots[index] = Some(Slot { position, visual, animation: None });
        id
    }

    /// Apply `f` to a visual and move its bucket entry if layer or z changed.
    fn restack(&mut self, id: EntityId, f: impl FnOnce(&mut Visual)) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        let (old_layer, old_z) = (slot.visual.layer(), slot.visual.z_index());
        f(&mut slot.visual);
        let (layer, z, kind) = (slot.visual.layer(), slot.visual.z_index(), slot.visual.kind());

        if layer != old_layer {
            if let Some(bucket) = self.buckets.get_mut(old_layer.index()) {
                bucket.remove(id);
            }
            self.bucket_mut(layer).insert(z, RenderItem::new(id, kind));
        } else if z != old_z {
            self.bucket_mut(layer).update(id, z);
        }
        true
    }

    fn bucket_mut(&mut self, layer: LayerId) -> &mut ZBucket {
        let index = layer.index();
        if index >= self.buckets.len() {
            self.buckets.resize_with(index + 1, ZBucket::new);
        }
        &mut self.buckets[index]
    }

    fn slot(&self, id: EntityId) -> Option<&Slot> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get(id.index as usize)?.as_ref()
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut Slot> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.index as usize)?.as_mut()
    }
}

impl Default for VisualStore {
    fn default() -> Self {
        Self::new()
    }
}
