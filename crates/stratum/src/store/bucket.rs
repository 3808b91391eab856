//! # Z-Buckets — Per-Layer Draw Order
//!
//! Each layer owns a [`ZBucket`]: the list of items drawn on that layer,
//! ordered by ascending z-index. Items with the same z-index keep their
//! insertion order, so the painter's algorithm is fully deterministic.
//!
//! ## Layout
//!
//! ```text
//! items: BTreeMap<(z, seq), RenderItem>     ordered draw list
//!          (-1, 4) → shape  3v0
//!          ( 0, 0) → sprite 0v0
//!          ( 0, 2) → sprite 7v1              same z: seq breaks the tie
//!          ( 5, 1) → text   2v0
//!
//! keys:  HashMap<EntityId, (z, seq)>        reverse index for O(log n) removal
//! ```
//!
//! `seq` is a monotonically increasing counter assigned on insert. Moving an
//! item to a new z-index is remove + insert, so it gets a fresh `seq` and
//! sorts after items already at the target z.
//!
//! ## Comparison
//!
//! - A sorted `Vec` with binary search gives O(n) inserts (shifting), which
//!   hurts when many items change z every frame.
//! - Sorting the whole list each frame (what a painter's-algorithm batcher
//!   does) is O(n log n) per frame even when nothing moved.
//!
//! The B-tree costs O(log n) per change and zero work per frame for items that
//! stay put.

use std::collections::{BTreeMap, HashMap};

use super::entity::EntityId;

/// What kind of visual a [`RenderItem`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Sprite,
    Shape,
    Text,
}

/// A reference to a drawable stored in a z-bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderItem {
    pub entity: EntityId,
    pub kind: ItemKind,
}

impl RenderItem {
    pub fn new(entity: EntityId, kind: ItemKind) -> Self {
        Self { entity, kind }
    }
}

/// Ordered draw list for one layer.
#[derive(Debug, Default)]
pub struct ZBucket {
    items: BTreeMap<(i32, u64), RenderItem>,
    keys: HashMap<EntityId, (i32, u64)>,
    next_seq: u64,
}

impl ZBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` at `z_index`, after any items already at that z.
    ///
    /// Inserting an entity that is already present moves it instead.
    pub fn insert(&mut self, z_index: i32, item: RenderItem) {
        if let Some(old) = self.keys.remove(&item.entity) {
            self.items.remove(&old);
        }
        let key = (z_index, self.next_seq);
        self.next_seq += 1;
        self.items.insert(key, item);
        self.keys.insert(item.entity, key);
    }

    /// Remove an entity. Returns its z-index if it was present.
    pub fn remove(&mut self, entity: EntityId) -> Option<i32> {
        let key = self.keys.remove(&entity)?;
        self.items.remove(&key);
        Some(key.0)
    }

    /// Move an entity to a new z-index. Returns `false` if it isn't in this bucket.
    pub fn update(&mut self, entity: EntityId, z_index: i32) -> bool {
        let Some(key) = self.keys.get(&entity).copied() else {
            return false;
        };
        let Some(item) = self.items.remove(&key) else {
            return false;
        };
        self.keys.remove(&entity);
        self.insert(z_index, item);
        true
    }

    pub fn z_index(&self, entity: EntityId) -> Option<i32> {
        self.keys.get(&entity).map(|k| k.0)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.keys.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
    }

    /// Items in draw order (ascending z, ties by insertion order).
    pub fn iter(&self) -> impl Iterator<Item = &RenderItem> + '_ {
        self.items.values()
    }

    /// Items in draw order, paired with their z-index.
    pub fn iter_with_z(&self) -> impl Iterator<Item = (i32, &RenderItem)> + '_ {
        self.items.iter().map(|(&(z, _), item)| (z, item))
    }
}
