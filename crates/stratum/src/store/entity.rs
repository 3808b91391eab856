//! # EntityId — Generational Handles for Drawables
//!
//! An [`EntityId`] names one drawable (sprite, shape, or text) in the
//! [`VisualStore`](super::VisualStore). It owns nothing; the store maps it to
//! the visual record and its position.
//!
//! ## Generational Indices
//!
//! Slots are recycled when a drawable is removed. Pairing each index with a
//! **generation** counter makes stale handles detectable:
//!
//! ```text
//! EntityId { index: 5, generation: 0 }  ← original
//! EntityId { index: 5, generation: 1 }  ← after the slot is recycled
//! ```
//!
//! A handle that still says `generation: 0` fails every lookup, so a render
//! pass that meets a stale bucket entry simply skips it.

use std::fmt;

/// A lightweight handle to a drawable in the [`VisualStore`](super::VisualStore).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl EntityId {
    /// Returns the raw slot index. Useful for diagnostics.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation. Useful for diagnostics.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out [`EntityId`]s and recycles freed slots.
///
/// ```text
/// generations: [0, 1, 0, 2, 0]   ← one generation per slot ever allocated
/// free_list:   [1, 3]             ← slots available for reuse
/// ```
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Reuses a freed slot if one is available, otherwise grows.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_list.pop() {
            // Generation was already bumped on deallocate.
            let generation = self.generations[index as usize];
            EntityId { index, generation }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            EntityId { index, generation: 0 }
        }
    }

    /// Returns `false` if the handle was already stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = &mut self.generations[id.index as usize];
        *slot = slot.wrapping_add(1);
        self.free_list.push(id.index);
        true
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.generations
            .get(id.index as usize)
            .is_some_and(|&g| g == id.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free_list.len()
    }

    /// Total number of slots ever allocated.
    pub fn total_slots(&self) -> usize {
        self.generations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        assert_eq!(e0.index, 0);
        assert_eq!(e1.index, 1);
        assert_eq!(e0.generation, 0);
    }

    #[test]
    fn recycle_bumps_generation() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        let reused = alloc.allocate();
        assert_eq!(reused.index, 0);
        assert_eq!(reused.generation, 1);
        assert!(!alloc.is_alive(e0));
        assert!(alloc.is_alive(reused));
    }

    #[test]
    fn double_free_returns_false() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        assert!(!alloc.deallocate(e0));
    }

    #[test]
    fn counts() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        let _e1 = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        alloc.deallocate(e0);
        assert_eq!(alloc.alive_count(), 1);
        assert_eq!(alloc.total_slots(), 2);
    }

    #[test]
    fn unknown_index_is_not_alive() {
        let alloc = EntityAllocator::new();
        assert!(!alloc.is_alive(EntityId { index: 7, generation: 0 }));
    }
}
