//! Fixed-capacity entity pools addressed by slot index.
//!
//! Entities are owned exclusively by their pool slot and referenced
//! everywhere else as `(kind, index)` handles. A freed index is immediately
//! reusable; nothing retains identity across a free/allocate cycle, so no
//! handle may be cached across a tick boundary where the entity might die.

use serde::{Deserialize, Serialize};

use crate::constants::pool_caps;
use crate::entities::{Bullet, Human, Zombie};
use crate::map::PortalPair;

/// A fixed-capacity slot array. Allocation scans for the first free slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool<T> {
    slots: Vec<Option<T>>,
}

impl<T> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Place `value` in the first free slot, returning its index, or `None`
    /// when the pool is full.
    pub fn allocate(&mut self, value: T) -> Option<usize> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(value);
        Some(index)
    }

    /// Empty a slot, returning the entity that lived there.
    pub fn free(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index)?.take()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Live entries in ascending slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    /// Snapshot of live indices, ascending. Use when the loop body mutates
    /// the pool.
    pub fn live_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect()
    }
}

/// All entity pools of one simulation instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPools {
    pub humans: Pool<Human>,
    pub zombies: Pool<Zombie>,
    pub bullets: Pool<Bullet>,
    pub portals: Pool<PortalPair>,
}

impl EntityPools {
    pub fn new(portals: Pool<PortalPair>) -> Self {
        Self {
            humans: Pool::with_capacity(pool_caps::HUMANS),
            zombies: Pool::with_capacity(pool_caps::ZOMBIES),
            bullets: Pool::with_capacity(pool_caps::BULLETS),
            portals,
        }
    }
}

impl Default for EntityPools {
    fn default() -> Self {
        Self::new(Pool::with_capacity(pool_caps::PORTAL_PAIRS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_scans_first_free_slot() {
        let mut pool: Pool<u32> = Pool::with_capacity(4);
        assert_eq!(pool.allocate(10), Some(0));
        assert_eq!(pool.allocate(11), Some(1));
        assert_eq!(pool.allocate(12), Some(2));
        pool.free(1);
        assert_eq!(pool.allocate(13), Some(1));
    }

    #[test]
    fn full_pool_rejects_allocation() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        pool.allocate(1);
        pool.allocate(2);
        assert!(pool.is_full());
        assert_eq!(pool.allocate(3), None);
    }

    #[test]
    fn freed_slot_has_no_residual_state() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        let idx = pool.allocate(99).unwrap();
        assert_eq!(pool.free(idx), Some(99));
        assert_eq!(pool.get(idx), None);
        let reused = pool.allocate(5).unwrap();
        assert_eq!(reused, idx);
        assert_eq!(pool.get(reused), Some(&5));
    }

    #[test]
    fn live_iteration_is_ascending_and_skips_holes() {
        let mut pool: Pool<u32> = Pool::with_capacity(8);
        for v in 0..5 {
            pool.allocate(v);
        }
        pool.free(1);
        pool.free(3);
        let live: Vec<usize> = pool.iter_live().map(|(i, _)| i).collect();
        assert_eq!(live, vec![0, 2, 4]);
        assert_eq!(pool.live_count(), 3);
    }

    #[test]
    fn out_of_range_access_is_none() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        assert_eq!(pool.get(5), None);
        assert_eq!(pool.free(5), None);
    }
}
