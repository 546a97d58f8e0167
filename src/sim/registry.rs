//! Identity-keyed collection of live particles
//!
//! Identifiers come from a monotonically increasing counter and are never
//! reused, even after `clear`. Storage is borrowed from a [`ParticlePool`];
//! nothing outside the registry ever holds a slot handle, so a removed
//! particle cannot be reached through a stale reference.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::particle::Particle;
use super::pool::{ParticlePool, SlotHandle};
use crate::error::Result;

/// Stable particle identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live particles keyed by [`ParticleId`], iterated in ascending ID order
#[derive(Debug, Default)]
pub struct ParticleRegistry {
    pool: ParticlePool,
    slots: BTreeMap<ParticleId, SlotHandle>,
    next_id: u64,
}

impl ParticleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh default particle and lend it out for initialization
    ///
    /// On allocation failure nothing is registered and the ID counter is untouched.
    pub fn spawn(&mut self) -> Result<(ParticleId, &mut Particle)> {
        let (handle, particle) = self.pool.allocate_mut()?;
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.slots.insert(id, handle);
        Ok((id, particle))
    }

    /// Register an already-built particle
    pub fn insert(&mut self, particle: Particle) -> Result<ParticleId> {
        let (id, slot) = self.spawn()?;
        *slot = particle;
        Ok(id)
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.slots.get(&id).and_then(|&h| self.pool.get(h))
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        let handle = *self.slots.get(&id)?;
        self.pool.get_mut(handle)
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Unregister `id` and return its storage to the pool
    ///
    /// Removing an unknown or already-removed ID is a no-op returning `None`.
    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        let handle = self.slots.remove(&id)?;
        self.pool.release(handle)
    }

    /// Live `(id, particle)` pairs in ascending ID order
    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.slots
            .iter()
            .filter_map(|(&id, &h)| self.pool.get(h).map(|p| (id, p)))
    }

    /// Fill `out` with the live IDs in ascending order, reusing its allocation
    pub fn ids_into(&self, out: &mut Vec<ParticleId>) -> Result<()> {
        out.clear();
        out.try_reserve(self.slots.len())?;
        out.extend(self.slots.keys().copied());
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every particle; the ID counter keeps counting
    pub fn clear(&mut self) {
        for (_, handle) in std::mem::take(&mut self.slots) {
            self.pool.release(handle);
        }
    }

    /// The ID the next spawn will receive
    pub fn next_id(&self) -> ParticleId {
        ParticleId(self.next_id)
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_spawn_distinct_ids() {
        let mut registry = ParticleRegistry::new();
        let (a, p) = registry.spawn().unwrap();
        p.volume = 1.0;
        let (b, p) = registry.spawn().unwrap();
        p.volume = 2.0;

        assert_ne!(a, b);
        assert_eq!(registry.get(a).unwrap().volume, 1.0);
        assert_eq!(registry.get(b).unwrap().volume, 2.0);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_iter_matches_count() {
        let mut registry = ParticleRegistry::new();
        let ids: Vec<ParticleId> = (0..6).map(|_| registry.spawn().unwrap().0).collect();
        let seen: Vec<ParticleId> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(seen, ids);
        assert_eq!(seen.len(), registry.count());
    }

    #[test]
    fn test_remove_one_keeps_other() {
        let mut registry = ParticleRegistry::new();
        let a = registry.insert(Particle::new(Vec3::ONE, Vec3::ZERO, 1.0)).unwrap();
        let b = registry.insert(Particle::new(Vec3::X, Vec3::ZERO, 2.0)).unwrap();

        assert_eq!(registry.remove(a).map(|p| p.volume), Some(1.0));
        assert!(registry.get(a).is_none());
        assert!(!registry.contains(a));
        assert_eq!(registry.get(b).unwrap().volume, 2.0);
        let seen: Vec<ParticleId> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(seen, vec![b]);

        // Second removal is a no-op
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut registry = ParticleRegistry::new();
        let a = registry.spawn().unwrap().0;
        assert_eq!(registry.next_id(), ParticleId(a.0 + 1));
        registry.remove(a);
        let b = registry.spawn().unwrap().0;
        assert!(b > a);
        // Storage is recycled even though the ID is new
        assert_eq!(registry.pool().capacity(), 1);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.next_id(), ParticleId(b.0 + 1));
        let c = registry.spawn().unwrap().0;
        assert!(c > b);
    }

    #[test]
    fn test_clear_returns_storage() {
        let mut registry = ParticleRegistry::new();
        for _ in 0..10 {
            registry.spawn().unwrap();
        }
        registry.clear();
        assert_eq!(registry.count(), 0);
        assert_eq!(registry.iter().count(), 0);
        assert_eq!(registry.pool().live(), 0);
        assert_eq!(registry.pool().free_len(), 10);
    }

    #[test]
    fn test_get_mut_and_ids_into() {
        let mut registry = ParticleRegistry::new();
        let a = registry.spawn().unwrap().0;
        let b = registry.spawn().unwrap().0;
        registry.get_mut(b).unwrap().sediment = 0.5;

        let mut ids = Vec::new();
        registry.ids_into(&mut ids).unwrap();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(registry.get(b).unwrap().sediment, 0.5);
    }
}
