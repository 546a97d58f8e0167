//! Reusable particle storage
//!
//! The pool owns a growable arena of particle slots and a LIFO free list.
//! Released slots are reused before the arena grows again, and the arena never
//! shrinks. Every slot carries a generation that is bumped on release, so a
//! [`SlotHandle`] kept past its release no longer resolves.

use super::particle::Particle;
use crate::error::Result;

/// Generation-checked reference to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    index: u32,
    generation: u32,
}

impl SlotHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    occupied: bool,
    particle: Particle,
}

/// Arena + free-list allocator for particles
#[derive(Debug, Default)]
pub struct ParticlePool {
    slots: Vec<Slot>,
    /// Indices of released slots; the top of the stack is reused first
    free: Vec<u32>,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a slot holding a default particle
    ///
    /// Reuses the most recently released slot if there is one, otherwise carves
    /// a new slot from the arena. Fails only when the arena cannot grow.
    pub fn allocate(&mut self) -> Result<SlotHandle> {
        self.allocate_mut().map(|(handle, _)| handle)
    }

    /// Like [`allocate`](Self::allocate), also lending the fresh particle for initialization
    pub fn allocate_mut(&mut self) -> Result<(SlotHandle, &mut Particle)> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(!slot.occupied);
            slot.occupied = true;
            slot.particle = Particle::default();
            let handle = SlotHandle {
                index,
                generation: slot.generation,
            };
            return Ok((handle, &mut slot.particle));
        }

        // Reserve the free-list entry now so `release` never has to allocate
        self.slots.try_reserve(1)?;
        self.free.try_reserve(self.slots.len() + 1 - self.free.len())?;

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            occupied: true,
            particle: Particle::default(),
        });
        let handle = SlotHandle {
            index,
            generation: 0,
        };
        let slot = &mut self.slots[index as usize];
        Ok((handle, &mut slot.particle))
    }

    /// Return a slot to the free list, yielding its last particle value
    ///
    /// Returns `None` (and does nothing) for a stale or foreign handle.
    pub fn release(&mut self, handle: SlotHandle) -> Option<Particle> {
        let slot = self.slot_mut(handle)?;
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        let particle = slot.particle;
        self.free.push(handle.index);
        Some(particle)
    }

    pub fn get(&self, handle: SlotHandle) -> Option<&Particle> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.occupied && s.generation == handle.generation)
            .map(|s| &s.particle)
    }

    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut Particle> {
        self.slot_mut(handle).map(|s| &mut s.particle)
    }

    fn slot_mut(&mut self, handle: SlotHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.occupied && s.generation == handle.generation)
    }

    /// Slots ever carved from the arena
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently checked out
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Slots waiting on the free list
    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}
