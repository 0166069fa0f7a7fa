//! # Entity Management
//!
//! Entities are plain indices. They carry no data of their own; everything
//! an entity "is" lives in the component stores, keyed by this index.
//!
//! Ids are recycled in FIFO order so a freed id is handed out again only
//! after every other free id has been used. Stale external handles therefore
//! take a long time to alias a new entity.

use std::collections::VecDeque;
use std::fmt;

use super::signature::Signature;
use crate::error::{EcsError, EcsResult};

/// Unique identifier for an alive entity.
///
/// Unique among currently alive entities and reused after destruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Creates an entity handle from a raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this entity.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues and recycles entity ids and owns every entity's signature.
///
/// All memory is pre-allocated at creation: the free list, the signature
/// table (one slot per possible id), the liveness flags and the
/// generation counters.
pub struct EntityManager {
    /// Free ids, handed out from the front and returned to the back.
    available: VecDeque<Entity>,
    /// Signature per id. Unused ids always hold the empty signature.
    signatures: Box<[Signature]>,
    /// Liveness per id.
    alive: Box<[bool]>,
    /// Times each id has been destroyed.
    generations: Box<[u32]>,
    /// Number of currently alive entities.
    living_count: usize,
}

impl EntityManager {
    /// Creates a manager able to hold `capacity` live entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "Capacity cannot exceed u32::MAX"
        );

        #[allow(clippy::cast_possible_truncation)]
        let available = (0..capacity as u32).map(Entity::new).collect();

        Self {
            available,
            signatures: vec![Signature::EMPTY; capacity].into_boxed_slice(),
            alive: vec![false; capacity].into_boxed_slice(),
            generations: vec![0; capacity].into_boxed_slice(),
            living_count: 0,
        }
    }

    /// Returns the maximum number of live entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.signatures.len()
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn living_count(&self) -> usize {
        self.living_count
    }

    /// Takes the oldest free id.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExceeded`] if every id is alive.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let entity = self.available.pop_front().ok_or(EcsError::CapacityExceeded {
            capacity: self.capacity(),
        })?;

        self.alive[entity.index()] = true;
        self.living_count += 1;
        Ok(entity)
    }

    /// Clears the entity's signature and returns its id to the back of the
    /// free list.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is out of range or not alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.check_alive(entity)?;

        let idx = entity.index();
        self.signatures[idx] = Signature::EMPTY;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.available.push_back(entity);
        self.living_count -= 1;
        Ok(())
    }

    /// Overwrites the entity's signature.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] for ids beyond capacity.
    pub fn set_signature(&mut self, entity: Entity, signature: Signature) -> EcsResult<()> {
        self.check_range(entity)?;
        self.signatures[entity.index()] = signature;
        Ok(())
    }

    /// Returns the entity's signature.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] for ids beyond capacity.
    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        self.check_range(entity)?;
        Ok(self.signatures[entity.index()])
    }

    /// Number of times the id has been destroyed.
    ///
    /// Ids are reused, so an unchanged generation is how a holder tells
    /// that the id still names the same entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] for ids beyond capacity.
    pub fn generation(&self, entity: Entity) -> EcsResult<u32> {
        self.check_range(entity)?;
        Ok(self.generations[entity.index()])
    }

    /// Checks if an entity is alive. Out-of-range ids are never alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Fails unless the id is within capacity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`].
    #[inline]
    pub fn check_range(&self, entity: Entity) -> EcsResult<()> {
        if entity.index() < self.capacity() {
            Ok(())
        } else {
            Err(EcsError::EntityOutOfRange {
                entity,
                capacity: self.capacity(),
            })
        }
    }

    /// Fails unless the id is within capacity and alive.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityOutOfRange`] or [`EcsError::EntityNotAlive`].
    #[inline]
    pub fn check_alive(&self, entity: Entity) -> EcsResult<()> {
        self.check_range(entity)?;
        if self.alive[entity.index()] {
            Ok(())
        } else {
            Err(EcsError::EntityNotAlive(entity))
        }
    }

    /// Iterates over alive entities in id order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Entity::new(idx as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::signature::ComponentType;

    #[test]
    fn test_create_hands_out_ids_in_order() {
        let mut manager = EntityManager::new(4);
        assert_eq!(manager.create_entity().unwrap(), Entity::new(0));
        assert_eq!(manager.create_entity().unwrap(), Entity::new(1));
        assert_eq!(manager.living_count(), 2);
    }

    #[test]
    fn test_fifo_recycling() {
        let mut manager = EntityManager::new(3);
        let e0 = manager.create_entity().unwrap();
        let _e1 = manager.create_entity().unwrap();

        manager.destroy_entity(e0).unwrap();

        // id 2 was freed before id 0, so it comes out first
        assert_eq!(manager.create_entity().unwrap(), Entity::new(2));
        assert_eq!(manager.create_entity().unwrap(), e0);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut manager = EntityManager::new(2);
        manager.create_entity().unwrap();
        manager.create_entity().unwrap();

        assert_eq!(
            manager.create_entity(),
            Err(EcsError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(manager.living_count(), 2);
    }

    #[test]
    fn test_destroy_clears_signature() {
        let mut manager = EntityManager::new(2);
        let e = manager.create_entity().unwrap();

        let mut sig = Signature::EMPTY;
        sig.set(ComponentType::new(3));
        manager.set_signature(e, sig).unwrap();
        assert_eq!(manager.signature(e).unwrap(), sig);

        manager.destroy_entity(e).unwrap();
        assert_eq!(manager.signature(e).unwrap(), Signature::EMPTY);
        assert!(!manager.is_alive(e));
    }

    #[test]
    fn test_out_of_range_and_double_destroy() {
        let mut manager = EntityManager::new(2);
        let bad = Entity::new(2);
        assert_eq!(
            manager.signature(bad),
            Err(EcsError::EntityOutOfRange {
                entity: bad,
                capacity: 2
            })
        );

        let e = manager.create_entity().unwrap();
        manager.destroy_entity(e).unwrap();
        assert_eq!(manager.destroy_entity(e), Err(EcsError::EntityNotAlive(e)));
        assert_eq!(manager.living_count(), 0);
    }

    #[test]
    fn test_generation_counts_destructions() {
        let mut manager = EntityManager::new(1);
        let e = manager.create_entity().unwrap();
        assert_eq!(manager.generation(e).unwrap(), 0);

        manager.destroy_entity(e).unwrap();
        let again = manager.create_entity().unwrap();
        assert_eq!(again, e);
        assert_eq!(manager.generation(again).unwrap(), 1);
        assert!(manager.generation(Entity::new(1)).is_err());
    }
}
