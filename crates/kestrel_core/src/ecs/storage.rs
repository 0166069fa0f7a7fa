//! # Component Storage
//!
//! Pre-allocated, dense component storage.
//!
//! The storage uses a packed array strategy:
//! - All value slots are reserved at creation (no growth during play)
//! - Live values occupy `[0, len)` with no gaps
//! - Removal swaps the last value into the hole, so density survives
//! - Access is O(1) via a sparse entity-to-slot table
//!
//! ```text
//!   sparse (by entity id)      dense (by slot)
//!   ┌───┬───┬───┬───┐          ┌────┬────┬────┐
//!   │ 1 │ - │ 0 │ 2 │  ──────> │ v2 │ v0 │ v3 │  values
//!   └───┴───┴───┴───┘          ├────┼────┼────┤
//!     0   1   2   3            │ e2 │ e0 │ e3 │  owners
//!                              └────┴────┴────┘
//! ```

use std::any::Any;

use super::component::Component;
use super::entity::Entity;
use crate::error::{EcsError, EcsResult};

/// Type-erased view of a [`ComponentStore`].
///
/// The registry holds stores of many different types in one collection and
/// only ever needs to tell each of them that an entity is gone, or to hand a
/// store back out for a typed downcast.
pub trait ErasedStore: Send + Sync {
    /// Drops the entity's component if this store holds one. No-op otherwise.
    fn notify_entity_destroyed(&mut self, entity: Entity);

    /// Returns `true` if the entity has a value in this store.
    fn contains(&self, entity: Entity) -> bool;

    /// Number of stored values.
    fn len(&self) -> usize;

    /// Returns `true` if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the stored component type.
    fn component_name(&self) -> &'static str;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage for a single component type.
///
/// This storage guarantees:
/// - Zero allocations after initialization
/// - O(1) insert, remove and access by entity
/// - Contiguous iteration over exactly the live values
///
/// # Type Parameters
///
/// * `C` - The component type to store
///
/// # Example
///
/// ```rust
/// use kestrel_core::{Component, ComponentStore, Entity};
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
/// impl Component for Health {}
///
/// let mut store: ComponentStore<Health> = ComponentStore::new(16);
/// store.insert(Entity::new(3), Health(10)).unwrap();
/// assert_eq!(store.get(Entity::new(3)).unwrap(), &Health(10));
/// ```
pub struct ComponentStore<C: Component> {
    /// Packed values, `values[i]` belongs to `owners[i]`.
    values: Vec<C>,
    /// Slot index to owning entity.
    owners: Vec<Entity>,
    /// Entity id to slot index.
    slots: Box<[Option<usize>]>,
}

impl<C: Component> ComponentStore<C> {
    /// Creates a store able to hold one value per entity id below `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            values: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
            slots: vec![None; capacity].into_boxed_slice(),
        }
    }

    /// Returns the capacity of this store.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` if the entity has a value here.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index_of(entity).is_some()
    }

    /// Dense slot currently holding the entity's value.
    #[inline]
    #[must_use]
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        self.slots.get(entity.index()).copied().flatten()
    }

    /// Appends a value for `entity` at the next dense slot.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if the entity already has a
    /// value (the existing value is left untouched), or
    /// [`EcsError::EntityOutOfRange`] if the id is beyond capacity.
    pub fn insert(&mut self, entity: Entity, component: C) -> EcsResult<()> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(entity.index())
            .ok_or(EcsError::EntityOutOfRange { entity, capacity })?;

        if slot.is_some() {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: C::name(),
            });
        }

        *slot = Some(self.values.len());
        self.values.push(component);
        self.owners.push(entity);
        Ok(())
    }

    /// Removes and returns the entity's value.
    ///
    /// The last value is moved into the freed slot and its owner remapped,
    /// so the live region stays gap-free.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if the entity has no value.
    pub fn remove(&mut self, entity: Entity) -> EcsResult<C> {
        let index = self.index_of(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: C::name(),
        })?;

        let removed = self.values.swap_remove(index);
        self.owners.swap_remove(index);
        self.slots[entity.index()] = None;

        // A value moved into `index` unless the removed one was last
        if let Some(&moved) = self.owners.get(index) {
            self.slots[moved.index()] = Some(index);
        }

        Ok(removed)
    }

    /// Gets the entity's value.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if the entity has no value.
    #[inline]
    pub fn get(&self, entity: Entity) -> EcsResult<&C> {
        match self.index_of(entity) {
            Some(index) => Ok(&self.values[index]),
            None => Err(Self::missing(entity)),
        }
    }

    /// Gets the entity's value for in-place mutation.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if the entity has no value.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> EcsResult<&mut C> {
        match self.index_of(entity) {
            Some(index) => Ok(&mut self.values[index]),
            None => Err(Self::missing(entity)),
        }
    }

    /// Returns the live values as a packed slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.values
    }

    /// Returns the live values as a packed mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.values
    }

    /// Owners of the live values, slot-aligned with [`as_slice`](Self::as_slice).
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    /// Iterates over `(entity, value)` pairs in slot order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &C)> {
        self.owners.iter().copied().zip(self.values.iter())
    }

    /// Iterates mutably over `(entity, value)` pairs in slot order.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut C)> {
        self.owners.iter().copied().zip(self.values.iter_mut())
    }

    fn missing(entity: Entity) -> EcsError {
        EcsError::MissingComponent {
            entity,
            component: C::name(),
        }
    }
}

impl<C: Component> ErasedStore for ComponentStore<C> {
    fn notify_entity_destroyed(&mut self, entity: Entity) {
        if self.contains(entity) {
            // Presence was just checked, the removal cannot fail
            let _ = self.remove(entity);
        }
    }

    fn contains(&self, entity: Entity) -> bool {
        Self::contains(self, entity)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn component_name(&self) -> &'static str {
        C::name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Position(f32, f32);
    impl Component for Position {}

    fn e(id: u32) -> Entity {
        Entity::new(id)
    }

    /// Checks that the two maps are inverse over `[0, len)`.
    fn assert_dense<C: Component>(store: &ComponentStore<C>) {
        assert_eq!(store.values.len(), store.owners.len());
        for (index, owner) in store.owners.iter().enumerate() {
            assert_eq!(store.slots[owner.index()], Some(index));
        }
        let mapped = store.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(mapped, store.len());
    }

    #[test]
    fn test_store_creation() {
        let store: ComponentStore<Position> = ComponentStore::new(1000);
        assert_eq!(store.capacity(), 1000);
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_get() {
        let mut store = ComponentStore::new(100);
        store.insert(e(50), Position(1.0, 2.0)).unwrap();

        assert_eq!(store.get(e(50)).unwrap(), &Position(1.0, 2.0));
        assert_eq!(store.index_of(e(50)), Some(0));
        assert_dense(&store);
    }

    #[test]
    fn test_duplicate_insert_keeps_first_value() {
        let mut store = ComponentStore::new(10);
        store.insert(e(1), Position(1.0, 1.0)).unwrap();

        let err = store.insert(e(1), Position(9.0, 9.0)).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { .. }));
        assert_eq!(store.get(e(1)).unwrap(), &Position(1.0, 1.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_swap_remove_keeps_neighbors() {
        let mut store = ComponentStore::new(10);
        store.insert(e(0), Position(0.0, 0.0)).unwrap();
        store.insert(e(1), Position(1.0, 1.0)).unwrap();
        store.insert(e(2), Position(2.0, 2.0)).unwrap();

        assert_eq!(store.remove(e(1)).unwrap(), Position(1.0, 1.0));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(e(0)).unwrap(), &Position(0.0, 0.0));
        assert_eq!(store.get(e(2)).unwrap(), &Position(2.0, 2.0));
        // e2 moved into the hole left by e1
        assert_eq!(store.index_of(e(2)), Some(1));
        assert!(!store.contains(e(1)));
        assert_dense(&store);
    }

    #[test]
    fn test_remove_last_and_only() {
        let mut store = ComponentStore::new(4);
        store.insert(e(3), Position(3.0, 3.0)).unwrap();
        store.remove(e(3)).unwrap();
        assert!(store.is_empty());
        assert_dense(&store);

        store.insert(e(0), Position(0.0, 0.0)).unwrap();
        store.insert(e(1), Position(1.0, 1.0)).unwrap();
        store.remove(e(1)).unwrap();
        assert_eq!(store.entities(), &[e(0)]);
        assert_dense(&store);
    }

    #[test]
    fn test_missing_component() {
        let mut store: ComponentStore<Position> = ComponentStore::new(4);
        assert!(matches!(
            store.get(e(2)),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(matches!(
            store.remove(e(2)),
            Err(EcsError::MissingComponent { .. })
        ));
        // Out of range ids are simply absent
        assert!(!store.contains(e(99)));
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut store = ComponentStore::new(2);
        assert_eq!(
            store.insert(e(2), Position(0.0, 0.0)),
            Err(EcsError::EntityOutOfRange {
                entity: e(2),
                capacity: 2
            })
        );
    }

    #[test]
    fn test_get_mut_writes_in_place() {
        let mut store = ComponentStore::new(4);
        store.insert(e(0), Position(0.0, 0.0)).unwrap();
        store.get_mut(e(0)).unwrap().0 = 5.0;
        assert_eq!(store.as_slice()[0], Position(5.0, 0.0));
    }

    #[test]
    fn test_notify_destroyed_is_idempotent() {
        let mut store = ComponentStore::new(4);
        store.insert(e(0), Position(0.0, 0.0)).unwrap();

        ErasedStore::notify_entity_destroyed(&mut store, e(1));
        assert_eq!(store.len(), 1);

        ErasedStore::notify_entity_destroyed(&mut store, e(0));
        ErasedStore::notify_entity_destroyed(&mut store, e(0));
        assert!(store.is_empty());
        assert_dense(&store);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_churn_stays_dense() {
        let mut store = ComponentStore::new(64);
        for id in 0..64 {
            store.insert(e(id), Position(id as f32, 0.0)).unwrap();
        }
        for id in (0..64).step_by(3) {
            store.remove(e(id)).unwrap();
            assert_dense(&store);
        }
        for (entity, value) in store.iter() {
            let expected = entity.id() as f32;
            assert!((value.0 - expected).abs() < f32::EPSILON);
        }
    }
}
