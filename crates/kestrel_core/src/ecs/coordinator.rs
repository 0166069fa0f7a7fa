//! # Coordinator
//!
//! The only entry point game code uses. It owns the [`EntityManager`], the
//! [`ComponentRegistry`] and the [`SystemRegistry`] and updates all three in
//! the same call, so entity signatures, component stores and interest sets
//! never disagree between calls.
//!
//! Every fallible operation validates first and mutates second: when an
//! operation returns an error, nothing has changed.
//!
//! ## Flow
//!
//! ```text
//! add_component::<T>(e, v)
//!   ├─ store<T>.insert(e, v)
//!   ├─ signature(e) |= bit(T)
//!   └─ systems.on_entity_signature_changed(e, signature)
//! ```

use std::collections::BTreeSet;

use super::component::Component;
use super::entity::{Entity, EntityManager};
use super::registry::ComponentRegistry;
use super::signature::{ComponentType, Signature};
use super::storage::ComponentStore;
use super::system::{System, SystemRegistry};
use crate::config::EcsConfig;
use crate::error::EcsResult;

/// The ECS facade.
///
/// # Example
///
/// ```rust
/// use kestrel_core::{Component, Coordinator};
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
/// impl Component for Health {}
///
/// let mut world = Coordinator::with_capacity(100);
/// world.register_component::<Health>().unwrap();
///
/// let e = world.create_entity().unwrap();
/// world.add_component(e, Health(10)).unwrap();
/// assert!(world.has::<Health>(e).unwrap());
/// ```
pub struct Coordinator {
    entities: EntityManager,
    components: ComponentRegistry,
    systems: SystemRegistry,
    /// Reused snapshot of the interest set handed to a running system.
    scratch: Vec<Entity>,
}

impl Coordinator {
    /// Creates a coordinator from configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_entities` is zero; [`EcsConfig::validate`]
    /// rejects such configs before they get here.
    #[must_use]
    pub fn new(config: &EcsConfig) -> Self {
        Self::with_capacity(config.max_entities)
    }

    /// Creates a coordinator holding at most `max_entities` live entities.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn with_capacity(max_entities: usize) -> Self {
        Self {
            entities: EntityManager::new(max_entities),
            components: ComponentRegistry::new(max_entities),
            systems: SystemRegistry::new(),
            scratch: Vec::new(),
        }
    }

    /// Maximum number of live entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn living_count(&self) -> usize {
        self.entities.living_count()
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Iterates over alive entities in id order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// The empty signature is routed like any other, so systems that
    /// require nothing see the new entity at once.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExceeded`](crate::EcsError::CapacityExceeded)
    /// when every id is in use.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let entity = self.entities.create_entity()?;
        self.systems.on_entity_signature_changed(entity, Signature::EMPTY);
        tracing::trace!(%entity, "entity created");
        Ok(entity)
    }

    /// Destroys an entity with all its components and memberships.
    ///
    /// The id is recycled first; the store and system cleanup key off the id
    /// itself, not the signature that was just cleared.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range or not alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.entities.destroy_entity(entity)?;
        self.components.on_entity_destroyed(entity);
        self.systems.on_entity_destroyed(entity);
        tracing::trace!(%entity, "entity destroyed");
        Ok(())
    }

    /// Number of times the id has been destroyed and reissued.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range.
    #[inline]
    pub fn generation(&self, entity: Entity) -> EcsResult<u32> {
        self.entities.generation(entity)
    }

    /// The entity's current signature.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range.
    #[inline]
    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        self.entities.signature(entity)
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Registers `C`, assigning it the next signature bit.
    ///
    /// # Errors
    ///
    /// Fails on double registration or when every bit is taken.
    pub fn register_component<C: Component>(&mut self) -> EcsResult<ComponentType> {
        self.components.register::<C>()
    }

    /// The signature bit assigned to `C`.
    ///
    /// # Errors
    ///
    /// Fails if `C` is unregistered.
    #[inline]
    pub fn component_type<C: Component>(&self) -> EcsResult<ComponentType> {
        self.components.component_type::<C>()
    }

    /// Attaches a component to a live entity.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range or dead, `C` is unregistered, or
    /// the entity already has a `C` (which is then left unchanged).
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> EcsResult<()> {
        self.entities.check_alive(entity)?;
        let component_type = self.components.component_type::<C>()?;

        self.components.add(entity, component)?;

        let mut signature = self.entities.signature(entity)?;
        signature.set(component_type);
        self.entities.set_signature(entity, signature)?;
        self.systems.on_entity_signature_changed(entity, signature);
        Ok(())
    }

    /// Detaches and returns a component.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range or dead, `C` is unregistered, or
    /// the entity has no `C`.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> EcsResult<C> {
        self.entities.check_alive(entity)?;
        let component_type = self.components.component_type::<C>()?;

        let removed = self.components.remove::<C>(entity)?;

        let mut signature = self.entities.signature(entity)?;
        signature.reset(component_type);
        self.entities.set_signature(entity, signature)?;
        self.systems.on_entity_signature_changed(entity, signature);
        Ok(removed)
    }

    /// Reads the entity's `C`.
    ///
    /// The reference borrows the coordinator, so it cannot outlive the next
    /// structural change.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range, `C` is unregistered, or the
    /// entity has no `C`.
    #[inline]
    pub fn get_component<C: Component>(&self, entity: Entity) -> EcsResult<&C> {
        self.entities.check_range(entity)?;
        self.components.get::<C>(entity)
    }

    /// Gets the entity's `C` for in-place mutation.
    ///
    /// # Errors
    ///
    /// Same as [`get_component`](Self::get_component).
    #[inline]
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> EcsResult<&mut C> {
        self.entities.check_range(entity)?;
        self.components.get_mut::<C>(entity)
    }

    /// Tests the entity's signature bit for `component_type`.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range.
    #[inline]
    pub fn has_component(&self, entity: Entity, component_type: ComponentType) -> EcsResult<bool> {
        Ok(self.entities.signature(entity)?.test(component_type))
    }

    /// Tests whether the entity owns a `C`.
    ///
    /// # Errors
    ///
    /// Fails if the entity is out of range or `C` is unregistered.
    #[inline]
    pub fn has<C: Component>(&self, entity: Entity) -> EcsResult<bool> {
        let component_type = self.components.component_type::<C>()?;
        self.has_component(entity, component_type)
    }

    /// Typed access to the dense store of `C`, for packed iteration.
    ///
    /// # Errors
    ///
    /// Fails if `C` is unregistered.
    #[inline]
    pub fn store<C: Component>(&self) -> EcsResult<&ComponentStore<C>> {
        self.components.store::<C>()
    }

    /// Mutable access to the dense store of `C`.
    ///
    /// Values can be changed in place; inserting or removing goes through
    /// [`add_component`](Self::add_component) and
    /// [`remove_component`](Self::remove_component) so signatures stay in step.
    ///
    /// # Errors
    ///
    /// Fails if `C` is unregistered.
    #[inline]
    pub fn store_mut<C: Component>(&mut self) -> EcsResult<StoreValues<'_, C>> {
        Ok(StoreValues {
            store: self.components.store_mut::<C>()?,
        })
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers the single instance of `S`.
    ///
    /// The system starts with an empty signature, which every alive entity
    /// satisfies until [`set_system_signature`](Self::set_system_signature)
    /// narrows it.
    ///
    /// # Errors
    ///
    /// Fails if `S` is already registered.
    pub fn register_system<S: System>(&mut self, system: S) -> EcsResult<&mut S> {
        self.systems.register(system)?;
        self.seed_membership::<S>()?;
        self.systems.get_mut::<S>()
    }

    /// Sets the components `S` requires.
    ///
    /// Entities that are already alive are tested once against the new
    /// signature; after that, membership is kept current incrementally.
    ///
    /// # Errors
    ///
    /// Fails if `S` is unregistered.
    pub fn set_system_signature<S: System>(&mut self, signature: Signature) -> EcsResult<()> {
        self.systems.set_signature::<S>(signature)?;
        self.seed_membership::<S>()
    }

    /// Tests every alive entity against the signature of `S`.
    fn seed_membership<S: System>(&mut self) -> EcsResult<()> {
        let entities = &self.entities;
        let current = entities
            .iter_alive()
            .filter_map(|entity| entities.signature(entity).ok().map(|sig| (entity, sig)));
        self.systems.reevaluate::<S, _>(current)
    }

    /// The components `S` requires.
    ///
    /// # Errors
    ///
    /// Fails if `S` is unregistered.
    #[inline]
    pub fn system_signature<S: System>(&self) -> EcsResult<Signature> {
        self.systems.signature::<S>()
    }

    /// The live interest set of `S`.
    ///
    /// # Errors
    ///
    /// Fails if `S` is unregistered.
    #[inline]
    pub fn system_entities<S: System>(&self) -> EcsResult<&BTreeSet<Entity>> {
        self.systems.entities::<S>()
    }

    /// Shared access to the instance of `S`.
    ///
    /// # Errors
    ///
    /// Fails if `S` is unregistered or currently running.
    #[inline]
    pub fn system<S: System>(&self) -> EcsResult<&S> {
        self.systems.get::<S>()
    }

    /// Exclusive access to the instance of `S`.
    ///
    /// # Errors
    ///
    /// Fails if `S` is unregistered or currently running.
    #[inline]
    pub fn system_mut<S: System>(&mut self) -> EcsResult<&mut S> {
        self.systems.get_mut::<S>()
    }

    /// Runs `S` once over a snapshot of its interest set.
    ///
    /// The instance is taken out of the registry while it runs, so it gets
    /// full mutable access to the coordinator. It is put back even when the
    /// update fails.
    ///
    /// # Errors
    ///
    /// Fails if `S` is unregistered or already running, or with whatever
    /// error the update returns.
    pub fn run_system<S: System>(&mut self, delta_time: f32) -> EcsResult<()> {
        let mut snapshot = std::mem::take(&mut self.scratch);
        snapshot.clear();
        snapshot.extend(self.systems.entities::<S>()?.iter().copied());

        let mut checked_out = self.systems.check_out::<S>()?;
        let result = checked_out.instance.update(self, &snapshot, delta_time);
        self.systems.check_in(checked_out);

        self.scratch = snapshot;
        result
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(&EcsConfig::default())
    }
}

/// Mutable view of a store that can change values but not membership.
pub struct StoreValues<'a, C: Component> {
    store: &'a mut ComponentStore<C>,
}

impl<C: Component> StoreValues<'_, C> {
    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the store is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Packed mutable values.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        self.store.as_mut_slice()
    }

    /// Iterates mutably over `(entity, value)` pairs in slot order.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut C)> {
        self.store.iter_mut()
    }

    /// Gets the entity's value for in-place mutation.
    ///
    /// # Errors
    ///
    /// Fails if the entity has no value.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> EcsResult<&mut C> {
        self.store.get_mut(entity)
    }
}
