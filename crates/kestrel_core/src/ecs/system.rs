//! # Systems
//!
//! A system is logic that runs over every entity owning a given set of
//! components. The [`SystemRegistry`] keeps, per system, the required
//! [`Signature`] and the live interest set of matching entities.
//!
//! Interest sets are maintained incrementally: every time an entity's
//! signature changes, every system re-tests that one entity. Nothing ever
//! rescans the whole entity table on a mutation.
//!
//! The registry does not schedule anything. Callers decide when and in which
//! order each system runs (see [`Coordinator::run_system`]).

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeSet, HashMap};

use super::component::short_type_name;
use super::coordinator::Coordinator;
use super::entity::Entity;
use super::signature::Signature;
use crate::error::{EcsError, EcsResult};

/// Logic run over the entities matching a signature.
///
/// # Example
///
/// ```rust
/// use kestrel_core::{Coordinator, EcsResult, Entity, System};
///
/// #[derive(Default)]
/// struct Counter {
///     seen: usize,
/// }
///
/// impl System for Counter {
///     fn update(&mut self, _world: &mut Coordinator, entities: &[Entity], _dt: f32) -> EcsResult<()> {
///         self.seen += entities.len();
///         Ok(())
///     }
/// }
/// ```
pub trait System: Send + Sync + 'static {
    /// Runs one step over `entities`, the system's interest set at the time
    /// the run started.
    ///
    /// The system may mutate the world; membership changes it causes show
    /// up in the next run, not in `entities`.
    ///
    /// # Errors
    ///
    /// Implementations propagate component access errors.
    fn update(
        &mut self,
        world: &mut Coordinator,
        entities: &[Entity],
        delta_time: f32,
    ) -> EcsResult<()>;
}

/// Object-safe system with downcasting.
pub(crate) trait AnySystem: System {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> AnySystem for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A checked-out system instance, returned with [`SystemRegistry::check_in`].
pub(crate) struct CheckedOut {
    slot: usize,
    pub(crate) instance: Box<dyn AnySystem>,
}

struct SystemEntry {
    name: &'static str,
    signature: Signature,
    entities: BTreeSet<Entity>,
    /// `None` while the system is running.
    instance: Option<Box<dyn AnySystem>>,
}

/// Holds one instance of each system type and its interest set.
#[derive(Default)]
pub struct SystemRegistry {
    /// System type to entry position.
    index: HashMap<TypeId, usize>,
    entries: Vec<SystemEntry>,
}

impl SystemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no system is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores the single instance of `S` and returns it.
    ///
    /// The new system starts with an empty signature and an empty interest set.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemAlreadyRegistered`] on a second call for `S`.
    pub fn register<S: System>(&mut self, system: S) -> EcsResult<&mut S> {
        let name = system_name::<S>();
        if self.index.contains_key(&TypeId::of::<S>()) {
            return Err(EcsError::SystemAlreadyRegistered(name));
        }

        let slot = self.entries.len();
        self.index.insert(TypeId::of::<S>(), slot);
        self.entries.push(SystemEntry {
            name,
            signature: Signature::EMPTY,
            entities: BTreeSet::new(),
            instance: Some(Box::new(system)),
        });

        tracing::debug!(system = name, "registered system");
        self.get_mut::<S>()
    }

    /// Sets the components `S` requires and empties its interest set.
    ///
    /// Membership for entities that already exist is restored with
    /// [`reevaluate`](Self::reevaluate).
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn set_signature<S: System>(&mut self, signature: Signature) -> EcsResult<()> {
        let entry = self.entry_mut::<S>()?;
        entry.signature = signature;
        entry.entities.clear();
        tracing::debug!(system = entry.name, ?signature, "system signature set");
        Ok(())
    }

    /// Re-tests the given entities against the signature of `S` only.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn reevaluate<S, I>(&mut self, entities: I) -> EcsResult<()>
    where
        S: System,
        I: IntoIterator<Item = (Entity, Signature)>,
    {
        let entry = self.entry_mut::<S>()?;
        for (entity, signature) in entities {
            entry.update_membership(entity, signature);
        }
        Ok(())
    }

    /// The components `S` requires.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn signature<S: System>(&self) -> EcsResult<Signature> {
        Ok(self.entry::<S>()?.signature)
    }

    /// The live interest set of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn entities<S: System>(&self) -> EcsResult<&BTreeSet<Entity>> {
        Ok(&self.entry::<S>()?.entities)
    }

    /// Shared access to the instance of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown, or
    /// [`EcsError::SystemBusy`] while it is running.
    pub fn get<S: System>(&self) -> EcsResult<&S> {
        let entry = self.entry::<S>()?;
        entry
            .instance
            .as_ref()
            .and_then(|instance| instance.as_any().downcast_ref::<S>())
            .ok_or(EcsError::SystemBusy(entry.name))
    }

    /// Exclusive access to the instance of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown, or
    /// [`EcsError::SystemBusy`] while it is running.
    pub fn get_mut<S: System>(&mut self) -> EcsResult<&mut S> {
        let entry = self.entry_mut::<S>()?;
        let name = entry.name;
        entry
            .instance
            .as_mut()
            .and_then(|instance| instance.as_any_mut().downcast_mut::<S>())
            .ok_or(EcsError::SystemBusy(name))
    }

    /// Re-tests one entity against every system.
    ///
    /// Every system is checked, not just the ones whose components changed:
    /// a single signature change can flip membership in several systems.
    pub fn on_entity_signature_changed(&mut self, entity: Entity, signature: Signature) {
        for entry in &mut self.entries {
            entry.update_membership(entity, signature);
        }
    }

    /// Removes the entity from every interest set.
    pub fn on_entity_destroyed(&mut self, entity: Entity) {
        for entry in &mut self.entries {
            entry.entities.remove(&entity);
        }
    }

    /// Takes the instance of `S` out so it can run against the coordinator.
    pub(crate) fn check_out<S: System>(&mut self) -> EcsResult<CheckedOut> {
        let slot = self.slot::<S>()?;
        let entry = &mut self.entries[slot];
        let instance = entry.instance.take().ok_or(EcsError::SystemBusy(entry.name))?;
        Ok(CheckedOut { slot, instance })
    }

    /// Puts a checked-out instance back.
    pub(crate) fn check_in(&mut self, checked_out: CheckedOut) {
        self.entries[checked_out.slot].instance = Some(checked_out.instance);
    }

    fn slot<S: System>(&self) -> EcsResult<usize> {
        self.index
            .get(&TypeId::of::<S>())
            .copied()
            .ok_or_else(|| EcsError::SystemNotRegistered(system_name::<S>()))
    }

    fn entry<S: System>(&self) -> EcsResult<&SystemEntry> {
        let slot = self.slot::<S>()?;
        Ok(&self.entries[slot])
    }

    fn entry_mut<S: System>(&mut self) -> EcsResult<&mut SystemEntry> {
        let slot = self.slot::<S>()?;
        Ok(&mut self.entries[slot])
    }
}

impl SystemEntry {
    fn update_membership(&mut self, entity: Entity, signature: Signature) {
        if signature.contains(self.signature) {
            self.entities.insert(entity);
        } else {
            self.entities.remove(&entity);
        }
    }
}

fn system_name<S: System>() -> &'static str {
    short_type_name(type_name::<S>())
}
