//! # Component Registry
//!
//! Owns one [`ComponentStore`] per registered component type and maps each
//! type to the signature bit it was assigned.
//!
//! Type identity is the compile-time [`TypeId`]; the registry never compares
//! type names. Stores sit in one `Vec` indexed by [`ComponentType`], so the
//! bit index and the store position are the same number.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::Component;
use super::entity::Entity;
use super::signature::{ComponentType, MAX_COMPONENTS};
use super::storage::{ComponentStore, ErasedStore};
use crate::error::{EcsError, EcsResult};

/// Type-erased collection of component stores.
pub struct ComponentRegistry {
    /// Component type to assigned bit.
    types: HashMap<TypeId, ComponentType>,
    /// Stores, indexed by [`ComponentType::index`].
    stores: Vec<Box<dyn ErasedStore>>,
    /// Entity capacity given to every new store.
    capacity: usize,
}

impl ComponentRegistry {
    /// Creates an empty registry whose stores hold up to `capacity` entities.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            types: HashMap::with_capacity(MAX_COMPONENTS),
            stores: Vec::with_capacity(MAX_COMPONENTS),
            capacity,
        }
    }

    /// Number of registered component types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Returns `true` if no type is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Assigns the next free bit to `C` and creates its store.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentAlreadyRegistered`] on a second call for
    /// the same type, or [`EcsError::TooManyComponentTypes`] once every bit
    /// is taken.
    pub fn register<C: Component>(&mut self) -> EcsResult<ComponentType> {
        let type_id = TypeId::of::<C>();
        if self.types.contains_key(&type_id) {
            return Err(EcsError::ComponentAlreadyRegistered(C::name()));
        }

        let index = u8::try_from(self.stores.len())
            .ok()
            .filter(|&i| usize::from(i) < MAX_COMPONENTS)
            .ok_or(EcsError::TooManyComponentTypes {
                max: MAX_COMPONENTS,
            })?;

        let component_type = ComponentType::new(index);
        self.types.insert(type_id, component_type);
        self.stores
            .push(Box::new(ComponentStore::<C>::new(self.capacity)));

        tracing::debug!(
            component = C::name(),
            bit = component_type.index(),
            "registered component type"
        );

        Ok(component_type)
    }

    /// Returns the bit assigned to `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` was never registered.
    #[inline]
    pub fn component_type<C: Component>(&self) -> EcsResult<ComponentType> {
        self.types
            .get(&TypeId::of::<C>())
            .copied()
            .ok_or(EcsError::ComponentNotRegistered(C::name()))
    }

    /// Returns `true` if `C` has been registered.
    #[inline]
    #[must_use]
    pub fn is_registered<C: Component>(&self) -> bool {
        self.types.contains_key(&TypeId::of::<C>())
    }

    /// Typed access to the store of `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` was never registered.
    pub fn store<C: Component>(&self) -> EcsResult<&ComponentStore<C>> {
        let component_type = self.component_type::<C>()?;
        self.stores[component_type.index()]
            .as_any()
            .downcast_ref::<ComponentStore<C>>()
            .ok_or(EcsError::ComponentNotRegistered(C::name()))
    }

    /// Typed mutable access to the store of `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` was never registered.
    pub fn store_mut<C: Component>(&mut self) -> EcsResult<&mut ComponentStore<C>> {
        let component_type = self.component_type::<C>()?;
        self.stores[component_type.index()]
            .as_any_mut()
            .downcast_mut::<ComponentStore<C>>()
            .ok_or(EcsError::ComponentNotRegistered(C::name()))
    }

    /// Inserts a value into the store of `C`.
    ///
    /// # Errors
    ///
    /// Fails if `C` is unregistered or the entity already has a `C`.
    #[inline]
    pub fn add<C: Component>(&mut self, entity: Entity, component: C) -> EcsResult<()> {
        self.store_mut::<C>()?.insert(entity, component)
    }

    /// Removes and returns the entity's `C`.
    ///
    /// # Errors
    ///
    /// Fails if `C` is unregistered or the entity has no `C`.
    #[inline]
    pub fn remove<C: Component>(&mut self, entity: Entity) -> EcsResult<C> {
        self.store_mut::<C>()?.remove(entity)
    }

    /// Gets the entity's `C`.
    ///
    /// # Errors
    ///
    /// Fails if `C` is unregistered or the entity has no `C`.
    #[inline]
    pub fn get<C: Component>(&self, entity: Entity) -> EcsResult<&C> {
        self.store::<C>()?.get(entity)
    }

    /// Gets the entity's `C` for in-place mutation.
    ///
    /// # Errors
    ///
    /// Fails if `C` is unregistered or the entity has no `C`.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> EcsResult<&mut C> {
        self.store_mut::<C>()?.get_mut(entity)
    }

    /// Tells every store that the entity is gone.
    ///
    /// The registry does not know which types the entity held, so every
    /// store is asked; stores without a value ignore the call.
    pub fn on_entity_destroyed(&mut self, entity: Entity) {
        for store in &mut self.stores {
            if store.contains(entity) {
                tracing::trace!(%entity, component = store.component_name(), "component dropped");
            }
            store.notify_entity_destroyed(entity);
        }
    }

    /// Iterates over `(bit, store)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentType, &dyn ErasedStore)> {
        self.stores.iter().enumerate().map(|(idx, store)| {
            #[allow(clippy::cast_possible_truncation)]
            let component_type = ComponentType::new(idx as u8);
            (component_type, store.as_ref())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Velocity(i32);
    impl Component for Velocity {}

    #[test]
    fn test_register_assigns_sequential_bits() {
        let mut registry = ComponentRegistry::new(8);
        assert_eq!(registry.register::<Position>().unwrap(), ComponentType::new(0));
        assert_eq!(registry.register::<Velocity>().unwrap(), ComponentType::new(1));
        assert_eq!(registry.component_type::<Velocity>().unwrap(), ComponentType::new(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_double_registration() {
        let mut registry = ComponentRegistry::new(8);
        registry.register::<Position>().unwrap();
        assert_eq!(
            registry.register::<Position>(),
            Err(EcsError::ComponentAlreadyRegistered("Position"))
        );
        assert_eq!(registry.len(), 1);
    }

    struct Tag<const N: usize>;
    impl<const N: usize> Component for Tag<N> {}

    macro_rules! register_tags {
        ($registry:expr; $($n:literal)*) => {
            $( $registry.register::<Tag<$n>>().unwrap(); )*
        };
    }

    #[test]
    fn test_signature_width_limit() {
        let mut registry = ComponentRegistry::new(1);
        register_tags!(registry;
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15
            16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31);
        assert_eq!(registry.len(), MAX_COMPONENTS);

        assert_eq!(
            registry.register::<Position>(),
            Err(EcsError::TooManyComponentTypes {
                max: MAX_COMPONENTS
            })
        );
        assert!(!registry.is_registered::<Position>());
    }

    #[test]
    fn test_unregistered_use() {
        let mut registry = ComponentRegistry::new(8);
        assert_eq!(
            registry.add(Entity::new(0), Position(1)),
            Err(EcsError::ComponentNotRegistered("Position"))
        );
        assert!(registry.get::<Position>(Entity::new(0)).is_err());
    }

    #[test]
    fn test_dispatch_to_typed_store() {
        let mut registry = ComponentRegistry::new(8);
        registry.register::<Position>().unwrap();
        registry.register::<Velocity>().unwrap();

        let e = Entity::new(3);
        registry.add(e, Position(7)).unwrap();
        registry.add(e, Velocity(-1)).unwrap();

        registry.get_mut::<Position>(e).unwrap().0 += 1;
        assert_eq!(registry.get::<Position>(e).unwrap(), &Position(8));
        assert_eq!(registry.remove::<Velocity>(e).unwrap(), Velocity(-1));
        assert!(registry.get::<Velocity>(e).is_err());
    }

    #[test]
    fn test_on_entity_destroyed_reaches_every_store() {
        let mut registry = ComponentRegistry::new(8);
        registry.register::<Position>().unwrap();
        registry.register::<Velocity>().unwrap();

        let a = Entity::new(0);
        let b = Entity::new(1);
        registry.add(a, Position(1)).unwrap();
        registry.add(a, Velocity(1)).unwrap();
        registry.add(b, Position(2)).unwrap();

        registry.on_entity_destroyed(a);

        assert!(registry.iter().all(|(_, store)| !store.contains(a)));
        let names: Vec<_> = registry.iter().map(|(_, store)| store.component_name()).collect();
        assert_eq!(names, ["Position", "Velocity"]);
        assert_eq!(registry.get::<Position>(b).unwrap(), &Position(2));
    }
}
