//! # ECS Error Types
//!
//! Every precondition the kernel relies on is surfaced as an [`EcsError`].
//! Fallible operations validate before they mutate, so an error never leaves
//! the entity table, the component stores and the interest sets out of step.

use thiserror::Error;

use crate::ecs::Entity;

/// Errors that can occur in the ECS kernel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Every entity id is already in use.
    #[error("entity capacity exceeded: {capacity} entities already alive")]
    CapacityExceeded {
        /// The fixed entity capacity.
        capacity: usize,
    },

    /// The entity id lies outside the id range of this coordinator.
    #[error("entity {entity} out of range (capacity {capacity})")]
    EntityOutOfRange {
        /// The offending entity.
        entity: Entity,
        /// The fixed entity capacity.
        capacity: usize,
    },

    /// The entity id is in range but not currently alive.
    #[error("entity {0} is not alive")]
    EntityNotAlive(Entity),

    /// A component of this type was added to the same entity twice.
    #[error("component {component} added to entity {entity} more than once")]
    DuplicateComponent {
        /// The target entity.
        entity: Entity,
        /// Type name of the component.
        component: &'static str,
    },

    /// The entity holds no component of this type.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The target entity.
        entity: Entity,
        /// Type name of the component.
        component: &'static str,
    },

    /// The component type was registered twice.
    #[error("component type {0} registered more than once")]
    ComponentAlreadyRegistered(&'static str),

    /// The component type was used before registration.
    #[error("component type {0} used before registration")]
    ComponentNotRegistered(&'static str),

    /// Every signature bit is already assigned.
    #[error("too many component types: at most {max} fit in a signature")]
    TooManyComponentTypes {
        /// Signature width.
        max: usize,
    },

    /// The system type was registered twice.
    #[error("system {0} registered more than once")]
    SystemAlreadyRegistered(&'static str),

    /// The system type was used before registration.
    #[error("system {0} used before registration")]
    SystemNotRegistered(&'static str),

    /// The system is currently running and its instance is checked out.
    #[error("system {0} is already running")]
    SystemBusy(&'static str),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
