//! # KESTREL Core Engine
//!
//! Signature-routed Entity Component System (ECS) kernel:
//! - Fixed entity capacity, ids recycled in FIFO order
//! - One dense, gap-free array per component type
//! - Systems see exactly the entities whose signature covers theirs
//!
//! ## Architecture Rules
//!
//! 1. **Pre-allocated storage** - Stores and tables are sized at creation
//! 2. **Data-oriented design** - Components are stored in contiguous arrays
//! 3. **One consistency boundary** - All mutation goes through [`Coordinator`]
//! 4. **Fail fast** - Broken preconditions return [`EcsError`] before any state changes
//!
//! ## Example
//!
//! ```rust
//! use kestrel_core::{Component, Coordinator, EcsResult, Entity, Signature, System};
//!
//! #[derive(Clone, Copy, Debug, Default)]
//! struct Position { x: f32 }
//! impl Component for Position {}
//!
//! #[derive(Clone, Copy, Debug, Default)]
//! struct Velocity { x: f32 }
//! impl Component for Velocity {}
//!
//! struct Movement;
//!
//! impl System for Movement {
//!     fn update(&mut self, world: &mut Coordinator, entities: &[Entity], dt: f32) -> EcsResult<()> {
//!         for &e in entities {
//!             let v = world.get_component::<Velocity>(e)?.x;
//!             world.get_component_mut::<Position>(e)?.x += v * dt;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> EcsResult<()> {
//! let mut world = Coordinator::default();
//! let position = world.register_component::<Position>()?;
//! let velocity = world.register_component::<Velocity>()?;
//!
//! world.register_system(Movement)?;
//! world.set_system_signature::<Movement>([position, velocity].into_iter().collect::<Signature>())?;
//!
//! let e = world.create_entity()?;
//! world.add_component(e, Position { x: 0.0 })?;
//! world.add_component(e, Velocity { x: 2.0 })?;
//!
//! world.run_system::<Movement>(0.5)?;
//! assert_eq!(world.get_component::<Position>(e)?.x, 1.0);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod sync;

pub use config::EcsConfig;
pub use ecs::{
    Component, ComponentRegistry, ComponentStore, ComponentType, Coordinator, Entity,
    EntityManager, ErasedStore, Signature, StoreValues, System, SystemRegistry, MAX_COMPONENTS,
};
pub use error::{EcsError, EcsResult};
pub use sync::{Command, CommandBuffer, CommandQueue, CommandSender, SharedCoordinator};
