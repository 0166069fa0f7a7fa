//! # Entity Component System
//!
//! A signature-routed ECS with one packed store per component type.
//!
//! ## Design Philosophy
//!
//! - Entity ids are plain indices, recycled in FIFO order
//! - Components live in dense arrays, removal swaps the last value in
//! - Each component type owns one signature bit
//! - Systems see only entities whose signature covers theirs
//! - Dynamic dispatch only on entity destruction (one call per store)

mod component;
mod coordinator;
mod entity;
mod registry;
mod signature;
mod storage;
mod system;

pub use component::{short_type_name, Component};
pub use coordinator::{Coordinator, StoreValues};
pub use entity::{Entity, EntityManager};
pub use registry::ComponentRegistry;
pub use signature::{ComponentType, Signature, MAX_COMPONENTS};
pub use storage::{ComponentStore, ErasedStore};
pub use system::{System, SystemRegistry};
