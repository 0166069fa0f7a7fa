//! Systems driven once per frame by the [`GameLoop`](crate::GameLoop).

pub mod physics;
pub mod render;

pub use physics::{PhysicsSystem, EARTH_GRAVITY};
pub use render::{InstanceData, RenderSystem};
