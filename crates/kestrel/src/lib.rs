//! # KESTREL
//!
//! Simulation crate on top of the `kestrel_core` ECS kernel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            GameLoop                             │
//! │                                                                 │
//! │  producer threads ──CommandSender──┐                            │
//! │                                    v                            │
//! │  ┌───────────────────── SharedCoordinator ───────────────────┐  │
//! │  │  drain ──> PhysicsSystem ──> RenderSystem ──> InstanceData │  │
//! │  │           {Transform,        {Transform,                   │  │
//! │  │            RigidBody}         Mesh}                        │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `components`: Transform, Mesh, RigidBody, Gravity
//! - `systems`: physics integration and instance collection
//! - `game_loop`: Frame orchestration, timing and configuration

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod components;
pub mod game_loop;
pub mod systems;

// Re-export the kernel
pub use kestrel_core as core;

// Re-export commonly used types
pub use components::{Gravity, Mesh, RigidBody, Transform};
pub use game_loop::{FrameStats, FrameStatsAccumulator, GameConfig, GameLoop, PhaseTiming};
pub use systems::{InstanceData, PhysicsSystem, RenderSystem};
