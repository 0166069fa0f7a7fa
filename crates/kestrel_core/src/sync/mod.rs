//! # Synchronization for a Single-Writer ECS
//!
//! The coordinator itself is single-threaded. This module provides the
//! boundary for everything else:
//!
//! ## The Problem
//!
//! ```text
//! System A:  iterates Transform store   (holds &Transform)
//! System B:  removes a Transform        (swap-remove moves another value)
//!
//! Without a boundary: the reference in A points at the wrong entity
//! ```
//!
//! ## The Solution: Deferred Commands
//!
//! ```text
//! During the tick:   systems and threads RECORD commands
//! End of the tick:   one writer APPLIES them in order
//! Between ticks:     any number of readers ITERATE
//! ```

mod commands;
mod shared;

pub use commands::{Command, CommandBuffer, CommandQueue, CommandSender, EntityOp};
pub use shared::SharedCoordinator;
