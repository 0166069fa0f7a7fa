//! # Shared Coordinator
//!
//! A [`Coordinator`] behind a single-writer lock, plus a command queue that
//! any thread can feed.
//!
//! ```text
//!   worker threads ──send──> CommandQueue ──drain (write lock)──> Coordinator
//!   readers ────────────────────────────────read lock───────────> Coordinator
//! ```
//!
//! Structural changes from other threads are queued and applied together,
//! once per tick, under one write lock. Between drains any number of readers
//! may iterate stores and interest sets concurrently.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::commands::{CommandQueue, CommandSender};
use crate::ecs::Coordinator;
use crate::error::EcsResult;

/// Cloneable handle to a lock-protected coordinator and its command queue.
///
/// # Example
///
/// ```rust
/// use kestrel_core::{Component, Coordinator, SharedCoordinator};
///
/// struct Marker;
/// impl Component for Marker {}
///
/// let mut world = Coordinator::with_capacity(16);
/// world.register_component::<Marker>().unwrap();
/// let shared = SharedCoordinator::new(world);
///
/// let sender = shared.sender();
/// std::thread::spawn(move || {
///     sender.spawn(|world, entity| world.add_component(entity, Marker));
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(shared.drain().unwrap(), 1);
/// assert_eq!(shared.read().living_count(), 1);
/// ```
#[derive(Clone)]
pub struct SharedCoordinator {
    world: Arc<RwLock<Coordinator>>,
    queue: Arc<CommandQueue>,
}

impl SharedCoordinator {
    /// Wraps a coordinator.
    #[must_use]
    pub fn new(world: Coordinator) -> Self {
        Self {
            world: Arc::new(RwLock::new(world)),
            queue: Arc::new(CommandQueue::new()),
        }
    }

    /// Shared read access. Many readers may hold this at once.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Coordinator> {
        self.world.read()
    }

    /// Exclusive write access.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Coordinator> {
        self.world.write()
    }

    /// A handle for queueing commands from any thread.
    #[must_use]
    pub fn sender(&self) -> CommandSender {
        self.queue.sender()
    }

    /// Number of commands waiting for the next drain.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Applies every queued command under one write lock.
    ///
    /// # Errors
    ///
    /// Stops at the first failing command; see [`CommandQueue::drain_into`].
    pub fn drain(&self) -> EcsResult<usize> {
        let mut world = self.world.write();
        self.queue.drain_into(&mut world)
    }

    /// Applies every queued command to a coordinator whose write guard the
    /// caller already holds, so a whole frame can run under one lock.
    ///
    /// # Errors
    ///
    /// Stops at the first failing command; see [`CommandQueue::drain_into`].
    pub fn drain_locked(&self, world: &mut Coordinator) -> EcsResult<usize> {
        self.queue.drain_into(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, Entity};

    #[derive(Debug, PartialEq)]
    struct Score(u32);
    impl Component for Score {}

    fn shared() -> SharedCoordinator {
        let mut world = Coordinator::with_capacity(64);
        world.register_component::<Score>().unwrap();
        SharedCoordinator::new(world)
    }

    #[test]
    fn test_many_producers_one_drain() {
        let shared = shared();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sender = shared.sender();
                std::thread::spawn(move || {
                    for i in 0..8 {
                        sender.spawn(move |world, entity| {
                            world.add_component(entity, Score(t * 100 + i))
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.pending(), 32);
        assert_eq!(shared.drain().unwrap(), 32);
        assert_eq!(shared.pending(), 0);

        let world = shared.read();
        assert_eq!(world.living_count(), 32);
        assert_eq!(world.store::<Score>().unwrap().len(), 32);
    }

    #[test]
    fn test_concurrent_readers() {
        let shared = shared();
        {
            let mut world = shared.write();
            for i in 0..10 {
                let e = world.create_entity().unwrap();
                world.add_component(e, Score(i)).unwrap();
            }
        }

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let world = shared.read();
                    world
                        .store::<Score>()
                        .unwrap()
                        .as_slice()
                        .iter()
                        .map(|s| s.0)
                        .sum::<u32>()
                })
            })
            .collect();

        for reader in readers {
            assert_eq!(reader.join().unwrap(), 45);
        }
    }

    #[test]
    fn test_failed_drain_keeps_remainder() {
        let shared = shared();
        let sender = shared.sender();

        sender.despawn(Entity::new(0));
        sender.spawn(|_, _| Ok(()));

        assert!(shared.drain().is_err());
        assert_eq!(shared.pending(), 1);
        assert_eq!(shared.drain().unwrap(), 1);
        assert_eq!(shared.read().living_count(), 1);
    }

    #[test]
    fn test_drain_under_held_guard() {
        let shared = shared();
        shared.sender().spawn(|world, entity| world.add_component(entity, Score(7)));

        let mut world = shared.write();
        assert_eq!(shared.drain_locked(&mut world).unwrap(), 1);
        assert_eq!(world.living_count(), 1);
    }
}
