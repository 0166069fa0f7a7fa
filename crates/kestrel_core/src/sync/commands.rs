//! # Deferred Commands
//!
//! Structural mutations recorded now and applied later, at a point where no
//! component references are alive.
//!
//! Commands are applied strictly in recording order. When a spawn's
//! initialization fails, the spawned entity is destroyed again before the
//! error is returned; anything else the closure changed stays changed. A
//! failing command stops application; the commands before it stay applied,
//! the ones after it stay pending.

use std::collections::VecDeque;
use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::ecs::{Component, Coordinator, Entity};
use crate::error::EcsResult;

/// Deferred operation on one entity. Captures the typed payload.
pub type EntityOp = Box<dyn FnOnce(&mut Coordinator, Entity) -> EcsResult<()> + Send>;

/// A deferred structural mutation.
pub enum Command {
    /// Creates an entity, then runs `init` on it.
    Spawn {
        /// Initialization run on the new entity.
        init: Option<EntityOp>,
    },

    /// Destroys an entity.
    Despawn {
        /// Entity to destroy.
        entity: Entity,
    },

    /// Adds a component to an entity.
    Insert {
        /// Target entity.
        entity: Entity,
        /// Typed insertion.
        apply: EntityOp,
    },

    /// Removes a component from an entity. The removed value is dropped.
    Remove {
        /// Target entity.
        entity: Entity,
        /// Typed removal.
        apply: EntityOp,
    },
}

impl Command {
    /// Spawns an entity initialized by `init`.
    ///
    /// If `init` fails, the spawned entity is destroyed again. Changes
    /// `init` made to other entities are kept.
    #[must_use]
    pub fn spawn<F>(init: F) -> Self
    where
        F: FnOnce(&mut Coordinator, Entity) -> EcsResult<()> + Send + 'static,
    {
        Self::Spawn {
            init: Some(Box::new(init)),
        }
    }

    /// Adds `component` to `entity`.
    #[must_use]
    pub fn insert<C: Component>(entity: Entity, component: C) -> Self {
        Self::Insert {
            entity,
            apply: Box::new(move |world: &mut Coordinator, entity: Entity| {
                world.add_component(entity, component)
            }),
        }
    }

    /// Removes the `C` of `entity`.
    #[must_use]
    pub fn remove<C: Component>(entity: Entity) -> Self {
        Self::Remove {
            entity,
            apply: Box::new(|world: &mut Coordinator, entity: Entity| {
                world.remove_component::<C>(entity).map(drop)
            }),
        }
    }

    /// Applies this command.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying coordinator operation.
    pub fn apply(self, world: &mut Coordinator) -> EcsResult<()> {
        match self {
            Self::Spawn { init } => {
                let entity = world.create_entity()?;
                let generation = world.generation(entity)?;
                if let Some(init) = init {
                    if let Err(err) = init(world, entity) {
                        // The closure may have destroyed it, or even reused the id
                        if world.is_alive(entity) && world.generation(entity) == Ok(generation) {
                            if let Err(rollback) = world.destroy_entity(entity) {
                                tracing::warn!(%entity, %rollback, "spawn rollback failed");
                            }
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
            Self::Despawn { entity } => world.destroy_entity(entity),
            Self::Insert { entity, apply } | Self::Remove { entity, apply } => apply(world, entity),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { init } => f
                .debug_struct("Spawn")
                .field("init", &init.is_some())
                .finish(),
            Self::Despawn { entity } => f.debug_struct("Despawn").field("entity", entity).finish(),
            Self::Insert { entity, .. } => f.debug_struct("Insert").field("entity", entity).finish(),
            Self::Remove { entity, .. } => f.debug_struct("Remove").field("entity", entity).finish(),
        }
    }
}

/// Ordered list of commands recorded by one owner.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: VecDeque<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Records a command.
    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Records a spawn.
    pub fn spawn<F>(&mut self, init: F)
    where
        F: FnOnce(&mut Coordinator, Entity) -> EcsResult<()> + Send + 'static,
    {
        self.push(Command::spawn(init));
    }

    /// Records a despawn.
    pub fn despawn(&mut self, entity: Entity) {
        self.push(Command::Despawn { entity });
    }

    /// Records a component insertion.
    pub fn insert<C: Component>(&mut self, entity: Entity, component: C) {
        self.push(Command::insert(entity, component));
    }

    /// Records a component removal.
    pub fn remove<C: Component>(&mut self, entity: Entity) {
        self.push(Command::remove::<C>(entity));
    }

    /// Applies pending commands in order and returns how many succeeded.
    ///
    /// # Errors
    ///
    /// Stops at the first failing command and returns its error. That
    /// command is dropped; later commands stay in the buffer.
    pub fn apply(&mut self, world: &mut Coordinator) -> EcsResult<usize> {
        let mut applied = 0;
        while let Some(command) = self.commands.pop_front() {
            if let Err(err) = command.apply(world) {
                tracing::warn!(applied, pending = self.commands.len(), %err, "deferred command failed");
                return Err(err);
            }
            applied += 1;
        }
        Ok(applied)
    }
}

/// Multi-producer command channel, drained by the world owner once per tick.
#[derive(Debug)]
pub struct CommandQueue {
    sender: Sender<Command>,
    receiver: Receiver<Command>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    /// Creates an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// A handle other threads can record commands through.
    #[must_use]
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Number of queued commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Applies every queued command in arrival order.
    ///
    /// Commands sent while draining are applied too.
    ///
    /// # Errors
    ///
    /// Stops at the first failing command and returns its error; the rest
    /// stay queued for the next drain.
    pub fn drain_into(&self, world: &mut Coordinator) -> EcsResult<usize> {
        let mut applied = 0;
        while let Ok(command) = self.receiver.try_recv() {
            if let Err(err) = command.apply(world) {
                tracing::warn!(applied, pending = self.receiver.len(), %err, "queued command failed");
                return Err(err);
            }
            applied += 1;
        }
        Ok(applied)
    }
}

/// Cloneable sending half of a [`CommandQueue`].
#[derive(Clone, Debug)]
pub struct CommandSender {
    sender: Sender<Command>,
}

impl CommandSender {
    /// Queues a command.
    ///
    /// Returns `false` if the queue no longer exists.
    pub fn send(&self, command: Command) -> bool {
        self.sender.send(command).is_ok()
    }

    /// Queues a spawn.
    pub fn spawn<F>(&self, init: F) -> bool
    where
        F: FnOnce(&mut Coordinator, Entity) -> EcsResult<()> + Send + 'static,
    {
        self.send(Command::spawn(init))
    }

    /// Queues a despawn.
    pub fn despawn(&self, entity: Entity) -> bool {
        self.send(Command::Despawn { entity })
    }

    /// Queues a component insertion.
    pub fn insert<C: Component>(&self, entity: Entity, component: C) -> bool {
        self.send(Command::insert(entity, component))
    }

    /// Queues a component removal.
    pub fn remove<C: Component>(&self, entity: Entity) -> bool {
        self.send(Command::remove::<C>(entity))
    }
}

impl Coordinator {
    /// Applies one deferred command.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation.
    #[inline]
    pub fn apply(&mut self, command: Command) -> EcsResult<()> {
        command.apply(self)
    }

    /// Applies a buffer in order. See [`CommandBuffer::apply`].
    ///
    /// # Errors
    ///
    /// Returns the first failing command's error.
    #[inline]
    pub fn apply_commands(&mut self, buffer: &mut CommandBuffer) -> EcsResult<usize> {
        buffer.apply(self)
    }
}
