//! # KESTREL Demo
//!
//! Headless run of the frame driver:
//! - a producer thread queues a ring of spinning, falling bodies
//! - the loop drains, integrates and collects instances each frame
//! - bodies that fall below the floor are despawned through the queue
//!
//! Usage: `kestrel_demo [config.toml]`. Log level follows `RUST_LOG`.

use std::f32::consts::TAU;

use kestrel::core::EcsResult;
use kestrel::{GameConfig, GameLoop, Gravity, Mesh, RigidBody, Transform};
use tracing_subscriber::EnvFilter;

/// Bodies spawned by the producer thread.
const BODY_COUNT: u32 = 512;

/// Frames to simulate.
const FRAMES: u64 = 600;

/// Bodies below this height are removed.
const FLOOR_Y: f32 = -20.0;

fn main() -> EcsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let dt = 1.0 / config.target_fps as f32;
    let mut game = GameLoop::new(config)?;

    let sender = game.sender();
    let producer = std::thread::spawn(move || {
        for i in 0..BODY_COUNT {
            let angle = TAU * i as f32 / BODY_COUNT as f32;
            let position = [angle.cos() * 10.0, 5.0, angle.sin() * 10.0];
            let falls = i % 2 == 0;
            sender.spawn(move |world, entity| {
                world.add_component(entity, Transform::from_position(position).with_scale(0.5))?;
                world.add_component(entity, Mesh::new(i % 4, 0))?;
                world.add_component(
                    entity,
                    RigidBody {
                        velocity: [0.0, 2.0, 0.0],
                        angular_velocity: [0.0, 1.5, 0.0],
                    },
                )?;
                if falls {
                    world.add_component(entity, Gravity::default())?;
                }
                Ok(())
            });
        }
    });
    if producer.join().is_err() {
        tracing::error!("producer thread panicked");
    }

    let sender = game.sender();
    for frame in 0..FRAMES {
        let stats = game.tick(dt)?;
        if frame % 60 == 0 {
            tracing::info!(
                frame,
                instances = stats.instances,
                spawned = stats.commands_applied,
                "tick"
            );
        }

        let world = game.world().read();
        for (entity, transform) in world.store::<Transform>()?.iter() {
            if transform.position[1] < FLOOR_Y {
                sender.despawn(entity);
            }
        }
    }

    let world = game.world().read();
    tracing::info!(
        alive = world.living_count(),
        capacity = world.capacity(),
        instance_bytes = world.system::<kestrel::RenderSystem>()?.as_bytes().len(),
        "simulation finished"
    );
    drop(world);

    game.stats().log_summary();
    Ok(())
}
