//! Frame driver end to end: queued spawns, physics, rendering, despawns.

use kestrel::core::{EcsConfig, Entity};
use kestrel::{GameConfig, GameLoop, Gravity, Mesh, RigidBody, Transform};

fn config(max_entities: usize) -> GameConfig {
    GameConfig {
        ecs: EcsConfig { max_entities },
        gravity: [0.0, -10.0, 0.0],
        enable_timing_logs: false,
        ..Default::default()
    }
}

#[test]
fn test_spawns_from_many_threads_are_simulated() {
    let mut game = GameLoop::new(config(256)).unwrap();

    let producers: Vec<_> = (0..4u32)
        .map(|t| {
            let sender = game.sender();
            std::thread::spawn(move || {
                for i in 0..16u32 {
                    sender.spawn(move |world, entity| {
                        world.add_component(entity, Transform::from_position([t as f32, 0.0, 0.0]))?;
                        world.add_component(entity, Mesh::new(i, t))?;
                        world.add_component(entity, RigidBody::with_velocity([1.0, 0.0, 0.0]))
                    });
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let stats = game.tick(0.05).unwrap();
    assert_eq!(stats.commands_applied, 64);
    assert_eq!(stats.instances, 64);

    let world = game.world().read();
    for (_, transform) in world.store::<Transform>().unwrap().iter() {
        // Moved one step at 1 unit/s
        assert!((transform.position[0].fract() - 0.05).abs() < 1e-5);
    }
}

#[test]
fn test_falling_body_and_static_drawable() {
    let mut game = GameLoop::new(config(8)).unwrap();

    let (falling, scenery) = {
        let mut world = game.world().write();
        let falling = world.create_entity().unwrap();
        world.add_component(falling, Transform::default()).unwrap();
        world.add_component(falling, RigidBody::default()).unwrap();
        world.add_component(falling, Gravity::default()).unwrap();

        let scenery = world.create_entity().unwrap();
        world
            .add_component(scenery, Transform::from_position([0.0, 5.0, 0.0]))
            .unwrap();
        world.add_component(scenery, Mesh::new(1, 1)).unwrap();
        (falling, scenery)
    };

    for _ in 0..10 {
        game.tick(0.1).unwrap();
    }

    let world = game.world().read();
    let body = world.get_component::<RigidBody>(falling).unwrap();
    assert!((body.velocity[1] + 10.0).abs() < 1e-4);
    assert!(world.get_component::<Transform>(falling).unwrap().position[1] < -5.0);

    let render = world.system::<kestrel::RenderSystem>().unwrap();
    assert_eq!(render.drawn(), &[scenery]);
    assert_eq!(render.instances()[0].model[3], [0.0, 5.0, 0.0, 1.0]);
}

#[test]
fn test_queued_despawn_recycles_id() {
    let mut game = GameLoop::new(config(2)).unwrap();
    let sender = game.sender();

    sender.spawn(|world, entity| world.add_component(entity, Mesh::default()));
    game.tick(0.0).unwrap();
    let first = Entity::new(0);
    assert!(game.world().read().is_alive(first));

    sender.despawn(first);
    sender.spawn(|_, _| Ok(()));
    sender.spawn(|_, _| Ok(()));
    game.tick(0.0).unwrap();

    let world = game.world().read();
    assert_eq!(world.living_count(), 2);
    assert!(world.is_alive(Entity::new(1)));
    // FIFO: id 1 was queued before id 0 came back
    assert!(world.is_alive(first));
    assert!(!world.has::<Mesh>(first).unwrap());
}

#[test]
fn test_failed_command_fails_the_frame() {
    let mut game = GameLoop::new(config(4)).unwrap();
    game.sender().despawn(Entity::new(3));

    assert!(game.tick(0.016).is_err());
    assert_eq!(game.frame_count(), 0);

    // Queue is clean now; the next frame runs
    assert_eq!(game.tick(0.016).unwrap().frame, 0);
}

#[test]
fn test_readers_between_frames() {
    let mut game = GameLoop::new(config(64)).unwrap();
    for i in 0..32u32 {
        game.sender().spawn(move |world, entity| {
            world.add_component(entity, Transform::default())?;
            world.add_component(entity, Mesh::new(i, 0))
        });
    }
    game.tick(0.016).unwrap();

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let shared = game.world().clone();
            std::thread::spawn(move || {
                let world = shared.read();
                world.system::<kestrel::RenderSystem>().unwrap().as_bytes().len()
            })
        })
        .collect();

    let expected = 32 * std::mem::size_of::<kestrel::InstanceData>();
    for reader in readers {
        assert_eq!(reader.join().unwrap(), expected);
    }
}
