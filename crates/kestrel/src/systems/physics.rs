//! # Physics System
//!
//! Semi-implicit Euler integration over every entity that has both a
//! [`Transform`] and a [`RigidBody`]:
//!
//! ```text
//! v += g * scale * dt      (only with a Gravity component)
//! p += v * dt
//! r += w * dt
//! ```
//!
//! Velocity is updated before position, which keeps orbits and bounces
//! stable at game frame rates.

use kestrel_core::{Coordinator, EcsResult, Entity, System};

use crate::components::{Gravity, RigidBody, Transform};

/// Standard gravity (world units per second squared).
pub const EARTH_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Integrates rigid bodies.
#[derive(Clone, Debug)]
pub struct PhysicsSystem {
    gravity: [f32; 3],
    max_speed: f32,
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(EARTH_GRAVITY, f32::INFINITY)
    }
}

impl PhysicsSystem {
    /// Creates a physics system.
    ///
    /// # Arguments
    ///
    /// * `gravity` - World gravity vector
    /// * `max_speed` - Terminal speed; velocities are clamped to this length
    #[must_use]
    pub fn new(gravity: [f32; 3], max_speed: f32) -> Self {
        Self { gravity, max_speed }
    }

    /// World gravity vector.
    #[inline]
    #[must_use]
    pub fn gravity(&self) -> [f32; 3] {
        self.gravity
    }

    /// Replaces the world gravity vector.
    pub fn set_gravity(&mut self, gravity: [f32; 3]) {
        self.gravity = gravity;
    }

    fn clamp_speed(&self, velocity: &mut [f32; 3]) {
        let speed_sq = velocity.iter().map(|v| v * v).sum::<f32>();
        if speed_sq > self.max_speed * self.max_speed {
            let factor = self.max_speed / speed_sq.sqrt();
            for v in velocity.iter_mut() {
                *v *= factor;
            }
        }
    }
}

impl System for PhysicsSystem {
    fn update(&mut self, world: &mut Coordinator, entities: &[Entity], delta_time: f32) -> EcsResult<()> {
        for &entity in entities {
            let gravity_scale = if world.has::<Gravity>(entity)? {
                world.get_component::<Gravity>(entity)?.scale
            } else {
                0.0
            };

            let body = world.get_component_mut::<RigidBody>(entity)?;
            for (v, g) in body.velocity.iter_mut().zip(self.gravity) {
                *v += g * gravity_scale * delta_time;
            }
            self.clamp_speed(&mut body.velocity);
            let RigidBody {
                velocity,
                angular_velocity,
            } = *body;

            let transform = world.get_component_mut::<Transform>(entity)?;
            for axis in 0..3 {
                transform.position[axis] += velocity[axis] * delta_time;
                transform.rotation[axis] += angular_velocity[axis] * delta_time;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::Signature;

    fn world(system: PhysicsSystem) -> Coordinator {
        let mut world = Coordinator::with_capacity(16);
        let transform = world.register_component::<Transform>().unwrap();
        let body = world.register_component::<RigidBody>().unwrap();
        world.register_component::<Gravity>().unwrap();
        world.register_system(system).unwrap();
        world
            .set_system_signature::<PhysicsSystem>(Signature::EMPTY.with(transform).with(body))
            .unwrap();
        world
    }

    #[test]
    fn test_constant_velocity() {
        let mut world = world(PhysicsSystem::default());
        let e = world.create_entity().unwrap();
        world.add_component(e, Transform::default()).unwrap();
        world
            .add_component(e, RigidBody::with_velocity([1.0, 0.0, -2.0]))
            .unwrap();

        for _ in 0..4 {
            world.run_system::<PhysicsSystem>(0.25).unwrap();
        }

        let t = world.get_component::<Transform>(e).unwrap();
        assert!((t.position[0] - 1.0).abs() < 1e-5);
        assert!((t.position[2] + 2.0).abs() < 1e-5);
        // No Gravity component, so no fall
        assert_eq!(t.position[1], 0.0);
    }

    #[test]
    fn test_gravity_is_semi_implicit() {
        let mut world = world(PhysicsSystem::new([0.0, -10.0, 0.0], f32::INFINITY));
        let e = world.create_entity().unwrap();
        world.add_component(e, Transform::default()).unwrap();
        world.add_component(e, RigidBody::default()).unwrap();
        world.add_component(e, Gravity { scale: 0.5 }).unwrap();

        world.run_system::<PhysicsSystem>(1.0).unwrap();

        // v = -5 first, then p = v * dt
        assert_eq!(world.get_component::<RigidBody>(e).unwrap().velocity[1], -5.0);
        assert_eq!(world.get_component::<Transform>(e).unwrap().position[1], -5.0);
    }

    #[test]
    fn test_angular_velocity() {
        let mut world = world(PhysicsSystem::default());
        let e = world.create_entity().unwrap();
        world.add_component(e, Transform::default()).unwrap();
        world
            .add_component(
                e,
                RigidBody {
                    velocity: [0.0; 3],
                    angular_velocity: [0.0, 2.0, 0.0],
                },
            )
            .unwrap();

        world.run_system::<PhysicsSystem>(0.5).unwrap();
        assert_eq!(world.get_component::<Transform>(e).unwrap().rotation, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_terminal_speed() {
        let mut world = world(PhysicsSystem::new([0.0, -100.0, 0.0], 3.0));
        let e = world.create_entity().unwrap();
        world.add_component(e, Transform::default()).unwrap();
        world.add_component(e, RigidBody::default()).unwrap();
        world.add_component(e, Gravity::default()).unwrap();

        world.run_system::<PhysicsSystem>(1.0).unwrap();
        let v = world.get_component::<RigidBody>(e).unwrap().velocity;
        assert!((v[1] + 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_only_entity_is_untouched() {
        let mut world = world(PhysicsSystem::default());
        let e = world.create_entity().unwrap();
        world
            .add_component(e, Transform::from_position([4.0, 4.0, 4.0]))
            .unwrap();

        world.run_system::<PhysicsSystem>(1.0).unwrap();
        assert_eq!(
            world.get_component::<Transform>(e).unwrap().position,
            [4.0, 4.0, 4.0]
        );
    }
}
