//! # Render System
//!
//! Turns every entity with a [`Transform`] and a [`Mesh`] into one
//! [`InstanceData`] record per frame. The records are laid out for direct
//! upload as a GPU instance buffer; the upload itself belongs to the host.
//!
//! The buffer is reused across frames, so steady-state frames do not
//! allocate.

use bytemuck::{Pod, Zeroable};
use kestrel_core::{Coordinator, EcsResult, Entity, System};

use crate::components::{Mesh, Transform};

/// Per-instance GPU record.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceData {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// Geometry handle.
    pub mesh_id: u32,
    /// Material handle.
    pub material_id: u32,
}

/// Collects instance data for drawable entities.
#[derive(Debug, Default)]
pub struct RenderSystem {
    instances: Vec<InstanceData>,
    drawn: Vec<Entity>,
}

impl RenderSystem {
    /// Creates a render system with room for `capacity` instances.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            drawn: Vec::with_capacity(capacity),
        }
    }

    /// Instances collected by the last update.
    #[inline]
    #[must_use]
    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    /// Entities drawn by the last update, parallel to [`instances`](Self::instances).
    #[inline]
    #[must_use]
    pub fn drawn(&self) -> &[Entity] {
        &self.drawn
    }

    /// The instance buffer as raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl System for RenderSystem {
    fn update(&mut self, world: &mut Coordinator, entities: &[Entity], _delta_time: f32) -> EcsResult<()> {
        self.instances.clear();
        self.drawn.clear();

        for &entity in entities {
            let model = world.get_component::<Transform>(entity)?.model_matrix();
            let mesh = world.get_component::<Mesh>(entity)?;
            self.instances.push(InstanceData {
                model,
                mesh_id: mesh.mesh_id,
                material_id: mesh.material_id,
            });
            self.drawn.push(entity);
        }

        tracing::trace!(instances = self.instances.len(), "instance buffer rebuilt");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::Signature;

    fn world() -> Coordinator {
        let mut world = Coordinator::with_capacity(8);
        let transform = world.register_component::<Transform>().unwrap();
        let mesh = world.register_component::<Mesh>().unwrap();
        world.register_system(RenderSystem::default()).unwrap();
        world
            .set_system_signature::<RenderSystem>(Signature::EMPTY.with(transform).with(mesh))
            .unwrap();
        world
    }

    #[test]
    fn test_one_instance_per_drawable() {
        let mut world = world();

        let a = world.create_entity().unwrap();
        world.add_component(a, Transform::from_position([1.0, 0.0, 0.0])).unwrap();
        world.add_component(a, Mesh::new(3, 9)).unwrap();

        // Not drawable
        let b = world.create_entity().unwrap();
        world.add_component(b, Transform::default()).unwrap();

        world.run_system::<RenderSystem>(0.0).unwrap();

        let render = world.system::<RenderSystem>().unwrap();
        assert_eq!(render.drawn(), &[a]);
        assert_eq!(render.instances().len(), 1);
        assert_eq!(render.instances()[0].mesh_id, 3);
        assert_eq!(render.instances()[0].material_id, 9);
        assert_eq!(render.instances()[0].model[3], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(render.as_bytes().len(), std::mem::size_of::<InstanceData>());
    }

    #[test]
    fn test_buffer_is_rebuilt_each_frame() {
        let mut world = world();
        let e = world.create_entity().unwrap();
        world.add_component(e, Transform::default()).unwrap();
        world.add_component(e, Mesh::new(1, 0)).unwrap();

        world.run_system::<RenderSystem>(0.0).unwrap();
        assert_eq!(world.system::<RenderSystem>().unwrap().instances().len(), 1);

        world.remove_component::<Mesh>(e).unwrap();
        world.run_system::<RenderSystem>(0.0).unwrap();
        assert!(world.system::<RenderSystem>().unwrap().instances().is_empty());
    }
}
