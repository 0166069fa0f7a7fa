//! # Simulation Components
//!
//! Plain data consumed by the physics and render systems. All of them are
//! `Pod`, so a host can copy whole stores into GPU or network buffers.

use bytemuck::{Pod, Zeroable};
use kestrel_core::Component;

/// World-space placement of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// Translation in world units.
    pub position: [f32; 3],
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: [f32; 3],
    /// Per-axis scale.
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Component for Transform {}

impl Transform {
    /// Unrotated, unit-scale transform at `position`.
    #[inline]
    #[must_use]
    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Returns this transform with a uniform scale.
    #[inline]
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = [scale; 3];
        self
    }

    /// Returns this transform with the given Euler rotation.
    #[inline]
    #[must_use]
    pub fn with_rotation(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Column-major model matrix: translation * rotation * scale.
    ///
    /// Rotation is `Rz * Ry * Rx`, so X is applied first.
    #[must_use]
    pub fn model_matrix(&self) -> [[f32; 4]; 4] {
        let (sa, ca) = self.rotation[0].sin_cos();
        let (sb, cb) = self.rotation[1].sin_cos();
        let (sc, cc) = self.rotation[2].sin_cos();
        let [sx, sy, sz] = self.scale;
        let [px, py, pz] = self.position;

        [
            [cc * cb * sx, sc * cb * sx, -sb * sx, 0.0],
            [
                (cc * sb * sa - sc * ca) * sy,
                (sc * sb * sa + cc * ca) * sy,
                cb * sa * sy,
                0.0,
            ],
            [
                (cc * sb * ca + sc * sa) * sz,
                (sc * sb * ca - cc * sa) * sz,
                cb * ca * sz,
                0.0,
            ],
            [px, py, pz, 1.0],
        ]
    }
}

/// Reference to GPU-side geometry. Ids are assigned by the asset loader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Mesh {
    /// Geometry handle.
    pub mesh_id: u32,
    /// Material handle.
    pub material_id: u32,
}

impl Component for Mesh {}

impl Mesh {
    /// Creates a mesh reference.
    #[inline]
    #[must_use]
    pub const fn new(mesh_id: u32, material_id: u32) -> Self {
        Self {
            mesh_id,
            material_id,
        }
    }
}

/// Linear and angular motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RigidBody {
    /// World units per second.
    pub velocity: [f32; 3],
    /// Radians per second around each axis.
    pub angular_velocity: [f32; 3],
}

impl Component for RigidBody {}

impl RigidBody {
    /// Body moving at `velocity` without spin.
    #[inline]
    #[must_use]
    pub const fn with_velocity(velocity: [f32; 3]) -> Self {
        Self {
            velocity,
            angular_velocity: [0.0; 3],
        }
    }
}

/// Opts a rigid body into world gravity.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Gravity {
    /// Multiplier on the world gravity vector.
    pub scale: f32,
}

impl Default for Gravity {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Component for Gravity {}
