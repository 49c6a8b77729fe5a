//! Renderable model description
//!
//! The core consumes already-uploaded GPU meshes; asset decoding and the
//! content pipeline live outside the crate.

use smallvec::SmallVec;

use crate::renderer::backend::MeshId;

/// A drawable model: one or more GPU meshes plus the material facts the
/// G-Buffer pass needs.
#[derive(Debug, Clone)]
pub struct Model {
    pub meshes: SmallVec<[MeshId; 4]>,
    /// `true` when the vertex data carries skinning indices/weights and a
    /// bone palette should drive it.
    pub skinned: bool,
    /// Specular exponent written into the G-Buffer's blue channel.
    pub specular_power: f32,
}

impl Model {
    #[must_use]
    pub fn rigid(meshes: &[MeshId], specular_power: f32) -> Self {
        Self {
            meshes: SmallVec::from_slice(meshes),
            skinned: false,
            specular_power,
        }
    }

    #[must_use]
    pub fn skinned(meshes: &[MeshId], specular_power: f32) -> Self {
        Self {
            meshes: SmallVec::from_slice(meshes),
            skinned: true,
            specular_power,
        }
    }
}
