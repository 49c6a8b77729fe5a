//! Shader Parameter Cache
//!
//! Per-parameter "last value" memoization. Every shader wrapper keeps one
//! cached parameter per named GPU constant and only issues the (relatively
//! expensive) upload when the new value differs from the shadow copy.
//!
//! Caches are owned per shader *instance*: two instances of the same
//! program diff independently, so the suppression stays correct no matter
//! how many instances exist.
//!
//! The same idea, one level down, drives redundant-state elision for bind
//! slots in the target registry; here it covers matrices, vectors,
//! scalars and textures.

use glam::{Mat4, Vec4};

use crate::errors::Result;
use crate::renderer::backend::{ParamHandle, RenderBackend, ShaderId, TextureId};

/// Full structural matrix inequality with a diagonal-first short circuit.
///
/// Transform matrices that differ at all almost always differ on the
/// diagonal (scale) or in the translation column, so four compares settle
/// the common case before the full 16-field check.
#[inline]
fn matrices_differ(a: &Mat4, b: &Mat4) -> bool {
    if a.x_axis.x != b.x_axis.x
        || a.y_axis.y != b.y_axis.y
        || a.z_axis.z != b.z_axis.z
        || a.w_axis.w != b.w_axis.w
    {
        return true;
    }
    a != b
}

/// A cached matrix parameter.
#[derive(Debug, Clone)]
pub struct MatrixParameter {
    handle: ParamHandle,
    shadow: Option<Mat4>,
}

impl MatrixParameter {
    pub fn new(backend: &mut dyn RenderBackend, shader: ShaderId, name: &str) -> Result<Self> {
        Ok(Self {
            handle: backend.parameter(shader, name)?,
            shadow: None,
        })
    }

    /// Uploads `value` unless it equals the last uploaded value.
    pub fn set(&mut self, backend: &mut dyn RenderBackend, value: Mat4) {
        match &self.shadow {
            Some(last) if !matrices_differ(last, &value) => {}
            _ => {
                backend.set_matrix(self.handle, &value);
                self.shadow = Some(value);
            }
        }
    }

    #[must_use]
    pub fn handle(&self) -> ParamHandle {
        self.handle
    }
}

/// A cached vector (or color) parameter, compared by value.
#[derive(Debug, Clone)]
pub struct VectorParameter {
    handle: ParamHandle,
    shadow: Option<Vec4>,
}

impl VectorParameter {
    pub fn new(backend: &mut dyn RenderBackend, shader: ShaderId, name: &str) -> Result<Self> {
        Ok(Self {
            handle: backend.parameter(shader, name)?,
            shadow: None,
        })
    }

    pub fn set(&mut self, backend: &mut dyn RenderBackend, value: Vec4) {
        if self.shadow != Some(value) {
            backend.set_vector(self.handle, value);
            self.shadow = Some(value);
        }
    }

    #[must_use]
    pub fn handle(&self) -> ParamHandle {
        self.handle
    }
}

/// A cached scalar parameter, compared by value.
#[derive(Debug, Clone)]
pub struct ScalarParameter {
    handle: ParamHandle,
    shadow: Option<f32>,
}

impl ScalarParameter {
    pub fn new(backend: &mut dyn RenderBackend, shader: ShaderId, name: &str) -> Result<Self> {
        Ok(Self {
            handle: backend.parameter(shader, name)?,
            shadow: None,
        })
    }

    pub fn set(&mut self, backend: &mut dyn RenderBackend, value: f32) {
        if self.shadow != Some(value) {
            backend.set_scalar(self.handle, value);
            self.shadow = Some(value);
        }
    }

    #[must_use]
    pub fn handle(&self) -> ParamHandle {
        self.handle
    }
}

/// A cached texture parameter, compared by identity.
///
/// An absent texture is redirected to the backend's reserved black
/// texture so shaders never receive a null binding.
#[derive(Debug, Clone)]
pub struct TextureParameter {
    handle: ParamHandle,
    shadow: Option<TextureId>,
}

impl TextureParameter {
    pub fn new(backend: &mut dyn RenderBackend, shader: ShaderId, name: &str) -> Result<Self> {
        Ok(Self {
            handle: backend.parameter(shader, name)?,
            shadow: None,
        })
    }

    pub fn set(&mut self, backend: &mut dyn RenderBackend, texture: Option<TextureId>) {
        let texture = texture.unwrap_or_else(|| backend.black_texture());
        if self.shadow != Some(texture) {
            backend.set_texture(self.handle, texture);
            self.shadow = Some(texture);
        }
    }

    #[must_use]
    pub fn handle(&self) -> ParamHandle {
        self.handle
    }
}

/// A matrix-array parameter (bone palettes).
///
/// Deliberately unmemoized: diffing a 72-entry palette costs more than
/// the upload test it would save, and palettes change every frame anyway.
#[derive(Debug, Clone)]
pub struct MatrixArrayParameter {
    handle: ParamHandle,
}

impl MatrixArrayParameter {
    pub fn new(backend: &mut dyn RenderBackend, shader: ShaderId, name: &str) -> Result<Self> {
        Ok(Self {
            handle: backend.parameter(shader, name)?,
        })
    }

    pub fn set(&mut self, backend: &mut dyn RenderBackend, values: &[Mat4]) {
        backend.set_matrix_array(self.handle, values);
    }

    #[must_use]
    pub fn handle(&self) -> ParamHandle {
        self.handle
    }
}
