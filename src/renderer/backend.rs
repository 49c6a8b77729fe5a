//! Render backend seam
//!
//! The engine core never talks to a concrete graphics API. Everything it
//! needs from the device — surface lifetime, target binding, parameter
//! uploads, draws — goes through the [`RenderBackend`] trait, with
//! engine-owned enums describing formats and fixed-function state.
//!
//! A real implementation wraps the platform device; the in-crate
//! [`HeadlessBackend`](crate::renderer::headless::HeadlessBackend) records
//! calls for tests and tools.

use glam::{Mat4, Vec4};

use crate::errors::Result;

// ─── Opaque resource ids ─────────────────────────────────────────────────────

/// A GPU color/depth surface owned by the backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SurfaceId(pub u32);

/// A GPU texture (either an asset or a resolved surface).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureId(pub u32);

/// A compiled shader program with named parameters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ShaderId(pub u32);

/// An uploaded mesh (vertex + index buffers).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MeshId(pub u32);

/// An opaque reference to one named parameter of one shader program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ParamHandle(pub u32);

// ─── Format & state descriptions ─────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SurfaceFormat {
    /// 8-bit RGBA color.
    Rgba8,
    /// Two 16-bit float channels.
    Rg16Float,
    /// One 32-bit float channel.
    R32Float,
    /// Four 16-bit float channels (HDR blendable).
    Rgba16Float,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DepthFormat {
    None,
    Depth24,
    Depth24Stencil8,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Antialiasing {
    Off,
    Msaa2,
    Msaa4,
    Msaa8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlendMode {
    Opaque,
    Alpha,
    Additive,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CullMode {
    None,
    Back,
    Front,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DepthMode {
    /// Standard depth test, writes enabled.
    ReadWrite,
    /// Depth test only.
    ReadOnly,
    Disabled,
}

/// Fixed-function state a pass establishes once in its `begin`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PipelineState {
    pub blend: BlendMode,
    pub cull: CullMode,
    pub depth: DepthMode,
}

/// Backend-facing surface description, with the pixel size already
/// resolved (screen-relative sizing is the registry's concern).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: SurfaceFormat,
    pub depth_format: DepthFormat,
    pub antialiasing: Antialiasing,
}

// ─── The backend trait ───────────────────────────────────────────────────────

/// Everything the render core needs from the graphics device.
///
/// Single-threaded by contract: one call at a time, issued from the frame
/// driver's render tick. A multi-threaded reimplementation must add its
/// own synchronization around the implementor.
pub trait RenderBackend {
    // ── Surfaces ───────────────────────────────────────────────────────

    fn create_surface(&mut self, label: &str, desc: &SurfaceDesc) -> Result<SurfaceId>;

    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Atomically binds up to 4 surfaces as the device render targets.
    fn bind_surfaces(&mut self, surfaces: &[SurfaceId]) -> Result<()>;

    /// Restores the default back buffer as the device target.
    fn bind_backbuffer(&mut self);

    /// Clears the currently bound targets; depth too when `clear_depth`.
    fn clear(&mut self, color: Vec4, clear_depth: bool);

    /// The readable texture of a resolved surface.
    fn surface_texture(&self, surface: SurfaceId) -> TextureId;

    // ── Fixed-function state ───────────────────────────────────────────

    fn set_pipeline_state(&mut self, state: &PipelineState);

    // ── Shader parameters ──────────────────────────────────────────────

    /// Looks up a named parameter of a compiled shader program.
    fn parameter(&mut self, shader: ShaderId, name: &str) -> Result<ParamHandle>;

    fn set_matrix(&mut self, param: ParamHandle, value: &Mat4);

    /// Bone palettes and other bulk uploads; never memoized by callers.
    fn set_matrix_array(&mut self, param: ParamHandle, values: &[Mat4]);

    fn set_vector(&mut self, param: ParamHandle, value: Vec4);

    fn set_scalar(&mut self, param: ParamHandle, value: f32);

    fn set_texture(&mut self, param: ParamHandle, texture: TextureId);

    /// The reserved 1x1 black texture substituted for absent bindings so
    /// shaders never sample a null texture.
    fn black_texture(&self) -> TextureId;

    // ── Drawing ────────────────────────────────────────────────────────

    /// Selects a technique (shader entry variant) of a program.
    fn select_technique(&mut self, shader: ShaderId, technique: &str) -> Result<()>;

    fn draw_mesh(&mut self, mesh: MeshId) -> Result<()>;
}
