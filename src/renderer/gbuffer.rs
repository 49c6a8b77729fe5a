//! G-Buffer Pass
//!
//! The deferred-rendering geometry pass. Rasterizes opaque scene geometry
//! into three simultaneously bound render targets consumed by the later
//! lighting passes:
//!
//! | Slot | Target          | Format   | Contents                              |
//! |------|-----------------|----------|---------------------------------------|
//! | 0    | depth           | R32Float | `-viewSpaceDepth / farPlane`          |
//! | 1    | normal          | Rg16Float| view-space normal, spherical encoding |
//! | 2    | motion+specular | Rgba8    | RG motion delta, B specular power     |
//!
//! # Session protocol
//!
//! `begin` → any number of `render_model` → `end`. Out-of-order calls are
//! invalid operations, and every failure inside a stage is wrapped as
//! [`EngineError::PassFailed`] naming the stage — no partial-state
//! recovery is attempted, the caller aborts the frame's deferred work.

use glam::{Mat4, Vec4};

use crate::animation::clip::MAX_BONES;
use crate::animation::track::BoneTransforms;
use crate::errors::{EngineError, Result};
use crate::renderer::backend::{
    Antialiasing, BlendMode, CullMode, DepthFormat, DepthMode, PipelineState, RenderBackend,
    ShaderId, SurfaceFormat, TextureId,
};
use crate::renderer::model::Model;
use crate::renderer::params::{MatrixArrayParameter, MatrixParameter, ScalarParameter};
use crate::renderer::targets::{
    MultiTargetBinding, RenderTargetDesc, RenderTargets, SizeMode, TargetId,
};

/// Depth buffer encoding: one 32-bit float channel.
const DEPTH_FORMAT: SurfaceFormat = SurfaceFormat::R32Float;
/// Normals in 2-channel spherical coordinates.
const NORMAL_FORMAT: SurfaceFormat = SurfaceFormat::Rg16Float;
/// RG = screen-space motion delta, B = specular power, A unused.
const MOTION_SPECULAR_FORMAT: SurfaceFormat = SurfaceFormat::Rgba8;

/// Fixed state for the whole geometry pass: opaque blend, back-face
/// culling, standard depth test.
const GBUFFER_STATE: PipelineState = PipelineState {
    blend: BlendMode::Opaque,
    cull: CullMode::Back,
    depth: DepthMode::ReadWrite,
};

struct GBufferParams {
    world_view: MatrixParameter,
    world_view_proj: MatrixParameter,
    /// Transpose-inverse world-view, for correct normal transform under
    /// non-uniform scale.
    world_view_it: MatrixParameter,
    previous_world_view_proj: MatrixParameter,
    far_plane: ScalarParameter,
    specular_power: ScalarParameter,
    bones: MatrixArrayParameter,
}

impl GBufferParams {
    fn new(backend: &mut dyn RenderBackend, shader: ShaderId) -> Result<Self> {
        Ok(Self {
            world_view: MatrixParameter::new(backend, shader, "WorldView")?,
            world_view_proj: MatrixParameter::new(backend, shader, "WorldViewProj")?,
            world_view_it: MatrixParameter::new(backend, shader, "WorldViewIT")?,
            previous_world_view_proj: MatrixParameter::new(
                backend,
                shader,
                "PreviousWorldViewProj",
            )?,
            far_plane: ScalarParameter::new(backend, shader, "FarPlane")?,
            specular_power: ScalarParameter::new(backend, shader, "SpecularPower")?,
            bones: MatrixArrayParameter::new(backend, shader, "Bones")?,
        })
    }
}

/// Per-`begin` cached camera state.
struct Session {
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
}

pub struct GBufferPass {
    shader: ShaderId,
    depth_target: TargetId,
    normal_target: TargetId,
    motion_specular_target: TargetId,
    binding: MultiTargetBinding,
    params: GBufferParams,
    session: Option<Session>,
    /// Last session's view-projection, for camera-motion vectors. The
    /// first frame falls back to the current one (zero motion).
    previous_view_projection: Option<Mat4>,
    matrix_scratch: Box<[Mat4; MAX_BONES]>,
}

impl GBufferPass {
    /// Creates the pass: three full-screen-relative targets plus the
    /// parameter cache for `shader`.
    pub fn new(
        backend: &mut dyn RenderBackend,
        targets: &mut RenderTargets,
        shader: ShaderId,
    ) -> Result<Self> {
        let full = SizeMode::ScreenRelative { scale: 1.0 };
        let depth_target = targets.create(
            backend,
            "GBuffer Depth",
            RenderTargetDesc {
                format: DEPTH_FORMAT,
                // Slot 0 carries the pass's depth buffer.
                depth_format: DepthFormat::Depth24,
                antialiasing: Antialiasing::Off,
                size: full,
            },
        )?;
        let normal_target = targets.create(
            backend,
            "GBuffer Normal",
            RenderTargetDesc {
                format: NORMAL_FORMAT,
                depth_format: DepthFormat::None,
                antialiasing: Antialiasing::Off,
                size: full,
            },
        )?;
        let motion_specular_target = targets.create(
            backend,
            "GBuffer Motion-Specular",
            RenderTargetDesc {
                format: MOTION_SPECULAR_FORMAT,
                depth_format: DepthFormat::None,
                antialiasing: Antialiasing::Off,
                size: full,
            },
        )?;
        let binding =
            MultiTargetBinding::new(&[depth_target, normal_target, motion_specular_target])?;
        let params = GBufferParams::new(backend, shader)?;

        Ok(Self {
            shader,
            depth_target,
            normal_target,
            motion_specular_target,
            binding,
            params,
            session: None,
            previous_view_projection: None,
            matrix_scratch: Box::new([Mat4::IDENTITY; MAX_BONES]),
        })
    }

    // ── Stage: begin ───────────────────────────────────────────────────

    /// Opens a geometry session: fixed pipeline state, atomic 3-target
    /// bind, clear to white, camera state cached for the session.
    pub fn begin(
        &mut self,
        backend: &mut dyn RenderBackend,
        targets: &mut RenderTargets,
        view: Mat4,
        projection: Mat4,
        far_plane: f32,
    ) -> Result<()> {
        self.begin_inner(backend, targets, view, projection, far_plane)
            .map_err(|e| e.in_stage("begin"))
    }

    fn begin_inner(
        &mut self,
        backend: &mut dyn RenderBackend,
        targets: &mut RenderTargets,
        view: Mat4,
        projection: Mat4,
        far_plane: f32,
    ) -> Result<()> {
        if self.session.is_some() {
            return Err(EngineError::InvalidOperation(
                "G-Buffer begin called while a session is already open".to_string(),
            ));
        }

        backend.set_pipeline_state(&GBUFFER_STATE);
        targets.enable_binding(backend, &self.binding)?;
        targets.clear(backend, Vec4::ONE)?;

        self.params.far_plane.set(backend, far_plane);
        self.session = Some(Session {
            view,
            projection,
            view_projection: projection * view,
        });
        Ok(())
    }

    // ── Stage: render model ────────────────────────────────────────────

    /// Draws one model into the open session.
    ///
    /// Computes and uploads world-view, world-view-projection and the
    /// transpose-inverse world-view through the parameter cache, selects
    /// the skinned or rigid technique from whether a bone palette is
    /// supplied, and issues one draw per mesh.
    pub fn render_model(
        &mut self,
        backend: &mut dyn RenderBackend,
        world: Mat4,
        model: &Model,
        bones: Option<&BoneTransforms>,
    ) -> Result<()> {
        self.render_model_inner(backend, world, model, bones)
            .map_err(|e| e.in_stage("render model"))
    }

    fn render_model_inner(
        &mut self,
        backend: &mut dyn RenderBackend,
        world: Mat4,
        model: &Model,
        bones: Option<&BoneTransforms>,
    ) -> Result<()> {
        let Some(session) = &self.session else {
            return Err(EngineError::InvalidOperation(
                "G-Buffer render called outside a begin/end session".to_string(),
            ));
        };

        let world_view = session.view * world;
        let world_view_proj = session.projection * world_view;
        let previous_world_view_proj = self
            .previous_view_projection
            .unwrap_or(session.view_projection)
            * world;

        self.params.world_view.set(backend, world_view);
        self.params.world_view_proj.set(backend, world_view_proj);
        self.params
            .world_view_it
            .set(backend, world_view.inverse().transpose());
        self.params
            .previous_world_view_proj
            .set(backend, previous_world_view_proj);
        self.params
            .specular_power
            .set(backend, model.specular_power);

        let skinned = model.skinned && bones.is_some();
        if skinned {
            let palette = bones.expect("checked by `skinned`");
            palette.write_matrices(&mut self.matrix_scratch);
            self.params
                .bones
                .set(backend, self.matrix_scratch.as_slice());
        }
        backend.select_technique(self.shader, if skinned { "GBufferSkinned" } else { "GBuffer" })?;

        for &mesh in &model.meshes {
            backend.draw_mesh(mesh)?;
        }
        Ok(())
    }

    // ── Stage: end ─────────────────────────────────────────────────────

    /// Closes the session, unbinding (and thereby resolving) the three
    /// targets so later passes can read them.
    pub fn end(
        &mut self,
        backend: &mut dyn RenderBackend,
        targets: &mut RenderTargets,
    ) -> Result<()> {
        self.end_inner(backend, targets).map_err(|e| e.in_stage("end"))
    }

    fn end_inner(
        &mut self,
        backend: &mut dyn RenderBackend,
        targets: &mut RenderTargets,
    ) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Err(EngineError::InvalidOperation(
                "G-Buffer end called without a matching begin".to_string(),
            ));
        };
        targets.disable_binding(backend, &self.binding)?;
        self.previous_view_projection = Some(session.view_projection);
        Ok(())
    }

    // ── Resolved outputs ───────────────────────────────────────────────

    pub fn depth_texture(
        &self,
        backend: &dyn RenderBackend,
        targets: &RenderTargets,
    ) -> Result<TextureId> {
        targets.texture(backend, self.depth_target)
    }

    pub fn normal_texture(
        &self,
        backend: &dyn RenderBackend,
        targets: &RenderTargets,
    ) -> Result<TextureId> {
        targets.texture(backend, self.normal_target)
    }

    pub fn motion_specular_texture(
        &self,
        backend: &dyn RenderBackend,
        targets: &RenderTargets,
    ) -> Result<TextureId> {
        targets.texture(backend, self.motion_specular_target)
    }

    #[must_use]
    pub fn targets(&self) -> [TargetId; 3] {
        [
            self.depth_target,
            self.normal_target,
            self.motion_specular_target,
        ]
    }

    #[must_use]
    pub fn is_in_session(&self) -> bool {
        self.session.is_some()
    }
}
