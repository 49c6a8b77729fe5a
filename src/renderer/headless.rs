//! Headless recording backend
//!
//! A [`RenderBackend`] that performs no GPU work and instead records what
//! was asked of it: surface lifetimes, bind/unbind order, parameter upload
//! counts, technique selections and draw calls. Integration tests assert
//! against the recording; tools can use it to dry-run a frame.

use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;

use crate::errors::{EngineError, Result};
use crate::renderer::backend::{
    MeshId, ParamHandle, PipelineState, RenderBackend, ShaderId, SurfaceDesc, SurfaceId, TextureId,
};

/// One recorded device event, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    CreateSurface(SurfaceId),
    DestroySurface(SurfaceId),
    BindSurfaces(Vec<SurfaceId>),
    BindBackbuffer,
    Clear { color: Vec4, depth: bool },
    SetPipelineState(PipelineState),
    SelectTechnique { shader: ShaderId, technique: String },
    DrawMesh(u32),
}

pub struct HeadlessBackend {
    next_surface: u32,
    next_param: u32,

    /// Live surfaces and their descriptors.
    surfaces: FxHashMap<SurfaceId, SurfaceDesc>,
    /// (shader, name) → handle; handles are stable across repeat lookups.
    params: FxHashMap<(ShaderId, String), ParamHandle>,
    /// Per-parameter upload counts (matrix/vector/scalar/texture alike).
    uploads: FxHashMap<ParamHandle, u32>,

    bound: Vec<SurfaceId>,
    events: Vec<DeviceEvent>,

    /// When set, the next `create_surface` fails — exercises the
    /// resource-creation error path.
    pub fail_next_surface_creation: bool,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_surface: 0,
            next_param: 0,
            surfaces: FxHashMap::default(),
            params: FxHashMap::default(),
            uploads: FxHashMap::default(),
            bound: Vec::new(),
            events: Vec::new(),
            fail_next_surface_creation: false,
        }
    }

    /// Everything recorded so far, in issue order.
    #[must_use]
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// How many times a given parameter was actually uploaded.
    #[must_use]
    pub fn upload_count(&self, param: ParamHandle) -> u32 {
        self.uploads.get(&param).copied().unwrap_or(0)
    }

    /// Total uploads across all parameters.
    #[must_use]
    pub fn total_uploads(&self) -> u32 {
        self.uploads.values().sum()
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DeviceEvent::DrawMesh(_)))
            .count()
    }

    #[must_use]
    pub fn live_surface_count(&self) -> usize {
        self.surfaces.len()
    }

    #[must_use]
    pub fn surface_desc(&self, surface: SurfaceId) -> Option<&SurfaceDesc> {
        self.surfaces.get(&surface)
    }

    fn record_upload(&mut self, param: ParamHandle) {
        *self.uploads.entry(param).or_insert(0) += 1;
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_surface(&mut self, label: &str, desc: &SurfaceDesc) -> Result<SurfaceId> {
        if self.fail_next_surface_creation {
            self.fail_next_surface_creation = false;
            return Err(EngineError::ResourceCreation {
                resource: format!("surface '{label}'"),
                cause: "simulated device allocation failure".to_string(),
            });
        }
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(id, *desc);
        self.events.push(DeviceEvent::CreateSurface(id));
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface);
        self.events.push(DeviceEvent::DestroySurface(surface));
    }

    fn bind_surfaces(&mut self, surfaces: &[SurfaceId]) -> Result<()> {
        for s in surfaces {
            if !self.surfaces.contains_key(s) {
                return Err(EngineError::InvalidOperation(format!(
                    "binding destroyed surface {s:?}"
                )));
            }
        }
        self.bound = surfaces.to_vec();
        self.events.push(DeviceEvent::BindSurfaces(surfaces.to_vec()));
        Ok(())
    }

    fn bind_backbuffer(&mut self) {
        self.bound.clear();
        self.events.push(DeviceEvent::BindBackbuffer);
    }

    fn clear(&mut self, color: Vec4, clear_depth: bool) {
        self.events.push(DeviceEvent::Clear {
            color,
            depth: clear_depth,
        });
    }

    fn surface_texture(&self, surface: SurfaceId) -> TextureId {
        // Surfaces and their resolved textures share an id space here.
        TextureId(surface.0 | 0x8000_0000)
    }

    fn set_pipeline_state(&mut self, state: &PipelineState) {
        self.events.push(DeviceEvent::SetPipelineState(*state));
    }

    fn parameter(&mut self, shader: ShaderId, name: &str) -> Result<ParamHandle> {
        if let Some(handle) = self.params.get(&(shader, name.to_string())) {
            return Ok(*handle);
        }
        let handle = ParamHandle(self.next_param);
        self.next_param += 1;
        self.params.insert((shader, name.to_string()), handle);
        Ok(handle)
    }

    fn set_matrix(&mut self, param: ParamHandle, _value: &Mat4) {
        self.record_upload(param);
    }

    fn set_matrix_array(&mut self, param: ParamHandle, _values: &[Mat4]) {
        self.record_upload(param);
    }

    fn set_vector(&mut self, param: ParamHandle, _value: Vec4) {
        self.record_upload(param);
    }

    fn set_scalar(&mut self, param: ParamHandle, _value: f32) {
        self.record_upload(param);
    }

    fn set_texture(&mut self, param: ParamHandle, _texture: TextureId) {
        self.record_upload(param);
    }

    fn black_texture(&self) -> TextureId {
        TextureId(u32::MAX)
    }

    fn select_technique(&mut self, shader: ShaderId, technique: &str) -> Result<()> {
        self.events.push(DeviceEvent::SelectTechnique {
            shader,
            technique: technique.to_string(),
        });
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshId) -> Result<()> {
        self.events.push(DeviceEvent::DrawMesh(mesh.0));
        Ok(())
    }
}
