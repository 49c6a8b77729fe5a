pub mod backend;
pub mod gbuffer;
pub mod headless;
pub mod model;
pub mod params;
pub mod targets;

pub use backend::{
    Antialiasing, BlendMode, CullMode, DepthFormat, DepthMode, MeshId, ParamHandle, PipelineState,
    RenderBackend, ShaderId, SurfaceDesc, SurfaceFormat, SurfaceId, TextureId,
};
pub use gbuffer::GBufferPass;
pub use headless::{DeviceEvent, HeadlessBackend};
pub use model::Model;
pub use params::{
    MatrixArrayParameter, MatrixParameter, ScalarParameter, TextureParameter, VectorParameter,
};
pub use targets::{
    MAX_BOUND_TARGETS, MultiTargetBinding, RenderTargetDesc, RenderTargets, SizeMode, TargetId,
};
