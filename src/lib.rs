#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod engine;
pub mod errors;
pub mod pool;
pub mod renderer;
pub mod scene;

pub use animation::{
    AnimationClip, AnimationPlayer, AnimationSystem, BonePose, BoneTransforms, Keyframe, MAX_BONES,
    PlayMode, PlaybackState,
};
pub use engine::Engine;
pub use errors::{EngineError, Result};
pub use pool::{ObjectPool, PoolHandle};
pub use renderer::{
    GBufferPass, HeadlessBackend, Model, MultiTargetBinding, RenderBackend, RenderTargetDesc,
    RenderTargets, SizeMode, TargetId,
};
pub use scene::{Camera, CameraManager, CullingMask, Light, LightKind, LightManager, Viewport};
