pub mod clip;
pub mod player;
pub mod system;
pub mod track;

pub use clip::{AnimationClip, BonePose, Keyframe, MAX_BONES};
pub use player::{AnimationPlayer, PlayMode, PlaybackState};
pub use system::AnimationSystem;
pub use track::{BoneTransforms, TrackCursor, sample_pose};
