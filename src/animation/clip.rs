use glam::{Quat, Vec3};

use crate::errors::{EngineError, Result};

/// Engine-wide bone palette capacity.
///
/// Matches the largest skinning palette the shader constant registers can
/// hold; clips addressing bones past this limit are rejected at build time.
pub const MAX_BONES: usize = 72;

/// A timestamped pose for one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl BonePose {
    /// The bind/identity pose.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: 1.0,
    };

    /// Builds the bone's local transform matrix.
    #[must_use]
    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.position,
        )
    }
}

impl Default for BonePose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One keyframe: a pose for one bone at one point in time.
///
/// Keyframes for every bone of a clip interleave in a single sequence
/// sorted ascending by time.
#[derive(Debug, Clone, Copy)]
pub struct Keyframe {
    pub bone: usize,
    pub time: f32,
    pub pose: BonePose,
}

/// An immutable, baked animation clip.
///
/// Owned by the asset layer and shared read-only between any number of
/// concurrently playing [`AnimationPlayer`](crate::animation::AnimationPlayer)s;
/// each player keeps its own sampling cursor.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    keyframes: Vec<Keyframe>,
}

impl AnimationClip {
    /// Builds a clip from an already-sorted keyframe sequence.
    ///
    /// Validates time ordering and bone range; the duration is the given
    /// cutoff, which may exceed the last keyframe's time (trailing hold).
    pub fn new(name: impl Into<String>, duration: f32, keyframes: Vec<Keyframe>) -> Result<Self> {
        let mut previous = 0.0_f32;
        for (index, kf) in keyframes.iter().enumerate() {
            if kf.bone >= MAX_BONES {
                return Err(EngineError::BoneIndexOutOfRange {
                    index: kf.bone,
                    max: MAX_BONES,
                });
            }
            if kf.time < previous {
                return Err(EngineError::KeyframesOutOfOrder {
                    index,
                    time: kf.time,
                    previous,
                });
            }
            previous = kf.time;
        }

        Ok(Self {
            name: name.into(),
            duration,
            keyframes,
        })
    }

    /// Builds a clip whose duration is the last keyframe's timestamp.
    pub fn from_keyframes(name: impl Into<String>, keyframes: Vec<Keyframe>) -> Result<Self> {
        let duration = keyframes.last().map_or(0.0, |kf| kf.time);
        Self::new(name, duration, keyframes)
    }

    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }
}
