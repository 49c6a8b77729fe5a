//! Keyframe track sampling
//!
//! Nearest-past-keyframe sampling over a clip's interleaved keyframe
//! sequence. The buffer always holds the *last applied* keyframe per bone;
//! no interpolation happens between keyframes.

use glam::Mat4;

use crate::animation::clip::{AnimationClip, BonePose, MAX_BONES};

/// Fixed-size bone pose buffer, indexed by bone id.
///
/// One buffer per active player instance; mutated in place every update.
#[derive(Debug, Clone)]
pub struct BoneTransforms {
    poses: [BonePose; MAX_BONES],
}

impl BoneTransforms {
    #[must_use]
    pub fn new() -> Self {
        Self {
            poses: [BonePose::IDENTITY; MAX_BONES],
        }
    }

    /// Resets every bone to the identity pose.
    pub fn reset(&mut self) {
        self.poses.fill(BonePose::IDENTITY);
    }

    #[must_use]
    pub fn pose(&self, bone: usize) -> &BonePose {
        &self.poses[bone]
    }

    pub fn set_pose(&mut self, bone: usize, pose: BonePose) {
        self.poses[bone] = pose;
    }

    #[must_use]
    pub fn poses(&self) -> &[BonePose] {
        &self.poses
    }

    /// Writes the full matrix palette for GPU upload.
    pub fn write_matrices(&self, out: &mut [Mat4; MAX_BONES]) {
        for (m, pose) in out.iter_mut().zip(self.poses.iter()) {
            *m = pose.to_matrix();
        }
    }
}

impl Default for BoneTransforms {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental sampling cursor over a clip's keyframe sequence.
///
/// Amortized O(1) per call while time advances monotonically (the
/// per-frame common case); a backward seek resets the buffer to identity
/// and rescans from the start, O(n) worst case.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackCursor {
    /// Index of the next keyframe to apply.
    next_keyframe: usize,
    /// Time of the previous `seek`, used to detect backward movement.
    time: f32,
}

impl TrackCursor {
    pub fn reset(&mut self) {
        self.next_keyframe = 0;
        self.time = 0.0;
    }

    /// Advances (or resets) the playback position to `time`, leaving
    /// `buffer` holding the authoritative pose at that time.
    pub fn seek(&mut self, clip: &AnimationClip, time: f32, buffer: &mut BoneTransforms) {
        // Time moved backward (loop wraparound or explicit seek): restart
        // the scan from an identity pose.
        if time < self.time {
            self.next_keyframe = 0;
            buffer.reset();
        }

        let keyframes = clip.keyframes();
        while let Some(kf) = keyframes.get(self.next_keyframe) {
            if kf.time > time {
                break;
            }
            buffer.set_pose(kf.bone, kf.pose);
            self.next_keyframe += 1;
        }

        self.time = time;
    }
}

/// Stateless pose evaluation: scans the clip from the start.
///
/// Equivalent to a fresh cursor's `seek`; kept as the slow-but-obvious
/// reference used by tools and tests.
pub fn sample_pose(clip: &AnimationClip, time: f32, buffer: &mut BoneTransforms) {
    buffer.reset();
    for kf in clip.keyframes() {
        if kf.time > time {
            break;
        }
        buffer.set_pose(kf.bone, kf.pose);
    }
}
