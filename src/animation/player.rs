//! Animation Player
//!
//! Per-instance playback state machine over a shared, read-only
//! [`AnimationClip`]: `Stopped → Playing → {Playing, Paused} → Stopped`.
//!
//! Players are pooled by [`AnimationSystem`](crate::animation::AnimationSystem)
//! and recycled once playback reaches `Stopped`.

use std::sync::Arc;

use crate::animation::clip::AnimationClip;
use crate::animation::track::{BoneTransforms, TrackCursor};

/// How long a clip keeps playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayMode {
    /// Loop forever until explicitly stopped.
    Loop,
    /// Play exactly one clip duration, then stop.
    Once,
    /// Play for the given number of seconds of scaled time, then stop.
    Cutoff(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// A pooled playback instance.
///
/// Multiple players may reference the same clip concurrently; the clip is
/// shared read-only while each player owns its sampling cursor and bone
/// buffer exclusively.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    clip: Option<Arc<AnimationClip>>,
    state: PlaybackState,
    mode: PlayMode,
    playback_rate: f32,
    /// Local clip time, wrapped into `[0, clip.duration)`.
    time: f32,
    /// Total scaled time accumulated since `play`, never wrapped. Drives
    /// the completion cutoff.
    elapsed: f32,
    cursor: TrackCursor,
    bone_transforms: BoneTransforms,
}

impl AnimationPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clip: None,
            state: PlaybackState::Stopped,
            mode: PlayMode::Loop,
            playback_rate: 1.0,
            time: 0.0,
            elapsed: 0.0,
            cursor: TrackCursor::default(),
            bone_transforms: BoneTransforms::new(),
        }
    }

    /// Starts playback of `clip`, replacing whatever was playing.
    ///
    /// Resets local time, the elapsed accumulator, the sampling cursor and
    /// the bone buffer.
    pub fn play(&mut self, clip: Arc<AnimationClip>, rate: f32, mode: PlayMode) {
        self.clip = Some(clip);
        self.state = PlaybackState::Playing;
        self.mode = mode;
        self.playback_rate = rate;
        self.time = 0.0;
        self.elapsed = 0.0;
        self.cursor.reset();
        self.bone_transforms.reset();
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Stops playback immediately and clears the clip reference.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.clip = None;
    }

    /// Advances playback by `dt` seconds of wall time.
    ///
    /// Returns `true` exactly once, on the update that detects completion;
    /// the player is already `Stopped` (clip cleared) by the time the
    /// caller observes it, so re-playing from a completion observer is
    /// safe.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(clip) = self.clip.clone() else {
            return false;
        };

        self.elapsed += dt * self.playback_rate;

        let completed = match self.mode {
            PlayMode::Loop => false,
            PlayMode::Once => self.elapsed > clip.duration,
            PlayMode::Cutoff(cutoff) => self.elapsed > cutoff,
        };
        if completed {
            self.stop();
            return true;
        }

        self.time += dt * self.playback_rate;
        if clip.duration > 0.0 {
            // Repeated subtraction so one large step can wrap several
            // loops at once. Forward overflow only: a negative rate goes
            // below zero and is caught by the cursor's backward reset,
            // not folded back into range.
            while self.time >= clip.duration {
                self.time -= clip.duration;
            }
        }

        self.cursor.seek(&clip, self.time, &mut self.bone_transforms);
        false
    }

    /// Seeks directly to `time` without advancing the accumulator.
    pub fn set_time(&mut self, time: f32) {
        if let Some(clip) = self.clip.clone() {
            self.time = time;
            self.cursor.seek(&clip, time, &mut self.bone_transforms);
        }
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    #[must_use]
    pub fn clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    /// The pose buffer as of the last update or seek.
    #[must_use]
    pub fn bone_transforms(&self) -> &BoneTransforms {
        &self.bone_transforms
    }
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new()
    }
}
