//! Animation System
//!
//! Owns the clip registry and the pooled [`AnimationPlayer`] instances,
//! and drives them once per frame in the order the frame driver expects:
//! advance every active player, then release the ones that stopped.
//!
//! Completion is surfaced by polling, not callbacks: after
//! [`AnimationSystem::update`], [`completed`](AnimationSystem::completed)
//! holds the handles whose playback finished this frame. A caller may
//! immediately start a new clip — the completed player has already been
//! returned to the pool.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::animation::clip::AnimationClip;
use crate::animation::player::{AnimationPlayer, PlayMode, PlaybackState};
use crate::errors::{EngineError, Result};
use crate::pool::{ObjectPool, PoolHandle};

/// Default number of pre-constructed players.
const PLAYER_POOL_CAPACITY: usize = 16;

pub struct AnimationSystem {
    clips: FxHashMap<String, Arc<AnimationClip>>,
    players: ObjectPool<AnimationPlayer>,
    completed: Vec<PoolHandle>,
    /// Scratch list of players to release this tick; reused across frames.
    finished: Vec<PoolHandle>,
}

impl AnimationSystem {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clips: FxHashMap::default(),
            players: ObjectPool::new("animation players", PLAYER_POOL_CAPACITY),
            completed: Vec::new(),
            finished: Vec::new(),
        }
    }

    /// Registers a clip under its name. A clip with the same name is
    /// replaced; players already referencing the old clip keep it alive.
    pub fn register_clip(&mut self, clip: AnimationClip) -> Arc<AnimationClip> {
        let clip = Arc::new(clip);
        self.clips.insert(clip.name.clone(), Arc::clone(&clip));
        clip
    }

    #[must_use]
    pub fn clip(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.clips.get(name)
    }

    /// Fetches a pooled player and starts the named clip on it.
    pub fn play(&mut self, name: &str, rate: f32, mode: PlayMode) -> Result<PoolHandle> {
        let clip = self
            .clips
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::ClipNotFound(name.to_string()))?;

        let handle = self.players.fetch();
        if let Some(player) = self.players.get_mut(handle) {
            player.play(clip, rate, mode);
        }
        Ok(handle)
    }

    #[must_use]
    pub fn player(&self, handle: PoolHandle) -> Option<&AnimationPlayer> {
        self.players.get(handle)
    }

    pub fn player_mut(&mut self, handle: PoolHandle) -> Option<&mut AnimationPlayer> {
        self.players.get_mut(handle)
    }

    /// Stops a player explicitly and returns it to the pool.
    pub fn stop(&mut self, handle: PoolHandle) {
        if let Some(player) = self.players.get_mut(handle) {
            player.stop();
        }
        self.players.release(handle);
    }

    /// Advances every active player by `dt`, then releases the players
    /// that reached `Stopped` during this tick.
    pub fn update(&mut self, dt: f32) {
        self.completed.clear();
        self.finished.clear();

        for (handle, player) in self.players.iter_active_mut() {
            if player.update(dt) {
                self.completed.push(handle);
                self.finished.push(handle);
            } else if player.state() == PlaybackState::Stopped {
                // Stopped out-of-band (explicit stop without release).
                self.finished.push(handle);
            }
        }

        let mut finished = std::mem::take(&mut self.finished);
        for &handle in &finished {
            self.players.release(handle);
        }
        finished.clear();
        self.finished = finished;
    }

    /// Handles whose playback completed during the last [`update`](Self::update).
    ///
    /// The handles no longer refer to active players; they identify which
    /// playbacks ended so game code can react (chain clips, despawn, ...).
    #[must_use]
    pub fn completed(&self) -> &[PoolHandle] {
        &self.completed
    }

    /// Number of players currently playing or paused.
    #[must_use]
    pub fn active_player_count(&self) -> usize {
        self.players.active_count()
    }
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new()
    }
}
