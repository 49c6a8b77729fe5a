//! Engine Core Module
//!
//! [`Engine`] is the explicit engine-state object: it owns the render
//! target registry, the camera and light managers and the animation
//! system, and is passed by reference into each subsystem's entry points.
//! There is no process-wide static state, so multiple engine instances
//! can coexist (and tests can construct throwaway ones).
//!
//! The frame loop itself is an external collaborator. It is expected to
//! call, once per frame and in order:
//!
//! 1. [`Engine::update`] — advance animation players, release the ones
//!    that stopped;
//! 2. camera / lighting pre-passes;
//! 3. the G-Buffer pass (`begin` / `render_model*` / `end`);
//! 4. lighting and post-processing passes;
//! 5. present.
//!
//! Everything here is single-threaded by construction: one update tick,
//! one render tick, no locking.

use crate::animation::AnimationSystem;
use crate::errors::Result;
use crate::renderer::backend::RenderBackend;
use crate::renderer::targets::RenderTargets;
use crate::scene::camera::CameraManager;
use crate::scene::light::LightManager;

pub struct Engine {
    pub targets: RenderTargets,
    pub cameras: CameraManager,
    pub lights: LightManager,
    pub animations: AnimationSystem,

    time: f32,
    frame_count: u64,
}

impl Engine {
    /// Creates an engine for the given initial screen size. GPU resources
    /// are only allocated as passes create their targets.
    #[must_use]
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            targets: RenderTargets::new(screen_width, screen_height),
            cameras: CameraManager::new(screen_width, screen_height),
            lights: LightManager::new(),
            animations: AnimationSystem::new(),
            time: 0.0,
            frame_count: 0,
        }
    }

    /// The per-frame update tick: advances every active animation player
    /// and recycles the ones whose playback finished.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.frame_count += 1;
        self.animations.update(dt);
    }

    /// Propagates a window resize: screen-relative render targets are
    /// recreated, normalized-viewport cameras update their projection.
    pub fn resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<()> {
        self.targets.resize(backend, screen_width, screen_height)?;
        self.cameras.resize(screen_width, screen_height);
        Ok(())
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
