//! Render Target Registry
//!
//! Owns every render target in the engine and tracks which of them are
//! currently bound to the device (at most [`MAX_BOUND_TARGETS`] slots).
//!
//! # Bind/unbind nesting
//!
//! Binding is strict, not a stack: enabling while anything is bound is an
//! invalid operation, and disabling must name exactly the target(s)
//! currently bound. Unbinding *resolves* a target — only then is its
//! texture safely readable, since until that point the GPU pass may still
//! be writing to it.
//!
//! ```text
//!            enable            disable
//!   Idle ───────────► Bound ───────────► Resolved
//!     ▲                                     │
//!     └────────────── resize ◄──────────────┘
//! ```
//!
//! # Screen-relative sizing
//!
//! Targets created with [`SizeMode::ScreenRelative`] are disposed and
//! recreated at the new computed size on every [`RenderTargets::resize`];
//! fixed-size targets are unaffected.

use glam::Vec4;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{EngineError, Result};
use crate::renderer::backend::{
    Antialiasing, DepthFormat, RenderBackend, SurfaceDesc, SurfaceFormat, SurfaceId, TextureId,
};

/// Number of simultaneously bindable device target slots.
pub const MAX_BOUND_TARGETS: usize = 4;

/// Registry-scoped handle to a render target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TargetId(u32);

/// How a target's pixel size is determined.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SizeMode {
    /// Fixed pixel dimensions; ignores window resizes.
    Fixed { width: u32, height: u32 },
    /// A fraction of the screen size; recreated on resize.
    ScreenRelative { scale: f32 },
}

#[derive(Clone, Debug)]
pub struct RenderTargetDesc {
    pub format: SurfaceFormat,
    pub depth_format: DepthFormat,
    pub antialiasing: Antialiasing,
    pub size: SizeMode,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum TargetState {
    /// Fresh or recreated; contents undefined, not readable.
    Idle,
    /// Currently bound as a device target; being written.
    Bound,
    /// Unbound after writing; texture readable.
    Resolved,
}

struct RenderTarget {
    label: String,
    desc: RenderTargetDesc,
    surface: SurfaceId,
    width: u32,
    height: u32,
    state: TargetState,
}

/// An immutable multi-target bind descriptor.
///
/// Built once (outside the frame loop) so per-frame binds don't allocate.
#[derive(Clone, Debug)]
pub struct MultiTargetBinding {
    targets: SmallVec<[TargetId; MAX_BOUND_TARGETS]>,
}

impl MultiTargetBinding {
    /// Validates and freezes a set of up to 4 targets.
    pub fn new(targets: &[TargetId]) -> Result<Self> {
        if targets.is_empty() || targets.len() > MAX_BOUND_TARGETS {
            return Err(EngineError::InvalidOperation(format!(
                "a multi-target binding holds 1 to {MAX_BOUND_TARGETS} targets, got {}",
                targets.len()
            )));
        }
        Ok(Self {
            targets: SmallVec::from_slice(targets),
        })
    }

    #[must_use]
    pub fn targets(&self) -> &[TargetId] {
        &self.targets
    }
}

/// Central render-target owner plus the device bind-slot tracker.
pub struct RenderTargets {
    targets: FxHashMap<TargetId, RenderTarget>,
    bound: SmallVec<[TargetId; MAX_BOUND_TARGETS]>,
    screen_width: u32,
    screen_height: u32,
    next_id: u32,
}

impl RenderTargets {
    #[must_use]
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            targets: FxHashMap::default(),
            bound: SmallVec::new(),
            screen_width,
            screen_height,
            next_id: 0,
        }
    }

    fn resolve_size(&self, size: SizeMode) -> (u32, u32) {
        match size {
            SizeMode::Fixed { width, height } => (width, height),
            SizeMode::ScreenRelative { scale } => (
                ((self.screen_width as f32 * scale).round() as u32).max(1),
                ((self.screen_height as f32 * scale).round() as u32).max(1),
            ),
        }
    }

    /// Creates a target and its backing surface.
    pub fn create(
        &mut self,
        backend: &mut dyn RenderBackend,
        label: impl Into<String>,
        desc: RenderTargetDesc,
    ) -> Result<TargetId> {
        let label = label.into();
        let (width, height) = self.resolve_size(desc.size);
        let surface = backend.create_surface(
            &label,
            &SurfaceDesc {
                width,
                height,
                format: desc.format,
                depth_format: desc.depth_format,
                antialiasing: desc.antialiasing,
            },
        )?;

        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.targets.insert(
            id,
            RenderTarget {
                label,
                desc,
                surface,
                width,
                height,
                state: TargetState::Idle,
            },
        );
        Ok(id)
    }

    /// Destroys a target and its surface. Bound targets cannot be
    /// destroyed.
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend, id: TargetId) -> Result<()> {
        let target = self.require(id)?;
        if target.state == TargetState::Bound {
            return Err(EngineError::InvalidOperation(format!(
                "destroying render target '{}' while it is bound",
                target.label
            )));
        }
        let target = self.targets.remove(&id).expect("checked above");
        backend.destroy_surface(target.surface);
        Ok(())
    }

    fn require(&self, id: TargetId) -> Result<&RenderTarget> {
        self.targets
            .get(&id)
            .ok_or_else(|| EngineError::InvalidOperation(format!("unknown render target {id:?}")))
    }

    /// Pixel size of a target.
    pub fn size(&self, id: TargetId) -> Result<(u32, u32)> {
        self.require(id).map(|t| (t.width, t.height))
    }

    // ── Binding ────────────────────────────────────────────────────────

    /// Binds a single target. Fails if anything is already bound — there
    /// is no implicit stacking.
    pub fn enable(&mut self, backend: &mut dyn RenderBackend, id: TargetId) -> Result<()> {
        self.check_nothing_bound()?;
        let surface = self.require(id)?.surface;
        backend.bind_surfaces(&[surface])?;
        self.mark_bound(&[id]);
        Ok(())
    }

    /// Atomically binds all targets of a prebuilt binding.
    pub fn enable_binding(
        &mut self,
        backend: &mut dyn RenderBackend,
        binding: &MultiTargetBinding,
    ) -> Result<()> {
        self.check_nothing_bound()?;
        let mut surfaces: SmallVec<[SurfaceId; MAX_BOUND_TARGETS]> = SmallVec::new();
        for &id in binding.targets() {
            surfaces.push(self.require(id)?.surface);
        }
        backend.bind_surfaces(&surfaces)?;
        self.mark_bound(binding.targets());
        Ok(())
    }

    fn check_nothing_bound(&self) -> Result<()> {
        if let Some(&first) = self.bound.first() {
            let label = self
                .targets
                .get(&first)
                .map_or("<destroyed>", |t| t.label.as_str());
            return Err(EngineError::InvalidOperation(format!(
                "enabling a render target while '{label}' is still bound"
            )));
        }
        Ok(())
    }

    fn mark_bound(&mut self, ids: &[TargetId]) {
        self.bound = SmallVec::from_slice(ids);
        for id in ids {
            if let Some(t) = self.targets.get_mut(id) {
                t.state = TargetState::Bound;
            }
        }
    }

    /// Clears the currently bound target(s). Depth is cleared along with
    /// color iff the slot-0 target carries a depth buffer.
    pub fn clear(&mut self, backend: &mut dyn RenderBackend, color: Vec4) -> Result<()> {
        let Some(&first) = self.bound.first() else {
            return Err(EngineError::InvalidOperation(
                "clearing with no render target bound".to_string(),
            ));
        };
        let clear_depth = self.require(first)?.desc.depth_format != DepthFormat::None;
        backend.clear(color, clear_depth);
        Ok(())
    }

    /// Unbinds a single target, resolving it, and restores the back
    /// buffer. Must name exactly the bound target.
    pub fn disable(&mut self, backend: &mut dyn RenderBackend, id: TargetId) -> Result<()> {
        if self.bound.as_slice() != [id] {
            return Err(EngineError::InvalidOperation(
                "disabling a render target that is not the currently bound one".to_string(),
            ));
        }
        self.mark_resolved(backend);
        Ok(())
    }

    /// Unbinds a multi-target binding; must match the bound set exactly.
    pub fn disable_binding(
        &mut self,
        backend: &mut dyn RenderBackend,
        binding: &MultiTargetBinding,
    ) -> Result<()> {
        if self.bound.as_slice() != binding.targets() {
            return Err(EngineError::InvalidOperation(
                "disabling a binding that does not match the currently bound targets".to_string(),
            ));
        }
        self.mark_resolved(backend);
        Ok(())
    }

    fn mark_resolved(&mut self, backend: &mut dyn RenderBackend) {
        for id in std::mem::take(&mut self.bound) {
            if let Some(t) = self.targets.get_mut(&id) {
                t.state = TargetState::Resolved;
            }
        }
        backend.bind_backbuffer();
    }

    /// The readable texture of a resolved target.
    ///
    /// Reading before the target has been disabled is a programming error:
    /// the GPU pass may still be writing to it.
    pub fn texture(&self, backend: &dyn RenderBackend, id: TargetId) -> Result<TextureId> {
        let target = self.require(id)?;
        if target.state != TargetState::Resolved {
            return Err(EngineError::InvalidOperation(format!(
                "reading render target '{}' before it has been resolved",
                target.label
            )));
        }
        Ok(backend.surface_texture(target.surface))
    }

    // ── Resize ─────────────────────────────────────────────────────────

    /// Recreates every screen-relative target at the new screen size.
    pub fn resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<()> {
        self.screen_width = screen_width;
        self.screen_height = screen_height;

        let relative: Vec<TargetId> = self
            .targets
            .iter()
            .filter(|(_, t)| matches!(t.desc.size, SizeMode::ScreenRelative { .. }))
            .map(|(&id, _)| id)
            .collect();

        for id in relative {
            let (width, height) = {
                let t = &self.targets[&id];
                self.resolve_size(t.desc.size)
            };
            let t = self.targets.get_mut(&id).expect("collected above");
            log::info!(
                "Render target '{}' resized: {}x{} -> {}x{}",
                t.label,
                t.width,
                t.height,
                width,
                height
            );
            backend.destroy_surface(t.surface);
            let surface = backend.create_surface(
                &t.label,
                &SurfaceDesc {
                    width,
                    height,
                    format: t.desc.format,
                    depth_format: t.desc.depth_format,
                    antialiasing: t.desc.antialiasing,
                },
            )?;
            t.surface = surface;
            t.width = width;
            t.height = height;
            t.state = TargetState::Idle;
        }
        Ok(())
    }

    #[must_use]
    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    /// Total number of registered targets.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}
