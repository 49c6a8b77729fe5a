//! Camera Composition
//!
//! Pooled cameras with master/slave grouping for split-screen, per-camera
//! viewport/projection computation and rendering-order resolution.
//!
//! # Master/slave invariant
//!
//! The hierarchy is exactly one level deep: a camera can have slaves or a
//! master, never both. The master owns the shared render target and size;
//! slaves mirror them read-only. Violating assignments fail and leave
//! both cameras untouched.
//!
//! # Ordering
//!
//! The manager keeps one list of active cameras sorted ascending by
//! rendering order, plus each master's slave list in the same order.
//! Every order mutation re-sorts only the affected lists.

use std::borrow::Cow;

use bitflags::bitflags;
use glam::Mat4;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::errors::{EngineError, Result};
use crate::pool::{ObjectPool, PoolHandle};
use crate::renderer::targets::TargetId;

/// Default number of pre-constructed cameras.
const CAMERA_POOL_CAPACITY: usize = 8;

bitflags! {
    /// Which scene layers a camera renders.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CullingMask: u32 {
        const LAYER_0 = 1;
        const LAYER_1 = 1 << 1;
        const LAYER_2 = 1 << 2;
        const LAYER_3 = 1 << 3;
        const ALL = u32::MAX;
    }
}

/// A rectangle in normalized clip space, `(0,0)` top-left, `1.0` spanning
/// the full screen axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

/// A rectangle in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A camera's viewport, in whichever representation was last set.
///
/// Normalized viewports track window resizes automatically; pixel
/// viewports do not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    Normalized(Rect),
    Pixels(PixelRect),
}

impl Viewport {
    /// Resolves to pixels against the given screen size.
    #[must_use]
    pub fn to_pixels(&self, screen_width: u32, screen_height: u32) -> PixelRect {
        match *self {
            Viewport::Pixels(rect) => rect,
            Viewport::Normalized(rect) => PixelRect {
                x: (rect.x * screen_width as f32).round() as u32,
                y: (rect.y * screen_height as f32).round() as u32,
                width: ((rect.width * screen_width as f32).round() as u32).max(1),
                height: ((rect.height * screen_height as f32).round() as u32).max(1),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: Uuid,
    pub name: Cow<'static, str>,

    // === Projection ===
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // Cached matrices, recomputed on assignment; read-only for the
    // renderer.
    pub(crate) world_matrix: Mat4,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,

    pub(crate) viewport: Viewport,
    pub(crate) render_target: Option<TargetId>,
    pub(crate) rendering_order: i32,
    pub culling_mask: CullingMask,
    pub visible: bool,

    pub(crate) master: Option<PoolHandle>,
    pub(crate) slaves: SmallVec<[PoolHandle; 4]>,
}

impl Camera {
    #[must_use]
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            uuid: Uuid::new_v4(),
            name: Cow::Borrowed("Camera"),
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            world_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            viewport: Viewport::Normalized(Rect::FULL),
            render_target: None,
            rendering_order: 0,
            culling_mask: CullingMask::ALL,
            visible: true,
            master: None,
            slaves: SmallVec::new(),
        };
        cam.update_projection_matrix();
        cam
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
    }

    /// Derives the view matrix from the owning transform's world matrix.
    pub fn set_world_matrix(&mut self, world: Mat4) {
        self.world_matrix = world;
        self.view_matrix = world.inverse();
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[must_use]
    pub fn rendering_order(&self) -> i32 {
        self.rendering_order
    }

    #[must_use]
    pub fn master(&self) -> Option<PoolHandle> {
        self.master
    }

    #[must_use]
    pub fn slaves(&self) -> &[PoolHandle] {
        &self.slaves
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(60.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// Owner of the pooled cameras and their composition rules.
pub struct CameraManager {
    pool: ObjectPool<Camera>,
    /// Active cameras sorted ascending by rendering order.
    ordered: Vec<PoolHandle>,
    /// When set, overrides main-camera resolution unconditionally.
    only_renderable: Option<PoolHandle>,
    screen_width: u32,
    screen_height: u32,
}

impl CameraManager {
    #[must_use]
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            pool: ObjectPool::new("cameras", CAMERA_POOL_CAPACITY),
            ordered: Vec::new(),
            only_renderable: None,
            screen_width,
            screen_height,
        }
    }

    /// Fetches a camera from the pool, reset to defaults with the current
    /// screen aspect.
    pub fn create(&mut self) -> PoolHandle {
        let handle = self.pool.fetch();
        let aspect = self.screen_width as f32 / self.screen_height.max(1) as f32;
        if let Some(cam) = self.pool.get_mut(handle) {
            // Pooled instances carry stale state from their last life.
            *cam = Camera::default();
            cam.aspect = aspect;
            cam.update_projection_matrix();
        }
        self.ordered.push(handle);
        self.sort_ordered();
        handle
    }

    /// Releases a camera, detaching it from any master/slave grouping.
    pub fn destroy(&mut self, handle: PoolHandle) {
        let (master, slaves) = match self.pool.get(handle) {
            Some(cam) => (cam.master, cam.slaves.clone()),
            None => return,
        };

        if let Some(master) = master {
            if let Some(m) = self.pool.get_mut(master) {
                m.slaves.retain(|h| *h != handle);
            }
        }
        for slave in slaves {
            if let Some(s) = self.pool.get_mut(slave) {
                s.master = None;
            }
        }

        if self.only_renderable == Some(handle) {
            self.only_renderable = None;
        }
        self.ordered.retain(|&h| h != handle);
        self.pool.release(handle);
    }

    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&Camera> {
        self.pool.get(handle)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut Camera> {
        self.pool.get_mut(handle)
    }

    fn require(&self, handle: PoolHandle) -> Result<&Camera> {
        self.pool
            .get(handle)
            .ok_or_else(|| EngineError::InvalidOperation(format!("unknown camera {handle:?}")))
    }

    // ── Master/slave composition ───────────────────────────────────────

    /// Attaches `slave` to `master`.
    ///
    /// Fails — leaving both cameras unchanged — when `slave` already has
    /// slaves of its own, when `master` itself has a master, or when the
    /// two are the same camera. On success the slave's local render
    /// target is dropped; target and size reads delegate to the master
    /// from then on.
    pub fn set_master(&mut self, slave: PoolHandle, master: PoolHandle) -> Result<()> {
        if slave == master {
            return Err(EngineError::CameraHierarchy(
                "a camera cannot be its own master".to_string(),
            ));
        }
        let slave_cam = self.require(slave)?;
        if !slave_cam.slaves.is_empty() {
            return Err(EngineError::CameraHierarchy(format!(
                "camera '{}' has slaves and cannot become a slave itself",
                slave_cam.name
            )));
        }
        let master_cam = self.require(master)?;
        if master_cam.master.is_some() {
            return Err(EngineError::CameraHierarchy(format!(
                "camera '{}' has a master and cannot become a master itself",
                master_cam.name
            )));
        }

        // Detach from a previous master first.
        if let Some(previous) = self.pool.get(slave).and_then(|c| c.master) {
            if let Some(p) = self.pool.get_mut(previous) {
                p.slaves.retain(|h| *h != slave);
            }
        }

        let cam = self.pool.get_mut(slave).expect("validated above");
        cam.master = Some(master);
        // The master owns the shared target from here on.
        cam.render_target = None;

        let m = self.pool.get_mut(master).expect("validated above");
        m.slaves.push(slave);
        self.sort_slaves(master);
        Ok(())
    }

    /// Detaches a slave from its master.
    pub fn clear_master(&mut self, slave: PoolHandle) {
        let Some(master) = self.pool.get(slave).and_then(|c| c.master) else {
            return;
        };
        if let Some(m) = self.pool.get_mut(master) {
            m.slaves.retain(|h| *h != slave);
        }
        if let Some(s) = self.pool.get_mut(slave) {
            s.master = None;
        }
    }

    /// The render target a camera draws into: its own, or its master's.
    #[must_use]
    pub fn render_target(&self, handle: PoolHandle) -> Option<TargetId> {
        let cam = self.pool.get(handle)?;
        match cam.master {
            Some(master) => self.pool.get(master)?.render_target,
            None => cam.render_target,
        }
    }

    /// Assigns a camera's render target. Slaves mirror their master's
    /// target read-only, so assigning on a slave fails.
    pub fn set_render_target(
        &mut self,
        handle: PoolHandle,
        target: Option<TargetId>,
    ) -> Result<()> {
        let cam = self.require(handle)?;
        if cam.master.is_some() {
            return Err(EngineError::CameraHierarchy(format!(
                "camera '{}' is a slave; the master owns the render target",
                cam.name
            )));
        }
        self.pool.get_mut(handle).expect("validated above").render_target = target;
        Ok(())
    }

    // ── Ordering ───────────────────────────────────────────────────────

    /// Changes a camera's rendering order and re-sorts the affected
    /// lists: the manager's ordered list, and the slave list of the
    /// camera's master when it has one.
    pub fn set_rendering_order(&mut self, handle: PoolHandle, order: i32) -> Result<()> {
        let master = {
            let cam = self.require(handle)?;
            cam.master
        };
        self.pool.get_mut(handle).expect("validated above").rendering_order = order;
        self.sort_ordered();
        if let Some(master) = master {
            self.sort_slaves(master);
        }
        Ok(())
    }

    fn sort_ordered(&mut self) {
        let pool = &self.pool;
        self.ordered
            .sort_by_key(|&h| pool.get(h).map_or(0, |c| c.rendering_order));
    }

    fn sort_slaves(&mut self, master: PoolHandle) {
        let Some(m) = self.pool.get_mut(master) else {
            return;
        };
        let mut slaves = std::mem::take(&mut m.slaves);
        slaves.sort_by_key(|&h| self.pool.get(h).map_or(0, |c| c.rendering_order));
        if let Some(m) = self.pool.get_mut(master) {
            m.slaves = slaves;
        }
    }

    /// Active cameras in ascending rendering order.
    #[must_use]
    pub fn ordered(&self) -> &[PoolHandle] {
        &self.ordered
    }

    // ── Main-camera resolution ─────────────────────────────────────────

    /// Forces main-camera resolution to return `camera` unconditionally
    /// (visibility ignored), or clears the override.
    pub fn set_only_renderable(&mut self, camera: Option<PoolHandle>) {
        self.only_renderable = camera;
    }

    /// The camera the frame composes last: the only-renderable override
    /// when set, otherwise the highest-ordered visible camera without a
    /// master.
    #[must_use]
    pub fn main_camera(&self) -> Option<PoolHandle> {
        if let Some(only) = self.only_renderable {
            return Some(only);
        }
        self.ordered
            .iter()
            .rev()
            .copied()
            .find(|&h| {
                self.pool
                    .get(h)
                    .is_some_and(|c| c.visible && c.master.is_none())
            })
    }

    // ── Viewports & resize ─────────────────────────────────────────────

    /// Sets a normalized viewport; it will track window resizes.
    pub fn set_normalized_viewport(&mut self, handle: PoolHandle, rect: Rect) -> Result<()> {
        self.require(handle)?;
        let (sw, sh) = (self.screen_width, self.screen_height);
        let cam = self.pool.get_mut(handle).expect("validated above");
        cam.viewport = Viewport::Normalized(rect);
        cam.aspect = (sw as f32 * rect.width) / (sh as f32 * rect.height).max(1.0);
        cam.update_projection_matrix();
        Ok(())
    }

    /// Sets a fixed pixel viewport; it will ignore window resizes.
    pub fn set_pixel_viewport(&mut self, handle: PoolHandle, rect: PixelRect) -> Result<()> {
        self.require(handle)?;
        let cam = self.pool.get_mut(handle).expect("validated above");
        cam.viewport = Viewport::Pixels(rect);
        cam.aspect = rect.width as f32 / rect.height.max(1) as f32;
        cam.update_projection_matrix();
        Ok(())
    }

    /// A camera's viewport resolved to pixels against the current screen.
    pub fn viewport_in_pixels(&self, handle: PoolHandle) -> Result<PixelRect> {
        let cam = self.require(handle)?;
        Ok(cam.viewport.to_pixels(self.screen_width, self.screen_height))
    }

    /// Propagates a window resize: normalized-viewport cameras update
    /// their aspect ratio and projection, pixel-viewport cameras are
    /// untouched.
    pub fn resize(&mut self, screen_width: u32, screen_height: u32) {
        self.screen_width = screen_width;
        self.screen_height = screen_height;
        for (_, cam) in self.pool.iter_active_mut() {
            if let Viewport::Normalized(rect) = cam.viewport {
                cam.aspect = (screen_width as f32 * rect.width)
                    / (screen_height as f32 * rect.height).max(1.0);
                cam.update_projection_matrix();
            }
        }
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }
}
