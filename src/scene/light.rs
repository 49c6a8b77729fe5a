use glam::Vec3;
use uuid::Uuid;

use crate::pool::{ObjectPool, PoolHandle};

/// Default number of pre-constructed lights.
const LIGHT_POOL_CAPACITY: usize = 32;

/// Per-kind light data. A small sum type instead of a class hierarchy:
/// the kinds differ only in a handful of fields.
#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional {
        direction: Vec3,
    },
    Point {
        position: Vec3,
        range: f32,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        range: f32,
        inner_cone: f32,
        outer_cone: f32,
    },
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub enabled: bool,
}

impl Light {
    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Ambient,
            enabled: true,
        }
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32, direction: Vec3) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Directional {
                direction: direction.normalize_or_zero(),
            },
            enabled: true,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, position: Vec3, range: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Point { position, range },
            enabled: true,
        }
    }

    #[must_use]
    pub fn new_spot(
        color: Vec3,
        intensity: f32,
        position: Vec3,
        direction: Vec3,
        range: f32,
        inner_cone: f32,
        outer_cone: f32,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Spot {
                position,
                direction: direction.normalize_or_zero(),
                range,
                inner_cone,
                outer_cone,
            },
            enabled: true,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new_ambient(Vec3::ONE, 0.0)
    }
}

/// Pooled light storage: one tagged list for all kinds, with per-kind
/// iteration for the lighting passes.
pub struct LightManager {
    pool: ObjectPool<Light>,
}

impl LightManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: ObjectPool::new("lights", LIGHT_POOL_CAPACITY),
        }
    }

    /// Activates a pooled light initialized to `light`.
    pub fn add(&mut self, light: Light) -> PoolHandle {
        let handle = self.pool.fetch();
        if let Some(slot) = self.pool.get_mut(handle) {
            *slot = light;
        }
        handle
    }

    pub fn remove(&mut self, handle: PoolHandle) {
        self.pool.release(handle);
    }

    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&Light> {
        self.pool.get(handle)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut Light> {
        self.pool.get_mut(handle)
    }

    /// Every active, enabled light.
    pub fn iter_enabled(&self) -> impl Iterator<Item = (PoolHandle, &Light)> {
        self.pool.iter_active().filter(|(_, l)| l.enabled)
    }

    /// Active, enabled lights of one kind (e.g. all point lights for the
    /// point-light pass).
    pub fn iter_kind(
        &self,
        matches: impl Fn(&LightKind) -> bool + Copy,
    ) -> impl Iterator<Item = (PoolHandle, &Light)> {
        self.iter_enabled().filter(move |(_, l)| matches(&l.kind))
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }
}

impl Default for LightManager {
    fn default() -> Self {
        Self::new()
    }
}
