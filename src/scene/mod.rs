pub mod camera;
pub mod light;

pub use camera::{Camera, CameraManager, CullingMask, PixelRect, Rect, Viewport};
pub use light::{Light, LightKind, LightManager};
