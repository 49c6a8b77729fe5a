//! Camera Composition Tests
//!
//! Tests for:
//! - master/slave attachment rules and their failure atomicity
//! - render-target delegation from slave to master
//! - rendering-order maintenance (manager list and slave lists)
//! - main-camera resolution and the only-renderable override
//! - viewport handling (normalized vs pixel) across resizes

use ember::errors::EngineError;
use ember::renderer::backend::{Antialiasing, DepthFormat, SurfaceFormat};
use ember::renderer::targets::{RenderTargetDesc, RenderTargets, SizeMode};
use ember::renderer::HeadlessBackend;
use ember::scene::camera::{CameraManager, PixelRect, Rect};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn manager() -> CameraManager {
    CameraManager::new(1280, 720)
}

// ============================================================================
// Master/slave attachment
// ============================================================================

#[test]
fn slave_attaches_to_master() {
    let mut cameras = manager();
    let master = cameras.create();
    let slave = cameras.create();

    cameras.set_master(slave, master).unwrap();
    assert_eq!(cameras.get(slave).unwrap().master(), Some(master));
    assert_eq!(cameras.get(master).unwrap().slaves(), &[slave]);
}

#[test]
fn camera_cannot_be_its_own_master() {
    let mut cameras = manager();
    let cam = cameras.create();
    assert!(matches!(
        cameras.set_master(cam, cam),
        Err(EngineError::CameraHierarchy(_))
    ));
}

#[test]
fn hierarchy_is_one_level_deep() {
    let mut cameras = manager();
    let a = cameras.create();
    let b = cameras.create();
    let c = cameras.create();
    cameras.set_master(b, a).unwrap();

    // a has slaves, so it cannot become a slave.
    assert!(matches!(
        cameras.set_master(a, c),
        Err(EngineError::CameraHierarchy(_))
    ));
    // b has a master, so it cannot become a master.
    assert!(matches!(
        cameras.set_master(c, b),
        Err(EngineError::CameraHierarchy(_))
    ));
}

#[test]
fn failed_attachment_leaves_both_cameras_unchanged() {
    let mut cameras = manager();
    let a = cameras.create();
    let b = cameras.create();
    let c = cameras.create();
    cameras.set_master(b, a).unwrap();

    assert!(cameras.set_master(c, b).is_err());
    assert_eq!(cameras.get(c).unwrap().master(), None);
    assert!(cameras.get(b).unwrap().slaves().is_empty());
    assert_eq!(cameras.get(b).unwrap().master(), Some(a));
}

#[test]
fn reattaching_moves_the_slave_between_masters() {
    let mut cameras = manager();
    let first = cameras.create();
    let second = cameras.create();
    let slave = cameras.create();

    cameras.set_master(slave, first).unwrap();
    cameras.set_master(slave, second).unwrap();

    assert!(cameras.get(first).unwrap().slaves().is_empty());
    assert_eq!(cameras.get(second).unwrap().slaves(), &[slave]);
}

#[test]
fn clear_master_detaches_both_sides() {
    let mut cameras = manager();
    let master = cameras.create();
    let slave = cameras.create();
    cameras.set_master(slave, master).unwrap();

    cameras.clear_master(slave);
    assert_eq!(cameras.get(slave).unwrap().master(), None);
    assert!(cameras.get(master).unwrap().slaves().is_empty());
}

#[test]
fn destroying_a_master_frees_its_slaves() {
    let mut cameras = manager();
    let master = cameras.create();
    let slave = cameras.create();
    cameras.set_master(slave, master).unwrap();

    cameras.destroy(master);
    assert!(cameras.get(master).is_none());
    assert_eq!(cameras.get(slave).unwrap().master(), None);
    assert_eq!(cameras.active_count(), 1);
}

// ============================================================================
// Render-target delegation
// ============================================================================

#[test]
fn slave_reads_the_masters_render_target() {
    let mut backend = HeadlessBackend::new();
    let mut targets = RenderTargets::new(1280, 720);
    let target = targets
        .create(
            &mut backend,
            "picture-in-picture",
            RenderTargetDesc {
                format: SurfaceFormat::Rgba8,
                depth_format: DepthFormat::None,
                antialiasing: Antialiasing::Off,
                size: SizeMode::Fixed {
                    width: 256,
                    height: 256,
                },
            },
        )
        .unwrap();

    let mut cameras = manager();
    let master = cameras.create();
    let slave = cameras.create();

    // Attachment drops the slave's own target.
    cameras.set_render_target(slave, Some(target)).unwrap();
    cameras.set_master(slave, master).unwrap();
    assert_eq!(cameras.render_target(slave), None);

    cameras.set_render_target(master, Some(target)).unwrap();
    assert_eq!(cameras.render_target(slave), Some(target));
    assert_eq!(cameras.render_target(master), Some(target));
}

#[test]
fn assigning_a_target_on_a_slave_fails() {
    let mut cameras = manager();
    let master = cameras.create();
    let slave = cameras.create();
    cameras.set_master(slave, master).unwrap();

    assert!(matches!(
        cameras.set_render_target(slave, None),
        Err(EngineError::CameraHierarchy(_))
    ));
}

// ============================================================================
// Rendering order
// ============================================================================

#[test]
fn ordered_list_tracks_rendering_order() {
    let mut cameras = manager();
    let a = cameras.create();
    let b = cameras.create();
    let c = cameras.create();

    cameras.set_rendering_order(a, 30).unwrap();
    cameras.set_rendering_order(b, 10).unwrap();
    cameras.set_rendering_order(c, 20).unwrap();
    assert_eq!(cameras.ordered(), &[b, c, a]);

    cameras.set_rendering_order(b, 40).unwrap();
    assert_eq!(cameras.ordered(), &[c, a, b]);
}

#[test]
fn equal_orders_keep_insertion_order() {
    let mut cameras = manager();
    let a = cameras.create();
    let b = cameras.create();
    let c = cameras.create();

    // All default to order 0; the sort is stable.
    assert_eq!(cameras.ordered(), &[a, b, c]);
    cameras.set_rendering_order(b, 0).unwrap();
    assert_eq!(cameras.ordered(), &[a, b, c]);
}

#[test]
fn slave_lists_stay_sorted_by_order() {
    let mut cameras = manager();
    let master = cameras.create();
    let s1 = cameras.create();
    let s2 = cameras.create();

    cameras.set_rendering_order(s1, 5).unwrap();
    cameras.set_rendering_order(s2, 1).unwrap();
    cameras.set_master(s1, master).unwrap();
    cameras.set_master(s2, master).unwrap();
    assert_eq!(cameras.get(master).unwrap().slaves(), &[s2, s1]);

    cameras.set_rendering_order(s2, 9).unwrap();
    assert_eq!(cameras.get(master).unwrap().slaves(), &[s1, s2]);
}

// ============================================================================
// Main-camera resolution
// ============================================================================

#[test]
fn main_camera_is_the_highest_ordered_visible_master() {
    let mut cameras = manager();
    let low = cameras.create();
    let high = cameras.create();
    cameras.set_rendering_order(low, 1).unwrap();
    cameras.set_rendering_order(high, 2).unwrap();

    assert_eq!(cameras.main_camera(), Some(high));

    cameras.get_mut(high).unwrap().visible = false;
    assert_eq!(cameras.main_camera(), Some(low));
}

#[test]
fn slaves_never_resolve_as_main_camera() {
    let mut cameras = manager();
    let master = cameras.create();
    let slave = cameras.create();
    cameras.set_rendering_order(slave, 100).unwrap();
    cameras.set_master(slave, master).unwrap();

    assert_eq!(cameras.main_camera(), Some(master));
}

#[test]
fn only_renderable_override_ignores_visibility() {
    let mut cameras = manager();
    let a = cameras.create();
    let b = cameras.create();

    cameras.get_mut(b).unwrap().visible = false;
    cameras.set_only_renderable(Some(b));
    assert_eq!(cameras.main_camera(), Some(b));

    cameras.set_only_renderable(None);
    assert_eq!(cameras.main_camera(), Some(a));
}

#[test]
fn destroying_the_override_camera_clears_it() {
    let mut cameras = manager();
    let a = cameras.create();
    let b = cameras.create();
    cameras.set_only_renderable(Some(b));

    cameras.destroy(b);
    assert_eq!(cameras.main_camera(), Some(a));
}

#[test]
fn no_main_camera_when_nothing_qualifies() {
    let mut cameras = manager();
    assert_eq!(cameras.main_camera(), None);

    let cam = cameras.create();
    cameras.get_mut(cam).unwrap().visible = false;
    assert_eq!(cameras.main_camera(), None);
}

// ============================================================================
// Viewports & resize
// ============================================================================

#[test]
fn fresh_camera_takes_the_screen_aspect() {
    let mut cameras = manager();
    let cam = cameras.create();
    assert!(approx(cameras.get(cam).unwrap().aspect, 1280.0 / 720.0));
}

#[test]
fn normalized_viewport_resolves_to_pixels() {
    let mut cameras = manager();
    let cam = cameras.create();
    cameras
        .set_normalized_viewport(
            cam,
            Rect {
                x: 0.5,
                y: 0.0,
                width: 0.5,
                height: 1.0,
            },
        )
        .unwrap();

    let px = cameras.viewport_in_pixels(cam).unwrap();
    assert_eq!(
        px,
        PixelRect {
            x: 640,
            y: 0,
            width: 640,
            height: 720
        }
    );
    // Half-width viewport halves the aspect ratio.
    assert!(approx(cameras.get(cam).unwrap().aspect, 640.0 / 720.0));
}

#[test]
fn resize_tracks_normalized_viewports_only() {
    let mut cameras = manager();
    let normalized = cameras.create();
    let pixel = cameras.create();
    cameras.set_normalized_viewport(normalized, Rect::FULL).unwrap();
    cameras
        .set_pixel_viewport(
            pixel,
            PixelRect {
                x: 0,
                y: 0,
                width: 320,
                height: 240,
            },
        )
        .unwrap();

    cameras.resize(1920, 1080);

    let px = cameras.viewport_in_pixels(normalized).unwrap();
    assert_eq!(px.width, 1920);
    assert_eq!(px.height, 1080);
    assert!(approx(cameras.get(normalized).unwrap().aspect, 1920.0 / 1080.0));

    // The pixel viewport is pinned.
    let px = cameras.viewport_in_pixels(pixel).unwrap();
    assert_eq!(px.width, 320);
    assert!(approx(cameras.get(pixel).unwrap().aspect, 320.0 / 240.0));
}

#[test]
fn projection_follows_the_aspect_ratio() {
    let mut cameras = manager();
    let cam = cameras.create();
    let before = cameras.get(cam).unwrap().projection_matrix();

    cameras.resize(720, 1280);
    let after = cameras.get(cam).unwrap().projection_matrix();
    assert_ne!(before, after);
}
