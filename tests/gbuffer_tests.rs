//! G-Buffer Pass Tests
//!
//! Tests for:
//! - the begin / render_model / end session protocol and stage-tagged
//!   failures
//! - parameter upload suppression (within a session and across frames)
//! - skinned vs rigid technique selection and bone palette uploads
//! - target resolution at end of session

use glam::{Mat4, Vec3, Vec4};

use ember::animation::track::BoneTransforms;
use ember::errors::EngineError;
use ember::renderer::backend::{MeshId, ParamHandle, RenderBackend, ShaderId};
use ember::renderer::gbuffer::GBufferPass;
use ember::renderer::headless::{DeviceEvent, HeadlessBackend};
use ember::renderer::model::Model;
use ember::renderer::targets::RenderTargets;

const SHADER: ShaderId = ShaderId(7);
const FAR_PLANE: f32 = 500.0;

struct Fixture {
    backend: HeadlessBackend,
    targets: RenderTargets,
    pass: GBufferPass,
}

fn fixture() -> Fixture {
    let mut backend = HeadlessBackend::new();
    let mut targets = RenderTargets::new(1280, 720);
    let pass = GBufferPass::new(&mut backend, &mut targets, SHADER).unwrap();
    Fixture {
        backend,
        targets,
        pass,
    }
}

fn view() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y)
}

fn projection() -> Mat4 {
    Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, FAR_PLANE)
}

/// Parameter handles are stable per (shader, name), so looking one up
/// after the pass built its cache returns the cache's handle.
fn param(backend: &mut HeadlessBackend, name: &str) -> ParamHandle {
    backend.parameter(SHADER, name).unwrap()
}

fn selected_techniques(backend: &HeadlessBackend) -> Vec<String> {
    backend
        .events()
        .iter()
        .filter_map(|e| match e {
            DeviceEvent::SelectTechnique { technique, .. } => Some(technique.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Session protocol
// ============================================================================

#[test]
fn construction_creates_three_screen_sized_targets() {
    let f = fixture();
    assert_eq!(f.targets.target_count(), 3);
    assert_eq!(f.backend.live_surface_count(), 3);
    for id in f.pass.targets() {
        assert_eq!(f.targets.size(id).unwrap(), (1280, 720));
    }
}

#[test]
fn begin_binds_clears_white_and_opens_the_session() {
    let mut f = fixture();
    f.backend.clear_events();
    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();

    assert!(f.pass.is_in_session());
    // Slot 0 carries the pass depth buffer, so the clear includes depth.
    assert!(f.backend.events().iter().any(|e| matches!(
        e,
        DeviceEvent::Clear {
            color,
            depth: true
        } if *color == Vec4::ONE
    )));
    assert!(f
        .backend
        .events()
        .iter()
        .any(|e| matches!(e, DeviceEvent::BindSurfaces(s) if s.len() == 3)));
}

#[test]
fn double_begin_fails_in_the_begin_stage() {
    let mut f = fixture();
    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();

    let result = f
        .pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE);
    assert!(matches!(
        result,
        Err(EngineError::PassFailed { stage: "begin", .. })
    ));
    // The original session is still open.
    assert!(f.pass.is_in_session());
}

#[test]
fn render_outside_a_session_fails_in_the_render_stage() {
    let mut f = fixture();
    let model = Model::rigid(&[MeshId(0)], 16.0);

    let result = f
        .pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &model, None);
    assert!(matches!(
        result,
        Err(EngineError::PassFailed {
            stage: "render model",
            ..
        })
    ));
    assert_eq!(f.backend.draw_count(), 0);
}

#[test]
fn end_without_begin_fails_in_the_end_stage() {
    let mut f = fixture();
    let result = f.pass.end(&mut f.backend, &mut f.targets);
    assert!(matches!(
        result,
        Err(EngineError::PassFailed { stage: "end", .. })
    ));
}

#[test]
fn stage_failures_carry_the_underlying_error() {
    let mut f = fixture();
    let result = f.pass.end(&mut f.backend, &mut f.targets);
    match result {
        Err(EngineError::PassFailed { source, .. }) => {
            assert!(matches!(*source, EngineError::InvalidOperation(_)));
        }
        other => panic!("expected a stage failure, got {other:?}"),
    }
}

#[test]
fn end_resolves_the_targets_for_reading() {
    let mut f = fixture();
    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();

    // Mid-session the targets are still being written.
    assert!(f.pass.depth_texture(&f.backend, &f.targets).is_err());

    f.pass.end(&mut f.backend, &mut f.targets).unwrap();
    assert!(!f.pass.is_in_session());
    assert!(f.pass.depth_texture(&f.backend, &f.targets).is_ok());
    assert!(f.pass.normal_texture(&f.backend, &f.targets).is_ok());
    assert!(f.pass.motion_specular_texture(&f.backend, &f.targets).is_ok());
}

// ============================================================================
// Parameter upload suppression
// ============================================================================

#[test]
fn repeat_draws_with_identical_transforms_upload_once() {
    let mut f = fixture();
    let model = Model::rigid(&[MeshId(0)], 16.0);
    let world = Mat4::from_translation(Vec3::X);

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, world, &model, None)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, world, &model, None)
        .unwrap();

    let world_view = param(&mut f.backend, "WorldView");
    let world_view_proj = param(&mut f.backend, "WorldViewProj");
    assert_eq!(f.backend.upload_count(world_view), 1);
    assert_eq!(f.backend.upload_count(world_view_proj), 1);
    // Both draws were still issued.
    assert_eq!(f.backend.draw_count(), 2);
}

#[test]
fn a_different_world_matrix_forces_a_fresh_upload() {
    let mut f = fixture();
    let model = Model::rigid(&[MeshId(0)], 16.0);

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::from_translation(Vec3::X), &model, None)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::from_translation(Vec3::Y), &model, None)
        .unwrap();

    let world_view = param(&mut f.backend, "WorldView");
    assert_eq!(f.backend.upload_count(world_view), 2);
}

#[test]
fn specular_power_is_cached_per_value() {
    let mut f = fixture();
    let shiny = Model::rigid(&[MeshId(0)], 64.0);
    let dull = Model::rigid(&[MeshId(1)], 2.0);

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &shiny, None)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::from_translation(Vec3::X), &shiny, None)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::from_translation(Vec3::Y), &dull, None)
        .unwrap();

    let specular = param(&mut f.backend, "SpecularPower");
    assert_eq!(f.backend.upload_count(specular), 2);
}

#[test]
fn far_plane_survives_across_sessions_unchanged() {
    let mut f = fixture();

    for _ in 0..3 {
        f.pass
            .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
            .unwrap();
        f.pass.end(&mut f.backend, &mut f.targets).unwrap();
    }

    let far = param(&mut f.backend, "FarPlane");
    assert_eq!(f.backend.upload_count(far), 1);
}

#[test]
fn static_scene_suppresses_motion_matrix_reuploads_across_frames() {
    let mut f = fixture();
    let model = Model::rigid(&[MeshId(0)], 16.0);
    let world = Mat4::IDENTITY;

    // Frame 1: no previous frame, motion falls back to the current
    // view-projection.
    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, world, &model, None)
        .unwrap();
    f.pass.end(&mut f.backend, &mut f.targets).unwrap();

    // Frame 2, camera static: the previous view-projection equals the
    // current one, so the cached value matches and nothing re-uploads.
    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, world, &model, None)
        .unwrap();
    f.pass.end(&mut f.backend, &mut f.targets).unwrap();

    let previous = param(&mut f.backend, "PreviousWorldViewProj");
    assert_eq!(f.backend.upload_count(previous), 1);
}

#[test]
fn camera_motion_reuploads_the_previous_frame_matrix() {
    let mut f = fixture();
    let model = Model::rigid(&[MeshId(0)], 16.0);
    let moved_view = Mat4::look_at_rh(Vec3::new(1.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &model, None)
        .unwrap();
    f.pass.end(&mut f.backend, &mut f.targets).unwrap();

    // Frame 2 sees frame 1's view-projection, which differs from the
    // fallback used in frame 1.
    f.pass
        .begin(&mut f.backend, &mut f.targets, moved_view, projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &model, None)
        .unwrap();
    f.pass.end(&mut f.backend, &mut f.targets).unwrap();

    let previous = param(&mut f.backend, "PreviousWorldViewProj");
    assert_eq!(f.backend.upload_count(previous), 1);

    // Frame 3 sees frame 2's (moved) view-projection: a real delta.
    f.pass
        .begin(&mut f.backend, &mut f.targets, moved_view, projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &model, None)
        .unwrap();
    f.pass.end(&mut f.backend, &mut f.targets).unwrap();
    assert_eq!(f.backend.upload_count(previous), 2);
}

// ============================================================================
// Technique selection & skinning
// ============================================================================

#[test]
fn technique_follows_the_bone_palette() {
    let mut f = fixture();
    let rigid = Model::rigid(&[MeshId(0)], 16.0);
    let skinned = Model::skinned(&[MeshId(1)], 16.0);
    let bones = BoneTransforms::new();

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &rigid, None)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::from_translation(Vec3::X), &skinned, Some(&bones))
        .unwrap();

    assert_eq!(selected_techniques(&f.backend), vec!["GBuffer", "GBufferSkinned"]);
}

#[test]
fn skinned_model_without_a_palette_draws_rigid() {
    let mut f = fixture();
    let skinned = Model::skinned(&[MeshId(0)], 16.0);

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &skinned, None)
        .unwrap();

    assert_eq!(selected_techniques(&f.backend), vec!["GBuffer"]);
    let bones = param(&mut f.backend, "Bones");
    assert_eq!(f.backend.upload_count(bones), 0);
}

#[test]
fn bone_palettes_upload_every_draw() {
    let mut f = fixture();
    let skinned = Model::skinned(&[MeshId(0)], 16.0);
    let bones = BoneTransforms::new();

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    // Identical palette both times: palettes are never memoized.
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &skinned, Some(&bones))
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &skinned, Some(&bones))
        .unwrap();

    let palette = param(&mut f.backend, "Bones");
    assert_eq!(f.backend.upload_count(palette), 2);
}

#[test]
fn every_mesh_of_a_model_is_drawn() {
    let mut f = fixture();
    let model = Model::rigid(&[MeshId(3), MeshId(4), MeshId(5)], 16.0);

    f.pass
        .begin(&mut f.backend, &mut f.targets, view(), projection(), FAR_PLANE)
        .unwrap();
    f.pass
        .render_model(&mut f.backend, Mat4::IDENTITY, &model, None)
        .unwrap();

    let drawn: Vec<u32> = f
        .backend
        .events()
        .iter()
        .filter_map(|e| match e {
            DeviceEvent::DrawMesh(mesh) => Some(*mesh),
            _ => None,
        })
        .collect();
    assert_eq!(drawn, vec![3, 4, 5]);
}
