use super::*;
use std::sync::{Arc, Mutex};
use glam::{Mat4, Vec3};
use crate::camera::{Camera, CameraView};
use crate::graphics_device::{DeviceCall, DrawMode, MockGraphicsDevice, SharedGraphicsDevice};
use crate::models::QuadStripModel;
use crate::resource::{ShaderProgram, ShaderStageDesc};
use crate::scene::{AttributeMap, RenderUnitBuilder, Transform};

// ============================================================================
// Helpers
// ============================================================================

const VERTEX: &str = "\
in vec3 in_Position;
in float in_TexCoord;
uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform mat4 modelMatrix;
void main() {}";

fn link_program(device: &SharedGraphicsDevice) -> Arc<ShaderProgram> {
    Arc::new(ShaderProgram::link(device.clone(), &[
        ShaderStageDesc::vertex(VERTEX, &["in_Position", "in_TexCoord"]),
        ShaderStageDesc::fragment("void main() {}"),
    ]).unwrap())
}

/// Model node drawing a quad strip of `quad_count` quads
fn strip_node(device: &SharedGraphicsDevice, name: &str, quad_count: u32) -> (Arc<ShaderProgram>, SceneNode) {
    let program = link_program(device);
    let map = AttributeMap::new()
        .with("in_Position", "position")
        .with("in_TexCoord", "texCoord");
    let mut model = QuadStripModel::new(device.clone(), quad_count, None).unwrap();
    let mut node = SceneNode::model(name);
    node.add_render_unit(&RenderUnitBuilder::new(program.clone(), map), &mut model).unwrap();
    (program, node)
}

fn camera_at(z: f32) -> Camera {
    Camera::new(Mat4::from_translation(Vec3::new(0.0, 0.0, z)), Mat4::IDENTITY)
}

fn setup() -> (Arc<Mutex<MockGraphicsDevice>>, SharedGraphicsDevice) {
    MockGraphicsDevice::shared()
}

// ============================================================================
// Order
// ============================================================================

#[test]
fn test_visits_pre_and_post_order() {
    let mut a = SceneNode::group("a");
    a.add_child(SceneNode::group("a1"));
    a.add_child(SceneNode::group("a2"));
    let mut root = SceneNode::group("root");
    root.add_child(a);
    root.add_child(SceneNode::group("b"));

    let mut ctx = RenderContext::new();
    ctx.record_visits();
    SceneRenderer::new().render(&root, &mut ctx).unwrap();

    use VisitPhase::{AfterChildren as After, BeforeChildren as Before};
    let visits: Vec<(&str, VisitPhase)> = ctx.visits().iter().map(|(n, p)| (n.as_str(), *p)).collect();
    assert_eq!(visits, vec![
        ("root", Before),
        ("a", Before),
        ("a1", Before), ("a1", After),
        ("a2", Before), ("a2", After),
        ("a", After),
        ("b", Before), ("b", After),
        ("root", After),
    ]);
    assert_eq!(ctx.stats().nodes_entered, 5);
    assert_eq!(ctx.stats().nodes_exited, 5);
}

#[test]
fn test_siblings_draw_in_stored_order() {
    let (mock, device) = setup();
    let (_p1, first) = strip_node(&device, "first", 1);
    let (_p2, second) = strip_node(&device, "second", 3);
    let mut root = SceneNode::group("root");
    root.add_child(first);
    root.add_child(second);

    let mut ctx = RenderContext::with_camera(Arc::new(Camera::default()));
    SceneRenderer::new().render(&root, &mut ctx).unwrap();

    assert_eq!(mock.lock().unwrap().draw_calls(), vec![
        DeviceCall::DrawArrays { mode: DrawMode::QuadStrip, first: 0, count: 4 },
        DeviceCall::DrawArrays { mode: DrawMode::QuadStrip, first: 0, count: 8 },
    ]);
}

// ============================================================================
// State
// ============================================================================

#[test]
fn test_world_transform_composes_down_the_path() {
    let (_mock, device) = setup();
    let (program, node) = strip_node(&device, "leaf", 1);
    let leaf_local = Transform::from_scale(Vec3::splat(2.0));
    let parent_local = Transform::from_translation(Vec3::new(5.0, 0.0, 0.0));
    let mut parent = SceneNode::group("parent").with_transform(parent_local);
    parent.add_child(node.with_transform(leaf_local));

    let mut ctx = RenderContext::with_camera(Arc::new(Camera::default()));
    SceneRenderer::new().render(&parent, &mut ctx).unwrap();

    let model = program.get_uniform::<Mat4>("modelMatrix").unwrap();
    assert_eq!(model, parent_local.matrix() * leaf_local.matrix());
    assert_eq!(model.transform_point3(Vec3::X), Vec3::new(7.0, 0.0, 0.0));
    assert_eq!(ctx.world_depth(), 0);
}

#[test]
fn test_nested_camera_is_restored_for_later_siblings() {
    let (_mock, device) = setup();
    let outer = camera_at(-1.0);
    let inner = camera_at(-2.0);
    let (inner_program, inner_model) = strip_node(&device, "inner_model", 1);
    let (outer_program, outer_model) = strip_node(&device, "outer_model", 1);

    let mut inner_camera = SceneNode::camera("inner_camera", Arc::new(inner));
    inner_camera.add_child(inner_model);
    let mut root = SceneNode::camera("root", Arc::new(outer));
    root.add_child(inner_camera);
    root.add_child(outer_model);

    let mut ctx = RenderContext::new();
    SceneRenderer::new().render(&root, &mut ctx).unwrap();

    assert_eq!(inner_program.get_uniform::<Mat4>("viewMatrix").unwrap(), inner.view_matrix());
    assert_eq!(outer_program.get_uniform::<Mat4>("viewMatrix").unwrap(), outer.view_matrix());
    assert_eq!(ctx.camera_depth(), 0);
}

#[test]
fn test_base_camera_survives_the_frame() {
    let root = SceneNode::camera("eye", Arc::new(camera_at(-3.0)));
    let mut ctx = RenderContext::with_camera(Arc::new(Camera::default()));

    SceneRenderer::new().render(&root, &mut ctx).unwrap();
    assert_eq!(ctx.camera_depth(), 1);
    assert_eq!(ctx.current_camera().unwrap().view_matrix(), Mat4::IDENTITY);
}

#[test]
fn test_error_stops_the_frame() {
    let (mock, device) = setup();
    let (_program, model) = strip_node(&device, "model", 1);
    let mut root = SceneNode::group("root");
    root.add_child(model);
    root.add_child(SceneNode::group("never"));

    let mut ctx = RenderContext::new();
    ctx.record_visits();
    let result = SceneRenderer::new().render(&root, &mut ctx);

    assert!(matches!(result, Err(Error::UsageError(_))));
    assert!(mock.lock().unwrap().draw_calls().is_empty());
    assert!(!ctx.visits().iter().any(|(name, _)| name == "never"));
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_quad_strip_scene_issues_one_draw() {
    let (mock, device) = setup();
    let (_program, strip) = strip_node(&device, "palette", 4);
    let camera = Camera::look_at_perspective(
        Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, 1.0, 1.5, 0.1, 100.0,
    );
    let mut root = SceneNode::camera("camera", Arc::new(camera));
    root.add_child(strip);
    mock.lock().unwrap().clear_calls();

    let mut ctx = RenderContext::new();
    SceneRenderer::new().render(&root, &mut ctx).unwrap();

    let mock = mock.lock().unwrap();
    assert_eq!(mock.draw_calls(), vec![
        DeviceCall::DrawArrays { mode: DrawMode::QuadStrip, first: 0, count: 10 },
    ]);
    assert_eq!(ctx.stats().draw_calls, 1);
    assert_eq!(mock.current_program(), 0);
    assert_eq!(mock.enabled_attribute_count(), 0);
}
