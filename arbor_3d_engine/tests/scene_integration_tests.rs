//! Integration tests for scene traversal
//!
//! Builds small scenes on the public MockGraphicsDevice and checks the draw
//! stream they produce. No GPU required.
//!
//! Run with: cargo test --test scene_integration_tests

use std::sync::{Arc, Mutex};
use arbor_3d_engine::arbor3d::{Engine, Error, Result};
use arbor_3d_engine::arbor3d::camera::{Camera, CameraView};
use arbor_3d_engine::arbor3d::device::{
    BufferFormat, BufferUsage, DeviceCall, DrawMode, GraphicsDevice, IndexType, MockGraphicsDevice,
    SharedGraphicsDevice,
};
use arbor_3d_engine::arbor3d::models::QuadStripModel;
use arbor_3d_engine::arbor3d::resource::{
    ExplicitIndexBufferDesc, ImageData, IndexBuffer, IndexData, ShaderProgram, ShaderStageDesc,
    VertexAttributeBuffer, VertexAttributeBufferDesc,
};
use arbor_3d_engine::arbor3d::scene::{
    AttributeMap, BufferSource, NodeKind, PointLightShading, RenderContext, RenderUnitBuilder,
    SceneNode, SceneRenderer, Transform, VisitPhase,
};
use arbor_3d_engine::glam::{Mat4, Vec3};
use serial_test::serial;

// ============================================================================
// HELPERS
// ============================================================================

const STRIP_VERTEX: &str = "\
in vec3 in_Position;
in vec3 in_Color;
uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform mat4 modelMatrix;
void main() {}";

const LIT_VERTEX: &str = "\
in vec3 in_Position;
in vec3 in_Normal;
uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform mat4 modelMatrix;
uniform mat4 normalMatrix;
uniform vec3 lightPosition;
uniform vec3 ambientColor;
void main() {}";

fn program(device: &SharedGraphicsDevice, vertex: &str, attributes: &[&str]) -> Arc<ShaderProgram> {
    Arc::new(ShaderProgram::link(device.clone(), &[
        ShaderStageDesc::vertex(vertex, attributes),
        ShaderStageDesc::fragment("void main() {}"),
    ]).unwrap())
}

/// Unit quad made of two indexed triangles
struct IndexedQuad {
    device: SharedGraphicsDevice,
}

impl BufferSource for IndexedQuad {
    fn vertex_attribute_buffer(&mut self, buffer_role: &str, var_name: &str) -> Result<Arc<VertexAttributeBuffer>> {
        let data = match buffer_role {
            "position" => [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)],
            "normal" => [Vec3::Z; 4],
            other => return Err(Error::UnresolvedBinding(other.to_string())),
        };
        let mut buffer = VertexAttributeBuffer::from_desc(VertexAttributeBufferDesc {
            graphics_device: self.device.clone(),
            format: BufferFormat::R32G32B32_SFLOAT,
            count: 4,
            usage: BufferUsage::StaticDraw,
            var_name: var_name.to_string(),
        })?;
        buffer.write(&data)?;
        Ok(Arc::new(buffer))
    }

    fn index_buffer(&mut self) -> Result<Arc<IndexBuffer>> {
        Ok(Arc::new(IndexBuffer::explicit(ExplicitIndexBufferDesc {
            graphics_device: self.device.clone(),
            mode: DrawMode::Triangles,
            indices: IndexData::U16(vec![0, 1, 2, 2, 1, 3]),
            vertex_count: 4,
            usage: BufferUsage::StaticDraw,
        })?))
    }
}

/// Palette bitmap: black to white in 4 columns
fn palette() -> ImageData {
    let mut pixels = Vec::new();
    for v in [0u8, 85, 170, 255] {
        pixels.extend_from_slice(&[v, v, v, 255]);
    }
    ImageData::from_bgra(4, 1, pixels).unwrap()
}

fn camera() -> Camera {
    Camera::look_at_perspective(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 0.8, 1.0, 0.1, 50.0)
}

// ============================================================================
// SCENES
// ============================================================================

#[test]
fn test_integration_palette_and_lit_quad() {
    let (mock, device) = MockGraphicsDevice::shared();

    let strip_program = program(&device, STRIP_VERTEX, &["in_Position", "in_Color"]);
    let mut strip_model = QuadStripModel::new(device.clone(), 4, Some(palette())).unwrap();
    let mut strip = SceneNode::model("palette")
        .with_transform(Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
    strip.add_render_unit(
        &RenderUnitBuilder::new(strip_program, AttributeMap::new()
            .with("in_Position", QuadStripModel::POSITION)
            .with("in_Color", QuadStripModel::COLOR)),
        &mut strip_model,
    ).unwrap();

    let lit_program = program(&device, LIT_VERTEX, &["in_Position", "in_Normal"]);
    let mut shading = PointLightShading::new(Vec3::new(0.0, 0.0, 10.0));
    shading.ambient_color = Some(Vec3::splat(0.2));
    let mut lit = SceneNode::point_light("lit_quad", shading);
    lit.add_render_unit(
        &RenderUnitBuilder::new(lit_program.clone(), AttributeMap::new()
            .with("in_Position", "position")
            .with("in_Normal", "normal")),
        &mut IndexedQuad { device: device.clone() },
    ).unwrap();

    let mut root = SceneNode::camera("camera", Arc::new(camera()));
    root.add_child(strip);
    root.add_child(lit);
    mock.lock().unwrap().clear_calls();

    let mut ctx = RenderContext::new();
    ctx.record_visits();
    SceneRenderer::new().render(&root, &mut ctx).unwrap();

    let mock = mock.lock().unwrap();
    assert_eq!(mock.draw_calls(), vec![
        DeviceCall::DrawArrays { mode: DrawMode::QuadStrip, first: 0, count: 10 },
        DeviceCall::DrawElements { mode: DrawMode::Triangles, count: 6, index_type: IndexType::U16, offset: 0 },
    ]);
    assert_eq!(ctx.stats().draw_calls, 2);
    assert_eq!(ctx.stats().nodes_entered, 3);
    assert_eq!(ctx.visits().first(), Some(&("camera".to_string(), VisitPhase::BeforeChildren)));
    assert_eq!(ctx.visits().last(), Some(&("camera".to_string(), VisitPhase::AfterChildren)));
    assert_eq!(ctx.camera_depth(), 0);
    assert_eq!(mock.current_program(), 0);
    assert_eq!(mock.enabled_attribute_count(), 0);
    drop(mock);

    assert_eq!(lit_program.get_uniform::<Vec3>("ambientColor").unwrap(), Vec3::splat(0.2));
    assert_eq!(lit_program.get_uniform::<Vec3>("lightPosition").unwrap(), Vec3::new(0.0, 0.0, 5.0));
}

#[test]
fn test_integration_frames_are_repeatable() {
    let (mock, device) = MockGraphicsDevice::shared();
    let strip_program = program(&device, STRIP_VERTEX, &["in_Position", "in_Color"]);
    let mut model = QuadStripModel::new(device.clone(), 2, Some(palette())).unwrap();
    let mut node = SceneNode::model("strip");
    node.add_render_unit(
        &RenderUnitBuilder::new(strip_program, AttributeMap::new()
            .with("in_Position", "position")
            .with("in_Color", "color")),
        &mut model,
    ).unwrap();
    let camera: Arc<dyn CameraView> = Arc::new(camera());
    let renderer = SceneRenderer::new();

    for _ in 0..3 {
        let mut ctx = RenderContext::with_camera(camera.clone());
        renderer.render(&node, &mut ctx).unwrap();
        assert_eq!(ctx.stats().draw_calls, 1);
    }
    assert_eq!(mock.lock().unwrap().draw_calls().len(), 3);
}

#[test]
fn test_integration_removing_subtree_frees_gpu_objects() {
    let (mock, device) = MockGraphicsDevice::shared();
    let baseline = {
        let mut root = SceneNode::group("root");
        let before = mock.lock().unwrap().stats().live_objects;

        let lit_program = program(&device, LIT_VERTEX, &["in_Position", "in_Normal"]);
        let mut lit = SceneNode::new("lit", NodeKind::PointLight(PointLightShading::new(Vec3::Y)));
        lit.add_render_unit(
            &RenderUnitBuilder::new(lit_program, AttributeMap::new()
                .with("in_Position", "position")
                .with("in_Normal", "normal")),
            &mut IndexedQuad { device: device.clone() },
        ).unwrap();
        root.add_child(lit);
        // program + 2 vertex buffers + element buffer
        assert_eq!(mock.lock().unwrap().stats().live_objects, before + 4);

        drop(root.remove_child(0));
        before
    };
    assert_eq!(mock.lock().unwrap().stats().live_objects, baseline);
}

#[test]
fn test_integration_unresolved_binding_is_reported() {
    let (_mock, device) = MockGraphicsDevice::shared();
    let strip_program = program(&device, STRIP_VERTEX, &["in_Position", "in_Color"]);
    let mut model = QuadStripModel::new(device, 2, None).unwrap();
    let mut node = SceneNode::model("strip");

    let result = node.add_render_unit(
        &RenderUnitBuilder::new(strip_program, AttributeMap::new().with("in_Position", "position")),
        &mut model,
    );
    assert_eq!(result, Err(Error::UnresolvedBinding("in_Color".to_string())));
    assert!(node.render_units().is_empty());
}

// ============================================================================
// ENGINE-OWNED DEVICE
// ============================================================================

#[test]
#[serial]
fn test_integration_scene_on_engine_device() {
    Engine::initialize().unwrap();
    let mock = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    Engine::register_graphics_device(mock.clone()).unwrap();
    let device = Engine::graphics_device().unwrap();

    let strip_program = program(&device, STRIP_VERTEX, &["in_Position", "in_Color"]);
    let mut model = QuadStripModel::new(device, 1, Some(palette())).unwrap();
    let mut node = SceneNode::model("strip");
    node.add_render_unit(
        &RenderUnitBuilder::new(strip_program, AttributeMap::new()
            .with("in_Position", "position")
            .with("in_Color", "color")),
        &mut model,
    ).unwrap();

    let mut ctx = RenderContext::with_camera(Arc::new(Camera::new(Mat4::IDENTITY, Mat4::IDENTITY)));
    SceneRenderer::new().render(&node, &mut ctx).unwrap();
    assert_eq!(mock.lock().unwrap().draw_calls().len(), 1);

    Engine::shutdown();
}
