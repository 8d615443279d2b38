use super::*;
use std::sync::{Arc, Mutex};
use crate::graphics_device::{DeviceCall, GraphicsDevice, MockGraphicsDevice};

// ============================================================================
// Helpers
// ============================================================================

const VERTEX: &str = "\
in vec3 vPosition;
in float texCoord;
uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform mat4 modelMatrix;
void main() {}";

const FRAGMENT: &str = "\
uniform vec3 tint;
uniform float alpha;
uniform bool useTexture;
void main() {}";

fn link_program() -> (Arc<Mutex<MockGraphicsDevice>>, ShaderProgram) {
    let (mock, device) = MockGraphicsDevice::shared();
    let program = ShaderProgram::link(device, &[
        ShaderStageDesc::vertex(VERTEX, &["vPosition", "texCoord"]),
        ShaderStageDesc::fragment(FRAGMENT),
    ]).unwrap();
    (mock, program)
}

// ============================================================================
// Link
// ============================================================================

#[test]
fn test_link_binds_attributes_in_declared_order() {
    let (mock, program) = link_program();

    assert_eq!(program.attribute_location("vPosition"), Some(0));
    assert_eq!(program.attribute_location("texCoord"), Some(1));
    assert_eq!(program.attribute_location("color"), None);
    let mock = mock.lock().unwrap();
    assert!(mock.calls().contains(&DeviceCall::BindAttributeLocation {
        program: program.id(),
        location: 1,
        name: "texCoord".to_string(),
    }));
}

#[test]
fn test_link_releases_stage_objects() {
    let (mock, program) = link_program();
    let mock = mock.lock().unwrap();

    let shaders: Vec<u32> = mock.calls().iter().filter_map(|call| match call {
        DeviceCall::CreateObject { kind: ObjectKind::Shader, id } => Some(*id),
        _ => None,
    }).collect();
    assert_eq!(shaders.len(), 2);
    for id in shaders {
        assert_eq!(mock.delete_count(id), 1);
        assert!(mock.calls().contains(&DeviceCall::DetachShader { program: program.id(), shader: id }));
    }
    assert!(mock.is_alive(program.id()));
}

#[test]
fn test_link_requires_vertex_and_fragment() {
    let (mock, device) = MockGraphicsDevice::shared();
    let result = ShaderProgram::link(device, &[ShaderStageDesc::vertex(VERTEX, &["vPosition"])]);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(mock.lock().unwrap().calls().is_empty());
}

#[test]
fn test_link_rejects_duplicate_attribute() {
    let (_mock, device) = MockGraphicsDevice::shared();
    let result = ShaderProgram::link(device, &[
        ShaderStageDesc::vertex(VERTEX, &["vPosition", "vPosition"]),
        ShaderStageDesc::fragment(FRAGMENT),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_failed_compile_releases_everything() {
    let (mock, device) = MockGraphicsDevice::shared();
    let result = ShaderProgram::link(device, &[
        ShaderStageDesc::vertex(VERTEX, &["vPosition"]),
        ShaderStageDesc::fragment("   "),
    ]);

    assert!(result.is_err());
    assert_eq!(mock.lock().unwrap().stats().live_objects, 0);
}

// ============================================================================
// Uniforms
// ============================================================================

#[test]
fn test_set_then_get_uniform() {
    let (_mock, program) = link_program();
    let tint = Vec3::new(0.2, 0.4, 0.6);

    program.set_uniform("tint", tint).unwrap();
    program.set_uniform("alpha", 0.5f32).unwrap();
    program.set_uniform("useTexture", true).unwrap();

    assert_eq!(program.get_uniform::<Vec3>("tint").unwrap(), tint);
    assert_eq!(program.get_uniform::<f32>("alpha").unwrap(), 0.5);
    assert!(program.get_uniform::<bool>("useTexture").unwrap());
}

#[test]
fn test_unwritten_uniform_reads_zero() {
    let (_mock, program) = link_program();
    assert_eq!(program.get_uniform::<Mat4>("modelMatrix").unwrap(), Mat4::ZERO);
}

#[test]
fn test_unknown_uniform_is_reported_for_set_and_get() {
    let (_mock, program) = link_program();

    assert_eq!(
        program.set_uniform("lightPosition", Vec3::ONE),
        Err(Error::UnknownUniform("lightPosition".to_string()))
    );
    assert_eq!(
        program.get_uniform::<Vec3>("lightPosition"),
        Err(Error::UnknownUniform("lightPosition".to_string()))
    );
    assert!(!program.has_uniform("lightPosition"));
    assert!(program.has_uniform("tint"));
}

#[test]
fn test_wrong_uniform_type_is_rejected() {
    let (_mock, program) = link_program();
    assert!(program.set_uniform("tint", 1.0f32).is_err());
}

#[test]
fn test_uniform_location_is_cached() {
    let (mock, program) = link_program();
    let first = program.uniform_location("viewMatrix").unwrap();
    assert!(first.is_some());

    // A cached lookup keeps answering after the device forgot the program
    mock.lock().unwrap().delete_object(ObjectKind::Program, program.id());
    assert_eq!(program.uniform_location("viewMatrix").unwrap(), first);
}

#[test]
fn test_bind_and_unbind() {
    let (mock, program) = link_program();
    program.bind().unwrap();
    assert_eq!(mock.lock().unwrap().current_program(), program.id());
    program.unbind().unwrap();
    assert_eq!(mock.lock().unwrap().current_program(), 0);
}
