/// Unit tests for MockGraphicsDevice.

use crate::graphics_device::mock_graphics_device::*;
use crate::graphics_device::{
    GraphicsDevice, ObjectKind, BufferTarget, BufferUsage, MapAccess, BufferFormat,
    DrawMode, TextureTarget, PixelFormat, ShaderStageKind, UniformKind, UniformValue,
    lock_device,
};
use crate::error::Error;
use glam::Vec3;

const VERTEX_SOURCE: &str = "in vec3 vPosition;\nuniform mat4 modelMatrix;\nuniform vec3 tint;\nvoid main() {}";
const FRAGMENT_SOURCE: &str = "uniform vec3 tint;\nuniform float alpha;\nvoid main() {}";

fn linked_program(device: &mut MockGraphicsDevice) -> u32 {
    let vs = device.create_object(ObjectKind::Shader).unwrap();
    let fs = device.create_object(ObjectKind::Shader).unwrap();
    device.compile_shader(vs, ShaderStageKind::Vertex, VERTEX_SOURCE).unwrap();
    device.compile_shader(fs, ShaderStageKind::Fragment, FRAGMENT_SOURCE).unwrap();
    let program = device.create_object(ObjectKind::Program).unwrap();
    device.attach_shader(program, vs).unwrap();
    device.attach_shader(program, fs).unwrap();
    device.link_program(program).unwrap();
    program
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn test_ids_are_nonzero_and_unique() {
    let mut device = MockGraphicsDevice::new();
    let a = device.create_object(ObjectKind::Buffer).unwrap();
    let b = device.create_object(ObjectKind::Texture).unwrap();
    assert_ne!(a, 0);
    assert_ne!(a, b);
    assert_eq!(device.stats().live_objects, 2);
}

#[test]
fn test_delete_counts_every_call() {
    let mut device = MockGraphicsDevice::new();
    let id = device.create_object(ObjectKind::Sampler).unwrap();
    device.delete_object(ObjectKind::Sampler, id);
    device.delete_object(ObjectKind::Sampler, id);
    assert_eq!(device.delete_count(id), 2);
    assert!(!device.is_alive(id));
}

#[test]
fn test_fail_next_create() {
    let mut device = MockGraphicsDevice::new();
    device.fail_next_create();
    assert_eq!(device.create_object(ObjectKind::Buffer), Err(Error::OutOfMemory));
    assert!(device.create_object(ObjectKind::Buffer).is_ok());
}

#[test]
fn test_lock_device_reaches_shared_mock() {
    let (mock, device) = MockGraphicsDevice::shared();
    let id = lock_device(&device).unwrap().create_object(ObjectKind::Buffer).unwrap();
    assert!(mock.lock().unwrap().is_alive(id));
}

#[test]
fn test_lock_device_reports_poisoned_lock() {
    let (_mock, device) = MockGraphicsDevice::shared();
    let poisoner = device.clone();
    let _ = std::thread::spawn(move || {
        let _guard = poisoner.lock().unwrap();
        panic!("poison the device lock");
    }).join();

    assert!(matches!(lock_device(&device), Err(Error::BackendError(_))));
}

// ============================================================================
// Buffers
// ============================================================================

#[test]
fn test_map_write_unmap_commits() {
    let mut device = MockGraphicsDevice::new();
    let id = device.create_object(ObjectKind::Buffer).unwrap();
    device.buffer_data(BufferTarget::Array, id, 4, None, BufferUsage::StaticDraw).unwrap();

    let mut bytes = device.map_buffer(id, MapAccess::WRITE).unwrap();
    assert!(device.is_mapped(id));
    bytes.copy_from_slice(&[1, 2, 3, 4]);
    device.unmap_buffer(id, Some(&bytes)).unwrap();

    assert!(!device.is_mapped(id));
    assert_eq!(device.buffer_contents(id), Some(&[1u8, 2, 3, 4][..]));
}

#[test]
fn test_read_only_unmap_does_not_commit() {
    let mut device = MockGraphicsDevice::new();
    let id = device.create_object(ObjectKind::Buffer).unwrap();
    device.buffer_data(BufferTarget::Array, id, 2, Some(&[9, 9]), BufferUsage::StaticDraw).unwrap();

    device.map_buffer(id, MapAccess::READ).unwrap();
    device.unmap_buffer(id, Some(&[0, 0])).unwrap();
    assert_eq!(device.buffer_contents(id), Some(&[9u8, 9][..]));
}

#[test]
fn test_nested_map_is_usage_error() {
    let mut device = MockGraphicsDevice::new();
    let id = device.create_object(ObjectKind::Buffer).unwrap();
    device.buffer_data(BufferTarget::Array, id, 8, None, BufferUsage::DynamicDraw).unwrap();
    device.map_buffer(id, MapAccess::READ_WRITE).unwrap();

    assert!(matches!(device.map_buffer(id, MapAccess::READ), Err(Error::UsageError(_))));
}

#[test]
fn test_unmap_without_map_is_usage_error() {
    let mut device = MockGraphicsDevice::new();
    let id = device.create_object(ObjectKind::Buffer).unwrap();
    assert!(matches!(device.unmap_buffer(id, None), Err(Error::UsageError(_))));
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn test_tex_image_2d_requires_bound_texture() {
    let mut device = MockGraphicsDevice::new();
    let pixels = [0u8; 16];
    let result = device.tex_image_2d(
        TextureTarget::Texture2D, PixelFormat::R8G8B8A8_UNORM, 2, 2, PixelFormat::B8G8R8A8_UNORM, &pixels,
    );
    assert!(result.is_err());

    let id = device.create_object(ObjectKind::Texture).unwrap();
    device.bind_texture(TextureTarget::Texture2D, id).unwrap();
    device.tex_image_2d(
        TextureTarget::Texture2D, PixelFormat::R8G8B8A8_UNORM, 2, 2, PixelFormat::B8G8R8A8_UNORM, &pixels,
    ).unwrap();
    assert_eq!(device.texture_image(id).map(|(w, h, _)| (w, h)), Some((2, 2)));
    assert_eq!(device.bound_texture(0, TextureTarget::Texture2D), id);
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_link_reflects_uniforms_from_all_stages() {
    let mut device = MockGraphicsDevice::new();
    let program = linked_program(&mut device);

    assert!(device.uniform_location(program, "modelMatrix").is_some());
    assert!(device.uniform_location(program, "tint").is_some());
    assert!(device.uniform_location(program, "alpha").is_some());
    assert!(device.uniform_location(program, "missing").is_none());
}

#[test]
fn test_link_without_fragment_stage_fails() {
    let mut device = MockGraphicsDevice::new();
    let vs = device.create_object(ObjectKind::Shader).unwrap();
    device.compile_shader(vs, ShaderStageKind::Vertex, VERTEX_SOURCE).unwrap();
    let program = device.create_object(ObjectKind::Program).unwrap();
    device.attach_shader(program, vs).unwrap();
    assert!(device.link_program(program).is_err());
}

#[test]
fn test_uniform_set_get_and_type_check() {
    let mut device = MockGraphicsDevice::new();
    let program = linked_program(&mut device);
    let tint = device.uniform_location(program, "tint").unwrap();

    assert_eq!(
        device.get_uniform(program, tint, UniformKind::Vec3).unwrap(),
        UniformValue::Vec3(Vec3::ZERO)
    );
    device.set_uniform(program, tint, &UniformValue::Vec3(Vec3::X)).unwrap();
    assert_eq!(
        device.get_uniform(program, tint, UniformKind::Vec3).unwrap(),
        UniformValue::Vec3(Vec3::X)
    );
    assert!(device.set_uniform(program, tint, &UniformValue::Float(1.0)).is_err());
}

// ============================================================================
// Draws
// ============================================================================

#[test]
fn test_draw_requires_program() {
    let mut device = MockGraphicsDevice::new();
    assert!(matches!(
        device.draw_arrays(DrawMode::Triangles, 0, 3),
        Err(Error::UsageError(_))
    ));
}

#[test]
fn test_draw_rejects_mapped_attribute_buffer() {
    let mut device = MockGraphicsDevice::new();
    let program = linked_program(&mut device);
    let buffer = device.create_object(ObjectKind::Buffer).unwrap();
    device.buffer_data(BufferTarget::Array, buffer, 36, None, BufferUsage::StaticDraw).unwrap();
    device.use_program(program).unwrap();
    device.enable_vertex_attribute(0, buffer, BufferFormat::R32G32B32_SFLOAT).unwrap();

    device.map_buffer(buffer, MapAccess::WRITE).unwrap();
    assert!(device.draw_arrays(DrawMode::Triangles, 0, 3).is_err());

    device.unmap_buffer(buffer, None).unwrap();
    device.draw_arrays(DrawMode::Triangles, 0, 3).unwrap();
    assert_eq!(device.stats().draw_calls, 1);
    assert_eq!(
        device.draw_calls(),
        vec![DeviceCall::DrawArrays { mode: DrawMode::Triangles, first: 0, count: 3 }]
    );
}
