use super::*;
use std::sync::{Arc, Mutex};
use crate::graphics_device::{DeviceCall, MockGraphicsDevice};

// ============================================================================
// Helpers
// ============================================================================

fn create_texture(target: TextureTarget) -> (Arc<Mutex<MockGraphicsDevice>>, Texture) {
    let (mock, device) = MockGraphicsDevice::shared();
    let texture = Texture::from_desc(TextureDesc {
        graphics_device: device,
        target,
        format: PixelFormat::R8G8B8A8_UNORM,
    }).unwrap();
    (mock, texture)
}

fn checker_2x2() -> ImageData {
    ImageData::from_bgra(2, 2, vec![
        0, 0, 255, 255,    255, 255, 255, 255,
        255, 255, 255, 255, 0, 0, 255, 255,
    ]).unwrap()
}

// ============================================================================
// ImageData
// ============================================================================

#[test]
fn test_image_data_rejects_wrong_length() {
    assert!(matches!(ImageData::from_bgra(2, 2, vec![0; 15]), Err(Error::InvalidCount(_))));
    assert!(ImageData::from_bgra(0, 2, Vec::new()).is_err());
}

#[test]
fn test_image_data_pixel_lookup() {
    let image = checker_2x2();
    assert_eq!(image.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(image.pixel(1, 0), Some([255, 255, 255, 255]));
    assert_eq!(image.pixel(1, 1), Some([0, 0, 255, 255]));
    assert_eq!(image.pixel(2, 0), None);
}

#[test]
fn test_image_data_filled() {
    let image = ImageData::filled(3, 1, [1, 2, 3, 4]).unwrap();
    assert_eq!(image.pixels().len(), 12);
    assert_eq!(image.pixel(2, 0), Some([1, 2, 3, 4]));
}

// ============================================================================
// Upload
// ============================================================================

#[test]
fn test_upload_2d_uses_image_size_and_unbinds() {
    let (mock, mut texture) = create_texture(TextureTarget::Texture2D);
    texture.upload(&checker_2x2()).unwrap();

    assert_eq!((texture.width(), texture.height()), (2, 2));
    let mock = mock.lock().unwrap();
    assert!(mock.calls().contains(&DeviceCall::TexImage2D {
        target: TextureTarget::Texture2D,
        width: 2,
        height: 2,
    }));
    assert_eq!(mock.bound_texture(0, TextureTarget::Texture2D), 0);
    assert_eq!(mock.texture_image(texture.id()).map(|(w, h, p)| (w, h, p.len())), Some((2, 2, 16)));
}

#[test]
fn test_upload_call_order() {
    let (mock, mut texture) = create_texture(TextureTarget::Texture2D);
    let id = texture.id();
    mock.lock().unwrap().clear_calls();
    texture.upload(&checker_2x2()).unwrap();

    assert_eq!(mock.lock().unwrap().calls(), &[
        DeviceCall::BindTexture { target: TextureTarget::Texture2D, id },
        DeviceCall::TexImage2D { target: TextureTarget::Texture2D, width: 2, height: 2 },
        DeviceCall::BindTexture { target: TextureTarget::Texture2D, id: 0 },
    ]);
}

#[test]
fn test_upload_1d_takes_first_row() {
    let (mock, mut texture) = create_texture(TextureTarget::Texture1D);
    texture.upload(&checker_2x2()).unwrap();

    assert_eq!((texture.width(), texture.height()), (2, 1));
    let mock = mock.lock().unwrap();
    assert!(mock.calls().contains(&DeviceCall::TexImage1D { target: TextureTarget::Texture1D, width: 2 }));
    assert_eq!(mock.texture_image(texture.id()).map(|(_, _, p)| p.len()), Some(8));
}

#[test]
fn test_upload_to_3d_target_fails_without_binding() {
    let (mock, mut texture) = create_texture(TextureTarget::Texture3D);
    mock.lock().unwrap().clear_calls();

    let result = texture.upload(&checker_2x2());
    assert!(matches!(result, Err(Error::UnsupportedTarget(_))));
    assert!(mock.lock().unwrap().calls().is_empty());
}

#[test]
fn test_reupload_replaces_whole_image() {
    let (mock, mut texture) = create_texture(TextureTarget::Texture2D);
    texture.upload(&checker_2x2()).unwrap();
    texture.upload(&ImageData::filled(4, 4, [9, 9, 9, 9]).unwrap()).unwrap();

    assert_eq!((texture.width(), texture.height()), (4, 4));
    let mock = mock.lock().unwrap();
    let (_, _, pixels) = mock.texture_image(texture.id()).unwrap();
    assert!(pixels.iter().all(|b| *b == 9));
}

#[test]
fn test_bind_selects_unit() {
    let (mock, texture) = create_texture(TextureTarget::Texture2D);
    texture.bind(3).unwrap();
    assert_eq!(mock.lock().unwrap().bound_texture(3, TextureTarget::Texture2D), texture.id());
    texture.unbind(3).unwrap();
    assert_eq!(mock.lock().unwrap().bound_texture(3, TextureTarget::Texture2D), 0);
}

#[test]
fn test_drop_deletes_texture() {
    let (mock, texture) = create_texture(TextureTarget::Texture2D);
    let id = texture.id();
    drop(texture);
    assert_eq!(mock.lock().unwrap().delete_count(id), 1);
}
