/// GPU texture with full-image upload.
///
/// Pixel data crosses the boundary as 32-bit BGRA (`ImageData`). `upload`
/// always replaces the whole image: bind, one 1D or 2D storage call, unbind.
/// Only 1D and 2D targets can be uploaded; the other targets can be created
/// and bound but `upload` rejects them with `UnsupportedTarget` before
/// touching any GPU state.

use crate::error::{Error, Result};
use crate::engine_fail;
use crate::graphics_device::{
    lock_device, NativeId, ObjectKind, PixelFormat, SharedGraphicsDevice, TextureTarget,
};
use crate::resource::GpuHandle;

// ===== IMAGE DATA =====

/// Decoded image, 4 bytes per pixel in B, G, R, A order, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageData {
    /// Wrap BGRA pixels; `pixels.len()` must be `width * height * 4`
    pub fn from_bgra(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidCount(format!("image size {}x{}", width, height)));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidCount(format!(
                "{}x{} image needs {} bytes, got {}", width, height, expected, pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Image where every pixel is `bgra`
    pub fn filled(width: u32, height: u32, bgra: [u8; 4]) -> Result<Self> {
        let pixels = bgra.repeat(width as usize * height as usize);
        Self::from_bgra(width, height, pixels)
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    /// Raw BGRA bytes
    pub fn pixels(&self) -> &[u8] { &self.pixels }

    /// BGRA bytes of pixel (x, y), `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut bgra = [0u8; 4];
        bgra.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(bgra)
    }
}

// ===== TEXTURE DESC =====

/// Descriptor for creating a Texture
pub struct TextureDesc {
    pub graphics_device: SharedGraphicsDevice,
    pub target: TextureTarget,
    /// Storage format on the GPU
    pub format: PixelFormat,
}

// ===== TEXTURE =====

#[derive(Debug)]
pub struct Texture {
    handle: GpuHandle,
    target: TextureTarget,
    format: PixelFormat,
    width: u32,
    height: u32,
}

impl Texture {
    /// Create an empty texture object
    pub fn from_desc(desc: TextureDesc) -> Result<Self> {
        let handle = GpuHandle::acquire(desc.graphics_device, ObjectKind::Texture)?;
        crate::engine_debug!("arbor3d::Texture",
            "Created {:?} texture {}", desc.target, handle.id());
        Ok(Self {
            handle,
            target: desc.target,
            format: desc.format,
            width: 0,
            height: 0,
        })
    }

    // ===== ACCESSORS =====

    /// Native texture id (0 once released)
    pub fn id(&self) -> NativeId { self.handle.id() }
    pub fn target(&self) -> TextureTarget { self.target }
    pub fn format(&self) -> PixelFormat { self.format }

    /// Width of the last uploaded image (0 before any upload)
    pub fn width(&self) -> u32 { self.width }

    /// Height of the last uploaded image (1 for 1D textures)
    pub fn height(&self) -> u32 { self.height }

    /// Release the native texture now instead of at drop
    pub fn release(&mut self) {
        self.handle.release();
    }

    // ===== UPLOAD =====

    /// Replace the texture content with `image`
    ///
    /// 1D textures take the first row of the image.
    pub fn upload(&mut self, image: &ImageData) -> Result<()> {
        if !matches!(self.target, TextureTarget::Texture1D | TextureTarget::Texture2D) {
            engine_fail!("arbor3d::Texture",
                Error::UnsupportedTarget(format!("{:?}", self.target)));
        }
        let id = self.handle.live_id()?;

        let mut device = lock_device(self.handle.graphics_device())?;
        device.bind_texture(self.target, id)?;
        let stored = match self.target {
            TextureTarget::Texture1D => device.tex_image_1d(
                self.target, self.format, image.width(), PixelFormat::B8G8R8A8_UNORM, image.pixels(),
            ),
            _ => device.tex_image_2d(
                self.target, self.format, image.width(), image.height(),
                PixelFormat::B8G8R8A8_UNORM, image.pixels(),
            ),
        };
        // Unbind even when the storage call failed
        device.bind_texture(self.target, 0)?;
        stored?;
        drop(device);

        self.width = image.width();
        self.height = match self.target {
            TextureTarget::Texture1D => 1,
            _ => image.height(),
        };
        crate::engine_trace!("arbor3d::Texture",
            "Uploaded {}x{} image to texture {}", self.width, self.height, id);
        Ok(())
    }

    // ===== BINDING =====

    /// Bind to texture unit `unit`
    pub fn bind(&self, unit: u32) -> Result<()> {
        let id = self.handle.live_id()?;
        let mut device = lock_device(self.handle.graphics_device())?;
        device.active_texture(unit)?;
        device.bind_texture(self.target, id)
    }

    /// Clear this texture's target on texture unit `unit`
    pub fn unbind(&self, unit: u32) -> Result<()> {
        let mut device = lock_device(self.handle.graphics_device())?;
        device.active_texture(unit)?;
        device.bind_texture(self.target, 0)
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
