/// GraphicsDevice trait - the native graphics API boundary
///
/// Every GPU-side object is named by a `NativeId` handed out by the device.
/// The engine never talks to a driver directly: buffers, textures, samplers,
/// programs and render units all go through this trait, which makes the whole
/// resource layer testable against `MockGraphicsDevice`.
///
/// All calls must be issued from the thread that owns the graphics context.
/// The device is shared as `Arc<Mutex<dyn GraphicsDevice>>`, so calls are
/// serialized even when a handle is dropped somewhere else.

use std::sync::{Arc, Mutex, MutexGuard};
use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferTarget, BufferUsage, MapAccess, BufferFormat, IndexType, DrawMode,
    TextureTarget, PixelFormat, SamplerParameter,
    ShaderStageKind, UniformLocation, UniformKind, UniformValue,
};

/// Opaque integer naming a GPU-resident object. `0` is never a live object.
pub type NativeId = u32;

/// Shared, lockable graphics device
pub type SharedGraphicsDevice = Arc<Mutex<dyn GraphicsDevice>>;

/// Kind of native object, selects the matching create/delete entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Buffer,
    Texture,
    Sampler,
    Shader,
    Program,
}

/// Device statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Number of draw calls issued since the device was created
    pub draw_calls: u32,
    /// Number of native objects currently alive
    pub live_objects: u32,
}

/// Native graphics API boundary
pub trait GraphicsDevice: Send + Sync {
    // ===== OBJECT LIFETIME =====

    /// Create a native object and return its id (never 0)
    fn create_object(&mut self, kind: ObjectKind) -> Result<NativeId>;

    /// Delete a native object. Deleting an unknown id is ignored by the driver.
    fn delete_object(&mut self, kind: ObjectKind, id: NativeId);

    // ===== BUFFERS =====

    /// Bind a buffer to a target (`id == 0` unbinds)
    fn bind_buffer(&mut self, target: BufferTarget, id: NativeId) -> Result<()>;

    /// Allocate storage of `size` bytes, optionally initialized with `data`
    fn buffer_data(
        &mut self,
        target: BufferTarget,
        id: NativeId,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<()>;

    /// Map the whole buffer. Returns a staging copy of its current bytes.
    ///
    /// Mapping an already mapped buffer is an error.
    fn map_buffer(&mut self, id: NativeId, access: MapAccess) -> Result<Vec<u8>>;

    /// Unmap the buffer, committing `data` when the mapping was writable
    fn unmap_buffer(&mut self, id: NativeId, data: Option<&[u8]>) -> Result<()>;

    // ===== TEXTURES & SAMPLERS =====

    /// Select the active texture unit
    fn active_texture(&mut self, unit: u32) -> Result<()>;

    /// Bind a texture to a target on the active unit (`id == 0` unbinds)
    fn bind_texture(&mut self, target: TextureTarget, id: NativeId) -> Result<()>;

    /// Full 1D image storage for the texture bound to `target`
    fn tex_image_1d(
        &mut self,
        target: TextureTarget,
        internal_format: PixelFormat,
        width: u32,
        source_format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()>;

    /// Full 2D image storage for the texture bound to `target`
    fn tex_image_2d(
        &mut self,
        target: TextureTarget,
        internal_format: PixelFormat,
        width: u32,
        height: u32,
        source_format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()>;

    /// Set one sampler state parameter
    fn sampler_parameter(&mut self, id: NativeId, param: SamplerParameter) -> Result<()>;

    /// Bind a sampler to a texture unit (`id == 0` unbinds)
    fn bind_sampler(&mut self, unit: u32, id: NativeId) -> Result<()>;

    // ===== SHADERS & PROGRAMS =====

    /// Compile shader source into a shader object
    fn compile_shader(&mut self, id: NativeId, stage: ShaderStageKind, source: &str) -> Result<()>;

    /// Attach a compiled shader to a program
    fn attach_shader(&mut self, program: NativeId, shader: NativeId) -> Result<()>;

    /// Detach a shader from a program
    fn detach_shader(&mut self, program: NativeId, shader: NativeId) -> Result<()>;

    /// Assign a vertex attribute location before linking
    fn bind_attribute_location(&mut self, program: NativeId, location: u32, name: &str) -> Result<()>;

    /// Link the attached stages
    fn link_program(&mut self, program: NativeId) -> Result<()>;

    /// Location of an active uniform, `None` if the linker did not keep it
    fn uniform_location(&self, program: NativeId, name: &str) -> Option<UniformLocation>;

    /// Make a program current (`id == 0` unbinds)
    fn use_program(&mut self, program: NativeId) -> Result<()>;

    /// Write a uniform of a linked program
    fn set_uniform(&mut self, program: NativeId, location: UniformLocation, value: &UniformValue) -> Result<()>;

    /// Read a uniform of a linked program
    fn get_uniform(&self, program: NativeId, location: UniformLocation, kind: UniformKind) -> Result<UniformValue>;

    // ===== VERTEX INPUT & DRAW =====

    /// Source attribute `location` from `buffer`
    fn enable_vertex_attribute(&mut self, location: u32, buffer: NativeId, format: BufferFormat) -> Result<()>;

    /// Stop sourcing attribute `location`
    fn disable_vertex_attribute(&mut self, location: u32) -> Result<()>;

    /// Draw `count` vertices in buffer order starting at `first`
    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) -> Result<()>;

    /// Draw `count` indices from the bound element buffer
    fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: IndexType, offset: u64) -> Result<()>;

    /// Get statistics about the device
    fn stats(&self) -> DeviceStats;
}

/// Lock the shared device, mapping a poisoned lock to a backend error
pub(crate) fn lock_device(device: &SharedGraphicsDevice) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))
}
