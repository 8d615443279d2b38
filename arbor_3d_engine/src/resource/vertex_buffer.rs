/// Vertex attribute buffer with a scoped map/write/unmap protocol.
///
/// A VertexAttributeBuffer owns a fixed number of elements of one
/// `BufferFormat` and remembers the shader variable it feeds. Its content is
/// only reachable through a `BufferMapping`, which:
/// - borrows the buffer mutably, so only one mapping can exist at a time
/// - exposes typed indexed access instead of raw memory
/// - commits on `unmap()` (or on drop) and is unusable afterwards

use bytemuck::Pod;
use glam::{Vec2, Vec3, Vec4};
use crate::error::{Error, Result};
use crate::engine_fail;
use crate::graphics_device::{
    lock_device, BufferFormat, BufferTarget, BufferUsage, MapAccess, NativeId, ObjectKind,
    SharedGraphicsDevice,
};
use crate::resource::GpuHandle;

// ===== VERTEX ELEMENT =====

/// Plain-old-data type that can be stored in a vertex attribute buffer
pub trait VertexElement: Pod {
    /// Buffer format this type is laid out as
    const FORMAT: BufferFormat;
}

impl VertexElement for f32 { const FORMAT: BufferFormat = BufferFormat::R32_SFLOAT; }
impl VertexElement for [f32; 2] { const FORMAT: BufferFormat = BufferFormat::R32G32_SFLOAT; }
impl VertexElement for [f32; 3] { const FORMAT: BufferFormat = BufferFormat::R32G32B32_SFLOAT; }
impl VertexElement for [f32; 4] { const FORMAT: BufferFormat = BufferFormat::R32G32B32A32_SFLOAT; }
impl VertexElement for Vec2 { const FORMAT: BufferFormat = BufferFormat::R32G32_SFLOAT; }
impl VertexElement for Vec3 { const FORMAT: BufferFormat = BufferFormat::R32G32B32_SFLOAT; }
impl VertexElement for Vec4 { const FORMAT: BufferFormat = BufferFormat::R32G32B32A32_SFLOAT; }
impl VertexElement for i32 { const FORMAT: BufferFormat = BufferFormat::R32_SINT; }
impl VertexElement for u32 { const FORMAT: BufferFormat = BufferFormat::R32_UINT; }
impl VertexElement for [u8; 4] { const FORMAT: BufferFormat = BufferFormat::R8G8B8A8_UINT; }

// ===== VERTEX ATTRIBUTE BUFFER DESC =====

/// Descriptor for creating a VertexAttributeBuffer
pub struct VertexAttributeBufferDesc {
    pub graphics_device: SharedGraphicsDevice,
    pub format: BufferFormat,
    /// Number of elements (fixed for the lifetime of the buffer)
    pub count: u32,
    pub usage: BufferUsage,
    /// Shader variable this buffer feeds (e.g. "vPosition")
    pub var_name: String,
}

// ===== VERTEX ATTRIBUTE BUFFER =====

/// GPU buffer holding one vertex attribute stream
#[derive(Debug)]
pub struct VertexAttributeBuffer {
    handle: GpuHandle,
    format: BufferFormat,
    count: u32,
    usage: BufferUsage,
    var_name: String,
}

impl VertexAttributeBuffer {
    /// Allocate `count * format.size_bytes()` bytes of native storage
    ///
    /// Fails with `InvalidCount` before anything is allocated when `count` is 0.
    pub fn from_desc(desc: VertexAttributeBufferDesc) -> Result<Self> {
        if desc.count == 0 {
            engine_fail!("arbor3d::VertexAttributeBuffer", Error::InvalidCount(format!(
                "vertex buffer '{}' must hold at least one element", desc.var_name
            )));
        }

        let handle = GpuHandle::acquire(desc.graphics_device, ObjectKind::Buffer)?;
        let size = desc.count as u64 * desc.format.size_bytes() as u64;
        {
            let mut device = lock_device(handle.graphics_device())?;
            device.bind_buffer(BufferTarget::Array, handle.id())?;
            device.buffer_data(BufferTarget::Array, handle.id(), size, None, desc.usage)?;
            device.bind_buffer(BufferTarget::Array, 0)?;
        }

        crate::engine_debug!("arbor3d::VertexAttributeBuffer",
            "Created '{}' buffer {}: {} x {:?} ({} bytes)",
            desc.var_name, handle.id(), desc.count, desc.format, size);

        Ok(Self {
            handle,
            format: desc.format,
            count: desc.count,
            usage: desc.usage,
            var_name: desc.var_name,
        })
    }

    // ===== ACCESSORS =====

    /// Native buffer id (0 once released)
    pub fn id(&self) -> NativeId { self.handle.id() }

    /// Element format
    pub fn format(&self) -> BufferFormat { self.format }

    /// Number of elements
    pub fn count(&self) -> u32 { self.count }

    /// Usage hint given at creation
    pub fn usage(&self) -> BufferUsage { self.usage }

    /// Shader variable this buffer feeds
    pub fn var_name(&self) -> &str { &self.var_name }

    /// Total storage size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.count as u64 * self.format.size_bytes() as u64
    }

    /// Underlying native handle
    pub fn handle(&self) -> &GpuHandle { &self.handle }

    /// Release the native buffer now instead of at drop
    pub fn release(&mut self) {
        self.handle.release();
    }

    // ===== MAPPING =====

    /// Map the buffer for typed access
    ///
    /// `T` must match the buffer format. The returned mapping must be
    /// unmapped (explicitly or by dropping it) before the buffer is drawn.
    pub fn map<T: VertexElement>(&mut self, access: MapAccess) -> Result<BufferMapping<'_, T>> {
        if access.is_empty() {
            engine_fail!("arbor3d::VertexAttributeBuffer",
                Error::UsageError("map requested with no access".to_string()));
        }
        if T::FORMAT != self.format {
            engine_fail!("arbor3d::VertexAttributeBuffer", Error::UsageError(format!(
                "buffer '{}' holds {:?}, mapped as {:?}", self.var_name, self.format, T::FORMAT
            )));
        }

        let id = self.handle.live_id()?;
        let bytes = lock_device(self.handle.graphics_device())?.map_buffer(id, access)?;
        let elements: Vec<T> = bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect();

        Ok(BufferMapping {
            buffer: self,
            access,
            elements,
            unmapped: false,
        })
    }

    /// Replace the whole content with `data` (exactly `count` elements)
    pub fn write<T: VertexElement>(&mut self, data: &[T]) -> Result<()> {
        let mut mapping = self.map::<T>(MapAccess::WRITE)?;
        mapping.write_all(data)?;
        mapping.unmap()
    }

    /// Copy the current content out through a read-only mapping
    pub fn read_back<T: VertexElement>(&mut self) -> Result<Vec<T>> {
        let mapping = self.map::<T>(MapAccess::READ)?;
        let elements = mapping.as_slice()?.to_vec();
        mapping.unmap()?;
        Ok(elements)
    }
}

// ===== BUFFER MAPPING =====

/// Scoped typed view over a mapped VertexAttributeBuffer
///
/// Reads need `MapAccess::READ`, writes need `MapAccess::WRITE`.
pub struct BufferMapping<'a, T: VertexElement> {
    buffer: &'a mut VertexAttributeBuffer,
    access: MapAccess,
    elements: Vec<T>,
    unmapped: bool,
}

impl<'a, T: VertexElement> BufferMapping<'a, T> {
    /// Number of elements in the mapped range
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Access this mapping was opened with
    pub fn access(&self) -> MapAccess {
        self.access
    }

    /// Read element `index`
    pub fn get(&self, index: usize) -> Result<T> {
        self.require(MapAccess::READ)?;
        self.elements.get(index).copied().ok_or(Error::IndexOutOfRange {
            index: index as u32,
            vertex_count: self.elements.len() as u32,
        })
    }

    /// Write element `index`
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.require(MapAccess::WRITE)?;
        let vertex_count = self.elements.len() as u32;
        let slot = self.elements.get_mut(index).ok_or(Error::IndexOutOfRange {
            index: index as u32,
            vertex_count,
        })?;
        *slot = value;
        Ok(())
    }

    /// All elements, read-only
    pub fn as_slice(&self) -> Result<&[T]> {
        self.require(MapAccess::READ)?;
        Ok(&self.elements)
    }

    /// All elements, writable
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        self.require(MapAccess::WRITE)?;
        Ok(&mut self.elements)
    }

    /// Overwrite every element; `data` must hold exactly `len()` elements
    pub fn write_all(&mut self, data: &[T]) -> Result<()> {
        self.require(MapAccess::WRITE)?;
        if data.len() != self.elements.len() {
            return Err(Error::InvalidCount(format!(
                "wrote {} elements into a buffer of {}", data.len(), self.elements.len()
            )));
        }
        self.elements.copy_from_slice(data);
        Ok(())
    }

    /// Commit pending writes and end the mapping
    pub fn unmap(mut self) -> Result<()> {
        self.finish()
    }

    fn require(&self, needed: MapAccess) -> Result<()> {
        if !self.access.contains(needed) {
            return Err(Error::UsageError(format!(
                "buffer '{}' mapped {:?}, operation needs {:?}",
                self.buffer.var_name, self.access, needed
            )));
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.unmapped {
            return Ok(());
        }
        self.unmapped = true;
        let commit: Option<&[u8]> = if self.access.contains(MapAccess::WRITE) {
            Some(bytemuck::cast_slice(&self.elements))
        } else {
            None
        };
        lock_device(self.buffer.handle.graphics_device())?.unmap_buffer(self.buffer.handle.id(), commit)
    }
}

impl<'a, T: VertexElement> Drop for BufferMapping<'a, T> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            crate::engine_error!("arbor3d::BufferMapping",
                "Failed to unmap buffer '{}': {}", self.buffer.var_name, e);
        }
    }
}

#[cfg(test)]
#[path = "vertex_buffer_tests.rs"]
mod tests;
