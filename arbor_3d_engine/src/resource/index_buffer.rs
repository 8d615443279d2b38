/// Index buffers: how a render unit walks its vertex buffers.
///
/// Two addressing variants:
/// - `ZeroIndexBuffer`: no storage, vertices are consumed in buffer order
///   from `first` for `count` vertices (`draw_arrays`)
/// - `ExplicitIndexBuffer`: an element buffer holding an index list
///   (`draw_elements`), every index validated against the vertex count
///
/// In both cases `count` must suit the draw mode (quad strips need at least
/// four vertices and an even count, triangles a multiple of three...).

use crate::error::{Error, Result};
use crate::engine_fail;
use crate::graphics_device::{
    lock_device, BufferTarget, BufferUsage, DrawMode, GraphicsDevice, IndexType, NativeId,
    ObjectKind, SharedGraphicsDevice,
};
use crate::resource::GpuHandle;

// ===== ZERO INDEX BUFFER =====

/// Implicit index range `[first, first + count)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroIndexBuffer {
    mode: DrawMode,
    first: u32,
    count: u32,
}

impl ZeroIndexBuffer {
    /// Fails with `InvalidCount` when `count` does not suit `mode` or the
    /// range end does not fit in a u32
    pub fn new(mode: DrawMode, first: u32, count: u32) -> Result<Self> {
        if let Err(error) = mode.validate_count(count) {
            engine_fail!("arbor3d::ZeroIndexBuffer", error);
        }
        if first.checked_add(count).is_none() {
            engine_fail!("arbor3d::ZeroIndexBuffer", Error::InvalidCount(format!(
                "range {} + {} exceeds the u32 vertex space", first, count
            )));
        }
        Ok(Self { mode, first, count })
    }

    pub fn mode(&self) -> DrawMode { self.mode }
    pub fn first(&self) -> u32 { self.first }
    pub fn count(&self) -> u32 { self.count }
}

// ===== INDEX DATA =====

/// Index list with its element width
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    /// Element type of the list
    pub fn index_type(&self) -> IndexType {
        match self {
            IndexData::U8(_) => IndexType::U8,
            IndexData::U16(_) => IndexType::U16,
            IndexData::U32(_) => IndexType::U32,
        }
    }

    /// Number of indices
    pub fn len(&self) -> usize {
        match self {
            IndexData::U8(v) => v.len(),
            IndexData::U16(v) => v.len(),
            IndexData::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index `i` widened to u32
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexData::U8(v) => v.get(i).map(|x| *x as u32),
            IndexData::U16(v) => v.get(i).map(|x| *x as u32),
            IndexData::U32(v) => v.get(i).copied(),
        }
    }

    /// Indices widened to u32, in order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Largest index in the list
    pub fn max_index(&self) -> Option<u32> {
        self.iter().max()
    }

    /// Raw bytes as uploaded to the element buffer
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U8(v) => v.as_slice(),
            IndexData::U16(v) => bytemuck::cast_slice(v),
            IndexData::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

// ===== EXPLICIT INDEX BUFFER =====

/// Descriptor for creating an ExplicitIndexBuffer
pub struct ExplicitIndexBufferDesc {
    pub graphics_device: SharedGraphicsDevice,
    pub mode: DrawMode,
    pub indices: IndexData,
    /// Number of vertices the indices address; every index must be below it
    pub vertex_count: u32,
    pub usage: BufferUsage,
}

/// Element buffer holding an explicit index list
#[derive(Debug)]
pub struct ExplicitIndexBuffer {
    handle: GpuHandle,
    mode: DrawMode,
    index_type: IndexType,
    count: u32,
    max_index: u32,
}

impl ExplicitIndexBuffer {
    /// Validate the index list, then upload it
    ///
    /// Count and range errors are raised before any native object exists.
    pub fn from_desc(desc: ExplicitIndexBufferDesc) -> Result<Self> {
        let count = desc.indices.len() as u32;
        if let Err(error) = desc.mode.validate_count(count) {
            engine_fail!("arbor3d::ExplicitIndexBuffer", error);
        }
        for index in desc.indices.iter() {
            if index >= desc.vertex_count {
                engine_fail!("arbor3d::ExplicitIndexBuffer", Error::IndexOutOfRange {
                    index,
                    vertex_count: desc.vertex_count,
                });
            }
        }

        let handle = GpuHandle::acquire(desc.graphics_device, ObjectKind::Buffer)?;
        let bytes = desc.indices.as_bytes();
        {
            let mut device = lock_device(handle.graphics_device())?;
            device.bind_buffer(BufferTarget::ElementArray, handle.id())?;
            device.buffer_data(BufferTarget::ElementArray, handle.id(), bytes.len() as u64, Some(bytes), desc.usage)?;
            device.bind_buffer(BufferTarget::ElementArray, 0)?;
        }

        crate::engine_debug!("arbor3d::ExplicitIndexBuffer",
            "Created index buffer {}: {} x {:?} ({:?})",
            handle.id(), count, desc.indices.index_type(), desc.mode);

        Ok(Self {
            handle,
            mode: desc.mode,
            index_type: desc.indices.index_type(),
            count,
            max_index: desc.indices.max_index().unwrap_or(0),
        })
    }

    /// Native element buffer id (0 once released)
    pub fn id(&self) -> NativeId { self.handle.id() }
    pub fn mode(&self) -> DrawMode { self.mode }
    pub fn index_type(&self) -> IndexType { self.index_type }
    pub fn count(&self) -> u32 { self.count }

    /// Largest index stored
    pub fn max_index(&self) -> u32 { self.max_index }

    /// Release the native buffer now instead of at drop
    pub fn release(&mut self) {
        self.handle.release();
    }
}

// ===== INDEX BUFFER =====

/// Index buffer of a render unit, in either addressing variant
#[derive(Debug)]
pub enum IndexBuffer {
    Zero(ZeroIndexBuffer),
    Explicit(ExplicitIndexBuffer),
}

impl IndexBuffer {
    /// Zero-based range, validated against `mode`
    pub fn zero(mode: DrawMode, first: u32, count: u32) -> Result<Self> {
        Ok(IndexBuffer::Zero(ZeroIndexBuffer::new(mode, first, count)?))
    }

    /// Explicit index list uploaded to an element buffer
    pub fn explicit(desc: ExplicitIndexBufferDesc) -> Result<Self> {
        Ok(IndexBuffer::Explicit(ExplicitIndexBuffer::from_desc(desc)?))
    }

    pub fn mode(&self) -> DrawMode {
        match self {
            IndexBuffer::Zero(zero) => zero.mode(),
            IndexBuffer::Explicit(explicit) => explicit.mode(),
        }
    }

    /// First vertex (zero-based) or byte offset start (always 0 for explicit)
    pub fn first(&self) -> u32 {
        match self {
            IndexBuffer::Zero(zero) => zero.first(),
            IndexBuffer::Explicit(_) => 0,
        }
    }

    /// Number of vertices the draw call consumes
    pub fn count(&self) -> u32 {
        match self {
            IndexBuffer::Zero(zero) => zero.count(),
            IndexBuffer::Explicit(explicit) => explicit.count(),
        }
    }

    /// Number of vertices every attribute buffer must hold for this range
    pub fn max_vertex(&self) -> u32 {
        match self {
            IndexBuffer::Zero(zero) => zero.first() + zero.count(),
            IndexBuffer::Explicit(explicit) => explicit.max_index() + 1,
        }
    }

    /// Issue the draw call for this range on an already locked device
    ///
    /// The explicit variant binds its element buffer for the call and unbinds
    /// it afterwards.
    pub(crate) fn draw(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        match self {
            IndexBuffer::Zero(zero) => device.draw_arrays(zero.mode(), zero.first(), zero.count()),
            IndexBuffer::Explicit(explicit) => {
                let id = explicit.handle.live_id()?;
                device.bind_buffer(BufferTarget::ElementArray, id)?;
                device.draw_elements(explicit.mode(), explicit.count(), explicit.index_type(), 0)?;
                device.bind_buffer(BufferTarget::ElementArray, 0)
            }
        }
    }
}

#[cfg(test)]
#[path = "index_buffer_tests.rs"]
mod tests;
