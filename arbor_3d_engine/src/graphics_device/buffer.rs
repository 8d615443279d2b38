/// Buffer enums shared by the device trait and the resource layer

use bitflags::bitflags;

/// Binding point a buffer object is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Index (element) data
    ElementArray,
    /// Uniform block data
    Uniform,
}

/// Usage hint given to the driver when storage is allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, drawn many times
    StaticDraw,
    /// Rewritten occasionally, drawn many times
    DynamicDraw,
    /// Rewritten every frame
    StreamDraw,
    /// Written by the GPU, read back by the application
    StaticRead,
    DynamicRead,
    StreamRead,
    /// Written and consumed by the GPU
    StaticCopy,
    DynamicCopy,
    StreamCopy,
}

bitflags! {
    /// Access requested when a buffer is mapped
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapAccess: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// Element format of a vertex attribute buffer
///
/// Defines the data type and component count of one buffer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    // Float formats
    R32_SFLOAT,          // float (4 bytes)
    R32G32_SFLOAT,       // vec2 (8 bytes)
    R32G32B32_SFLOAT,    // vec3 (12 bytes)
    R32G32B32A32_SFLOAT, // vec4 (16 bytes)

    // Integer formats (signed)
    R32_SINT,
    R32G32_SINT,
    R32G32B32_SINT,
    R32G32B32A32_SINT,

    // Integer formats (unsigned)
    R32_UINT,
    R32G32_UINT,
    R32G32B32_UINT,
    R32G32B32A32_UINT,

    // Byte formats (unsigned, e.g. packed colors)
    R8G8B8A8_UINT,
}

impl BufferFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT | BufferFormat::R32_SINT | BufferFormat::R32_UINT => 4,
            BufferFormat::R32G32_SFLOAT | BufferFormat::R32G32_SINT | BufferFormat::R32G32_UINT => 8,
            BufferFormat::R32G32B32_SFLOAT | BufferFormat::R32G32B32_SINT | BufferFormat::R32G32B32_UINT => 12,
            BufferFormat::R32G32B32A32_SFLOAT | BufferFormat::R32G32B32A32_SINT | BufferFormat::R32G32B32A32_UINT => 16,
            BufferFormat::R8G8B8A8_UINT => 4,
        }
    }

    /// Number of components (1 to 4) the shader sees per element
    pub fn component_count(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT | BufferFormat::R32_SINT | BufferFormat::R32_UINT => 1,
            BufferFormat::R32G32_SFLOAT | BufferFormat::R32G32_SINT | BufferFormat::R32G32_UINT => 2,
            BufferFormat::R32G32B32_SFLOAT | BufferFormat::R32G32B32_SINT | BufferFormat::R32G32B32_UINT => 3,
            BufferFormat::R32G32B32A32_SFLOAT
            | BufferFormat::R32G32B32A32_SINT
            | BufferFormat::R32G32B32A32_UINT
            | BufferFormat::R8G8B8A8_UINT => 4,
        }
    }
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 8-bit indices (max 255 vertices)
    U8,
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
