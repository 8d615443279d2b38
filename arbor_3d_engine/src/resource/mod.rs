//! Resource management module
//!
//! GPU-side objects owned through `GpuHandle`: vertex and index buffers,
//! textures, samplers and shader programs, plus the named registry that
//! owns the shareable ones.

mod handle;
mod vertex_buffer;
mod index_buffer;
mod texture;
mod sampler;
mod shader_program;
mod resource_manager;

pub use handle::GpuHandle;
pub use vertex_buffer::{
    VertexElement, VertexAttributeBuffer, VertexAttributeBufferDesc, BufferMapping,
};
pub use index_buffer::{
    IndexBuffer, ZeroIndexBuffer, ExplicitIndexBuffer, ExplicitIndexBufferDesc, IndexData,
};
pub use texture::{Texture, TextureDesc, ImageData};
pub use sampler::{Sampler, SamplerDesc, SamplerParams};
pub use shader_program::{ShaderProgram, ShaderStageDesc, UniformData};
pub use resource_manager::ResourceManager;
