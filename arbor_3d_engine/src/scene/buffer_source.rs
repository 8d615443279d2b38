/// Model capability consumed once when a node's render units are built.

use std::sync::Arc;
use crate::error::Result;
use crate::resource::{IndexBuffer, VertexAttributeBuffer};

/// Supplies the buffers of one model
///
/// Implementations usually create buffers lazily on first request and hand
/// out the same shared buffer for every later request of the same role.
pub trait BufferSource {
    /// Buffer playing `buffer_role`, to be read by shader variable `var_name`
    fn vertex_attribute_buffer(&mut self, buffer_role: &str, var_name: &str) -> Result<Arc<VertexAttributeBuffer>>;

    /// Index buffer describing how the vertices are walked
    fn index_buffer(&mut self) -> Result<Arc<IndexBuffer>>;
}
