//! Ready-made models implementing `BufferSource`.

mod quad_strip;

pub use quad_strip::QuadStripModel;
