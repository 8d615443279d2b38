/// Primitive assembly modes and their vertex-count rules

use crate::error::{Error, Result};

/// Primitive mode of a draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    Polygon,
}

impl DrawMode {
    /// Smallest vertex count that produces one primitive
    pub fn min_vertices(&self) -> u32 {
        match self {
            DrawMode::Points => 1,
            DrawMode::Lines | DrawMode::LineLoop | DrawMode::LineStrip => 2,
            DrawMode::Triangles
            | DrawMode::TriangleStrip
            | DrawMode::TriangleFan
            | DrawMode::Polygon => 3,
            DrawMode::Quads | DrawMode::QuadStrip => 4,
        }
    }

    /// The vertex count must be a multiple of this value
    pub fn vertex_multiple(&self) -> u32 {
        match self {
            DrawMode::Lines | DrawMode::QuadStrip => 2,
            DrawMode::Triangles => 3,
            DrawMode::Quads => 4,
            _ => 1,
        }
    }

    /// Check that `count` vertices form whole primitives in this mode
    pub fn validate_count(&self, count: u32) -> Result<()> {
        if count < self.min_vertices() {
            return Err(Error::InvalidCount(format!(
                "{:?} needs at least {} vertices, got {}",
                self,
                self.min_vertices(),
                count
            )));
        }
        if count % self.vertex_multiple() != 0 {
            return Err(Error::InvalidCount(format!(
                "{:?} needs a multiple of {} vertices, got {}",
                self,
                self.vertex_multiple(),
                count
            )));
        }
        Ok(())
    }
}
