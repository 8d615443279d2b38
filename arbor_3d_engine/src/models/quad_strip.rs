/// Horizontal strip of quads, used for color palettes and gradient bars.
///
/// ```text
///  0    2    4    6    8    10
///  +----+----+----+----+----+   y = +0.5
///  |    |    |    |    |    |
///  +----+----+----+----+----+   y = -0.5
///  1    3    5    7    9    11
/// x = -0.5               x = +0.5
/// ```
///
/// `quad_count` quads need `(quad_count + 1) * 2` vertices, drawn as a
/// zero-based quad strip. Buffer roles:
/// - `position`: vec3, top then bottom vertex of each column
/// - `texCoord`: float, `i / quad_count` for both vertices of column `i`
/// - `color`: vec3 sampled from the first row of the bitmap
///
/// Buffers are created on first request and shared afterwards.

use std::sync::Arc;
use glam::Vec3;
use crate::error::{Error, Result};
use crate::engine_fail;
use crate::graphics_device::{BufferFormat, BufferUsage, DrawMode, MapAccess, SharedGraphicsDevice};
use crate::resource::{
    ImageData, IndexBuffer, VertexAttributeBuffer, VertexAttributeBufferDesc,
};
use crate::scene::BufferSource;

pub struct QuadStripModel {
    graphics_device: SharedGraphicsDevice,
    quad_count: u32,
    bitmap: Option<ImageData>,
    position_buffer: Option<Arc<VertexAttributeBuffer>>,
    tex_coord_buffer: Option<Arc<VertexAttributeBuffer>>,
    color_buffer: Option<Arc<VertexAttributeBuffer>>,
    index_buffer: Option<Arc<IndexBuffer>>,
}

impl QuadStripModel {
    pub const POSITION: &'static str = "position";
    pub const TEX_COORD: &'static str = "texCoord";
    pub const COLOR: &'static str = "color";

    /// `bitmap` is only needed when the `color` role is requested
    pub fn new(graphics_device: SharedGraphicsDevice, quad_count: u32, bitmap: Option<ImageData>) -> Result<Self> {
        if quad_count == 0 {
            engine_fail!("arbor3d::QuadStripModel",
                Error::InvalidCount("a quad strip needs at least one quad".to_string()));
        }
        if quad_count.checked_add(1).and_then(|n| n.checked_mul(2)).is_none() {
            engine_fail!("arbor3d::QuadStripModel", Error::InvalidCount(format!(
                "{} quads exceed the u32 vertex space", quad_count
            )));
        }
        Ok(Self {
            graphics_device,
            quad_count,
            bitmap,
            position_buffer: None,
            tex_coord_buffer: None,
            color_buffer: None,
            index_buffer: None,
        })
    }

    pub fn quad_count(&self) -> u32 { self.quad_count }

    /// Vertices in the strip: `(quad_count + 1) * 2`, checked in `new`
    pub fn vertex_count(&self) -> u32 {
        (self.quad_count + 1) * 2
    }

    fn create_buffer(&self, format: BufferFormat, var_name: &str) -> Result<VertexAttributeBuffer> {
        VertexAttributeBuffer::from_desc(VertexAttributeBufferDesc {
            graphics_device: self.graphics_device.clone(),
            format,
            count: self.vertex_count(),
            usage: BufferUsage::StaticDraw,
            var_name: var_name.to_string(),
        })
    }

    fn build_positions(&self, var_name: &str) -> Result<VertexAttributeBuffer> {
        let mut buffer = self.create_buffer(BufferFormat::R32G32B32_SFLOAT, var_name)?;
        {
            let mut mapping = buffer.map::<Vec3>(MapAccess::WRITE)?;
            let q = self.quad_count as f32;
            for i in 0..=self.quad_count as usize {
                let x = -0.5 + i as f32 / q;
                mapping.set(i * 2, Vec3::new(x, 0.5, 0.0))?;
                mapping.set(i * 2 + 1, Vec3::new(x, -0.5, 0.0))?;
            }
            mapping.unmap()?;
        }
        Ok(buffer)
    }

    fn build_tex_coords(&self, var_name: &str) -> Result<VertexAttributeBuffer> {
        let mut buffer = self.create_buffer(BufferFormat::R32_SFLOAT, var_name)?;
        {
            let mut mapping = buffer.map::<f32>(MapAccess::WRITE)?;
            for i in 0..=self.quad_count as usize {
                let u = i as f32 / self.quad_count as f32;
                mapping.set(i * 2, u)?;
                mapping.set(i * 2 + 1, u)?;
            }
            mapping.unmap()?;
        }
        Ok(buffer)
    }

    fn build_colors(&self, var_name: &str) -> Result<VertexAttributeBuffer> {
        let bitmap = match &self.bitmap {
            Some(bitmap) => bitmap,
            None => engine_fail!("arbor3d::QuadStripModel", Error::InvalidResource(
                "the color role needs a bitmap".to_string()
            )),
        };
        let mut buffer = self.create_buffer(BufferFormat::R32G32B32_SFLOAT, var_name)?;
        {
            let mut mapping = buffer.map::<Vec3>(MapAccess::WRITE)?;
            let width = bitmap.width() as u64;
            for i in 0..=self.quad_count {
                let column = (width * i as u64 / self.quad_count as u64).min(width - 1);
                let x = column as u32;
                let color = bitmap.pixel(x, 0).map(bgra_to_rgb).unwrap_or(Vec3::ZERO);
                mapping.set(i as usize * 2, color)?;
                mapping.set(i as usize * 2 + 1, color)?;
            }
            mapping.unmap()?;
        }
        Ok(buffer)
    }
}

/// Normalized RGB of a BGRA pixel
fn bgra_to_rgb(bgra: [u8; 4]) -> Vec3 {
    Vec3::new(bgra[2] as f32, bgra[1] as f32, bgra[0] as f32) / 255.0
}

impl BufferSource for QuadStripModel {
    fn vertex_attribute_buffer(&mut self, buffer_role: &str, var_name: &str) -> Result<Arc<VertexAttributeBuffer>> {
        let cached = match buffer_role {
            Self::POSITION => &self.position_buffer,
            Self::TEX_COORD => &self.tex_coord_buffer,
            Self::COLOR => &self.color_buffer,
            _ => engine_fail!("arbor3d::QuadStripModel",
                Error::UnresolvedBinding(format!("{} (unknown buffer role)", buffer_role))),
        };
        if let Some(buffer) = cached {
            return Ok(buffer.clone());
        }

        let buffer = Arc::new(match buffer_role {
            Self::POSITION => self.build_positions(var_name)?,
            Self::TEX_COORD => self.build_tex_coords(var_name)?,
            _ => self.build_colors(var_name)?,
        });
        let slot = match buffer_role {
            Self::POSITION => &mut self.position_buffer,
            Self::TEX_COORD => &mut self.tex_coord_buffer,
            _ => &mut self.color_buffer,
        };
        *slot = Some(buffer.clone());
        Ok(buffer)
    }

    fn index_buffer(&mut self) -> Result<Arc<IndexBuffer>> {
        if let Some(index_buffer) = &self.index_buffer {
            return Ok(index_buffer.clone());
        }
        let index_buffer = Arc::new(IndexBuffer::zero(DrawMode::QuadStrip, 0, self.vertex_count())?);
        self.index_buffer = Some(index_buffer.clone());
        Ok(index_buffer)
    }
}

#[cfg(test)]
#[path = "quad_strip_tests.rs"]
mod tests;
