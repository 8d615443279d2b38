/// Render units: one program, its attribute buffers and one index buffer.
///
/// A `RenderUnitBuilder` pairs a linked program with an `AttributeMap`.
/// `build` validates the pairing before asking the model for any buffer:
/// - every mapped variable must be an attribute of the program
/// - every program attribute must be mapped
/// Then it fetches the buffers and checks the index range fits all of them.
///
/// The unit keeps only a weak reference to its program; the program is
/// owned by whoever created it (a node or the resource manager). A builder
/// holds a strong reference, but a temporary builder passed straight to
/// `build` is dropped with it: keep another `Arc` to the program, or go
/// through `SceneNode::add_render_unit`, which retains it.

use std::sync::{Arc, Weak};
use crate::error::{Error, Result};
use crate::engine_fail;
use crate::graphics_device::{lock_device, GraphicsDevice};
use crate::resource::{IndexBuffer, ShaderProgram, VertexAttributeBuffer};
use super::attribute_map::AttributeMap;
use super::buffer_source::BufferSource;

// ===== BUILDER =====

/// Recipe for a render unit, reusable across models
#[derive(Debug, Clone)]
pub struct RenderUnitBuilder {
    program: Arc<ShaderProgram>,
    attribute_map: AttributeMap,
}

impl RenderUnitBuilder {
    pub fn new(program: Arc<ShaderProgram>, attribute_map: AttributeMap) -> Self {
        Self { program, attribute_map }
    }

    pub fn program(&self) -> &Arc<ShaderProgram> { &self.program }
    pub fn attribute_map(&self) -> &AttributeMap { &self.attribute_map }

    /// Resolve every binding against `source` and build the unit
    pub fn build(&self, source: &mut dyn BufferSource) -> Result<RenderUnit> {
        // ========== VALIDATION 1: mapped variables exist in the program ==========
        let mut locations = Vec::with_capacity(self.attribute_map.len());
        for entry in self.attribute_map.iter() {
            match self.program.attribute_location(&entry.var_name) {
                Some(location) => locations.push(location),
                None => engine_fail!("arbor3d::RenderUnitBuilder",
                    Error::UnresolvedBinding(entry.var_name.clone())),
            }
        }

        // ========== VALIDATION 2: program attributes are all mapped ==========
        for name in self.program.attribute_names() {
            if !self.attribute_map.contains_var(name) {
                engine_fail!("arbor3d::RenderUnitBuilder", Error::UnresolvedBinding(name.clone()));
            }
        }

        // ========== FETCH BUFFERS ==========
        let mut bindings = Vec::with_capacity(locations.len());
        for (entry, location) in self.attribute_map.iter().zip(locations) {
            let buffer = source.vertex_attribute_buffer(&entry.buffer_role, &entry.var_name)?;
            bindings.push(AttributeBinding {
                var_name: entry.var_name.clone(),
                location,
                buffer,
            });
        }
        let index_buffer = source.index_buffer()?;

        // ========== VALIDATION 3: index range fits every buffer ==========
        let needed = index_buffer.max_vertex();
        for binding in &bindings {
            if needed > binding.buffer.count() {
                engine_fail!("arbor3d::RenderUnitBuilder", Error::IndexOutOfRange {
                    index: needed - 1,
                    vertex_count: binding.buffer.count(),
                });
            }
        }

        crate::engine_debug!("arbor3d::RenderUnitBuilder",
            "Built render unit: program {}, {} attributes, {:?} x {}",
            self.program.id(), bindings.len(), index_buffer.mode(), index_buffer.count());

        Ok(RenderUnit {
            program: Arc::downgrade(&self.program),
            bindings,
            index_buffer,
        })
    }
}

// ===== RENDER UNIT =====

/// One resolved vertex attribute binding
#[derive(Debug, Clone)]
pub struct AttributeBinding {
    pub var_name: String,
    /// Vertex attribute location in the program
    pub location: u32,
    pub buffer: Arc<VertexAttributeBuffer>,
}

/// Drawable batch: one program, its attribute buffers and one index buffer
#[derive(Debug)]
pub struct RenderUnit {
    program: Weak<ShaderProgram>,
    bindings: Vec<AttributeBinding>,
    index_buffer: Arc<IndexBuffer>,
}

impl RenderUnit {
    /// Program of this unit; fails once its owner dropped it
    pub fn program(&self) -> Result<Arc<ShaderProgram>> {
        self.program
            .upgrade()
            .ok_or_else(|| Error::UsageError("render unit program was dropped".to_string()))
    }

    /// Attribute bindings in enable order
    pub fn bindings(&self) -> &[AttributeBinding] { &self.bindings }

    pub fn index_buffer(&self) -> &IndexBuffer { &self.index_buffer }

    /// Bind, draw once, unbind in reverse order
    ///
    /// Uniforms must be set beforehand. Nothing stays bound once this returns,
    /// including when the draw call fails.
    pub fn render(&self) -> Result<()> {
        let program = self.program()?;
        let program_id = program.id();
        if program_id == 0 {
            return Err(Error::UsageError("render unit program was released".to_string()));
        }

        let mut device = lock_device(program.graphics_device())?;
        device.use_program(program_id)?;
        let drawn = self.enable_and_draw(&mut *device);
        for binding in self.bindings.iter().rev() {
            device.disable_vertex_attribute(binding.location)?;
        }
        device.use_program(0)?;
        drawn
    }

    fn enable_and_draw(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        for binding in &self.bindings {
            let buffer_id = binding.buffer.handle().live_id()?;
            device.enable_vertex_attribute(binding.location, buffer_id, binding.buffer.format())?;
        }
        self.index_buffer.draw(device)
    }
}

#[cfg(test)]
#[path = "render_unit_tests.rs"]
mod tests;
