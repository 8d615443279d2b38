/// Linked shader program with a name-based uniform surface.
///
/// A ShaderProgram is built from at least one vertex and one fragment stage.
/// The vertex stages declare, in location order, the attribute variables they
/// consume; that list is bound at link time and never changes afterwards.
///
/// Uniform locations are looked up lazily and cached per name (misses too).
/// A name the linker did not keep is reported as `Error::UnknownUniform`
/// for both writes and reads; `has_uniform` checks without failing.

use std::sync::Mutex;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::engine_fail;
use crate::graphics_device::{
    lock_device, NativeId, ObjectKind, ShaderStageKind, SharedGraphicsDevice, UniformKind,
    UniformLocation, UniformValue,
};
use crate::resource::GpuHandle;

// ===== UNIFORM DATA =====

/// Rust type that maps onto one uniform kind
pub trait UniformData: Sized {
    const KIND: UniformKind;

    fn into_value(self) -> UniformValue;

    fn from_value(value: UniformValue) -> Option<Self>;
}

macro_rules! impl_uniform_data {
    ($ty:ty, $variant:ident) => {
        impl UniformData for $ty {
            const KIND: UniformKind = UniformKind::$variant;

            fn into_value(self) -> UniformValue {
                UniformValue::$variant(self)
            }

            fn from_value(value: UniformValue) -> Option<Self> {
                match value {
                    UniformValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_uniform_data!(f32, Float);
impl_uniform_data!(i32, Int);
impl_uniform_data!(u32, UInt);
impl_uniform_data!(bool, Bool);
impl_uniform_data!(Vec2, Vec2);
impl_uniform_data!(Vec3, Vec3);
impl_uniform_data!(Vec4, Vec4);
impl_uniform_data!(Mat3, Mat3);
impl_uniform_data!(Mat4, Mat4);

// ===== STAGE DESC =====

/// One shader stage to compile into a program
#[derive(Debug, Clone)]
pub struct ShaderStageDesc {
    pub kind: ShaderStageKind,
    pub source: String,
    /// Attribute variables consumed by a vertex stage, in location order
    pub attribute_names: Vec<String>,
}

impl ShaderStageDesc {
    /// Vertex stage consuming `attribute_names`
    pub fn vertex(source: impl Into<String>, attribute_names: &[&str]) -> Self {
        Self {
            kind: ShaderStageKind::Vertex,
            source: source.into(),
            attribute_names: attribute_names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Fragment stage
    pub fn fragment(source: impl Into<String>) -> Self {
        Self {
            kind: ShaderStageKind::Fragment,
            source: source.into(),
            attribute_names: Vec::new(),
        }
    }
}

// ===== SHADER PROGRAM =====

#[derive(Debug)]
pub struct ShaderProgram {
    handle: GpuHandle,
    /// Index in this list is the attribute location
    attribute_names: Vec<String>,
    uniform_cache: Mutex<FxHashMap<String, Option<UniformLocation>>>,
}

impl ShaderProgram {
    /// Compile `stages`, bind attribute locations and link
    ///
    /// Stage objects are detached and deleted once the program is linked.
    pub fn link(graphics_device: SharedGraphicsDevice, stages: &[ShaderStageDesc]) -> Result<Self> {
        // ========== VALIDATION ==========
        let has_vertex = stages.iter().any(|s| s.kind == ShaderStageKind::Vertex);
        let has_fragment = stages.iter().any(|s| s.kind == ShaderStageKind::Fragment);
        if !has_vertex || !has_fragment {
            engine_fail!("arbor3d::ShaderProgram", Error::InvalidResource(
                "a program needs at least one vertex and one fragment stage".to_string()
            ));
        }

        let mut attribute_names: Vec<String> = Vec::new();
        for name in stages
            .iter()
            .filter(|s| s.kind == ShaderStageKind::Vertex)
            .flat_map(|s| s.attribute_names.iter())
        {
            if attribute_names.contains(name) {
                engine_fail!("arbor3d::ShaderProgram", Error::InvalidResource(format!(
                    "attribute '{}' declared twice", name
                )));
            }
            attribute_names.push(name.clone());
        }

        // ========== CREATE OBJECTS ==========
        let program = GpuHandle::acquire(graphics_device.clone(), ObjectKind::Program)?;
        let mut stage_handles = Vec::with_capacity(stages.len());
        for _ in stages {
            stage_handles.push(GpuHandle::acquire(graphics_device.clone(), ObjectKind::Shader)?);
        }

        // ========== COMPILE / BIND / LINK ==========
        {
            let mut device = lock_device(&graphics_device)?;
            for (stage, handle) in stages.iter().zip(&stage_handles) {
                device.compile_shader(handle.id(), stage.kind, &stage.source)?;
                device.attach_shader(program.id(), handle.id())?;
            }
            for (location, name) in attribute_names.iter().enumerate() {
                device.bind_attribute_location(program.id(), location as u32, name)?;
            }
            device.link_program(program.id())?;
            for handle in &stage_handles {
                device.detach_shader(program.id(), handle.id())?;
            }
        }
        for mut handle in stage_handles {
            handle.release();
        }

        crate::engine_debug!("arbor3d::ShaderProgram",
            "Linked program {} ({} stages, attributes {:?})",
            program.id(), stages.len(), attribute_names);

        Ok(Self {
            handle: program,
            attribute_names,
            uniform_cache: Mutex::new(FxHashMap::default()),
        })
    }

    // ===== ACCESSORS =====

    /// Native program id (0 once released)
    pub fn id(&self) -> NativeId { self.handle.id() }

    /// Attribute variables in location order
    pub fn attribute_names(&self) -> &[String] { &self.attribute_names }

    /// Location bound to attribute `name` at link time
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attribute_names.iter().position(|n| n == name).map(|i| i as u32)
    }

    /// Device this program lives on
    pub fn graphics_device(&self) -> &SharedGraphicsDevice {
        self.handle.graphics_device()
    }

    // ===== BINDING =====

    /// Make this the current program
    pub fn bind(&self) -> Result<()> {
        let id = self.handle.live_id()?;
        lock_device(self.handle.graphics_device())?.use_program(id)
    }

    /// Clear the current program
    pub fn unbind(&self) -> Result<()> {
        lock_device(self.handle.graphics_device())?.use_program(0)
    }

    /// Release the native program now instead of at drop
    pub fn release(&mut self) {
        self.handle.release();
    }

    // ===== UNIFORMS =====

    /// Cached location of uniform `name`, `None` when the linker dropped it
    pub fn uniform_location(&self, name: &str) -> Result<Option<UniformLocation>> {
        let mut cache = self.uniform_cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(location) = cache.get(name) {
            return Ok(*location);
        }
        let id = self.handle.live_id()?;
        let location = lock_device(self.handle.graphics_device())?.uniform_location(id, name);
        cache.insert(name.to_string(), location);
        Ok(location)
    }

    /// True when the linked program has an active uniform `name`
    pub fn has_uniform(&self, name: &str) -> bool {
        matches!(self.uniform_location(name), Ok(Some(_)))
    }

    /// Write a typed uniform
    pub fn set_uniform<V: UniformData>(&self, name: &str, value: V) -> Result<()> {
        self.set_uniform_value(name, value.into_value())
    }

    /// Write a uniform from an already-built value
    pub fn set_uniform_value(&self, name: &str, value: UniformValue) -> Result<()> {
        let location = self.require_uniform(name)?;
        lock_device(self.handle.graphics_device())?.set_uniform(self.handle.live_id()?, location, &value)
    }

    /// Read a typed uniform (zero until first written)
    pub fn get_uniform<V: UniformData>(&self, name: &str) -> Result<V> {
        let location = self.require_uniform(name)?;
        let value = lock_device(self.handle.graphics_device())?
            .get_uniform(self.handle.live_id()?, location, V::KIND)?;
        V::from_value(value).ok_or_else(|| Error::UsageError(format!(
            "uniform '{}' holds {:?}, read as {:?}", name, value.kind(), V::KIND
        )))
    }

    fn require_uniform(&self, name: &str) -> Result<UniformLocation> {
        match self.uniform_location(name)? {
            Some(location) => Ok(location),
            None => engine_fail!("arbor3d::ShaderProgram", Error::UnknownUniform(name.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "shader_program_tests.rs"]
mod tests;
