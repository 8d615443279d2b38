/// Central resource manager for the engine.
///
/// Owns the shareable GPU resources by name: shader programs, textures and
/// samplers. Render units and nodes only borrow programs from here (as weak
/// or shared references); removing an entry drops the manager's ownership,
/// and the native object is deleted once the last owner lets go.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::SharedGraphicsDevice;
use crate::resource::{
    ImageData, Sampler, SamplerDesc, ShaderProgram, ShaderStageDesc, Texture, TextureDesc,
};

pub struct ResourceManager {
    programs: FxHashMap<String, Arc<ShaderProgram>>,
    textures: FxHashMap<String, Arc<Texture>>,
    samplers: FxHashMap<String, Arc<Sampler>>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    /// Create a new empty resource manager
    pub fn new() -> Self {
        Self {
            programs: FxHashMap::default(),
            textures: FxHashMap::default(),
            samplers: FxHashMap::default(),
        }
    }

    // ===== PROGRAMS =====

    /// Link a program and register it under `name`
    pub fn create_program(
        &mut self,
        name: String,
        graphics_device: SharedGraphicsDevice,
        stages: &[ShaderStageDesc],
    ) -> Result<Arc<ShaderProgram>> {
        if self.programs.contains_key(&name) {
            engine_bail!("arbor3d::ResourceManager", "Program '{}' already exists", name);
        }
        let program = Arc::new(ShaderProgram::link(graphics_device, stages)?);
        self.programs.insert(name, program.clone());
        Ok(program)
    }

    pub fn program(&self, name: &str) -> Option<Arc<ShaderProgram>> {
        self.programs.get(name).cloned()
    }

    /// Drop the manager's ownership of program `name`
    pub fn remove_program(&mut self, name: &str) -> bool {
        self.programs.remove(name).is_some()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    // ===== TEXTURES =====

    /// Create a texture, upload `image` and register it under `name`
    pub fn create_texture(&mut self, name: String, desc: TextureDesc, image: &ImageData) -> Result<Arc<Texture>> {
        if self.textures.contains_key(&name) {
            engine_bail!("arbor3d::ResourceManager", "Texture '{}' already exists", name);
        }
        let mut texture = Texture::from_desc(desc)?;
        texture.upload(image)?;
        self.add_texture(name, texture)
    }

    /// Register an already built texture under `name`
    pub fn add_texture(&mut self, name: String, texture: Texture) -> Result<Arc<Texture>> {
        if self.textures.contains_key(&name) {
            engine_bail!("arbor3d::ResourceManager", "Texture '{}' already exists", name);
        }
        let texture = Arc::new(texture);
        self.textures.insert(name, texture.clone());
        Ok(texture)
    }

    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        self.textures.get(name).cloned()
    }

    pub fn remove_texture(&mut self, name: &str) -> bool {
        self.textures.remove(name).is_some()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ===== SAMPLERS =====

    pub fn create_sampler(&mut self, name: String, desc: SamplerDesc) -> Result<Arc<Sampler>> {
        if self.samplers.contains_key(&name) {
            engine_bail!("arbor3d::ResourceManager", "Sampler '{}' already exists", name);
        }
        let sampler = Arc::new(Sampler::from_desc(desc)?);
        self.samplers.insert(name, sampler.clone());
        Ok(sampler)
    }

    /// Register an already created sampler
    pub fn add_sampler(&mut self, name: String, sampler: Sampler) -> Result<Arc<Sampler>> {
        if self.samplers.contains_key(&name) {
            engine_bail!("arbor3d::ResourceManager", "Sampler '{}' already exists", name);
        }
        let sampler = Arc::new(sampler);
        self.samplers.insert(name, sampler.clone());
        Ok(sampler)
    }

    pub fn sampler(&self, name: &str) -> Option<Arc<Sampler>> {
        self.samplers.get(name).cloned()
    }

    pub fn remove_sampler(&mut self, name: &str) -> bool {
        self.samplers.remove(name).is_some()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// Drop every registered resource
    pub fn clear(&mut self) {
        self.programs.clear();
        self.textures.clear();
        self.samplers.clear();
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
