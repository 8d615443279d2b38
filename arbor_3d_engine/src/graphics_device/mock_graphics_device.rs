/// Mock graphics device (no GPU required)
///
/// Stands in for the native driver in unit and integration tests, and in any
/// headless setting where draw calls only need to be observed. It keeps real
/// buffer memory (so mapped writes can be read back), records every call in
/// order, counts deletes per id and emulates link-time uniform reflection by
/// scanning `uniform` declarations in the attached shader sources.

use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, SharedGraphicsDevice, NativeId, ObjectKind, DeviceStats,
    BufferTarget, BufferUsage, MapAccess, BufferFormat, IndexType, DrawMode,
    TextureTarget, PixelFormat, SamplerParameter,
    ShaderStageKind, UniformLocation, UniformKind, UniformValue,
};

// ============================================================================
// Recorded calls
// ============================================================================

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateObject { kind: ObjectKind, id: NativeId },
    DeleteObject { kind: ObjectKind, id: NativeId },
    BindBuffer { target: BufferTarget, id: NativeId },
    BufferData { id: NativeId, size: u64, usage: BufferUsage },
    MapBuffer { id: NativeId, access: MapAccess },
    UnmapBuffer { id: NativeId, committed: bool },
    ActiveTexture { unit: u32 },
    BindTexture { target: TextureTarget, id: NativeId },
    TexImage1D { target: TextureTarget, width: u32 },
    TexImage2D { target: TextureTarget, width: u32, height: u32 },
    SamplerParameter { id: NativeId, param: SamplerParameter },
    BindSampler { unit: u32, id: NativeId },
    CompileShader { id: NativeId, stage: ShaderStageKind },
    AttachShader { program: NativeId, shader: NativeId },
    DetachShader { program: NativeId, shader: NativeId },
    BindAttributeLocation { program: NativeId, location: u32, name: String },
    LinkProgram { program: NativeId },
    UseProgram { program: NativeId },
    SetUniform { program: NativeId, location: UniformLocation, value: UniformValue },
    EnableVertexAttribute { location: u32, buffer: NativeId, format: BufferFormat },
    DisableVertexAttribute { location: u32 },
    DrawArrays { mode: DrawMode, first: u32, count: u32 },
    DrawElements { mode: DrawMode, count: u32, index_type: IndexType, offset: u64 },
}

// ============================================================================
// Object state
// ============================================================================

#[derive(Debug, Default)]
struct MockBufferState {
    data: Vec<u8>,
    mapped: Option<MapAccess>,
}

#[derive(Debug, Default)]
struct MockTextureState {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[derive(Debug)]
struct MockShaderState {
    stage: ShaderStageKind,
    source: String,
}

#[derive(Debug, Default)]
struct MockProgramState {
    shaders: Vec<NativeId>,
    linked: bool,
    uniforms: FxHashMap<String, (UniformLocation, UniformKind)>,
    values: FxHashMap<UniformLocation, UniformValue>,
}

#[derive(Debug)]
enum MockObject {
    Buffer(MockBufferState),
    Texture(MockTextureState),
    Sampler(Vec<SamplerParameter>),
    Shader(MockShaderState),
    Program(MockProgramState),
}

impl MockObject {
    fn new(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Buffer => MockObject::Buffer(MockBufferState::default()),
            ObjectKind::Texture => MockObject::Texture(MockTextureState::default()),
            ObjectKind::Sampler => MockObject::Sampler(Vec::new()),
            ObjectKind::Shader => MockObject::Shader(MockShaderState {
                stage: ShaderStageKind::Vertex,
                source: String::new(),
            }),
            ObjectKind::Program => MockObject::Program(MockProgramState::default()),
        }
    }
}

// ============================================================================
// Mock device
// ============================================================================

/// Mock GraphicsDevice that tracks native objects without a GPU
#[derive(Debug)]
pub struct MockGraphicsDevice {
    next_id: NativeId,
    objects: FxHashMap<NativeId, MockObject>,
    delete_counts: FxHashMap<NativeId, u32>,
    calls: Vec<DeviceCall>,
    active_unit: u32,
    bound_textures: FxHashMap<(u32, TextureTarget), NativeId>,
    bound_buffers: FxHashMap<BufferTarget, NativeId>,
    current_program: NativeId,
    enabled_attributes: FxHashMap<u32, NativeId>,
    draw_calls: u32,
    fail_next_create: bool,
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGraphicsDevice {
    /// Create a new mock device with no objects
    pub fn new() -> Self {
        Self {
            next_id: 1,
            objects: FxHashMap::default(),
            delete_counts: FxHashMap::default(),
            calls: Vec::new(),
            active_unit: 0,
            bound_textures: FxHashMap::default(),
            bound_buffers: FxHashMap::default(),
            current_program: 0,
            enabled_attributes: FxHashMap::default(),
            draw_calls: 0,
            fail_next_create: false,
        }
    }

    /// Create a mock device and a shared handle to it
    ///
    /// The first value keeps the concrete type for inspection, the second is
    /// what resources are created with.
    pub fn shared() -> (Arc<Mutex<MockGraphicsDevice>>, SharedGraphicsDevice) {
        let mock = Arc::new(Mutex::new(Self::new()));
        let device: SharedGraphicsDevice = mock.clone();
        (mock, device)
    }

    // ===== INSPECTION =====

    /// All calls recorded so far, in issue order
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Forget recorded calls (objects are kept)
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Recorded draw calls only
    pub fn draw_calls(&self) -> Vec<DeviceCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::DrawArrays { .. } | DeviceCall::DrawElements { .. }))
            .cloned()
            .collect()
    }

    /// How many times `delete_object` was issued for `id`
    pub fn delete_count(&self, id: NativeId) -> u32 {
        self.delete_counts.get(&id).copied().unwrap_or(0)
    }

    /// True while the object exists
    pub fn is_alive(&self, id: NativeId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Current bytes of a buffer
    pub fn buffer_contents(&self, id: NativeId) -> Option<&[u8]> {
        match self.objects.get(&id) {
            Some(MockObject::Buffer(buffer)) => Some(&buffer.data),
            _ => None,
        }
    }

    /// True while a buffer is mapped
    pub fn is_mapped(&self, id: NativeId) -> bool {
        matches!(self.objects.get(&id), Some(MockObject::Buffer(b)) if b.mapped.is_some())
    }

    /// Uploaded image of a texture: (width, height, pixels)
    pub fn texture_image(&self, id: NativeId) -> Option<(u32, u32, &[u8])> {
        match self.objects.get(&id) {
            Some(MockObject::Texture(t)) => Some((t.width, t.height, &t.pixels)),
            _ => None,
        }
    }

    /// Texture bound to `target` on texture unit `unit` (0 when none)
    pub fn bound_texture(&self, unit: u32, target: TextureTarget) -> NativeId {
        self.bound_textures.get(&(unit, target)).copied().unwrap_or(0)
    }

    /// Buffer bound to `target` (0 when none)
    pub fn bound_buffer(&self, target: BufferTarget) -> NativeId {
        self.bound_buffers.get(&target).copied().unwrap_or(0)
    }

    /// Program currently in use (0 when none)
    pub fn current_program(&self) -> NativeId {
        self.current_program
    }

    /// Number of vertex attributes currently enabled
    pub fn enabled_attribute_count(&self) -> usize {
        self.enabled_attributes.len()
    }

    /// Sampler parameters applied so far
    pub fn sampler_parameters(&self, id: NativeId) -> Option<&[SamplerParameter]> {
        match self.objects.get(&id) {
            Some(MockObject::Sampler(params)) => Some(params),
            _ => None,
        }
    }

    /// Make the next `create_object` call fail with `OutOfMemory`
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    // ===== INTERNAL =====

    fn buffer_mut(&mut self, id: NativeId) -> Result<&mut MockBufferState> {
        match self.objects.get_mut(&id) {
            Some(MockObject::Buffer(buffer)) => Ok(buffer),
            _ => Err(Error::InvalidResource(format!("{} is not a buffer", id))),
        }
    }

    fn program(&self, id: NativeId) -> Result<&MockProgramState> {
        match self.objects.get(&id) {
            Some(MockObject::Program(program)) => Ok(program),
            _ => Err(Error::InvalidResource(format!("{} is not a program", id))),
        }
    }

    fn program_mut(&mut self, id: NativeId) -> Result<&mut MockProgramState> {
        match self.objects.get_mut(&id) {
            Some(MockObject::Program(program)) => Ok(program),
            _ => Err(Error::InvalidResource(format!("{} is not a program", id))),
        }
    }

    fn bound_texture_mut(&mut self, target: TextureTarget) -> Result<&mut MockTextureState> {
        let id = self.bound_texture(self.active_unit, target);
        match self.objects.get_mut(&id) {
            Some(MockObject::Texture(texture)) => Ok(texture),
            _ => Err(Error::BackendError(format!("No texture bound to {:?}", target))),
        }
    }

    fn check_drawable(&self) -> Result<()> {
        if self.current_program == 0 {
            return Err(Error::UsageError("draw issued with no program in use".to_string()));
        }
        for buffer in self.enabled_attributes.values() {
            if self.is_mapped(*buffer) {
                return Err(Error::UsageError(format!("buffer {} is still mapped at draw time", buffer)));
            }
        }
        Ok(())
    }
}

/// Parse `uniform <type> <name>;` declarations out of GLSL source
fn reflect_uniforms(source: &str) -> Vec<(String, UniformKind)> {
    source
        .lines()
        .filter_map(|line| {
            let mut tokens = line.trim().trim_end_matches(';').split_whitespace();
            if tokens.next()? != "uniform" {
                return None;
            }
            let kind = match tokens.next()? {
                "float" => UniformKind::Float,
                "vec2" => UniformKind::Vec2,
                "vec3" => UniformKind::Vec3,
                "vec4" => UniformKind::Vec4,
                "int" | "sampler1D" | "sampler2D" | "sampler3D" | "samplerCube" => UniformKind::Int,
                "uint" => UniformKind::UInt,
                "bool" => UniformKind::Bool,
                "mat3" => UniformKind::Mat3,
                "mat4" => UniformKind::Mat4,
                _ => return None,
            };
            let name = tokens.next()?.trim_end_matches(';');
            Some((name.to_string(), kind))
        })
        .collect()
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_object(&mut self, kind: ObjectKind) -> Result<NativeId> {
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(Error::OutOfMemory);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(id, MockObject::new(kind));
        self.calls.push(DeviceCall::CreateObject { kind, id });
        Ok(id)
    }

    fn delete_object(&mut self, kind: ObjectKind, id: NativeId) {
        *self.delete_counts.entry(id).or_insert(0) += 1;
        self.objects.remove(&id);
        self.calls.push(DeviceCall::DeleteObject { kind, id });
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: NativeId) -> Result<()> {
        if id != 0 {
            self.buffer_mut(id)?;
            self.bound_buffers.insert(target, id);
        } else {
            self.bound_buffers.remove(&target);
        }
        self.calls.push(DeviceCall::BindBuffer { target, id });
        Ok(())
    }

    fn buffer_data(
        &mut self,
        _target: BufferTarget,
        id: NativeId,
        size: u64,
        data: Option<&[u8]>,
        usage: BufferUsage,
    ) -> Result<()> {
        let buffer = self.buffer_mut(id)?;
        if buffer.mapped.is_some() {
            return Err(Error::UsageError(format!("buffer {} is mapped", id)));
        }
        buffer.data = match data {
            Some(bytes) if bytes.len() as u64 == size => bytes.to_vec(),
            Some(bytes) => {
                return Err(Error::BackendError(format!(
                    "buffer_data size {} does not match data length {}",
                    size,
                    bytes.len()
                )))
            }
            None => vec![0u8; size as usize],
        };
        self.calls.push(DeviceCall::BufferData { id, size, usage });
        Ok(())
    }

    fn map_buffer(&mut self, id: NativeId, access: MapAccess) -> Result<Vec<u8>> {
        let buffer = self.buffer_mut(id)?;
        if buffer.mapped.is_some() {
            return Err(Error::UsageError(format!("buffer {} is already mapped", id)));
        }
        buffer.mapped = Some(access);
        let bytes = buffer.data.clone();
        self.calls.push(DeviceCall::MapBuffer { id, access });
        Ok(bytes)
    }

    fn unmap_buffer(&mut self, id: NativeId, data: Option<&[u8]>) -> Result<()> {
        let buffer = self.buffer_mut(id)?;
        let access = buffer
            .mapped
            .take()
            .ok_or_else(|| Error::UsageError(format!("buffer {} is not mapped", id)))?;
        let committed = match data {
            Some(bytes) if access.contains(MapAccess::WRITE) => {
                if bytes.len() != buffer.data.len() {
                    return Err(Error::BackendError(format!(
                        "unmap of buffer {} with {} bytes, storage is {}",
                        id,
                        bytes.len(),
                        buffer.data.len()
                    )));
                }
                buffer.data.copy_from_slice(bytes);
                true
            }
            _ => false,
        };
        self.calls.push(DeviceCall::UnmapBuffer { id, committed });
        Ok(())
    }

    fn active_texture(&mut self, unit: u32) -> Result<()> {
        self.active_unit = unit;
        self.calls.push(DeviceCall::ActiveTexture { unit });
        Ok(())
    }

    fn bind_texture(&mut self, target: TextureTarget, id: NativeId) -> Result<()> {
        if id != 0 {
            if !matches!(self.objects.get(&id), Some(MockObject::Texture(_))) {
                return Err(Error::InvalidResource(format!("{} is not a texture", id)));
            }
            self.bound_textures.insert((self.active_unit, target), id);
        } else {
            self.bound_textures.remove(&(self.active_unit, target));
        }
        self.calls.push(DeviceCall::BindTexture { target, id });
        Ok(())
    }

    fn tex_image_1d(
        &mut self,
        target: TextureTarget,
        _internal_format: PixelFormat,
        width: u32,
        source_format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()> {
        let expected = (width * source_format.size_bytes()) as usize;
        if pixels.len() < expected {
            return Err(Error::BackendError("1D image data too short".to_string()));
        }
        let texture = self.bound_texture_mut(target)?;
        texture.width = width;
        texture.height = 1;
        texture.pixels = pixels[..expected].to_vec();
        self.calls.push(DeviceCall::TexImage1D { target, width });
        Ok(())
    }

    fn tex_image_2d(
        &mut self,
        target: TextureTarget,
        _internal_format: PixelFormat,
        width: u32,
        height: u32,
        source_format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()> {
        let expected = (width * height * source_format.size_bytes()) as usize;
        if pixels.len() != expected {
            return Err(Error::BackendError("2D image data size mismatch".to_string()));
        }
        let texture = self.bound_texture_mut(target)?;
        texture.width = width;
        texture.height = height;
        texture.pixels = pixels.to_vec();
        self.calls.push(DeviceCall::TexImage2D { target, width, height });
        Ok(())
    }

    fn sampler_parameter(&mut self, id: NativeId, param: SamplerParameter) -> Result<()> {
        match self.objects.get_mut(&id) {
            Some(MockObject::Sampler(params)) => params.push(param),
            _ => return Err(Error::InvalidResource(format!("{} is not a sampler", id))),
        }
        self.calls.push(DeviceCall::SamplerParameter { id, param });
        Ok(())
    }

    fn bind_sampler(&mut self, unit: u32, id: NativeId) -> Result<()> {
        self.calls.push(DeviceCall::BindSampler { unit, id });
        Ok(())
    }

    fn compile_shader(&mut self, id: NativeId, stage: ShaderStageKind, source: &str) -> Result<()> {
        if source.trim().is_empty() {
            return Err(Error::BackendError(format!("{:?} shader {} has empty source", stage, id)));
        }
        match self.objects.get_mut(&id) {
            Some(MockObject::Shader(shader)) => {
                shader.stage = stage;
                shader.source = source.to_string();
            }
            _ => return Err(Error::InvalidResource(format!("{} is not a shader", id))),
        }
        self.calls.push(DeviceCall::CompileShader { id, stage });
        Ok(())
    }

    fn attach_shader(&mut self, program: NativeId, shader: NativeId) -> Result<()> {
        if !matches!(self.objects.get(&shader), Some(MockObject::Shader(_))) {
            return Err(Error::InvalidResource(format!("{} is not a shader", shader)));
        }
        self.program_mut(program)?.shaders.push(shader);
        self.calls.push(DeviceCall::AttachShader { program, shader });
        Ok(())
    }

    fn detach_shader(&mut self, program: NativeId, shader: NativeId) -> Result<()> {
        self.program_mut(program)?.shaders.retain(|s| *s != shader);
        self.calls.push(DeviceCall::DetachShader { program, shader });
        Ok(())
    }

    fn bind_attribute_location(&mut self, program: NativeId, location: u32, name: &str) -> Result<()> {
        self.program(program)?;
        self.calls.push(DeviceCall::BindAttributeLocation {
            program,
            location,
            name: name.to_string(),
        });
        Ok(())
    }

    fn link_program(&mut self, program: NativeId) -> Result<()> {
        let shader_ids = self.program(program)?.shaders.clone();
        let mut has_vertex = false;
        let mut has_fragment = false;
        let mut uniforms = FxHashMap::default();
        for shader_id in shader_ids {
            if let Some(MockObject::Shader(shader)) = self.objects.get(&shader_id) {
                has_vertex |= shader.stage == ShaderStageKind::Vertex;
                has_fragment |= shader.stage == ShaderStageKind::Fragment;
                for (name, kind) in reflect_uniforms(&shader.source) {
                    let location = UniformLocation(uniforms.len() as i32);
                    uniforms.entry(name).or_insert((location, kind));
                }
            }
        }
        if !has_vertex || !has_fragment {
            return Err(Error::BackendError(format!(
                "program {} needs a vertex and a fragment stage to link",
                program
            )));
        }
        let state = self.program_mut(program)?;
        state.uniforms = uniforms;
        state.values.clear();
        state.linked = true;
        self.calls.push(DeviceCall::LinkProgram { program });
        Ok(())
    }

    fn uniform_location(&self, program: NativeId, name: &str) -> Option<UniformLocation> {
        let state = self.program(program).ok()?;
        state.uniforms.get(name).map(|(location, _)| *location)
    }

    fn use_program(&mut self, program: NativeId) -> Result<()> {
        if program != 0 && !self.program(program)?.linked {
            return Err(Error::UsageError(format!("program {} is not linked", program)));
        }
        self.current_program = program;
        self.calls.push(DeviceCall::UseProgram { program });
        Ok(())
    }

    fn set_uniform(&mut self, program: NativeId, location: UniformLocation, value: &UniformValue) -> Result<()> {
        let state = self.program_mut(program)?;
        let kind = state
            .uniforms
            .values()
            .find(|(loc, _)| *loc == location)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| Error::BackendError(format!("no uniform at location {}", location.0)))?;
        if kind != value.kind() {
            return Err(Error::BackendError(format!(
                "uniform at location {} is {:?}, got {:?}",
                location.0,
                kind,
                value.kind()
            )));
        }
        state.values.insert(location, *value);
        self.calls.push(DeviceCall::SetUniform { program, location, value: *value });
        Ok(())
    }

    fn get_uniform(&self, program: NativeId, location: UniformLocation, kind: UniformKind) -> Result<UniformValue> {
        let state = self.program(program)?;
        Ok(state
            .values
            .get(&location)
            .copied()
            .unwrap_or_else(|| UniformValue::zero(kind)))
    }

    fn enable_vertex_attribute(&mut self, location: u32, buffer: NativeId, format: BufferFormat) -> Result<()> {
        self.buffer_mut(buffer)?;
        self.enabled_attributes.insert(location, buffer);
        self.calls.push(DeviceCall::EnableVertexAttribute { location, buffer, format });
        Ok(())
    }

    fn disable_vertex_attribute(&mut self, location: u32) -> Result<()> {
        self.enabled_attributes.remove(&location);
        self.calls.push(DeviceCall::DisableVertexAttribute { location });
        Ok(())
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) -> Result<()> {
        self.check_drawable()?;
        self.draw_calls += 1;
        self.calls.push(DeviceCall::DrawArrays { mode, first, count });
        Ok(())
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: IndexType, offset: u64) -> Result<()> {
        self.check_drawable()?;
        if self.bound_buffer(BufferTarget::ElementArray) == 0 {
            return Err(Error::UsageError("draw_elements with no element buffer bound".to_string()));
        }
        self.draw_calls += 1;
        self.calls.push(DeviceCall::DrawElements { mode, count, index_type, offset });
        Ok(())
    }

    fn stats(&self) -> DeviceStats {
        DeviceStats {
            draw_calls: self.draw_calls,
            live_objects: self.objects.len() as u32,
        }
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
