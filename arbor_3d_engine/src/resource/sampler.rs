/// Sampler object: filtering and wrapping state independent of any texture.

use crate::error::Result;
use crate::graphics_device::{
    lock_device, Filter, NativeId, ObjectKind, SamplerParameter, SharedGraphicsDevice, Wrap,
};
use crate::resource::GpuHandle;

/// Filter and wrap settings applied when the sampler is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerParams {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub wrap_r: Wrap,
    /// Only used with `Wrap::ClampToBorder`
    pub border_color: Option<[f32; 4]>,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
            wrap_r: Wrap::ClampToEdge,
            border_color: None,
        }
    }
}

impl SamplerParams {
    /// Parameters as device calls, in application order
    pub fn to_parameters(&self) -> Vec<SamplerParameter> {
        let mut params = vec![
            SamplerParameter::MinFilter(self.min_filter),
            SamplerParameter::MagFilter(self.mag_filter),
            SamplerParameter::WrapS(self.wrap_s),
            SamplerParameter::WrapT(self.wrap_t),
            SamplerParameter::WrapR(self.wrap_r),
        ];
        if let Some(color) = self.border_color {
            params.push(SamplerParameter::BorderColor(color));
        }
        params
    }
}

/// Descriptor for creating a Sampler
pub struct SamplerDesc {
    pub graphics_device: SharedGraphicsDevice,
    pub params: SamplerParams,
}

#[derive(Debug)]
pub struct Sampler {
    handle: GpuHandle,
    params: SamplerParams,
}

impl Sampler {
    /// Create the sampler and apply every parameter
    pub fn from_desc(desc: SamplerDesc) -> Result<Self> {
        let handle = GpuHandle::acquire(desc.graphics_device, ObjectKind::Sampler)?;
        {
            let mut device = lock_device(handle.graphics_device())?;
            for param in desc.params.to_parameters() {
                device.sampler_parameter(handle.id(), param)?;
            }
        }
        crate::engine_debug!("arbor3d::Sampler", "Created sampler {} ({:?})", handle.id(), desc.params);
        Ok(Self { handle, params: desc.params })
    }

    /// Native sampler id (0 once released)
    pub fn id(&self) -> NativeId { self.handle.id() }

    pub fn params(&self) -> &SamplerParams { &self.params }

    /// Bind to texture unit `unit`
    pub fn bind(&self, unit: u32) -> Result<()> {
        let id = self.handle.live_id()?;
        lock_device(self.handle.graphics_device())?.bind_sampler(unit, id)
    }

    /// Clear the sampler bound to texture unit `unit`
    pub fn unbind(&self, unit: u32) -> Result<()> {
        lock_device(self.handle.graphics_device())?.bind_sampler(unit, 0)
    }

    /// Release the native sampler now instead of at drop
    pub fn release(&mut self) {
        self.handle.release();
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
