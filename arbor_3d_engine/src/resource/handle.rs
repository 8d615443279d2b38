/// Native object handle with exactly-once release.
///
/// A `GpuHandle` owns one native id. `release()` is idempotent: the first
/// call issues the matching delete and zeroes the id, later calls do nothing.
/// `Drop` calls `release()`, so an owner that never disposes explicitly still
/// frees its native object exactly once when it goes out of scope.

use std::fmt;
use crate::error::{Error, Result};
use crate::graphics_device::{lock_device, NativeId, ObjectKind, SharedGraphicsDevice};

pub struct GpuHandle {
    graphics_device: SharedGraphicsDevice,
    kind: ObjectKind,
    id: NativeId,
}

impl GpuHandle {
    /// Create the native object and take ownership of its id
    pub fn acquire(graphics_device: SharedGraphicsDevice, kind: ObjectKind) -> Result<Self> {
        let id = lock_device(&graphics_device)?.create_object(kind)?;
        if id == 0 {
            crate::engine_bail!("arbor3d::GpuHandle", "Driver returned id 0 for a new {:?}", kind);
        }
        crate::engine_trace!("arbor3d::GpuHandle", "Acquired {:?} {}", kind, id);
        Ok(Self { graphics_device, kind, id })
    }

    /// Native id, `0` once released
    pub fn id(&self) -> NativeId {
        self.id
    }

    /// Kind of the native object
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// True once `release()` ran
    pub fn is_released(&self) -> bool {
        self.id == 0
    }

    /// Native id of a live handle; using a released handle is a usage error
    pub fn live_id(&self) -> Result<NativeId> {
        if self.id == 0 {
            return Err(Error::UsageError(format!("{:?} handle used after release", self.kind)));
        }
        Ok(self.id)
    }

    /// The device this handle was created on
    pub fn graphics_device(&self) -> &SharedGraphicsDevice {
        &self.graphics_device
    }

    /// Delete the native object. No-op when already released.
    pub fn release(&mut self) {
        if self.id == 0 {
            return;
        }
        let id = std::mem::replace(&mut self.id, 0);
        // A poisoned lock still holds a usable device; the delete must go out.
        let mut device = match self.graphics_device.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        device.delete_object(self.kind, id);
        drop(device);
        crate::engine_trace!("arbor3d::GpuHandle", "Released {:?} {}", self.kind, id);
    }
}

impl Drop for GpuHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
