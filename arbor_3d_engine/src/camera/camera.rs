/// Camera: read-only view and projection source.
///
/// `CameraView` is what traversal consumes. `Camera` is the stock passive
/// implementation: it stores matrices set by the caller and computes only
/// their product.

use glam::{Mat4, Vec3};

/// Camera boundary read during the before-children phase
pub trait CameraView: Send + Sync {
    /// Projection matrix (perspective or orthographic)
    fn projection_matrix(&self) -> Mat4;

    /// View matrix (world to eye space)
    fn view_matrix(&self) -> Mat4;

    /// Combined view-projection matrix (projection * view)
    fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Low-level camera. A passive data container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
        }
    }

    /// Right-handed perspective camera at `eye` looking at `target`
    pub fn look_at_perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_radians: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        Self::new(
            Mat4::look_at_rh(eye, target, up),
            Mat4::perspective_rh_gl(fov_y_radians, aspect_ratio, z_near, z_far),
        )
    }

    // ===== SETTERS =====

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }
}

impl CameraView for Camera {
    fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
