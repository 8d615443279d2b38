//! Camera module: the camera boundary consumed by scene traversal.
//!
//! The engine does NOT drive cameras. A camera node holds one and pushes it
//! onto the render context for its subtree; everything below reads the
//! projection and view matrices from the top of that stack.

mod camera;

pub use camera::{Camera, CameraView};
