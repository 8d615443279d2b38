/*!
# Arbor3D Engine

Retained-mode scene graph rendering on top of a native graphics device.

The engine wraps every GPU-resident object in an owning handle that releases
it exactly once, assembles shader programs and vertex buffers into render
units, and draws a node hierarchy through a two-phase depth-first traversal
with a camera stack.

## Architecture

- **GraphicsDevice**: native graphics API boundary (`MockGraphicsDevice` for tests)
- **GpuHandle**: exactly-once ownership of a native object
- **VertexAttributeBuffer / IndexBuffer**: vertex storage and draw ranges
- **Texture / Sampler**: image upload and sampling state
- **ShaderProgram**: linked program with attribute locations and uniforms
- **RenderUnit**: program + buffers + index buffer, drawn in one call
- **SceneNode / SceneRenderer**: node tree and per-frame traversal
*/

// Internal modules
mod error;
mod config;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod resource;
pub mod scene;
pub mod camera;
pub mod models;

// Main arbor3d namespace module
pub mod arbor3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton and its configuration
    pub use crate::engine::Engine;
    pub use crate::config::EngineConfig;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Graphics device boundary
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Ready-made models
    pub mod models {
        pub use crate::models::*;
    }
}

// Re-export math library at crate root
pub use glam;
