/// Graphics device module - the native graphics API boundary and its types

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod draw;
pub mod texture;
pub mod shader;
pub mod mock_graphics_device;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use draw::*;
pub use texture::*;
pub use shader::*;
pub use mock_graphics_device::{MockGraphicsDevice, DeviceCall};
