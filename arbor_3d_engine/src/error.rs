//! Error types for the Arbor3D engine
//!
//! Construction errors (bad counts, unresolved bindings, out-of-range indices,
//! unsupported targets) and usage errors (released handles, nested mappings,
//! unbalanced traversal state) are all surfaced to the caller. Nothing in the
//! engine retries: a failing driver call propagates immediately.

use std::fmt;

/// Result type for Arbor3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Arbor3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (driver call failed)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, shader, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    InitializationFailed(String),

    /// A count was zero or inconsistent with the draw mode
    InvalidCount(String),

    /// A shader variable could not be matched to a vertex buffer
    UnresolvedBinding(String),

    /// An index referenced a vertex past the end of its buffer
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Number of vertices available
        vertex_count: u32,
    },

    /// Texture target other than 1D or 2D was used for an upload
    UnsupportedTarget(String),

    /// Uniform name was not found when the program was linked
    UnknownUniform(String),

    /// Programmer error: released handle, nested mapping, wrong element type...
    UsageError(String),

    /// A node left pushed state behind after its after-children phase
    UnbalancedStack {
        /// Node that broke the push/pop discipline
        node: String,
        /// Camera stack depth before the node was entered
        expected: usize,
        /// Camera stack depth after the node was exited
        actual: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidCount(msg) => write!(f, "Invalid count: {}", msg),
            Error::UnresolvedBinding(name) => write!(f, "Unresolved binding: '{}'", name),
            Error::IndexOutOfRange { index, vertex_count } => write!(
                f,
                "Index out of range: {} (vertex count {})",
                index, vertex_count
            ),
            Error::UnsupportedTarget(target) => write!(f, "Unsupported target: {}", target),
            Error::UnknownUniform(name) => write!(f, "Unknown uniform: '{}'", name),
            Error::UsageError(msg) => write!(f, "Usage error: {}", msg),
            Error::UnbalancedStack { node, expected, actual } => write!(
                f,
                "Unbalanced camera stack after node '{}': expected depth {}, found {}",
                node, expected, actual
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
