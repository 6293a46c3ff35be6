//! Typed failures of the texture upload primitive.
//!
//! Lifecycle and loop errors travel as [`anyhow::Error`]; texture uploads use
//! [`TextureError`] so callers can tell a size mismatch apart from a texture
//! whose backing store does not exist yet.

use thiserror::Error;

/// Failure raised by a texture's data-upload primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TextureError {
    /// The colour sequence does not cover the texture exactly once.
    #[error("invalid buffer size: texture needs {expected} pixels, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },
    /// The texture has no backing store (or the graphics device is not up yet).
    #[error("texture resource has not been initialized")]
    UninitializedResource,
}
