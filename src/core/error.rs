//! Error type shared by the trail core and the web backend

use thiserror::Error;

/// Errors raised while creating or driving the trail renderer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrailError {
    /// Host cannot provide a rendering surface (no WebGL2, no document, ...)
    #[error("Unsupported environment: {0}")]
    Unsupported(String),

    /// A GPU-side resource could not be created or used
    #[error("Resource error: {0}")]
    Resource(String),

    /// The rendering context was lost and cannot be recovered
    #[error("Context lost")]
    ContextLost,

    #[error("Configuration error: {0}")]
    Config(String),

    /// Error surfaced by a JS call
    #[error("JS error: {0}")]
    Js(String),
}

impl TrailError {
    /// Whether the renderer must stop instead of skipping the frame
    pub fn is_fatal(&self) -> bool {
        matches!(self, TrailError::Unsupported(_) | TrailError::ContextLost)
    }
}

/// Result type for trail operations
pub type TrailResult<T> = Result<T, TrailError>;
