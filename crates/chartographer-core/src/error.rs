//! Error types for chartographer-core
//!
//! Every failure leaving the core is classified into exactly one of the
//! variants below; collaborator errors (I/O, image decoding) are translated
//! where they occur and never surface as-is.

use thiserror::Error;

use crate::id::CanvasId;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input dimensions or payload
    #[error("validation error: {0}")]
    Validation(String),

    /// No canvas is stored under the id
    #[error("canvas not found: {0}")]
    NotFound(CanvasId),

    /// The requested rectangle does not overlap the canvas
    #[error("segment ({x}, {y}, {width}x{height}) does not intersect the canvas")]
    NoIntersection {
        /// Requested left edge
        x: i32,
        /// Requested top edge
        y: i32,
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    /// Filesystem failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Malformed or unencodable raster data
    #[error("codec error: {0}")]
    Codec(String),
}

impl Error {
    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a codec error
    #[must_use]
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Whether the caller supplied bad input (as opposed to a server fault)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::NoIntersection { .. }
        )
    }

    /// Stable error code for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::NoIntersection { .. } => "no_intersection",
            Self::Storage(_) => "storage_error",
            Self::Codec(_) => "codec_error",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Storage(err.error.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
