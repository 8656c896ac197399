//! Error types for the shadow system

use thiserror::Error;

use crate::renderer::FramePhase;

/// Shadow system errors
///
/// Lights that cannot be shadowed are never errors; they are encoded in the
/// returned [`ShadowParams`](crate::reservation::ShadowParams). These variants
/// only cover misuse of the frame protocol and malformed configuration.
#[derive(Debug, Error)]
pub enum ShadowError {
    /// Operation called outside the phase it belongs to
    #[error("{operation} requires the {expected:?} phase, but the frame is in {found:?}")]
    InvalidPhase {
        operation: &'static str,
        expected: FramePhase,
        found: FramePhase,
    },

    /// Settings could not be parsed
    #[error("Invalid shadow settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}

/// Result type for shadow operations
pub type Result<T> = std::result::Result<T, ShadowError>;
