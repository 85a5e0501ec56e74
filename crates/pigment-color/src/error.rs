//! Error types for color space operations.

use pigment_core::Error as CoreError;
use pigment_icc::IccError;
use thiserror::Error;

/// Error type for color space operations.
///
/// Only caller precondition violations and set-up failures are errors.
/// Degraded conversions and unsupported operators succeed and report
/// themselves through [`pigment_core::Outcome`].
#[derive(Error, Debug)]
pub enum ColorError {
    /// Buffer, stride or argument check failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Profile loading or transform set-up failed.
    #[error(transparent)]
    Icc(#[from] IccError),

    /// No color space is registered under this identifier.
    #[error("unknown color space: {0}")]
    UnknownColorSpace(String),
}

/// Result type for color space operations.
pub type ColorResult<T> = Result<T, ColorError>;
