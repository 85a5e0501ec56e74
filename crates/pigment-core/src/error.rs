//! Error types for pigment-core operations.
//!
//! Pixel buffers are handed around as raw byte slices, so most failures here
//! are caller precondition violations: a buffer that is shorter than the
//! pixel count implies, a row stride that cannot hold a row, or arguments
//! outside the range an operation accepts.
//!
//! Degraded-but-successful paths (no profile, unsupported operator) are not
//! errors; they are reported through [`crate::Outcome`].
//!
//! # Usage
//!
//! ```rust
//! use pigment_core::{Error, Result};
//!
//! fn check(len: usize, needed: usize) -> Result<()> {
//!     if len < needed {
//!         return Err(Error::buffer_too_small("source", needed, len));
//!     }
//!     Ok(())
//! }
//! assert!(check(3, 4).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by layout checks and shared pixel algorithms.
///
/// # Categories
///
/// - **Buffer errors**: [`BufferTooSmall`](Error::BufferTooSmall), [`InvalidStride`](Error::InvalidStride)
/// - **Argument errors**: [`LengthMismatch`](Error::LengthMismatch), [`InvalidWeights`](Error::InvalidWeights), [`InvalidArgument`](Error::InvalidArgument)
/// - **Layout errors**: [`InvalidLayout`](Error::InvalidLayout)
#[derive(Debug, Error)]
pub enum Error {
    /// A pixel buffer holds fewer bytes than the operation needs.
    #[error("{what} buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Which buffer was checked
        what: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes supplied
        got: usize,
    },

    /// Row stride is smaller than one row of pixels.
    #[error("{what} stride {stride} is less than row size {row_bytes}")]
    InvalidStride {
        /// Which buffer was checked
        what: &'static str,
        /// Provided stride
        stride: usize,
        /// Bytes in one row
        row_bytes: usize,
    },

    /// Two parallel argument lists differ in length.
    #[error("{what}: expected {expected} entries, got {got}")]
    LengthMismatch {
        /// Which argument pair was checked
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Mixing weights sum above the full-opacity constant.
    #[error("mix weights sum to {sum}, limit is {limit}")]
    InvalidWeights {
        /// Sum of all weights
        sum: u32,
        /// Maximum allowed sum
        limit: u32,
    },

    /// Channel description does not form a usable pixel layout.
    #[error("invalid pixel layout: {0}")]
    InvalidLayout(String),

    /// An argument is outside the accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates an [`Error::BufferTooSmall`] error.
    #[inline]
    pub fn buffer_too_small(what: &'static str, needed: usize, got: usize) -> Self {
        Self::BufferTooSmall { what, needed, got }
    }

    /// Creates an [`Error::InvalidStride`] error.
    #[inline]
    pub fn invalid_stride(what: &'static str, stride: usize, row_bytes: usize) -> Self {
        Self::InvalidStride {
            what,
            stride,
            row_bytes,
        }
    }

    /// Creates an [`Error::LengthMismatch`] error.
    #[inline]
    pub fn length_mismatch(what: &'static str, expected: usize, got: usize) -> Self {
        Self::LengthMismatch {
            what,
            expected,
            got,
        }
    }

    /// Creates an [`Error::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Returns `true` if this is a buffer size or stride error.
    #[inline]
    pub fn is_buffer_error(&self) -> bool {
        matches!(self, Self::BufferTooSmall { .. } | Self::InvalidStride { .. })
    }
}
