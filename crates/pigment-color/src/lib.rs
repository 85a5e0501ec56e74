//! # pigment-color
//!
//! Color spaces for paintable surfaces.
//!
//! A [`ColorSpace`] describes one pixel format: its channels, how a pixel
//! decodes to and encodes from [`NormalizedColor`], how buffers convert to
//! other spaces and how buffers composite onto each other.
//!
//! # Modules
//!
//! - [`space`] - the [`ColorSpace`] trait and its shared algorithms
//! - [`composite`] - `bit_blt` plumbing and the integer and float compositors
//! - [`models`] - built-in integer and float models
//! - [`registry`] - lookup by identifier
//! - [`view`] - borrowed pixel views
//!
//! # Example
//!
//! ```rust
//! use pigment_color::{BlitOptions, ColorSpace, ColorSpaceRegistry, CompositeOp, Source};
//! use pigment_icc::IccConfig;
//!
//! let registry = ColorSpaceRegistry::new(IccConfig::empty()).unwrap();
//! let rgba = registry.get("RGBA").unwrap();
//!
//! let mut dst = [255u8, 0, 0, 255];
//! let src = [0u8, 255, 0, 128];
//! rgba.bit_blt(&mut dst, 4, Source::new(&*rgba, &src, 4), &BlitOptions::new(CompositeOp::Over, 1, 1))
//!     .unwrap();
//! assert_eq!(dst, [127, 128, 0, 255]);
//! ```
//!
//! # Degraded output
//!
//! Operations that cannot be done faithfully (no profile, an operator the
//! model lacks) still succeed and return [`Outcome::Degraded`]. Errors are
//! reserved for caller mistakes such as short buffers.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod adjust;
pub mod composite;
mod convert;
mod error;
pub mod models;
pub mod registry;
pub mod space;
pub mod view;

pub use composite::{BlitOptions, CompositeArgs, LaneMap, Mask, Source};
pub use error::{ColorError, ColorResult};
pub use registry::ColorSpaceRegistry;
pub use space::ColorSpace;
pub use view::{PixelView, PixelViewMut};

pub use pigment_core::{
    ChannelInfo, ChannelKind, CompositeOp, ConvolveChannels, Degradation, NormalizedColor, Outcome, PixelLayout,
};
pub use pigment_icc::{Intent, Profile, ProfileSignature};

/// Prelude module for convenient imports.
///
/// ```
/// use pigment_color::prelude::*;
/// ```
pub mod prelude {
    pub use crate::composite::{BlitOptions, Mask, Source};
    pub use crate::error::{ColorError, ColorResult};
    pub use crate::registry::ColorSpaceRegistry;
    pub use crate::space::ColorSpace;
    pub use pigment_core::{CompositeOp, ConvolveChannels, NormalizedColor, Outcome};
    pub use pigment_icc::Intent;
}
