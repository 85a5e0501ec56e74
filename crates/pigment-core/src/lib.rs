//! # pigment-core
//!
//! Leaf types shared by every pigment crate:
//!
//! - [`ChannelInfo`], [`PixelLayout`] - what a pixel is made of and where
//! - [`Lane`] - rounding fixed-point math for 8- and 16-bit channels
//! - [`FloatLane`] - half and single precision float channels
//! - [`CompositeOp`] - blend operator identifiers
//! - [`NormalizedColor`] - the device-independent interchange color
//! - [`Outcome`] - success with an optional degradation reason
//! - [`ScratchArena`] - reusable conversion buffer with scoped release
//!
//! ## Crate Structure
//!
//! ```text
//! pigment-core (this crate)
//!    ^
//!    +-- pigment-icc (profiles, transforms, transform cache)
//!    +-- pigment-color (ColorSpace trait, compositing, models, registry)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod arena;
pub mod channel;
pub mod color;
pub mod composite_op;
pub mod error;
pub mod lane;
pub mod layout;
pub mod outcome;

pub use arena::{ScratchArena, ScratchGuard};
pub use channel::{ChannelInfo, ChannelKind, ChannelType, ConvolveChannels};
pub use color::{hsl_to_rgb, hsv_to_rgb, rgb_to_hsl, rgb_to_hsv, Hsl, Hsv, NormalizedColor};
pub use composite_op::CompositeOp;
pub use error::{Error, Result};
pub use lane::{FloatLane, Lane};
pub use layout::{check_region, AlphaSlot, PixelLayout};
pub use outcome::{Degradation, Outcome};

/// Prelude module for convenient imports.
///
/// ```
/// use pigment_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::channel::{ChannelInfo, ChannelKind, ChannelType, ConvolveChannels};
    pub use crate::color::NormalizedColor;
    pub use crate::composite_op::CompositeOp;
    pub use crate::error::{Error, Result};
    pub use crate::lane::{FloatLane, Lane};
    pub use crate::layout::PixelLayout;
    pub use crate::outcome::{Degradation, Outcome};
}
