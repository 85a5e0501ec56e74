//! Concrete color models.
//!
//! Every built-in model is a [`PixelModel`] over 8-bit, 16-bit, half or
//! single float lanes. The constructors in this module take a
//! [`ModelContext`] carrying the default profiles, so all models in a
//! registry share one sRGB reference.
//!
//! | id | lanes | channels |
//! |----|-------|----------|
//! | `RGBA` | u8 | red, green, blue, alpha |
//! | `RGBA16` | u16 | red, green, blue, alpha |
//! | `RGBAF16` | f16 | red, green, blue, alpha |
//! | `RGBAF32` | f32 | red, green, blue, alpha |
//! | `GRAY` | u8 | gray |
//! | `GRAYA` | u8 | gray, alpha |
//! | `GRAYA16` | u16 | gray, alpha |
//! | `CMYKA` | u8 | cyan, magenta, yellow, black, alpha |
//! | `CMYKA16` | u16 | cyan, magenta, yellow, black, alpha |
//! | `ALPHA` | u8 | selection mask |
//! | `WET` | u8 | red, green, blue, alpha, wetness, height |

mod builtin;
mod pixel;
mod sample;

pub use builtin::{
    alpha8, builtin_models, cmyka16, cmyka8, gray8, graya16, graya8, rgba16, rgba8, rgbaf16, rgbaf32, wet8,
    ModelContext,
};
pub use pixel::{Encoding, PixelModel};
pub use sample::Sample;
