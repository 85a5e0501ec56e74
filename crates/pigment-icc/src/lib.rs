//! # pigment-icc
//!
//! ICC color profile support for pigment color spaces, built on Little CMS 2.
//!
//! # Features
//!
//! - Load ICC profiles from files or embedded data, or build sRGB and
//!   gamma-curve gray profiles in memory
//! - Discover profiles under search directories ([`ProfileStore`])
//! - Build float transforms between gray, RGB and CMYK profiles
//! - Cache transforms per owner with a most-recently-used fast path
//!   ([`TransformCache`])
//! - Configuration from YAML or environment ([`IccConfig`])
//!
//! # Example
//!
//! ```rust
//! use pigment_icc::{Intent, Profile, ProfileFormat, TransformCache};
//! use std::sync::Arc;
//!
//! let srgb = Arc::new(Profile::srgb());
//! let gray = Arc::new(Profile::gray(2.2).unwrap());
//!
//! let cache = TransformCache::new(false);
//! let t = cache
//!     .get_or_create(&srgb, ProfileFormat::Rgb, &gray, ProfileFormat::Gray, Intent::Perceptual)
//!     .unwrap();
//!
//! let mut out = [0.0f32; 1];
//! t.apply(&[1.0, 1.0, 1.0], &mut out).unwrap();
//! assert!(out[0] > 0.99);
//! ```
//!
//! # Thread Safety
//!
//! [`Profile`] keeps serialized ICC data and is `Send + Sync`. Each
//! [`Transform`] serializes access to its engine, so one cached transform can
//! be shared by many callers.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod error;
mod format;
mod profile;
mod store;
mod transform;

pub use cache::{CacheStats, TransformCache, TransformRequest};
pub use config::{default_search_paths, IccConfig};
pub use error::{IccError, IccResult};
pub use format::ProfileFormat;
pub use profile::{Profile, ProfileSignature};
pub use store::ProfileStore;
pub use transform::Transform;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering intent for color transformations.
///
/// Determines how out-of-gamut colors are handled during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Compresses the whole source gamut into the destination gamut.
    ///
    /// Best for photographic images.
    #[default]
    Perceptual,

    /// Keeps in-gamut colors exact and clips the rest.
    ///
    /// Best for proofing.
    RelativeColorimetric,

    /// Maintains saturation at the expense of accuracy.
    Saturation,

    /// Like relative colorimetric but without white point adaptation.
    AbsoluteColorimetric,
}

impl Intent {
    /// Stable identifier, as accepted by [`FromStr`].
    pub const fn id(self) -> &'static str {
        match self {
            Self::Perceptual => "perceptual",
            Self::RelativeColorimetric => "relative_colorimetric",
            Self::Saturation => "saturation",
            Self::AbsoluteColorimetric => "absolute_colorimetric",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Intent {
    type Err = IccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perceptual" => Ok(Self::Perceptual),
            "relative" | "relative_colorimetric" => Ok(Self::RelativeColorimetric),
            "saturation" => Ok(Self::Saturation),
            "absolute" | "absolute_colorimetric" => Ok(Self::AbsoluteColorimetric),
            other => Err(IccError::Config(format!("unknown rendering intent '{other}'"))),
        }
    }
}

impl From<Intent> for lcms2::Intent {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Perceptual => lcms2::Intent::Perceptual,
            Intent::RelativeColorimetric => lcms2::Intent::RelativeColorimetric,
            Intent::Saturation => lcms2::Intent::Saturation,
            Intent::AbsoluteColorimetric => lcms2::Intent::AbsoluteColorimetric,
        }
    }
}
