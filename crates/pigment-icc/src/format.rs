//! Float pixel formats handed to the transform engine.

use crate::ProfileSignature;

/// Device color layout of a float transform buffer.
///
/// Gray and RGB values are in `[0, 1]`; CMYK ink values are in `[0, 100]`,
/// the convention Little CMS uses for float CMYK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileFormat {
    /// One gray channel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Cyan, magenta, yellow, black.
    Cmyk,
}

impl ProfileFormat {
    /// Floats per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }

    /// Multiplier from unit values to engine values.
    #[inline]
    pub const fn scale(self) -> f32 {
        match self {
            Self::Cmyk => 100.0,
            Self::Gray | Self::Rgb => 1.0,
        }
    }

    /// Profile signature this format is read through.
    pub const fn signature(self) -> ProfileSignature {
        match self {
            Self::Gray => ProfileSignature::Gray,
            Self::Rgb => ProfileSignature::Rgb,
            Self::Cmyk => ProfileSignature::Cmyk,
        }
    }

    pub(crate) fn lcms(self) -> lcms2::PixelFormat {
        match self {
            Self::Gray => lcms2::PixelFormat::GRAY_FLT,
            Self::Rgb => lcms2::PixelFormat::RGB_FLT,
            Self::Cmyk => lcms2::PixelFormat::CMYK_FLT,
        }
    }
}
