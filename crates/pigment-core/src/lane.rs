//! Channel lanes.
//!
//! Integer color models store every channel as an unsigned lane of one width
//! (8 or 16 bits). Compositing math is done in those native units with
//! helpers that round to nearest instead of truncating, so repeated
//! composites do not drift darker.
//!
//! Float models store `f32` or half-precision lanes. Their values are unit
//! floats already and are not clamped on read or write.
//!
//! # Example
//!
//! ```
//! use pigment_core::Lane;
//!
//! assert_eq!(u8::mul(255, 128), 128);
//! assert_eq!(u8::div(64, 128), 128);
//! assert_eq!(u16::from_u8(255), 65535);
//! ```

use std::fmt::Debug;

use half::f16;

use crate::channel::ChannelType;

/// A native channel width used by integer color models.
///
/// Values are passed around as `u32` so intermediate products fit; every
/// helper returns a value in `0..=MAX`.
pub trait Lane: Copy + Default + Ord + Debug + Send + Sync + 'static {
    /// Width in bytes.
    const BYTES: usize;

    /// Full-scale value (fully opaque / full intensity).
    const MAX: u32;

    /// Reads one lane from the start of `bytes` (native endian).
    fn read(bytes: &[u8]) -> u32;

    /// Writes `value` (clamped to `MAX`) to the start of `bytes`.
    fn write(bytes: &mut [u8], value: u32);

    /// Scales an 8-bit value to this width.
    fn from_u8(value: u8) -> u32;

    /// Scales a value of this width to 8 bits, rounding.
    fn to_u8(value: u32) -> u8;

    /// Rounded fixed-point multiply: `a * b / MAX`.
    #[inline]
    fn mul(a: u32, b: u32) -> u32 {
        let max = u64::from(Self::MAX);
        ((u64::from(a) * u64::from(b) + max / 2) / max) as u32
    }

    /// Rounded fixed-point divide: `a * MAX / b`, clamped to `MAX`.
    ///
    /// Division by zero yields `MAX`.
    #[inline]
    fn div(a: u32, b: u32) -> u32 {
        if b == 0 {
            return Self::MAX;
        }
        let q = (u64::from(a) * u64::from(Self::MAX) + u64::from(b) / 2) / u64::from(b);
        q.min(u64::from(Self::MAX)) as u32
    }

    /// Moves `dst` toward `src` by `alpha / MAX`, rounding half away from zero.
    #[inline]
    fn blend(src: u32, dst: u32, alpha: u32) -> u32 {
        let max = i64::from(Self::MAX);
        let diff = (i64::from(src) - i64::from(dst)) * i64::from(alpha);
        let step = if diff >= 0 {
            (diff + max / 2) / max
        } else {
            (diff - max / 2) / max
        };
        (i64::from(dst) + step).clamp(0, max) as u32
    }

    /// Converts to a unit float in `[0, 1]`.
    #[inline]
    fn to_unit(value: u32) -> f32 {
        value.min(Self::MAX) as f32 / Self::MAX as f32
    }

    /// Converts from a unit float, clamping and rounding.
    #[inline]
    fn from_unit(value: f32) -> u32 {
        if value.is_nan() {
            return 0;
        }
        (value.clamp(0.0, 1.0) * Self::MAX as f32).round() as u32
    }
}

impl Lane for u8 {
    const BYTES: usize = 1;
    const MAX: u32 = u8::MAX as u32;

    #[inline]
    fn read(bytes: &[u8]) -> u32 {
        u32::from(bytes[0])
    }

    #[inline]
    fn write(bytes: &mut [u8], value: u32) {
        bytes[0] = value.min(<Self as Lane>::MAX) as u8;
    }

    #[inline]
    fn from_u8(value: u8) -> u32 {
        u32::from(value)
    }

    #[inline]
    fn to_u8(value: u32) -> u8 {
        value.min(<Self as Lane>::MAX) as u8
    }
}

impl Lane for u16 {
    const BYTES: usize = 2;
    const MAX: u32 = u16::MAX as u32;

    #[inline]
    fn read(bytes: &[u8]) -> u32 {
        u32::from(u16::from_ne_bytes([bytes[0], bytes[1]]))
    }

    #[inline]
    fn write(bytes: &mut [u8], value: u32) {
        let v = value.min(<Self as Lane>::MAX) as u16;
        bytes[..2].copy_from_slice(&v.to_ne_bytes());
    }

    #[inline]
    fn from_u8(value: u8) -> u32 {
        // 0xFF -> 0xFFFF exactly
        u32::from(value) * 257
    }

    #[inline]
    fn to_u8(value: u32) -> u8 {
        ((value.min(<Self as Lane>::MAX) * 255 + 32767) / 65535) as u8
    }
}

/// A floating-point channel width used by float color models.
pub trait FloatLane: Copy + Default + Debug + Send + Sync + 'static {
    /// Width in bytes.
    const BYTES: usize;

    /// Storage type reported in channel descriptions.
    const TYPE: ChannelType;

    /// Reads one lane from the start of `bytes` (native endian).
    fn read(bytes: &[u8]) -> f32;

    /// Writes `value` to the start of `bytes`, rounding to the lane's precision.
    fn write(bytes: &mut [u8], value: f32);
}

impl FloatLane for f32 {
    const BYTES: usize = 4;
    const TYPE: ChannelType = ChannelType::F32;

    #[inline]
    fn read(bytes: &[u8]) -> f32 {
        f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn write(bytes: &mut [u8], value: f32) {
        bytes[..4].copy_from_slice(&value.to_ne_bytes());
    }
}

impl FloatLane for f16 {
    const BYTES: usize = 2;
    const TYPE: ChannelType = ChannelType::F16;

    #[inline]
    fn read(bytes: &[u8]) -> f32 {
        f16::from_ne_bytes([bytes[0], bytes[1]]).to_f32()
    }

    #[inline]
    fn write(bytes: &mut [u8], value: f32) {
        bytes[..2].copy_from_slice(&f16::from_f32(value).to_ne_bytes());
    }
}
