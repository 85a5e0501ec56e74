//! Channel descriptions.
//!
//! A [`ChannelInfo`] describes one scalar component of a pixel: what it is
//! called, what it means, and where its bytes live. A color model owns an
//! ordered list of them (see [`crate::PixelLayout`]).

use std::fmt;

use half::f16;

use crate::lane::{FloatLane, Lane};

/// Semantic kind of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// A color primary or ink.
    Color,
    /// Opacity.
    Alpha,
    /// Auxiliary per-pixel data such as wetness or height.
    Substance,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Color => "color",
            Self::Alpha => "alpha",
            Self::Substance => "substance",
        };
        f.write_str(s)
    }
}

/// Storage type of a channel value.
///
/// Integer types hold `0..=MAX` for the unit range. Float types hold the
/// unit value itself and may go outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    F32,
}

impl ChannelType {
    /// Type implied by a byte width: integers for 1 and 2, `f32` for 4.
    pub const fn for_size(size: usize) -> Option<Self> {
        match size {
            1 => Some(Self::U8),
            2 => Some(Self::U16),
            4 => Some(Self::F32),
            _ => None,
        }
    }

    /// Number of bytes per value.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }

    /// Whether this is a floating-point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Reads a value as a unit float. Integers are normalized, floats are
    /// returned as stored.
    pub fn read_unit(self, bytes: &[u8]) -> f32 {
        match self {
            Self::U8 => u8::to_unit(u8::read(bytes)),
            Self::U16 => u16::to_unit(u16::read(bytes)),
            Self::F16 => f16::read(bytes),
            Self::F32 => <f32 as FloatLane>::read(bytes),
        }
    }

    /// Writes a unit float. Integers are clamped and rounded, floats are
    /// stored as given except that NaN becomes zero.
    pub fn write_unit(self, bytes: &mut [u8], value: f32) {
        match self {
            Self::U8 => u8::write(bytes, u8::from_unit(value)),
            Self::U16 => u16::write(bytes, u16::from_unit(value)),
            Self::F16 => f16::write(bytes, if value.is_nan() { 0.0 } else { value }),
            Self::F32 => <f32 as FloatLane>::write(bytes, if value.is_nan() { 0.0 } else { value }),
        }
    }

    /// Reads a value scaled to 8 bits. Floats are clamped to the unit range.
    pub fn read_u8(self, bytes: &[u8]) -> u8 {
        match self {
            Self::U8 => bytes[0],
            Self::U16 => u16::to_u8(u16::read(bytes)),
            Self::F16 | Self::F32 => u8::from_unit(self.read_unit(bytes)) as u8,
        }
    }

    /// Writes an 8-bit value, upscaled to the type's range.
    pub fn write_u8(self, bytes: &mut [u8], value: u8) {
        match self {
            Self::U8 => bytes[0] = value,
            Self::U16 => u16::write(bytes, u16::from_u8(value)),
            Self::F16 | Self::F32 => self.write_unit(bytes, f32::from(value) / 255.0),
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::U8 => "8-bit",
            Self::U16 => "16-bit",
            Self::F16 => "half",
            Self::F32 => "float",
        };
        f.write_str(s)
    }
}

/// Which parts of a pixel a convolution writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolveChannels {
    /// Color channels only.
    Color,
    /// Alpha channel only.
    Alpha,
    /// Color and alpha.
    #[default]
    All,
}

impl ConvolveChannels {
    /// Returns `true` if color channels are convolved.
    #[inline]
    pub const fn color(self) -> bool {
        matches!(self, Self::Color | Self::All)
    }

    /// Returns `true` if the alpha channel is convolved.
    #[inline]
    pub const fn alpha(self) -> bool {
        matches!(self, Self::Alpha | Self::All)
    }
}

/// Immutable description of one channel in a pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    name: String,
    kind: ChannelKind,
    offset: usize,
    size: usize,
    value_type: Option<ChannelType>,
}

impl ChannelInfo {
    /// Creates a channel description.
    ///
    /// `offset` and `size` are in bytes, relative to the start of a pixel.
    /// The storage type follows from the size (see [`ChannelType::for_size`]);
    /// use [`typed`](Self::typed) for half floats.
    pub fn new(name: impl Into<String>, kind: ChannelKind, offset: usize, size: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            offset,
            size,
            value_type: ChannelType::for_size(size),
        }
    }

    /// Creates a channel description with an explicit storage type.
    pub fn typed(name: impl Into<String>, kind: ChannelKind, offset: usize, value_type: ChannelType) -> Self {
        Self {
            name: name.into(),
            kind,
            offset,
            size: value_type.size(),
            value_type: Some(value_type),
        }
    }

    /// Display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic kind.
    #[inline]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Byte offset within a pixel.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Width in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Storage type; `None` when the width maps to no known type.
    #[inline]
    pub fn value_type(&self) -> Option<ChannelType> {
        self.value_type
    }

    /// One past the last byte of this channel.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Returns `true` for color channels.
    #[inline]
    pub fn is_color(&self) -> bool {
        self.kind == ChannelKind::Color
    }

    /// Returns `true` for the alpha channel.
    #[inline]
    pub fn is_alpha(&self) -> bool {
        self.kind == ChannelKind::Alpha
    }

    /// Reads this channel's raw integer value from a pixel.
    ///
    /// Returns `None` when the pixel is too short or the channel is not an
    /// integer type.
    pub fn raw_value(&self, pixel: &[u8]) -> Option<u32> {
        let bytes = pixel.get(self.offset..self.end())?;
        match self.value_type? {
            ChannelType::U8 => Some(u8::read(bytes)),
            ChannelType::U16 => Some(u16::read(bytes)),
            ChannelType::F16 | ChannelType::F32 => None,
        }
    }

    /// Reads this channel as a unit float (see [`ChannelType::read_unit`]).
    ///
    /// Returns `None` when the pixel is too short or the type is unknown.
    pub fn unit_value(&self, pixel: &[u8]) -> Option<f32> {
        let bytes = pixel.get(self.offset..self.end())?;
        Some(self.value_type?.read_unit(bytes))
    }
}
