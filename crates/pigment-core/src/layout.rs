//! Pixel layout: the ordered channel list of one color model.
//!
//! A [`PixelLayout`] never changes after construction. The alpha slot is
//! looked up once, on first use, and memoized; layouts without an alpha
//! channel memoize `None` so later calls skip the search.
//!
//! # Example
//!
//! ```
//! use pigment_core::{ChannelInfo, ChannelKind, PixelLayout};
//!
//! let layout = PixelLayout::new(vec![
//!     ChannelInfo::new("Gray", ChannelKind::Color, 0, 1),
//!     ChannelInfo::new("Alpha", ChannelKind::Alpha, 1, 1),
//! ]).unwrap();
//!
//! assert_eq!(layout.pixel_size(), 2);
//! assert_eq!(layout.alpha().map(|a| a.offset), Some(1));
//! ```

use crate::channel::{ChannelInfo, ChannelKind, ChannelType};
use crate::error::{Error, Result};
use std::sync::OnceLock;

/// Position and storage type of the alpha channel within a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaSlot {
    /// Byte offset.
    pub offset: usize,
    /// Storage type.
    pub value_type: ChannelType,
}

impl AlphaSlot {
    /// Width in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.value_type.size()
    }

    /// The slot's bytes within a pixel.
    #[inline]
    pub fn bytes<'a>(&self, pixel: &'a [u8]) -> &'a [u8] {
        &pixel[self.offset..self.offset + self.size()]
    }

    /// The slot's bytes within a pixel, mutably.
    #[inline]
    pub fn bytes_mut<'a>(&self, pixel: &'a mut [u8]) -> &'a mut [u8] {
        &mut pixel[self.offset..self.offset + self.size()]
    }
}

/// Ordered channel descriptions plus derived sizes.
#[derive(Debug, Clone)]
pub struct PixelLayout {
    channels: Vec<ChannelInfo>,
    pixel_size: usize,
    alpha: OnceLock<Option<AlphaSlot>>,
}

impl PixelLayout {
    /// Builds a layout from channel descriptions.
    ///
    /// Pixel size is the end of the furthest channel. Channels may not
    /// overlap, must have a known storage type, and at most one may be
    /// alpha.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLayout`] if the description breaks those rules or is
    /// empty.
    pub fn new(channels: Vec<ChannelInfo>) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::InvalidLayout("no channels".into()));
        }
        if channels.iter().filter(|c| c.is_alpha()).count() > 1 {
            return Err(Error::InvalidLayout("more than one alpha channel".into()));
        }
        for (i, a) in channels.iter().enumerate() {
            if a.value_type().is_none() {
                return Err(Error::InvalidLayout(format!(
                    "channel '{}' is {} bytes wide",
                    a.name(),
                    a.size()
                )));
            }
            for b in &channels[i + 1..] {
                if a.offset() < b.end() && b.offset() < a.end() {
                    return Err(Error::InvalidLayout(format!(
                        "channels '{}' and '{}' overlap",
                        a.name(),
                        b.name()
                    )));
                }
            }
        }
        let pixel_size = channels.iter().map(ChannelInfo::end).max().unwrap_or(0);
        Ok(Self {
            channels,
            pixel_size,
            alpha: OnceLock::new(),
        })
    }

    /// Channel descriptions in declaration order.
    #[inline]
    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    /// Bytes per pixel.
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// Total number of channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of color channels.
    pub fn color_channel_count(&self) -> usize {
        self.count_kind(ChannelKind::Color)
    }

    /// Number of substance channels.
    pub fn substance_channel_count(&self) -> usize {
        self.count_kind(ChannelKind::Substance)
    }

    fn count_kind(&self, kind: ChannelKind) -> usize {
        self.channels.iter().filter(|c| c.kind() == kind).count()
    }

    /// Iterates color channels in declaration order.
    pub fn color_channels(&self) -> impl Iterator<Item = &ChannelInfo> {
        self.channels.iter().filter(|c| c.is_color())
    }

    /// Alpha slot, memoized on first call.
    pub fn alpha(&self) -> Option<AlphaSlot> {
        *self.alpha.get_or_init(|| {
            self.channels.iter().find(|c| c.is_alpha()).and_then(|c| {
                Some(AlphaSlot {
                    offset: c.offset(),
                    value_type: c.value_type()?,
                })
            })
        })
    }

    /// Returns `true` if the layout has an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.alpha().is_some()
    }

    /// Reads alpha as an 8-bit value; `None` without an alpha channel.
    pub fn alpha_u8(&self, pixel: &[u8]) -> Option<u8> {
        let slot = self.alpha()?;
        Some(slot.value_type.read_u8(slot.bytes(pixel)))
    }

    /// Writes an 8-bit alpha, upscaled to the lane width.
    ///
    /// Returns `false` without an alpha channel.
    pub fn set_alpha_u8(&self, pixel: &mut [u8], value: u8) -> bool {
        let Some(slot) = self.alpha() else {
            return false;
        };
        slot.value_type.write_u8(slot.bytes_mut(pixel), value);
        true
    }

    /// Reads alpha as a unit float; `None` without an alpha channel.
    ///
    /// Float alpha is returned as stored.
    pub fn alpha_unit(&self, pixel: &[u8]) -> Option<f32> {
        let slot = self.alpha()?;
        Some(slot.value_type.read_unit(slot.bytes(pixel)))
    }

    /// Writes alpha from a unit float, clamped to `[0, 1]`.
    ///
    /// Returns `false` without an alpha channel.
    pub fn set_alpha_unit(&self, pixel: &mut [u8], value: f32) -> bool {
        let Some(slot) = self.alpha() else {
            return false;
        };
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        slot.value_type.write_unit(slot.bytes_mut(pixel), v);
        true
    }

    /// Checks that `len` bytes hold `count` pixels.
    pub fn check_pixels(&self, what: &'static str, len: usize, count: usize) -> Result<()> {
        let needed = count
            .checked_mul(self.pixel_size)
            .ok_or_else(|| Error::invalid_argument(format!("{what}: pixel count overflows")))?;
        if len < needed {
            return Err(Error::buffer_too_small(what, needed, len));
        }
        Ok(())
    }

    /// Checks a strided region of `rows` x `cols` pixels.
    pub fn check_region(
        &self,
        what: &'static str,
        len: usize,
        stride: usize,
        rows: usize,
        cols: usize,
    ) -> Result<()> {
        check_region(what, len, stride, rows, cols * self.pixel_size)
    }
}

/// Checks that a strided buffer holds `rows` rows of `row_bytes` bytes.
///
/// The last row only needs `row_bytes`, not a full stride.
pub fn check_region(
    what: &'static str,
    len: usize,
    stride: usize,
    rows: usize,
    row_bytes: usize,
) -> Result<()> {
    if rows == 0 || row_bytes == 0 {
        return Ok(());
    }
    if stride < row_bytes {
        return Err(Error::invalid_stride(what, stride, row_bytes));
    }
    let needed = (rows - 1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or_else(|| Error::invalid_argument(format!("{what}: region size overflows")))?;
    if len < needed {
        return Err(Error::buffer_too_small(what, needed, len));
    }
    Ok(())
}
