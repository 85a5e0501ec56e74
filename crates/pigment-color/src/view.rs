//! Borrowed single-pixel views.
//!
//! A view ties pixel bytes to the space that interprets them. It never owns
//! the buffer.

use std::sync::Arc;

use pigment_core::{Error, NormalizedColor, Outcome};
use pigment_icc::Profile;

use crate::{ColorResult, ColorSpace};

fn alpha_range(space: &dyn ColorSpace) -> Option<std::ops::Range<usize>> {
    space.layout().alpha().map(|a| a.offset..a.offset + a.size())
}

/// Read-only view of one pixel.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    space: &'a dyn ColorSpace,
    bytes: &'a [u8],
    profile: Option<&'a Arc<Profile>>,
}

impl<'a> PixelView<'a> {
    /// Views the first pixel of `bytes`.
    ///
    /// # Errors
    ///
    /// If `bytes` is shorter than one pixel.
    pub fn new(space: &'a dyn ColorSpace, bytes: &'a [u8]) -> ColorResult<Self> {
        let ps = space.pixel_size();
        let bytes = bytes.get(..ps).ok_or(Error::buffer_too_small("pixel", ps, bytes.len()))?;
        Ok(Self {
            space,
            bytes,
            profile: None,
        })
    }

    /// Interprets the pixel with `profile` instead of the space default.
    pub fn with_profile(mut self, profile: &'a Arc<Profile>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Owning space.
    pub fn space(&self) -> &'a dyn ColorSpace {
        self.space
    }

    /// Pixel bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Profile override, if any.
    pub fn profile(&self) -> Option<&'a Arc<Profile>> {
        self.profile
    }

    /// Alpha at 8-bit scale.
    pub fn alpha(&self) -> Option<u8> {
        self.space.alpha(self.bytes)
    }

    /// Raw alpha bytes.
    pub fn alpha_bytes(&self) -> Option<&'a [u8]> {
        alpha_range(self.space).map(|r| &self.bytes[r])
    }

    /// Decodes the pixel.
    pub fn to_normalized(&self) -> ColorResult<(NormalizedColor, Outcome)> {
        let mut color = NormalizedColor::default();
        let outcome = self.space.to_normalized(self.bytes, self.profile, &mut color)?;
        Ok((color, outcome))
    }

    /// Every channel as a unit float.
    pub fn channel_values(&self) -> ColorResult<Vec<f32>> {
        self.space.normalized_channel_values(self.bytes)
    }
}

/// Mutable view of one pixel.
#[derive(Debug)]
pub struct PixelViewMut<'a> {
    space: &'a dyn ColorSpace,
    bytes: &'a mut [u8],
    profile: Option<&'a Arc<Profile>>,
}

impl<'a> PixelViewMut<'a> {
    /// Views the first pixel of `bytes` mutably.
    ///
    /// # Errors
    ///
    /// If `bytes` is shorter than one pixel.
    pub fn new(space: &'a dyn ColorSpace, bytes: &'a mut [u8]) -> ColorResult<Self> {
        let ps = space.pixel_size();
        let got = bytes.len();
        let bytes = bytes.get_mut(..ps).ok_or(Error::buffer_too_small("pixel", ps, got))?;
        Ok(Self {
            space,
            bytes,
            profile: None,
        })
    }

    /// Encodes with `profile` instead of the space default.
    pub fn with_profile(mut self, profile: &'a Arc<Profile>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Read-only view of the same pixel.
    pub fn as_view(&self) -> PixelView<'_> {
        PixelView {
            space: self.space,
            bytes: self.bytes,
            profile: self.profile,
        }
    }

    /// Alpha at 8-bit scale.
    pub fn alpha(&self) -> Option<u8> {
        self.space.alpha(self.bytes)
    }

    /// Raw alpha bytes, writable.
    pub fn alpha_bytes_mut(&mut self) -> Option<&mut [u8]> {
        alpha_range(self.space).map(|r| &mut self.bytes[r])
    }

    /// Sets alpha at 8-bit scale.
    pub fn set_alpha(&mut self, value: u8) -> ColorResult<Outcome> {
        self.space.set_alpha(self.bytes, value, 1)
    }

    /// Decodes the pixel.
    pub fn to_normalized(&self) -> ColorResult<(NormalizedColor, Outcome)> {
        self.as_view().to_normalized()
    }

    /// Encodes `color` into the pixel.
    pub fn from_normalized(&mut self, color: &NormalizedColor) -> ColorResult<Outcome> {
        self.space.from_normalized(color, self.profile, self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{self, ModelContext};

    #[test]
    fn test_view_reads() {
        let rgba = models::rgba16(&ModelContext::standalone()).unwrap();
        let mut px = [0u8; 10];
        px[6..8].copy_from_slice(&65535u16.to_ne_bytes());
        let view = PixelView::new(&rgba, &px).unwrap();
        assert_eq!(view.bytes().len(), 8);
        assert_eq!(view.alpha(), Some(255));
        assert_eq!(view.alpha_bytes(), Some(&[255u8, 255][..]));
        let (color, outcome) = view.to_normalized().unwrap();
        assert!(outcome.is_exact());
        assert_eq!(color, NormalizedColor::BLACK);
    }

    #[test]
    fn test_view_too_short() {
        let rgba = models::rgba8(&ModelContext::standalone()).unwrap();
        assert!(PixelView::new(&rgba, &[0, 0, 0]).is_err());
        let mut short = [0u8; 2];
        assert!(PixelViewMut::new(&rgba, &mut short).is_err());
    }

    #[test]
    fn test_view_mut_writes() {
        let rgba = models::rgba8(&ModelContext::standalone()).unwrap();
        let mut px = [0u8; 4];
        let mut view = PixelViewMut::new(&rgba, &mut px).unwrap();
        view.from_normalized(&NormalizedColor::new(1.0, 0.0, 0.5, 1.0)).unwrap();
        view.set_alpha(64).unwrap();
        if let Some(a) = view.alpha_bytes_mut() {
            a[0] += 1;
        }
        assert_eq!(view.alpha(), Some(65));
        assert_eq!(px, [255, 0, 128, 65]);
    }

    #[test]
    fn test_mask_view_has_no_color() {
        let mask = models::alpha8(&ModelContext::standalone()).unwrap();
        let view = PixelView::new(&mask, &[77]).unwrap();
        let (color, _) = view.to_normalized().unwrap();
        assert_eq!(color.rgb8(), [255, 255, 255]);
        assert_eq!(color.opacity8(), 77);
    }
}
