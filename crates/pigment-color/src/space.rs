//! The [`ColorSpace`] trait.
//!
//! A color space is one long-lived object per pixel format. It describes the
//! pixel layout, decodes and encodes single pixels through the normalized
//! interchange color, converts buffers into other spaces and composites
//! buffers in place.
//!
//! Models implement a small set of required primitives. Everything else
//! (mixing, convolution, brightness/contrast, buffer conversion, `bit_blt`)
//! is provided on top of them and works for any model.
//!
//! # Example
//!
//! ```rust
//! use pigment_color::models::{self, ModelContext};
//! use pigment_color::ColorSpace;
//!
//! let rgba = models::rgba8(&ModelContext::standalone()).unwrap();
//! assert_eq!(rgba.pixel_size(), 4);
//! assert_eq!(rgba.intensity(&[255, 255, 255, 255]).unwrap(), 255);
//! ```

use std::fmt;
use std::sync::Arc;

use pigment_core::{
    ChannelInfo, CompositeOp, ConvolveChannels, NormalizedColor, Outcome, PixelLayout, ScratchArena,
};
use pigment_icc::{Intent, Profile, ProfileFormat, ProfileSignature, TransformCache};

use crate::composite::{BlitOptions, CompositeArgs, Source};
use crate::{adjust, composite, convert, ColorResult};

/// A pixel format with conversion and compositing behaviour.
///
/// Implementations are shared as `Arc<dyn ColorSpace>` and must be safe to
/// use from several threads; only the transform cache and scratch arena
/// mutate after construction.
pub trait ColorSpace: Send + Sync + fmt::Debug {
    /// Stable identifier, for example `"RGBA"`.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Channel layout.
    fn layout(&self) -> &PixelLayout;

    /// Profile signature this model accepts.
    fn signature(&self) -> ProfileSignature;

    /// Float format used with the transform engine, or `None` for models
    /// that are never color managed.
    fn profile_format(&self) -> Option<ProfileFormat>;

    /// Profile used when a caller passes none.
    fn default_profile(&self) -> Option<&Arc<Profile>>;

    /// Transforms built by this space.
    fn transform_cache(&self) -> &TransformCache;

    /// Buffer for cross-space compositing.
    fn scratch(&self) -> &ScratchArena;

    /// Decodes one pixel.
    ///
    /// `profile` overrides the default profile when it is valid and has the
    /// model's signature; otherwise it is ignored. Without a usable profile
    /// the model decodes with uncalibrated math and says so in the outcome.
    fn to_normalized(
        &self,
        pixel: &[u8],
        profile: Option<&Arc<Profile>>,
        out: &mut NormalizedColor,
    ) -> ColorResult<Outcome>;

    /// Encodes one pixel, alpha included.
    fn from_normalized(
        &self,
        color: &NormalizedColor,
        profile: Option<&Arc<Profile>>,
        dst: &mut [u8],
    ) -> ColorResult<Outcome>;

    /// Writes the pixel's color channels as device floats in the
    /// convention of [`ProfileFormat`]. Writes nothing for unmanaged models.
    ///
    /// # Panics
    ///
    /// If `pixel` or `out` is shorter than the layout requires.
    fn to_profile_floats(&self, pixel: &[u8], out: &mut [f32]);

    /// Inverse of [`to_profile_floats`](Self::to_profile_floats). Alpha and
    /// substance channels are not touched.
    ///
    /// # Panics
    ///
    /// If `values` or `dst` is shorter than the layout requires.
    fn from_profile_floats(&self, values: &[f32], dst: &mut [u8]);

    /// Composites `args.src` onto `args.dst`, both already in this space.
    ///
    /// Regions are validated by the caller.
    fn composite(&self, op: CompositeOp, args: CompositeArgs<'_>) -> Outcome;

    /// Operators offered to users, in menu order.
    fn user_visible_composite_ops(&self) -> &[CompositeOp];

    /// Whether `bit_blt` applies `op`. Internal operators always apply.
    fn supports_composite_op(&self, op: CompositeOp) -> bool {
        op.is_internal() || self.user_visible_composite_ops().contains(&op)
    }

    /// Bytes per pixel.
    fn pixel_size(&self) -> usize {
        self.layout().pixel_size()
    }

    /// Total channel count.
    fn channel_count(&self) -> usize {
        self.layout().channel_count()
    }

    /// Color channel count.
    fn color_channel_count(&self) -> usize {
        self.layout().color_channel_count()
    }

    /// Substance channel count.
    fn substance_channel_count(&self) -> usize {
        self.layout().substance_channel_count()
    }

    /// Whether pixels carry alpha.
    fn has_alpha(&self) -> bool {
        self.layout().has_alpha()
    }

    /// Channel descriptions in layout order.
    fn channels(&self) -> &[ChannelInfo] {
        self.layout().channels()
    }

    /// `false` when a color-managed model has no usable default profile.
    ///
    /// Decoding still works on an invalid space, through uncalibrated math.
    fn is_valid(&self) -> bool {
        self.profile_format().is_none() || self.default_profile().is_some_and(|p| p.is_valid())
    }

    /// Whether `profile` describes pixels of this model.
    fn profile_is_compatible(&self, profile: &Profile) -> bool {
        profile.signature() == self.signature()
    }

    /// Alpha of one pixel at 8-bit scale, `None` without alpha.
    fn alpha(&self, pixel: &[u8]) -> Option<u8> {
        if pixel.len() < self.pixel_size() {
            return None;
        }
        self.layout().alpha_u8(pixel)
    }

    /// Sets alpha of `count` pixels.
    fn set_alpha(&self, pixels: &mut [u8], value: u8, count: usize) -> ColorResult<Outcome> {
        adjust::set_alpha(self, pixels, value, count)
    }

    /// Multiplies alpha by an 8-bit mask, one mask byte per pixel.
    fn apply_mask(&self, pixels: &mut [u8], mask: &[u8], count: usize) -> ColorResult<Outcome> {
        adjust::apply_mask(self, pixels, mask, count, false)
    }

    /// Multiplies alpha by the inverse of an 8-bit mask.
    fn apply_inverse_mask(&self, pixels: &mut [u8], mask: &[u8], count: usize) -> ColorResult<Outcome> {
        adjust::apply_mask(self, pixels, mask, count, true)
    }

    /// Perceptual distance between two pixels, `0..=255`.
    fn difference(&self, a: &[u8], b: &[u8]) -> ColorResult<u8> {
        adjust::difference(self, a, b)
    }

    /// Weighted, opacity-aware average of `pixels` written to `dst`.
    ///
    /// # Errors
    ///
    /// If the lists differ in length or the weights sum above 255.
    fn mix_colors(&self, pixels: &[&[u8]], weights: &[u8], dst: &mut [u8]) -> ColorResult<Outcome> {
        adjust::mix_colors(self, pixels, weights, dst)
    }

    /// Applies a linear kernel over `pixels` and writes the result to `dst`.
    ///
    /// # Errors
    ///
    /// If the lists differ in length or `factor` is zero.
    fn convolve_colors(
        &self,
        pixels: &[&[u8]],
        kernel: &[i32],
        channels: ConvolveChannels,
        dst: &mut [u8],
        factor: i32,
        offset: i32,
    ) -> ColorResult<Outcome> {
        adjust::convolve_colors(self, pixels, kernel, channels, dst, factor, offset)
    }

    /// Scales color channels by `shade / 255`, or by
    /// `shade / (compensation * 255)` when `compensate` is set.
    fn darken(
        &self,
        src: &[u8],
        dst: &mut [u8],
        shade: i32,
        compensate: bool,
        compensation: f64,
        count: usize,
    ) -> ColorResult<Outcome> {
        adjust::darken(self, src, dst, shade, compensate, compensation, count)
    }

    /// Luma of one pixel, `0..=255`.
    fn intensity(&self, pixel: &[u8]) -> ColorResult<u8> {
        adjust::intensity(self, pixel)
    }

    /// Brightness and contrast adjustment; both arguments clamp to
    /// `-100..=100`.
    fn brightness_contrast(
        &self,
        src: &[u8],
        dst: &mut [u8],
        brightness: i32,
        contrast: i32,
        count: usize,
    ) -> ColorResult<Outcome> {
        adjust::brightness_contrast(self, src, dst, brightness, contrast, count)
    }

    /// Inverts color in place, keeping opacity.
    fn invert_color(&self, pixels: &mut [u8], count: usize) -> ColorResult<Outcome> {
        adjust::invert_color(self, pixels, count)
    }

    /// Every channel of one pixel as a unit float, in layout order.
    fn normalized_channel_values(&self, pixel: &[u8]) -> ColorResult<Vec<f32>> {
        adjust::normalized_channel_values(self, pixel)
    }

    /// One channel's stored value as text: the raw integer for integer
    /// lanes, the float for float lanes.
    fn channel_value_text(&self, pixel: &[u8], index: usize) -> ColorResult<String> {
        adjust::channel_value_text(self, pixel, index)
    }

    /// Converts `count` pixels into `dst_space`.
    ///
    /// Absent profiles resolve to each space's default, and so do explicit
    /// profiles that are invalid or of the wrong signature.
    #[allow(clippy::too_many_arguments)]
    fn convert_pixels_to(
        &self,
        src: &[u8],
        src_profile: Option<&Arc<Profile>>,
        dst: &mut [u8],
        dst_space: &dyn ColorSpace,
        dst_profile: Option<&Arc<Profile>>,
        count: usize,
        intent: Intent,
    ) -> ColorResult<Outcome> {
        convert::convert_pixels(self, src, src_profile, dst, dst_space, dst_profile, count, intent)
    }

    /// Composites a strided source region onto `dst`.
    ///
    /// Sources in another space are converted into this space first.
    fn bit_blt(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: Source<'_>,
        opts: &BlitOptions<'_>,
    ) -> ColorResult<Outcome> {
        composite::bit_blt(self, dst, dst_stride, src, opts)
    }

    /// [`bit_blt`](Self::bit_blt) with the operator given by identifier.
    ///
    /// Unknown identifiers leave `dst` untouched.
    fn bit_blt_by_id(
        &self,
        op_id: &str,
        dst: &mut [u8],
        dst_stride: usize,
        src: Source<'_>,
        opts: &BlitOptions<'_>,
    ) -> ColorResult<Outcome> {
        match CompositeOp::from_id(op_id) {
            Some(op) => self.bit_blt(dst, dst_stride, src, &BlitOptions { op, ..*opts }),
            None => {
                tracing::trace!(space = self.id(), op = op_id, "unknown composite op");
                Ok(pigment_core::Degradation::UnknownOperator(op_id.to_string()).into())
            }
        }
    }
}
