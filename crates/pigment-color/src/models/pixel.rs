//! Pixel models with one storage type for every channel.

use std::marker::PhantomData;
use std::sync::Arc;

use pigment_core::{
    ChannelInfo, CompositeOp, Degradation, Error, NormalizedColor, Outcome, PixelLayout, ScratchArena,
};
use pigment_icc::{Intent, Profile, ProfileFormat, ProfileSignature, TransformCache};
use tracing::{trace, warn};

use super::sample::Sample;
use crate::composite::{CompositeArgs, LaneMap, MAX_COLOR_LANES};
use crate::{ColorResult, ColorSpace};

/// What the color lanes of a [`PixelModel`] mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Red, green, blue.
    Rgb,
    /// One gray lane.
    Gray,
    /// Cyan, magenta, yellow, black ink.
    Cmyk,
    /// No color; the alpha lane is a selection mask.
    Mask,
}

impl Encoding {
    /// Number of color lanes the encoding expects.
    pub const fn color_channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Gray => 1,
            Self::Cmyk => 4,
            Self::Mask => 0,
        }
    }

    /// Profile format, `None` for masks.
    pub const fn profile_format(self) -> Option<ProfileFormat> {
        match self {
            Self::Rgb => Some(ProfileFormat::Rgb),
            Self::Gray => Some(ProfileFormat::Gray),
            Self::Cmyk => Some(ProfileFormat::Cmyk),
            Self::Mask => None,
        }
    }

    /// Profile signature the model accepts.
    pub const fn signature(self) -> ProfileSignature {
        match self {
            Self::Rgb => ProfileSignature::Rgb,
            Self::Gray => ProfileSignature::Gray,
            Self::Cmyk => ProfileSignature::Cmyk,
            Self::Mask => ProfileSignature::Other,
        }
    }

    /// Default user-visible operators.
    pub fn default_ops(self) -> Vec<CompositeOp> {
        use CompositeOp::*;
        match self {
            Self::Rgb => vec![
                Over, Multiply, Burn, Dodge, Divide, Screen, Overlay, Darken, Lighten, Add, Subtract, Diff, Hue,
                Saturation, Value, Color,
            ],
            Self::Gray | Self::Cmyk => vec![
                Over, Multiply, Burn, Dodge, Divide, Screen, Overlay, Darken, Lighten, Add, Subtract, Diff,
            ],
            Self::Mask => vec![Over],
        }
    }

    /// Uncalibrated device values (unit floats) to RGB.
    fn device_to_rgb(self, v: &[f32]) -> [f32; 3] {
        match self {
            Self::Rgb => [v[0], v[1], v[2]],
            Self::Gray => [v[0]; 3],
            Self::Cmyk => {
                let k = 1.0 - v[3];
                [(1.0 - v[0]) * k, (1.0 - v[1]) * k, (1.0 - v[2]) * k]
            }
            Self::Mask => [1.0; 3],
        }
    }

    /// Uncalibrated RGB to device values (unit floats).
    fn rgb_to_device(self, rgb: [f32; 3], out: &mut [f32]) {
        let [r, g, b] = rgb;
        match self {
            Self::Rgb => out[..3].copy_from_slice(&rgb),
            Self::Gray => out[0] = 0.30 * r + 0.59 * g + 0.11 * b,
            Self::Cmyk => {
                let k = 1.0 - r.max(g).max(b);
                if k >= 1.0 {
                    out[..4].copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);
                } else {
                    let ink = |c: f32| (1.0 - c - k) / (1.0 - k);
                    out[..4].copy_from_slice(&[ink(r), ink(g), ink(b), k]);
                }
            }
            Self::Mask => {}
        }
    }
}

/// A color model whose channels all share the storage type `S`.
///
/// Decoding goes through the model's profile into the shared sRGB reference
/// profile. Without a usable profile the model falls back to plain RGB math
/// and reports the degradation.
pub struct PixelModel<S: Sample> {
    id: String,
    name: String,
    layout: PixelLayout,
    encoding: Encoding,
    lanes: LaneMap,
    ops: Vec<CompositeOp>,
    default_profile: Option<Arc<Profile>>,
    reference: Arc<Profile>,
    intent: Intent,
    cache: TransformCache,
    scratch: ScratchArena,
    _sample: PhantomData<fn() -> S>,
}

impl<S: Sample> PixelModel<S> {
    /// Creates a model from its channel list.
    ///
    /// # Errors
    ///
    /// If the channels do not form a valid layout, are not of type `S`, or
    /// do not match the encoding's color lane count. Masks need an alpha
    /// lane.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        encoding: Encoding,
        channels: Vec<ChannelInfo>,
    ) -> ColorResult<Self> {
        let layout = PixelLayout::new(channels)?;
        if let Some(ch) = layout.channels().iter().find(|c| c.value_type() != Some(S::TYPE)) {
            return Err(Error::InvalidLayout(format!(
                "channel '{}' is {} bytes, model lanes are {}",
                ch.name(),
                ch.size(),
                S::TYPE
            ))
            .into());
        }
        let colors = layout.color_channel_count();
        if colors != encoding.color_channels() || colors > MAX_COLOR_LANES {
            return Err(Error::InvalidLayout(format!(
                "{encoding:?} needs {} color channels, got {colors}",
                encoding.color_channels()
            ))
            .into());
        }
        if encoding == Encoding::Mask && !layout.has_alpha() {
            return Err(Error::InvalidLayout("mask model without alpha".into()).into());
        }

        let lanes = LaneMap {
            pixel_size: layout.pixel_size(),
            color: layout.color_channels().map(ChannelInfo::offset).collect(),
            substance: layout
                .channels()
                .iter()
                .filter(|c| c.kind() == pigment_core::ChannelKind::Substance)
                .map(ChannelInfo::offset)
                .collect(),
            alpha: layout.alpha().map(|a| a.offset),
            rgb: (encoding == Encoding::Rgb).then_some([0, 1, 2]),
        };

        Ok(Self {
            id: id.into(),
            name: name.into(),
            layout,
            encoding,
            lanes,
            ops: encoding.default_ops(),
            default_profile: None,
            reference: Arc::new(Profile::srgb()),
            intent: Intent::Perceptual,
            cache: TransformCache::new(false),
            scratch: ScratchArena::new(),
            _sample: PhantomData,
        })
    }

    /// Replaces the user-visible operator list. Hue-family operators are
    /// dropped for non-RGB encodings.
    pub fn with_composite_ops(mut self, ops: impl IntoIterator<Item = CompositeOp>) -> Self {
        let rgb = self.encoding == Encoding::Rgb;
        self.ops = ops
            .into_iter()
            .filter(|op| !op.is_internal() && (rgb || !op.needs_rgb()))
            .collect();
        self
    }

    /// Sets the default profile. Profiles of another signature are ignored.
    pub fn with_default_profile(mut self, profile: Option<Arc<Profile>>) -> Self {
        match profile {
            Some(p) if p.signature() != self.encoding.signature() => {
                warn!(model = %self.id, profile = p.name(), signature = %p.signature(), "profile does not fit model");
            }
            p => self.default_profile = p,
        }
        self
    }

    /// Sets the sRGB profile normalized colors are referred to.
    pub fn with_reference_profile(mut self, reference: Arc<Profile>) -> Self {
        self.reference = reference;
        self
    }

    /// Sets the intent used to decode and encode single pixels.
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }

    /// Rebuilds the transform cache with the given black-point setting.
    pub fn with_black_point_compensation(mut self, enabled: bool) -> Self {
        self.cache = TransformCache::new(enabled);
        self
    }

    /// Color lane meaning.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Profile normalized colors are referred to.
    pub fn reference_profile(&self) -> &Arc<Profile> {
        &self.reference
    }

    fn color_lanes(&self) -> usize {
        self.lanes.color.len()
    }

    fn fits(&self, profile: &Profile) -> bool {
        profile.is_valid() && profile.signature() == self.encoding.signature()
    }

    /// Picks the profile for a decode or encode, or the reason there is none.
    ///
    /// An explicit profile that does not fit is treated as absent.
    fn resolve<'a>(&'a self, profile: Option<&'a Arc<Profile>>) -> Result<&'a Arc<Profile>, Degradation> {
        match profile.filter(|p| self.fits(p)).or(self.default_profile.as_ref()) {
            Some(p) if self.fits(p) => Ok(p),
            _ => Err(Degradation::MissingProfile),
        }
    }

    /// Runs one pixel's worth of floats through a cached transform.
    fn transform_one(
        &self,
        source: &Arc<Profile>,
        source_format: ProfileFormat,
        dest: &Arc<Profile>,
        dest_format: ProfileFormat,
        input: &[f32],
        output: &mut [f32],
    ) -> bool {
        let Some(t) = self
            .cache
            .get_or_create(source, source_format, dest, dest_format, self.intent)
        else {
            return false;
        };
        match t.apply(input, output) {
            Ok(_) => true,
            Err(e) => {
                warn!(model = %self.id, error = %e, "pixel transform failed");
                false
            }
        }
    }
}

impl<S: Sample> ColorSpace for PixelModel<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &PixelLayout {
        &self.layout
    }

    fn signature(&self) -> ProfileSignature {
        self.encoding.signature()
    }

    fn profile_format(&self) -> Option<ProfileFormat> {
        self.encoding.profile_format()
    }

    fn default_profile(&self) -> Option<&Arc<Profile>> {
        self.default_profile.as_ref()
    }

    fn transform_cache(&self) -> &TransformCache {
        &self.cache
    }

    fn scratch(&self) -> &ScratchArena {
        &self.scratch
    }

    fn to_normalized(
        &self,
        pixel: &[u8],
        profile: Option<&Arc<Profile>>,
        out: &mut NormalizedColor,
    ) -> ColorResult<Outcome> {
        self.layout.check_pixels("pixel", pixel.len(), 1)?;
        out.opacity = self.layout.alpha_unit(pixel).unwrap_or(1.0);

        let Some(format) = self.encoding.profile_format() else {
            out.set_rgb([1.0; 3]);
            return Ok(Outcome::Exact);
        };

        let mut device = [0.0f32; MAX_COLOR_LANES];
        self.to_profile_floats(pixel, &mut device);
        let scale = format.scale();
        let naive = |device: &[f32; MAX_COLOR_LANES]| self.encoding.device_to_rgb(&device.map(|v| v / scale));

        let outcome = match self.resolve(profile) {
            Ok(p) if format == ProfileFormat::Rgb && Arc::ptr_eq(p, &self.reference) => {
                out.set_rgb([device[0], device[1], device[2]]);
                Outcome::Exact
            }
            Ok(p) => {
                let mut rgb = [0.0f32; 3];
                let n = self.color_lanes();
                if self.transform_one(p, format, &self.reference, ProfileFormat::Rgb, &device[..n], &mut rgb) {
                    out.set_rgb(rgb);
                    Outcome::Exact
                } else {
                    trace!(model = %self.id, "decoding without transform");
                    out.set_rgb(naive(&device));
                    Degradation::UncalibratedFallback.into()
                }
            }
            Err(reason) => {
                out.set_rgb(naive(&device));
                reason.into()
            }
        };
        Ok(outcome)
    }

    fn from_normalized(
        &self,
        color: &NormalizedColor,
        profile: Option<&Arc<Profile>>,
        dst: &mut [u8],
    ) -> ColorResult<Outcome> {
        self.layout.check_pixels("pixel", dst.len(), 1)?;
        let color = color.clamped();
        self.layout.set_alpha_unit(dst, color.opacity);

        let Some(format) = self.encoding.profile_format() else {
            return Ok(Outcome::Exact);
        };

        let n = self.color_lanes();
        let scale = format.scale();
        let mut device = [0.0f32; MAX_COLOR_LANES];
        let naive = |device: &mut [f32; MAX_COLOR_LANES]| {
            self.encoding.rgb_to_device(color.rgb(), &mut device[..]);
            for v in device.iter_mut() {
                *v *= scale;
            }
        };

        let outcome = match self.resolve(profile) {
            Ok(p) if format == ProfileFormat::Rgb && Arc::ptr_eq(p, &self.reference) => {
                device[..3].copy_from_slice(&color.rgb());
                Outcome::Exact
            }
            Ok(p) => {
                if self.transform_one(&self.reference, ProfileFormat::Rgb, p, format, &color.rgb(), &mut device[..n]) {
                    Outcome::Exact
                } else {
                    trace!(model = %self.id, "encoding without transform");
                    naive(&mut device);
                    Degradation::UncalibratedFallback.into()
                }
            }
            Err(reason) => {
                naive(&mut device);
                reason.into()
            }
        };
        self.from_profile_floats(&device, dst);
        Ok(outcome)
    }

    fn to_profile_floats(&self, pixel: &[u8], out: &mut [f32]) {
        let scale = self.encoding.profile_format().map_or(1.0, |f| f.scale());
        for (v, &o) in out.iter_mut().zip(&self.lanes.color) {
            *v = S::read_unit(&pixel[o..]) * scale;
        }
    }

    fn from_profile_floats(&self, values: &[f32], dst: &mut [u8]) {
        let scale = self.encoding.profile_format().map_or(1.0, |f| f.scale());
        for (&v, &o) in values.iter().zip(&self.lanes.color) {
            S::write_unit(&mut dst[o..], v / scale);
        }
    }

    fn composite(&self, op: CompositeOp, args: CompositeArgs<'_>) -> Outcome {
        S::composite(&self.lanes, op, args)
    }

    fn user_visible_composite_ops(&self) -> &[CompositeOp] {
        &self.ops
    }
}

impl<S: Sample> std::fmt::Debug for PixelModel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelModel")
            .field("id", &self.id)
            .field("encoding", &self.encoding)
            .field("lanes", &S::TYPE)
            .field("pixel_size", &self.layout.pixel_size())
            .field("default_profile", &self.default_profile.as_ref().map(|p| p.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pigment_core::{ChannelKind, ChannelType};

    fn cmyk_channels() -> Vec<ChannelInfo> {
        ["Cyan", "Magenta", "Yellow", "Black"]
            .iter()
            .enumerate()
            .map(|(i, n)| ChannelInfo::new(*n, ChannelKind::Color, i, 1))
            .chain([ChannelInfo::new("Alpha", ChannelKind::Alpha, 4, 1)])
            .collect()
    }

    #[test]
    fn test_rejects_wrong_lane_width() {
        let err = PixelModel::<u16>::new("X", "X", Encoding::Gray, vec![ChannelInfo::new(
            "Gray",
            ChannelKind::Color,
            0,
            1,
        )]);
        assert!(err.is_err());

        let err = PixelModel::<f32>::new("X", "X", Encoding::Gray, vec![ChannelInfo::typed(
            "Gray",
            ChannelKind::Color,
            0,
            ChannelType::F16,
        )]);
        assert!(err.is_err());
    }

    #[test]
    fn test_float_gray_keeps_values_through_profile_floats() {
        let cs = PixelModel::<f32>::new("GF", "GF", Encoding::Gray, vec![
            ChannelInfo::typed("Gray", ChannelKind::Color, 0, ChannelType::F32),
            ChannelInfo::typed("Alpha", ChannelKind::Alpha, 4, ChannelType::F32),
        ])
        .unwrap();
        let mut px = [0u8; 8];
        px[..4].copy_from_slice(&1.5f32.to_ne_bytes());
        let mut v = [0.0f32];
        cs.to_profile_floats(&px, &mut v);
        assert_eq!(v, [1.5]);
        cs.from_profile_floats(&[0.25], &mut px);
        assert_eq!(f32::from_ne_bytes([px[0], px[1], px[2], px[3]]), 0.25);
    }

    #[test]
    fn test_rejects_wrong_color_count() {
        let err = PixelModel::<u8>::new("X", "X", Encoding::Rgb, vec![ChannelInfo::new(
            "Gray",
            ChannelKind::Color,
            0,
            1,
        )]);
        assert!(err.is_err());
    }

    #[test]
    fn test_cmyk_naive_round_trip() {
        let cs = PixelModel::<u8>::new("CMYKA", "CMYK", Encoding::Cmyk, cmyk_channels()).unwrap();
        let mut color = NormalizedColor::default();
        let outcome = cs.to_normalized(&[255, 0, 0, 0, 255], None, &mut color).unwrap();
        assert_eq!(outcome.degradation(), Some(&Degradation::MissingProfile));
        assert_abs_diff_eq!(color.red, 0.0);
        assert_abs_diff_eq!(color.green, 1.0);

        let mut px = [0u8; 5];
        cs.from_normalized(&NormalizedColor::new(0.5, 0.5, 0.5, 1.0), None, &mut px).unwrap();
        assert_eq!(px, [0, 0, 0, 128, 255]);
    }

    #[test]
    fn test_hue_ops_filtered_for_gray() {
        let cs = PixelModel::<u8>::new("G", "G", Encoding::Gray, vec![ChannelInfo::new(
            "Gray",
            ChannelKind::Color,
            0,
            1,
        )])
        .unwrap()
        .with_composite_ops([CompositeOp::Over, CompositeOp::Hue, CompositeOp::Clear]);
        assert_eq!(cs.user_visible_composite_ops(), &[CompositeOp::Over]);
        assert!(cs.supports_composite_op(CompositeOp::Clear));
        assert!(!cs.supports_composite_op(CompositeOp::Hue));
    }

    #[test]
    fn test_wrong_signature_profile_ignored() {
        let cs = PixelModel::<u8>::new("G", "G", Encoding::Gray, vec![ChannelInfo::new(
            "Gray",
            ChannelKind::Color,
            0,
            1,
        )])
        .unwrap()
        .with_default_profile(Some(Arc::new(Profile::srgb())));
        assert!(cs.default_profile().is_none());
        assert!(!cs.is_valid());
    }

    #[test]
    fn test_unusable_explicit_profile_falls_back_to_default() {
        let gray = Arc::new(Profile::gray(2.2).unwrap());
        let cs = PixelModel::<u8>::new("GA", "GA", Encoding::Gray, vec![
            ChannelInfo::new("Gray", ChannelKind::Color, 0, 1),
            ChannelInfo::new("Alpha", ChannelKind::Alpha, 1, 1),
        ])
        .unwrap()
        .with_default_profile(Some(gray));

        let mut expected = NormalizedColor::default();
        assert!(cs.to_normalized(&[128, 255], None, &mut expected).unwrap().is_exact());

        let broken = Arc::new(Profile::placeholder("Broken", ProfileSignature::Gray));
        let srgb = Arc::new(Profile::srgb());
        for explicit in [&broken, &srgb] {
            let mut color = NormalizedColor::default();
            let outcome = cs.to_normalized(&[128, 255], Some(explicit), &mut color).unwrap();
            assert!(outcome.is_exact(), "{}", explicit.name());
            assert_eq!(color, expected);

            let mut px = [0u8; 2];
            assert!(cs.from_normalized(&expected, Some(explicit), &mut px).unwrap().is_exact());
            assert!(px[0].abs_diff(128) <= 1);
        }
    }
}
