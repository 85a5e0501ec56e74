//! Buffer conversion between color spaces.
//!
//! The calibrated path converts every pixel in one bulk call through a
//! transform from the source space's cache. When no transform can be had
//! the pixels travel one at a time through [`NormalizedColor`].

use std::sync::Arc;

use pigment_core::{Degradation, NormalizedColor, Outcome};
use pigment_icc::{IccResult, Intent, Profile, ProfileFormat};
use tracing::{trace, warn};

use crate::{ColorResult, ColorSpace};

fn same_profile(a: Option<&Arc<Profile>>, b: Option<&Arc<Profile>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Picks the profile a space converts with. An explicit profile the space
/// cannot use counts as absent.
fn usable_profile<'a, S: ColorSpace + ?Sized>(
    space: &'a S,
    profile: Option<&'a Arc<Profile>>,
) -> Option<&'a Arc<Profile>> {
    profile
        .filter(|p| p.is_valid() && p.signature() == space.signature())
        .or(space.default_profile())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn convert_pixels<S, D>(
    src_space: &S,
    src: &[u8],
    src_profile: Option<&Arc<Profile>>,
    dst: &mut [u8],
    dst_space: &D,
    dst_profile: Option<&Arc<Profile>>,
    count: usize,
    intent: Intent,
) -> ColorResult<Outcome>
where
    S: ColorSpace + ?Sized,
    D: ColorSpace + ?Sized,
{
    src_space.layout().check_pixels("source", src.len(), count)?;
    dst_space.layout().check_pixels("destination", dst.len(), count)?;
    if count == 0 {
        return Ok(Outcome::Exact);
    }

    let src_profile = usable_profile(src_space, src_profile);
    let dst_profile = usable_profile(dst_space, dst_profile);

    if src_space.id() == dst_space.id() && same_profile(src_profile, dst_profile) {
        let n = count * src_space.pixel_size();
        dst[..n].copy_from_slice(&src[..n]);
        return Ok(Outcome::Exact);
    }

    if let (Some(sf), Some(df), Some(sp), Some(dp)) = (
        src_space.profile_format(),
        dst_space.profile_format(),
        src_profile,
        dst_profile,
    ) {
        let pair = Calibrated {
            source: (sp, sf),
            dest: (dp, df),
            intent,
        };
        match pair.run(src_space, src, dst_space, dst, count) {
            Ok(true) => return Ok(Outcome::Exact),
            Ok(false) => {}
            Err(e) => warn!(
                source = src_space.id(),
                dest = dst_space.id(),
                error = %e,
                "bulk transform failed"
            ),
        }
    }

    trace!(source = src_space.id(), dest = dst_space.id(), count, "uncalibrated conversion");
    let sps = src_space.pixel_size();
    let dps = dst_space.pixel_size();
    let mut color = NormalizedColor::default();
    for (s, d) in src.chunks_exact(sps).zip(dst.chunks_exact_mut(dps)).take(count) {
        src_space.to_normalized(s, src_profile, &mut color)?;
        dst_space.from_normalized(&color, dst_profile, d)?;
    }
    Ok(Degradation::UncalibratedFallback.into())
}

struct Calibrated<'a> {
    source: (&'a Arc<Profile>, ProfileFormat),
    dest: (&'a Arc<Profile>, ProfileFormat),
    intent: Intent,
}

impl Calibrated<'_> {
    /// Returns `Ok(false)` when the source cache has no transform for the pair.
    fn run<S, D>(&self, src_space: &S, src: &[u8], dst_space: &D, dst: &mut [u8], count: usize) -> IccResult<bool>
    where
        S: ColorSpace + ?Sized,
        D: ColorSpace + ?Sized,
    {
        let (sp, sf) = self.source;
        let (dp, df) = self.dest;
        let (sc, dc) = (sf.channels(), df.channels());
        let (sps, dps) = (src_space.pixel_size(), dst_space.pixel_size());

        let mut scratch = src_space.scratch().acquire_floats(count * (sc + dc));
        let (values, out) = scratch.split_at_mut(count * sc);
        for (px, v) in src.chunks_exact(sps).zip(values.chunks_exact_mut(sc)) {
            src_space.to_profile_floats(px, v);
        }

        let values: &[f32] = if Arc::ptr_eq(sp, dp) && sf == df {
            &values[..count * dc]
        } else {
            let Some(transform) = src_space.transform_cache().get_or_create(sp, sf, dp, df, self.intent) else {
                return Ok(false);
            };
            transform.apply(values, out)?;
            out
        };

        let src_layout = src_space.layout();
        let dst_layout = dst_space.layout();
        for ((s, d), v) in src
            .chunks_exact(sps)
            .zip(dst.chunks_exact_mut(dps))
            .zip(values.chunks_exact(dc))
            .take(count)
        {
            dst_space.from_profile_floats(v, d);
            let opacity = src_layout.alpha_unit(s).unwrap_or(1.0);
            dst_layout.set_alpha_unit(d, opacity);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{self, ModelContext};
    use approx::assert_abs_diff_eq;
    use pigment_icc::ProfileSignature;

    #[test]
    fn test_same_space_copies_bytes() {
        let ctx = ModelContext::standalone();
        let rgba = models::rgba8(&ctx).unwrap();
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = [0u8; 8];
        let outcome = rgba
            .convert_pixels_to(&src, None, &mut dst, &rgba, None, 2, Intent::Perceptual)
            .unwrap();
        assert!(outcome.is_exact());
        assert_eq!(dst, src);
    }

    #[test]
    fn test_widen_shares_reference_profile() {
        let ctx = ModelContext::standalone();
        let rgba = models::rgba8(&ctx).unwrap();
        let rgba16 = models::rgba16(&ctx).unwrap();
        let src = [255u8, 0, 128, 64];
        let mut dst = [0u8; 8];
        let outcome = rgba
            .convert_pixels_to(&src, None, &mut dst, &rgba16, None, 1, Intent::Perceptual)
            .unwrap();
        assert!(outcome.is_exact());
        let lane = |i: usize| u16::from_ne_bytes([dst[i * 2], dst[i * 2 + 1]]);
        assert_eq!(lane(0), 65535);
        assert_eq!(lane(1), 0);
        assert_eq!(lane(2), 128 * 257);
        assert_eq!(lane(3), 64 * 257);
        // floats passed through, nothing built
        assert!(rgba.transform_cache().is_empty());
    }

    #[test]
    fn test_rgb_to_gray_uses_cache() {
        let ctx = ModelContext::standalone();
        let rgba = models::rgba8(&ctx).unwrap();
        let graya = models::graya8(&ctx).unwrap();
        let src = [255u8, 255, 255, 200, 0, 0, 0, 255];
        let mut dst = [0u8; 4];
        let outcome = rgba
            .convert_pixels_to(&src, None, &mut dst, &graya, None, 2, Intent::Perceptual)
            .unwrap();
        assert!(outcome.is_exact());
        assert!(dst[0] >= 253);
        assert_eq!(dst[1], 200);
        assert!(dst[2] <= 2);
        assert_eq!(dst[3], 255);
        assert_eq!(rgba.transform_cache().len(), 1);
    }

    #[test]
    fn test_unmanaged_source_falls_back() {
        let ctx = ModelContext::standalone();
        let mask = models::alpha8(&ctx).unwrap();
        let rgba = models::rgba8(&ctx).unwrap();
        let mut dst = [0u8; 8];
        let outcome = mask
            .convert_pixels_to(&[0, 128], None, &mut dst, &rgba, None, 2, Intent::Perceptual)
            .unwrap();
        assert_eq!(outcome.degradation(), Some(&Degradation::UncalibratedFallback));
        assert_eq!(dst, [255, 255, 255, 0, 255, 255, 255, 128]);
    }

    #[test]
    fn test_short_buffers_rejected() {
        let ctx = ModelContext::standalone();
        let rgba = models::rgba8(&ctx).unwrap();
        let graya = models::graya8(&ctx).unwrap();
        let mut dst = [0u8; 3];
        assert!(rgba
            .convert_pixels_to(&[0; 8], None, &mut dst, &graya, None, 2, Intent::Perceptual)
            .is_err());
        let mut empty: [u8; 0] = [];
        assert!(rgba
            .convert_pixels_to(&[], None, &mut empty, &graya, None, 0, Intent::Perceptual)
            .unwrap()
            .is_exact());
    }

    #[test]
    fn test_explicit_profile_overrides_default() {
        let ctx = ModelContext::standalone();
        let graya = models::graya8(&ctx).unwrap();
        let linear = Arc::new(Profile::gray(1.0).unwrap());
        let mut dst = [0u8; 2];
        graya
            .convert_pixels_to(&[128, 255], None, &mut dst, &graya, Some(&linear), 1, Intent::Perceptual)
            .unwrap();
        // gamma 2.2 mid gray is darker in linear light
        let expected = (128.0f32 / 255.0).powf(2.2) * 255.0;
        assert_abs_diff_eq!(f32::from(dst[0]), expected, epsilon = 3.0);
        assert_eq!(dst[1], 255);
    }

    #[test]
    fn test_unusable_explicit_profile_counts_as_absent() {
        let ctx = ModelContext::standalone();
        let rgba = models::rgba8(&ctx).unwrap();
        let graya = models::graya8(&ctx).unwrap();
        let src = [128u8, 128, 128, 255];

        let mut expected = [0u8; 2];
        let outcome = rgba
            .convert_pixels_to(&src, None, &mut expected, &graya, None, 1, Intent::Perceptual)
            .unwrap();
        assert!(outcome.is_exact());

        let broken = Arc::new(Profile::placeholder("Broken", ProfileSignature::Gray));
        let srgb = Arc::new(Profile::srgb());
        for explicit in [&broken, &srgb] {
            let mut dst = [0u8; 2];
            let outcome = rgba
                .convert_pixels_to(&src, None, &mut dst, &graya, Some(explicit), 1, Intent::Perceptual)
                .unwrap();
            assert!(outcome.is_exact(), "{}", explicit.name());
            assert_eq!(dst, expected, "{}", explicit.name());
        }
        // only the default gray pairing was ever built
        assert_eq!(rgba.transform_cache().len(), 1);
    }

    #[test]
    fn test_bulk_floats_come_from_scratch() {
        let ctx = ModelContext::standalone();
        let rgba = models::rgba8(&ctx).unwrap();
        let graya = models::graya8(&ctx).unwrap();
        let src = [40u8; 4 * 16];
        let mut dst = [0u8; 2 * 16];
        for _ in 0..3 {
            rgba.convert_pixels_to(&src, None, &mut dst, &graya, None, 16, Intent::Perceptual)
                .unwrap();
        }
        // three source floats and one gray float per pixel
        assert_eq!(rgba.scratch().float_capacity(), 16 * 4);
        assert_eq!(graya.scratch().float_capacity(), 0);
    }
}
