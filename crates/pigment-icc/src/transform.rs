//! Color transforms between ICC profiles.

use crate::{IccError, IccResult, Intent, Profile, ProfileFormat};
use lcms2::{Flags, Profile as LcmsProfile, Transform as LcmsTransform};
use std::sync::{Mutex, PoisonError};

/// Float engine behind a [`Transform`], erased over its channel counts.
trait FloatEngine: Send {
    fn run(&self, src: &[f32], dst: &mut [f32]) -> IccResult<()>;
}

struct Engine<const N: usize, const M: usize> {
    inner: LcmsTransform<[f32; N], [f32; M]>,
}

impl<const N: usize, const M: usize> FloatEngine for Engine<N, M> {
    fn run(&self, src: &[f32], dst: &mut [f32]) -> IccResult<()> {
        let src: &[[f32; N]] =
            bytemuck::try_cast_slice(src).map_err(|e| IccError::TransformFailed(e.to_string()))?;
        let dst: &mut [[f32; M]] =
            bytemuck::try_cast_slice_mut(dst).map_err(|e| IccError::TransformFailed(e.to_string()))?;
        self.inner.transform_pixels(src, dst);
        Ok(())
    }
}

fn build<const N: usize, const M: usize>(
    source: &LcmsProfile,
    source_format: ProfileFormat,
    dest: &LcmsProfile,
    dest_format: ProfileFormat,
    intent: Intent,
    black_point_compensation: bool,
) -> IccResult<Box<dyn FloatEngine>> {
    let inner = if black_point_compensation {
        LcmsTransform::new_flags(
            source,
            source_format.lcms(),
            dest,
            dest_format.lcms(),
            intent.into(),
            Flags::BLACKPOINT_COMPENSATION,
        )
    } else {
        LcmsTransform::new(source, source_format.lcms(), dest, dest_format.lcms(), intent.into())
    }
    .map_err(|e| IccError::TransformFailed(e.to_string()))?;
    Ok(Box::new(Engine::<N, M> { inner }))
}

/// A color transform between two ICC profiles.
///
/// Converts float buffers from the source profile's device values to the
/// destination's (see [`ProfileFormat`] for value ranges). Only color
/// channels pass through; alpha is the caller's business.
///
/// # Example
///
/// ```rust
/// use pigment_icc::{Intent, Profile, ProfileFormat, Transform};
///
/// let srgb = Profile::srgb();
/// let gray = Profile::gray(1.0).unwrap();
/// let t = Transform::new(&srgb, ProfileFormat::Rgb, &gray, ProfileFormat::Gray, Intent::Perceptual, false).unwrap();
///
/// let mut out = [0.0f32; 2];
/// t.apply(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0], &mut out).unwrap();
/// assert!(out[0] < 0.01 && out[1] > 0.99);
/// ```
pub struct Transform {
    engine: Mutex<Box<dyn FloatEngine>>,
    source_format: ProfileFormat,
    dest_format: ProfileFormat,
    intent: Intent,
}

impl Transform {
    /// Builds a transform between two profiles.
    ///
    /// # Errors
    ///
    /// Fails if either profile is invalid, or the engine rejects the pair
    /// (for example a format that does not match the profile's signature).
    pub fn new(
        source: &Profile,
        source_format: ProfileFormat,
        dest: &Profile,
        dest_format: ProfileFormat,
        intent: Intent,
        black_point_compensation: bool,
    ) -> IccResult<Self> {
        use ProfileFormat::{Cmyk, Gray, Rgb};

        if source.signature().format() != Some(source_format) {
            return Err(IccError::TransformFailed(format!(
                "source profile '{}' is {}, not {:?}",
                source.name(),
                source.signature(),
                source_format
            )));
        }
        if dest.signature().format() != Some(dest_format) {
            return Err(IccError::TransformFailed(format!(
                "destination profile '{}' is {}, not {:?}",
                dest.name(),
                dest.signature(),
                dest_format
            )));
        }

        let s = source.open()?;
        let d = dest.open()?;
        let bpc = black_point_compensation;
        let engine = match (source_format, dest_format) {
            (Gray, Gray) => build::<1, 1>(&s, Gray, &d, Gray, intent, bpc)?,
            (Gray, Rgb) => build::<1, 3>(&s, Gray, &d, Rgb, intent, bpc)?,
            (Gray, Cmyk) => build::<1, 4>(&s, Gray, &d, Cmyk, intent, bpc)?,
            (Rgb, Gray) => build::<3, 1>(&s, Rgb, &d, Gray, intent, bpc)?,
            (Rgb, Rgb) => build::<3, 3>(&s, Rgb, &d, Rgb, intent, bpc)?,
            (Rgb, Cmyk) => build::<3, 4>(&s, Rgb, &d, Cmyk, intent, bpc)?,
            (Cmyk, Gray) => build::<4, 1>(&s, Cmyk, &d, Gray, intent, bpc)?,
            (Cmyk, Rgb) => build::<4, 3>(&s, Cmyk, &d, Rgb, intent, bpc)?,
            (Cmyk, Cmyk) => build::<4, 4>(&s, Cmyk, &d, Cmyk, intent, bpc)?,
        };

        Ok(Self {
            engine: Mutex::new(engine),
            source_format,
            dest_format,
            intent,
        })
    }

    /// Transforms `src` into `dst` in one bulk call.
    ///
    /// `src` holds `n * source_format.channels()` floats and `dst` exactly
    /// `n * dest_format.channels()`. Returns `n`.
    pub fn apply(&self, src: &[f32], dst: &mut [f32]) -> IccResult<usize> {
        let sc = self.source_format.channels();
        let dc = self.dest_format.channels();
        if src.len() % sc != 0 {
            return Err(IccError::BufferMismatch {
                expected: src.len() / sc * sc,
                got: src.len(),
            });
        }
        let count = src.len() / sc;
        if dst.len() != count * dc {
            return Err(IccError::BufferMismatch {
                expected: count * dc,
                got: dst.len(),
            });
        }
        if count == 0 {
            return Ok(0);
        }
        let engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        engine.run(src, dst)?;
        Ok(count)
    }

    /// Source float format.
    pub fn source_format(&self) -> ProfileFormat {
        self.source_format
    }

    /// Destination float format.
    pub fn dest_format(&self) -> ProfileFormat {
        self.dest_format
    }

    /// Rendering intent the transform was built with.
    pub fn intent(&self) -> Intent {
        self.intent
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("source_format", &self.source_format)
            .field("dest_format", &self.dest_format)
            .field("intent", &self.intent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identity() {
        let srgb = Profile::srgb();
        let t = Transform::new(&srgb, ProfileFormat::Rgb, &srgb, ProfileFormat::Rgb, Intent::Perceptual, false)
            .unwrap();

        let src = [0.5f32, 0.3, 0.2];
        let mut dst = [0.0f32; 3];
        assert_eq!(t.apply(&src, &mut dst).unwrap(), 1);
        for i in 0..3 {
            assert_abs_diff_eq!(dst[i], src[i], epsilon = 0.01);
        }
    }

    #[test]
    fn test_rgb_to_gray_neutral() {
        let srgb = Profile::srgb();
        let gray = Profile::gray(2.2).unwrap();
        let t = Transform::new(&srgb, ProfileFormat::Rgb, &gray, ProfileFormat::Gray, Intent::Perceptual, true)
            .unwrap();
        let mut out = [0.0f32; 2];
        t.apply(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0], &mut out).unwrap();
        assert!(out[0] < 0.01);
        assert!(out[1] > 0.99);
    }

    #[test]
    fn test_format_mismatch_rejected() {
        let srgb = Profile::srgb();
        let err = Transform::new(&srgb, ProfileFormat::Cmyk, &srgb, ProfileFormat::Rgb, Intent::Perceptual, false);
        assert!(err.is_err());
    }

    #[test]
    fn test_buffer_mismatch() {
        let srgb = Profile::srgb();
        let t = Transform::new(&srgb, ProfileFormat::Rgb, &srgb, ProfileFormat::Rgb, Intent::Perceptual, false)
            .unwrap();
        let mut dst = [0.0f32; 3];
        assert!(matches!(t.apply(&[0.1, 0.2], &mut dst), Err(IccError::BufferMismatch { .. })));
        let mut short = [0.0f32; 2];
        assert!(t.apply(&[0.1, 0.2, 0.3], &mut short).is_err());
    }
}
