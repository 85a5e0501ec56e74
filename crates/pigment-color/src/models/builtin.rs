//! Built-in model constructors.

use std::sync::Arc;

use half::f16;
use pigment_core::{ChannelInfo, ChannelKind, CompositeOp};
use pigment_icc::{Intent, Profile};
use tracing::warn;

use super::pixel::{Encoding, PixelModel};
use super::sample::Sample;
use crate::{ColorResult, ColorSpace};

/// Profiles and settings shared by the built-in models.
#[derive(Debug, Clone)]
pub struct ModelContext {
    /// sRGB profile normalized colors are referred to.
    pub reference: Arc<Profile>,
    /// Default RGB profile.
    pub rgb: Option<Arc<Profile>>,
    /// Default gray profile.
    pub gray: Option<Arc<Profile>>,
    /// Default CMYK profile.
    pub cmyk: Option<Arc<Profile>>,
    /// Intent for single-pixel decode and encode.
    pub intent: Intent,
    /// Black-point compensation for built transforms.
    pub black_point_compensation: bool,
}

impl ModelContext {
    /// Context built from in-memory profiles only: sRGB and gamma-2.2 gray,
    /// no CMYK.
    pub fn standalone() -> Self {
        let reference = Arc::new(Profile::srgb());
        let gray = match Profile::gray(2.2) {
            Ok(p) => Some(Arc::new(p)),
            Err(e) => {
                warn!(error = %e, "built-in gray profile unavailable");
                None
            }
        };
        Self {
            rgb: Some(Arc::clone(&reference)),
            reference,
            gray,
            cmyk: None,
            intent: Intent::Perceptual,
            black_point_compensation: false,
        }
    }

    fn configure<S: Sample>(&self, model: PixelModel<S>, profile: Option<&Arc<Profile>>) -> PixelModel<S> {
        model
            .with_reference_profile(Arc::clone(&self.reference))
            .with_default_profile(profile.cloned())
            .with_intent(self.intent)
            .with_black_point_compensation(self.black_point_compensation)
    }
}

/// Channels laid out back to back, each of type `S`.
fn packed<S: Sample>(channels: &[(&str, ChannelKind)]) -> Vec<ChannelInfo> {
    let size = S::TYPE.size();
    channels
        .iter()
        .enumerate()
        .map(|(i, &(name, kind))| ChannelInfo::typed(name, kind, i * size, S::TYPE))
        .collect()
}

const RGBA: [(&str, ChannelKind); 4] = [
    ("Red", ChannelKind::Color),
    ("Green", ChannelKind::Color),
    ("Blue", ChannelKind::Color),
    ("Alpha", ChannelKind::Alpha),
];

const GRAYA: [(&str, ChannelKind); 2] = [("Gray", ChannelKind::Color), ("Alpha", ChannelKind::Alpha)];

const CMYKA: [(&str, ChannelKind); 5] = [
    ("Cyan", ChannelKind::Color),
    ("Magenta", ChannelKind::Color),
    ("Yellow", ChannelKind::Color),
    ("Black", ChannelKind::Color),
    ("Alpha", ChannelKind::Alpha),
];

fn rgba<S: Sample>(ctx: &ModelContext, id: &str, name: &str) -> ColorResult<PixelModel<S>> {
    let model = PixelModel::new(id, name, Encoding::Rgb, packed::<S>(&RGBA))?;
    Ok(ctx.configure(model, ctx.rgb.as_ref()))
}

fn graya<S: Sample>(ctx: &ModelContext, id: &str, name: &str) -> ColorResult<PixelModel<S>> {
    let model = PixelModel::new(id, name, Encoding::Gray, packed::<S>(&GRAYA))?;
    Ok(ctx.configure(model, ctx.gray.as_ref()))
}

fn cmyka<S: Sample>(ctx: &ModelContext, id: &str, name: &str) -> ColorResult<PixelModel<S>> {
    let model = PixelModel::new(id, name, Encoding::Cmyk, packed::<S>(&CMYKA))?;
    Ok(ctx.configure(model, ctx.cmyk.as_ref()))
}

/// 8-bit RGB with alpha.
pub fn rgba8(ctx: &ModelContext) -> ColorResult<PixelModel<u8>> {
    rgba(ctx, "RGBA", "RGB/Alpha (8-bit)")
}

/// 16-bit RGB with alpha.
pub fn rgba16(ctx: &ModelContext) -> ColorResult<PixelModel<u16>> {
    rgba(ctx, "RGBA16", "RGB/Alpha (16-bit)")
}

/// Half-float RGB with alpha.
pub fn rgbaf16(ctx: &ModelContext) -> ColorResult<PixelModel<f16>> {
    rgba(ctx, "RGBAF16", "RGB/Alpha (16-bit float)")
}

/// 32-bit float RGB with alpha.
///
/// Lanes may hold values outside `[0, 1]`; Over composites carry them.
pub fn rgbaf32(ctx: &ModelContext) -> ColorResult<PixelModel<f32>> {
    rgba(ctx, "RGBAF32", "RGB/Alpha (32-bit float)")
}

/// 8-bit gray without alpha.
pub fn gray8(ctx: &ModelContext) -> ColorResult<PixelModel<u8>> {
    let model = PixelModel::new("GRAY", "Grayscale (8-bit)", Encoding::Gray, packed::<u8>(&GRAYA[..1]))?;
    Ok(ctx.configure(model, ctx.gray.as_ref()))
}

/// 8-bit gray with alpha.
pub fn graya8(ctx: &ModelContext) -> ColorResult<PixelModel<u8>> {
    graya(ctx, "GRAYA", "Grayscale/Alpha (8-bit)")
}

/// 16-bit gray with alpha.
pub fn graya16(ctx: &ModelContext) -> ColorResult<PixelModel<u16>> {
    graya(ctx, "GRAYA16", "Grayscale/Alpha (16-bit)")
}

/// 8-bit CMYK with alpha.
pub fn cmyka8(ctx: &ModelContext) -> ColorResult<PixelModel<u8>> {
    cmyka(ctx, "CMYKA", "CMYK/Alpha (8-bit)")
}

/// 16-bit CMYK with alpha.
pub fn cmyka16(ctx: &ModelContext) -> ColorResult<PixelModel<u16>> {
    cmyka(ctx, "CMYKA16", "CMYK/Alpha (16-bit)")
}

/// Single-lane selection mask.
///
/// Decodes to white with the mask as opacity; encoding stores opacity only.
pub fn alpha8(ctx: &ModelContext) -> ColorResult<PixelModel<u8>> {
    let model = PixelModel::new("ALPHA", "Alpha mask", Encoding::Mask, packed::<u8>(&[("Alpha", ChannelKind::Alpha)]))?;
    Ok(ctx.configure(model, None))
}

/// 8-bit RGBA carrying paint wetness and height.
///
/// Substance lanes follow the source wherever color is blended toward it.
pub fn wet8(ctx: &ModelContext) -> ColorResult<PixelModel<u8>> {
    let mut channels = RGBA.to_vec();
    channels.extend([("Wetness", ChannelKind::Substance), ("Height", ChannelKind::Substance)]);
    let model = PixelModel::new("WET", "Wet paint", Encoding::Rgb, packed::<u8>(&channels))?
        .with_composite_ops([CompositeOp::Over]);
    Ok(ctx.configure(model, ctx.rgb.as_ref()))
}

/// Every built-in model, in registration order.
pub fn builtin_models(ctx: &ModelContext) -> ColorResult<Vec<Arc<dyn ColorSpace>>> {
    let models: Vec<Arc<dyn ColorSpace>> = vec![
        Arc::new(rgba8(ctx)?),
        Arc::new(rgba16(ctx)?),
        Arc::new(rgbaf16(ctx)?),
        Arc::new(rgbaf32(ctx)?),
        Arc::new(gray8(ctx)?),
        Arc::new(graya8(ctx)?),
        Arc::new(graya16(ctx)?),
        Arc::new(cmyka8(ctx)?),
        Arc::new(cmyka16(ctx)?),
        Arc::new(alpha8(ctx)?),
        Arc::new(wet8(ctx)?),
    ];
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts() {
        let ctx = ModelContext::standalone();
        let sizes: Vec<(String, usize)> = builtin_models(&ctx)
            .unwrap()
            .iter()
            .map(|m| (m.id().to_string(), m.pixel_size()))
            .collect();
        let expected = [
            ("RGBA", 4),
            ("RGBA16", 8),
            ("RGBAF16", 8),
            ("RGBAF32", 16),
            ("GRAY", 1),
            ("GRAYA", 2),
            ("GRAYA16", 4),
            ("CMYKA", 5),
            ("CMYKA16", 10),
            ("ALPHA", 1),
            ("WET", 6),
        ];
        for ((id, size), (eid, esize)) in sizes.iter().zip(expected) {
            assert_eq!(id, eid);
            assert_eq!(*size, esize, "{id}");
        }
        assert_eq!(sizes.len(), expected.len());
    }

    #[test]
    fn test_shared_reference() {
        let ctx = ModelContext::standalone();
        let a = rgba8(&ctx).unwrap();
        let b = rgba16(&ctx).unwrap();
        let c = rgbaf32(&ctx).unwrap();
        assert!(Arc::ptr_eq(a.reference_profile(), b.reference_profile()));
        assert!(Arc::ptr_eq(a.reference_profile(), c.reference_profile()));
        assert!(Arc::ptr_eq(a.default_profile().unwrap(), &ctx.reference));
    }

    #[test]
    fn test_validity() {
        let ctx = ModelContext::standalone();
        assert!(rgba8(&ctx).unwrap().is_valid());
        assert!(graya16(&ctx).unwrap().is_valid());
        assert!(alpha8(&ctx).unwrap().is_valid());
        assert!(rgbaf16(&ctx).unwrap().is_valid());
        // no CMYK profile ships in memory
        assert!(!cmyka8(&ctx).unwrap().is_valid());
    }

    #[test]
    fn test_wet_substance() {
        let wet = wet8(&ModelContext::standalone()).unwrap();
        assert_eq!(wet.substance_channel_count(), 2);
        assert_eq!(wet.user_visible_composite_ops(), &[CompositeOp::Over]);
    }

    #[test]
    fn test_float_channels_are_typed() {
        let ctx = ModelContext::standalone();
        let f = rgbaf16(&ctx).unwrap();
        assert!(f.channels().iter().all(|c| c.value_type() == Some(pigment_core::ChannelType::F16)));
        assert_eq!(f.channels()[3].offset(), 6);
        assert!(f.supports_composite_op(CompositeOp::Diff));
    }
}
