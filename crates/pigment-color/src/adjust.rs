//! Shared pixel algorithms.
//!
//! These run on any [`ColorSpace`] by decoding to [`NormalizedColor`] at
//! 8-bit precision, working there, and encoding back. Models only supply
//! the decode/encode primitives.

use pigment_core::{
    rgb_to_hsv, ChannelType, ConvolveChannels, Degradation, Error, Lane, NormalizedColor, Outcome,
};

use crate::{ColorResult, ColorSpace};

pub(crate) fn set_alpha<S: ColorSpace + ?Sized>(
    space: &S,
    pixels: &mut [u8],
    value: u8,
    count: usize,
) -> ColorResult<Outcome> {
    let layout = space.layout();
    layout.check_pixels("pixels", pixels.len(), count)?;
    if !layout.has_alpha() {
        return Ok(Degradation::NoAlphaChannel.into());
    }
    for px in pixels.chunks_exact_mut(layout.pixel_size()).take(count) {
        layout.set_alpha_u8(px, value);
    }
    Ok(Outcome::Exact)
}

fn scale_alpha<L: Lane>(bytes: &mut [u8], mask: u8) {
    let a = L::read(bytes);
    L::write(bytes, L::mul(a, L::from_u8(mask)));
}

pub(crate) fn apply_mask<S: ColorSpace + ?Sized>(
    space: &S,
    pixels: &mut [u8],
    mask: &[u8],
    count: usize,
    inverse: bool,
) -> ColorResult<Outcome> {
    let layout = space.layout();
    layout.check_pixels("pixels", pixels.len(), count)?;
    if mask.len() < count {
        return Err(Error::buffer_too_small("mask", count, mask.len()).into());
    }
    let Some(slot) = layout.alpha() else {
        return Ok(Degradation::NoAlphaChannel.into());
    };
    for (px, &m) in pixels.chunks_exact_mut(layout.pixel_size()).zip(mask).take(count) {
        let m = if inverse { u8::MAX - m } else { m };
        let bytes = slot.bytes_mut(px);
        match slot.value_type {
            ChannelType::U8 => scale_alpha::<u8>(bytes, m),
            ChannelType::U16 => scale_alpha::<u16>(bytes, m),
            float @ (ChannelType::F16 | ChannelType::F32) => {
                let a = float.read_unit(bytes);
                float.write_unit(bytes, a * f32::from(m) / 255.0);
            }
        }
    }
    Ok(Outcome::Exact)
}

fn decode<S: ColorSpace + ?Sized>(space: &S, pixel: &[u8]) -> ColorResult<NormalizedColor> {
    let mut color = NormalizedColor::default();
    space.to_normalized(pixel, None, &mut color)?;
    Ok(color)
}

pub(crate) fn difference<S: ColorSpace + ?Sized>(space: &S, a: &[u8], b: &[u8]) -> ColorResult<u8> {
    let layout = space.layout();
    layout.check_pixels("first pixel", a.len(), 1)?;
    layout.check_pixels("second pixel", b.len(), 1)?;

    let (alpha_a, alpha_b) = (space.alpha(a), space.alpha(b));
    if alpha_a == Some(0) || alpha_b == Some(0) {
        return Ok(if alpha_a == alpha_b { 0 } else { u8::MAX });
    }

    let ha = rgb_to_hsv(decode(space, a)?.rgb());
    let hb = rgb_to_hsv(decode(space, b)?.rgb());

    // hue distance is the shorter arc, 180 degrees mapping to 255
    let hue = match (ha.hue, hb.hue) {
        (Some(x), Some(y)) => {
            let d = (x - y).abs();
            d.min(360.0 - d) * 255.0 / 180.0
        }
        _ => 0.0,
    };
    let sat = (ha.saturation - hb.saturation).abs() * 255.0;
    let val = (ha.value - hb.value).abs() * 255.0;
    Ok(hue.max(sat).max(val).round().min(255.0) as u8)
}

pub(crate) fn mix_colors<S: ColorSpace + ?Sized>(
    space: &S,
    pixels: &[&[u8]],
    weights: &[u8],
    dst: &mut [u8],
) -> ColorResult<Outcome> {
    if pixels.len() != weights.len() {
        return Err(Error::length_mismatch("mix weights", pixels.len(), weights.len()).into());
    }
    let sum: u32 = weights.iter().map(|&w| u32::from(w)).sum();
    if sum > u8::MAX as u32 {
        return Err(Error::InvalidWeights { sum, limit: u8::MAX as u32 }.into());
    }
    let layout = space.layout();
    layout.check_pixels("destination", dst.len(), 1)?;

    let mut totals = [0u32; 3];
    let mut alpha = 0u32;
    for (px, &w) in pixels.iter().zip(weights) {
        layout.check_pixels("mix source", px.len(), 1)?;
        let color = decode(space, px)?;
        let aw = u8::mul(u32::from(color.opacity8()), u32::from(w));
        for (t, c) in totals.iter_mut().zip(color.rgb8()) {
            *t += u32::from(c) * aw;
        }
        alpha += aw;
    }

    let rgb = if alpha == 0 {
        [0u8; 3]
    } else {
        totals.map(|t| ((t + alpha / 2) / alpha).min(255) as u8)
    };
    let mixed = NormalizedColor::from_rgb8(rgb, alpha.min(255) as u8);
    space.from_normalized(&mixed, None, dst)
}

pub(crate) fn convolve_colors<S: ColorSpace + ?Sized>(
    space: &S,
    pixels: &[&[u8]],
    kernel: &[i32],
    channels: ConvolveChannels,
    dst: &mut [u8],
    factor: i32,
    offset: i32,
) -> ColorResult<Outcome> {
    if pixels.len() != kernel.len() {
        return Err(Error::length_mismatch("convolution kernel", pixels.len(), kernel.len()).into());
    }
    if factor == 0 {
        return Err(Error::invalid_argument("convolution factor is zero").into());
    }
    let layout = space.layout();
    layout.check_pixels("destination", dst.len(), 1)?;

    let mut sums = [0i64; 4];
    for (px, &k) in pixels.iter().zip(kernel) {
        layout.check_pixels("convolution source", px.len(), 1)?;
        let color = decode(space, px)?;
        let [r, g, b] = color.rgb8();
        for (s, v) in sums.iter_mut().zip([r, g, b, color.opacity8()]) {
            *s += i64::from(k) * i64::from(v);
        }
    }
    let [r, g, b, a] = sums.map(|s| (s / i64::from(factor) + i64::from(offset)).clamp(0, 255) as u8);

    let mut outcome = Outcome::Exact;
    if channels.color() {
        let slot = layout.alpha();
        let saved = slot.map(|s| {
            let mut bytes = [0u8; 4];
            bytes[..s.size()].copy_from_slice(s.bytes(dst));
            bytes
        });
        let current = decode(space, dst)?;
        let mut color = NormalizedColor::from_rgb8([r, g, b], 0);
        color.opacity = current.opacity;
        outcome = space.from_normalized(&color, None, dst)?;
        if let (Some(s), Some(bytes)) = (slot, saved) {
            s.bytes_mut(dst).copy_from_slice(&bytes[..s.size()]);
        }
    }
    if channels.alpha() && !layout.set_alpha_u8(dst, a) {
        outcome = outcome.merge(Degradation::NoAlphaChannel.into());
    }
    Ok(outcome)
}

/// Decodes each source pixel, lets `f` edit it, and encodes into `dst`.
///
/// `dst` starts as a copy of `src`, so channels the encoder does not write
/// (substance) are carried over.
fn map_pixels<S, F>(space: &S, src: &[u8], dst: &mut [u8], count: usize, mut f: F) -> ColorResult<Outcome>
where
    S: ColorSpace + ?Sized,
    F: FnMut(&mut NormalizedColor),
{
    let layout = space.layout();
    layout.check_pixels("source", src.len(), count)?;
    layout.check_pixels("destination", dst.len(), count)?;
    let ps = layout.pixel_size();
    let mut outcome = Outcome::Exact;
    for (s, d) in src.chunks_exact(ps).zip(dst.chunks_exact_mut(ps)).take(count) {
        let mut color = NormalizedColor::default();
        outcome = outcome.merge(space.to_normalized(s, None, &mut color)?);
        f(&mut color);
        d.copy_from_slice(s);
        outcome = outcome.merge(space.from_normalized(&color, None, d)?);
    }
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn darken<S: ColorSpace + ?Sized>(
    space: &S,
    src: &[u8],
    dst: &mut [u8],
    shade: i32,
    compensate: bool,
    compensation: f64,
    count: usize,
) -> ColorResult<Outcome> {
    if compensate && !(compensation.is_finite() && compensation > 0.0) {
        return Err(Error::invalid_argument(format!("compensation factor {compensation}")).into());
    }
    let divisor = if compensate { compensation * 255.0 } else { 255.0 };
    map_pixels(space, src, dst, count, |color| {
        let rgb = color.rgb8().map(|c| {
            let v = f64::from(c) * f64::from(shade) / divisor;
            v.clamp(0.0, 255.0) as u8
        });
        color.set_rgb(NormalizedColor::from_rgb8(rgb, 0).rgb());
    })
}

pub(crate) fn intensity<S: ColorSpace + ?Sized>(space: &S, pixel: &[u8]) -> ColorResult<u8> {
    space.layout().check_pixels("pixel", pixel.len(), 1)?;
    let [r, g, b] = decode(space, pixel)?.rgb8().map(f32::from);
    Ok((0.30 * r + 0.59 * g + 0.11 * b).round().clamp(0.0, 255.0) as u8)
}

pub(crate) fn brightness_contrast<S: ColorSpace + ?Sized>(
    space: &S,
    src: &[u8],
    dst: &mut [u8],
    brightness: i32,
    contrast: i32,
    count: usize,
) -> ColorResult<Outcome> {
    let brightness = brightness.clamp(-100, 100) as f32;
    let contrast = contrast.clamp(-100, 100) as f32;
    let factor = ((100.0 + contrast) / 100.0).powi(2);
    map_pixels(space, src, dst, count, |color| {
        let rgb = color.rgb8().map(|v| {
            let v = ((f32::from(v) + brightness) - 127.5) * factor + 127.5;
            v.round().clamp(0.0, 255.0) as u8
        });
        color.set_rgb(NormalizedColor::from_rgb8(rgb, 0).rgb());
    })
}

pub(crate) fn invert_color<S: ColorSpace + ?Sized>(
    space: &S,
    pixels: &mut [u8],
    count: usize,
) -> ColorResult<Outcome> {
    let layout = space.layout();
    layout.check_pixels("pixels", pixels.len(), count)?;
    let mut outcome = Outcome::Exact;
    for px in pixels.chunks_exact_mut(layout.pixel_size()).take(count) {
        let mut color = NormalizedColor::default();
        outcome = outcome.merge(space.to_normalized(px, None, &mut color)?);
        let inverted = color.rgb8().map(|c| u8::MAX - c);
        color.set_rgb(NormalizedColor::from_rgb8(inverted, 0).rgb());
        outcome = outcome.merge(space.from_normalized(&color, None, px)?);
    }
    Ok(outcome)
}

pub(crate) fn normalized_channel_values<S: ColorSpace + ?Sized>(
    space: &S,
    pixel: &[u8],
) -> ColorResult<Vec<f32>> {
    space.layout().check_pixels("pixel", pixel.len(), 1)?;
    Ok(space
        .channels()
        .iter()
        .map(|ch| ch.unit_value(pixel).unwrap_or(0.0))
        .collect())
}

pub(crate) fn channel_value_text<S: ColorSpace + ?Sized>(
    space: &S,
    pixel: &[u8],
    index: usize,
) -> ColorResult<String> {
    space.layout().check_pixels("pixel", pixel.len(), 1)?;
    let ch = space.channels().get(index).ok_or_else(|| {
        Error::invalid_argument(format!("channel {index} of {}", space.channel_count()))
    })?;
    // integers print their raw value, floats the stored float
    Ok(match ch.raw_value(pixel) {
        Some(raw) => raw.to_string(),
        None => ch.unit_value(pixel).unwrap_or(0.0).to_string(),
    })
}
