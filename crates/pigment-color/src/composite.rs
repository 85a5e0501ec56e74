//! Compositing engine.
//!
//! [`bit_blt`](crate::ColorSpace::bit_blt) validates the regions, brings a
//! foreign source into the destination space through the scratch arena and
//! hands same-space work to the model's compositor. Integer models share
//! [`composite`], which blends in native lane units; float models share
//! [`composite_float`], which runs the same math in unit floats.
//!
//! All operators except Copy and Clear use the same alpha envelope:
//!
//! ```text
//! eff   = mul(mul(srcA, mask), opacity)
//! dstA == MAX:  blend = eff
//! otherwise:    newA = dstA + mul(MAX - dstA, eff); blend = div(eff, newA)
//! color         = blend(op(src, dst), dst, blend)
//! ```

use std::sync::Arc;

use pigment_core::{
    check_region, hsl_to_rgb, hsv_to_rgb, rgb_to_hsl, rgb_to_hsv, CompositeOp, Degradation, FloatLane, Hsl,
    Hsv, Lane, Outcome,
};
use pigment_icc::{Intent, Profile};
use tracing::trace;

use crate::{convert, ColorResult, ColorSpace};

/// An 8-bit mask region, one byte per pixel.
#[derive(Debug, Clone, Copy)]
pub struct Mask<'a> {
    /// Mask bytes.
    pub bytes: &'a [u8],
    /// Bytes between row starts.
    pub stride: usize,
}

impl<'a> Mask<'a> {
    /// Creates a mask region.
    pub fn new(bytes: &'a [u8], stride: usize) -> Self {
        Self { bytes, stride }
    }
}

/// A validated same-space compositing job.
#[derive(Debug)]
pub struct CompositeArgs<'a> {
    /// Destination bytes.
    pub dst: &'a mut [u8],
    /// Destination row stride.
    pub dst_stride: usize,
    /// Source bytes, already in the destination space.
    pub src: &'a [u8],
    /// Source row stride.
    pub src_stride: usize,
    /// Optional per-pixel mask.
    pub mask: Option<Mask<'a>>,
    /// Global opacity.
    pub opacity: u8,
    /// Rows to process.
    pub rows: usize,
    /// Pixels per row.
    pub cols: usize,
}

/// Source region for [`ColorSpace::bit_blt`].
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    /// Space the source pixels are in.
    pub space: &'a dyn ColorSpace,
    /// Source bytes.
    pub bytes: &'a [u8],
    /// Bytes between row starts.
    pub stride: usize,
    /// Source profile; `None` means the space default.
    pub profile: Option<&'a Arc<Profile>>,
}

impl<'a> Source<'a> {
    /// Creates a source region using the space's default profile.
    pub fn new(space: &'a dyn ColorSpace, bytes: &'a [u8], stride: usize) -> Self {
        Self {
            space,
            bytes,
            stride,
            profile: None,
        }
    }

    /// Uses `profile` instead of the space default.
    pub fn with_profile(mut self, profile: &'a Arc<Profile>) -> Self {
        self.profile = Some(profile);
        self
    }
}

/// Operator and region for [`ColorSpace::bit_blt`].
///
/// # Example
///
/// ```rust
/// use pigment_color::{BlitOptions, CompositeOp};
///
/// let opts = BlitOptions::new(CompositeOp::Multiply, 16, 16).opacity(128);
/// assert_eq!(opts.opacity, 128);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BlitOptions<'a> {
    /// Operator.
    pub op: CompositeOp,
    /// Rows to process.
    pub rows: usize,
    /// Pixels per row.
    pub cols: usize,
    /// Global opacity, 255 by default.
    pub opacity: u8,
    /// Optional per-pixel mask.
    pub mask: Option<Mask<'a>>,
    /// Destination profile used when converting a foreign source.
    pub dst_profile: Option<&'a Arc<Profile>>,
    /// Intent used when converting a foreign source.
    pub intent: Intent,
}

impl<'a> BlitOptions<'a> {
    /// Fully opaque, unmasked blit of `rows` x `cols` pixels.
    pub fn new(op: CompositeOp, rows: usize, cols: usize) -> Self {
        Self {
            op,
            rows,
            cols,
            opacity: u8::MAX,
            mask: None,
            dst_profile: None,
            intent: Intent::default(),
        }
    }

    /// Sets global opacity.
    pub fn opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    /// Sets the mask.
    pub fn mask(mut self, mask: Mask<'a>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Sets the destination profile.
    pub fn dst_profile(mut self, profile: &'a Arc<Profile>) -> Self {
        self.dst_profile = Some(profile);
        self
    }

    /// Sets the conversion intent.
    pub fn intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }
}

pub(crate) fn bit_blt<D: ColorSpace + ?Sized>(
    space: &D,
    dst: &mut [u8],
    dst_stride: usize,
    src: Source<'_>,
    opts: &BlitOptions<'_>,
) -> ColorResult<Outcome> {
    let BlitOptions {
        op,
        rows,
        cols,
        opacity,
        mask,
        dst_profile,
        intent,
    } = *opts;
    if rows == 0 || cols == 0 {
        return Ok(Outcome::Exact);
    }

    space.layout().check_region("destination", dst.len(), dst_stride, rows, cols)?;
    src.space
        .layout()
        .check_region("source", src.bytes.len(), src.stride, rows, cols)?;
    if let Some(m) = mask {
        check_region("mask", m.bytes.len(), m.stride, rows, cols)?;
    }

    if !space.supports_composite_op(op) {
        trace!(space = space.id(), %op, "composite op not supported");
        return Ok(Degradation::UnsupportedOperator(op).into());
    }

    if src.space.id() != space.id() {
        let row_bytes = cols * space.pixel_size();
        let src_row_bytes = cols * src.space.pixel_size();
        let mut scratch = space.scratch().acquire(rows * row_bytes);
        let mut outcome = Outcome::Exact;
        for (r, out) in scratch.chunks_exact_mut(row_bytes).enumerate() {
            let row = &src.bytes[r * src.stride..r * src.stride + src_row_bytes];
            let converted =
                convert::convert_pixels(src.space, row, src.profile, out, space, dst_profile, cols, intent)?;
            outcome = outcome.merge(converted);
        }
        let args = CompositeArgs {
            dst,
            dst_stride,
            src: &scratch,
            src_stride: row_bytes,
            mask,
            opacity,
            rows,
            cols,
        };
        return Ok(outcome.merge(space.composite(op, args)));
    }

    Ok(space.composite(
        op,
        CompositeArgs {
            dst,
            dst_stride,
            src: src.bytes,
            src_stride: src.stride,
            mask,
            opacity,
            rows,
            cols,
        },
    ))
}

/// Most color lanes any built-in model carries.
pub const MAX_COLOR_LANES: usize = 4;

/// Byte offsets of the lanes a compositor touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneMap {
    /// Bytes per pixel.
    pub pixel_size: usize,
    /// Color lane offsets, in layout order.
    pub color: Vec<usize>,
    /// Substance lane offsets.
    pub substance: Vec<usize>,
    /// Alpha lane offset.
    pub alpha: Option<usize>,
    /// Indices into `color` of red, green and blue, for hue-based operators.
    pub rgb: Option<[usize; 3]>,
}

#[inline]
fn alpha_of<L: Lane>(lanes: &LaneMap, px: &[u8]) -> u32 {
    lanes.alpha.map_or(L::MAX, |o| L::read(&px[o..]))
}

/// Handles the operators that do not depend on the lane type.
///
/// Returns `None` when the caller has to composite pixel by pixel.
fn lane_independent(lanes: &LaneMap, op: CompositeOp, args: &mut CompositeArgs<'_>) -> Option<Outcome> {
    let row_bytes = args.cols * lanes.pixel_size;
    match op {
        CompositeOp::Copy => {
            for r in 0..args.rows {
                args.dst[r * args.dst_stride..][..row_bytes]
                    .copy_from_slice(&args.src[r * args.src_stride..][..row_bytes]);
            }
            Some(Outcome::Exact)
        }
        CompositeOp::Clear => {
            for r in 0..args.rows {
                args.dst[r * args.dst_stride..][..row_bytes].fill(0);
            }
            Some(Outcome::Exact)
        }
        _ if op.needs_rgb() && lanes.rgb.is_none() => Some(Degradation::UnsupportedOperator(op).into()),
        _ => None,
    }
}

/// Composites a validated region in lane units of width `L`.
///
/// Hue-based operators on a map without RGB lanes leave `dst` untouched.
pub fn composite<L: Lane>(lanes: &LaneMap, op: CompositeOp, mut args: CompositeArgs<'_>) -> Outcome {
    if let Some(outcome) = lane_independent(lanes, op, &mut args) {
        return outcome;
    }
    let CompositeArgs {
        dst,
        dst_stride,
        src,
        src_stride,
        mask,
        opacity,
        rows,
        cols,
    } = args;
    let ps = lanes.pixel_size;
    let row_bytes = cols * ps;

    let opacity = L::from_u8(opacity);
    for r in 0..rows {
        let drow = &mut dst[r * dst_stride..][..row_bytes];
        let srow = &src[r * src_stride..][..row_bytes];
        let mrow = mask.map(|m| &m.bytes[r * m.stride..][..cols]);
        for (c, (d, s)) in drow.chunks_exact_mut(ps).zip(srow.chunks_exact(ps)).enumerate() {
            let m = mrow.map(|m| L::from_u8(m[c]));
            match op {
                CompositeOp::Over => over::<L>(lanes, s, d, m, opacity),
                CompositeOp::Erase => erase::<L>(lanes, s, d, m),
                _ => blend_op::<L>(lanes, op, s, d, m, opacity),
            }
        }
    }
    Outcome::Exact
}

#[inline]
fn effective_alpha<L: Lane>(src_alpha: u32, mask: Option<u32>, opacity: u32) -> u32 {
    let a = mask.map_or(src_alpha, |m| L::mul(src_alpha, m));
    L::mul(a, opacity)
}

/// Writes the new destination alpha and returns the color blend factor.
#[inline]
fn envelope<L: Lane>(lanes: &LaneMap, d: &mut [u8], eff: u32) -> u32 {
    let Some(o) = lanes.alpha else {
        return eff;
    };
    let dst_alpha = L::read(&d[o..]);
    if dst_alpha == L::MAX {
        return eff;
    }
    let new_alpha = dst_alpha + L::mul(L::MAX - dst_alpha, eff);
    L::write(&mut d[o..], new_alpha);
    if new_alpha == 0 { eff } else { L::div(eff, new_alpha) }
}

#[inline]
fn mix_lane<L: Lane>(d: &mut [u8], offset: usize, value: u32, blend: u32) {
    let v = if blend == L::MAX {
        value
    } else {
        L::blend(value, L::read(&d[offset..]), blend)
    };
    L::write(&mut d[offset..], v);
}

fn over<L: Lane>(lanes: &LaneMap, s: &[u8], d: &mut [u8], mask: Option<u32>, opacity: u32) {
    let eff = effective_alpha::<L>(alpha_of::<L>(lanes, s), mask, opacity);
    if eff == 0 {
        return;
    }
    if eff == L::MAX {
        d.copy_from_slice(s);
        return;
    }
    let blend = envelope::<L>(lanes, d, eff);
    for &o in lanes.color.iter().chain(&lanes.substance) {
        mix_lane::<L>(d, o, L::read(&s[o..]), blend);
    }
}

fn erase<L: Lane>(lanes: &LaneMap, s: &[u8], d: &mut [u8], mask: Option<u32>) {
    let Some(o) = lanes.alpha else {
        return;
    };
    let src_alpha = alpha_of::<L>(lanes, s);
    let eff = mask.map_or(src_alpha, |m| L::blend(src_alpha, L::MAX, m));
    let dst_alpha = L::read(&d[o..]);
    L::write(&mut d[o..], L::mul(eff, dst_alpha));
}

fn blend_op<L: Lane>(lanes: &LaneMap, op: CompositeOp, s: &[u8], d: &mut [u8], mask: Option<u32>, opacity: u32) {
    let eff = effective_alpha::<L>(alpha_of::<L>(lanes, s), mask, opacity);
    if eff == 0 {
        return;
    }

    let mut result = [0u32; MAX_COLOR_LANES];
    match lanes.rgb {
        Some(idx) if op.needs_rgb() => {
            let unit = |px: &[u8]| idx.map(|i| L::to_unit(L::read(&px[lanes.color[i]..])));
            let rgb = hue_op(op, unit(s), unit(d));
            for (&i, v) in idx.iter().zip(rgb) {
                result[i] = L::from_unit(v);
            }
        }
        _ => {
            for (slot, &o) in result.iter_mut().zip(&lanes.color) {
                *slot = channel_op::<L>(op, L::read(&s[o..]), L::read(&d[o..]));
            }
        }
    }

    let blend = envelope::<L>(lanes, d, eff);
    for (&o, &v) in lanes.color.iter().zip(&result) {
        mix_lane::<L>(d, o, v, blend);
    }
    for &o in &lanes.substance {
        mix_lane::<L>(d, o, L::read(&s[o..]), blend);
    }
}

/// Per-channel operator result before alpha blending.
fn channel_op<L: Lane>(op: CompositeOp, s: u32, d: u32) -> u32 {
    let max = u64::from(L::MAX);
    let (s64, d64) = (u64::from(s), u64::from(d));
    let v = match op {
        CompositeOp::Multiply => u64::from(L::mul(s, d)),
        CompositeOp::Screen => max - u64::from(L::mul(L::MAX - s, L::MAX - d)),
        CompositeOp::Overlay => {
            let inner = d + L::mul(2 * s, L::MAX - d);
            u64::from(L::mul(d, inner))
        }
        CompositeOp::Dodge => d64 * (max + 1) / (max + 1 - s64),
        CompositeOp::Burn => max - ((max - d64) * (max + 1) / (s64 + 1)).min(max),
        CompositeOp::Divide => (d64 * (max + 1) + s64 / 2) / (s64 + 1),
        CompositeOp::Darken => s64.min(d64),
        CompositeOp::Lighten => s64.max(d64),
        CompositeOp::Add => s64 + d64,
        CompositeOp::Subtract => d64.saturating_sub(s64),
        CompositeOp::Diff => s64.abs_diff(d64),
        _ => s64,
    };
    v.min(max) as u32
}

/// Composites a validated region of float lanes of type `F`.
///
/// Same envelope as [`composite`] with `MAX` = 1. Over carries values
/// outside the unit range through; other operators clamp their result.
pub fn composite_float<F: FloatLane>(lanes: &LaneMap, op: CompositeOp, mut args: CompositeArgs<'_>) -> Outcome {
    if let Some(outcome) = lane_independent(lanes, op, &mut args) {
        return outcome;
    }
    let CompositeArgs {
        dst,
        dst_stride,
        src,
        src_stride,
        mask,
        opacity,
        rows,
        cols,
    } = args;
    let ps = lanes.pixel_size;
    let row_bytes = cols * ps;

    let opacity = f32::from(opacity) / 255.0;
    for r in 0..rows {
        let drow = &mut dst[r * dst_stride..][..row_bytes];
        let srow = &src[r * src_stride..][..row_bytes];
        let mrow = mask.map(|m| &m.bytes[r * m.stride..][..cols]);
        for (c, (d, s)) in drow.chunks_exact_mut(ps).zip(srow.chunks_exact(ps)).enumerate() {
            let m = mrow.map(|m| f32::from(m[c]) / 255.0);
            match op {
                CompositeOp::Over => over_float::<F>(lanes, s, d, m, opacity),
                CompositeOp::Erase => erase_float::<F>(lanes, s, d, m),
                _ => blend_op_float::<F>(lanes, op, s, d, m, opacity),
            }
        }
    }
    Outcome::Exact
}

#[inline]
fn float_alpha<F: FloatLane>(lanes: &LaneMap, px: &[u8]) -> f32 {
    lanes.alpha.map_or(1.0, |o| F::read(&px[o..]))
}

#[inline]
fn float_envelope<F: FloatLane>(lanes: &LaneMap, d: &mut [u8], eff: f32) -> f32 {
    let Some(o) = lanes.alpha else {
        return eff;
    };
    let dst_alpha = F::read(&d[o..]);
    if dst_alpha >= 1.0 {
        return eff;
    }
    let new_alpha = dst_alpha + (1.0 - dst_alpha) * eff;
    F::write(&mut d[o..], new_alpha);
    if new_alpha <= 0.0 { eff } else { eff / new_alpha }
}

#[inline]
fn mix_float<F: FloatLane>(d: &mut [u8], offset: usize, value: f32, blend: f32) {
    let v = if blend >= 1.0 {
        value
    } else {
        let current = F::read(&d[offset..]);
        current + (value - current) * blend
    };
    F::write(&mut d[offset..], v);
}

fn over_float<F: FloatLane>(lanes: &LaneMap, s: &[u8], d: &mut [u8], mask: Option<f32>, opacity: f32) {
    let eff = float_alpha::<F>(lanes, s) * mask.unwrap_or(1.0) * opacity;
    if eff <= 0.0 {
        return;
    }
    if eff >= 1.0 {
        d.copy_from_slice(s);
        return;
    }
    let blend = float_envelope::<F>(lanes, d, eff);
    for &o in lanes.color.iter().chain(&lanes.substance) {
        mix_float::<F>(d, o, F::read(&s[o..]), blend);
    }
}

fn erase_float<F: FloatLane>(lanes: &LaneMap, s: &[u8], d: &mut [u8], mask: Option<f32>) {
    let Some(o) = lanes.alpha else {
        return;
    };
    let src_alpha = float_alpha::<F>(lanes, s);
    let eff = mask.map_or(src_alpha, |m| 1.0 + (src_alpha - 1.0) * m);
    let dst_alpha = F::read(&d[o..]);
    F::write(&mut d[o..], eff * dst_alpha);
}

fn blend_op_float<F: FloatLane>(
    lanes: &LaneMap,
    op: CompositeOp,
    s: &[u8],
    d: &mut [u8],
    mask: Option<f32>,
    opacity: f32,
) {
    let eff = float_alpha::<F>(lanes, s) * mask.unwrap_or(1.0) * opacity;
    if eff <= 0.0 {
        return;
    }

    let mut result = [0.0f32; MAX_COLOR_LANES];
    match lanes.rgb {
        Some(idx) if op.needs_rgb() => {
            let unit = |px: &[u8]| idx.map(|i| F::read(&px[lanes.color[i]..]).clamp(0.0, 1.0));
            let rgb = hue_op(op, unit(s), unit(d));
            for (&i, v) in idx.iter().zip(rgb) {
                result[i] = v;
            }
        }
        _ => {
            for (slot, &o) in result.iter_mut().zip(&lanes.color) {
                *slot = unit_channel_op(op, F::read(&s[o..]), F::read(&d[o..]));
            }
        }
    }

    let blend = float_envelope::<F>(lanes, d, eff.min(1.0));
    for (&o, &v) in lanes.color.iter().zip(&result) {
        mix_float::<F>(d, o, v, blend);
    }
    for &o in &lanes.substance {
        mix_float::<F>(d, o, F::read(&s[o..]), blend);
    }
}

/// Per-channel operator on unit floats, clamped to `[0, 1]`.
fn unit_channel_op(op: CompositeOp, s: f32, d: f32) -> f32 {
    let (s, d) = (s.clamp(0.0, 1.0), d.clamp(0.0, 1.0));
    let v = match op {
        CompositeOp::Multiply => s * d,
        CompositeOp::Screen => s + d - s * d,
        CompositeOp::Overlay => d * (d + 2.0 * s * (1.0 - d)),
        CompositeOp::Dodge => {
            if s >= 1.0 {
                if d > 0.0 { 1.0 } else { 0.0 }
            } else {
                d / (1.0 - s)
            }
        }
        CompositeOp::Burn => {
            if s <= 0.0 {
                if d < 1.0 { 0.0 } else { 1.0 }
            } else {
                1.0 - (1.0 - d) / s
            }
        }
        CompositeOp::Divide => {
            if s <= 0.0 {
                if d > 0.0 { 1.0 } else { 0.0 }
            } else {
                d / s
            }
        }
        CompositeOp::Darken => s.min(d),
        CompositeOp::Lighten => s.max(d),
        CompositeOp::Add => s + d,
        CompositeOp::Subtract => d - s,
        CompositeOp::Diff => (s - d).abs(),
        _ => s,
    };
    v.clamp(0.0, 1.0)
}

/// Hue-family operator on unit RGB.
fn hue_op(op: CompositeOp, s: [f32; 3], d: [f32; 3]) -> [f32; 3] {
    match op {
        CompositeOp::Hue => {
            let (sh, dh) = (rgb_to_hsv(s), rgb_to_hsv(d));
            if sh.hue.is_none() {
                return d;
            }
            hsv_to_rgb(Hsv { hue: sh.hue, ..dh })
        }
        CompositeOp::Saturation => {
            let (sh, dh) = (rgb_to_hsv(s), rgb_to_hsv(d));
            if dh.hue.is_none() {
                return d;
            }
            hsv_to_rgb(Hsv {
                saturation: sh.saturation,
                ..dh
            })
        }
        CompositeOp::Value => {
            let dh = rgb_to_hsv(d);
            hsv_to_rgb(Hsv {
                value: rgb_to_hsv(s).value,
                ..dh
            })
        }
        CompositeOp::Color => {
            let (sl, dl) = (rgb_to_hsl(s), rgb_to_hsl(d));
            hsl_to_rgb(Hsl {
                lightness: dl.lightness,
                ..sl
            })
        }
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_lanes(bytes: usize) -> LaneMap {
        LaneMap {
            pixel_size: 4 * bytes,
            color: vec![0, bytes, 2 * bytes],
            substance: Vec::new(),
            alpha: Some(3 * bytes),
            rgb: Some([0, 1, 2]),
        }
    }

    fn run(op: CompositeOp, src: &[u8], dst: &mut [u8], opacity: u8) -> Outcome {
        let cols = dst.len() / 4;
        composite::<u8>(
            &rgba_lanes(1),
            op,
            CompositeArgs {
                dst,
                dst_stride: cols * 4,
                src,
                src_stride: cols * 4,
                mask: None,
                opacity,
                rows: 1,
                cols,
            },
        )
    }

    #[test]
    fn test_over_half_green_on_red() {
        let mut dst = [255u8, 0, 0, 255];
        run(CompositeOp::Over, &[0, 255, 0, 128], &mut dst, 255);
        assert_eq!(dst, [127, 128, 0, 255]);
    }

    #[test]
    fn test_over_onto_transparent_takes_source_color() {
        let mut dst = [10u8, 20, 30, 0];
        run(CompositeOp::Over, &[200, 100, 50, 100], &mut dst, 255);
        assert_eq!(dst, [200, 100, 50, 100]);
    }

    #[test]
    fn test_over_zero_opacity_is_noop() {
        let mut dst = [10u8, 20, 30, 40];
        run(CompositeOp::Over, &[200, 100, 50, 255], &mut dst, 0);
        assert_eq!(dst, [10, 20, 30, 40]);
    }

    #[test]
    fn test_channel_ops_u8() {
        assert_eq!(channel_op::<u8>(CompositeOp::Multiply, 255, 100), 100);
        assert_eq!(channel_op::<u8>(CompositeOp::Screen, 0, 100), 100);
        assert_eq!(channel_op::<u8>(CompositeOp::Screen, 255, 100), 255);
        assert_eq!(channel_op::<u8>(CompositeOp::Dodge, 0, 100), 100);
        assert_eq!(channel_op::<u8>(CompositeOp::Dodge, 255, 1), 255);
        assert_eq!(channel_op::<u8>(CompositeOp::Burn, 255, 100), 100);
        assert_eq!(channel_op::<u8>(CompositeOp::Burn, 0, 254), 0);
        assert_eq!(channel_op::<u8>(CompositeOp::Divide, 255, 100), 100);
        assert_eq!(channel_op::<u8>(CompositeOp::Divide, 0, 100), 255);
        assert_eq!(channel_op::<u8>(CompositeOp::Overlay, 0, 0), 0);
        assert_eq!(channel_op::<u8>(CompositeOp::Overlay, 255, 255), 255);
        assert_eq!(channel_op::<u8>(CompositeOp::Darken, 3, 9), 3);
        assert_eq!(channel_op::<u8>(CompositeOp::Lighten, 3, 9), 9);
        assert_eq!(channel_op::<u8>(CompositeOp::Add, 200, 100), 255);
        assert_eq!(channel_op::<u8>(CompositeOp::Add, 20, 100), 120);
        assert_eq!(channel_op::<u8>(CompositeOp::Subtract, 20, 100), 80);
        assert_eq!(channel_op::<u8>(CompositeOp::Subtract, 200, 100), 0);
        assert_eq!(channel_op::<u8>(CompositeOp::Diff, 20, 100), 80);
        assert_eq!(channel_op::<u8>(CompositeOp::Diff, 100, 20), 80);
        assert_eq!(channel_op::<u16>(CompositeOp::Add, 60000, 60000), 65535);
    }

    #[test]
    fn test_arithmetic_ops_opaque() {
        let mut dst = [100u8, 100, 100, 255];
        run(CompositeOp::Add, &[200, 50, 0, 255], &mut dst, 255);
        assert_eq!(dst, [255, 150, 100, 255]);

        let mut dst = [100u8, 100, 100, 255];
        run(CompositeOp::Subtract, &[200, 50, 0, 255], &mut dst, 255);
        assert_eq!(dst, [0, 50, 100, 255]);

        let mut dst = [100u8, 100, 100, 255];
        run(CompositeOp::Diff, &[200, 50, 100, 255], &mut dst, 255);
        assert_eq!(dst, [100, 50, 0, 255]);
    }

    fn float_px(v: [f32; 4]) -> Vec<u8> {
        v.iter().flat_map(|x| x.to_ne_bytes()).collect()
    }

    fn float_lanes(px: &[u8]) -> [f32; 4] {
        std::array::from_fn(|i| f32::from_ne_bytes([px[4 * i], px[4 * i + 1], px[4 * i + 2], px[4 * i + 3]]))
    }

    fn run_f32(op: CompositeOp, src: &[u8], dst: &mut [u8], opacity: u8) -> Outcome {
        composite_float::<f32>(
            &rgba_lanes(4),
            op,
            CompositeArgs {
                dst,
                dst_stride: 16,
                src,
                src_stride: 16,
                mask: None,
                opacity,
                rows: 1,
                cols: 1,
            },
        )
    }

    #[test]
    fn test_float_over() {
        let mut dst = float_px([1.0, 0.0, 0.0, 1.0]);
        run_f32(CompositeOp::Over, &float_px([0.0, 1.0, 0.0, 0.5]), &mut dst, 255);
        assert_eq!(float_lanes(&dst), [0.5, 0.5, 0.0, 1.0]);

        // onto transparent: straight alpha keeps the source color
        let mut dst = float_px([0.3, 0.3, 0.3, 0.0]);
        run_f32(CompositeOp::Over, &float_px([0.2, 0.4, 0.6, 0.25]), &mut dst, 255);
        assert_eq!(float_lanes(&dst), [0.2, 0.4, 0.6, 0.25]);
    }

    #[test]
    fn test_float_over_keeps_high_dynamic_range() {
        let src = float_px([4.0, 0.5, -0.25, 1.0]);
        let mut dst = float_px([0.0, 0.0, 0.0, 1.0]);
        run_f32(CompositeOp::Over, &src, &mut dst, 255);
        assert_eq!(dst, src);

        let mut dst = float_px([0.0, 0.0, 0.0, 1.0]);
        run_f32(CompositeOp::Over, &src, &mut dst, 128);
        let out = float_lanes(&dst);
        approx::assert_abs_diff_eq!(out[0], 4.0 * 128.0 / 255.0, epsilon = 1e-5);
    }

    #[test]
    fn test_float_ops_clamp() {
        let mut dst = float_px([0.75, 0.25, 2.0, 1.0]);
        run_f32(CompositeOp::Add, &float_px([0.5, 0.5, 0.0, 1.0]), &mut dst, 255);
        assert_eq!(float_lanes(&dst), [1.0, 0.75, 1.0, 1.0]);

        let mut dst = float_px([0.75, 0.25, 0.5, 1.0]);
        run_f32(CompositeOp::Subtract, &float_px([0.5, 0.5, 0.0, 1.0]), &mut dst, 255);
        assert_eq!(float_lanes(&dst), [0.25, 0.0, 0.5, 1.0]);

        let mut dst = float_px([0.75, 0.25, 0.5, 1.0]);
        run_f32(CompositeOp::Diff, &float_px([0.5, 0.5, 0.5, 1.0]), &mut dst, 255);
        assert_eq!(float_lanes(&dst), [0.25, 0.25, 0.0, 1.0]);

        assert_eq!(unit_channel_op(CompositeOp::Multiply, 0.5, 0.5), 0.25);
        assert_eq!(unit_channel_op(CompositeOp::Screen, 0.0, 0.5), 0.5);
        assert_eq!(unit_channel_op(CompositeOp::Dodge, 1.0, 0.1), 1.0);
        assert_eq!(unit_channel_op(CompositeOp::Burn, 0.0, 0.9), 0.0);
        assert_eq!(unit_channel_op(CompositeOp::Divide, 0.5, 0.25), 0.5);
    }

    #[test]
    fn test_float_erase_and_hue() {
        let mut dst = float_px([0.1, 0.2, 0.3, 0.8]);
        run_f32(CompositeOp::Erase, &float_px([0.0, 0.0, 0.0, 0.5]), &mut dst, 255);
        assert_eq!(float_lanes(&dst)[3], 0.4);

        let mut dst = float_px([1.0, 0.0, 0.0, 1.0]);
        run_f32(CompositeOp::Hue, &float_px([0.0, 0.0, 1.0, 1.0]), &mut dst, 255);
        let out = float_lanes(&dst);
        approx::assert_abs_diff_eq!(out[0], 0.0, epsilon = 1e-5);
        approx::assert_abs_diff_eq!(out[2], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_half_over() {
        use half::f16;
        let px = |v: [f32; 4]| -> Vec<u8> { v.iter().flat_map(|x| f16::from_f32(*x).to_ne_bytes()).collect() };
        let mut dst = px([1.0, 0.0, 0.0, 1.0]);
        composite_float::<f16>(
            &rgba_lanes(2),
            CompositeOp::Over,
            CompositeArgs {
                dst: &mut dst,
                dst_stride: 8,
                src: &px([0.0, 1.0, 0.0, 0.5]),
                src_stride: 8,
                mask: None,
                opacity: 255,
                rows: 1,
                cols: 1,
            },
        );
        assert_eq!(dst, px([0.5, 0.5, 0.0, 1.0]));
    }

    #[test]
    fn test_multiply_opaque() {
        let mut dst = [200u8, 100, 255, 255];
        run(CompositeOp::Multiply, &[128, 255, 0, 255], &mut dst, 255);
        assert_eq!(dst, [100, 100, 0, 255]);
    }

    #[test]
    fn test_erase() {
        let mut dst = [1u8, 2, 3, 200];
        run(CompositeOp::Erase, &[0, 0, 0, 128], &mut dst, 255);
        assert_eq!(dst, [1, 2, 3, 100]);
    }

    #[test]
    fn test_hue_takes_source_hue() {
        let mut dst = [255u8, 0, 0, 255];
        run(CompositeOp::Hue, &[0, 0, 255, 255], &mut dst, 255);
        assert_eq!(dst, [0, 0, 255, 255]);

        // gray source has no hue to give
        let mut dst = [255u8, 0, 0, 255];
        run(CompositeOp::Hue, &[90, 90, 90, 255], &mut dst, 255);
        assert_eq!(dst, [255, 0, 0, 255]);
    }

    #[test]
    fn test_value_keeps_hue() {
        let mut dst = [255u8, 0, 0, 255];
        run(CompositeOp::Value, &[0, 128, 0, 255], &mut dst, 255);
        assert_eq!(dst, [128, 0, 0, 255]);
    }

    #[test]
    fn test_hue_ops_need_rgb() {
        let gray = LaneMap {
            pixel_size: 2,
            color: vec![0],
            substance: Vec::new(),
            alpha: Some(1),
            rgb: None,
        };
        let mut dst = [9u8, 9];
        let outcome = composite::<u8>(
            &gray,
            CompositeOp::Saturation,
            CompositeArgs {
                dst: &mut dst,
                dst_stride: 2,
                src: &[200, 255],
                src_stride: 2,
                mask: None,
                opacity: 255,
                rows: 1,
                cols: 1,
            },
        );
        assert!(outcome.is_degraded());
        assert_eq!(dst, [9, 9]);
    }

    #[test]
    fn test_over_u16_matches_u8_scale() {
        let lanes = rgba_lanes(2);
        let px = |v: [u16; 4]| -> Vec<u8> { v.iter().flat_map(|x| x.to_ne_bytes()).collect() };
        let mut dst = px([65535, 0, 0, 65535]);
        let src = px([0, 65535, 0, 128 * 257]);
        composite::<u16>(
            &lanes,
            CompositeOp::Over,
            CompositeArgs {
                dst: &mut dst,
                dst_stride: 8,
                src: &src,
                src_stride: 8,
                mask: None,
                opacity: 255,
                rows: 1,
                cols: 1,
            },
        );
        let lane = |i: usize| u16::from_ne_bytes([dst[2 * i], dst[2 * i + 1]]);
        assert_eq!(u16::to_u8(u32::from(lane(0))), 127);
        assert_eq!(u16::to_u8(u32::from(lane(1))), 128);
        assert_eq!(lane(3), 65535);
    }
}
