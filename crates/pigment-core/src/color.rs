//! Device-independent color and hue-based color models.
//!
//! [`NormalizedColor`] is the interchange form every color model can decode
//! to and encode from: sRGB-referred red, green and blue plus straight
//! opacity, all in `[0, 1]`.
//!
//! The HSV and HSL helpers work on unit RGB and return hue in degrees
//! `[0, 360)`, or `None` for achromatic colors where hue is undefined.

/// Normalized RGB color with straight (unassociated) opacity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedColor {
    /// Red in `[0, 1]`.
    pub red: f32,
    /// Green in `[0, 1]`.
    pub green: f32,
    /// Blue in `[0, 1]`.
    pub blue: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl NormalizedColor {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from unit components.
    pub const fn new(red: f32, green: f32, blue: f32, opacity: f32) -> Self {
        Self {
            red,
            green,
            blue,
            opacity,
        }
    }

    /// Creates a color from 8-bit components.
    pub fn from_rgb8(rgb: [u8; 3], opacity: u8) -> Self {
        Self::new(
            f32::from(rgb[0]) / 255.0,
            f32::from(rgb[1]) / 255.0,
            f32::from(rgb[2]) / 255.0,
            f32::from(opacity) / 255.0,
        )
    }

    /// RGB components as an array.
    #[inline]
    pub fn rgb(&self) -> [f32; 3] {
        [self.red, self.green, self.blue]
    }

    /// Replaces the RGB components.
    #[inline]
    pub fn set_rgb(&mut self, rgb: [f32; 3]) {
        self.red = rgb[0];
        self.green = rgb[1];
        self.blue = rgb[2];
    }

    /// RGB quantized to 8 bits.
    pub fn rgb8(&self) -> [u8; 3] {
        self.rgb().map(quantize8)
    }

    /// Opacity quantized to 8 bits.
    pub fn opacity8(&self) -> u8 {
        quantize8(self.opacity)
    }

    /// Returns a copy with every component clamped to `[0, 1]`.
    pub fn clamped(&self) -> Self {
        let c = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self::new(c(self.red), c(self.green), c(self.blue), c(self.opacity))
    }
}

#[inline]
fn quantize8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Hue, saturation, value. Hue in degrees, `None` when undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    /// Hue in `[0, 360)`.
    pub hue: Option<f32>,
    /// Saturation in `[0, 1]`.
    pub saturation: f32,
    /// Value in `[0, 1]`.
    pub value: f32,
}

/// Hue, saturation, lightness. Hue in degrees, `None` when undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue in `[0, 360)`.
    pub hue: Option<f32>,
    /// Saturation in `[0, 1]`.
    pub saturation: f32,
    /// Lightness in `[0, 1]`.
    pub lightness: f32,
}

fn hue_of(rgb: [f32; 3], max: f32, delta: f32) -> Option<f32> {
    if delta <= f32::EPSILON {
        return None;
    }
    let [r, g, b] = rgb;
    let h = if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    Some(h.rem_euclid(360.0))
}

/// Converts unit RGB to HSV.
pub fn rgb_to_hsv(rgb: [f32; 3]) -> Hsv {
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    let min = rgb[0].min(rgb[1]).min(rgb[2]);
    let delta = max - min;
    let saturation = if max <= 0.0 { 0.0 } else { delta / max };
    Hsv {
        hue: hue_of(rgb, max, delta),
        saturation,
        value: max,
    }
}

/// Converts HSV to unit RGB. Undefined hue is treated as 0.
pub fn hsv_to_rgb(hsv: Hsv) -> [f32; 3] {
    let c = hsv.value * hsv.saturation;
    let m = hsv.value - c;
    let [r, g, b] = hue_sector(hsv.hue.unwrap_or(0.0), c);
    [r + m, g + m, b + m]
}

/// Converts unit RGB to HSL.
pub fn rgb_to_hsl(rgb: [f32; 3]) -> Hsl {
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    let min = rgb[0].min(rgb[1]).min(rgb[2]);
    let delta = max - min;
    let lightness = (max + min) / 2.0;
    let saturation = if delta <= f32::EPSILON {
        0.0
    } else {
        delta / (1.0 - (2.0 * lightness - 1.0).abs())
    };
    Hsl {
        hue: hue_of(rgb, max, delta),
        saturation: saturation.clamp(0.0, 1.0),
        lightness,
    }
}

/// Converts HSL to unit RGB. Undefined hue is treated as 0.
pub fn hsl_to_rgb(hsl: Hsl) -> [f32; 3] {
    let c = (1.0 - (2.0 * hsl.lightness - 1.0).abs()) * hsl.saturation;
    let m = hsl.lightness - c / 2.0;
    let [r, g, b] = hue_sector(hsl.hue.unwrap_or(0.0), c);
    [r + m, g + m, b + m]
}

fn hue_sector(hue: f32, chroma: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    match h as u32 {
        0 => [chroma, x, 0.0],
        1 => [x, chroma, 0.0],
        2 => [0.0, chroma, x],
        3 => [0.0, x, chroma],
        4 => [x, 0.0, chroma],
        _ => [chroma, 0.0, x],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rgb8() {
        let c = NormalizedColor::new(1.0, 0.5, 0.0, 1.0);
        assert_eq!(c.rgb8(), [255, 128, 0]);
        assert_eq!(NormalizedColor::from_rgb8([255, 128, 0], 255).rgb8(), [255, 128, 0]);
    }

    #[test]
    fn test_hsv_primaries() {
        let red = rgb_to_hsv([1.0, 0.0, 0.0]);
        assert_eq!(red.hue, Some(0.0));
        assert_abs_diff_eq!(red.saturation, 1.0);
        let green = rgb_to_hsv([0.0, 1.0, 0.0]);
        assert_abs_diff_eq!(green.hue.unwrap(), 120.0);
        let gray = rgb_to_hsv([0.5, 0.5, 0.5]);
        assert_eq!(gray.hue, None);
        assert_abs_diff_eq!(gray.saturation, 0.0);
    }

    #[test]
    fn test_hsv_round_trip() {
        for rgb in [[0.2, 0.4, 0.9], [0.9, 0.1, 0.5], [0.3, 0.3, 0.3], [1.0, 1.0, 0.0]] {
            let back = hsv_to_rgb(rgb_to_hsv(rgb));
            for i in 0..3 {
                assert_abs_diff_eq!(back[i], rgb[i], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_hsl_round_trip() {
        for rgb in [[0.2, 0.4, 0.9], [0.9, 0.1, 0.5], [0.0, 0.0, 0.0], [0.5, 1.0, 0.25]] {
            let back = hsl_to_rgb(rgb_to_hsl(rgb));
            for i in 0..3 {
                assert_abs_diff_eq!(back[i], rgb[i], epsilon = 1e-5);
            }
        }
    }
}
