use fast_srgb8::{f32_to_srgb8, srgb8_to_f32};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ColorError;

#[allow(non_camel_case_types)]
pub type sRGB = [u8; 3];

/// A palette entry as it appears in palette files, e.g. `#3A7BD5`.
/// Compared by value; never rewritten by sorting.
pub type Color = String;

pub fn as_index(c: &sRGB) -> usize {
    // RGB order. Might change later.
    let mut out: usize = c[2] as usize;
    out |= (c[1] as usize) << 8;
    out |= (c[0] as usize) << 16;
    out
}

pub fn to_string(c: &sRGB) -> String {
    format!("#{:06x}", as_index(c)).to_uppercase()
}

static HEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").expect("hex pattern")
});

pub fn parse(color: &str) -> Result<sRGB, ColorError> {
    let invalid = || ColorError::InvalidHex(color.to_string());
    let caps = HEX.captures(color.trim()).ok_or_else(invalid)?;
    let mut out = [0u8; 3];
    for (i, channel) in out.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&caps[i + 1], 16).map_err(|_| invalid())?;
    }
    Ok(out)
}

/// Linear-light RGB.
#[derive(Debug, Clone, Copy)]
pub struct RGB {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl From<sRGB> for RGB {
    fn from(c: sRGB) -> Self {
        RGB {
            r: srgb8_to_f32(c[0]) as f64,
            g: srgb8_to_f32(c[1]) as f64,
            b: srgb8_to_f32(c[2]) as f64,
        }
    }
}

impl RGB {
    pub fn to_srgb(&self) -> sRGB {
        [
            f32_to_srgb8(self.r.clamp(0.0, 1.0) as f32),
            f32_to_srgb8(self.g.clamp(0.0, 1.0) as f32),
            f32_to_srgb8(self.b.clamp(0.0, 1.0) as f32),
        ]
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Oklab {
    pub L: f64,
    pub a: f64,
    pub b: f64,
}

impl From<RGB> for Oklab {
    #[allow(clippy::excessive_precision)]
    fn from(c: RGB) -> Self {
        // Copied from https://bottosson.github.io/posts/oklab/#converting-from-linear-srgb-to-oklab.
        // Accessed 2024-01-30.
        let l = 0.4122214708 * c.r + 0.5363325363 * c.g + 0.0514459929 * c.b;
        let m = 0.2119034982 * c.r + 0.6806995451 * c.g + 0.1073969566 * c.b;
        let s = 0.0883024619 * c.r + 0.2817188376 * c.g + 0.6299787005 * c.b;

        let l_ = l.cbrt();
        let m_ = m.cbrt();
        let s_ = s.cbrt();

        Oklab {
            L: 0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_,
            a: 1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_,
            b: 0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_,
        }
    }
}

impl From<Oklab> for RGB {
    #[allow(clippy::excessive_precision)]
    fn from(c: Oklab) -> Self {
        let l_ = c.L + 0.3963377774 * c.a + 0.2158037573 * c.b;
        let m_ = c.L - 0.1055613458 * c.a - 0.0638541728 * c.b;
        let s_ = c.L - 0.0894841775 * c.a - 1.2914855480 * c.b;

        let l = l_ * l_ * l_;
        let m = m_ * m_ * m_;
        let s = s_ * s_ * s_;

        RGB {
            r: 4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s,
            g: -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s,
            b: -0.0041960863 * l - 0.7034186147 * m + 1.7076147010 * s,
        }
    }
}

impl From<sRGB> for Oklab {
    fn from(c: sRGB) -> Self {
        Into::<RGB>::into(c).into()
    }
}

/// CIELAB under D65.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Lab {
    pub L: f64,
    pub a: f64,
    pub b: f64,
}

const D65: [f64; 3] = [0.95047, 1.0, 1.08883];
const DELTA: f64 = 6.0 / 29.0;

fn lab_f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

impl From<RGB> for Lab {
    #[allow(clippy::excessive_precision)]
    fn from(c: RGB) -> Self {
        let x = 0.4124564 * c.r + 0.3575761 * c.g + 0.1804375 * c.b;
        let y = 0.2126729 * c.r + 0.7151522 * c.g + 0.0721750 * c.b;
        let z = 0.0193339 * c.r + 0.1191920 * c.g + 0.9503041 * c.b;

        let fx = lab_f(x / D65[0]);
        let fy = lab_f(y / D65[1]);
        let fz = lab_f(z / D65[2]);

        Lab {
            L: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

impl From<Lab> for RGB {
    #[allow(clippy::excessive_precision)]
    fn from(c: Lab) -> Self {
        let fy = (c.L + 16.0) / 116.0;
        let fx = fy + c.a / 500.0;
        let fz = fy - c.b / 200.0;

        let x = lab_f_inv(fx) * D65[0];
        let y = lab_f_inv(fy) * D65[1];
        let z = lab_f_inv(fz) * D65[2];

        RGB {
            r: 3.2404542 * x - 1.5371385 * y - 0.4985314 * z,
            g: -0.9692660 * x + 1.8760108 * y + 0.0415560 * z,
            b: 0.0556434 * x - 0.2040259 * y + 1.0572252 * z,
        }
    }
}

impl From<sRGB> for Lab {
    fn from(c: sRGB) -> Self {
        Into::<RGB>::into(c).into()
    }
}

/// Polar form shared by LCH and OKLCH. `h` is in degrees, `NaN` when the
/// chroma is too small for a hue to mean anything.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy)]
pub struct Polar {
    pub L: f64,
    pub C: f64,
    pub h: f64,
}

impl Polar {
    pub fn from_cartesian(l: f64, a: f64, b: f64, epsilon: f64) -> Self {
        let c = a.hypot(b);
        let h = if c < epsilon {
            f64::NAN
        } else {
            b.atan2(a).to_degrees().rem_euclid(360.0)
        };
        Polar { L: l, C: c, h }
    }

    /// Returns `(L, a, b)`; an undefined hue is read as 0.
    pub fn to_cartesian(&self) -> (f64, f64, f64) {
        let h = if self.h.is_nan() { 0.0 } else { self.h.to_radians() };
        let (sin, cos) = h.sin_cos();
        (self.L, self.C * cos, self.C * sin)
    }
}

/// Hue (degrees), saturation and the third channel (lightness or value) from
/// 8-bit RGB. Saturation and the third channel are in 0..=100.
pub fn hsl(c: &sRGB) -> (f64, f64, f64) {
    let (max, min, hue) = hue_parts(c);
    let l = (max + min) / 2.0;
    let s = if max == min {
        0.0
    } else {
        (max - min) / (1.0 - (2.0 * l - 1.0).abs())
    };
    (hue, s * 100.0, l * 100.0)
}

pub fn hsv(c: &sRGB) -> (f64, f64, f64) {
    let (max, min, hue) = hue_parts(c);
    let s = if max == 0.0 { 0.0 } else { (max - min) / max };
    (hue, s * 100.0, max * 100.0)
}

fn hue_parts(c: &sRGB) -> (f64, f64, f64) {
    let r = c[0] as f64 / 255.0;
    let g = c[1] as f64 / 255.0;
    let b = c[2] as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;
    let hue = if d == 0.0 {
        f64::NAN
    } else if max == r {
        60.0 * ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / d + 2.0)
    } else {
        60.0 * ((r - g) / d + 4.0)
    };
    (max, min, hue)
}

fn from_chroma(hue: f64, chroma: f64, m: f64) -> sRGB {
    let h = if hue.is_nan() { 0.0 } else { hue.rem_euclid(360.0) / 60.0 };
    let x = chroma * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    [
        to_byte(r + m),
        to_byte(g + m),
        to_byte(b + m),
    ]
}

pub fn from_hsl(h: f64, s: f64, l: f64) -> sRGB {
    let s = s / 100.0;
    let l = l / 100.0;
    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    from_chroma(h, chroma, l - chroma / 2.0)
}

pub fn from_hsv(h: f64, s: f64, v: f64) -> sRGB {
    let s = s / 100.0;
    let v = v / 100.0;
    let chroma = v * s;
    from_chroma(h, chroma, v - chroma)
}

/// Naive device CMYK, each channel in 0..=100.
pub fn cmyk(c: &sRGB) -> [f64; 4] {
    let r = c[0] as f64 / 255.0;
    let g = c[1] as f64 / 255.0;
    let b = c[2] as f64 / 255.0;
    let k = 1.0 - r.max(g).max(b);
    if k >= 1.0 {
        return [0.0, 0.0, 0.0, 100.0];
    }
    [
        (1.0 - r - k) / (1.0 - k) * 100.0,
        (1.0 - g - k) / (1.0 - k) * 100.0,
        (1.0 - b - k) / (1.0 - k) * 100.0,
        k * 100.0,
    ]
}

pub fn from_cmyk(v: [f64; 4]) -> sRGB {
    let k = v[3] / 100.0;
    [
        to_byte((1.0 - v[0] / 100.0) * (1.0 - k)),
        to_byte((1.0 - v[1] / 100.0) * (1.0 - k)),
        to_byte((1.0 - v[2] / 100.0) * (1.0 - k)),
    ]
}

fn to_byte(x: f64) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}

#[allow(non_snake_case)]
pub fn HyAB(c1: &Oklab, c2: &Oklab) -> f64 {
    (c1.L - c2.L).abs() + ((c1.a - c2.a).powi(2) + (c1.b - c2.b).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use itertools::iproduct;

    #[test]
    fn test_parse() {
        assert_eq!(parse("#3a7BD5").unwrap(), [0x3a, 0x7b, 0xd5]);
        assert_eq!(parse("ff0000").unwrap(), [0xff, 0, 0]);
        assert_eq!(
            parse("#ff00"),
            Err(ColorError::InvalidHex("#ff00".to_string()))
        );
        assert!(parse("#gg0000").is_err());
        assert_eq!(to_string(&[0x3a, 0x7b, 0xd5]), "#3A7BD5");
    }

    #[test]
    fn test_oklab_reference() {
        // Reference values from https://bottosson.github.io/posts/oklab/.
        let white: Oklab = [0xFF, 0xFF, 0xFF].into();
        assert_abs_diff_eq!(white.L, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(white.a, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(white.b, 0.0, epsilon = 1e-4);

        let red: Oklab = [0xFF, 0x00, 0x00].into();
        assert_abs_diff_eq!(red.L, 0.627955, epsilon = 1e-4);
        assert_abs_diff_eq!(red.a, 0.224863, epsilon = 1e-4);
        assert_abs_diff_eq!(red.b, 0.125846, epsilon = 1e-4);
    }

    #[test]
    fn test_lab_reference() {
        let white: Lab = [0xFF, 0xFF, 0xFF].into();
        assert_abs_diff_eq!(white.L, 100.0, epsilon = 1e-2);
        let red: Lab = [0xFF, 0x00, 0x00].into();
        assert_abs_diff_eq!(red.L, 53.24, epsilon = 0.05);
        assert_abs_diff_eq!(red.a, 80.09, epsilon = 0.05);
        assert_abs_diff_eq!(red.b, 67.20, epsilon = 0.05);
    }

    #[test]
    fn test_hsl_hsv_roundtrip() {
        for (r, g, b) in iproduct!((0x00..=0xFF).step_by(15), (0x00..=0xFF).step_by(15), (0x00..=0xFF).step_by(15)) {
            let c: sRGB = [r as u8, g as u8, b as u8];
            let (h, s, l) = hsl(&c);
            assert_eq!(from_hsl(h, s, l), c);
            let (h, s, v) = hsv(&c);
            assert_eq!(from_hsv(h, s, v), c);
            assert_eq!(from_cmyk(cmyk(&c)), c);
        }
    }

    #[test]
    fn test_gray_has_no_hue() {
        assert!(hsl(&[0x80, 0x80, 0x80]).0.is_nan());
        let ok: Oklab = [0x80, 0x80, 0x80].into();
        assert!(Polar::from_cartesian(ok.L, ok.a, ok.b, 1e-4).h.is_nan());
    }
}
