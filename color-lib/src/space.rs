use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{self, sRGB, Lab, Oklab, Polar, RGB};
use crate::error::ColorError;
use crate::vector::Vector;

/// Chroma below which an OKLCH hue is undefined.
pub const OKLCH_HUE_EPSILON: f64 = 1e-4;
/// Chroma below which an LCH hue is undefined.
pub const LCH_HUE_EPSILON: f64 = 1e-2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Rgb,
    Hsl,
    Hsv,
    Lab,
    Lch,
    Oklab,
    Oklch,
    Cmyk,
}

impl ColorSpace {
    pub const ALL: [ColorSpace; 8] = [
        ColorSpace::Rgb,
        ColorSpace::Hsl,
        ColorSpace::Hsv,
        ColorSpace::Lab,
        ColorSpace::Lch,
        ColorSpace::Oklab,
        ColorSpace::Oklch,
        ColorSpace::Cmyk,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorSpace::Rgb => "rgb",
            ColorSpace::Hsl => "hsl",
            ColorSpace::Hsv => "hsv",
            ColorSpace::Lab => "lab",
            ColorSpace::Lch => "lch",
            ColorSpace::Oklab => "oklab",
            ColorSpace::Oklch => "oklch",
            ColorSpace::Cmyk => "cmyk",
        }
    }

    pub fn dims(&self) -> usize {
        match self {
            ColorSpace::Cmyk => 4,
            _ => 3,
        }
    }

    /// Index of the circular hue component, if the space has one.
    pub fn hue_index(&self) -> Option<usize> {
        match self {
            ColorSpace::Hsl | ColorSpace::Hsv => Some(0),
            ColorSpace::Lch | ColorSpace::Oklch => Some(2),
            _ => None,
        }
    }

    /// Index of the lightness-like component.
    pub fn lightness_index(&self) -> usize {
        match self {
            ColorSpace::Hsl | ColorSpace::Hsv => 2,
            ColorSpace::Cmyk => 3,
            _ => 0,
        }
    }

    /// True when the space is polar with (L, C, h) layout.
    pub fn is_lch(&self) -> bool {
        matches!(self, ColorSpace::Lch | ColorSpace::Oklch)
    }

    pub fn to_vector(&self, c: &sRGB) -> Vector {
        match self {
            ColorSpace::Rgb => Vector::new(c[0] as f64, c[1] as f64, c[2] as f64),
            ColorSpace::Hsl => {
                let (h, s, l) = color::hsl(c);
                Vector::new(h, s, l)
            }
            ColorSpace::Hsv => {
                let (h, s, v) = color::hsv(c);
                Vector::new(h, s, v)
            }
            ColorSpace::Lab => {
                let lab: Lab = (*c).into();
                Vector::new(lab.L, lab.a, lab.b)
            }
            ColorSpace::Lch => {
                let lab: Lab = (*c).into();
                let p = Polar::from_cartesian(lab.L, lab.a, lab.b, LCH_HUE_EPSILON);
                Vector::new(p.L, p.C, p.h)
            }
            ColorSpace::Oklab => {
                let ok: Oklab = (*c).into();
                Vector::new(ok.L, ok.a, ok.b)
            }
            ColorSpace::Oklch => {
                let ok: Oklab = (*c).into();
                let p = Polar::from_cartesian(ok.L, ok.a, ok.b, OKLCH_HUE_EPSILON);
                Vector::new(p.L, p.C, p.h)
            }
            ColorSpace::Cmyk => Vector::new4(color::cmyk(c)),
        }
    }

    pub fn from_vector(&self, v: &Vector) -> sRGB {
        match self {
            ColorSpace::Rgb => [
                v[0].round().clamp(0.0, 255.0) as u8,
                v[1].round().clamp(0.0, 255.0) as u8,
                v[2].round().clamp(0.0, 255.0) as u8,
            ],
            ColorSpace::Hsl => color::from_hsl(v[0], v[1], v[2]),
            ColorSpace::Hsv => color::from_hsv(v[0], v[1], v[2]),
            ColorSpace::Lab => {
                let rgb: RGB = Lab {
                    L: v[0],
                    a: v[1],
                    b: v[2],
                }
                .into();
                rgb.to_srgb()
            }
            ColorSpace::Lch => {
                let (l, a, b) = Polar {
                    L: v[0],
                    C: v[1],
                    h: v[2],
                }
                .to_cartesian();
                let rgb: RGB = Lab { L: l, a, b }.into();
                rgb.to_srgb()
            }
            ColorSpace::Oklab => {
                let rgb: RGB = Oklab {
                    L: v[0],
                    a: v[1],
                    b: v[2],
                }
                .into();
                rgb.to_srgb()
            }
            ColorSpace::Oklch => {
                let (l, a, b) = Polar {
                    L: v[0],
                    C: v[1],
                    h: v[2],
                }
                .to_cartesian();
                let rgb: RGB = Oklab { L: l, a, b }.into();
                rgb.to_srgb()
            }
            ColorSpace::Cmyk => color::from_cmyk([v[0], v[1], v[2], v[3]]),
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorSpace {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorSpace::ALL
            .iter()
            .find(|space| space.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ColorError::UnknownModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    #[test]
    fn test_roundtrip_every_space() {
        for space in ColorSpace::ALL {
            for (r, g, b) in iproduct!(
                (0x00..=0xFF).step_by(17),
                (0x00..=0xFF).step_by(17),
                (0x00..=0xFF).step_by(17)
            ) {
                let c: sRGB = [r as u8, g as u8, b as u8];
                let back = space.from_vector(&space.to_vector(&c));
                for i in 0..3 {
                    assert!(
                        (back[i] as i32 - c[i] as i32).abs() <= 1,
                        "{space}: {:?} -> {:?}",
                        c,
                        back
                    );
                }
            }
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("OKLCH".parse::<ColorSpace>(), Ok(ColorSpace::Oklch));
        assert_eq!(
            "xyz".parse::<ColorSpace>(),
            Err(ColorError::UnknownModel("xyz".to_string()))
        );
        assert_eq!(ColorSpace::Cmyk.to_vector(&[0, 0, 0]).dims(), 4);
    }

    #[test]
    fn test_achromatic_hue_is_undefined() {
        for space in [ColorSpace::Hsl, ColorSpace::Hsv, ColorSpace::Lch, ColorSpace::Oklch] {
            let v = space.to_vector(&[0x55, 0x55, 0x55]);
            let h = space.hue_index().unwrap();
            assert!(v[h].is_nan(), "{space}");
        }
    }
}
