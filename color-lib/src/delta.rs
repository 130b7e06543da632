use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::space::ColorSpace;
use crate::vector::Vector;

/// Per-axis weights over (lightness, chroma, hue).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Weights {
    pub const UNIT: Weights = Weights {
        l: 1.0,
        c: 1.0,
        h: 1.0,
    };

    pub const fn new(l: f64, c: f64, h: f64) -> Self {
        Self { l, c, h }
    }
}

/// A pairwise distance over vectors of one color space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    Euclidean,
    /// Euclidean with the hue axis measured around the circle.
    Circular,
    /// CIEDE2000 over CIELAB-like vectors with (Kl, Kc, Kh) divisors.
    DeltaE2000(Weights),
    HyAB,
    /// `sqrt(wl·ΔL² + wc·ΔC² + wh·ΔH²)` over (L, C, h) vectors, ΔH the hue chord.
    WeightedLch(Weights),
    /// Each channel difference divided by its scale before the Euclidean sum.
    Normalized([f64; 3]),
}

impl Delta {
    /// The distance that suits a space when nothing more specific is asked for.
    pub fn for_space(space: ColorSpace) -> Delta {
        match space {
            ColorSpace::Rgb | ColorSpace::Cmyk | ColorSpace::Oklab => Delta::Euclidean,
            ColorSpace::Hsl | ColorSpace::Hsv | ColorSpace::Lch | ColorSpace::Oklch => {
                Delta::Circular
            }
            ColorSpace::Lab => Delta::DeltaE2000(Weights::UNIT),
        }
    }

    pub fn distance(&self, space: ColorSpace, a: &Vector, b: &Vector) -> f64 {
        match self {
            Delta::Euclidean => euclidean(a, b),
            Delta::Circular => circular(space, a, b),
            Delta::DeltaE2000(k) => delta_e_2000(a, b, k),
            Delta::HyAB => {
                (a[0] - b[0]).abs() + ((a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
            }
            Delta::WeightedLch(w) => {
                let dl = a[0] - b[0];
                let dc = a[1] - b[1];
                let dh = hue_chord(a[1], a[2], b[1], b[2]);
                (w.l * dl * dl + w.c * dc * dc + w.h * dh * dh).sqrt()
            }
            Delta::Normalized(scale) => {
                let mut sum = 0.0;
                for i in 0..3 {
                    let d = match space.hue_index() {
                        Some(h) if h == i => hue_difference(a[i], b[i]),
                        _ => a[i] - b[i],
                    };
                    sum += (d / scale[i].max(1e-9)).powi(2);
                }
                sum.sqrt()
            }
        }
    }

    /// Stable key identifying this delta (variant and parameters) for memo tables.
    pub fn key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        let (tag, params): (u8, [f64; 3]) = match self {
            Delta::Euclidean => (0, [0.0; 3]),
            Delta::Circular => (1, [0.0; 3]),
            Delta::DeltaE2000(k) => (2, [k.l, k.c, k.h]),
            Delta::HyAB => (3, [0.0; 3]),
            Delta::WeightedLch(w) => (4, [w.l, w.c, w.h]),
            Delta::Normalized(s) => (5, *s),
        };
        tag.hash(&mut hasher);
        for p in params {
            p.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

pub fn euclidean(a: &Vector, b: &Vector) -> f64 {
    a.defined().sub(&b.defined()).norm()
}

/// Shortest angular distance in degrees; 0 if either hue is undefined.
pub fn hue_difference(h1: f64, h2: f64) -> f64 {
    if h1.is_nan() || h2.is_nan() {
        return 0.0;
    }
    let d = (h1 - h2).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn hue_chord(c1: f64, h1: f64, c2: f64, h2: f64) -> f64 {
    let dh = hue_difference(h1, h2).to_radians();
    2.0 * (c1 * c2).max(0.0).sqrt() * (dh / 2.0).sin()
}

fn circular(space: ColorSpace, a: &Vector, b: &Vector) -> f64 {
    if space.is_lch() {
        let dl = a[0] - b[0];
        let dc = a[1] - b[1];
        let dh = hue_chord(a[1], a[2], b[1], b[2]);
        return (dl * dl + dc * dc + dh * dh).sqrt();
    }
    let hue = space.hue_index();
    let mut sum = 0.0;
    for i in 0..a.dims() {
        let d = if Some(i) == hue {
            // Half a turn spans the same range as the 0..=100 channels.
            hue_difference(a[i], b[i]) * 100.0 / 180.0
        } else {
            a[i] - b[i]
        };
        sum += d * d;
    }
    sum.sqrt()
}

fn hue_angle(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        0.0
    } else {
        b.atan2(a).to_degrees().rem_euclid(360.0)
    }
}

/// CIEDE2000 with parametric factors taken from `k` (1,1,1 for the standard formula).
pub fn delta_e_2000(lab1: &Vector, lab2: &Vector, k: &Weights) -> f64 {
    const POW25_7: f64 = 6103515625.0;
    let (l1, a1, b1) = (lab1[0], lab1[1], lab1[2]);
    let (l2, a2, b2) = (lab2[0], lab2[1], lab2[2]);

    let c_ab_mean = (a1.hypot(b1) + a2.hypot(b2)) / 2.0;
    let c7 = c_ab_mean.powi(7);
    let g = 0.5 * (1.0 - (c7 / (c7 + POW25_7)).sqrt());

    let a1p = a1 * (1.0 + g);
    let a2p = a2 * (1.0 + g);
    let c1p = a1p.hypot(b1);
    let c2p = a2p.hypot(b2);
    let h1p = hue_angle(a1p, b1);
    let h2p = hue_angle(a2p, b2);

    let dlp = l2 - l1;
    let dcp = c2p - c1p;
    let dhp = if c1p * c2p == 0.0 {
        0.0
    } else {
        let d = h2p - h1p;
        if d.abs() <= 180.0 {
            d
        } else if d > 180.0 {
            d - 360.0
        } else {
            d + 360.0
        }
    };
    let dbig_h = 2.0 * (c1p * c2p).sqrt() * (dhp.to_radians() / 2.0).sin();

    let lp_mean = (l1 + l2) / 2.0;
    let cp_mean = (c1p + c2p) / 2.0;
    let hp_mean = if c1p * c2p == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let hr = hp_mean.to_radians();
    let t = 1.0 - 0.17 * (hr - PI / 6.0).cos()
        + 0.24 * (2.0 * hr).cos()
        + 0.32 * (3.0 * hr + PI / 30.0).cos()
        - 0.20 * (4.0 * hr - 63f64.to_radians()).cos();

    let l50 = (lp_mean - 50.0).powi(2);
    let sl = 1.0 + (0.015 * l50) / (20.0 + l50).sqrt();
    let sc = 1.0 + 0.045 * cp_mean;
    let sh = 1.0 + 0.015 * cp_mean * t;

    let d_theta = 30.0 * (-((hp_mean - 275.0) / 25.0).powi(2)).exp();
    let cp7 = cp_mean.powi(7);
    let rc = 2.0 * (cp7 / (cp7 + POW25_7)).sqrt();
    let rt = -(2.0 * d_theta).to_radians().sin() * rc;

    let tl = dlp / (k.l * sl);
    let tc = dcp / (k.c * sc);
    let th = dbig_h / (k.h * sh);

    (tl * tl + tc * tc + th * th + rt * tc * th).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // Sharma, Wu & Dalal test pairs.
    #[test]
    fn test_ciede2000_reference() {
        let pairs = [
            ((50.0, 2.6772, -79.7751), (50.0, 0.0, -82.7485), 2.0425),
            ((50.0, 3.1571, -77.2803), (50.0, 0.0, -82.7485), 2.8615),
            ((50.0, 2.5, 0.0), (73.0, 25.0, -18.0), 27.1492),
            ((60.2574, -34.0099, 36.2677), (60.4626, -34.1751, 39.4387), 1.2644),
        ];
        for (a, b, expected) in pairs {
            let va = Vector::new(a.0, a.1, a.2);
            let vb = Vector::new(b.0, b.1, b.2);
            assert_abs_diff_eq!(delta_e_2000(&va, &vb, &Weights::UNIT), expected, epsilon = 1e-4);
            assert_abs_diff_eq!(delta_e_2000(&vb, &va, &Weights::UNIT), expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_circular_wraps_hue() {
        let a = Vector::new(350.0, 50.0, 50.0);
        let b = Vector::new(10.0, 50.0, 50.0);
        let d = Delta::Circular.distance(ColorSpace::Hsl, &a, &b);
        assert_abs_diff_eq!(d, 20.0 * 100.0 / 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_undefined_hue_contributes_nothing() {
        let gray = Vector::new(0.5, 0.0, f64::NAN);
        let red = Vector::new(0.5, 0.2, 30.0);
        let d = Delta::Circular.distance(ColorSpace::Oklch, &gray, &red);
        assert_abs_diff_eq!(d, 0.2, epsilon = 1e-12);
        assert!(!Delta::WeightedLch(Weights::UNIT)
            .distance(ColorSpace::Oklch, &gray, &red)
            .is_nan());
    }

    #[test]
    fn test_keys_distinguish_parameters() {
        assert_ne!(
            Delta::DeltaE2000(Weights::UNIT).key(),
            Delta::DeltaE2000(Weights::new(0.5, 1.0, 2.0)).key()
        );
        assert_eq!(Delta::Euclidean.key(), Delta::Euclidean.key());
    }
}
