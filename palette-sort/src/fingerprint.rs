//! Spectral fingerprint of a palette's hue, chroma and lightness structure.
//!
//! The palette is first put in a canonical OKLCH order (achromatic colors
//! by lightness, then chromatic colors by hue), so a fingerprint does not
//! depend on the order colors were given in.

use color_lib::color;
use color_lib::palette_type::is_achromatic;
use color_lib::stats::{hue_gaps, variance};
use color_lib::{Color, ColorSpace, Context, Vector};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::SortError;
use crate::fft::Spectrum;

/// Hue gaps wider than this, in degrees, count as large.
pub const LARGE_GAP: f64 = 30.0;
pub const MIN_COLORS: usize = 4;
pub const MIN_CHROMATIC: usize = 3;

/// `[hue HF ratio, chroma HF ratio, chroma variance, lightness variance,
/// large gap share, max gap / 360, chromatic share]`, or empty for palettes
/// too small or too gray to describe.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub Vec<f64>);

impl Fingerprint {
    pub const LEN: usize = 7;

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Cosine similarity; 0 whenever either side is empty, zero or of a
    /// different length.
    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        if self.is_empty() || self.0.len() != other.0.len() {
            return 0.0;
        }
        let dot: f64 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        let a: f64 = self.0.iter().map(|x| x * x).sum();
        let b: f64 = other.0.iter().map(|x| x * x).sum();
        let denominator = (a * b).sqrt();
        if denominator <= f64::EPSILON || !dot.is_finite() {
            return 0.0;
        }
        (dot / denominator).clamp(-1.0, 1.0)
    }

    /// Element-wise mean of non-empty fingerprints.
    pub fn average<'a>(all: impl IntoIterator<Item = &'a Fingerprint>) -> Fingerprint {
        let mut sum = vec![0.0; Self::LEN];
        let mut count = 0usize;
        for f in all.into_iter().filter(|f| f.0.len() == Self::LEN) {
            for (s, x) in sum.iter_mut().zip(&f.0) {
                *s += x;
            }
            count += 1;
        }
        if count == 0 {
            return Fingerprint::default();
        }
        Fingerprint(sum.into_iter().map(|s| s / count as f64).collect())
    }
}

/// Spectra of the three structural signals of a palette.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectralProfile {
    pub hue_gaps: Spectrum,
    pub chroma: Spectrum,
    pub lightness: Spectrum,
}

/// OKLCH order used before fingerprinting.
pub fn canonical(oklch: &[Vector]) -> Vec<Vector> {
    oklch
        .iter()
        .copied()
        .sorted_by(|a, b| {
            is_achromatic(b)
                .cmp(&is_achromatic(a))
                .then_with(|| {
                    if is_achromatic(a) {
                        a[0].total_cmp(&b[0])
                    } else {
                        a[2].total_cmp(&b[2])
                            .then(a[1].total_cmp(&b[1]))
                            .then(a[0].total_cmp(&b[0]))
                    }
                })
        })
        .collect()
}

pub fn profile(oklch: &[Vector]) -> SpectralProfile {
    let sorted = canonical(oklch);
    let hues: Vec<f64> = sorted.iter().filter(|v| !is_achromatic(v)).map(|v| v[2]).collect();
    let chroma: Vec<f64> = sorted.iter().map(|v| v[1]).collect();
    let lightness: Vec<f64> = sorted.iter().map(|v| v[0]).collect();
    SpectralProfile {
        hue_gaps: Spectrum::of(&hue_gaps(&hues)),
        chroma: Spectrum::of(&chroma),
        lightness: Spectrum::of(&lightness),
    }
}

/// Fingerprint of OKLCH vectors in any order.
pub fn fingerprint(oklch: &[Vector]) -> Fingerprint {
    let total = oklch.len();
    let sorted = canonical(oklch);
    let hues: Vec<f64> = sorted.iter().filter(|v| !is_achromatic(v)).map(|v| v[2]).collect();
    if total < MIN_COLORS || hues.len() < MIN_CHROMATIC {
        return Fingerprint::default();
    }
    let gaps = hue_gaps(&hues);
    let spectra = profile(&sorted);
    let chroma: Vec<f64> = sorted.iter().map(|v| v[1]).collect();
    let lightness: Vec<f64> = sorted.iter().map(|v| v[0]).collect();
    let large = gaps.iter().filter(|&&g| g > LARGE_GAP).count();
    let widest = gaps.iter().copied().fold(0.0, f64::max);
    Fingerprint(vec![
        spectra.hue_gaps.high_frequency_ratio,
        spectra.chroma.high_frequency_ratio,
        variance(&chroma),
        variance(&lightness),
        large as f64 / gaps.len() as f64,
        widest / 360.0,
        hues.len() as f64 / total as f64,
    ])
}

/// Parses `colors` and fingerprints them through `ctx`.
pub fn palette_fingerprint(colors: &[Color], ctx: &mut Context) -> Result<Fingerprint, SortError> {
    let parsed = colors
        .iter()
        .map(|c| color::parse(c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(fingerprint(&ctx.vectors(&parsed, ColorSpace::Oklch)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn colors(xs: &[&str]) -> Vec<Color> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    const RAINBOW: [&str; 8] = [
        "#ff0000", "#ff8000", "#ffff00", "#00ff00", "#00ffff", "#0000ff", "#8000ff", "#808080",
    ];

    #[test]
    fn test_shape() {
        let mut ctx = Context::new();
        let f = palette_fingerprint(&colors(&RAINBOW), &mut ctx).unwrap();
        assert_eq!(f.0.len(), Fingerprint::LEN);
        assert_abs_diff_eq!(f.0[6], 7.0 / 8.0);
        assert!(f.0.iter().all(|x| x.is_finite() && *x >= 0.0));
        assert!(f.0[5] < 0.5);
    }

    #[test]
    fn test_order_independent() {
        let mut ctx = Context::new();
        let a = palette_fingerprint(&colors(&RAINBOW), &mut ctx).unwrap();
        let mut reversed = colors(&RAINBOW);
        reversed.reverse();
        let b = palette_fingerprint(&reversed, &mut ctx).unwrap();
        assert_eq!(a, b);
        assert_abs_diff_eq!(a.similarity(&b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_palettes_are_empty() {
        let mut ctx = Context::new();
        let small = palette_fingerprint(&colors(&["#ff0000", "#00ff00", "#0000ff"]), &mut ctx).unwrap();
        assert!(small.is_empty());
        let grays = colors(&["#000000", "#333333", "#666666", "#999999", "#ff0000"]);
        assert!(palette_fingerprint(&grays, &mut ctx).unwrap().is_empty());
    }

    #[test]
    fn test_similarity_edge_cases() {
        let a = Fingerprint(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let b = Fingerprint(vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(a.similarity(&b), 0.0);
        assert_eq!(a.similarity(&Fingerprint::default()), 0.0);
        assert_eq!(Fingerprint(vec![0.0; 7]).similarity(&a), 0.0);
    }

    #[test]
    fn test_average() {
        let a = Fingerprint(vec![1.0; 7]);
        let b = Fingerprint(vec![3.0; 7]);
        let avg = Fingerprint::average([&a, &b, &Fingerprint::default()]);
        assert_eq!(avg, Fingerprint(vec![2.0; 7]));
    }
}
