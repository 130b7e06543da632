//! Palette shape classification and the distance weights derived from it.
//!
//! Everything here works on OKLCH vectors `(L, C, h)`. Hue statistics only
//! consider chromatic colors; achromatic ones have no meaningful hue.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::delta::Weights;
use crate::stats;
use crate::vector::Vector;

/// OKLCH chroma under which a color counts as achromatic.
pub const ACHROMATIC_CHROMA: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaletteType {
    Rainbow,
    Monochromatic,
    #[serde(rename = "Wide Chroma")]
    WideChroma,
    Uniform,
    Balanced,
}

impl PaletteType {
    /// `(Kl, Kc, Kh)` divisors for a weighted CIEDE2000. A small divisor
    /// amplifies the axis along which the palette naturally varies least.
    pub fn weights(&self) -> Weights {
        match self {
            PaletteType::Rainbow => Weights::new(0.5, 1.0, 2.0),
            PaletteType::Monochromatic => Weights::new(1.0, 1.0, 0.5),
            PaletteType::WideChroma => Weights::new(1.0, 2.0, 0.75),
            PaletteType::Uniform => Weights::UNIT,
            PaletteType::Balanced => Weights::UNIT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaletteType::Rainbow => "Rainbow",
            PaletteType::Monochromatic => "Monochromatic",
            PaletteType::WideChroma => "Wide Chroma",
            PaletteType::Uniform => "Uniform",
            PaletteType::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for PaletteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn is_achromatic(v: &Vector) -> bool {
    v[2].is_nan() || v[1] < ACHROMATIC_CHROMA
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteStats {
    pub hue_spread: f64,
    pub hue_stdev: f64,
    pub lightness_stdev: f64,
    pub chroma_stdev: f64,
    pub chromatic: usize,
}

impl PaletteStats {
    pub fn new(oklch: &[Vector]) -> Self {
        let hues: Vec<f64> = oklch
            .iter()
            .filter(|v| !is_achromatic(v))
            .map(|v| v[2])
            .collect();
        let lightness: Vec<f64> = oklch.iter().map(|v| v[0]).collect();
        let chroma: Vec<f64> = oklch.iter().map(|v| v[1]).collect();
        PaletteStats {
            hue_spread: stats::hue_spread(&hues),
            hue_stdev: if hues.is_empty() {
                0.0
            } else {
                stats::circular_stdev(&hues)
            },
            lightness_stdev: stats::stdev(&lightness),
            chroma_stdev: stats::stdev(&chroma),
            chromatic: hues.len(),
        }
    }
}

pub fn classify(oklch: &[Vector]) -> PaletteType {
    let s = PaletteStats::new(oklch);
    if s.hue_spread > 270.0 && s.hue_stdev > 60.0 {
        PaletteType::Rainbow
    } else if s.chromatic < 2 || s.hue_spread < 30.0 {
        PaletteType::Monochromatic
    } else if s.chroma_stdev > 0.08 {
        PaletteType::WideChroma
    } else if s.lightness_stdev < 0.08 && s.chroma_stdev < 0.04 {
        PaletteType::Uniform
    } else {
        PaletteType::Balanced
    }
}

/// Continuous weights from per-channel spread: `(total - s_i) / (2 * total)`.
/// The channel that varies least gets the largest weight; weights sum to 1.
pub fn adaptive_weights(oklch: &[Vector]) -> Weights {
    let s = PaletteStats::new(oklch);
    let spreads = [s.lightness_stdev, s.chroma_stdev, s.hue_stdev / 180.0];
    let total: f64 = spreads.iter().sum();
    if total < 1e-9 {
        return Weights::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
    }
    let w = spreads.map(|x| (total - x) / (2.0 * total));
    Weights::new(w[0], w[1], w[2])
}
