//! Quality statistics of an ordered path through OKLab.

use color_lib::stats::{mean, stdev};
use color_lib::Vector;
use serde::{Deserialize, Serialize};

/// Whether a larger value of a metric is better or worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsEx {
    pub total_distance: f64,
    pub mean_distance: f64,
    pub max_distance: f64,
    pub distance_stdev: f64,
    /// Degrees.
    pub mean_angle: f64,
    /// Degrees.
    pub max_angle: f64,
    /// Share of consecutive lightness steps that flip direction.
    pub lightness_reversals: f64,
    /// Lightness difference between the first and last color.
    pub end_contrast: f64,
}

impl MetricsEx {
    pub const COUNT: usize = 8;

    pub const NAMES: [&'static str; Self::COUNT] = [
        "totalDistance",
        "meanDistance",
        "maxDistance",
        "distanceStdev",
        "meanAngle",
        "maxAngle",
        "lightnessReversals",
        "endContrast",
    ];

    pub const POLARITY: [Polarity; Self::COUNT] = [
        Polarity::Low,
        Polarity::Low,
        Polarity::Low,
        Polarity::Low,
        Polarity::Low,
        Polarity::Low,
        Polarity::Low,
        Polarity::High,
    ];

    pub fn values(&self) -> [f64; Self::COUNT] {
        [
            self.total_distance,
            self.mean_distance,
            self.max_distance,
            self.distance_stdev,
            self.mean_angle,
            self.max_angle,
            self.lightness_reversals,
            self.end_contrast,
        ]
    }

    pub fn from_values(v: [f64; Self::COUNT]) -> Self {
        MetricsEx {
            total_distance: v[0],
            mean_distance: v[1],
            max_distance: v[2],
            distance_stdev: v[3],
            mean_angle: v[4],
            max_angle: v[5],
            lightness_reversals: v[6],
            end_contrast: v[7],
        }
    }
}

/// Computes [`MetricsEx`] for colors already in path order, as OKLab vectors.
pub trait MetricsProvider: Send + Sync {
    fn metrics(&self, oklab: &[Vector]) -> MetricsEx;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMetrics;

impl MetricsProvider for StandardMetrics {
    fn metrics(&self, oklab: &[Vector]) -> MetricsEx {
        if oklab.len() < 2 {
            return MetricsEx::default();
        }
        let steps: Vec<f64> = oklab.windows(2).map(|w| w[1].sub(&w[0]).norm()).collect();
        let angles = turn_angles(oklab);
        let lightness_steps: Vec<f64> = oklab
            .windows(2)
            .map(|w| w[1][0] - w[0][0])
            .filter(|d| d.abs() > 1e-9)
            .collect();
        let reversals = lightness_steps
            .windows(2)
            .filter(|w| w[0].signum() != w[1].signum())
            .count();
        let lightness_reversals = if lightness_steps.len() < 2 {
            0.0
        } else {
            reversals as f64 / (lightness_steps.len() - 1) as f64
        };
        MetricsEx {
            total_distance: steps.iter().sum(),
            mean_distance: mean(&steps),
            max_distance: steps.iter().copied().fold(0.0, f64::max),
            distance_stdev: stdev(&steps),
            mean_angle: mean(&angles),
            max_angle: angles.iter().copied().fold(0.0, f64::max),
            lightness_reversals,
            end_contrast: (oklab[oklab.len() - 1][0] - oklab[0][0]).abs(),
        }
    }
}

/// Angle in degrees between each pair of consecutive steps. Zero-length
/// steps do not turn.
pub fn turn_angles(points: &[Vector]) -> Vec<f64> {
    points
        .windows(3)
        .map(|w| {
            let first = w[1].defined().sub(&w[0].defined()).normalized();
            let second = w[2].defined().sub(&w[1].defined()).normalized();
            match (first, second) {
                (Some(a), Some(b)) => a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees(),
                _ => 0.0,
            }
        })
        .collect()
}

/// Mean direction change along the path, in degrees.
pub fn mean_turn_angle(points: &[Vector]) -> f64 {
    mean(&turn_angles(points))
}
