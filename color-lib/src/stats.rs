//! Small statistics helpers, including circular statistics over hue angles
//! in degrees.

use itertools::Itertools;

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance.
pub fn variance(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

pub fn stdev(xs: &[f64]) -> f64 {
    variance(xs).sqrt()
}

/// Mean resultant length and mean angle (degrees) of a set of hues.
fn resultant(hues: &[f64]) -> (f64, f64) {
    if hues.is_empty() {
        return (0.0, 0.0);
    }
    let (s, c) = hues.iter().fold((0.0, 0.0), |(s, c), h| {
        let (sin, cos) = h.to_radians().sin_cos();
        (s + sin, c + cos)
    });
    let n = hues.len() as f64;
    let r = ((s / n).powi(2) + (c / n).powi(2)).sqrt();
    (r, s.atan2(c).to_degrees().rem_euclid(360.0))
}

pub fn circular_mean(hues: &[f64]) -> f64 {
    resultant(hues).1
}

/// Circular standard deviation in degrees, `sqrt(-2 ln R)`.
pub fn circular_stdev(hues: &[f64]) -> f64 {
    let (r, _) = resultant(hues);
    if r <= f64::EPSILON {
        // Evenly spread: the deviation is unbounded, cap at half a turn.
        return 180.0;
    }
    (-2.0 * r.min(1.0).ln()).sqrt().to_degrees().min(180.0)
}

/// Gaps between consecutive hues once sorted, the last entry being the
/// wrap-around gap back to the first hue. Undefined hues are skipped.
pub fn hue_gaps(hues: &[f64]) -> Vec<f64> {
    let sorted = hues
        .iter()
        .copied()
        .filter(|h| !h.is_nan())
        .sorted_by(|a, b| a.total_cmp(b))
        .collect_vec();
    if sorted.is_empty() {
        return Vec::new();
    }
    let mut gaps = sorted
        .iter()
        .tuple_windows()
        .map(|(a, b)| b - a)
        .collect_vec();
    gaps.push(360.0 - sorted[sorted.len() - 1] + sorted[0]);
    gaps
}

/// 360° minus the largest consecutive hue gap; 0 with fewer than two hues.
pub fn hue_spread(hues: &[f64]) -> f64 {
    let gaps = hue_gaps(hues);
    if gaps.len() < 2 {
        return 0.0;
    }
    360.0 - gaps.iter().copied().fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(mean(&xs), 5.0);
        assert_abs_diff_eq!(stdev(&xs), 2.0);
        assert_eq!(variance(&[]), 0.0);
    }

    #[test]
    fn test_circular_mean_wraps() {
        let m = circular_mean(&[350.0, 10.0]);
        assert!(m < 1e-6 || m > 360.0 - 1e-6, "{m}");
        assert_abs_diff_eq!(circular_stdev(&[40.0, 40.0, 40.0]), 0.0, epsilon = 1e-6);
        assert!(circular_stdev(&[0.0, 120.0, 240.0]) >= 179.0);
    }

    #[test]
    fn test_hue_spread() {
        assert_abs_diff_eq!(hue_spread(&[350.0, 10.0, 20.0]), 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hue_spread(&[0.0, 90.0, 180.0, 270.0]), 270.0, epsilon = 1e-9);
        assert_eq!(hue_spread(&[42.0]), 0.0);
        let gaps = hue_gaps(&[10.0, f64::NAN, 70.0]);
        assert_eq!(gaps, vec![60.0, 300.0]);
    }
}
