//! Radix-2 FFT and the spectrum summaries used by fingerprints.

use std::f64::consts::PI;

/// Smallest transform length used, however short the signal.
pub const MIN_SIZE: usize = 16;
/// Share of the kept bins, counted from the top, treated as high frequency.
pub const HIGH_SHARE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    fn add(self, o: Complex) -> Complex {
        Complex {
            re: self.re + o.re,
            im: self.im + o.im,
        }
    }

    fn sub(self, o: Complex) -> Complex {
        Complex {
            re: self.re - o.re,
            im: self.im - o.im,
        }
    }

    fn mul(self, o: Complex) -> Complex {
        Complex {
            re: self.re * o.re - self.im * o.im,
            im: self.re * o.im + self.im * o.re,
        }
    }

    fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }
}

/// In-place iterative Cooley-Tukey. `data.len()` must be a power of two.
fn transform(data: &mut [Complex]) {
    let n = data.len();
    if n < 2 {
        return;
    }
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            data.swap(i, j);
        }
    }
    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f64;
        let step = Complex {
            re: angle.cos(),
            im: angle.sin(),
        };
        for start in (0..n).step_by(len) {
            let mut w = Complex { re: 1.0, im: 0.0 };
            for k in 0..len / 2 {
                let even = data[start + k];
                let odd = data[start + k + len / 2].mul(w);
                data[start + k] = even.add(odd);
                data[start + k + len / 2] = even.sub(odd);
                w = w.mul(step);
            }
        }
        len <<= 1;
    }
}

/// Transform length for a signal of `len` samples.
pub fn size_for(len: usize) -> usize {
    len.next_power_of_two().max(MIN_SIZE)
}

/// Linear interpolation of `signal` onto `size` evenly spaced samples.
pub fn resample(signal: &[f64], size: usize) -> Vec<f64> {
    match signal.len() {
        0 => vec![0.0; size],
        1 => vec![signal[0]; size],
        len if len == size => signal.to_vec(),
        len => (0..size)
            .map(|i| {
                let t = i as f64 * (len - 1) as f64 / (size - 1).max(1) as f64;
                let lo = (t.floor() as usize).min(len - 1);
                let hi = (lo + 1).min(len - 1);
                let frac = t - lo as f64;
                signal[lo] * (1.0 - frac) + signal[hi] * frac
            })
            .collect(),
    }
}

/// Magnitudes of bins `1..size / 2`, dropping DC and Nyquist.
pub fn magnitudes(signal: &[f64]) -> Vec<f64> {
    let size = size_for(signal.len());
    let mut data: Vec<Complex> = resample(signal, size)
        .into_iter()
        .map(|re| Complex { re, im: 0.0 })
        .collect();
    transform(&mut data);
    data[1..size / 2].iter().map(|c| c.norm()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spectrum {
    /// Sum of squared magnitudes.
    pub energy: f64,
    /// Energy in the top 60% of bins over total energy; 0 for a flat signal.
    pub high_frequency_ratio: f64,
}

impl Spectrum {
    pub fn of(signal: &[f64]) -> Self {
        let power: Vec<f64> = magnitudes(signal).iter().map(|m| m * m).collect();
        let energy: f64 = power.iter().sum();
        let high = (power.len() as f64 * HIGH_SHARE).round() as usize;
        let high_energy: f64 = power[power.len() - high..].iter().sum();
        Spectrum {
            energy,
            high_frequency_ratio: if energy > 0.0 { high_energy / energy } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_single_tone() {
        let n = 16;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 3.0 * i as f64 / n as f64).cos())
            .collect();
        let m = magnitudes(&signal);
        assert_eq!(m.len(), 7);
        for (bin, value) in m.iter().enumerate() {
            let expected = if bin + 1 == 3 { 8.0 } else { 0.0 };
            assert_abs_diff_eq!(*value, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_resample_endpoints() {
        let r = resample(&[0.0, 10.0, 20.0], 5);
        assert_eq!(r, vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(size_for(3), 16);
        assert_eq!(size_for(17), 32);
    }

    #[test]
    fn test_spectrum_ratio() {
        assert_abs_diff_eq!(Spectrum::of(&[1.0; 16]).energy, 0.0, epsilon = 1e-9);
        let alternating: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        // All energy sits at DC and Nyquist, both dropped.
        assert_abs_diff_eq!(Spectrum::of(&alternating).energy, 0.0, epsilon = 1e-9);
        let fast: Vec<f64> = (0..16).map(|i| (2.0 * PI * 6.0 * i as f64 / 16.0).sin()).collect();
        assert_abs_diff_eq!(Spectrum::of(&fast).high_frequency_ratio, 1.0, epsilon = 1e-9);
    }
}
