use std::ops::Index;

/// A point in some color space: 3 components, or 4 for CMYK.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    c: [f64; 4],
    dims: usize,
}

impl Vector {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self {
            c: [a, b, c, 0.0],
            dims: 3,
        }
    }

    pub const fn new4(c: [f64; 4]) -> Self {
        Self { c, dims: 4 }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        let mut c = [0.0; 4];
        let dims = values.len().min(4);
        c[..dims].copy_from_slice(&values[..dims]);
        Self { c, dims }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.c[..self.dims]
    }

    /// Copy with `NaN` components replaced by 0, for arithmetic that has no
    /// notion of an undefined hue.
    pub fn defined(&self) -> Self {
        let mut out = *self;
        for x in out.c.iter_mut() {
            if x.is_nan() {
                *x = 0.0;
            }
        }
        out
    }

    pub fn sub(&self, other: &Vector) -> Vector {
        self.zip(other, |a, b| a - b)
    }

    pub fn add(&self, other: &Vector) -> Vector {
        self.zip(other, |a, b| a + b)
    }

    pub fn scale(&self, k: f64) -> Vector {
        let mut out = *self;
        for x in out.c[..self.dims].iter_mut() {
            *x *= k;
        }
        out
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(&self) -> Option<Vector> {
        let n = self.norm();
        if n > f64::EPSILON {
            Some(self.scale(1.0 / n))
        } else {
            None
        }
    }

    pub fn sum(&self) -> f64 {
        self.as_slice().iter().filter(|x| !x.is_nan()).sum()
    }

    /// Total order used for canonical sorting; `NaN` sorts first.
    pub fn total_cmp(&self, other: &Vector) -> std::cmp::Ordering {
        for (a, b) in self.as_slice().iter().zip(other.as_slice()) {
            let ord = match (a.is_nan(), b.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                (false, false) => a.total_cmp(b),
            };
            if ord.is_ne() {
                return ord;
            }
        }
        self.dims.cmp(&other.dims)
    }

    fn zip(&self, other: &Vector, f: impl Fn(f64, f64) -> f64) -> Vector {
        let mut out = *self;
        for i in 0..self.dims.min(other.dims) {
            out.c[i] = f(self.c[i], other.c[i]);
        }
        out
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.as_slice()[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_arithmetic() {
        let a = Vector::new(1.0, 2.0, 2.0);
        let b = Vector::new(0.0, 0.0, 1.0);
        assert_abs_diff_eq!(a.norm(), 3.0);
        assert_abs_diff_eq!(a.dot(&b), 2.0);
        assert_eq!(a.sub(&b), Vector::new(1.0, 2.0, 1.0));
        assert!(Vector::new(0.0, 0.0, 0.0).normalized().is_none());
        assert_abs_diff_eq!(a.normalized().unwrap().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_sorts_first() {
        let gray = Vector::new(f64::NAN, 0.0, 50.0);
        let red = Vector::new(0.0, 100.0, 50.0);
        assert!(gray.total_cmp(&red).is_lt());
        assert!(gray.total_cmp(&gray).is_eq());
        assert_eq!(gray.defined()[0], 0.0);
    }
}
