/// Symmetric matrix over unordered index pairs, stored as a strict lower
/// triangle. `(i, j)` and `(j, i)` address the same cell.
#[derive(Debug, Clone)]
pub struct PairMatrix<T> {
    n: usize,
    data: Vec<T>,
}

impl<T: std::fmt::Display + Copy + Default> std::fmt::Display for PairMatrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out_str = "\t".to_string()
            + (0..self.n)
                .map(|a| usize::to_string(&a))
                .collect::<Vec<_>>()
                .join("\t")
                .as_str();
        for i in 0..self.n {
            out_str += format!("\n{}\t", i).as_str();
            for j in 0..i {
                out_str += format!("{:.2}\t", self.get(j, i)).as_str();
            }
        }

        write!(f, "{}", out_str.as_str())
    }
}

impl<T> PairMatrix<T> {
    pub fn new_populated(n: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(Self::triangle_number(n));
        for j in 1..n {
            for i in 0..j {
                data.push(f(i, j));
            }
        }
        Self { n, data }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    // don't tell anyone, but this actually computes the triangle number of n-1.
    fn triangle_number(n: usize) -> usize {
        (n * n.saturating_sub(1)) / 2
    }

    fn ordered_pair_to_index((a, b): (usize, usize)) -> usize {
        let (min, max) = if a < b { (a, b) } else { (b, a) };
        Self::triangle_number(max) + min
    }
}

impl<T: Copy + Default> PairMatrix<T> {
    /// Value for the pair; the diagonal reads as `T::default()`.
    pub fn get(&self, i: usize, j: usize) -> T {
        if i == j {
            T::default()
        } else {
            self.data[Self::ordered_pair_to_index((i, j))]
        }
    }
}

impl PairMatrix<f64> {
    /// Sum of consecutive distances along `path`.
    pub fn path_length(&self, path: &[usize]) -> f64 {
        path.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }

    /// The globally closest pair `(i, j)`, `i < j`; first found on ties.
    pub fn closest_pair(&self) -> Option<(usize, usize)> {
        let mut best: Option<(f64, (usize, usize))> = None;
        for j in 1..self.n {
            for i in 0..j {
                let d = self.get(i, j);
                if best.map_or(true, |(b, _)| d < b) {
                    best = Some((d, (i, j)));
                }
            }
        }
        best.map(|(_, pair)| pair)
    }
}

impl<T> std::ops::Index<(usize, usize)> for PairMatrix<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.data[Self::ordered_pair_to_index(index)]
    }
}

impl<T> std::ops::IndexMut<(usize, usize)> for PairMatrix<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.data[Self::ordered_pair_to_index(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_access() {
        let m = PairMatrix::new_populated(5, |i, j| (i * 10 + j) as f64);
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
            assert_eq!(m.get(i, i), 0.0);
        }
        assert_eq!(m[(3, 1)], 13.0);
        assert_eq!(m.len(), 5);
    }

    #[test]
    fn test_closest_pair_and_length() {
        let xs = [0.0, 5.0, 5.5, 9.0];
        let m = PairMatrix::new_populated(4, |i, j| f64::abs(xs[i] - xs[j]));
        assert_eq!(m.closest_pair(), Some((1, 2)));
        assert_eq!(m.path_length(&[0, 1, 2, 3]), 9.0);
        assert!(PairMatrix::new_populated(1, |_, _| 0.0).closest_pair().is_none());
        assert!(PairMatrix::<f64>::new_populated(0, |_, _| 0.0).is_empty());
    }
}
