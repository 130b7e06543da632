//! Bidirectional growth that prefers candidates continuing the current
//! direction of travel at either end of the path.

use color_lib::palette_type::classify;
use color_lib::{ColorSpace, Delta, Vector, Weights};
use itertools::Itertools;

use crate::error::RegistryError;
use crate::greedy::{grow, End, Expansion};
use crate::matrix::PairMatrix;
use crate::registry::{names, Args, Family, Speed};
use crate::runner::{sorter, SortFn, SortInput};
use crate::two_opt::two_opt;

/// Penalty multiplier for turning away from the running direction. Large
/// enough that any reasonably aligned candidate beats a misaligned one.
pub const MOMENTUM_WEIGHT: f64 = 1e6;

/// Number of closest seed pairs tried by the best-of variant.
pub const SEED_PAIRS: usize = 128;

pub struct Momentum<'a> {
    dist: &'a PairMatrix<f64>,
    points: &'a [Vector],
    head: Option<Vector>,
    tail: Option<Vector>,
}

impl<'a> Momentum<'a> {
    /// Running directions start along the seed's first and last edges.
    pub fn new(dist: &'a PairMatrix<f64>, points: &'a [Vector], seed: &[usize]) -> Self {
        let mut momentum = Self {
            dist,
            points,
            head: None,
            tail: None,
        };
        if let [first, second, ..] = *seed {
            momentum.head = momentum.step(second, first);
        }
        if let [.., before, last] = *seed {
            momentum.tail = momentum.step(before, last);
        }
        momentum
    }

    fn step(&self, from: usize, to: usize) -> Option<Vector> {
        self.points[to].sub(&self.points[from]).normalized()
    }

    fn direction(&self, end: End) -> Option<Vector> {
        match end {
            End::Head => self.head,
            End::Tail => self.tail,
        }
    }
}

impl Expansion for Momentum<'_> {
    fn cost(&self, end: End, at: usize, candidate: usize) -> f64 {
        let alignment = match (self.direction(end), self.step(at, candidate)) {
            (Some(dir), Some(step)) => dir.dot(&step),
            _ => 1.0,
        };
        self.dist.get(at, candidate) * (1.0 + (1.0 - alignment) * MOMENTUM_WEIGHT)
    }

    fn attached(&mut self, end: End, at: usize, candidate: usize) {
        let Some(step) = self.step(at, candidate) else {
            return;
        };
        let updated = match self.direction(end) {
            Some(dir) => dir.add(&step).normalized(),
            None => Some(step),
        };
        match end {
            End::Head => self.head = updated,
            End::Tail => self.tail = updated,
        }
    }
}

/// Grows a full path from `seed` under momentum.
pub fn momentum_path(dist: &PairMatrix<f64>, points: &[Vector], seed: &[usize]) -> Vec<usize> {
    let mut expansion = Momentum::new(dist, points, seed);
    grow(dist.len(), seed, true, &mut expansion)
}

/// The ordered triple whose two edges are most aligned, reduced to a pair
/// by dropping whichever endpoint lies nearer the middle point.
pub fn aligned_pair(dist: &PairMatrix<f64>, points: &[Vector]) -> Option<[usize; 2]> {
    let n = points.len();
    let mut best: Option<(f64, usize, usize, usize)> = None;
    for (i, j, k) in (0..n).tuple_combinations() {
        for (a, b, c) in [(i, j, k), (i, k, j), (j, i, k)] {
            let (Some(first), Some(second)) = (
                points[b].sub(&points[a]).normalized(),
                points[c].sub(&points[b]).normalized(),
            ) else {
                continue;
            };
            let alignment = first.dot(&second);
            if best.map_or(true, |(x, ..)| alignment > x) {
                best = Some((alignment, a, b, c));
            }
        }
    }
    best.map(|(_, a, b, c)| {
        if dist.get(a, b) <= dist.get(b, c) {
            [b, c]
        } else {
            [a, b]
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Distance {
    Euclid,
    DeltaE,
    WeightedDeltaE,
}

impl Distance {
    fn parse(args: &Args, family: &'static str) -> Result<Self, RegistryError> {
        match args.name(0)? {
            "euclid" => Ok(Distance::Euclid),
            "de" => Ok(Distance::DeltaE),
            "wde" => Ok(Distance::WeightedDeltaE),
            _ => Err(RegistryError::BadParam {
                family,
                index: 0,
                expected: "euclid, de or wde",
            }),
        }
    }

    fn space(self) -> ColorSpace {
        match self {
            Distance::Euclid => ColorSpace::Oklab,
            _ => ColorSpace::Lab,
        }
    }

    /// Distance matrix and the defined points directions are taken from.
    fn prepare(self, input: &mut SortInput) -> (PairMatrix<f64>, Vec<Vector>) {
        let delta = match self {
            Distance::Euclid => Delta::Euclidean,
            Distance::DeltaE => Delta::DeltaE2000(Weights::UNIT),
            Distance::WeightedDeltaE => {
                let oklch = input.vectors_in(ColorSpace::Oklch);
                Delta::DeltaE2000(classify(&oklch).weights())
            }
        };
        let points = input.vectors.iter().map(Vector::defined).collect();
        (input.matrix(delta), points)
    }
}

fn build_momentum(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let distance = Distance::parse(&args, "MOM")?;
    let triple = args.name(1)? == "triple";
    Ok(sorter(id, distance.space(), move |input| {
        let (dist, points) = distance.prepare(input);
        let seed = if triple {
            aligned_pair(&dist, &points)
        } else {
            None
        };
        let seed = seed
            .or_else(|| dist.closest_pair().map(|(a, b)| [a, b]))
            .unwrap_or([0, 1]);
        momentum_path(&dist, &points, &seed)
    }))
}

/// Tries the closest seed pairs and keeps the shortest resulting path.
pub fn best_of_seeds(dist: &PairMatrix<f64>, points: &[Vector]) -> Vec<usize> {
    let n = points.len();
    let seeds = (0..n)
        .tuple_combinations()
        .sorted_by(|&(a, b), &(c, d)| dist.get(a, b).total_cmp(&dist.get(c, d)))
        .take(SEED_PAIRS);
    let mut best: Option<(f64, Vec<usize>)> = None;
    for (a, b) in seeds {
        let path = momentum_path(dist, points, &[a, b]);
        let length = dist.path_length(&path);
        if best.as_ref().map_or(true, |(x, _)| length < *x) {
            best = Some((length, path));
        }
    }
    best.map_or_else(|| (0..n).collect(), |(_, path)| path)
}

fn build_best(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let distance = Distance::parse(&args, "MOMB")?;
    let refine = args.name(1)? == "2opt";
    Ok(sorter(id, distance.space(), move |input| {
        let (dist, points) = distance.prepare(input);
        let mut path = best_of_seeds(&dist, &points);
        if refine {
            two_opt(&mut path, |a, b| dist.get(a, b));
        }
        path
    }))
}

pub fn families() -> Vec<Family> {
    vec![
        Family::new("MOM", Speed::Medium, build_momentum)
            .param(names(&["euclid", "de", "wde"]))
            .param(names(&["pair", "triple"]))
            .valid(super::at_least_three),
        Family::new("MOMB", Speed::Slow, build_best)
            .param(names(&["euclid", "de", "wde"]))
            .param(names(&["none", "2opt"]))
            .valid(super::at_least_three),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line(xs: &[(f64, f64)]) -> (PairMatrix<f64>, Vec<Vector>) {
        let points: Vec<Vector> = xs.iter().map(|&(x, y)| Vector::new(x, y, 0.0)).collect();
        let dist = PairMatrix::new_populated(points.len(), |i, j| points[i].sub(&points[j]).norm());
        (dist, points)
    }

    #[test]
    fn test_keeps_going_straight() {
        // Plain nearest neighbor would turn toward the close point at (1.5, 0.9).
        let (dist, points) = line(&[(0.0, 0.0), (1.0, 0.0), (1.5, 0.9), (3.0, 0.0), (4.0, 0.0)]);
        let path = momentum_path(&dist, &points, &[0, 1]);
        assert_eq!(path, vec![2, 0, 1, 3, 4]);
    }

    #[test]
    fn test_cost_penalizes_turns() {
        let (dist, points) = line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 1.0)]);
        let m = Momentum::new(&dist, &points, &[0, 1]);
        assert_abs_diff_eq!(m.cost(End::Tail, 1, 2), 1.0, epsilon = 1e-9);
        assert!(m.cost(End::Tail, 1, 3) > 1e5);
    }

    #[test]
    fn test_aligned_pair() {
        let (dist, points) = line(&[(0.0, 0.0), (5.0, 0.0), (6.0, 0.0), (0.0, 7.0)]);
        assert_eq!(aligned_pair(&dist, &points), Some([0, 1]));
    }

    #[test]
    fn test_best_of_seeds_is_a_permutation() {
        let (dist, points) = line(&[(0.0, 0.0), (3.0, 1.0), (1.0, 4.0), (2.0, 2.0), (5.0, 5.0)]);
        let mut path = best_of_seeds(&dist, &points);
        path.sort();
        assert_eq!(path, vec![0, 1, 2, 3, 4]);
    }
}
