//! Lloyd's k-means with farthest-point initialization, plus an estimate of
//! a palette's natural cluster count.

use color_lib::{ColorSpace, Vector};
use itertools::Itertools;

use crate::error::RegistryError;
use crate::greedy::chain;
use crate::registry::{ints, Args, Family, Speed};
use crate::runner::{sorter, SortFn};

const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vector>,
}

impl KMeans {
    /// Sum of squared distances from each point to its centroid.
    pub fn inertia(&self, points: &[Vector]) -> f64 {
        points
            .iter()
            .zip(&self.assignments)
            .map(|(p, &a)| p.defined().sub(&self.centroids[a]).norm().powi(2))
            .sum()
    }

    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.assignments.iter().positions(|&a| a == cluster).collect()
    }
}

fn nearest(p: &Vector, centroids: &[Vector]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = p.sub(c).norm();
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

/// Clusters `points` (undefined components read as 0) into at most `k` groups.
pub fn kmeans(points: &[Vector], k: usize) -> KMeans {
    let points: Vec<Vector> = points.iter().map(Vector::defined).collect();
    let k = k.min(points.len());
    if k == 0 {
        return KMeans {
            assignments: vec![0; points.len()],
            centroids: Vec::new(),
        };
    }

    let mut centroids = vec![points[0]];
    while centroids.len() < k {
        let mut far = 0;
        let mut far_distance = -1.0;
        for (i, p) in points.iter().enumerate() {
            let d = p.sub(&centroids[nearest(p, &centroids)]).norm();
            if d > far_distance {
                far = i;
                far_distance = d;
            }
        }
        centroids.push(points[far]);
    }

    let mut assignments: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();
    for _ in 0..MAX_ITERATIONS {
        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members = points
                .iter()
                .zip(&assignments)
                .filter(|&(_, &a)| a == c)
                .map(|(p, _)| *p)
                .collect_vec();
            if !members.is_empty() {
                *centroid = members
                    .iter()
                    .fold(Vector::new(0.0, 0.0, 0.0), |acc, p| acc.add(p))
                    .scale(1.0 / members.len() as f64);
            }
        }
        let next: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();
        if next == assignments {
            break;
        }
        assignments = next;
    }
    KMeans {
        assignments,
        centroids,
    }
}

/// Share of the single-cluster inertia that may remain unexplained.
const RESIDUAL: f64 = 0.1;

/// Smallest k in `1..=max_k` whose clustering explains 90% of the spread.
pub fn estimate_k(points: &[Vector], max_k: usize) -> usize {
    let max_k = max_k.min(points.len()).max(1);
    let base = kmeans(points, 1).inertia(points);
    if base <= f64::EPSILON {
        return 1;
    }
    (2..=max_k)
        .find(|&k| kmeans(points, k).inertia(points) <= RESIDUAL * base)
        .unwrap_or(max_k)
}

fn build(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let k = args.int(0)? as usize;
    Ok(sorter(id, ColorSpace::Oklab, move |input| {
        let points: Vec<Vector> = input.vectors.iter().map(Vector::defined).collect();
        let clustering = kmeans(&points, k);
        let mut order = Vec::with_capacity(points.len());
        let clusters = (0..clustering.centroids.len())
            .sorted_by(|&a, &b| clustering.centroids[a][0].total_cmp(&clustering.centroids[b][0]));
        for cluster in clusters {
            let members = clustering
                .members(cluster)
                .into_iter()
                .sorted_by(|&a, &b| points[a][0].total_cmp(&points[b][0]).then(a.cmp(&b)))
                .collect_vec();
            let local = chain(members.len(), 0, |i, j| {
                points[members[i]].sub(&points[members[j]]).norm()
            });
            order.extend(local.into_iter().map(|i| members[i]));
        }
        order
    }))
}

pub fn families() -> Vec<Family> {
    vec![Family::new("KM", Speed::Medium, build).param(ints(&[2, 3, 4, 6]))]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vector> {
        [0.0, 0.1, 0.2, 5.0, 5.1, 10.0, 10.2, 10.1]
            .iter()
            .map(|&x| Vector::new(x, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn test_separates_blobs() {
        let points = blobs();
        let result = kmeans(&points, 3);
        assert_eq!(result.members(result.assignments[0]), vec![0, 1, 2]);
        assert_eq!(result.members(result.assignments[3]), vec![3, 4]);
        assert_eq!(result.members(result.assignments[5]), vec![5, 6, 7]);
        assert!(result.inertia(&points) < 0.1);
    }

    #[test]
    fn test_k_capped_by_points() {
        let points = blobs();
        let result = kmeans(&points[..2], 5);
        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.inertia(&points[..2]), 0.0);
    }

    #[test]
    fn test_estimate_k() {
        assert_eq!(estimate_k(&blobs(), 6), 3);
        assert_eq!(estimate_k(&blobs()[..1], 6), 1);
    }
}
