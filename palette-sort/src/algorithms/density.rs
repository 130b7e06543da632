//! DBSCAN over CIELAB.

use std::collections::VecDeque;

use color_lib::{ColorSpace, Vector};
use itertools::Itertools;

use crate::error::RegistryError;
use crate::greedy::chain;
use crate::matrix::PairMatrix;
use crate::registry::{ints, Args, Family, Speed};
use crate::runner::{sorter, SortFn};

pub const DEFAULT_EPS: f64 = 30.0;
pub const DEFAULT_MIN_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clustering {
    /// Members in discovery order.
    pub clusters: Vec<Vec<usize>>,
    /// Points in no cluster, by index.
    pub noise: Vec<usize>,
}

/// Brute-force neighborhood, the point itself included.
fn region(dist: &PairMatrix<f64>, p: usize, eps: f64) -> Vec<usize> {
    (0..dist.len()).filter(|&q| q == p || dist.get(p, q) <= eps).collect()
}

pub fn dbscan(dist: &PairMatrix<f64>, eps: f64, min_points: usize) -> Clustering {
    let n = dist.len();
    let mut visited = vec![false; n];
    let mut label: Vec<Option<usize>> = vec![None; n];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for p in 0..n {
        if visited[p] {
            continue;
        }
        visited[p] = true;
        let neighbors = region(dist, p, eps);
        if neighbors.len() < min_points {
            continue;
        }
        let cluster = clusters.len();
        let mut members = vec![p];
        label[p] = Some(cluster);
        let mut queue: VecDeque<usize> = neighbors.into_iter().filter(|&q| q != p).collect();
        while let Some(q) = queue.pop_front() {
            if label[q].is_none() {
                label[q] = Some(cluster);
                members.push(q);
            }
            if visited[q] {
                continue;
            }
            visited[q] = true;
            let reach = region(dist, q, eps);
            if reach.len() >= min_points {
                queue.extend(reach.into_iter().filter(|&r| label[r].is_none()));
            }
        }
        clusters.push(members);
    }

    let noise = (0..n).filter(|&p| label[p].is_none()).collect();
    Clustering { clusters, noise }
}

/// Clusters by ascending mean channel sum, each walked as a nearest-neighbor
/// chain from its first member, then the noise.
pub fn dbscan_order(points: &[Vector], dist: &PairMatrix<f64>, eps: f64, min_points: usize) -> Vec<usize> {
    let Clustering { clusters, noise } = dbscan(dist, eps, min_points);
    let channel_sum = |members: &[usize]| -> f64 {
        members.iter().map(|&m| points[m].sum()).sum::<f64>() / members.len() as f64
    };
    let mut order = Vec::with_capacity(points.len());
    for members in clusters
        .iter()
        .sorted_by(|a, b| channel_sum(a).total_cmp(&channel_sum(b)))
    {
        let local = chain(members.len(), 0, |i, j| dist.get(members[i], members[j]));
        order.extend(local.into_iter().map(|i| members[i]));
    }
    order.extend(noise);
    order
}

fn build(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let eps = args.float(0)?;
    let min_points = args.int(1)? as usize;
    Ok(sorter(id, ColorSpace::Lab, move |input| {
        let points: Vec<Vector> = input.vectors.iter().map(Vector::defined).collect();
        let dist = PairMatrix::new_populated(points.len(), |i, j| points[i].sub(&points[j]).norm());
        dbscan_order(&points, &dist, eps, min_points)
    }))
}

pub fn families() -> Vec<Family> {
    vec![Family::new("DBSCAN", Speed::Medium, build)
        .param(ints(&[10, 20, 30]))
        .param(ints(&[2, 3]))]
}
