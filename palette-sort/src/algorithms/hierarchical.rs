//! Agglomerative clustering and dendrogram traversal.

use std::collections::VecDeque;

use color_lib::{ColorSpace, Vector};

use crate::error::RegistryError;
use crate::matrix::PairMatrix;
use crate::registry::{names, Args, Family, Speed};
use crate::runner::{sorter, SortFn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// Closest pair of members.
    Single,
    /// Farthest pair of members.
    Complete,
    /// Distance between centroids.
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    DepthFirst,
    /// Level by level, the smaller subtree of each merge first.
    BreadthFirst,
    /// Each merge is joined in whichever orientation puts the closer
    /// boundary colors next to each other.
    Balanced,
}

#[derive(Debug, Clone)]
struct Node {
    members: Vec<usize>,
    centroid: Vector,
    children: Option<(usize, usize)>,
}

/// A merge tree over point indices. The last node is the root.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    nodes: Vec<Node>,
}

impl Dendrogram {
    pub fn build(points: &[Vector], dist: &PairMatrix<f64>, linkage: Linkage) -> Self {
        let mut nodes: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(i, p)| Node {
                members: vec![i],
                centroid: p.defined(),
                children: None,
            })
            .collect();
        let mut active: Vec<usize> = (0..nodes.len()).collect();

        while active.len() > 1 {
            let mut closest: Option<(f64, usize, usize)> = None;
            for a in 0..active.len() {
                for b in a + 1..active.len() {
                    let d = linkage_distance(&nodes[active[a]], &nodes[active[b]], dist, linkage);
                    if closest.map_or(true, |(x, ..)| d < x) {
                        closest = Some((d, a, b));
                    }
                }
            }
            let Some((_, a, b)) = closest else { break };
            let (left, right) = (active[a], active[b]);
            let members: Vec<usize> = nodes[left]
                .members
                .iter()
                .chain(&nodes[right].members)
                .copied()
                .collect();
            let centroid = members
                .iter()
                .fold(Vector::new(0.0, 0.0, 0.0), |acc, &m| acc.add(&points[m].defined()))
                .scale(1.0 / members.len() as f64);
            nodes.push(Node {
                members,
                centroid,
                children: Some((left, right)),
            });
            active.remove(b);
            active[a] = nodes.len() - 1;
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn order(&self, traversal: Traversal, dist: &PairMatrix<f64>) -> Vec<usize> {
        if self.is_empty() {
            return Vec::new();
        }
        match traversal {
            Traversal::DepthFirst => self.depth_first(self.root()),
            Traversal::BreadthFirst => self.breadth_first(),
            Traversal::Balanced => self.balanced(self.root(), dist),
        }
    }

    fn depth_first(&self, node: usize) -> Vec<usize> {
        match self.nodes[node].children {
            None => self.nodes[node].members.clone(),
            Some((left, right)) => {
                let mut out = self.depth_first(left);
                out.extend(self.depth_first(right));
                out
            }
        }
    }

    fn breadth_first(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([self.root()]);
        while let Some(node) = queue.pop_front() {
            match self.nodes[node].children {
                None => out.extend(&self.nodes[node].members),
                Some((left, right)) => {
                    if self.nodes[right].members.len() < self.nodes[left].members.len() {
                        queue.extend([right, left]);
                    } else {
                        queue.extend([left, right]);
                    }
                }
            }
        }
        out
    }

    fn balanced(&self, node: usize, dist: &PairMatrix<f64>) -> Vec<usize> {
        let Some((left, right)) = self.nodes[node].children else {
            return self.nodes[node].members.clone();
        };
        let mut first = self.balanced(left, dist);
        let mut second = self.balanced(right, dist);
        let forward = boundary(&first, &second, dist);
        let backward = boundary(&second, &first, dist);
        if backward < forward {
            std::mem::swap(&mut first, &mut second);
        }
        first.extend(second);
        first
    }
}

fn boundary(first: &[usize], second: &[usize], dist: &PairMatrix<f64>) -> f64 {
    match (first.last(), second.first()) {
        (Some(&a), Some(&b)) => dist.get(a, b),
        _ => 0.0,
    }
}

fn linkage_distance(a: &Node, b: &Node, dist: &PairMatrix<f64>, linkage: Linkage) -> f64 {
    let pairs = || {
        a.members
            .iter()
            .flat_map(|&i| b.members.iter().map(move |&j| dist.get(i, j)))
    };
    match linkage {
        Linkage::Single => pairs().fold(f64::INFINITY, f64::min),
        Linkage::Complete => pairs().fold(0.0, f64::max),
        Linkage::Average => a.centroid.sub(&b.centroid).norm(),
    }
}

fn build(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let linkage = match args.name(0)? {
        "single" => Linkage::Single,
        "complete" => Linkage::Complete,
        _ => Linkage::Average,
    };
    let traversal = match args.name(1)? {
        "dfs" => Traversal::DepthFirst,
        "bfs" => Traversal::BreadthFirst,
        _ => Traversal::Balanced,
    };
    Ok(sorter(id, ColorSpace::Oklab, move |input| {
        let dist = input.default_matrix();
        Dendrogram::build(&input.vectors, &dist, linkage).order(traversal, &dist)
    }))
}

pub fn families() -> Vec<Family> {
    vec![Family::new("HC", Speed::Slow, build)
        .param(names(&["single", "complete", "average"]))
        .param(names(&["dfs", "bfs", "balanced"]))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn line(xs: &[f64]) -> (Vec<Vector>, PairMatrix<f64>) {
        let points: Vec<Vector> = xs.iter().map(|&x| Vector::new(x, 0.0, 0.0)).collect();
        let dist = PairMatrix::new_populated(xs.len(), |i, j| f64::abs(xs[i] - xs[j]));
        (points, dist)
    }

    #[test]
    fn test_merge_history() {
        let (points, dist) = line(&[0.0, 10.0, 1.0, 11.0, 30.0]);
        let tree = Dendrogram::build(&points, &dist, Linkage::Single);
        // (0,2) then (1,3), joined, then 4.
        assert_eq!(tree.order(Traversal::DepthFirst, &dist), vec![0, 2, 1, 3, 4]);
        assert_eq!(tree.order(Traversal::BreadthFirst, &dist), vec![4, 0, 2, 1, 3]);
    }

    #[test]
    fn test_balanced_flips_subtrees() {
        let (points, dist) = line(&[5.0, 0.0, 6.0]);
        let tree = Dendrogram::build(&points, &dist, Linkage::Complete);
        // Merges (0,2) first, then appends 1 on the right; balanced puts it beside 0.
        assert_eq!(tree.order(Traversal::DepthFirst, &dist), vec![0, 2, 1]);
        assert_eq!(tree.order(Traversal::Balanced, &dist), vec![1, 0, 2]);
    }

    #[test]
    fn test_every_combination_is_a_permutation() {
        let (points, dist) = line(&[3.0, 9.0, 1.0, 4.0, 1.5, 9.2, 6.0]);
        for (linkage, traversal) in iproduct!(
            [Linkage::Single, Linkage::Complete, Linkage::Average],
            [Traversal::DepthFirst, Traversal::BreadthFirst, Traversal::Balanced]
        ) {
            let mut order = Dendrogram::build(&points, &dist, linkage).order(traversal, &dist);
            order.sort();
            assert_eq!(order, (0..7).collect::<Vec<_>>());
        }
    }
}
