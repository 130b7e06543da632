//! Graph nearest-neighbor traversal and its perceptually weighted variants.

use color_lib::delta::hue_difference;
use color_lib::palette_type::{adaptive_weights, classify};
use color_lib::{ColorSpace, Delta, Weights};
use itertools::Itertools;

use crate::error::RegistryError;
use crate::matrix::PairMatrix;
use crate::registry::{names, Args, Family, Speed};
use crate::runner::{sorter, SortFn, SortInput};
use crate::two_opt::two_opt;

/// Depth-first traversal from `start`. Each node ranks every other node by
/// distance once, then recurses into its nearest unvisited neighbor; when a
/// branch is exhausted the parent resumes with its next-nearest candidate.
pub fn depth_first(start: usize, dist: &PairMatrix<f64>) -> Vec<usize> {
    let n = dist.len();
    if n == 0 {
        return Vec::new();
    }
    let ranked = |u: usize| -> Vec<usize> {
        (0..n)
            .filter(|&v| v != u)
            .sorted_by(|&a, &b| dist.get(u, a).total_cmp(&dist.get(u, b)).then(a.cmp(&b)))
            .collect()
    };

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    visited[start] = true;
    order.push(start);
    let mut stack: Vec<(Vec<usize>, usize)> = vec![(ranked(start), 0)];
    while let Some((candidates, cursor)) = stack.last_mut() {
        while *cursor < candidates.len() && visited[candidates[*cursor]] {
            *cursor += 1;
        }
        if *cursor == candidates.len() {
            stack.pop();
            continue;
        }
        let next = candidates[*cursor];
        *cursor += 1;
        visited[next] = true;
        order.push(next);
        stack.push((ranked(next), 0));
    }
    order
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weighting {
    /// Each OKLCH channel normalized by its mean pairwise difference.
    Statistics,
    /// CIEDE2000 with the palette type's (Kl, Kc, Kh).
    PaletteType,
    /// Variance-derived weights over OKLCH.
    Adaptive,
    /// Adaptive with the hue weight raised by 0.5.
    AdaptiveHue,
}

impl Weighting {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "stat" => Some(Weighting::Statistics),
            "type" => Some(Weighting::PaletteType),
            "adapt" => Some(Weighting::Adaptive),
            "adapth" => Some(Weighting::AdaptiveHue),
            _ => None,
        }
    }

    pub fn space(&self) -> ColorSpace {
        match self {
            Weighting::PaletteType => ColorSpace::Lab,
            _ => ColorSpace::Oklch,
        }
    }

    /// The delta this weighting produces for one palette.
    pub fn delta(&self, input: &mut SortInput) -> Delta {
        match self {
            Weighting::Statistics => {
                let oklch = input.vectors_in(ColorSpace::Oklch);
                Delta::Normalized(mean_differences(&oklch))
            }
            Weighting::PaletteType => {
                let oklch = input.vectors_in(ColorSpace::Oklch);
                Delta::DeltaE2000(classify(&oklch).weights())
            }
            Weighting::Adaptive => Delta::WeightedLch(adaptive_weights(&input.vectors)),
            Weighting::AdaptiveHue => {
                let w = adaptive_weights(&input.vectors);
                Delta::WeightedLch(Weights::new(w.l, w.c, w.h + 0.5))
            }
        }
    }
}

/// Mean absolute pairwise difference per OKLCH channel, hue measured around the circle.
fn mean_differences(oklch: &[color_lib::Vector]) -> [f64; 3] {
    let mut sums = [0.0; 3];
    let mut pairs = 0usize;
    for (a, b) in oklch.iter().tuple_combinations() {
        sums[0] += (a[0] - b[0]).abs();
        sums[1] += (a[1] - b[1]).abs();
        sums[2] += hue_difference(a[2], b[2]);
        pairs += 1;
    }
    if pairs == 0 {
        return [1.0; 3];
    }
    sums.map(|s| s / pairs as f64)
}

fn refine(path: &mut Vec<usize>, dist: &PairMatrix<f64>, refinement: &str) {
    if refinement == "2opt" {
        two_opt(path, |a, b| dist.get(a, b));
    }
}

fn build_nna(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let space = args.space(0)?;
    let refinement = args.name(1)?;
    Ok(sorter(id, space, move |input| {
        let dist = input.default_matrix();
        let mut path = depth_first(0, &dist);
        refine(&mut path, &dist, refinement);
        path
    }))
}

fn build_weighted(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let weighting = Weighting::parse(args.name(0)?).ok_or(RegistryError::BadParam {
        family: "NNAW",
        index: 0,
        expected: "stat, type, adapt or adapth",
    })?;
    let refinement = args.name(1)?;
    Ok(sorter(id, weighting.space(), move |input| {
        let delta = weighting.delta(input);
        let dist = input.matrix(delta);
        let mut path = depth_first(0, &dist);
        refine(&mut path, &dist, refinement);
        path
    }))
}

pub fn families() -> Vec<Family> {
    vec![
        Family::new("NNA", Speed::Fast, build_nna)
            .param(names(&["rgb", "lab", "oklab", "oklch", "hsl"]))
            .param(names(&["none", "2opt"])),
        Family::new("NNAW", Speed::Medium, build_weighted)
            .param(names(&["stat", "type", "adapt", "adapth"]))
            .param(names(&["none", "2opt"])),
    ]
}
