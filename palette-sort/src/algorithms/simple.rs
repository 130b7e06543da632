//! Identity, lexicographic, banded polar, PCA and harmonize orderings.

use std::cmp::Ordering;
use std::sync::Arc;

use color_lib::palette_type::is_achromatic;
use color_lib::{Color, ColorSpace, Context, Delta, Vector, Weights};
use itertools::Itertools;

use super::ramp::{band, zone, CHROMA_STRATUM, HUE_BAND, LIGHTNESS_BAND};
use crate::error::RegistryError;
use crate::greedy::chain;
use crate::registry::{ints, names, Args, Family, Speed};
use crate::runner::{run, sorter, SortFn};

const POWER_ITERATIONS: usize = 100;

/// Total order on components with undefined values first.
fn nan_first(a: f64, b: f64) -> Ordering {
    b.is_nan().cmp(&a.is_nan()).then(a.total_cmp(&b))
}

/// Lexicographic order over the space's components. With `hue_first` the
/// hue component leads, otherwise it breaks ties last.
pub fn raw_order(vectors: &[Vector], space: ColorSpace, hue_first: bool) -> Vec<usize> {
    let dims = space.dims();
    let axes: Vec<usize> = match space.hue_index() {
        Some(h) if hue_first => std::iter::once(h).chain((0..dims).filter(|&a| a != h)).collect(),
        Some(h) => (0..dims).filter(|&a| a != h).chain(std::iter::once(h)).collect(),
        None => (0..dims).collect(),
    };
    (0..vectors.len())
        .sorted_by(|&a, &b| {
            axes.iter()
                .map(|&x| nan_first(vectors[a][x], vectors[b][x]))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        })
        .collect()
}

fn level(lightness: f64, bands: usize) -> i64 {
    ((lightness * bands as f64).floor() as i64).clamp(0, bands as i64 - 1)
}

/// Lightness bands; hue runs forward in even bands and backward in odd
/// ones, tracing a spiral up the OKLCH cylinder.
pub fn spiral_order(oklch: &[Vector], bands: usize) -> Vec<usize> {
    (0..oklch.len())
        .sorted_by_key(|&i| {
            let v = &oklch[i];
            let l = level(v[0], bands);
            if is_achromatic(v) {
                (l, 0, band(v[0], LIGHTNESS_BAND), 0, i)
            } else {
                let hue = band(v[2], HUE_BAND);
                let hue = if l % 2 == 0 { hue } else { -hue };
                (l, 1, hue, band(v[1], CHROMA_STRATUM), i)
            }
        })
        .collect()
}

/// Hue sectors around the OKLCH cylinder, achromatics first, each sector
/// bottom to top.
pub fn cylinder_order(oklch: &[Vector], sectors: usize) -> Vec<usize> {
    let width = 360.0 / sectors as f64;
    (0..oklch.len())
        .sorted_by_key(|&i| {
            let v = &oklch[i];
            let sector = if is_achromatic(v) {
                -1
            } else {
                zone(v[2], width, 0.0)
            };
            (sector, band(v[0], LIGHTNESS_BAND), band(v[1], CHROMA_STRATUM), i)
        })
        .collect()
}

fn mean_point(points: &[Vector]) -> Vector {
    let sum = points
        .iter()
        .fold(Vector::new(0.0, 0.0, 0.0), |acc, p| acc.add(&p.defined()));
    sum.scale(1.0 / points.len().max(1) as f64)
}

/// Dominant eigenvector of the 3×3 covariance by power iteration, signed so
/// its largest component is positive. `None` when the points do not spread.
pub fn principal_axis(points: &[Vector]) -> Option<Vector> {
    let mean = mean_point(points);
    let mut cov = [[0.0; 3]; 3];
    for p in points {
        let d = p.defined().sub(&mean);
        for (r, c) in (0..3).cartesian_product(0..3) {
            cov[r][c] += d[r] * d[c];
        }
    }
    let mut v = Vector::new(1.0, 1.0, 1.0).normalized()?;
    for _ in 0..POWER_ITERATIONS {
        let next = Vector::new(
            (0..3).map(|c| cov[0][c] * v[c]).sum(),
            (0..3).map(|c| cov[1][c] * v[c]).sum(),
            (0..3).map(|c| cov[2][c] * v[c]).sum(),
        );
        v = next.normalized()?;
    }
    let largest = (0..3).max_by(|&a, &b| v[a].abs().total_cmp(&v[b].abs())).unwrap_or(0);
    Some(if v[largest] < 0.0 { v.scale(-1.0) } else { v })
}

pub fn pca_order(points: &[Vector]) -> Vec<usize> {
    let Some(axis) = principal_axis(points) else {
        return (0..points.len()).collect();
    };
    let mean = mean_point(points);
    let projection: Vec<f64> = points.iter().map(|p| p.defined().sub(&mean).dot(&axis)).collect();
    (0..points.len())
        .sorted_by(|&a, &b| projection[a].total_cmp(&projection[b]).then(a.cmp(&b)))
        .collect()
}

fn build_identity(id: String, _args: Args) -> Result<SortFn, RegistryError> {
    Ok(Arc::new(move |colors: &[Color], ctx: &mut Context| {
        run(&id, ColorSpace::Rgb, false, colors, ctx, |input| (0..input.len()).collect())
    }))
}

fn build_raw(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let space = args.space(0)?;
    let hue_first = args.name(1)? == "hf";
    Ok(sorter(id, space, move |input| raw_order(&input.vectors, space, hue_first)))
}

fn build_spiral(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let bands = args.int(0)? as usize;
    Ok(sorter(id, ColorSpace::Oklch, move |input| spiral_order(&input.vectors, bands)))
}

fn build_cylinder(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let sectors = args.int(0)? as usize;
    Ok(sorter(id, ColorSpace::Oklch, move |input| {
        cylinder_order(&input.vectors, sectors)
    }))
}

fn build_pca(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let space = args.space(0)?;
    Ok(sorter(id, space, |input| pca_order(&input.vectors)))
}

/// Nearest-neighbor chain in CIELAB from the lightest or darkest color.
fn build_harmonize(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let bright = args.name(0)? == "bright";
    Ok(sorter(id, ColorSpace::Lab, move |input| {
        let lightness = |i: usize| input.vectors[i][0];
        let mut seed = 0;
        for i in 1..input.len() {
            let better = if bright {
                lightness(i) > lightness(seed)
            } else {
                lightness(i) < lightness(seed)
            };
            if better {
                seed = i;
            }
        }
        let dist = input.matrix(Delta::DeltaE2000(Weights::UNIT));
        chain(dist.len(), seed, |a, b| dist.get(a, b))
    }))
}

pub fn families() -> Vec<Family> {
    let spaces = names(&ColorSpace::ALL.map(|s| s.name()));
    vec![
        Family::new("NONE", Speed::Fast, build_identity),
        Family::new("RAW", Speed::Fast, build_raw)
            .param(spaces)
            .param(names(&["hf", "hl"])),
        Family::new("SPIRAL", Speed::Fast, build_spiral).param(ints(&[3, 5, 8])),
        Family::new("CYL", Speed::Fast, build_cylinder).param(ints(&[6, 12])),
        Family::new("PCA", Speed::Fast, build_pca)
            .param(names(&["rgb", "lab", "oklab"]))
            .valid(super::at_least_two),
        Family::new("HARM", Speed::Fast, build_harmonize).param(names(&["bright", "dark"])),
    ]
}
