//! Bridges palette colors and the index-based algorithms.
//!
//! Every invocation parses the caller's colors, optionally puts them in a
//! canonical order, converts them to vectors through the caller's
//! [`Context`], and hands the algorithm plain indices. Duplicate colors stay
//! distinct because they occupy distinct indices; the algorithm's
//! permutation is mapped back onto the caller's original strings.

use std::sync::Arc;
use std::time::Instant;

use color_lib::color::{self, sRGB};
use color_lib::{Color, ColorSpace, Context, Delta, Vector};
use tracing::debug;

use crate::error::SortError;
use crate::matrix::PairMatrix;

pub type SortFn = Arc<dyn Fn(&[Color], &mut Context) -> Result<Vec<Color>, SortError> + Send + Sync>;

/// What an algorithm sees: colors in canonical order and their vectors in
/// the space the method asked for.
pub struct SortInput<'a> {
    pub space: ColorSpace,
    pub colors: Vec<sRGB>,
    pub vectors: Vec<Vector>,
    ctx: &'a mut Context,
}

impl<'a> SortInput<'a> {
    pub fn new(space: ColorSpace, colors: Vec<sRGB>, ctx: &'a mut Context) -> Self {
        let vectors = ctx.vectors(&colors, space);
        Self {
            space,
            colors,
            vectors,
            ctx,
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The same colors in another space.
    pub fn vectors_in(&mut self, space: ColorSpace) -> Vec<Vector> {
        self.ctx.vectors(&self.colors, space)
    }

    /// All pairwise distances under `delta`, through the context's memo.
    pub fn matrix(&mut self, delta: Delta) -> PairMatrix<f64> {
        let space = self.space;
        let colors = &self.colors;
        let ctx = &mut *self.ctx;
        PairMatrix::new_populated(colors.len(), |i, j| {
            ctx.distance(space, &delta, &colors[i], &colors[j])
        })
    }

    pub fn default_matrix(&mut self) -> PairMatrix<f64> {
        self.matrix(Delta::for_space(self.space))
    }
}

/// Runs `algorithm` over `colors`. With `canonical` set the algorithm sees
/// the colors sorted by value, so its answer cannot depend on input order.
pub fn run<F>(
    id: &str,
    space: ColorSpace,
    canonical: bool,
    colors: &[Color],
    ctx: &mut Context,
    algorithm: F,
) -> Result<Vec<Color>, SortError>
where
    F: FnOnce(&mut SortInput) -> Vec<usize>,
{
    let parsed = colors
        .iter()
        .map(|c| color::parse(c))
        .collect::<Result<Vec<_>, _>>()?;
    let mut order: Vec<usize> = (0..colors.len()).collect();
    if canonical {
        order.sort_by(|&a, &b| {
            parsed[a]
                .cmp(&parsed[b])
                .then_with(|| colors[a].cmp(&colors[b]))
                .then(a.cmp(&b))
        });
    }
    if colors.len() <= 1 {
        return Ok(colors.to_vec());
    }

    let start = Instant::now();
    let mut input = SortInput::new(space, order.iter().map(|&i| parsed[i]).collect(), ctx);
    let permutation = algorithm(&mut input);
    if !is_permutation(&permutation, colors.len()) {
        return Err(SortError::NotAPermutation {
            method: id.to_string(),
        });
    }
    debug!(method = id, colors = colors.len(), elapsed = ?start.elapsed(), "sorted");
    Ok(permutation
        .iter()
        .map(|&p| colors[order[p]].clone())
        .collect())
}

/// Wraps an index-level algorithm as a method body working in `space`.
pub fn sorter<F>(id: String, space: ColorSpace, algorithm: F) -> SortFn
where
    F: Fn(&mut SortInput) -> Vec<usize> + Send + Sync + 'static,
{
    Arc::new(move |colors: &[Color], ctx: &mut Context| {
        run(&id, space, true, colors, ctx, &algorithm)
    })
}

pub fn is_permutation(p: &[usize], n: usize) -> bool {
    if p.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &i in p {
        if i >= n || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(xs: &[&str]) -> Vec<Color> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicates_keep_their_strings() {
        let input = colors(&["#ff0000", "#00FF00", "#FF0000", "#0000ff"]);
        let mut ctx = Context::new();
        let out = run("REV", ColorSpace::Rgb, true, &input, &mut ctx, |inp| {
            (0..inp.len()).rev().collect()
        })
        .unwrap();
        assert_eq!(out, colors(&["#ff0000", "#FF0000", "#00FF00", "#0000ff"]));
    }

    #[test]
    fn test_bad_permutation_is_an_error() {
        let input = colors(&["#000000", "#ffffff"]);
        let mut ctx = Context::new();
        let err = run("BAD", ColorSpace::Rgb, true, &input, &mut ctx, |_| vec![0, 0]).unwrap_err();
        assert_eq!(
            err,
            SortError::NotAPermutation {
                method: "BAD".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_color_aborts() {
        let input = colors(&["#000000", "nope"]);
        let mut ctx = Context::new();
        assert!(run("X", ColorSpace::Rgb, true, &input, &mut ctx, |inp| (0..inp.len()).collect()).is_err());
    }

    #[test]
    fn test_matrix_uses_context_memo() {
        let parsed = vec![[0, 0, 0], [10, 10, 10], [255, 255, 255]];
        let mut ctx = Context::new();
        let mut input = SortInput::new(ColorSpace::Rgb, parsed, &mut ctx);
        let m = input.matrix(Delta::Euclidean);
        assert!((m.get(0, 1) - 300f64.sqrt()).abs() < 1e-9);
        drop(input);
        assert_eq!(ctx.distances.len(), 3);
    }
}
