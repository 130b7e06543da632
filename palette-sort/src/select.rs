//! Picks sorting methods for unseen palettes by fingerprint similarity to
//! palettes whose best methods are known.

use color_lib::{color, Color, ColorSpace, Context};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SelectError;
use crate::fingerprint::{palette_fingerprint, Fingerprint};
use crate::metrics::mean_turn_angle;
use crate::registry::Registry;

pub const DEFAULT_TOP_N: usize = 15;

/// Averaged fingerprint of the palettes of one size a method won on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedEntry {
    pub mid: String,
    pub colors: usize,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub id: String,
    pub similarity: f64,
}

/// Trained entries for the largest color count not above `colors` that has
/// any, most similar first. Equal similarities keep corpus order.
pub fn rank(trained: &[TrainedEntry], fingerprint: &Fingerprint, colors: usize) -> Result<Vec<Selection>, SelectError> {
    let mut target = colors;
    let matches = loop {
        let matches = trained.iter().filter(|e| e.colors == target).collect_vec();
        if !matches.is_empty() {
            break matches;
        }
        if target == 0 {
            return Err(SelectError::NoTrainedData { colors });
        }
        target -= 1;
    };
    if target != colors {
        debug!(colors, target, "no trained entries of the exact size, fell back");
    }
    Ok(matches
        .into_iter()
        .map(|e| Selection {
            id: e.mid.clone(),
            similarity: fingerprint.similarity(&e.fingerprint),
        })
        .sorted_by(|a, b| b.similarity.total_cmp(&a.similarity))
        .unique_by(|s| s.id.clone())
        .collect())
}

/// The single most similar trained method.
pub fn select(trained: &[TrainedEntry], colors: &[Color], ctx: &mut Context) -> Result<Selection, SelectError> {
    let fingerprint = palette_fingerprint(colors, ctx)?;
    rank(trained, &fingerprint, colors.len())?
        .into_iter()
        .next()
        .ok_or(SelectError::NoCandidate)
}

/// Runs the `top_n` most similar methods and keeps the one whose output
/// turns least on average; similarity breaks ties.
pub fn select_multi(
    trained: &[TrainedEntry],
    registry: &Registry,
    colors: &[Color],
    ctx: &mut Context,
    top_n: usize,
) -> Result<Selection, SelectError> {
    let fingerprint = palette_fingerprint(colors, ctx)?;
    let candidates = rank(trained, &fingerprint, colors.len())?;
    let mut best: Option<(f64, Selection)> = None;
    for candidate in candidates.into_iter().take(top_n) {
        let Some(method) = registry.get(&candidate.id) else {
            warn!(method = %candidate.id, "trained method is not registered");
            continue;
        };
        if !method.is_valid(colors) {
            continue;
        }
        let sorted = match method.sort(colors, ctx) {
            Ok(sorted) => sorted,
            Err(e) => {
                warn!(method = %candidate.id, error = %e, "candidate failed");
                continue;
            }
        };
        let parsed = sorted
            .iter()
            .map(|c| color::parse(c))
            .collect::<Result<Vec<_>, _>>()
            .map_err(crate::SortError::from)?;
        let angle = mean_turn_angle(&ctx.vectors(&parsed, ColorSpace::Oklab));
        if best.as_ref().map_or(true, |(a, _)| angle < *a) {
            best = Some((angle, candidate));
        }
    }
    best.map(|(_, selection)| selection).ok_or(SelectError::NoCandidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::STANDARD;

    fn colors(xs: &[&str]) -> Vec<Color> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn palette() -> Vec<Color> {
        colors(&[
            "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
        ])
    }

    fn entry(mid: &str, colors: usize, fingerprint: Fingerprint) -> TrainedEntry {
        TrainedEntry {
            mid: mid.to_string(),
            colors,
            fingerprint,
        }
    }

    #[test]
    fn test_exact_fingerprint_match() {
        let mut ctx = Context::new();
        let fingerprint = palette_fingerprint(&palette(), &mut ctx).unwrap();
        let trained = vec![entry("NNA:[lab,2opt]", 8, fingerprint)];
        let selection = select(&trained, &palette(), &mut ctx).unwrap();
        assert_eq!(selection.id, "NNA:[lab,2opt]");
        assert!((selection.similarity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_falls_back_to_smaller_palettes() {
        let f = Fingerprint(vec![0.5; 7]);
        let trained = vec![
            entry("A", 5, Fingerprint(vec![0.5; 7])),
            entry("B", 6, Fingerprint(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])),
            entry("C", 6, Fingerprint(vec![0.4; 7])),
            entry("D", 9, Fingerprint(vec![0.5; 7])),
        ];
        let ranked = rank(&trained, &f, 8).unwrap();
        assert_eq!(ranked.iter().map(|s| s.id.as_str()).collect_vec(), vec!["C", "B"]);
    }

    #[test]
    fn test_no_trained_data() {
        let f = Fingerprint(vec![0.5; 7]);
        let trained = vec![entry("D", 9, f.clone())];
        assert_eq!(rank(&trained, &f, 8), Err(SelectError::NoTrainedData { colors: 8 }));
    }

    #[test]
    fn test_undefined_fingerprint_scores_zero() {
        let trained = vec![entry("A", 3, Fingerprint(vec![0.5; 7]))];
        let mut ctx = Context::new();
        let selection = select(&trained, &colors(&["#000000", "#ffffff", "#ff0000"]), &mut ctx).unwrap();
        assert_eq!(selection, Selection { id: "A".to_string(), similarity: 0.0 });
    }

    #[test]
    fn test_multi_prefers_smoother_output() {
        let mut ctx = Context::new();
        let fingerprint = palette_fingerprint(&palette(), &mut ctx).unwrap();
        let mut nearby = fingerprint.clone();
        nearby.0[0] += 0.3;
        let trained = vec![
            entry("NONE", 8, fingerprint.clone()),
            entry("NNA:[oklab,2opt]", 8, nearby.clone()),
            entry("MISSING", 8, fingerprint.clone()),
        ];

        let single = select(&trained, &palette(), &mut ctx).unwrap();
        assert_eq!(single.id, "NONE");
        assert!((single.similarity - 1.0).abs() < 1e-12);

        // The given order zigzags; the smoother, less similar method wins.
        let multi = select_multi(&trained, &STANDARD, &palette(), &mut ctx, DEFAULT_TOP_N).unwrap();
        assert_eq!(multi.id, "NNA:[oklab,2opt]");
        assert!(multi.similarity < 1.0);
        assert_eq!(multi.similarity, fingerprint.similarity(&nearby));
    }
}
