use std::collections::BTreeMap;

use palette_sort::{Fingerprint, TrainedEntry};
use tracing::info;

use crate::corpus::PaletteRecord;

/// Averages, per (method, palette size), the fingerprints of the palettes
/// where that method is among the best group. Palettes without a best group
/// or a fingerprint teach nothing.
pub fn train(results: &[PaletteRecord]) -> Vec<TrainedEntry> {
    let mut buckets: BTreeMap<(usize, &str), Vec<&Fingerprint>> = BTreeMap::new();
    for palette in results.iter().filter(|p| !p.gram.is_empty()) {
        let Some(best) = palette.best_group() else {
            continue;
        };
        for run in &best.methods {
            buckets
                .entry((palette.colors.len(), run.method.mid.as_str()))
                .or_default()
                .push(&palette.gram);
        }
    }
    let entries: Vec<TrainedEntry> = buckets
        .into_iter()
        .map(|((colors, mid), grams)| TrainedEntry {
            mid: mid.to_string(),
            colors,
            fingerprint: Fingerprint::average(grams),
        })
        .collect();
    info!(palettes = results.len(), entries = entries.len(), "trained");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{GroupRecord, MethodRef, MethodRun, MetricsRange, SortRecord};
    use palette_sort::MetricsEx;

    fn run(mid: &str, best: bool) -> MethodRun {
        MethodRun {
            index: 0,
            best,
            method: MethodRef { mid: mid.to_string() },
            time: 0.0,
        }
    }

    fn palette(size: usize, gram: Fingerprint, groups: Vec<Vec<MethodRun>>) -> PaletteRecord {
        PaletteRecord {
            key: String::new(),
            colors: vec!["#000000".to_string(); size],
            palette_type: None,
            gram,
            metrics_range: MetricsRange::default(),
            groups: groups
                .into_iter()
                .map(|methods| GroupRecord {
                    record: SortRecord {
                        colors: Vec::new(),
                        metrics: MetricsEx::default(),
                        quality: MetricsEx::default(),
                        score: 0.0,
                        best_distance: None,
                        best_distance_quality: None,
                    },
                    methods,
                })
                .collect(),
        }
    }

    #[test]
    fn test_averages_best_group_fingerprints() {
        let results = vec![
            palette(
                8,
                Fingerprint(vec![1.0; 7]),
                vec![vec![run("A", true), run("B", true)], vec![run("C", false)]],
            ),
            palette(8, Fingerprint(vec![3.0; 7]), vec![vec![run("A", true)]]),
            palette(5, Fingerprint(vec![2.0; 7]), vec![vec![run("A", true)]]),
            palette(8, Fingerprint::default(), vec![vec![run("D", true)]]),
            palette(8, Fingerprint(vec![9.0; 7]), vec![vec![run("E", false)]]),
        ];
        let trained = train(&results);
        let summary: Vec<(usize, &str, f64)> = trained
            .iter()
            .map(|e| (e.colors, e.mid.as_str(), e.fingerprint.0[0]))
            .collect();
        assert_eq!(summary, vec![(5, "A", 2.0), (8, "A", 2.0), (8, "B", 1.0)]);
    }
}
