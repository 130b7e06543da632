//! Runs every selected method over every palette and scores the results.
//!
//! One row per (palette, method). Rows whose outputs are identical merge
//! into a [`Group`]. When the last row of a palette completes, its groups
//! are scored against each other and a best group is chosen.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use color_lib::{Color, PaletteType};
use indicatif::ProgressBar;
use itertools::{iproduct, Itertools};
use palette_sort::metrics::Polarity;
use palette_sort::{Fingerprint, MetricsEx, MetricsProvider, Registry};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::corpus::{
    BaselineLookup, GroupRecord, MethodRef, MethodRun, MetricsRange, PaletteInput, PaletteRecord, SortRecord,
};
use crate::executor::{Executor, Sorted, Task, TaskOutput, TaskResult, Worker};

/// Where a palette's curated order comes from, if anywhere.
#[derive(Debug, Clone, Default)]
pub enum Baseline {
    #[default]
    None,
    Lookup(BaselineLookup),
    /// The palette's own input order.
    Original,
}

impl Baseline {
    fn order_for(&self, palette: &PaletteInput) -> Option<Vec<Color>> {
        match self {
            Baseline::None => None,
            Baseline::Lookup(lookup) => lookup.get(&palette.key).cloned(),
            Baseline::Original => Some(palette.colors.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub method: usize,
    pub elapsed: Duration,
}

/// Methods that produced the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub colors: Vec<Color>,
    pub metrics: MetricsEx,
    /// Per metric, 0 for the best value among the palette's groups and 1
    /// for the worst.
    pub quality: MetricsEx,
    /// Sum of qualities; lower is better.
    pub score: f64,
    pub best_distance: Option<f64>,
    pub best_distance_quality: Option<f64>,
    pub runs: Vec<Run>,
}

impl Group {
    fn new(sorted: Sorted, method: usize) -> Self {
        Group {
            colors: sorted.colors,
            metrics: sorted.metrics,
            quality: MetricsEx::default(),
            score: 0.0,
            best_distance: None,
            best_distance_quality: None,
            runs: vec![Run {
                method,
                elapsed: sorted.elapsed,
            }],
        }
    }
}

/// Accumulated results for one palette.
#[derive(Debug, Clone)]
pub struct PaletteState {
    pub key: String,
    pub colors: Vec<Color>,
    pub palette_type: Option<PaletteType>,
    pub gram: Fingerprint,
    pub baseline: Option<Vec<Color>>,
    pub groups: Vec<Group>,
    pub range: MetricsRange,
    /// Index into `groups`.
    pub best: Option<usize>,
    pub completed: usize,
    pub total: usize,
}

impl PaletteState {
    pub fn new(palette: PaletteInput, baseline: Option<Vec<Color>>, total: usize) -> Self {
        PaletteState {
            key: palette.key,
            colors: palette.colors,
            palette_type: None,
            gram: Fingerprint::default(),
            baseline,
            groups: Vec::new(),
            range: MetricsRange::default(),
            best: None,
            completed: 0,
            total,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// Adds a finished row, merging it into the group with the same order.
    pub fn add(&mut self, method: usize, sorted: Sorted) {
        match self.groups.iter_mut().find(|g| g.colors == sorted.colors) {
            Some(group) => group.runs.push(Run {
                method,
                elapsed: sorted.elapsed,
            }),
            None => self.groups.push(Group::new(sorted, method)),
        }
    }

    /// Marks `group` best, clearing any previous choice.
    pub fn set_best(&mut self, group: usize) {
        if group < self.groups.len() {
            self.best = Some(group);
        }
    }

    /// Scores groups against each other and picks the best one.
    pub fn finalize(&mut self) {
        self.range = metric_range(&self.groups);
        let (min, max) = (self.range.min.values(), self.range.max.values());
        for group in &mut self.groups {
            let values = group.metrics.values();
            let mut quality = [0.0; MetricsEx::COUNT];
            for (i, q) in quality.iter_mut().enumerate() {
                *q = interpolate(values[i], min[i], max[i], MetricsEx::POLARITY[i]);
            }
            group.quality = MetricsEx::from_values(quality);
            group.score = quality.iter().sum();
        }

        if let Some(baseline) = &self.baseline {
            let distances = self
                .groups
                .iter()
                .map(|g| order_distance(&g.colors, baseline))
                .collect_vec();
            let widest = distances.iter().copied().fold(0.0, f64::max);
            for (group, d) in self.groups.iter_mut().zip(distances) {
                group.best_distance = Some(d);
                group.best_distance_quality = Some(if widest > 0.0 { d / widest } else { 0.0 });
            }
        }

        let best = (0..self.groups.len()).min_by(|&a, &b| {
            let (a, b) = (&self.groups[a], &self.groups[b]);
            let by_distance = match (a.best_distance, b.best_distance) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => std::cmp::Ordering::Equal,
            };
            by_distance.then(a.score.total_cmp(&b.score))
        });
        if let Some(best) = best {
            self.set_best(best);
        }
        debug!(palette = %self.key, groups = self.groups.len(), best = ?self.best, "scored");
    }

    /// Serializable view with per-run best flags derived from `best`.
    pub fn to_record(&self, registry: &Registry) -> PaletteRecord {
        let mid = |i: usize| registry.methods().get(i).map_or_else(String::new, |m| m.id.clone());
        PaletteRecord {
            key: self.key.clone(),
            colors: self.colors.clone(),
            palette_type: self.palette_type.map(|t| t.name().to_string()),
            gram: self.gram.clone(),
            metrics_range: self.range,
            groups: self
                .groups
                .iter()
                .enumerate()
                .map(|(g, group)| GroupRecord {
                    record: SortRecord {
                        colors: group.colors.clone(),
                        metrics: group.metrics,
                        quality: group.quality,
                        score: group.score,
                        best_distance: group.best_distance,
                        best_distance_quality: group.best_distance_quality,
                    },
                    methods: group
                        .runs
                        .iter()
                        .map(|run| MethodRun {
                            index: run.method,
                            best: self.best == Some(g),
                            method: MethodRef { mid: mid(run.method) },
                            time: run.elapsed.as_secs_f64() * 1000.0,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Per-metric minimum and maximum over `groups`.
pub fn metric_range(groups: &[Group]) -> MetricsRange {
    if groups.is_empty() {
        return MetricsRange::default();
    }
    let mut min = [f64::INFINITY; MetricsEx::COUNT];
    let mut max = [f64::NEG_INFINITY; MetricsEx::COUNT];
    for group in groups {
        for (i, v) in group.metrics.values().into_iter().enumerate() {
            min[i] = min[i].min(v);
            max[i] = max[i].max(v);
        }
    }
    MetricsRange {
        min: MetricsEx::from_values(min),
        max: MetricsEx::from_values(max),
    }
}

/// Position of `value` in `[min, max]` mapped so 0 is the better end.
/// A zero-width range maps to 0.
pub fn interpolate(value: f64, min: f64, max: f64, polarity: Polarity) -> f64 {
    let width = max - min;
    if !(width > f64::EPSILON) || !value.is_finite() {
        return 0.0;
    }
    let t = match polarity {
        Polarity::Low => (value - min) / width,
        Polarity::High => (max - value) / width,
    };
    t.clamp(0.0, 1.0)
}

/// Levenshtein distance between two symbol sequences.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitute = previous[j] + usize::from(x != y);
            current[j + 1] = substitute.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Edit distance between two orders, one symbol per distinct color,
/// divided by the longer length.
pub fn order_distance(order: &[Color], baseline: &[Color]) -> f64 {
    let len = order.len().max(baseline.len());
    if len == 0 {
        return 0.0;
    }
    let mut symbols: HashMap<String, usize> = HashMap::new();
    let mut encode = |colors: &[Color]| -> Vec<usize> {
        colors
            .iter()
            .map(|c| {
                let key = c.trim().trim_start_matches('#').to_ascii_lowercase();
                let next = symbols.len();
                *symbols.entry(key).or_insert(next)
            })
            .collect()
    };
    let a = encode(order);
    let b = encode(baseline);
    edit_distance(&a, &b) as f64 / len as f64
}

pub struct Pipeline<'a> {
    registry: &'a Registry,
    metrics: &'a dyn MetricsProvider,
    methods: Vec<usize>,
}

impl<'a> Pipeline<'a> {
    pub fn new(registry: &'a Registry, metrics: &'a dyn MetricsProvider) -> Self {
        Self {
            registry,
            metrics,
            methods: (0..registry.len()).collect(),
        }
    }

    /// Restricts the run to methods whose id matches `pattern`.
    pub fn with_filter(mut self, pattern: &Regex) -> Self {
        self.methods = self.registry.matching(pattern);
        self
    }

    pub fn methods(&self) -> &[usize] {
        &self.methods
    }

    /// Number of sort rows `palettes` would produce.
    pub fn row_count(&self, palettes: usize) -> usize {
        palettes * self.methods.len()
    }

    pub fn compute(
        &self,
        palettes: Vec<PaletteInput>,
        baseline: &Baseline,
        executor: &dyn Executor,
        progress: &ProgressBar,
    ) -> Vec<PaletteState> {
        let mut states = palettes
            .into_iter()
            .map(|p| {
                let order = baseline.order_for(&p);
                PaletteState::new(p, order, self.methods.len())
            })
            .collect_vec();
        let shared: Vec<Arc<[Color]>> = states.iter().map(|s| Arc::from(s.colors.as_slice())).collect();

        let mut tasks = Vec::new();
        let mut owners = Vec::new();
        for (p, colors) in shared.iter().enumerate() {
            tasks.push(Task::PaletteType {
                colors: colors.clone(),
            });
            tasks.push(Task::Fingerprint {
                colors: colors.clone(),
            });
            owners.extend([p, p]);
        }
        let methods = self.registry.methods();
        let rows = iproduct!(0..shared.len(), self.methods.iter().copied())
            .sorted_by_key(|&(p, m)| (Reverse(methods[m].speed), p, m));
        for (p, m) in rows {
            tasks.push(Task::Sort {
                method: m,
                colors: shared[p].clone(),
            });
            owners.push(p);
        }
        info!(
            palettes = states.len(),
            methods = self.methods.len(),
            tasks = tasks.len(),
            "dispatching"
        );

        let worker = Worker {
            registry: self.registry,
            metrics: self.metrics,
        };
        executor.execute_all(worker, &tasks, &mut |i, result: TaskResult| {
            let state = &mut states[owners[i]];
            match (&tasks[i], result) {
                (Task::Sort { method, .. }, result) => {
                    match result {
                        Ok(TaskOutput::Sorted(sorted)) => state.add(*method, sorted),
                        Ok(_) => {}
                        Err(e) => warn!(palette = %state.key, method = %methods[*method].id, error = %e, "row failed"),
                    }
                    state.completed += 1;
                    progress.inc(1);
                    if state.completed == state.total {
                        state.finalize();
                    }
                }
                (_, Ok(TaskOutput::PaletteType(t))) => state.palette_type = Some(t),
                (_, Ok(TaskOutput::Fingerprint(f))) => state.gram = f,
                (_, Ok(_)) => {}
                (_, Err(e)) => warn!(palette = %state.key, error = %e, "palette analysis failed"),
            }
        });

        for state in states.iter_mut().filter(|s| s.total == 0) {
            state.finalize();
        }
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use approx::assert_abs_diff_eq;
    use palette_sort::{StandardMetrics, STANDARD};

    fn colors(xs: &[&str]) -> Vec<Color> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn group(order: &[&str], total_distance: f64, end_contrast: f64) -> Group {
        Group::new(
            Sorted {
                colors: colors(order),
                metrics: MetricsEx {
                    total_distance,
                    end_contrast,
                    ..Default::default()
                },
                elapsed: Duration::from_millis(2),
            },
            0,
        )
    }

    #[test]
    fn test_interpolate_respects_polarity() {
        assert_eq!(interpolate(1.0, 1.0, 3.0, Polarity::Low), 0.0);
        assert_eq!(interpolate(3.0, 1.0, 3.0, Polarity::Low), 1.0);
        assert_eq!(interpolate(3.0, 1.0, 3.0, Polarity::High), 0.0);
        assert_eq!(interpolate(1.0, 1.0, 3.0, Polarity::High), 1.0);
        assert_eq!(interpolate(2.0, 2.0, 2.0, Polarity::Low), 0.0);
        assert_eq!(interpolate(f64::NAN, 0.0, 1.0, Polarity::Low), 0.0);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance(b"kitten", b"sitting"), 3);
        assert_eq!(edit_distance::<u8>(b"", b"abc"), 3);
        assert_eq!(order_distance(&colors(&["#AA0000", "#00aa00"]), &colors(&["aa0000", "#00AA00"])), 0.0);
        assert_eq!(
            order_distance(&colors(&["#a", "#b", "#c", "#d"]), &colors(&["#d", "#b", "#c", "#a"])),
            0.5
        );
    }

    #[test]
    fn test_finalize_scores_and_picks_lowest() {
        let mut state = PaletteState::new(
            PaletteInput {
                key: "p".to_string(),
                colors: colors(&["#000000", "#ffffff"]),
            },
            None,
            2,
        );
        state.groups = vec![group(&["#ffffff", "#000000"], 2.0, 0.5), group(&["#000000", "#ffffff"], 1.0, 1.0)];
        state.finalize();
        assert_eq!(state.best, Some(1));
        assert_eq!(state.groups[0].quality.total_distance, 1.0);
        assert_eq!(state.groups[0].quality.end_contrast, 1.0);
        assert_eq!(state.groups[1].score, 0.0);
        assert_eq!(state.groups[0].quality.mean_angle, 0.0);
        assert_eq!(state.range.max.total_distance, 2.0);
    }

    #[test]
    fn test_baseline_distance_decides_best() {
        let mut state = PaletteState::new(
            PaletteInput {
                key: "p".to_string(),
                colors: colors(&["#000000", "#808080", "#ffffff"]),
            },
            Some(colors(&["#ffffff", "#808080", "#000000"])),
            2,
        );
        state.groups = vec![
            group(&["#000000", "#808080", "#ffffff"], 1.0, 1.0),
            group(&["#ffffff", "#808080", "#000000"], 5.0, 0.1),
        ];
        state.finalize();
        assert_eq!(state.best, Some(1));
        assert_eq!(state.groups[1].best_distance, Some(0.0));
        assert_abs_diff_eq!(state.groups[0].best_distance.unwrap(), 2.0 / 3.0);
        assert_eq!(state.groups[0].best_distance_quality, Some(1.0));
        let record = state.to_record(&STANDARD);
        let flags = record.groups.iter().map(|g| g.methods[0].best).collect_vec();
        assert_eq!(flags, vec![false, true]);
        state.set_best(0);
        let record = state.to_record(&STANDARD);
        assert_eq!(record.groups.iter().filter(|g| g.methods[0].best).count(), 1);
        assert!(record.groups[0].methods[0].best);
    }

    #[test]
    fn test_compute_merges_identical_orders() {
        let pattern = Regex::new(r"^(NONE|NNA:\[oklab,.*|HARM:.*)$").unwrap();
        let pipeline = Pipeline::new(&STANDARD, &StandardMetrics).with_filter(&pattern);
        assert_eq!(pipeline.methods().len(), 5);
        let palettes = vec![
            PaletteInput {
                key: "gray".to_string(),
                colors: colors(&["#808080", "#000000", "#ffffff", "#404040"]),
            },
            PaletteInput {
                key: "bad".to_string(),
                colors: colors(&["#808080", "nope"]),
            },
        ];
        let states = pipeline.compute(palettes, &Baseline::Original, &InlineExecutor, &ProgressBar::hidden());
        let gray = &states[0];
        assert_eq!(gray.completed, 5);
        assert!(gray.is_complete());
        let runs: usize = gray.groups.iter().map(|g| g.runs.len()).sum();
        assert_eq!(runs, 5);
        assert!(gray.groups.len() < 5);
        // NONE reproduces the input, which is the baseline.
        let best = &gray.groups[gray.best.unwrap()];
        assert_eq!(best.best_distance, Some(0.0));
        assert!(gray.palette_type.is_some());
        for group in &gray.groups {
            assert!(group.quality.values().iter().all(|q| (0.0..=1.0).contains(q)));
        }

        let bad = &states[1];
        assert_eq!(bad.completed, 5);
        assert!(bad.groups.is_empty());
        assert_eq!(bad.best, None);
        assert!(bad.palette_type.is_none());
    }
}
