//! Where tasks run.
//!
//! An [`Executor`] runs a batch of tasks and reports each completion to a
//! callback on the calling thread, one at a time. Completion order is
//! arbitrary but never concurrent, so the callback may mutate shared state
//! without locks.

use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use color_lib::{color, palette_type, Color, ColorSpace, Context, PaletteType};
use palette_sort::fingerprint::palette_fingerprint;
use palette_sort::{Fingerprint, MetricsEx, MetricsProvider, Registry, SortError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub enum Task {
    /// Sort with the registry method at `method`.
    Sort { method: usize, colors: Arc<[Color]> },
    PaletteType { colors: Arc<[Color]> },
    Fingerprint { colors: Arc<[Color]> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sorted {
    pub colors: Vec<Color>,
    pub metrics: MetricsEx,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    Sorted(Sorted),
    /// The method does not apply to this palette and was not invoked.
    Skipped,
    PaletteType(PaletteType),
    Fingerprint(Fingerprint),
}

pub type TaskResult = Result<TaskOutput, SortError>;

impl Task {
    pub fn colors(&self) -> &Arc<[Color]> {
        match self {
            Task::Sort { colors, .. } | Task::PaletteType { colors } | Task::Fingerprint { colors } => colors,
        }
    }
}

/// A [`Context`] that keeps color conversions across palettes but drops
/// its distance memo whenever the palette changes. Weighted deltas are
/// derived per palette, so their entries never hit again.
#[derive(Debug, Default)]
pub struct PaletteContext {
    palette: Option<Arc<[Color]>>,
    ctx: Context,
}

impl PaletteContext {
    pub fn for_task(&mut self, task: &Task) -> &mut Context {
        let colors = task.colors();
        if !self.palette.as_ref().is_some_and(|p| Arc::ptr_eq(p, colors)) {
            self.ctx.distances.clear();
            self.palette = Some(colors.clone());
        }
        &mut self.ctx
    }
}

/// What every task needs besides its own input.
#[derive(Clone, Copy)]
pub struct Worker<'a> {
    pub registry: &'a Registry,
    pub metrics: &'a dyn MetricsProvider,
}

impl Worker<'_> {
    pub fn execute(&self, task: &Task, ctx: &mut Context) -> TaskResult {
        match task {
            Task::Sort { method, colors } => {
                let method = self
                    .registry
                    .methods()
                    .get(*method)
                    .ok_or_else(|| SortError::UnknownMethod(method.to_string()))?;
                if !method.is_valid(colors) {
                    debug!(method = %method.id, colors = colors.len(), "skipped");
                    return Ok(TaskOutput::Skipped);
                }
                let start = Instant::now();
                let sorted = method.sort(colors, ctx)?;
                let elapsed = start.elapsed();
                let parsed = parse_all(&sorted)?;
                let metrics = self.metrics.metrics(&ctx.vectors(&parsed, ColorSpace::Oklab));
                Ok(TaskOutput::Sorted(Sorted {
                    colors: sorted,
                    metrics,
                    elapsed,
                }))
            }
            Task::PaletteType { colors } => {
                let parsed = parse_all(colors)?;
                let oklch = ctx.vectors(&parsed, ColorSpace::Oklch);
                Ok(TaskOutput::PaletteType(palette_type::classify(&oklch)))
            }
            Task::Fingerprint { colors } => Ok(TaskOutput::Fingerprint(palette_fingerprint(colors, ctx)?)),
        }
    }
}

fn parse_all(colors: &[Color]) -> Result<Vec<color::sRGB>, SortError> {
    Ok(colors
        .iter()
        .map(|c| color::parse(c))
        .collect::<Result<Vec<_>, _>>()?)
}

pub trait Executor {
    /// Runs every task, calling `on_complete(index, result)` once per task.
    fn execute_all(&self, worker: Worker, tasks: &[Task], on_complete: &mut dyn FnMut(usize, TaskResult));
}

/// Runs tasks on the calling thread in order.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute_all(&self, worker: Worker, tasks: &[Task], on_complete: &mut dyn FnMut(usize, TaskResult)) {
        let mut ctx = PaletteContext::default();
        for (i, task) in tasks.iter().enumerate() {
            on_complete(i, worker.execute(task, ctx.for_task(task)));
        }
    }
}

/// Fixed-size rayon pool. Each worker thread uses one [`PaletteContext`]
/// for the whole batch; completions travel back over a channel.
pub struct RayonExecutor {
    pool: ThreadPool,
}

impl RayonExecutor {
    /// `threads == 0` sizes the pool to the machine.
    pub fn new(threads: usize) -> Result<Self, PipelineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("palette-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Executor for RayonExecutor {
    fn execute_all(&self, worker: Worker, tasks: &[Task], on_complete: &mut dyn FnMut(usize, TaskResult)) {
        let (tx, rx) = mpsc::channel();
        // Slot `i` is only ever locked by pool thread `i`.
        let contexts: Vec<Mutex<PaletteContext>> = (0..self.threads()).map(|_| Mutex::default()).collect();
        let contexts = &contexts;
        self.pool.in_place_scope(|scope| {
            scope.spawn(move |_| {
                tasks.par_iter().enumerate().for_each_with(tx, |tx, (i, task)| {
                    let slot = rayon::current_thread_index().unwrap_or(0) % contexts.len();
                    let mut ctx = contexts[slot].lock().unwrap_or_else(PoisonError::into_inner);
                    let result = worker.execute(task, ctx.for_task(task));
                    drop(ctx);
                    // The receiver lives until every sender is gone.
                    let _ = tx.send((i, result));
                });
            });
            for (i, result) in rx {
                on_complete(i, result);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette_sort::{StandardMetrics, STANDARD};

    fn shared(xs: &[&str]) -> Arc<[Color]> {
        xs.iter().map(|s| s.to_string()).collect::<Vec<_>>().into()
    }

    fn tasks() -> Vec<Task> {
        let colors = shared(&["#ff0000", "#000000", "#ffffff", "#00ff00"]);
        let nna = STANDARD.position("NNA:[oklab,none]").unwrap();
        let ga = STANDARD.position("GA:[1d]").unwrap();
        vec![
            Task::Sort {
                method: nna,
                colors: colors.clone(),
            },
            Task::Sort {
                method: ga,
                colors: shared(&["#ff0000", "#000000"]),
            },
            Task::PaletteType {
                colors: colors.clone(),
            },
            Task::Fingerprint { colors },
            Task::Sort {
                method: nna,
                colors: shared(&["#ff0000", "oops"]),
            },
        ]
    }

    fn collect(executor: &dyn Executor) -> Vec<Option<TaskResult>> {
        let worker = Worker {
            registry: &STANDARD,
            metrics: &StandardMetrics,
        };
        let tasks = tasks();
        let mut results = vec![None; tasks.len()];
        executor.execute_all(worker, &tasks, &mut |i, result| {
            assert!(results[i].is_none());
            results[i] = Some(result);
        });
        results
    }

    #[test]
    fn test_inline_executor() {
        let results = collect(&InlineExecutor);
        match &results[0] {
            Some(Ok(TaskOutput::Sorted(sorted))) => {
                assert_eq!(sorted.colors.len(), 4);
                assert!(sorted.metrics.total_distance > 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(results[1], Some(Ok(TaskOutput::Skipped)));
        assert!(matches!(results[2], Some(Ok(TaskOutput::PaletteType(_)))));
        assert!(matches!(results[3], Some(Ok(TaskOutput::Fingerprint(_)))));
        assert!(matches!(results[4], Some(Err(SortError::Color(_)))));
    }

    #[test]
    fn test_distance_memo_reset_between_palettes() {
        let worker = Worker {
            registry: &STANDARD,
            metrics: &StandardMetrics,
        };
        let nna = STANDARD.position("NNAW:[type,none]").unwrap();
        let first = Task::Sort {
            method: nna,
            colors: shared(&["#ff0000", "#000000", "#ffffff", "#00ff00"]),
        };
        let second = Task::Sort {
            method: nna,
            colors: shared(&["#123456", "#654321", "#abcdef"]),
        };
        let mut ctx = PaletteContext::default();
        worker.execute(&first, ctx.for_task(&first)).unwrap();
        let distances = ctx.for_task(&first).distances.len();
        assert!(distances > 0);
        // Same palette again: memo kept.
        worker.execute(&first, ctx.for_task(&first)).unwrap();
        assert_eq!(ctx.for_task(&first).distances.len(), distances);
        let conversions = ctx.for_task(&first).conversions.len();
        assert!(ctx.for_task(&second).distances.is_empty());
        assert_eq!(ctx.for_task(&second).conversions.len(), conversions);
    }

    #[test]
    fn test_rayon_matches_inline() {
        let strip = |results: Vec<Option<TaskResult>>| {
            results
                .into_iter()
                .map(|r| match r {
                    Some(Ok(TaskOutput::Sorted(s))) => Some(Ok(TaskOutput::Sorted(Sorted {
                        elapsed: Duration::ZERO,
                        ..s
                    }))),
                    other => other,
                })
                .collect::<Vec<_>>()
        };
        let executor = RayonExecutor::new(2).unwrap();
        assert_eq!(executor.threads(), 2);
        assert_eq!(strip(collect(&executor)), strip(collect(&InlineExecutor)));
    }
}
