//! Genetic search over permutations.
//!
//! Candidates compare either on total path length alone, or on
//! (length, mean turn, max turn) in order with a 1% deadband per
//! objective. The deadband comparison is not transitive, so selection uses
//! linear scans and pairwise tournaments and never sorts a population.

use std::cmp::Ordering;

use color_lib::{ColorSpace, Delta, Vector, Weights};
use rand::Rng;
use tracing::trace;

use super::lehmer::Lehmer;
use crate::error::RegistryError;
use crate::greedy::chain;
use crate::matrix::PairMatrix;
use crate::metrics::turn_angles;
use crate::registry::{names, Args, Family, Speed};
use crate::runner::{sorter, SortFn};

pub const SEED: u32 = 1;
const ELITES: usize = 2;
const CROSSOVER_RATE: f64 = 0.9;
const MUTATION_RATE: f64 = 0.25;
const STAGNATION: usize = 40;
/// Upper bound on generations × population × genome length.
const BUDGET: usize = 400_000;
const DEADBAND: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Length,
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fitness {
    pub length: f64,
    pub mean_turn: f64,
    pub max_turn: f64,
}

impl Fitness {
    /// `Less` means `self` is the better candidate.
    pub fn compare(&self, other: &Fitness, objective: Objective) -> Ordering {
        if objective == Objective::Multi {
            let pairs = [
                (self.length, other.length),
                (self.mean_turn, other.mean_turn),
                (self.max_turn, other.max_turn),
            ];
            for (a, b) in pairs {
                let band = DEADBAND * (a + b).abs() / 2.0;
                if (a - b).abs() > band {
                    return a.total_cmp(&b);
                }
            }
        }
        self.length.total_cmp(&other.length)
    }
}

pub struct Genetic<'a> {
    dist: &'a PairMatrix<f64>,
    points: &'a [Vector],
    objective: Objective,
    rng: Lehmer,
}

impl<'a> Genetic<'a> {
    pub fn new(dist: &'a PairMatrix<f64>, points: &'a [Vector], objective: Objective) -> Self {
        Self {
            dist,
            points,
            objective,
            rng: Lehmer::new(SEED),
        }
    }

    pub fn fitness(&self, genome: &[usize]) -> Fitness {
        let (mean_turn, max_turn) = match self.objective {
            Objective::Length => (0.0, 0.0),
            Objective::Multi => {
                let path: Vec<Vector> = genome.iter().map(|&i| self.points[i]).collect();
                let turns = turn_angles(&path);
                let mean = if turns.is_empty() {
                    0.0
                } else {
                    turns.iter().sum::<f64>() / turns.len() as f64
                };
                (mean, turns.iter().copied().fold(0.0, f64::max))
            }
        };
        Fitness {
            length: self.dist.path_length(genome),
            mean_turn,
            max_turn,
        }
    }

    fn better(&self, a: &Fitness, b: &Fitness) -> bool {
        a.compare(b, self.objective) == Ordering::Less
    }

    /// Every rotation of `genome` and of its reversal; keeps the best.
    pub fn cheat(&self, genome: &mut Vec<usize>) {
        let n = genome.len();
        let mut best = genome.clone();
        let mut best_fitness = self.fitness(&best);
        let mut candidate = genome.clone();
        for reversed in [false, true] {
            if reversed {
                candidate.reverse();
            }
            for _ in 0..n {
                candidate.rotate_left(1);
                let fitness = self.fitness(&candidate);
                if self.better(&fitness, &best_fitness) {
                    best.clone_from(&candidate);
                    best_fitness = fitness;
                }
            }
        }
        *genome = best;
    }

    /// Order crossover: a slice of `first` in place, the rest in `second`'s order.
    fn crossover(&mut self, first: &[usize], second: &[usize]) -> Vec<usize> {
        let n = first.len();
        let a = self.rng.gen_range(0..n);
        let b = self.rng.gen_range(0..n);
        let (start, end) = (a.min(b), a.max(b));
        let mut taken = vec![false; n];
        let mut child = vec![usize::MAX; n];
        for i in start..=end {
            child[i] = first[i];
            taken[first[i]] = true;
        }
        let mut fill = second.iter().filter(|&&g| !taken[g]);
        for slot in child.iter_mut().filter(|s| **s == usize::MAX) {
            if let Some(&g) = fill.next() {
                *slot = g;
            }
        }
        child
    }

    fn mutate(&mut self, genome: &mut Vec<usize>) {
        let n = genome.len();
        match self.rng.gen_range(0..4) {
            0 => {
                let a = self.rng.gen_range(0..n);
                let b = self.rng.gen_range(0..n);
                genome.swap(a, b);
            }
            1 => genome.rotate_left(1),
            2 => genome.reverse(),
            _ => self.cheat(genome),
        }
    }

    fn tournament(&mut self, fitness: &[Fitness]) -> usize {
        let a = self.rng.gen_range(0..fitness.len());
        let b = self.rng.gen_range(0..fitness.len());
        if self.better(&fitness[b], &fitness[a]) {
            b
        } else {
            a
        }
    }

    /// Index of the best candidate not in `skip`.
    fn best_index(&self, fitness: &[Fitness], skip: &[usize]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for i in (0..fitness.len()).filter(|i| !skip.contains(i)) {
            if best.map_or(true, |b| self.better(&fitness[i], &fitness[b])) {
                best = Some(i);
            }
        }
        best
    }

    fn shuffled(&mut self, n: usize) -> Vec<usize> {
        let mut genome: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.rng.gen_range(0..=i);
            genome.swap(i, j);
        }
        genome
    }

    pub fn run(mut self) -> Vec<usize> {
        let n = self.points.len();
        if n < 3 {
            return (0..n).collect();
        }
        let population_size = n.clamp(10, 40) * 5;
        let generations = (BUDGET / (population_size * n)).clamp(20, 300);

        let mut population = vec![(0..n).collect(), chain(n, 0, |a, b| self.dist.get(a, b))];
        while population.len() < population_size {
            let genome = self.shuffled(n);
            population.push(genome);
        }
        let mut fitness: Vec<Fitness> = population.iter().map(|g| self.fitness(g)).collect();

        let mut best_index = self.best_index(&fitness, &[]).unwrap_or(0);
        let mut best = (population[best_index].clone(), fitness[best_index]);
        let mut stale = 0;
        for generation in 0..generations {
            let mut next: Vec<Vec<usize>> = Vec::with_capacity(population_size);
            let mut elites = Vec::with_capacity(ELITES);
            while elites.len() < ELITES {
                match self.best_index(&fitness, &elites) {
                    Some(i) => elites.push(i),
                    None => break,
                }
            }
            next.extend(elites.iter().map(|&i| population[i].clone()));
            while next.len() < population_size {
                let first = self.tournament(&fitness);
                let second = self.tournament(&fitness);
                let mut child = if self.rng.gen_bool(CROSSOVER_RATE) {
                    self.crossover(&population[first], &population[second])
                } else {
                    population[first].clone()
                };
                if self.rng.gen_bool(MUTATION_RATE) {
                    self.mutate(&mut child);
                }
                next.push(child);
            }
            population = next;
            fitness = population.iter().map(|g| self.fitness(g)).collect();

            best_index = self.best_index(&fitness, &[]).unwrap_or(0);
            if self.better(&fitness[best_index], &best.1) {
                best = (population[best_index].clone(), fitness[best_index]);
                stale = 0;
            } else {
                stale += 1;
                if stale >= STAGNATION {
                    trace!(generation, "genetic search stagnated");
                    break;
                }
            }
        }

        let mut genome = best.0;
        self.cheat(&mut genome);
        if genome[0] > genome[n - 1] {
            genome.reverse();
        }
        genome
    }
}

fn build(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let objective = match args.name(0)? {
        "1d" => Objective::Length,
        _ => Objective::Multi,
    };
    Ok(sorter(id, ColorSpace::Lab, move |input| {
        let dist = input.matrix(Delta::DeltaE2000(Weights::UNIT));
        let points: Vec<Vector> = input.vectors.iter().map(Vector::defined).collect();
        Genetic::new(&dist, &points, objective).run()
    }))
}

pub fn families() -> Vec<Family> {
    vec![Family::new("GA", Speed::Slow, build)
        .param(names(&["1d", "multi"]))
        .valid(super::at_least_three)]
}
