//! One greedy path-growing primitive shared by the nearest-neighbor,
//! momentum, ramp and harmonize families.
//!
//! A path starts from a seed and repeatedly takes the cheapest
//! (candidate, end) attachment. Single-ended growth only ever extends the
//! tail; double-ended growth considers both ends on every step.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Head,
    Tail,
}

pub trait Expansion {
    /// Cost of attaching `candidate` next to `at`, which currently sits at `end`.
    fn cost(&self, end: End, at: usize, candidate: usize) -> f64;

    /// Called once the cheapest attachment has been made.
    fn attached(&mut self, _end: End, _at: usize, _candidate: usize) {}
}

/// Plain nearest-neighbor cost from a distance function.
pub struct Nearest<F>(pub F);

impl<F: Fn(usize, usize) -> f64> Expansion for Nearest<F> {
    fn cost(&self, _end: End, at: usize, candidate: usize) -> f64 {
        (self.0)(at, candidate)
    }
}

/// Grows a path over `0..n` from `seed`. Ties go to the lowest candidate
/// index, and to the tail before the head. An empty seed starts at 0.
pub fn grow<E: Expansion>(n: usize, seed: &[usize], both_ends: bool, expansion: &mut E) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let mut used = vec![false; n];
    let mut path: VecDeque<usize> = VecDeque::with_capacity(n);
    for &s in seed {
        if !used[s] {
            used[s] = true;
            path.push_back(s);
        }
    }
    if path.is_empty() {
        used[0] = true;
        path.push_back(0);
    }
    let ends: &[End] = if both_ends {
        &[End::Tail, End::Head]
    } else {
        &[End::Tail]
    };

    while path.len() < n {
        let mut best: Option<(f64, End, usize, usize)> = None;
        for candidate in (0..n).filter(|&c| !used[c]) {
            for &end in ends {
                let at = match end {
                    End::Tail => path[path.len() - 1],
                    End::Head => path[0],
                };
                let cost = expansion.cost(end, at, candidate);
                if best.map_or(true, |(b, ..)| cost < b) {
                    best = Some((cost, end, at, candidate));
                }
            }
        }
        let Some((_, end, at, candidate)) = best else {
            // Every remaining cost was NaN; keep them in index order.
            path.extend((0..n).filter(|&c| !used[c]));
            break;
        };
        used[candidate] = true;
        match end {
            End::Tail => path.push_back(candidate),
            End::Head => path.push_front(candidate),
        }
        expansion.attached(end, at, candidate);
    }
    path.into_iter().collect()
}

/// Nearest-neighbor chain from `start` under `dist`.
pub fn chain(n: usize, start: usize, dist: impl Fn(usize, usize) -> f64) -> Vec<usize> {
    grow(n, &[start], false, &mut Nearest(dist))
}
