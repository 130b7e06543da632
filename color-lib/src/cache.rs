use std::collections::HashMap;

use crate::color::sRGB;
use crate::delta::Delta;
use crate::space::ColorSpace;
use crate::vector::Vector;

/// Lazily filled lookup from 8-bit colors to vectors, one table per space.
#[derive(Debug, Default)]
pub struct ConversionCache {
    data: HashMap<(sRGB, ColorSpace), Vector>,
}

impl ConversionCache {
    pub fn get(&mut self, c: &sRGB, space: ColorSpace) -> Vector {
        *self
            .data
            .entry((*c, space))
            .or_insert_with(|| space.to_vector(c))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Memoized pairwise distances. The key stores the pair in ascending order
/// so `(a, b)` and `(b, a)` share an entry.
#[derive(Debug, Default)]
pub struct DistanceCache {
    data: HashMap<(ColorSpace, u64, sRGB, sRGB), f64>,
}

impl DistanceCache {
    pub fn key(space: ColorSpace, delta: &Delta, a: &sRGB, b: &sRGB) -> (ColorSpace, u64, sRGB, sRGB) {
        let (lo, hi) = if a <= b { (*a, *b) } else { (*b, *a) };
        (space, delta.key(), lo, hi)
    }

    pub fn get_or_insert_with(
        &mut self,
        key: (ColorSpace, u64, sRGB, sRGB),
        f: impl FnOnce() -> f64,
    ) -> f64 {
        *self.data.entry(key).or_insert_with(f)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Per-worker memo state handed to every sort invocation.
#[derive(Debug, Default)]
pub struct Context {
    pub conversions: ConversionCache,
    pub distances: DistanceCache,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vectors(&mut self, colors: &[sRGB], space: ColorSpace) -> Vec<Vector> {
        colors
            .iter()
            .map(|c| self.conversions.get(c, space))
            .collect()
    }

    /// Distance between two colors, symmetric, memoized per (space, delta).
    pub fn distance(&mut self, space: ColorSpace, delta: &Delta, a: &sRGB, b: &sRGB) -> f64 {
        let va = self.conversions.get(a, space);
        let vb = self.conversions.get(b, space);
        let key = DistanceCache::key(space, delta, a, b);
        // Evaluate in key order so the cached value never depends on argument order.
        let (first, second) = if a <= b { (va, vb) } else { (vb, va) };
        self.distances
            .get_or_insert_with(key, || delta.distance(space, &first, &second))
    }
}
