//! Space-filling curve order.
//!
//! Each axis is normalized over the palette and quantized to 8 bits; the
//! bits are then interleaved most significant first as `(x << 2) | (y << 1) | z`
//! per level. There is no per-octant rotation, so the index is closer to a
//! Morton code than a true Hilbert curve. Stored orderings depend on this
//! exact index, so it must stay as is.

use color_lib::Vector;

use crate::error::RegistryError;
use crate::registry::{names, Args, Family, Speed};
use crate::runner::{sorter, SortFn};

const BITS: u32 = 8;

/// Quantizes each of the first three axes to `0..=255` over the palette's own range.
pub fn quantize(points: &[Vector]) -> Vec<[u32; 3]> {
    let mut low = [f64::INFINITY; 3];
    let mut high = [f64::NEG_INFINITY; 3];
    for p in points {
        let p = p.defined();
        for axis in 0..3 {
            low[axis] = low[axis].min(p[axis]);
            high[axis] = high[axis].max(p[axis]);
        }
    }
    let top = ((1 << BITS) - 1) as f64;
    points
        .iter()
        .map(|p| {
            let p = p.defined();
            let mut q = [0; 3];
            for axis in 0..3 {
                let range = high[axis] - low[axis];
                if range > f64::EPSILON {
                    q[axis] = ((p[axis] - low[axis]) / range * top).round() as u32;
                }
            }
            q
        })
        .collect()
}

/// 24-bit curve index of a quantized point.
pub fn curve_index([x, y, z]: [u32; 3]) -> u32 {
    (0..BITS).rev().fold(0, |index, bit| {
        let octant = ((x >> bit & 1) << 2) | ((y >> bit & 1) << 1) | (z >> bit & 1);
        (index << 3) | octant
    })
}

pub fn curve_order(points: &[Vector]) -> Vec<usize> {
    let keys: Vec<u32> = quantize(points).into_iter().map(curve_index).collect();
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (keys[i], i));
    order
}

fn build(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let space = args.space(0)?;
    Ok(sorter(id, space, |input| curve_order(&input.vectors)))
}

pub fn families() -> Vec<Family> {
    vec![Family::new("HILBERT", Speed::Fast, build).param(names(&["rgb", "oklab", "lab"]))]
}
