//! Hue-band ("ramp") orderings over OKLCH.
//!
//! Achromatic colors always come first, darkest to lightest. Chromatic
//! colors are grouped by hue and each group is laid out as a lightness
//! ramp. Floating-point keys are compared through fixed-width bands so that
//! jitter below the band width cannot reorder colors.

use std::collections::BTreeMap;

use color_lib::delta::hue_difference;
use color_lib::palette_type::is_achromatic;
use color_lib::stats::circular_mean;
use color_lib::{ColorSpace, Delta, Vector, Weights};
use itertools::Itertools;

use super::kmeans::estimate_k;
use crate::error::RegistryError;
use crate::greedy::chain;
use crate::registry::{floats, ints, names, Args, Family, Speed};
use crate::runner::{sorter, SortFn};

pub const LIGHTNESS_BAND: f64 = 0.01;
pub const CHROMA_STRATUM: f64 = 0.05;
pub const HUE_BAND: f64 = 1.0;
pub const HISTOGRAM_BINS: usize = 12;
pub const DEFAULT_RAMPS: usize = 3;
pub const MAX_RAMPS: usize = 8;

/// Index of the band `x` falls in.
pub fn band(x: f64, width: f64) -> i64 {
    (x / width).floor() as i64
}

fn lightness_key(v: &Vector) -> i64 {
    band(v[0], LIGHTNESS_BAND)
}

/// Splits indices into achromatic (sorted darkest first) and chromatic.
pub fn split(oklch: &[Vector]) -> (Vec<usize>, Vec<usize>) {
    let (mut achromatic, chromatic): (Vec<usize>, Vec<usize>) =
        (0..oklch.len()).partition(|&i| is_achromatic(&oklch[i]));
    by_lightness(oklch, &mut achromatic);
    (achromatic, chromatic)
}

pub fn by_lightness(oklch: &[Vector], members: &mut [usize]) {
    members.sort_by_key(|&i| (lightness_key(&oklch[i]), i));
}

/// Hue zone of `h` for zones `width` degrees wide, rotated by `offset`.
pub fn zone(h: f64, width: f64, offset: f64) -> i64 {
    band((h - offset).rem_euclid(360.0), width)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secondary {
    ChromaThenLightness,
    LightnessThenChroma,
}

/// Achromatics, then chromatic colors by zone and the secondary keys.
pub fn zoned(oklch: &[Vector], width: f64, offset: f64, deadband: f64, secondary: Secondary) -> Vec<usize> {
    let (mut order, mut chromatic) = split(oklch);
    chromatic.sort_by_key(|&i| {
        let v = &oklch[i];
        let chroma = band(v[1], deadband);
        let lightness = band(v[0], deadband);
        let (first, second) = match secondary {
            Secondary::ChromaThenLightness => (chroma, lightness),
            Secondary::LightnessThenChroma => (lightness, chroma),
        };
        (zone(v[2], width, offset), first, second, i)
    });
    order.extend(chromatic);
    order
}

/// Chromatic colors grouped wherever consecutive sorted hues are more
/// than `gap` degrees apart. Walking starts just after the largest gap, so
/// a group straddling 0° stays whole.
pub fn hue_clusters(oklch: &[Vector], chromatic: &[usize], gap: f64) -> Vec<Vec<usize>> {
    let sorted = chromatic
        .iter()
        .copied()
        .sorted_by(|&a, &b| oklch[a][2].total_cmp(&oklch[b][2]).then(a.cmp(&b)))
        .collect_vec();
    let m = sorted.len();
    if m == 0 {
        return Vec::new();
    }
    let hue = |k: usize| oklch[sorted[k]][2];
    // gap_before[k] is the distance from the previous hue to hue k.
    let gap_before = (0..m)
        .map(|k| {
            if k == 0 {
                360.0 - hue(m - 1) + hue(0)
            } else {
                hue(k) - hue(k - 1)
            }
        })
        .collect_vec();
    let widest = gap_before.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let start = gap_before.iter().position(|&g| g == widest).unwrap_or(0);

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    for step in 0..m {
        let k = (start + step) % m;
        if step == 0 || gap_before[k] > gap {
            clusters.push(Vec::new());
        }
        if let Some(cluster) = clusters.last_mut() {
            cluster.push(sorted[k]);
        }
    }
    clusters
}

/// Zones `360 / zones` wide, alternating ramp direction between successive
/// occupied zones so each ramp ends near where the next begins.
pub fn serpentine(oklch: &[Vector], zones: usize) -> Vec<usize> {
    let (mut order, chromatic) = split(oklch);
    let width = 360.0 / zones as f64;
    let mut by_zone: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for i in chromatic {
        by_zone.entry(zone(oklch[i][2], width, 0.0)).or_default().push(i);
    }
    for (position, mut members) in by_zone.into_values().enumerate() {
        by_lightness(oklch, &mut members);
        if position % 2 == 1 {
            members.reverse();
        }
        order.extend(members);
    }
    order
}

/// Lightness bands first; within a band, achromatics then colors by hue.
pub fn lightness_bands(oklch: &[Vector], bands: usize) -> Vec<usize> {
    let top = bands as i64 - 1;
    let mut order: Vec<usize> = (0..oklch.len()).collect();
    order.sort_by_key(|&i| {
        let v = &oklch[i];
        let level = ((v[0] * bands as f64).floor() as i64).clamp(0, top);
        if is_achromatic(v) {
            (level, 0, lightness_key(v), 0, i)
        } else {
            (level, 1, band(v[2], HUE_BAND), band(v[1], CHROMA_STRATUM), i)
        }
    });
    order
}

/// Seeds `k` ramps with the lightest colors, then gives each remaining
/// color, darkest first, to the ramp whose hue trend it best continues.
pub fn multi_ramp(oklch: &[Vector], k: usize) -> Vec<Vec<usize>> {
    let n = oklch.len();
    if n == 0 {
        return Vec::new();
    }
    let k = k.clamp(1, n);
    let lightest = (0..n)
        .sorted_by(|&a, &b| oklch[b][0].total_cmp(&oklch[a][0]).then(a.cmp(&b)))
        .collect_vec();
    let mut ramps: Vec<Vec<usize>> = lightest[..k].iter().map(|&i| vec![i]).collect();
    let rest = lightest[k..]
        .iter()
        .copied()
        .sorted_by(|&a, &b| oklch[a][0].total_cmp(&oklch[b][0]).then(a.cmp(&b)));
    for c in rest {
        let mut best = 0;
        let mut best_cost = f64::INFINITY;
        for (r, ramp) in ramps.iter().enumerate() {
            let cost = continuation_cost(oklch, ramp, c);
            if cost < best_cost {
                best = r;
                best_cost = cost;
            }
        }
        ramps[best].push(c);
    }
    ramps
}

/// Hue miss against the ramp's linear extrapolation, plus lightness step.
fn continuation_cost(oklch: &[Vector], ramp: &[usize], candidate: usize) -> f64 {
    let Some(&last) = ramp.last() else {
        return f64::INFINITY;
    };
    let h_last = oklch[last][2];
    let predicted = match ramp.len().checked_sub(2).map(|p| oklch[ramp[p]][2]) {
        Some(h_prev) if !h_prev.is_nan() && !h_last.is_nan() => {
            let trend = (h_last - h_prev + 540.0).rem_euclid(360.0) - 180.0;
            (h_last + trend).rem_euclid(360.0)
        }
        _ => h_last,
    };
    let c = &oklch[candidate];
    hue_difference(predicted, c[2]) / 180.0 + (oklch[last][0] - c[0]).abs()
}

/// Ramps by circular mean hue (achromatic-only ramps first), each dark to light.
pub fn ramp_order(oklch: &[Vector], ramps: Vec<Vec<usize>>) -> Vec<usize> {
    let mean_hue = |ramp: &[usize]| -> f64 {
        let hues = ramp
            .iter()
            .filter(|&&i| !is_achromatic(&oklch[i]))
            .map(|&i| oklch[i][2])
            .collect_vec();
        if hues.is_empty() {
            f64::NAN
        } else {
            circular_mean(&hues)
        }
    };
    ramps
        .into_iter()
        .enumerate()
        .map(|(r, ramp)| (mean_hue(&ramp), r, ramp))
        .sorted_by(|a, b| {
            b.0.is_nan()
                .cmp(&a.0.is_nan())
                .then(a.0.total_cmp(&b.0))
                .then(a.1.cmp(&b.1))
        })
        .flat_map(|(_, _, mut ramp)| {
            by_lightness(oklch, &mut ramp);
            ramp
        })
        .collect()
}

/// Local maxima of a 12-bin circular hue histogram.
pub fn peak_count(oklch: &[Vector]) -> usize {
    let mut bins = [0usize; HISTOGRAM_BINS];
    let width = 360.0 / HISTOGRAM_BINS as f64;
    for v in oklch.iter().filter(|v| !is_achromatic(v)) {
        bins[band(v[2].rem_euclid(360.0), width) as usize % HISTOGRAM_BINS] += 1;
    }
    (0..HISTOGRAM_BINS)
        .filter(|&b| {
            let before = bins[(b + HISTOGRAM_BINS - 1) % HISTOGRAM_BINS];
            let after = bins[(b + 1) % HISTOGRAM_BINS];
            bins[b] >= 1 && bins[b] > before && bins[b] >= after
        })
        .count()
}

pub fn auto_ramp_count(oklch: &[Vector]) -> usize {
    match peak_count(oklch) {
        0 => DEFAULT_RAMPS,
        peaks => peaks.clamp(1, MAX_RAMPS),
    }
}

fn build_ramp(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let width = args.float(0)?;
    let offset = args.float(1)?;
    Ok(sorter(id, ColorSpace::Oklch, move |input| {
        zoned(&input.vectors, width, offset, CHROMA_STRATUM, Secondary::ChromaThenLightness)
    }))
}

fn build_adaptive(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let width = 360.0 / args.float(0)?;
    let deadband = args.float(1)?;
    let secondary = match args.name(2)? {
        "cl" => Secondary::ChromaThenLightness,
        _ => Secondary::LightnessThenChroma,
    };
    Ok(sorter(id, ColorSpace::Oklch, move |input| {
        zoned(&input.vectors, width, 0.0, deadband, secondary)
    }))
}

fn build_gap(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let gap = args.float(0)?;
    Ok(sorter(id, ColorSpace::Oklch, move |input| {
        let oklch = &input.vectors;
        let (mut order, chromatic) = split(oklch);
        for mut cluster in hue_clusters(oklch, &chromatic, gap) {
            by_lightness(oklch, &mut cluster);
            order.extend(cluster);
        }
        order
    }))
}

fn build_zones(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let zones = args.int(0)? as usize;
    Ok(sorter(id, ColorSpace::Oklch, move |input| serpentine(&input.vectors, zones)))
}

fn build_bands(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let bands = args.int(0)? as usize;
    Ok(sorter(id, ColorSpace::Oklch, move |input| {
        lightness_bands(&input.vectors, bands)
    }))
}

fn build_nearest(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let weights = match args.name(0)? {
        "l" => Weights::new(2.0, 1.0, 0.5),
        "h" => Weights::new(0.5, 1.0, 2.0),
        _ => Weights::UNIT,
    };
    Ok(sorter(id, ColorSpace::Oklch, move |input| {
        let darkest = (0..input.len())
            .min_by(|&a, &b| input.vectors[a][0].total_cmp(&input.vectors[b][0]))
            .unwrap_or(0);
        let dist = input.matrix(Delta::WeightedLch(weights));
        chain(dist.len(), darkest, |a, b| dist.get(a, b))
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RampCount {
    Fixed(usize),
    Peaks,
    Clusters,
}

fn build_multi(id: String, args: Args) -> Result<SortFn, RegistryError> {
    let count = match args.int(0) {
        Ok(k) => RampCount::Fixed(k as usize),
        Err(_) => match args.name(0)? {
            "auto" => RampCount::Peaks,
            _ => RampCount::Clusters,
        },
    };
    Ok(sorter(id, ColorSpace::Oklch, move |input| {
        let k = match count {
            RampCount::Fixed(k) => k,
            RampCount::Peaks => auto_ramp_count(&input.vectors),
            RampCount::Clusters => estimate_k(&input.vectors_in(ColorSpace::Oklab), MAX_RAMPS),
        };
        let ramps = multi_ramp(&input.vectors, k);
        ramp_order(&input.vectors, ramps)
    }))
}

pub fn families() -> Vec<Family> {
    let mut ramp_counts = ints(&[1, 2, 3, 4]);
    ramp_counts.extend(names(&["auto", "km"]));
    vec![
        Family::new("RAMP", Speed::Fast, build_ramp)
            .param(ints(&[30, 45, 60]))
            .param(ints(&[0, 15])),
        Family::new("RAMPA", Speed::Fast, build_adaptive)
            .param(ints(&[6, 12, 18]))
            .param(floats(&[0.01, 0.05]))
            .param(names(&["cl", "lc"])),
        Family::new("RAMPG", Speed::Fast, build_gap).param(ints(&[15, 30, 45])),
        Family::new("RAMPZ", Speed::Fast, build_zones).param(ints(&[6, 12])),
        Family::new("RAMPL", Speed::Fast, build_bands).param(ints(&[3, 5])),
        Family::new("RAMPNN", Speed::Fast, build_nearest).param(names(&["lch", "l", "h"])),
        Family::new("MRAMP", Speed::Medium, build_multi).param(ramp_counts),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::STANDARD;
    use color_lib::{Color, Context};

    fn lch(xs: &[(f64, f64, f64)]) -> Vec<Vector> {
        xs.iter().map(|&(l, c, h)| Vector::new(l, c, h)).collect()
    }

    #[test]
    fn test_split_orders_achromatics() {
        let v = lch(&[
            (0.9, 0.0, f64::NAN),
            (0.5, 0.2, 30.0),
            (0.1, 0.01, 200.0),
            (0.5, 0.0, f64::NAN),
        ]);
        assert_eq!(split(&v), (vec![2, 3, 0], vec![1]));
    }

    #[test]
    fn test_deadband_absorbs_jitter() {
        let v = lch(&[(0.5004, 0.10, 40.0), (0.5001, 0.10, 41.0), (0.3, 0.10, 42.0)]);
        let order = zoned(&v, 30.0, 0.0, 0.01, Secondary::LightnessThenChroma);
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_zone_offset_wraps() {
        assert_eq!(zone(10.0, 30.0, 15.0), 11);
        assert_eq!(zone(20.0, 30.0, 15.0), 0);
        assert_eq!(zone(359.0, 60.0, 0.0), 5);
    }

    #[test]
    fn test_hue_clusters_keep_wraparound_group() {
        let v = lch(&[
            (0.5, 0.1, 100.0),
            (0.5, 0.1, 350.0),
            (0.5, 0.1, 200.0),
            (0.5, 0.1, 10.0),
            (0.5, 0.1, 120.0),
        ]);
        let clusters = hue_clusters(&v, &[0, 1, 2, 3, 4], 30.0);
        assert_eq!(clusters, vec![vec![1, 3], vec![0, 4], vec![2]]);
    }

    #[test]
    fn test_serpentine_alternates() {
        let v = lch(&[
            (0.2, 0.1, 10.0),
            (0.8, 0.1, 20.0),
            (0.3, 0.1, 100.0),
            (0.7, 0.1, 110.0),
        ]);
        assert_eq!(serpentine(&v, 6), vec![0, 1, 3, 2]);
    }

    #[test]
    fn test_lightness_bands() {
        let v = lch(&[
            (0.9, 0.1, 10.0),
            (0.1, 0.1, 300.0),
            (0.2, 0.0, f64::NAN),
            (0.15, 0.1, 20.0),
            (1.0, 0.0, f64::NAN),
        ]);
        assert_eq!(lightness_bands(&v, 3), vec![2, 3, 1, 4, 0]);
    }

    #[test]
    fn test_multi_ramp_follows_hue_trend() {
        // Two hue families, around 30 and 210 degrees.
        let v = lch(&[
            (0.9, 0.1, 30.0),
            (0.9, 0.1, 210.0),
            (0.2, 0.1, 35.0),
            (0.25, 0.1, 215.0),
            (0.5, 0.1, 25.0),
            (0.55, 0.1, 205.0),
        ]);
        let ramps = multi_ramp(&v, 2);
        assert_eq!(ramps, vec![vec![0, 2, 4], vec![1, 3, 5]]);
        assert_eq!(ramp_order(&v, ramps), vec![2, 4, 0, 3, 5, 1]);
    }

    #[test]
    fn test_peak_count() {
        let v = lch(&[
            (0.5, 0.1, 10.0),
            (0.5, 0.1, 15.0),
            (0.5, 0.1, 40.0),
            (0.5, 0.1, 190.0),
            (0.5, 0.0, f64::NAN),
        ]);
        assert_eq!(peak_count(&v), 2);
        assert_eq!(auto_ramp_count(&v), 2);
        assert_eq!(auto_ramp_count(&[]), DEFAULT_RAMPS);
    }

    #[test]
    fn test_ramp_method() {
        let input: Vec<Color> = ["#0000ff", "#ffffff", "#ff0000", "#000000"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut ctx = Context::new();
        let out = STANDARD.get("RAMP:[30,0]").unwrap().sort(&input, &mut ctx).unwrap();
        assert_eq!(out, vec!["#000000", "#ffffff", "#ff0000", "#0000ff"]);
    }
}
