//! The ordering algorithms and the families they are registered under.

pub mod curve;
pub mod density;
pub mod genetic;
pub mod hierarchical;
pub mod kmeans;
pub mod lehmer;
pub mod momentum;
pub mod nna;
pub mod ramp;
pub mod simple;

use color_lib::Color;

use crate::registry::Family;

pub(crate) fn at_least_two(colors: &[Color]) -> bool {
    colors.len() >= 2
}

pub(crate) fn at_least_three(colors: &[Color]) -> bool {
    colors.len() >= 3
}

/// Every built-in family, in registration order.
pub fn families() -> Vec<Family> {
    [
        simple::families(),
        nna::families(),
        momentum::families(),
        genetic::families(),
        hierarchical::families(),
        density::families(),
        kmeans::families(),
        curve::families(),
        ramp::families(),
    ]
    .into_iter()
    .flatten()
    .collect()
}
