use color_lib::ColorError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SortError {
    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("method {method} does not apply to a palette of {len} colors")]
    InvalidInput { method: String, len: usize },

    #[error("method {method} returned an order that is not a permutation of its input")]
    NotAPermutation { method: String },

    #[error("unknown method id '{0}'")]
    UnknownMethod(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("method id '{0}' is registered more than once")]
    DuplicateId(String),

    #[error("family {family} expected parameter {index} to be {expected}")]
    BadParam {
        family: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error(transparent)]
    Color(#[from] ColorError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectError {
    #[error("no trained data for palettes of {colors} colors or fewer")]
    NoTrainedData { colors: usize },

    #[error("none of the trained candidates could sort this palette")]
    NoCandidate,

    #[error(transparent)]
    Sort(#[from] SortError),
}
