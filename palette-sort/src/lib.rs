pub mod algorithms;
pub mod error;
pub mod fft;
pub mod fingerprint;
pub mod greedy;
pub mod matrix;
pub mod metrics;
pub mod registry;
pub mod runner;
pub mod select;
pub mod two_opt;

pub use error::{RegistryError, SelectError, SortError};
pub use fingerprint::Fingerprint;
pub use metrics::{MetricsEx, MetricsProvider, StandardMetrics};
pub use registry::{Registry, RegistryBuilder, SortingMethod, Speed, STANDARD};
pub use runner::SortInput;
pub use select::{Selection, TrainedEntry};
