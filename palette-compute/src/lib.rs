pub mod config;
pub mod corpus;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod train;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use executor::{Executor, InlineExecutor, RayonExecutor};
pub use pipeline::{Baseline, PaletteState, Pipeline};
pub use train::train;
