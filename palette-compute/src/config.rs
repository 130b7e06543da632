use std::path::Path;

use palette_sort::select::DEFAULT_TOP_N;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::corpus::read_json;
use crate::error::PipelineError;

/// Pipeline settings, loadable from JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Worker threads; 0 uses every core.
    pub threads: usize,
    /// Regular expression over method ids.
    pub filter: Option<String>,
    /// Treat each palette's given order as the curated best.
    pub original_best: bool,
    /// Candidates executed by multi-selection.
    pub top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            filter: None,
            original_best: false,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        read_json(path)
    }

    pub fn method_filter(&self) -> Result<Option<Regex>, PipelineError> {
        Ok(self.filter.as_deref().map(Regex::new).transpose()?)
    }
}
