//! On-disk formats: palette input, baseline lookup, computed results and
//! trained entries. All JSON, camelCase.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use color_lib::Color;
use palette_sort::{Fingerprint, MetricsEx};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteInput {
    pub key: String,
    pub colors: Vec<Color>,
}

/// Curated orders by palette key.
pub type BaselineLookup = BTreeMap<String, Vec<Color>>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsRange {
    pub min: MetricsEx,
    pub max: MetricsEx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteRecord {
    pub key: String,
    pub colors: Vec<Color>,
    #[serde(rename = "type")]
    pub palette_type: Option<String>,
    pub gram: Fingerprint,
    pub metrics_range: MetricsRange,
    pub groups: Vec<GroupRecord>,
}

impl PaletteRecord {
    /// The group whose runs carry the best flag, if any.
    pub fn best_group(&self) -> Option<&GroupRecord> {
        self.groups
            .iter()
            .find(|g| g.methods.iter().any(|m| m.best))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub record: SortRecord,
    pub methods: Vec<MethodRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRecord {
    pub colors: Vec<Color>,
    pub metrics: MetricsEx,
    pub quality: MetricsEx,
    pub score: f64,
    pub best_distance: Option<f64>,
    pub best_distance_quality: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRun {
    pub index: usize,
    pub best: bool,
    pub method: MethodRef,
    /// Milliseconds.
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRef {
    pub mid: String,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let io = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io)?);
    serde_json::to_writer_pretty(&mut out, value).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    out.flush().map_err(io)
}
