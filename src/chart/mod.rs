pub mod archive;
pub mod loader;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use archive::ArchivePackager;
pub use loader::DirectoryLoader;

pub const CHART_FILE_NAME: &str = "Chart.yaml";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("{0} is not a directory")]
    NotADirectory(String),
    #[error("Missing {CHART_FILE_NAME} in {0}")]
    MissingChartFile(String),
    #[error("Error while parsing {CHART_FILE_NAME}: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid chart metadata: {0}")]
    InvalidMetadata(String),
    #[error("Error while walking chart directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// The subset of `Chart.yaml` needed to name and package a chart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub api_version: Option<String>,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub other: serde_yaml::Mapping,
}

impl Metadata {
    pub fn from_yaml_str(data: &str) -> Result<Metadata, ChartError> {
        let metadata: Metadata = serde_yaml::from_str(data)?;
        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> Result<(), ChartError> {
        for (field, value) in [("name", &self.name), ("version", &self.version)] {
            if value.trim().is_empty() {
                return Err(ChartError::InvalidMetadata(format!("{field} is required")));
            }
            if value.contains(['/', '\\']) || value == ".." {
                return Err(ChartError::InvalidMetadata(format!(
                    "{field} {value} must not contain path separators"
                )));
            }
        }
        Ok(())
    }
}

/// A file of a chart, relative to the chart directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    pub name: PathBuf,
    pub data: Vec<u8>,
}

/// A chart loaded in memory. The first file is always `Chart.yaml`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub metadata: Metadata,
    pub files: Vec<ChartFile>,
}

impl Chart {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

pub trait ChartLoader {
    fn load_dir(&self, path: &Path) -> anyhow::Result<Chart>;
}

pub trait ChartPackager {
    /// Serialize `chart` into `destination`, returning the archive path.
    fn save(&self, chart: &Chart, destination: &Path) -> anyhow::Result<PathBuf>;
}
