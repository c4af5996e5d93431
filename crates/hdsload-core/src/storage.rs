//! On-disk artifacts: bootstrap snapshots for the inspector and per-stream CSV metrics.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::loadtest::LoadTestMetrics;
use crate::services::MetricSink;

/// Writes the latest bootstrap of each stream as `<dir>/<stream>.bootstrap`,
/// and optionally the inspector's text as `<dir>/<stream>.xml`.
#[derive(Debug, Clone)]
pub struct BootstrapStore {
    dir: PathBuf,
    keep_inspection: bool,
}

impl BootstrapStore {
    /// Creates `dir` if needed.
    pub fn create(dir: &Path, keep_inspection: bool) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create bootstrap dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            keep_inspection,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn bootstrap_path(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{}.bootstrap", stream))
    }

    /// Overwrite the stream's snapshot; returns its path.
    pub fn write_bootstrap(&self, stream: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.bootstrap_path(stream);
        fs::write(&path, data)?;
        Ok(path)
    }

    /// Save the inspector output when enabled. Returns the path written, if any.
    pub fn write_inspection(&self, stream: &str, text: &str) -> std::io::Result<Option<PathBuf>> {
        if !self.keep_inspection {
            return Ok(None);
        }
        let path = self.dir.join(format!("{}.xml", stream));
        fs::write(&path, text)?;
        Ok(Some(path))
    }
}

/// Appends `latency,throughput,non200s` lines to `<dir>/<stream>.csv`.
#[derive(Debug, Clone)]
pub struct CsvMetricLog {
    dir: PathBuf,
}

impl CsvMetricLog {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn csv_path(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", stream))
    }
}

impl MetricSink for CsvMetricLog {
    fn append(&self, stream: &str, metrics: &LoadTestMetrics) -> Result<()> {
        let path = self.csv_path(stream);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        // Whole line in a single write; appenders to the same file stay line-atomic.
        let line = format!("{}\n", metrics.csv_line());
        file.write_all(line.as_bytes())
            .with_context(|| format!("append to {}", path.display()))?;
        Ok(())
    }
}
