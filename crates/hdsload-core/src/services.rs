//! Interfaces to the collaborators around the discovery pipeline.
//!
//! The pipeline depends only on these traits; `fetch`, `manifest`,
//! `inspector`, `loadtest` and `storage` provide the production
//! implementations. All methods block; the pipeline calls them from
//! `spawn_blocking`.

use std::path::Path;

use crate::error::{ManifestError, PollError};
use crate::loadtest::LoadTestMetrics;

/// One stream listed by the multi-level manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub name: String,
    pub base_url: String,
    /// Advertised bitrate (kbps), if the manifest carries one.
    pub bitrate: Option<u32>,
}

/// Turns a multi-level manifest URL into the list of live streams.
pub trait ManifestResolver: Send + Sync {
    fn resolve(&self, manifest_url: &str) -> Result<Vec<StreamEntry>, ManifestError>;
}

/// Downloads the raw bootstrap of one stream.
pub trait BootstrapFetcher: Send + Sync {
    fn fetch(&self, bootstrap_url: &str) -> Result<Vec<u8>, PollError>;
}

/// Renders a bootstrap file on disk as run table text.
pub trait RunTableInspector: Send + Sync {
    fn inspect(&self, bootstrap_path: &Path) -> Result<String, PollError>;
}

/// Load-tests one fragment URL.
pub trait LoadTestRunner: Send + Sync {
    fn run(
        &self,
        fragment_url: &str,
        request_count: u32,
        concurrency: u32,
    ) -> anyhow::Result<LoadTestMetrics>;
}

/// Records one measured fragment for a stream.
pub trait MetricSink: Send + Sync {
    fn append(&self, stream: &str, metrics: &LoadTestMetrics) -> anyhow::Result<()>;
}
