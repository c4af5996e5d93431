//! CLI command handlers, one file per command.

mod inspect;
mod run;
mod streams;

pub use inspect::{run_inspect, run_inspect_manifest};
pub use run::run_live;
pub use streams::run_streams;

use anyhow::{Context, Result};
use hdsload_core::manifest::F4mManifestResolver;
use hdsload_core::services::{ManifestResolver, StreamEntry};

/// Resolve the multi-level manifest off the async runtime. Failure is fatal
/// to the command.
pub(crate) async fn resolve_streams(manifest_url: &str) -> Result<Vec<StreamEntry>> {
    let url = manifest_url.to_string();
    let resolved = tokio::task::spawn_blocking(move || F4mManifestResolver::default().resolve(&url))
        .await
        .context("manifest task failed")?;
    match resolved {
        Ok(streams) => Ok(streams),
        Err(e) => {
            tracing::error!(manifest = %manifest_url, "{}", e);
            Err(e.into())
        }
    }
}
