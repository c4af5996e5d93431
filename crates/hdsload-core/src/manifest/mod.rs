//! Multi-level manifest (`.f4m`) resolution into live streams.

mod parse;
mod vod;

pub use parse::{parse_bootstrap_info, parse_live_manifest};
pub use vod::{list_manifest_fragments, BootstrapListing};

use crate::error::ManifestError;
use crate::fetch::HttpFetcher;
use crate::services::{ManifestResolver, StreamEntry};

/// Fetches `<manifest_url>.f4m` over HTTP and lists its media entries.
#[derive(Debug, Clone, Default)]
pub struct F4mManifestResolver {
    fetcher: HttpFetcher,
}

impl F4mManifestResolver {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

impl ManifestResolver for F4mManifestResolver {
    fn resolve(&self, manifest_url: &str) -> Result<Vec<StreamEntry>, ManifestError> {
        let url = format!("{}.f4m", manifest_url);
        let body = self
            .fetcher
            .get(&url)
            .map_err(|e| ManifestError::Unavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let streams = parse_live_manifest(&String::from_utf8_lossy(&body))?;
        if streams.is_empty() {
            return Err(ManifestError::NoStreams(url));
        }
        tracing::debug!(url = %url, streams = streams.len(), "resolved multi-level manifest");
        Ok(streams)
    }
}
