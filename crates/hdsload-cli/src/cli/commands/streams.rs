//! `hdsload streams` – list the streams of the multi-level manifest.

use anyhow::Result;
use hdsload_core::config::HdsConfig;
use hdsload_core::stream::StreamState;

use super::resolve_streams;

pub async fn run_streams(
    cfg: &HdsConfig,
    manifest_url: Option<String>,
    server: Option<String>,
) -> Result<()> {
    let manifest_url = manifest_url.unwrap_or_else(|| cfg.manifest_url.clone());
    let server = server.unwrap_or_else(|| cfg.server_name.clone());
    let streams = resolve_streams(&manifest_url).await?;

    println!("{:<24} {:<8} {}", "STREAM", "KBPS", "BOOTSTRAP");
    for entry in &streams {
        let state = StreamState::new(entry, &server, &cfg.live_path)?;
        let bitrate = entry
            .bitrate
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {:<8} {}", entry.name, bitrate, state.bootstrap_url);
    }
    Ok(())
}
