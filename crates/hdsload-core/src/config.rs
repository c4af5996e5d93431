use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Worker pool caps per pipeline stage (optional section in config.toml).
/// Each stage runs `min(stream count, cap)` workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerLimits {
    pub max_poll_workers: usize,
    pub max_test_workers: usize,
    pub max_log_workers: usize,
}

impl Default for WorkerLimits {
    fn default() -> Self {
        Self {
            max_poll_workers: 120,
            max_test_workers: 120,
            max_log_workers: 120,
        }
    }
}

/// Poller pacing (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay between two bootstrap polls of the same stream.
    pub poll_interval_secs: f64,
    /// Lower bound on the pause between two fragment dispatches.
    pub min_dispatch_pause_secs: f64,
    /// Subtracted from the fragment duration to get the dispatch pause.
    pub dispatch_lead_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1.0,
            min_dispatch_pause_secs: 1.0,
            dispatch_lead_secs: 0.5,
        }
    }
}

impl PacingConfig {
    pub fn poll_interval(&self) -> Duration {
        secs_or(self.poll_interval_secs, Self::default().poll_interval_secs)
    }

    /// Pause after dispatching a fragment of `duration_ms`:
    /// `max(min_dispatch_pause, duration/1000 - dispatch_lead)` seconds.
    pub fn dispatch_pause(&self, duration_ms: u32) -> Duration {
        let secs = (f64::from(duration_ms) / 1000.0 - self.dispatch_lead_secs)
            .max(self.min_dispatch_pause_secs);
        secs_or(secs, Self::default().min_dispatch_pause_secs)
    }

    /// Every value must be a finite, non-negative number of seconds.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("min_dispatch_pause_secs", self.min_dispatch_pause_secs),
            ("dispatch_lead_secs", self.dispatch_lead_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!(
                    "[pacing] {} must be a finite, non-negative number of seconds, got {}",
                    name,
                    value
                );
            }
        }
        Ok(())
    }
}

/// Seconds as a Duration; negatives clamp to zero, unrepresentable values
/// (infinite, NaN) fall back to `fallback`.
fn secs_or(secs: f64, fallback: f64) -> Duration {
    if secs.is_nan() {
        return Duration::from_secs_f64(fallback);
    }
    Duration::try_from_secs_f64(secs.max(0.0))
        .unwrap_or_else(|_| Duration::from_secs_f64(fallback))
}

/// Global configuration loaded from `~/.config/hdsload/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HdsConfig {
    /// Origin host (and optional port) serving the live streams.
    pub server_name: String,
    /// Multi-level manifest URL, without the `.f4m` suffix.
    pub manifest_url: String,
    /// Path on the origin under which each live stream is published.
    pub live_path: String,
    /// Requests issued per fragment load test.
    pub request_count: u32,
    /// Concurrent requests per fragment load test.
    pub concurrency: u32,
    /// Keep a plain-text copy of each inspected bootstrap next to the snapshot.
    pub write_inspection: bool,
    /// Directory for bootstrap snapshots and per-stream CSV files.
    /// Defaults to `bootstrap/` under the XDG state dir.
    #[serde(default)]
    pub bootstrap_dir: Option<PathBuf>,
    /// Bootstrap inspector binary (f4fpackager).
    pub packager: String,
    /// Load generator binary (ApacheBench).
    pub apache_bench: String,
    /// Diagnostic log file; defaults to `hdsload.log` under the XDG state dir.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub workers: WorkerLimits,
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl Default for HdsConfig {
    fn default() -> Self {
        Self {
            server_name: "localhost".to_string(),
            manifest_url: "http://localhost/vod/liveevent1".to_string(),
            live_path: "hds-live/streams/livepkgr/streams/_definst_".to_string(),
            request_count: 100,
            concurrency: 10,
            write_inspection: true,
            bootstrap_dir: None,
            packager: "f4fpackager".to_string(),
            apache_bench: "ab".to_string(),
            log_file: None,
            workers: WorkerLimits::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl HdsConfig {
    /// Bootstrap directory from config, or `bootstrap/` under the XDG state dir.
    pub fn resolved_bootstrap_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.bootstrap_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("hdsload")?;
        Ok(xdg_dirs.get_state_home().join("bootstrap"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hdsload")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HdsConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HdsConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path (`--config`).
pub fn load_from_path(path: &Path) -> Result<HdsConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: HdsConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.pacing
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
