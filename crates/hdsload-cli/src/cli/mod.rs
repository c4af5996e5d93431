//! CLI for the hdsload live HDS load tester.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hdsload_core::config::{self, HdsConfig};
use hdsload_core::logging;
use std::path::PathBuf;

use commands::{run_inspect, run_inspect_manifest, run_live, run_streams};

/// Top-level CLI for hdsload.
#[derive(Debug, Parser)]
#[command(name = "hdsload")]
#[command(about = "hdsload: load-test every new fragment of live HDS streams", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/hdsload/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Discover live fragments of every stream and load-test each one until Ctrl-C.
    Run {
        /// Multi-level manifest URL without the `.f4m` suffix.
        #[arg(long, value_name = "URL")]
        manifest_url: Option<String>,
        /// Origin host (optionally with scheme and port) serving the live streams.
        #[arg(long, value_name = "HOST")]
        server: Option<String>,
    },

    /// List the streams of a multi-level manifest with their bootstrap URLs.
    Streams {
        /// Multi-level manifest URL without the `.f4m` suffix.
        #[arg(long, value_name = "URL")]
        manifest_url: Option<String>,
        /// Origin host used to build the bootstrap URLs (same as `run --server`).
        #[arg(long, value_name = "HOST")]
        server: Option<String>,
    },

    /// Parse a saved inspector output and show the projected live fragment,
    /// or list every fragment of a stream manifest's inline bootstrap.
    Inspect {
        /// Inspector output (e.g. `<stream>.xml` from the bootstrap directory).
        #[arg(required_unless_present = "manifest", conflicts_with = "manifest")]
        path: Option<PathBuf>,
        /// Stream manifest (`.f4m`) carrying an inline `bootstrapInfo`.
        #[arg(long, value_name = "F4M")]
        manifest: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        init_logging(&cfg);
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Run {
                manifest_url,
                server,
            } => run_live(&cfg, manifest_url, server).await?,
            CliCommand::Streams {
                manifest_url,
                server,
            } => run_streams(&cfg, manifest_url, server).await?,
            CliCommand::Inspect { path, manifest } => match (path, manifest) {
                (_, Some(manifest)) => run_inspect_manifest(&cfg, &manifest)?,
                (Some(path), None) => run_inspect(&path)?,
                (None, None) => anyhow::bail!("inspect needs a path or --manifest"),
            },
        }
        Ok(())
    }
}

fn init_logging(cfg: &HdsConfig) {
    if let Err(e) = logging::init_logging(cfg.log_file.as_deref()) {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable ({:#}), logging to stderr", e);
    }
}

#[cfg(test)]
mod tests;
