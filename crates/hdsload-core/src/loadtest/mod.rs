//! Fragment load testing through ApacheBench (`ab`).

mod parse;

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

pub use parse::parse_ab_output;

use crate::services::LoadTestRunner;

/// Figures extracted from one load-generator run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadTestMetrics {
    /// Mean time per request in milliseconds.
    pub latency_ms: f64,
    pub requests_per_second: f64,
    pub non_2xx: u64,
    pub complete_requests: u64,
    pub time_taken_secs: f64,
}

impl LoadTestMetrics {
    /// `latency,throughput,non200s` (no trailing newline).
    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{}",
            self.latency_ms, self.requests_per_second, self.non_2xx
        )
    }
}

/// Runs the `ab` binary and parses its report.
#[derive(Debug, Clone)]
pub struct ApacheBench {
    program: String,
}

impl ApacheBench {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl LoadTestRunner for ApacheBench {
    fn run(&self, fragment_url: &str, request_count: u32, concurrency: u32) -> Result<LoadTestMetrics> {
        let output = Command::new(&self.program)
            .arg("-d")
            .arg("-n")
            .arg(request_count.to_string())
            .arg("-c")
            .arg(concurrency.to_string())
            .arg(fragment_url)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn {}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {} for {}: {}",
                self.program,
                output.status,
                fragment_url,
                stderr.trim()
            );
        }
        Ok(parse_ab_output(&String::from_utf8_lossy(&output.stdout)))
    }
}
