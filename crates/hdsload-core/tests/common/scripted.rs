//! Scripted collaborators for driving the pipeline without an origin,
//! packager or `ab` binary.
//!
//! Each stream has its own inspector script; once a script is exhausted its
//! last step repeats, which looks like a stale bootstrap.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use hdsload_core::error::PollError;
use hdsload_core::loadtest::LoadTestMetrics;
use hdsload_core::services::{BootstrapFetcher, LoadTestRunner, RunTableInspector, StreamEntry};

/// Inspector output for a single-entry run table: segment 1 with 50
/// fragments, so the projected fragment is `current`.
pub fn table_projecting(current: i64, duration_ms: u32) -> String {
    format!(
        "bootstrap version: 0\n\
         profile: 0\n\
         live: 1\n\
         update: 0\n\
         time scale: 1000\n\
         current media time: {ts}\n\
         segments: 1\n\
         version: 0\n\
         flags: 0\n\
         quality entries: 0\n\
         entries: 1\n\
         segment=1,fragments=50\n\
         fragments: 1\n\
         version: 0\n\
         flags: 0\n\
         time scale: 1000\n\
         entries: 1\n\
         fragment={first},timestamp={ts},duration={duration_ms}\n",
        first = current - 49,
        ts = current * 4000,
    )
}

pub fn stream_entry(name: &str) -> StreamEntry {
    StreamEntry {
        name: name.to_string(),
        base_url: format!("http://origin.test/{}/", name),
        bitrate: Some(500),
    }
}

/// Serves a fixed body, or an error for streams listed as unreachable.
pub struct ScriptedFetcher {
    unreachable: Vec<String>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            unreachable: Vec::new(),
        }
    }

    pub fn unreachable(streams: &[&str]) -> Self {
        Self {
            unreachable: streams.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BootstrapFetcher for ScriptedFetcher {
    fn fetch(&self, bootstrap_url: &str) -> Result<Vec<u8>, PollError> {
        if self.unreachable.iter().any(|s| bootstrap_url.ends_with(&format!("/{}.bootstrap", s))) {
            return Err(PollError::Fetch {
                url: bootstrap_url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(bootstrap_url.as_bytes().to_vec())
    }
}

/// Per-stream inspector scripts, keyed by the snapshot's file stem.
pub struct ScriptedInspector {
    scripts: Mutex<HashMap<String, VecDeque<String>>>,
}

impl ScriptedInspector {
    pub fn new(scripts: &[(&str, Vec<String>)]) -> Self {
        Self {
            scripts: Mutex::new(
                scripts
                    .iter()
                    .map(|(name, steps)| (name.to_string(), steps.iter().cloned().collect()))
                    .collect(),
            ),
        }
    }
}

impl RunTableInspector for ScriptedInspector {
    fn inspect(&self, bootstrap_path: &Path) -> Result<String, PollError> {
        let stream = bootstrap_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let mut scripts = self.scripts.lock().unwrap();
        let steps = scripts
            .get_mut(&stream)
            .ok_or_else(|| PollError::Inspect(format!("no script for {}", stream)))?;
        if steps.len() > 1 {
            Ok(steps.pop_front().unwrap_or_default())
        } else {
            steps
                .front()
                .cloned()
                .ok_or_else(|| PollError::Inspect(format!("empty script for {}", stream)))
        }
    }
}

/// Records every URL it is asked to test and reports fixed metrics.
#[derive(Default)]
pub struct RecordingRunner {
    pub urls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn urls_for(&self, stream: &str) -> Vec<String> {
        let marker = format!("/{}/{}Seg", stream, stream);
        self.urls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.contains(&marker))
            .cloned()
            .collect()
    }
}

impl LoadTestRunner for RecordingRunner {
    fn run(
        &self,
        fragment_url: &str,
        request_count: u32,
        _concurrency: u32,
    ) -> anyhow::Result<LoadTestMetrics> {
        self.urls.lock().unwrap().push(fragment_url.to_string());
        Ok(LoadTestMetrics {
            latency_ms: 20.0,
            requests_per_second: 500.0,
            non_2xx: 0,
            complete_requests: u64::from(request_count),
            time_taken_secs: 0.2,
        })
    }
}
