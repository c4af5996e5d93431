//! Counters shared by the pipeline stages.

use std::sync::atomic::{AtomicU64, Ordering};

/// Totals for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub polls: u64,
    pub failed_polls: u64,
    pub fragments_dispatched: u64,
    pub tests_run: u64,
    pub failed_tests: u64,
    pub lines_logged: u64,
}

#[derive(Debug, Default)]
pub(crate) struct PipelineStats {
    pub polls: AtomicU64,
    pub failed_polls: AtomicU64,
    pub fragments_dispatched: AtomicU64,
    pub tests_run: AtomicU64,
    pub failed_tests: AtomicU64,
    pub lines_logged: AtomicU64,
}

impl PipelineStats {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            polls: self.polls.load(Ordering::Relaxed),
            failed_polls: self.failed_polls.load(Ordering::Relaxed),
            fragments_dispatched: self.fragments_dispatched.load(Ordering::Relaxed),
            tests_run: self.tests_run.load(Ordering::Relaxed),
            failed_tests: self.failed_tests.load(Ordering::Relaxed),
            lines_logged: self.lines_logged.load(Ordering::Relaxed),
        }
    }
}
