//! Owned messages passed between pipeline stages.

use tokio::sync::mpsc;

use crate::error::PollErrorKind;
use crate::loadtest::LoadTestMetrics;
use crate::reconcile::{FragmentDescriptor, ReconcileOutcome};
use crate::stream::StreamState;

/// One fragment to load-test (poll stage → test stage).
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentTask {
    pub stream: String,
    pub segment: u32,
    pub fragment: i64,
    pub duration_ms: u32,
    pub discontinuity: i32,
    pub url: String,
}

impl FragmentTask {
    pub fn new(state: &StreamState, descriptor: &FragmentDescriptor) -> Self {
        Self {
            stream: state.name.clone(),
            segment: descriptor.segment,
            fragment: descriptor.fragment,
            duration_ms: descriptor.duration_ms,
            discontinuity: descriptor.discontinuity,
            url: state.fragment_url(descriptor),
        }
    }
}

/// Summary of one successful poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub stream: String,
    pub current_fragment: i64,
    pub segment: u32,
    pub total_fragments_in_segment: u32,
    pub duration_ms: u32,
    pub discontinuity: i32,
    /// Fragments about to be dispatched from this cycle, ascending.
    pub new_fragments: Vec<i64>,
}

impl PollResult {
    pub fn new(stream: &str, outcome: &ReconcileOutcome) -> Self {
        Self {
            stream: stream.to_string(),
            current_fragment: outcome.current_fragment,
            segment: outcome.segment,
            total_fragments_in_segment: outcome.total_fragments_in_segment,
            duration_ms: outcome.duration_ms,
            discontinuity: outcome.discontinuity,
            new_fragments: outcome.newly_discovered.iter().map(|d| d.fragment).collect(),
        }
    }
}

/// Result of one load test (test stage → observers).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTask {
    pub stream: String,
    pub fragment: i64,
    pub metrics: LoadTestMetrics,
}

/// One CSV line to write (test stage → log stage).
#[derive(Debug, Clone, PartialEq)]
pub struct LogTask {
    pub stream: String,
    pub fragment: i64,
    pub metrics: LoadTestMetrics,
}

/// What the pipeline reports to an optional observer.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Polled(PollResult),
    PollFailed {
        stream: String,
        kind: PollErrorKind,
        message: String,
    },
    Measured(MetricTask),
}

pub type EventSender = mpsc::UnboundedSender<PipelineEvent>;

pub(crate) fn publish(events: &Option<EventSender>, event: PipelineEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
