use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::PacingConfig;
use crate::control::Shutdown;
use crate::error::PollError;
use crate::pipeline::messages::{publish, EventSender, FragmentTask, PipelineEvent, PollResult};
use crate::pipeline::summary::PipelineStats;
use crate::reconcile::{reconcile, ReconcileOutcome};
use crate::run_table::RunTableSnapshot;
use crate::services::{BootstrapFetcher, RunTableInspector};
use crate::storage::BootstrapStore;

use super::StreamState;

/// Collaborators and channels shared by every poller of a pipeline.
pub(crate) struct PollContext {
    pub fetcher: Arc<dyn BootstrapFetcher>,
    pub inspector: Arc<dyn RunTableInspector>,
    pub store: BootstrapStore,
    pub pacing: PacingConfig,
    /// Poll-stage pool: one permit per in-flight fetch/inspect/reconcile.
    pub slots: Arc<Semaphore>,
    pub fragments: mpsc::UnboundedSender<FragmentTask>,
    pub events: Option<EventSender>,
    pub stats: Arc<PipelineStats>,
}

/// Control loop of one stream: fetch, inspect, parse, reconcile, dispatch, pace.
pub(crate) struct StreamPoller {
    state: StreamState,
    ctx: Arc<PollContext>,
}

impl StreamPoller {
    pub fn new(state: StreamState, ctx: Arc<PollContext>) -> Self {
        Self { state, ctx }
    }

    /// Poll until shutdown; returns the final state of the stream.
    pub async fn run(mut self, mut shutdown: Shutdown) -> StreamState {
        info!(stream = %self.state.name, url = %self.state.bootstrap_url, "polling started");
        loop {
            let slots = Arc::clone(&self.ctx.slots);
            let permit = tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                permit = slots.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            let polled = self.poll_once().await;
            drop(permit);

            match polled {
                Ok(outcome) => {
                    if !self.dispatch(outcome, &mut shutdown).await {
                        break;
                    }
                }
                Err(e) => self.report_failure(&e),
            }

            if !shutdown.sleep(self.ctx.pacing.poll_interval()).await {
                break;
            }
        }
        info!(
            stream = %self.state.name,
            pending = self.state.window.unpulled().len(),
            "polling stopped"
        );
        self.state
    }

    /// One fetch → inspect → parse → reconcile cycle. The window is only
    /// touched once the run table parsed.
    async fn poll_once(&mut self) -> Result<ReconcileOutcome, PollError> {
        let ctx = Arc::clone(&self.ctx);
        let name = self.state.name.clone();
        let url = self.state.bootstrap_url.clone();
        let text = tokio::task::spawn_blocking(move || -> Result<String, PollError> {
            let bytes = ctx.fetcher.fetch(&url)?;
            let path = ctx.store.write_bootstrap(&name, &bytes)?;
            let text = ctx.inspector.inspect(&path)?;
            if let Err(e) = ctx.store.write_inspection(&name, &text) {
                warn!(stream = %name, "could not save inspector output: {}", e);
            }
            Ok(text)
        })
        .await
        .map_err(|e| PollError::Task(e.to_string()))??;

        let snapshot = RunTableSnapshot::parse(&text)?;
        let outcome = reconcile(&snapshot, &mut self.state.window)?;
        self.state.record(&outcome);
        PipelineStats::bump(&self.ctx.stats.polls);
        debug!(
            stream = %self.state.name,
            current = outcome.current_fragment,
            segment = outcome.segment,
            total = outcome.total_fragments_in_segment,
            new = outcome.newly_discovered.len(),
            "reconciled"
        );
        Ok(outcome)
    }

    /// Send every newly discovered fragment in ascending order, pausing
    /// between consecutive sends. Returns false if shutdown interrupted it.
    async fn dispatch(&mut self, outcome: ReconcileOutcome, shutdown: &mut Shutdown) -> bool {
        publish(
            &self.ctx.events,
            PipelineEvent::Polled(PollResult::new(&self.state.name, &outcome)),
        );

        let mut pending = outcome.newly_discovered.iter().peekable();
        while let Some(descriptor) = pending.next() {
            let task = FragmentTask::new(&self.state, descriptor);
            if self.ctx.fragments.send(task).is_err() {
                warn!(stream = %self.state.name, "fragment queue closed");
                return false;
            }
            self.state.window.mark_pulled(descriptor.fragment);
            PipelineStats::bump(&self.ctx.stats.fragments_dispatched);
            debug!(
                stream = %self.state.name,
                fragment = descriptor.fragment,
                segment = descriptor.segment,
                "dispatched"
            );

            if pending.peek().is_some() {
                let pause = self.ctx.pacing.dispatch_pause(descriptor.duration_ms);
                if !shutdown.sleep(pause).await {
                    return false;
                }
            }
        }
        true
    }

    fn report_failure(&self, err: &PollError) {
        PipelineStats::bump(&self.ctx.stats.failed_polls);
        error!(
            stream = %self.state.name,
            url = %self.state.bootstrap_url,
            kind = ?err.kind(),
            "poll failed: {}",
            err
        );
        publish(
            &self.ctx.events,
            PipelineEvent::PollFailed {
                stream: self.state.name.clone(),
                kind: err.kind(),
                message: err.to_string(),
            },
        );
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &StreamState {
        &self.state
    }
}
