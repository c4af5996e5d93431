//! Staged pipeline: poll → test → log.
//!
//! Every stream gets a long-lived poller task; at most
//! `min(streams, max_poll_workers)` of them poll at once. Discovered
//! fragments flow through unbounded FIFO queues to the test pool and then
//! to the log pool, each sized `min(streams, cap)`.
//!
//! Shutdown drains front to back: pollers stop at their next sleep, which
//! drops the last fragment sender; test workers empty the queue and exit,
//! which drops the last log sender; log workers do the same.

pub mod messages;
pub(crate) mod pool;
mod stages;
pub mod summary;

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::config::{HdsConfig, PacingConfig, WorkerLimits};
use crate::control::Shutdown;
use crate::fetch::HttpFetcher;
use crate::inspector::PackagerInspector;
use crate::loadtest::ApacheBench;
use crate::services::{BootstrapFetcher, LoadTestRunner, MetricSink, RunTableInspector};
use crate::storage::{BootstrapStore, CsvMetricLog};
use crate::stream::{PollContext, StreamPoller, StreamState};

pub use messages::{EventSender, FragmentTask, LogTask, MetricTask, PipelineEvent, PollResult};
pub use summary::PipelineSummary;

use pool::{join_workers, pool_size, spawn_workers, WorkQueue};
use stages::{LogStage, TestStage};
use summary::PipelineStats;

/// Collaborators the pipeline calls out to.
#[derive(Clone)]
pub struct Services {
    pub fetcher: Arc<dyn BootstrapFetcher>,
    pub inspector: Arc<dyn RunTableInspector>,
    pub runner: Arc<dyn LoadTestRunner>,
    pub sink: Arc<dyn MetricSink>,
    pub store: BootstrapStore,
}

impl Services {
    /// curl fetcher, packager inspector, `ab` runner and CSV files in the
    /// bootstrap directory.
    pub fn from_config(cfg: &HdsConfig) -> Result<Self> {
        let dir = cfg.resolved_bootstrap_dir()?;
        let store = BootstrapStore::create(&dir, cfg.write_inspection)?;
        Ok(Self {
            fetcher: Arc::new(HttpFetcher::default()),
            inspector: Arc::new(PackagerInspector::new(cfg.packager.clone())),
            runner: Arc::new(ApacheBench::new(cfg.apache_bench.clone())),
            sink: Arc::new(CsvMetricLog::new(&dir)),
            store,
        })
    }
}

/// Tunables of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub request_count: u32,
    pub concurrency: u32,
    pub workers: WorkerLimits,
    pub pacing: PacingConfig,
}

impl PipelineSettings {
    pub fn from_config(cfg: &HdsConfig) -> Self {
        Self {
            request_count: cfg.request_count,
            concurrency: cfg.concurrency,
            workers: cfg.workers.clone(),
            pacing: cfg.pacing.clone(),
        }
    }
}

/// Run the pipeline over `streams` until `shutdown` fires and every queue
/// has drained.
pub async fn run_pipeline(
    streams: Vec<StreamState>,
    services: Services,
    settings: PipelineSettings,
    shutdown: Shutdown,
    events: Option<EventSender>,
) -> Result<PipelineSummary> {
    if streams.is_empty() {
        bail!("no streams to poll");
    }
    let n = streams.len();
    let poll_workers = pool_size(n, settings.workers.max_poll_workers);
    let test_workers = pool_size(n, settings.workers.max_test_workers);
    let log_workers = pool_size(n, settings.workers.max_log_workers);
    let stats = Arc::new(PipelineStats::default());

    let (fragment_tx, fragment_queue) = WorkQueue::channel();
    let (log_tx, log_queue) = WorkQueue::channel();

    info!("Creating {} log workers", log_workers);
    let mut log_set = JoinSet::new();
    let log_stage = Arc::new(LogStage {
        sink: services.sink,
        stats: Arc::clone(&stats),
    });
    spawn_workers(&mut log_set, "log", log_workers, log_queue, move |task| {
        let stage = Arc::clone(&log_stage);
        async move { stage.handle(task).await }
    });

    info!("Creating {} test workers", test_workers);
    let mut test_set = JoinSet::new();
    let test_stage = Arc::new(TestStage {
        runner: services.runner,
        request_count: settings.request_count,
        concurrency: settings.concurrency,
        logs: log_tx,
        events: events.clone(),
        stats: Arc::clone(&stats),
    });
    spawn_workers(&mut test_set, "test", test_workers, fragment_queue, move |task| {
        let stage = Arc::clone(&test_stage);
        async move { stage.handle(task).await }
    });

    info!("Creating {} poll workers for {} streams", poll_workers, n);
    let ctx = Arc::new(PollContext {
        fetcher: services.fetcher,
        inspector: services.inspector,
        store: services.store,
        pacing: settings.pacing,
        slots: Arc::new(Semaphore::new(poll_workers)),
        fragments: fragment_tx,
        events,
        stats: Arc::clone(&stats),
    });
    let mut poll_set = JoinSet::new();
    for state in streams {
        let poller = StreamPoller::new(state, Arc::clone(&ctx));
        poll_set.spawn(poller.run(shutdown.clone()));
    }
    drop(ctx);

    let mut pending = 0usize;
    while let Some(res) = poll_set.join_next().await {
        match res {
            Ok(state) => pending += state.window.unpulled().len(),
            Err(e) => error!(stage = "poll", "poller task failed: {}", e),
        }
    }
    info!(undispatched = pending, "pollers stopped, draining test queue");
    join_workers(&mut test_set, "test").await;
    info!("test workers stopped, draining log queue");
    join_workers(&mut log_set, "log").await;

    let summary = stats.summary();
    info!(
        polls = summary.polls,
        failed_polls = summary.failed_polls,
        dispatched = summary.fragments_dispatched,
        tests = summary.tests_run,
        failed_tests = summary.failed_tests,
        logged = summary.lines_logged,
        "pipeline finished"
    );
    Ok(summary)
}
