//! Test and log stage handlers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::messages::{publish, EventSender, FragmentTask, LogTask, MetricTask, PipelineEvent};
use super::summary::PipelineStats;
use crate::services::{LoadTestRunner, MetricSink};

pub(crate) struct TestStage {
    pub runner: Arc<dyn LoadTestRunner>,
    pub request_count: u32,
    pub concurrency: u32,
    pub logs: mpsc::UnboundedSender<LogTask>,
    pub events: Option<EventSender>,
    pub stats: Arc<PipelineStats>,
}

impl TestStage {
    pub async fn handle(&self, task: FragmentTask) {
        if task.duration_ms == 0 {
            debug!(stream = %task.stream, fragment = task.fragment, "zero duration, not load testing");
            return;
        }
        info!(
            "Load testing {}-{} with duration of {} msec",
            task.stream, task.fragment, task.duration_ms
        );

        let runner = Arc::clone(&self.runner);
        let (url, requests, concurrency) = (task.url.clone(), self.request_count, self.concurrency);
        let result = tokio::task::spawn_blocking(move || runner.run(&url, requests, concurrency))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);

        let metrics = match result {
            Ok(metrics) => metrics,
            Err(e) => {
                PipelineStats::bump(&self.stats.failed_tests);
                error!(
                    stream = %task.stream,
                    fragment = task.fragment,
                    url = %task.url,
                    "load test failed: {:#}",
                    e
                );
                return;
            }
        };
        PipelineStats::bump(&self.stats.tests_run);

        publish(
            &self.events,
            PipelineEvent::Measured(MetricTask {
                stream: task.stream.clone(),
                fragment: task.fragment,
                metrics,
            }),
        );
        let line = LogTask {
            stream: task.stream,
            fragment: task.fragment,
            metrics,
        };
        if self.logs.send(line).is_err() {
            error!("log queue closed, dropping metrics");
        }
    }
}

pub(crate) struct LogStage {
    pub sink: Arc<dyn MetricSink>,
    pub stats: Arc<PipelineStats>,
}

impl LogStage {
    pub async fn handle(&self, task: LogTask) {
        let sink = Arc::clone(&self.sink);
        let stream = task.stream.clone();
        let metrics = task.metrics;
        let result = tokio::task::spawn_blocking(move || sink.append(&stream, &metrics))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);
        match result {
            Ok(()) => PipelineStats::bump(&self.stats.lines_logged),
            Err(e) => error!(
                stream = %task.stream,
                fragment = task.fragment,
                "could not record metrics: {:#}",
                e
            ),
        }
    }
}
