//! `hdsload run` – poll every stream and load-test new fragments until Ctrl-C.

use anyhow::Result;
use hdsload_core::config::HdsConfig;
use hdsload_core::control::shutdown_channel;
use hdsload_core::pipeline::{run_pipeline, PipelineEvent, PipelineSettings, Services};
use hdsload_core::stream::StreamState;
use tokio::sync::mpsc;

use super::resolve_streams;

pub async fn run_live(
    cfg: &HdsConfig,
    manifest_url: Option<String>,
    server: Option<String>,
) -> Result<()> {
    let manifest_url = manifest_url.unwrap_or_else(|| cfg.manifest_url.clone());
    let server = server.unwrap_or_else(|| cfg.server_name.clone());

    let entries = resolve_streams(&manifest_url).await?;
    let streams = entries
        .iter()
        .map(|e| StreamState::new(e, &server, &cfg.live_path))
        .collect::<Result<Vec<_>>>()?;
    tracing::info!("{} live streams from {}", streams.len(), manifest_url);
    for s in &streams {
        println!("{}  {}", s.name, s.bootstrap_url);
    }

    let services = Services::from_config(cfg)?;
    tracing::info!(dir = %services.store.dir().display(), "bootstrap and CSV directory");
    let settings = PipelineSettings::from_config(cfg);

    let (trigger, signal) = shutdown_channel();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nstopping: finishing queued load tests (Ctrl-C again to abort)");
            tracing::info!("shutdown requested");
            trigger.trigger();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            print_event(&event);
        }
    });

    let summary = run_pipeline(streams, services, settings, signal, Some(events_tx)).await;
    interrupt.abort();
    let _ = printer.await;
    let summary = summary?;

    println!(
        "polls: {} ({} failed)  fragments: {}  tests: {} ({} failed)  csv lines: {}",
        summary.polls,
        summary.failed_polls,
        summary.fragments_dispatched,
        summary.tests_run,
        summary.failed_tests,
        summary.lines_logged
    );
    Ok(())
}

fn print_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::Polled(p) if !p.new_fragments.is_empty() => println!(
            "{:<20} seg {} frag {:<8} new {:?}",
            p.stream, p.segment, p.current_fragment, p.new_fragments
        ),
        PipelineEvent::Polled(_) => {}
        PipelineEvent::PollFailed { stream, message, .. } => {
            println!("{:<20} poll failed: {}", stream, message)
        }
        PipelineEvent::Measured(m) => println!(
            "{:<20} frag {:<8} {:>8.2} ms {:>9.2} req/s {:>4} non-2xx",
            m.stream,
            m.fragment,
            m.metrics.latency_ms,
            m.metrics.requests_per_second,
            m.metrics.non_2xx
        ),
    }
}
