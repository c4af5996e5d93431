//! `hdsload inspect` – project the live fragment from a saved inspector output,
//! or list the fragments of a stream manifest's inline bootstrap.

use anyhow::{Context, Result};
use hdsload_core::config::HdsConfig;
use hdsload_core::inspector::PackagerInspector;
use hdsload_core::manifest::list_manifest_fragments;
use hdsload_core::reconcile::{reconcile, StreamWindow};
use hdsload_core::run_table::RunTableSnapshot;
use hdsload_core::storage::BootstrapStore;
use std::path::Path;

pub fn run_inspect(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read inspector output {}", path.display()))?;
    let snapshot = RunTableSnapshot::parse(&text)?;
    let mut window = StreamWindow::seeded();
    let outcome = reconcile(&snapshot, &mut window)?;

    println!("segment entries:   {}", snapshot.segments.len());
    println!("fragment entries:  {}", snapshot.fragments.len());
    println!("segment:           {}", outcome.segment);
    println!("fragments/segment: {}", outcome.total_fragments_in_segment);
    println!("live duration:     {} ms", outcome.duration_ms);
    println!("discontinuity:     {}", outcome.discontinuity);
    println!("current fragment:  {}", outcome.current_fragment);
    for d in window.entries() {
        println!(
            "  Seg{}-Frag{:<8} {:>6} ms  disc {}  {}",
            d.segment,
            d.fragment,
            d.duration_ms,
            d.discontinuity,
            if d.pulled { "seed" } else { "new" }
        );
    }
    Ok(())
}

pub fn run_inspect_manifest(cfg: &HdsConfig, manifest: &Path) -> Result<()> {
    let xml = std::fs::read_to_string(manifest)
        .with_context(|| format!("read manifest {}", manifest.display()))?;
    let name = manifest
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no stream name in {}", manifest.display()))?;
    let store = BootstrapStore::create(&cfg.resolved_bootstrap_dir()?, cfg.write_inspection)?;
    let inspector = PackagerInspector::new(cfg.packager.clone());
    let listing = list_manifest_fragments(&xml, name, &store, &inspector)?;

    println!("bootstrap: {}", listing.bootstrap_path.display());
    println!("fragments: {}", listing.fragments.len());
    for d in &listing.fragments {
        println!(
            "  Seg{}-Frag{:<8} {:>6} ms  disc {}",
            d.segment, d.fragment, d.duration_ms, d.discontinuity
        );
    }
    Ok(())
}
