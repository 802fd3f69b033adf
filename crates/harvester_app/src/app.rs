use std::sync::Arc;

use anyhow::{bail, Context, Result};
use engine_logging::{engine_debug, engine_info, engine_warn};
use harvester_core::IdleThreshold;
use harvester_engine::{
    Agent, ContentExtractor, CycleReport, DirectorySnapshotSource, FallbackExtractor,
    FileActivityProbe, IdleConfig, IdleDetector, InventoryFile, MetadataExtractor, Reclaimer,
    ReqwestSubmitter, RonSettingsStore, SettingsStore, SnapshotExtractor, ThresholdWatcher,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

fn build_extractor(config: &AppConfig) -> Arc<dyn ContentExtractor> {
    match &config.snapshot_dir {
        Some(dir) => Arc::new(FallbackExtractor::new(
            Arc::new(SnapshotExtractor::new(DirectorySnapshotSource::new(dir))),
            Arc::new(MetadataExtractor),
        )),
        None => Arc::new(MetadataExtractor),
    }
}

fn build_reclaimer(config: &AppConfig) -> Result<Reclaimer> {
    let submitter = ReqwestSubmitter::new(config.submit_settings()?)
        .context("building summarization client")?;
    Ok(Reclaimer::new(
        Arc::new(InventoryFile::new(&config.inventory_file)),
        build_extractor(config),
        Arc::new(submitter),
    )
    .with_classifier(config.classifier())
    .with_settings(config.reclaim_settings()))
}

fn log_report(report: &CycleReport) {
    engine_info!("cycle {} done: {}", report.summary.cycle_id, report.summary);
    for (id, outcome) in report.results.iter() {
        engine_debug!("cycle={} resource={} outcome={:?}", report.summary.cycle_id, id, outcome);
    }
}

/// Runs the idle-driven agent until ctrl-c.
pub async fn run(config: AppConfig) -> Result<()> {
    let reclaimer = Arc::new(build_reclaimer(&config)?);
    let store = Arc::new(RonSettingsStore::new(&config.settings_file));
    let stored = store.idle_threshold_secs().unwrap_or_else(|err| {
        engine_warn!("ignoring unreadable settings: {}", err);
        None
    });

    let detector = Arc::new(IdleDetector::new(
        Arc::new(FileActivityProbe::new(&config.activity_file)),
        IdleConfig {
            threshold: IdleThreshold::from_raw(stored),
            poll_interval: config.idle_poll_interval(),
        },
    ));
    let (report_tx, mut reports) = mpsc::unbounded_channel();
    let agent = Agent::new(reclaimer, detector.clone())
        .with_reports(report_tx)
        .spawn();

    let cancel = CancellationToken::new();
    let detector_task = detector.spawn(agent.sender(), cancel.clone());
    let watcher_task = ThresholdWatcher::new(store, config.settings_poll_interval())
        .spawn(agent.sender(), cancel.clone());

    engine_info!(
        "tab-harvester running: endpoint={} inventory={:?} activity={:?}",
        config.endpoint,
        config.inventory_file,
        config.activity_file
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("listening for ctrl-c")?;
                engine_info!("shutdown requested");
                break;
            }
            report = reports.recv() => match report {
                Some(report) => log_report(&report),
                None => break,
            },
        }
    }

    cancel.cancel();
    let _ = detector_task.await;
    let _ = watcher_task.await;
    let state = agent.shutdown().await;
    while let Ok(report) = reports.try_recv() {
        log_report(&report);
    }
    let view = state.view();
    engine_info!(
        "stopped after {} cycle(s), {} trigger(s) dropped",
        view.completed_cycles,
        view.dropped_triggers
    );
    Ok(())
}

/// Runs a single cycle immediately and prints its summary.
pub async fn harvest_once(config: AppConfig) -> Result<()> {
    let report = build_reclaimer(&config)?.run_cycle(1).await;
    println!("{}", report.summary);
    for (id, outcome) in report.results.iter() {
        println!("  resource {id}: {outcome:?}");
    }
    Ok(())
}

pub fn threshold_get(config: &AppConfig) -> Result<()> {
    let store = RonSettingsStore::new(&config.settings_file);
    let raw = store
        .idle_threshold_secs()
        .with_context(|| format!("reading {}", store.path().display()))?;
    let effective = IdleThreshold::from_raw(raw);
    match raw {
        Some(secs) if i64::try_from(effective.secs()).ok() != Some(secs) => {
            println!("{effective} (stored value {secs} is invalid)");
        }
        Some(_) => println!("{effective}"),
        None => println!("{effective} (default)"),
    }
    Ok(())
}

pub fn threshold_set(config: &AppConfig, secs: u64) -> Result<()> {
    let Some(threshold) = IdleThreshold::from_secs(secs) else {
        bail!("idle threshold must be a positive number of seconds");
    };
    let raw = i64::try_from(threshold.secs()).context("idle threshold is too large")?;
    let store = RonSettingsStore::new(&config.settings_file);
    store
        .set_idle_threshold_secs(raw)
        .with_context(|| format!("writing {}", store.path().display()))?;
    println!("idle threshold set to {threshold}");
    Ok(())
}
