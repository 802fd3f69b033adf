use std::fs;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use harvester_core::{ActivityState, IdleThreshold, Msg};
use harvester_engine::{
    classify, ActivityProbe, ActivitySample, FileActivityProbe, IdleConfig, IdleDetector,
    IdleEventSource, ProbeError,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn sample(idle_secs: u64, locked: bool) -> ActivitySample {
    ActivitySample {
        idle_for: Duration::from_secs(idle_secs),
        locked,
    }
}

#[test]
fn classification_uses_the_threshold_inclusively() {
    let threshold = IdleThreshold::from_secs(60).unwrap();
    assert_eq!(classify(sample(59, false), threshold), ActivityState::Active);
    assert_eq!(classify(sample(60, false), threshold), ActivityState::Idle);
    assert_eq!(classify(sample(3600, false), threshold), ActivityState::Idle);
}

#[test]
fn locked_wins_over_idle() {
    let threshold = IdleThreshold::default();
    assert_eq!(classify(sample(0, true), threshold), ActivityState::Locked);
    assert_eq!(classify(sample(9999, true), threshold), ActivityState::Locked);
}

#[derive(Default)]
struct DialProbe {
    idle_secs: AtomicU64,
    locked: AtomicBool,
    broken: AtomicBool,
}

impl ActivityProbe for DialProbe {
    fn sample(&self) -> Result<ActivitySample, ProbeError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("sensor unplugged").into());
        }
        Ok(sample(
            self.idle_secs.load(Ordering::SeqCst),
            self.locked.load(Ordering::SeqCst),
        ))
    }
}

async fn next_activity(events: &mut mpsc::Receiver<Msg>) -> ActivityState {
    match timeout(Duration::from_secs(2), events.recv()).await {
        Ok(Some(Msg::ActivityChanged(state))) => state,
        other => panic!("expected an activity change, got {other:?}"),
    }
}

fn detector(probe: Arc<DialProbe>) -> Arc<IdleDetector> {
    Arc::new(IdleDetector::new(
        probe,
        IdleConfig {
            threshold: IdleThreshold::from_secs(60).unwrap(),
            poll_interval: Duration::from_millis(10),
        },
    ))
}

#[tokio::test]
async fn detector_reports_only_transitions() {
    let probe = Arc::new(DialProbe::default());
    let detector = detector(probe.clone());
    let (tx, mut events) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let task = detector.spawn(tx, cancel.clone());

    probe.idle_secs.store(120, Ordering::SeqCst);
    assert_eq!(next_activity(&mut events).await, ActivityState::Idle);

    probe.locked.store(true, Ordering::SeqCst);
    assert_eq!(next_activity(&mut events).await, ActivityState::Locked);

    probe.locked.store(false, Ordering::SeqCst);
    probe.idle_secs.store(0, Ordering::SeqCst);
    assert_eq!(next_activity(&mut events).await, ActivityState::Active);

    // Steady state produces nothing.
    assert!(timeout(Duration::from_millis(80), events.recv()).await.is_err());

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn raising_the_threshold_turns_idle_back_into_active() {
    let probe = Arc::new(DialProbe::default());
    probe.idle_secs.store(90, Ordering::SeqCst);
    let detector = detector(probe.clone());
    let (tx, mut events) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let task = detector.spawn(tx, cancel.clone());

    assert_eq!(next_activity(&mut events).await, ActivityState::Idle);
    detector.set_threshold(IdleThreshold::from_secs(300).unwrap());
    assert_eq!(detector.threshold().secs(), 300);
    assert_eq!(next_activity(&mut events).await, ActivityState::Active);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn probe_errors_are_skipped() {
    let probe = Arc::new(DialProbe::default());
    probe.broken.store(true, Ordering::SeqCst);
    probe.idle_secs.store(120, Ordering::SeqCst);
    let detector = detector(probe.clone());
    let (tx, mut events) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let task = detector.spawn(tx, cancel.clone());

    assert!(timeout(Duration::from_millis(60), events.recv()).await.is_err());
    probe.broken.store(false, Ordering::SeqCst);
    assert_eq!(next_activity(&mut events).await, ActivityState::Idle);

    cancel.cancel();
    task.await.unwrap();
}

#[test]
fn file_probe_reads_mtime_and_lock_marker() {
    let dir = tempfile::tempdir().unwrap();
    let activity = dir.path().join("activity");
    let probe = FileActivityProbe::new(&activity);

    let never = probe.sample().unwrap();
    assert!(never.idle_for > Duration::from_secs(3600));
    assert!(!never.locked);

    fs::write(&activity, b"").unwrap();
    let fresh = probe.sample().unwrap();
    assert!(fresh.idle_for < Duration::from_secs(60));

    fs::write(dir.path().join("activity.locked"), b"").unwrap();
    assert!(probe.sample().unwrap().locked);
    assert_eq!(probe.path(), activity.as_path());
}
