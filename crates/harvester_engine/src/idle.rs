use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use engine_logging::{engine_debug, engine_warn};
use harvester_core::{ActivityState, IdleThreshold, Msg};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Something that reports activity transitions and honours an inactivity threshold.
pub trait IdleEventSource: Send + Sync {
    fn threshold(&self) -> IdleThreshold;
    fn set_threshold(&self, threshold: IdleThreshold);
}

/// One reading of the user's activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySample {
    pub idle_for: Duration,
    pub locked: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("activity probe io error: {0}")]
    Io(#[from] io::Error),
}

/// Reads how long the user has been inactive.
pub trait ActivityProbe: Send + Sync {
    fn sample(&self) -> Result<ActivitySample, ProbeError>;
}

pub fn classify(sample: ActivitySample, threshold: IdleThreshold) -> ActivityState {
    if sample.locked {
        ActivityState::Locked
    } else if sample.idle_for >= threshold.as_duration() {
        ActivityState::Idle
    } else {
        ActivityState::Active
    }
}

#[derive(Debug, Clone)]
pub struct IdleConfig {
    pub threshold: IdleThreshold,
    pub poll_interval: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            threshold: IdleThreshold::default(),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Polls an [`ActivityProbe`] and emits `Msg::ActivityChanged` on every transition.
pub struct IdleDetector {
    probe: Arc<dyn ActivityProbe>,
    threshold_secs: AtomicU64,
    poll_interval: Duration,
}

impl IdleDetector {
    pub fn new(probe: Arc<dyn ActivityProbe>, config: IdleConfig) -> Self {
        Self {
            probe,
            threshold_secs: AtomicU64::new(config.threshold.secs()),
            poll_interval: config.poll_interval,
        }
    }

    pub fn spawn(
        self: &Arc<Self>,
        events: mpsc::Sender<Msg>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let detector = self.clone();
        tokio::spawn(async move { detector.run(events, cancel).await })
    }

    async fn run(&self, events: mpsc::Sender<Msg>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut current = ActivityState::Active;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let sample = match self.probe.sample() {
                Ok(sample) => sample,
                Err(err) => {
                    engine_warn!("activity probe failed, skipping sample: {}", err);
                    continue;
                }
            };
            let next = classify(sample, self.threshold());
            if next == current {
                continue;
            }
            engine_debug!("activity {:?} -> {:?} (idle for {:?})", current, next, sample.idle_for);
            current = next;
            if events.send(Msg::ActivityChanged(next)).await.is_err() {
                return;
            }
        }
    }
}

impl IdleEventSource for IdleDetector {
    fn threshold(&self) -> IdleThreshold {
        IdleThreshold::from_secs(self.threshold_secs.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn set_threshold(&self, threshold: IdleThreshold) {
        self.threshold_secs.store(threshold.secs(), Ordering::Relaxed);
    }
}

/// Activity is the modification time of a file that some input hook touches.
///
/// A missing file means no activity was ever recorded. A sibling
/// `<file>.locked` marks the session as locked.
#[derive(Debug, Clone)]
pub struct FileActivityProbe {
    path: PathBuf,
    lock_marker: PathBuf,
}

impl FileActivityProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut marker = OsString::from(path.as_os_str());
        marker.push(".locked");
        Self {
            path,
            lock_marker: PathBuf::from(marker),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActivityProbe for FileActivityProbe {
    fn sample(&self) -> Result<ActivitySample, ProbeError> {
        let now = SystemTime::now();
        let last_activity = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.modified()?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => UNIX_EPOCH,
            Err(err) => return Err(err.into()),
        };
        Ok(ActivitySample {
            idle_for: now.duration_since(last_activity).unwrap_or(Duration::ZERO),
            locked: self.lock_marker.exists(),
        })
    }
}
