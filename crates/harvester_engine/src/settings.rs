use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use harvester_core::Msg;
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::persist::{write_atomic, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings io error: {0}")]
    Io(#[from] io::Error),
    #[error("settings file {path} is malformed: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Key-value store holding the agent's only persisted setting.
pub trait SettingsStore: Send + Sync {
    /// Raw stored value of the idle threshold, unvalidated.
    fn idle_threshold_secs(&self) -> Result<Option<i64>, SettingsError>;
    fn set_idle_threshold_secs(&self, secs: i64) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedSettings {
    #[serde(default)]
    idle_threshold_secs: Option<i64>,
}

/// Settings kept in a small RON file, e.g.
///
/// ```text
/// #![enable(implicit_some)]
/// (
///     idle_threshold_secs: 120,
/// )
/// ```
#[derive(Debug)]
pub struct RonSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<PersistedSettings, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(PersistedSettings::default());
            }
            Err(err) => return Err(err.into()),
        };
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(&content)
            .map_err(|err| SettingsError::Parse {
                path: self.path.clone(),
                message: err.to_string(),
            })
    }
}

impl SettingsStore for RonSettingsStore {
    fn idle_threshold_secs(&self) -> Result<Option<i64>, SettingsError> {
        Ok(self.load()?.idle_threshold_secs)
    }

    fn set_idle_threshold_secs(&self, secs: i64) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        // A malformed file is overwritten rather than blocking the write.
        let mut settings = self.load().unwrap_or_default();
        settings.idle_threshold_secs = Some(secs);

        let pretty = ron::ser::PrettyConfig::new().extensions(Extensions::IMPLICIT_SOME);
        let content = ron::ser::to_string_pretty(&settings, pretty)
            .map_err(|err| SettingsError::Serialize(err.to_string()))?;
        write_atomic(&self.path, &content)?;
        Ok(())
    }
}

/// Re-reads the stored threshold and reports it whenever it changes.
///
/// The first poll happens immediately, so the agent always receives the
/// startup value. Unreadable settings count as absent.
pub struct ThresholdWatcher {
    store: Arc<dyn SettingsStore>,
    poll_interval: Duration,
}

impl ThresholdWatcher {
    pub fn new(store: Arc<dyn SettingsStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }

    pub fn spawn(self, events: mpsc::Sender<Msg>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(events, cancel).await })
    }

    async fn run(self, events: mpsc::Sender<Msg>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_seen: Option<Option<i64>> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let raw = self.store.idle_threshold_secs().unwrap_or_else(|err| {
                engine_warn!("could not read idle threshold, using default: {}", err);
                None
            });
            if last_seen == Some(raw) {
                continue;
            }
            engine_debug!("stored idle threshold is now {:?}", raw);
            last_seen = Some(raw);
            if events.send(Msg::ThresholdLoaded(raw)).await.is_err() {
                return;
            }
        }
    }
}
