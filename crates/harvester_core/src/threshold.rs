use std::fmt;
use std::time::Duration;

pub const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 60;

/// Seconds of inactivity before the idle source reports `Idle`. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdleThreshold(u64);

impl IdleThreshold {
    pub fn from_secs(secs: u64) -> Option<Self> {
        (secs > 0).then_some(Self(secs))
    }

    /// Interprets a stored value; absent or non-positive values fall back to the default.
    pub fn from_raw(raw: Option<i64>) -> Self {
        raw.and_then(|secs| u64::try_from(secs).ok())
            .and_then(Self::from_secs)
            .unwrap_or_default()
    }

    pub fn secs(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for IdleThreshold {
    fn default() -> Self {
        Self(DEFAULT_IDLE_THRESHOLD_SECS)
    }
}

impl fmt::Display for IdleThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
