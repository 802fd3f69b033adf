use crate::CycleSummary;

/// Activity states reported by the idle source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityState {
    #[default]
    Active,
    Idle,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The idle source reported a transition.
    ActivityChanged(ActivityState),
    /// The stored idle threshold was read (at startup or after a change).
    /// `None` when the store has no usable value.
    ThresholdLoaded(Option<i64>),
    /// A harvest was requested directly, bypassing idle detection.
    HarvestRequested,
    /// The running cycle reached `Completed`.
    CycleFinished(CycleSummary),
}

