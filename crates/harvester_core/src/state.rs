use crate::view_model::AgentView;
use crate::{ActivityState, CycleId, CycleSummary, IdleThreshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentPhase {
    /// Waiting for an idle transition.
    #[default]
    Waiting,
    Harvesting { cycle_id: CycleId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    phase: AgentPhase,
    activity: ActivityState,
    threshold: IdleThreshold,
    threshold_applied: bool,
    next_cycle_id: CycleId,
    completed_cycles: u64,
    dropped_triggers: u64,
    last_summary: Option<CycleSummary>,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            phase: AgentPhase::Waiting,
            activity: ActivityState::Active,
            threshold: IdleThreshold::default(),
            threshold_applied: false,
            next_cycle_id: 1,
            completed_cycles: 0,
            dropped_triggers: 0,
            last_summary: None,
        }
    }
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AgentView {
        AgentView {
            phase: self.phase,
            activity: self.activity,
            threshold: self.threshold,
            completed_cycles: self.completed_cycles,
            dropped_triggers: self.dropped_triggers,
            last_summary: self.last_summary,
        }
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn threshold(&self) -> IdleThreshold {
        self.threshold
    }

    pub(crate) fn activity(&self) -> ActivityState {
        self.activity
    }

    pub(crate) fn set_activity(&mut self, activity: ActivityState) {
        self.activity = activity;
    }

    /// Starts a cycle, or counts the trigger as dropped when one is already running.
    pub(crate) fn try_start_cycle(&mut self) -> Result<CycleId, CycleId> {
        match self.phase {
            AgentPhase::Harvesting { cycle_id } => {
                self.dropped_triggers += 1;
                Err(cycle_id)
            }
            AgentPhase::Waiting => {
                let cycle_id = self.next_cycle_id;
                self.next_cycle_id += 1;
                self.phase = AgentPhase::Harvesting { cycle_id };
                Ok(cycle_id)
            }
        }
    }

    /// Returns to `Waiting` if `summary` belongs to the running cycle.
    pub(crate) fn finish_cycle(&mut self, summary: CycleSummary) -> bool {
        match self.phase {
            AgentPhase::Harvesting { cycle_id } if cycle_id == summary.cycle_id => {
                self.phase = AgentPhase::Waiting;
                self.completed_cycles += 1;
                self.last_summary = Some(summary);
                true
            }
            _ => false,
        }
    }

    /// Stores `threshold`; true when the idle source must be updated.
    pub(crate) fn set_threshold(&mut self, threshold: IdleThreshold) -> bool {
        if self.threshold_applied && self.threshold == threshold {
            return false;
        }
        self.threshold = threshold;
        self.threshold_applied = true;
        true
    }
}
