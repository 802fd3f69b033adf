use crate::{CycleId, IdleThreshold};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run one harvest cycle.
    StartCycle { cycle_id: CycleId },
    /// Push a new threshold into the idle source.
    ApplyThreshold(IdleThreshold),
    /// A trigger arrived while `active_cycle` was running and was discarded.
    TriggerDropped { active_cycle: CycleId },
}
