use crate::{ActivityState, AgentPhase, CycleSummary, IdleThreshold};

/// Read-only snapshot of the agent, for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentView {
    pub phase: AgentPhase,
    pub activity: ActivityState,
    pub threshold: IdleThreshold,
    pub completed_cycles: u64,
    pub dropped_triggers: u64,
    pub last_summary: Option<CycleSummary>,
}
