//! Harvester core: data model, safety policy and the pure agent state machine.
mod classifier;
mod cycle;
mod effect;
mod msg;
mod resource;
mod state;
mod text;
mod threshold;
mod update;
mod view_model;

pub use classifier::{ActiveSet, SafetyClassifier, DEFAULT_PROTECTED_SCHEMES};
pub use cycle::{
    CycleId, CycleResults, CycleSummary, DuplicateOutcome, FailureKind, ResourceOutcome,
};
pub use effect::Effect;
pub use msg::{ActivityState, Msg};
pub use resource::{ExtractedContent, Resource, ResourceId, SubmissionPayload};
pub use state::{AgentPhase, AgentState};
pub use text::{log_preview, truncate_chars};
pub use threshold::{IdleThreshold, DEFAULT_IDLE_THRESHOLD_SECS};
pub use update::update;
pub use view_model::AgentView;
