use std::collections::BTreeMap;
use std::fmt;

use crate::ResourceId;

pub type CycleId = u64;

/// Failure taxonomy of a harvest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Enumeration,
    Extraction,
    Transport,
    Rejected,
    Destroy,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Enumeration => "enumeration",
            FailureKind::Extraction => "extraction",
            FailureKind::Transport => "transport",
            FailureKind::Rejected => "rejected",
            FailureKind::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Where a single candidate ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOutcome {
    /// Submitted, acknowledged and destroyed.
    Reclaimed,
    ExtractionFailed { detail: String },
    TransportFailed { detail: String },
    Rejected { status: u16 },
    /// Submission was acknowledged but the resource stayed open.
    DestroyFailed { detail: String },
}

impl ResourceOutcome {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ResourceOutcome::Reclaimed => None,
            ResourceOutcome::ExtractionFailed { .. } => Some(FailureKind::Extraction),
            ResourceOutcome::TransportFailed { .. } => Some(FailureKind::Transport),
            ResourceOutcome::Rejected { .. } => Some(FailureKind::Rejected),
            ResourceOutcome::DestroyFailed { .. } => Some(FailureKind::Destroy),
        }
    }

    pub fn was_submitted(&self) -> bool {
        matches!(
            self,
            ResourceOutcome::Reclaimed | ResourceOutcome::DestroyFailed { .. }
        )
    }
}

/// Counts emitted when a cycle completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleSummary {
    pub cycle_id: CycleId,
    pub candidates: usize,
    pub successes: usize,
    pub extraction_failures: usize,
    pub submission_failures: usize,
    pub destroy_failures: usize,
    /// The enumerator failed and the cycle never reached filtering.
    pub aborted: bool,
}

impl CycleSummary {
    pub fn aborted(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            aborted: true,
            ..Self::default()
        }
    }

    pub fn empty(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            ..Self::default()
        }
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle={} candidates={} successes={} extraction_failures={} submission_failures={} destroy_failures={}",
            self.cycle_id,
            self.candidates,
            self.successes,
            self.extraction_failures,
            self.submission_failures,
            self.destroy_failures
        )?;
        if self.aborted {
            f.write_str(" aborted=true")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("outcome for resource {0} already recorded")]
pub struct DuplicateOutcome(pub ResourceId);

/// Per-cycle result aggregate. Each resource id is written at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CycleResults {
    outcomes: BTreeMap<ResourceId, ResourceOutcome>,
}

impl CycleResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome for `id`; a second write for the same id is refused.
    pub fn record(
        &mut self,
        id: ResourceId,
        outcome: ResourceOutcome,
    ) -> Result<(), DuplicateOutcome> {
        if self.outcomes.contains_key(&id) {
            return Err(DuplicateOutcome(id));
        }
        self.outcomes.insert(id, outcome);
        Ok(())
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourceOutcome> {
        self.outcomes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceOutcome)> {
        self.outcomes.iter().map(|(id, outcome)| (*id, outcome))
    }

    pub fn summarize(&self, cycle_id: CycleId, candidates: usize) -> CycleSummary {
        let mut summary = CycleSummary {
            cycle_id,
            candidates,
            ..CycleSummary::default()
        };
        for outcome in self.outcomes.values() {
            match outcome {
                ResourceOutcome::Reclaimed => summary.successes += 1,
                ResourceOutcome::ExtractionFailed { .. } => summary.extraction_failures += 1,
                ResourceOutcome::TransportFailed { .. } | ResourceOutcome::Rejected { .. } => {
                    summary.submission_failures += 1
                }
                ResourceOutcome::DestroyFailed { .. } => summary.destroy_failures += 1,
            }
        }
        summary
    }
}
