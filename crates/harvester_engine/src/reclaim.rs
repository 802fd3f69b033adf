use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{
    engine_debug, engine_error, engine_failure, engine_info, engine_trace, engine_warn,
};
use futures_util::stream::{self, StreamExt};
use harvester_core::{
    ActiveSet, CycleId, CycleResults, CycleSummary, FailureKind, Resource, ResourceId,
    ResourceOutcome, SafetyClassifier,
};

use crate::capability::{ContentExtractor, ResourceEnumerator, Submitter};
use crate::{
    DestroyError, EnumerationError, ExtractionError, SubmitOutcome, TransportCause,
    TransportError,
};

#[derive(Debug, Clone)]
pub struct ReclaimSettings {
    /// Pipelines allowed to run at once; `1` processes candidates sequentially.
    pub max_concurrency: usize,
    pub enumerate_timeout: Duration,
    pub extract_timeout: Duration,
    /// Outer bound on a submission, on top of the client's own timeouts.
    pub submit_timeout: Duration,
    pub destroy_timeout: Duration,
}

impl Default for ReclaimSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            enumerate_timeout: Duration::from_secs(10),
            extract_timeout: Duration::from_secs(20),
            submit_timeout: Duration::from_secs(45),
            destroy_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CyclePhase {
    Enumerating,
    Filtering,
    Processing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Extracting,
    Submitting,
    Destroying,
}

/// Everything a finished cycle knows. Dropped once observers have seen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub summary: CycleSummary,
    /// Candidate ids in enumeration order.
    pub candidates: Vec<ResourceId>,
    pub results: CycleResults,
}

impl CycleReport {
    pub(crate) fn without_candidates(summary: CycleSummary) -> Self {
        Self {
            summary,
            candidates: Vec::new(),
            results: CycleResults::new(),
        }
    }
}

/// Drives one harvest cycle: enumerate, filter, then extract/submit/destroy per candidate.
///
/// A resource is destroyed only after the submitter accepted its content, and
/// a failure on one resource never affects another.
pub struct Reclaimer {
    enumerator: Arc<dyn ResourceEnumerator>,
    extractor: Arc<dyn ContentExtractor>,
    submitter: Arc<dyn Submitter>,
    classifier: SafetyClassifier,
    settings: ReclaimSettings,
}

impl Reclaimer {
    pub fn new(
        enumerator: Arc<dyn ResourceEnumerator>,
        extractor: Arc<dyn ContentExtractor>,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        Self {
            enumerator,
            extractor,
            submitter,
            classifier: SafetyClassifier::default(),
            settings: ReclaimSettings::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: SafetyClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_settings(mut self, settings: ReclaimSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn run_cycle(&self, cycle_id: CycleId) -> CycleReport {
        engine_debug!("cycle={} phase={:?}", cycle_id, CyclePhase::Enumerating);
        let (resources, active) = match self.enumerate().await {
            Ok(listing) => listing,
            Err(err) => {
                engine_failure!(cycle_id, "-", FailureKind::Enumeration, err.to_string());
                let summary = CycleSummary::aborted(cycle_id);
                engine_warn!("harvest aborted: {}", summary);
                return CycleReport::without_candidates(summary);
            }
        };

        engine_debug!("cycle={} phase={:?}", cycle_id, CyclePhase::Filtering);
        let active_set: ActiveSet = active.iter().map(|resource| resource.id).collect();
        let candidates = dedupe_by_id(
            cycle_id,
            self.classifier.select_candidates(&resources, &active_set),
        );
        if candidates.is_empty() {
            engine_info!(
                "cycle={} nothing to harvest among {} open resources",
                cycle_id,
                resources.len()
            );
            return CycleReport::without_candidates(CycleSummary::empty(cycle_id));
        }
        let candidate_ids: Vec<ResourceId> = candidates.iter().map(|r| r.id).collect();
        engine_info!(
            "cycle={} {} of {} resources eligible",
            cycle_id,
            candidate_ids.len(),
            resources.len()
        );

        engine_debug!("cycle={} phase={:?}", cycle_id, CyclePhase::Processing);
        let mut results = CycleResults::new();
        let mut pipelines = stream::iter(
            candidates
                .into_iter()
                .map(|resource| self.process(cycle_id, resource)),
        )
        .buffer_unordered(self.settings.max_concurrency.max(1));

        while let Some((id, outcome)) = pipelines.next().await {
            if let Err(err) = results.record(id, outcome) {
                engine_error!("cycle={} {}", cycle_id, err);
            }
        }

        engine_debug!("cycle={} phase={:?}", cycle_id, CyclePhase::Completed);
        let summary = results.summarize(cycle_id, candidate_ids.len());
        engine_info!("harvest complete: {}", summary);
        CycleReport {
            summary,
            candidates: candidate_ids,
            results,
        }
    }

    async fn enumerate(&self) -> Result<(Vec<Resource>, Vec<Resource>), EnumerationError> {
        let timeout = self.settings.enumerate_timeout;
        let listing = futures_util::future::try_join(
            self.enumerator.list_all(),
            self.enumerator.list_active(),
        );
        tokio::time::timeout(timeout, listing)
            .await
            .map_err(|_| EnumerationError::Timeout(timeout))?
    }

    async fn process(
        &self,
        cycle_id: CycleId,
        resource: Resource,
    ) -> (ResourceId, ResourceOutcome) {
        let id = resource.id;
        let outcome = self.reclaim(cycle_id, &resource).await;
        match &outcome {
            ResourceOutcome::Reclaimed => {
                engine_info!("cycle={} resource={} reclaimed", cycle_id, id);
            }
            failure => {
                if let Some(kind) = failure.failure_kind() {
                    engine_failure!(cycle_id, id, kind, describe(failure));
                }
            }
        }
        (id, outcome)
    }

    async fn reclaim(&self, cycle_id: CycleId, resource: &Resource) -> ResourceOutcome {
        let id = resource.id;

        engine_trace!("cycle={} resource={} stage={:?}", cycle_id, id, Stage::Extracting);
        let extract_timeout = self.settings.extract_timeout;
        let content = match bounded(
            extract_timeout,
            self.extractor.extract(resource),
            ExtractionError::Timeout(extract_timeout),
        )
        .await
        {
            Ok(content) => content,
            Err(err) => {
                return ResourceOutcome::ExtractionFailed {
                    detail: err.to_string(),
                }
            }
        };

        engine_trace!("cycle={} resource={} stage={:?}", cycle_id, id, Stage::Submitting);
        let submit_timeout = self.settings.submit_timeout;
        let outcome = tokio::time::timeout(submit_timeout, self.submitter.submit(&content))
            .await
            .unwrap_or_else(|_| {
                SubmitOutcome::TransportFailure(TransportError::new(
                    TransportCause::Timeout,
                    format!("no answer within {submit_timeout:?}"),
                ))
            });
        drop(content);
        match outcome {
            SubmitOutcome::Accepted => {}
            SubmitOutcome::Rejected(status) => return ResourceOutcome::Rejected { status },
            SubmitOutcome::TransportFailure(err) => {
                return ResourceOutcome::TransportFailed {
                    detail: err.to_string(),
                }
            }
        }

        engine_trace!("cycle={} resource={} stage={:?}", cycle_id, id, Stage::Destroying);
        let destroy_timeout = self.settings.destroy_timeout;
        match bounded(
            destroy_timeout,
            self.enumerator.destroy(id),
            DestroyError::Timeout(destroy_timeout),
        )
        .await
        {
            Ok(()) => ResourceOutcome::Reclaimed,
            Err(err) => ResourceOutcome::DestroyFailed {
                detail: err.to_string(),
            },
        }
    }
}

async fn bounded<T, E>(
    limit: Duration,
    operation: impl Future<Output = Result<T, E>>,
    on_timeout: E,
) -> Result<T, E> {
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout),
    }
}

fn dedupe_by_id(cycle_id: CycleId, candidates: Vec<Resource>) -> Vec<Resource> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|resource| {
            let fresh = seen.insert(resource.id);
            if !fresh {
                engine_warn!(
                    "cycle={} resource={} listed twice; processing it once",
                    cycle_id,
                    resource.id
                );
            }
            fresh
        })
        .collect()
}

fn describe(outcome: &ResourceOutcome) -> String {
    match outcome {
        ResourceOutcome::Reclaimed => String::new(),
        ResourceOutcome::Rejected { status } => format!("endpoint answered {status}"),
        ResourceOutcome::ExtractionFailed { detail }
        | ResourceOutcome::TransportFailed { detail }
        | ResourceOutcome::DestroyFailed { detail } => detail.clone(),
    }
}
