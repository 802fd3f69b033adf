//! Host capabilities the orchestrator drives. Each one is a seam for fakes.
use harvester_core::{ExtractedContent, Resource, ResourceId};

use crate::{DestroyError, EnumerationError, ExtractionError, SubmitOutcome};

/// Lists and closes the host's resources.
#[async_trait::async_trait]
pub trait ResourceEnumerator: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Resource>, EnumerationError>;

    /// The focused resource of each container.
    async fn list_active(&self) -> Result<Vec<Resource>, EnumerationError>;

    async fn destroy(&self, id: ResourceId) -> Result<(), DestroyError>;
}

/// Produces a text snapshot of one resource.
#[async_trait::async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, resource: &Resource) -> Result<ExtractedContent, ExtractionError>;
}

/// Delivers extracted content to the summarization endpoint.
///
/// Implementations never fail; every problem is folded into the outcome.
#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, content: &ExtractedContent) -> SubmitOutcome;
}
