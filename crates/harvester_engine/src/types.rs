use std::fmt;
use std::time::Duration;

use harvester_core::ResourceId;

use crate::snapshot::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnumerationError {
    #[error("resource listing unavailable: {0}")]
    Unavailable(String),
    #[error("malformed resource listing: {0}")]
    Malformed(String),
    #[error("enumeration timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("resource {0} has no usable url")]
    MissingUrl(ResourceId),
    #[error("no content available: {0}")]
    Unavailable(String),
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DestroyError {
    #[error("resource {0} not found")]
    NotFound(ResourceId),
    #[error("destroy refused: {0}")]
    Refused(String),
    #[error("destroy timed out after {0:?}")]
    Timeout(Duration),
}

/// Network-level failure class of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCause {
    Timeout,
    Connect,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub cause: TransportCause,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(cause: TransportCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause {
            TransportCause::Timeout => write!(f, "timeout: {}", self.message),
            TransportCause::Connect => write!(f, "connect: {}", self.message),
            TransportCause::Other => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// How the summarization endpoint answered a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected(u16),
    TransportFailure(TransportError),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}
