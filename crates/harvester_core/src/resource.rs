use serde::{Deserialize, Serialize};

pub type ResourceId = u64;

/// An open tab (or any session handle) owned by the host environment.
///
/// The agent only borrows these for the duration of a harvest cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub audible: bool,
    #[serde(default)]
    pub pinned: bool,
}

impl Resource {
    pub fn new(id: ResourceId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: Some(url.into()),
            title: String::new(),
            active: false,
            audible: false,
            pinned: false,
        }
    }

    /// A resource whose URL the host could not report.
    pub fn without_url(id: ResourceId) -> Self {
        Self {
            url: None,
            ..Self::new(id, "")
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn audible(mut self) -> Self {
        self.audible = true;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// The URL, or `None` when it is missing or blank.
    pub fn url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Lightweight text snapshot of a resource, produced right before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub source_url: String,
    pub title: String,
    pub body_text: String,
}

/// JSON body posted to the summarization endpoint.
///
/// `content` also accepts the legacy `bodyText` name, and the legacy
/// `tabId` field is tolerated on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "bodyText")]
    pub content: String,
    #[serde(
        default,
        rename = "tabId",
        skip_serializing_if = "Option::is_none"
    )]
    pub tab_id: Option<ResourceId>,
}

impl From<&ExtractedContent> for SubmissionPayload {
    fn from(content: &ExtractedContent) -> Self {
        Self {
            url: content.source_url.clone(),
            title: content.title.clone(),
            content: content.body_text.clone(),
            tab_id: None,
        }
    }
}
