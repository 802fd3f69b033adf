use std::time::Duration;

use engine_logging::engine_debug;
use harvester_core::{ExtractedContent, SubmissionPayload};
use url::Url;

use crate::capability::Submitter;
use crate::{SubmitOutcome, TransportCause, TransportError};

#[derive(Debug, Clone)]
pub struct SubmitSettings {
    pub endpoint: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl SubmitSettings {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Posts `{url, title, content}` JSON to the configured endpoint, once per resource.
#[derive(Debug, Clone)]
pub struct ReqwestSubmitter {
    settings: SubmitSettings,
    client: reqwest::Client,
}

impl ReqwestSubmitter {
    pub fn new(settings: SubmitSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self { settings, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.settings.endpoint
    }
}

#[async_trait::async_trait]
impl Submitter for ReqwestSubmitter {
    async fn submit(&self, content: &ExtractedContent) -> SubmitOutcome {
        let payload = SubmissionPayload::from(content);
        let response = self
            .client
            .post(self.settings.endpoint.clone())
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                engine_debug!(
                    "submitted {} ({} bytes) -> {}",
                    payload.url,
                    payload.content.len(),
                    status
                );
                if status.is_success() {
                    SubmitOutcome::Accepted
                } else {
                    SubmitOutcome::Rejected(status.as_u16())
                }
            }
            Err(err) => SubmitOutcome::TransportFailure(map_reqwest_error(err)),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportCause::Timeout, err.to_string());
    }
    if err.is_connect() {
        return TransportError::new(TransportCause::Connect, err.to_string());
    }
    TransportError::new(TransportCause::Other, err.to_string())
}
