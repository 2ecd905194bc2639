//! Forwarding a finalized selection to the processing endpoint
//!
//! One POST per commit. No retry, no deduplication; the response body is
//! only logged.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::domain::submission::SubmissionRequest;

/// Submission failures
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endpoint rejected submission with status {status}")]
    Rejected { status: u16, body: String },
}

/// What the endpoint answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub status: u16,
    pub body: String,
}

/// Sends submissions to the remote endpoint
pub trait PromptSubmitter: Send + Sync {
    fn submit(&self, request: &SubmissionRequest) -> Result<Acknowledgement, SubmissionError>;
}

/// Blocking JSON-over-HTTP submitter
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: Client,
    endpoint: String,
}

impl HttpSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Uses an already configured HTTP client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl PromptSubmitter for HttpSubmitter {
    fn submit(&self, request: &SubmissionRequest) -> Result<Acknowledgement, SubmissionError> {
        log::debug!(
            "Submitting {} / {} to {}",
            request.coordinate(),
            request.radius(),
            self.endpoint
        );

        let response = self.client.post(&self.endpoint).json(&request.body()).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Acknowledgement {
            status: status.as_u16(),
            body,
        })
    }
}
