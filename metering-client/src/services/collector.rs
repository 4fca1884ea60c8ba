//! Client for the usage collector endpoint.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::{Client, StatusCode};

use crate::error::ClientError;
use crate::models::UsageDocument;
use crate::services::UaaClient;

/// What the collector answered to a submission. Non-2xx statuses are data,
/// not errors; the caller decides how to present them.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub status: StatusCode,
    pub location: Option<String>,
}

pub struct CollectorClient {
    client: Client,
    collector_url: String,
    uaa: Arc<UaaClient>,
}

impl CollectorClient {
    pub fn new(client: Client, collector_url: String, uaa: Arc<UaaClient>) -> Self {
        Self {
            client,
            collector_url,
            uaa,
        }
    }

    /// POST a usage document with bearer authorization.
    pub async fn submit(&self, document: &UsageDocument) -> Result<SubmissionOutcome, ClientError> {
        let authorization = self.uaa.authorization().await?;

        tracing::debug!(url = %self.collector_url, "Submitting usage document");
        let response = self
            .client
            .post(&self.collector_url)
            .header(AUTHORIZATION, authorization)
            .json(document)
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        tracing::debug!(status = %status, location = ?location, "Collector responded");

        Ok(SubmissionOutcome { status, location })
    }
}
