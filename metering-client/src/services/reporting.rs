//! Client for the aggregated usage reporting endpoint.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ClientError;
use crate::models::Report;
use crate::services::UaaClient;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

pub struct ReportingClient {
    client: Client,
    reporting_url: String,
    uaa: Arc<UaaClient>,
}

impl ReportingClient {
    pub fn new(client: Client, reporting_url: String, uaa: Arc<UaaClient>) -> Self {
        Self {
            client,
            reporting_url,
            uaa,
        }
    }

    /// Fetch the organization's aggregated usage report as of `now`.
    ///
    /// The endpoint answers either the report document or an
    /// `{error, message}` envelope; the envelope surfaces as `BadGateway`,
    /// a shape that is neither as `MalformedReport`.
    pub async fn organization_report(
        &self,
        org_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Report, ClientError> {
        let url = format!(
            "{}/v1/metering/organizations/{}/aggregated/usage/{}",
            self.reporting_url,
            org_id,
            now.timestamp_millis()
        );
        let authorization = self.uaa.authorization().await?;

        tracing::debug!(url = %url, "Fetching aggregated usage report");
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;
        let status = response.status();

        let body: serde_json::Value = response.json().await?;
        if body.get("error").is_some() {
            let envelope: ErrorEnvelope = serde_json::from_value(body).map_err(|e| {
                ClientError::MalformedReport(anyhow::anyhow!(
                    "unreadable reporting error envelope: {}",
                    e
                ))
            })?;
            let message = envelope.message.unwrap_or_default();
            tracing::warn!(status = %status, error = %envelope.error, "Reporting returned an error");
            return Err(ClientError::BadGateway(format!(
                "{} {}",
                envelope.error, message
            )));
        }
        if !status.is_success() {
            return Err(ClientError::BadGateway(format!(
                "reporting returned status {}",
                status
            )));
        }

        serde_json::from_value(body).map_err(|e| {
            ClientError::MalformedReport(anyhow::anyhow!("unexpected report shape: {}", e))
        })
    }
}
