//! Demo flow: submit a few usage events, then read them back from the
//! organization's aggregated report.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use reqwest::Client;
use uuid::Uuid;

use metering_client::config::Settings;
use metering_client::models::{
    extract_summary, monthly_plan_summaries, Granularity, UsageDocument, UsageMeasure,
    CURRENT_MONTH,
};
use metering_client::services::{CollectorClient, ReportingClient, UaaClient};
use metering_client::ClientError;

/// Delay between demo steps. The aggregation pipeline is eventually
/// consistent and needs a moment to fold submissions into the report; this
/// is a demo workaround, not a correctness guarantee.
const STEP_DELAY: Duration = Duration::from_secs(2);

const SUBMISSIONS: usize = 3;

/// Metric whose space-level monthly summary the demo extracts.
const DEMO_METRIC: &str = "heavy_api_calls";

fn demo_measures() -> Vec<UsageMeasure> {
    vec![
        UsageMeasure {
            measure: "storage".to_string(),
            quantity: 1_073_741_824,
        },
        UsageMeasure {
            measure: "light_api_calls".to_string(),
            quantity: 1000,
        },
        UsageMeasure {
            measure: "heavy_api_calls".to_string(),
            quantity: 100,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,usage_demo=debug")),
        )
        .init();

    let settings = Settings::from_env().context("resolving platform settings")?;
    tracing::info!(
        org_id = %settings.org_id,
        space_id = %settings.space_id,
        resource_id = %settings.resource_id,
        plan_id = %settings.plan_id,
        "Loaded platform settings"
    );

    let client = Client::new();
    let token_url = UaaClient::discover_token_url(&client, &settings.cf_api_url)
        .await
        .context("discovering token endpoint")?;
    tracing::debug!(token_url = %token_url, "Resolved token endpoint");

    let uaa = Arc::new(UaaClient::new(
        client.clone(),
        token_url,
        settings.client_id.clone(),
        settings.client_secret.clone(),
    ));
    let collector = CollectorClient::new(client.clone(), settings.collector_url.clone(), uaa.clone());
    let reporting = ReportingClient::new(client, settings.reporting_url.clone(), uaa);

    // One resource instance for the whole run, so the submissions aggregate
    // under a single entry in the report.
    let instance_id = Uuid::new_v4().to_string();

    for step in 1..=SUBMISSIONS {
        let document = UsageDocument::build(
            &settings.app_id,
            &settings.space_id,
            &settings.org_id,
            &settings.resource_id,
            &instance_id,
            &settings.plan_id,
            demo_measures(),
            Utc::now(),
        );
        let outcome = collector
            .submit(&document)
            .await
            .with_context(|| format!("submitting usage document {}", step))?;
        tracing::info!(
            step,
            status = %outcome.status,
            location = ?outcome.location,
            "Usage document submitted"
        );
        tokio::time::sleep(STEP_DELAY).await;
    }

    let report = reporting
        .organization_report(&settings.org_id, Utc::now())
        .await
        .context("fetching aggregated usage report")?;

    match extract_summary(
        &report,
        &settings.space_id,
        &settings.resource_id,
        DEMO_METRIC,
        Granularity::Month,
        CURRENT_MONTH,
    ) {
        Ok(summary) => {
            tracing::info!(metric = DEMO_METRIC, summary, "Current-month space summary")
        }
        Err(ClientError::NotFound(cause)) => {
            tracing::warn!("No space-level aggregate yet: {}", cause)
        }
        Err(e) => return Err(e).context("extracting space summary"),
    }

    match monthly_plan_summaries(&report, &settings.resource_id) {
        Ok(summaries) => {
            for entry in summaries {
                tracing::info!(
                    metric = %entry.metric,
                    summary = entry.summary,
                    "Current-month plan summary"
                );
            }
        }
        Err(ClientError::NotFound(cause)) => {
            tracing::warn!("No organization-level aggregate yet: {}", cause)
        }
        Err(e) => return Err(e).context("extracting plan summaries"),
    }

    Ok(())
}
