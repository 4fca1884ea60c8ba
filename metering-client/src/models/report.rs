//! Aggregated usage report model and extraction.
//!
//! The report is an immutable tree: organization at the root, then spaces,
//! resources, plans, per-metric aggregated usage, and finally time windows.
//! Payloads are small (one organization's worth of spaces and resources),
//! so every lookup is a linear scan, first match wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Number of window groups every aggregated usage entry must carry, one per
/// granularity.
pub const WINDOW_GROUPS: usize = 5;

/// Slot of the current month's aggregate inside the month window group.
pub const CURRENT_MONTH: usize = 0;

/// Slot of the previous month's aggregate inside the month window group.
pub const PREVIOUS_MONTH: usize = 1;

/// Time-bucket granularity selecting a window group.
///
/// The discriminants are positions in the report's `windows` array; keeping
/// the mapping in one named enumeration turns a wrong-index bug into an
/// explicit malformed-report error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Seconds = 0,
    Minutes = 1,
    Hours = 2,
    Days = 3,
    Month = 4,
}

impl Granularity {
    /// Position of this granularity's window group.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// A single time-bucketed aggregate. `summary` is the cumulative value used
/// for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub quantity: i64,
    pub summary: i64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A metric's accumulated quantity over the fixed set of window groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedUsage {
    pub metric: String,
    pub windows: Vec<Vec<Window>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AggregatedUsage {
    /// Window group for a granularity.
    ///
    /// Fewer than five groups violates the report contract and is surfaced
    /// as `MalformedReport`, never silently defaulted.
    pub fn window_group(&self, granularity: Granularity) -> Result<&[Window], ClientError> {
        if self.windows.len() < WINDOW_GROUPS {
            return Err(ClientError::MalformedReport(anyhow::anyhow!(
                "aggregated usage for metric '{}' has {} window groups, expected {}",
                self.metric,
                self.windows.len(),
                WINDOW_GROUPS
            )));
        }
        Ok(&self.windows[granularity.ordinal()])
    }

    /// Summary value of the window at `window_index` within the group for
    /// `granularity`. A missing window is a `MalformedReport` error.
    pub fn summary(
        &self,
        granularity: Granularity,
        window_index: usize,
    ) -> Result<i64, ClientError> {
        let group = self.window_group(granularity)?;
        let window = group.get(window_index).ok_or_else(|| {
            ClientError::MalformedReport(anyhow::anyhow!(
                "window group {} for metric '{}' has {} windows, no index {}",
                granularity.ordinal(),
                self.metric,
                group.len(),
                window_index
            ))
        })?;
        Ok(window.summary)
    }
}

/// Usage aggregated under one resource plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metering_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_plan_id: Option<String>,
    #[serde(default)]
    pub aggregated_usage: Vec<AggregatedUsage>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A billable resource. The same shape appears directly under the report,
/// under a space, and under a consumer; only the scope differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_id: String,
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub aggregated_usage: Vec<AggregatedUsage>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Resource {
    /// Resource-level aggregated usage for a metric, exact case-sensitive
    /// match. Plan-level usage is reached through `plans` instead.
    pub fn metric(&self, name: &str) -> Option<&AggregatedUsage> {
        self.aggregated_usage.iter().find(|u| u.metric == name)
    }
}

/// Usage attributed to one consumer (application) within a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    pub consumer_id: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Consumer {
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.resource_id == id)
    }
}

/// One space's slice of the organization report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub space_id: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub consumers: Vec<Consumer>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Space {
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.resource_id == id)
    }

    pub fn consumer(&self, id: &str) -> Option<&Consumer> {
        self.consumers.iter().find(|c| c.consumer_id == id)
    }
}

/// Root of the aggregation tree for one organization.
///
/// Two parallel top-level collections exist: the flat `resources` rollup
/// and the `spaces` hierarchy. Lookups pick the collection matching the
/// scope they are querying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_id: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub spaces: Vec<Space>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Report {
    pub fn space(&self, id: &str) -> Option<&Space> {
        self.spaces.iter().find(|s| s.space_id == id)
    }

    /// Organization-level resource rollup, not the per-space entries.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.resource_id == id)
    }
}

/// Walk spaces → resources → aggregated usage → windows and return the
/// summary of one window.
///
/// A missing space, resource or metric is `NotFound`; a window structure
/// that does not match the five-group contract is `MalformedReport`.
pub fn extract_summary(
    report: &Report,
    space_id: &str,
    resource_id: &str,
    metric: &str,
    granularity: Granularity,
    window_index: usize,
) -> Result<i64, ClientError> {
    let space = report.space(space_id).ok_or_else(|| {
        ClientError::NotFound(anyhow::anyhow!("no space '{}' in report", space_id))
    })?;
    let resource = space.resource(resource_id).ok_or_else(|| {
        ClientError::NotFound(anyhow::anyhow!(
            "no resource '{}' in space '{}'",
            resource_id,
            space_id
        ))
    })?;
    let usage = resource.metric(metric).ok_or_else(|| {
        ClientError::NotFound(anyhow::anyhow!(
            "no aggregated usage for metric '{}' on resource '{}'",
            metric,
            resource_id
        ))
    })?;
    usage.summary(granularity, window_index)
}

/// A metric paired with its current-month summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSummary {
    pub metric: String,
    pub summary: i64,
}

/// Current-month summaries for every metric of every plan of one resource,
/// walking the organization-level resource rollup.
pub fn monthly_plan_summaries(
    report: &Report,
    resource_id: &str,
) -> Result<Vec<MetricSummary>, ClientError> {
    let resource = report.resource(resource_id).ok_or_else(|| {
        ClientError::NotFound(anyhow::anyhow!("no resource '{}' in report", resource_id))
    })?;

    let mut summaries = Vec::new();
    for plan in &resource.plans {
        for usage in &plan.aggregated_usage {
            summaries.push(MetricSummary {
                metric: usage.metric.clone(),
                summary: usage.summary(Granularity::Month, CURRENT_MONTH)?,
            });
        }
    }
    Ok(summaries)
}
