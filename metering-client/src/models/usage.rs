//! Usage submission document model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Synthetic span of a demo usage event in milliseconds. A demo convention,
/// not a real metering interval.
const DEMO_USAGE_SPAN_MS: i64 = 10;

/// One measured metric inside a usage event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMeasure {
    pub measure: String,
    pub quantity: i64,
}

/// Usage document submitted to the collector.
///
/// Field declaration order matches the collector's wire format. Absent
/// fields are omitted from the output, never emitted as null. Unknown
/// inbound fields land in `extra` and round-trip verbatim, uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_usage: Option<Vec<UsageMeasure>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl UsageDocument {
    /// Build a demo usage event: `start = now`, `end = start + 10ms`, the
    /// application reporting the usage is also the consumer. Pure
    /// construction; empty measure lists are accepted as-is.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        app_id: &str,
        space_id: &str,
        organization_id: &str,
        resource_id: &str,
        resource_instance_id: &str,
        plan_id: &str,
        measures: Vec<UsageMeasure>,
        now: DateTime<Utc>,
    ) -> Self {
        let start = now.timestamp_millis();
        Self {
            consumer_id: Some(app_id.to_string()),
            space_id: Some(space_id.to_string()),
            organization_id: Some(organization_id.to_string()),
            resource_id: Some(resource_id.to_string()),
            resource_instance_id: Some(resource_instance_id.to_string()),
            plan_id: Some(plan_id.to_string()),
            start: Some(start),
            end: Some(start + DEMO_USAGE_SPAN_MS),
            measured_usage: Some(measures),
            extra: BTreeMap::new(),
        }
    }
}
