//! Domain models for the metering client.

mod report;
mod token;
mod usage;

pub use report::{
    extract_summary, monthly_plan_summaries, AggregatedUsage, Consumer, Granularity, MetricSummary,
    Plan, Report, Resource, Space, Window, CURRENT_MONTH, PREVIOUS_MONTH, WINDOW_GROUPS,
};
pub use token::OAuthToken;
pub use usage::{UsageDocument, UsageMeasure};
