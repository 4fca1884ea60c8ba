//! HTTP clients for the collector, reporting and token-exchange endpoints.

mod collector;
mod reporting;
mod uaa;

pub use collector::{CollectorClient, SubmissionOutcome};
pub use reporting::ReportingClient;
pub use uaa::UaaClient;
