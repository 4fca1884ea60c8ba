use thiserror::Error;

/// Errors surfaced by the metering client.
///
/// `NotFound` means a requested space/resource/consumer/metric has no entry
/// in the report tree and is a legitimate "no data yet" outcome.
/// `MalformedReport` means the service sent a shape that violates the report
/// contract; the two are kept distinct so callers can tell them apart.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Malformed report: {0}")]
    MalformedReport(anyhow::Error),

    #[error("Authentication error: {0}")]
    AuthError(anyhow::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}
