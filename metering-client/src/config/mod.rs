//! Platform-provided configuration.
//!
//! The demo resolves everything it needs from the environment the platform
//! injects: application metadata, the bound metering service credentials,
//! and the reporting endpoint.

use std::collections::BTreeMap;
use std::env;

use secrecy::Secret;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;

/// Platform application metadata (JSON).
pub const ENV_APPLICATION_INFO: &str = "VCAP_APPLICATION";
/// Bound service credentials (JSON).
pub const ENV_SERVICES_INFO: &str = "VCAP_SERVICES";
/// Organization the space belongs to.
pub const ENV_ORG_GUID: &str = "ORG_GUID";
/// Aggregated usage reporting endpoint.
pub const ENV_REPORTING_URL: &str = "REPORTING_URL";
/// Optional override of the bound collector endpoint.
pub const ENV_COLLECTOR_URL: &str = "COLLECTOR_URL";
/// Optional plan under which usage is submitted.
pub const ENV_PLAN_ID: &str = "PLAN_ID";

/// Name of the service block carrying the metering binding.
const METERING_SERVICE: &str = "metering";

const DEFAULT_PLAN_ID: &str = "standard";

#[derive(Debug, Deserialize)]
struct ApplicationInfo {
    cf_api: String,
    application_id: String,
    space_id: String,
}

#[derive(Debug, Deserialize)]
struct ServiceBinding {
    credentials: MeteringCredentials,
}

#[derive(Debug, Deserialize)]
struct MeteringCredentials {
    client_id: String,
    client_secret: String,
    resource_id: String,
    collector_url: String,
}

/// Resolved context for talking to the metering service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cloud controller API, used to discover the token endpoint.
    pub cf_api_url: String,
    pub app_id: String,
    pub space_id: String,
    pub org_id: String,
    pub resource_id: String,
    pub plan_id: String,
    pub collector_url: String,
    pub reporting_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
}

impl Settings {
    /// Resolve settings from the platform-provided environment variables.
    ///
    /// Outside a platform environment the same variables can be set by
    /// hand; a missing one is a configuration error naming the variable.
    pub fn from_env() -> Result<Self, ClientError> {
        let app_info: ApplicationInfo = parse_env_json(ENV_APPLICATION_INFO)?;
        let services: BTreeMap<String, Vec<ServiceBinding>> = parse_env_json(ENV_SERVICES_INFO)?;

        let binding = services
            .get(METERING_SERVICE)
            .and_then(|bindings| bindings.first())
            .ok_or_else(|| {
                ClientError::ConfigError(anyhow::anyhow!(
                    "no '{}' service binding in {}",
                    METERING_SERVICE,
                    ENV_SERVICES_INFO
                ))
            })?;

        let collector_url = env::var(ENV_COLLECTOR_URL)
            .unwrap_or_else(|_| binding.credentials.collector_url.clone());
        let plan_id =
            env::var(ENV_PLAN_ID).unwrap_or_else(|_| DEFAULT_PLAN_ID.to_string());

        Ok(Self {
            cf_api_url: app_info.cf_api,
            app_id: app_info.application_id,
            space_id: app_info.space_id,
            org_id: get_env(ENV_ORG_GUID)?,
            resource_id: binding.credentials.resource_id.clone(),
            plan_id,
            collector_url,
            reporting_url: get_env(ENV_REPORTING_URL)?,
            client_id: binding.credentials.client_id.clone(),
            client_secret: Secret::new(binding.credentials.client_secret.clone()),
        })
    }
}

fn get_env(key: &str) -> Result<String, ClientError> {
    env::var(key).map_err(|_| {
        ClientError::ConfigError(anyhow::anyhow!("{} is required but not set", key))
    })
}

fn parse_env_json<T: DeserializeOwned>(key: &str) -> Result<T, ClientError> {
    let raw = get_env(key)?;
    serde_json::from_str(&raw)
        .map_err(|e| ClientError::ConfigError(anyhow::anyhow!("invalid JSON in {}: {}", key, e)))
}
