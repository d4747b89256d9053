use std::{env, fmt};

use serde::Deserialize;
use url::Url;

use crate::errors::{ConfigError, MissingValue};

pub const ENV_CLIENT_ID: &str = "AWSTEAM_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AWSTEAM_CLIENT_SECRET";
pub const ENV_GRAPH_ENDPOINT: &str = "AWSTEAM_GRAPH_ENDPOINT";
pub const ENV_TOKEN_ENDPOINT: &str = "AWSTEAM_TOKEN_ENDPOINT";

/// Provider configuration block as declared by the operator. Every value is
/// optional here and falls back to its environment variable.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub graph_endpoint: Option<String>,
    #[serde(default)]
    pub token_endpoint: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("graph_endpoint", &self.graph_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}

/// Fully resolved settings used to construct the backend client.
#[derive(Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub graph_endpoint: Url,
    pub token_endpoint: Url,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("graph_endpoint", &self.graph_endpoint.as_str())
            .field("token_endpoint", &self.token_endpoint.as_str())
            .finish()
    }
}

impl ClientConfig {
    /// Resolves explicit values first and the `AWSTEAM_*` environment second.
    pub fn resolve(explicit: &ProviderConfig) -> Result<Self, ConfigError> {
        Self::resolve_with(explicit, |name| env::var(name).ok())
    }

    pub fn resolve_with<F>(explicit: &ProviderConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut pick = |field: &'static str, env: &'static str, value: &Option<String>| {
            let resolved = non_blank(value.clone()).or_else(|| non_blank(lookup(env)));
            if resolved.is_none() {
                missing.push(MissingValue { field, env });
            }
            resolved
        };

        let client_id = pick("client_id", ENV_CLIENT_ID, &explicit.client_id);
        let client_secret = pick("client_secret", ENV_CLIENT_SECRET, &explicit.client_secret);
        let graph_endpoint = pick("graph_endpoint", ENV_GRAPH_ENDPOINT, &explicit.graph_endpoint);
        let token_endpoint = pick("token_endpoint", ENV_TOKEN_ENDPOINT, &explicit.token_endpoint);

        match (client_id, client_secret, graph_endpoint, token_endpoint) {
            (Some(client_id), Some(client_secret), Some(graph), Some(token)) => Ok(Self {
                client_id,
                client_secret,
                graph_endpoint: parse_url("graph_endpoint", &graph)?,
                token_endpoint: parse_url("token_endpoint", &token)?,
            }),
            _ => Err(ConfigError::Missing(missing)),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })
}
