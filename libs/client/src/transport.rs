use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::errors::{ClientError, GraphError};
use crate::token::TokenSource;

/// Executes a GraphQL document and hands back the raw `data` object.
#[async_trait]
pub trait GraphTransport: Send + Sync {
    async fn execute(&self, document: &str, variables: Value) -> Result<Bytes, ClientError>;
}

pub type SharedTransport = Arc<dyn GraphTransport>;

#[derive(Serialize)]
struct GraphRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphError>,
}

/// Reqwest-backed transport authenticating with client-credentials tokens.
pub struct HttpGraphTransport {
    http: Client,
    endpoint: Url,
    tokens: TokenSource,
}

impl HttpGraphTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(concat!("awsteam-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: Client, config: ClientConfig) -> Self {
        let tokens = TokenSource::new(
            http.clone(),
            config.token_endpoint,
            config.client_id,
            config.client_secret,
        );
        Self {
            http,
            endpoint: config.graph_endpoint,
            tokens,
        }
    }

    pub fn shared(self) -> SharedTransport {
        Arc::new(self)
    }
}

#[async_trait]
impl GraphTransport for HttpGraphTransport {
    async fn execute(&self, document: &str, variables: Value) -> Result<Bytes, ClientError> {
        let operation = operation_name(document);
        debug!(operation, "executing graph operation");

        let token = self.tokens.bearer().await?;
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(&GraphRequest {
                query: document,
                variables,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphResponse = serde_json::from_str(&body)?;
        if !envelope.errors.is_empty() {
            debug!(operation, errors = envelope.errors.len(), "graph operation failed");
            return Err(ClientError::Graph {
                errors: envelope.errors,
            });
        }

        let data = envelope.data.unwrap_or(Value::Null);
        Ok(Bytes::from(serde_json::to_vec(&data)?))
    }
}

/// Name of the first operation declared in `document`, used for logging.
pub fn operation_name(document: &str) -> &str {
    let mut words = document
        .split(|c: char| c.is_whitespace() || c == '(' || c == '{')
        .filter(|word| !word.is_empty());
    match words.next() {
        Some("query" | "mutation" | "subscription") => words.next().unwrap_or("anonymous"),
        _ => "anonymous",
    }
}
