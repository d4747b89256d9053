use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Error class the backend reports when a conditional write finds an existing record.
pub const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

/// A single entry from a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphError {
    pub message: String,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub path: Vec<Value>,
}

impl GraphError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            path: Vec::new(),
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }
}

/// A configuration value that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValue {
    pub field: &'static str,
    pub env: &'static str,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}", describe_missing(.0))]
    Missing(Vec<MissingValue>),
    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}

impl ConfigError {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self {
            ConfigError::Missing(values) => values.iter().map(|value| value.field).collect(),
            ConfigError::InvalidUrl { .. } => Vec::new(),
        }
    }
}

fn describe_missing(values: &[MissingValue]) -> String {
    values
        .iter()
        .map(|value| {
            format!(
                "missing {}: set it in the provider configuration or export {}",
                value.field, value.env
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("graph endpoint returned status={status} body={body}")]
    Status { status: u16, body: String },
    #[error("token exchange failed: {0}")]
    Token(String),
    #[error("graph request returned errors: {}", join_messages(.errors))]
    Graph { errors: Vec<GraphError> },
    #[error("invalid graph response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// True when any GraphQL error carries the given error class, either as
    /// its `errorType` or as part of its message.
    pub fn has_error_class(&self, class: &str) -> bool {
        match self {
            ClientError::Graph { errors } => errors.iter().any(|error| {
                error
                    .error_type
                    .as_deref()
                    .is_some_and(|kind| kind.contains(class))
                    || error.message.contains(class)
            }),
            _ => false,
        }
    }
}

fn join_messages(errors: &[GraphError]) -> String {
    errors
        .iter()
        .map(|error| match &error.error_type {
            Some(kind) => format!("{} ({kind})", error.message),
            None => error.message.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
