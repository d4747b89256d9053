use std::num::ParseIntError;

use awsteam_client::{ClientError, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{field}: `{value}` is not a valid integer")]
    InvalidInteger {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("failed to encode {field}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {field}")]
    Decode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{resource} attributes must be a JSON object")]
    NotAnObject { resource: &'static str },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid configuration for {field}: {message}")]
    Config { field: String, message: String },
    #[error("unable to {action}, got error: {source}")]
    Client {
        action: String,
        #[source]
        source: ClientError,
    },
    #[error("received empty result from {operation}")]
    EmptyResult { operation: &'static str },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("{resource}: changing {} requires replacement", .fields.join(", "))]
    RequiresReplacement {
        resource: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("unknown resource type `{0}`")]
    UnknownResource(String),
    #[error("provider configuration: {0}")]
    Configuration(#[from] ConfigError),
}

impl ProviderError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn client(action: impl Into<String>, source: ClientError) -> Self {
        ProviderError::Client {
            action: action.into(),
            source,
        }
    }
}
