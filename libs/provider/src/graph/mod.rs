pub mod documents;
pub mod models;

use awsteam_client::{ClientError, SharedTransport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub use documents::Operation;

use crate::codec;
use crate::errors::{CodecError, ProviderError};

/// A prepared operation: the document plus its variables.
#[derive(Debug, Clone)]
pub struct GraphRequest {
    pub operation: Operation,
    pub variables: Value,
}

impl GraphRequest {
    pub fn with_input<T: Serialize>(operation: Operation, input: &T) -> Result<Self, CodecError> {
        let input = codec::encode_value("input", input)?;
        Ok(Self {
            operation,
            variables: json!({ "input": input }),
        })
    }

    pub fn by_id(operation: Operation, id: &str) -> Self {
        Self {
            operation,
            variables: json!({ "id": id }),
        }
    }

    pub fn delete(operation: Operation, id: &str) -> Self {
        Self {
            operation,
            variables: json!({ "input": { "id": id } }),
        }
    }

    pub fn bare(operation: Operation) -> Self {
        Self {
            operation,
            variables: json!({}),
        }
    }
}

/// Thin wrapper running prepared requests on the shared transport.
#[derive(Clone)]
pub struct GraphClient {
    transport: SharedTransport,
}

impl GraphClient {
    pub fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    pub async fn execute(&self, request: &GraphRequest) -> Result<bytes::Bytes, ClientError> {
        self.transport
            .execute(request.operation.document, request.variables.clone())
            .await
    }

    /// Executes `request` and decodes the record under its top-level key.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: &GraphRequest,
        action: impl Into<String>,
    ) -> Result<Option<T>, ProviderError> {
        let raw = self
            .execute(request)
            .await
            .map_err(|err| ProviderError::client(action, err))?;
        Ok(codec::decode_payload(request.operation.key, &raw)?)
    }
}
