//! In-memory transport for exercising reconcilers without a network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::errors::{ClientError, GraphError};
use crate::transport::{GraphTransport, SharedTransport, operation_name};

#[derive(Debug, Clone)]
enum Scripted {
    Data(Value),
    GraphErrors(Vec<GraphError>),
    Status(u16, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub document: String,
    pub variables: Value,
}

/// Replays scripted responses in order and records every call it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response whose `data` object is `data`.
    pub fn respond_with(self, data: Value) -> Self {
        self.push(Scripted::Data(data));
        self
    }

    pub fn fail_with_graph_errors(self, errors: Vec<GraphError>) -> Self {
        self.push(Scripted::GraphErrors(errors));
        self
    }

    pub fn fail_with_status(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Scripted::Status(status, body.into()));
        self
    }

    pub fn shared(&self) -> SharedTransport {
        Arc::new(self.clone())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.operation).collect()
    }

    pub fn pending_responses(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, scripted: Scripted) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(scripted);
    }
}

#[async_trait]
impl GraphTransport for RecordingTransport {
    async fn execute(&self, document: &str, variables: Value) -> Result<Bytes, ClientError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                operation: operation_name(document).to_string(),
                document: document.to_string(),
                variables,
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Scripted::Data(data)) => Ok(Bytes::from(serde_json::to_vec(&data)?)),
            Some(Scripted::GraphErrors(errors)) => Err(ClientError::Graph { errors }),
            Some(Scripted::Status(status, body)) => Err(ClientError::Status { status, body }),
            None => Err(ClientError::Graph {
                errors: vec![GraphError::new(format!(
                    "no scripted response for {}",
                    operation_name(document)
                ))],
            }),
        }
    }
}
