//! Backend client for AWS TEAM deployments: configuration resolution,
//! client-credentials token exchange and the GraphQL transport.

pub mod config;
pub mod errors;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod token;
pub mod transport;

pub use config::{ClientConfig, ProviderConfig};
pub use errors::{CONDITIONAL_CHECK_FAILED, ClientError, ConfigError, GraphError};
pub use transport::{GraphTransport, HttpGraphTransport, SharedTransport};
