//! Reconciliation of AWS TEAM settings, approver policies and eligibility
//! policies.
//!
//! Each resource type is described by a [`reconciler::Resource`]
//! implementation and driven by the generic [`reconciler::Reconciler`].
//! [`registry::ProviderRegistry`] exposes them to a configuration engine
//! over JSON attribute snapshots.

pub mod change;
pub mod codec;
pub mod data_sources;
pub mod errors;
pub mod graph;
pub mod reconciler;
pub mod registry;
pub mod resources;
pub mod telemetry;
pub mod validate;

pub use errors::{CodecError, ProviderError};
pub use reconciler::{PlanAction, ReadOutcome, Reconciler, Resource};
pub use registry::{PROVIDER_TYPE_NAME, ProviderRegistry, ResourceHandler};
