use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use awsteam_client::{ClientConfig, HttpGraphTransport, ProviderConfig, SharedTransport};
use serde_json::Value;
use tracing::info;

use crate::codec::Attributes;
use crate::data_sources::{AccountsDataSource, DataSource, SettingsDataSource};
use crate::errors::{CodecError, ProviderError};
use crate::reconciler::{PlanAction, ReadOutcome, Reconciler, Resource};
use crate::resources::{
    AccountApprovers, GroupEligibility, OuApprovers, Settings, UserEligibility,
};

/// Name the provider is registered under by the configuration engine.
pub const PROVIDER_TYPE_NAME: &str = "awsteam";

/// Resource operations over JSON attribute snapshots.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    /// Checks a declared configuration, including attribute formats, without
    /// any backend call.
    fn validate_config(&self, desired: Value) -> Result<(), ProviderError>;
    async fn create(&self, desired: Value) -> Result<Value, ProviderError>;
    /// `None` means the record is gone and should be removed from state.
    async fn read(&self, state: Value) -> Result<Option<Value>, ProviderError>;
    async fn update(&self, previous: Value, planned: Value) -> Result<Value, ProviderError>;
    async fn delete(&self, state: Value) -> Result<(), ProviderError>;
    async fn import(&self, id: &str) -> Result<Option<Value>, ProviderError>;
    fn plan(&self, previous: Value, planned: Value) -> Result<PlanAction, ProviderError>;
}

fn decode<R: Resource>(value: Value) -> Result<R::State, CodecError> {
    R::decode_attributes(&Attributes::from_value(R::TYPE_NAME, value)?)
}

fn encode<R: Resource>(state: &R::State) -> Result<Value, CodecError> {
    Ok(R::encode_attributes(state)?.into_value())
}

fn encode_outcome<R: Resource>(outcome: ReadOutcome<R::State>) -> Result<Option<Value>, ProviderError> {
    match outcome {
        ReadOutcome::Present(state) => Ok(Some(encode::<R>(&state)?)),
        ReadOutcome::Removed => Ok(None),
    }
}

#[async_trait]
impl<R: Resource> ResourceHandler for Reconciler<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn validate_config(&self, desired: Value) -> Result<(), ProviderError> {
        Reconciler::<R>::validate_config(&decode::<R>(desired)?)
    }

    async fn create(&self, desired: Value) -> Result<Value, ProviderError> {
        let desired = decode::<R>(desired)?;
        let state = Reconciler::<R>::create(self, &desired).await?;
        Ok(encode::<R>(&state)?)
    }

    async fn read(&self, state: Value) -> Result<Option<Value>, ProviderError> {
        let state = decode::<R>(state)?;
        let outcome = Reconciler::<R>::read(self, &state).await?;
        encode_outcome::<R>(outcome)
    }

    async fn update(&self, previous: Value, planned: Value) -> Result<Value, ProviderError> {
        let previous = decode::<R>(previous)?;
        let planned = decode::<R>(planned)?;
        let state = Reconciler::<R>::update(self, &previous, &planned).await?;
        Ok(encode::<R>(&state)?)
    }

    async fn delete(&self, state: Value) -> Result<(), ProviderError> {
        let state = decode::<R>(state)?;
        Reconciler::<R>::delete(self, &state).await
    }

    async fn import(&self, id: &str) -> Result<Option<Value>, ProviderError> {
        let outcome = Reconciler::<R>::import(self, id).await?;
        encode_outcome::<R>(outcome)
    }

    fn plan(&self, previous: Value, planned: Value) -> Result<PlanAction, ProviderError> {
        let previous = decode::<R>(previous)?;
        let planned = decode::<R>(planned)?;
        Reconciler::<R>::plan(&previous, &planned)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("`{0}` already registered")]
    AlreadyRegistered(String),
}

/// Resource and data source handlers keyed by type name.
#[derive(Default)]
pub struct ProviderRegistry {
    resources: HashMap<&'static str, Arc<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Arc<dyn DataSource>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every resource type and data source over `transport`.
    pub fn with_transport(transport: SharedTransport) -> Self {
        let mut registry = Self::new();
        let handlers: [Arc<dyn ResourceHandler>; 5] = [
            Arc::new(Reconciler::<Settings>::new(transport.clone())),
            Arc::new(Reconciler::<AccountApprovers>::new(transport.clone())),
            Arc::new(Reconciler::<OuApprovers>::new(transport.clone())),
            Arc::new(Reconciler::<UserEligibility>::new(transport.clone())),
            Arc::new(Reconciler::<GroupEligibility>::new(transport.clone())),
        ];
        for handler in handlers {
            registry.resources.insert(handler.type_name(), handler);
        }
        let sources: [Arc<dyn DataSource>; 2] = [
            Arc::new(AccountsDataSource::new(transport.clone())),
            Arc::new(SettingsDataSource::new(transport)),
        ];
        for source in sources {
            registry.data_sources.insert(source.type_name(), source);
        }
        registry
    }

    /// Resolves provider configuration and wires the HTTP transport.
    pub fn configure(config: Value) -> Result<Self, ProviderError> {
        let explicit: ProviderConfig = if config.is_null() {
            ProviderConfig::default()
        } else {
            serde_json::from_value(config)
                .map_err(|err| ProviderError::config("provider", err.to_string()))?
        };
        let resolved = ClientConfig::resolve(&explicit)?;
        let transport = HttpGraphTransport::new(resolved)
            .map_err(|err| ProviderError::client("configure provider", err))?;
        let registry = Self::with_transport(transport.shared());
        info!(
            provider = PROVIDER_TYPE_NAME,
            resources = registry.resources.len(),
            data_sources = registry.data_sources.len(),
            "provider configured"
        );
        Ok(registry)
    }

    pub fn register_resource(
        &mut self,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<(), RegistryError> {
        let name = handler.type_name();
        if self.resources.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.resources.insert(name, handler);
        Ok(())
    }

    pub fn register_data_source(
        &mut self,
        source: Arc<dyn DataSource>,
    ) -> Result<(), RegistryError> {
        let name = source.type_name();
        if self.data_sources.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.data_sources.insert(name, source);
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Result<Arc<dyn ResourceHandler>, ProviderError> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResource(name.to_string()))
    }

    pub fn data_source(&self, name: &str) -> Result<Arc<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResource(name.to_string()))
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.resources.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn data_source_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.data_sources.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
