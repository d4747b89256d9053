//! Generic create/read/update/delete reconciliation driven by per-resource
//! descriptors.

use std::fmt;
use std::marker::PhantomData;

use awsteam_client::{CONDITIONAL_CHECK_FAILED, SharedTransport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::change::{self, FieldSpec, UpdatePlan};
use crate::codec::Attributes;
use crate::errors::{CodecError, ProviderError};
use crate::graph::{GraphClient, GraphRequest};

/// What to do when a create returns nothing or collides with an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateConflict {
    Fail,
    AdoptExisting,
}

/// Describes one resource type to the generic [`Reconciler`].
pub trait Resource: Send + Sync + 'static {
    type State: Clone + fmt::Debug + PartialEq + Send + Sync;
    type Record: DeserializeOwned + Send;

    /// Name the configuration engine uses for this resource type.
    const TYPE_NAME: &'static str;
    /// Human readable record name used in messages.
    const RECORD: &'static str;
    const ON_CREATE_CONFLICT: CreateConflict = CreateConflict::Fail;

    fn fields() -> &'static [FieldSpec];
    fn identity(state: &Self::State) -> Option<&str>;
    fn import_state(id: &str) -> Self::State;
    /// Checks run before every create or update: identity, required values
    /// and cardinality.
    fn validate(desired: &Self::State) -> Result<(), ProviderError>;
    /// Attribute format checks the engine runs while validating
    /// configuration. Not applied on create or update.
    fn validate_schema(_desired: &Self::State) -> Result<(), ProviderError> {
        Ok(())
    }

    fn encode_attributes(state: &Self::State) -> Result<Attributes, CodecError>;
    fn decode_attributes(attrs: &Attributes) -> Result<Self::State, CodecError>;
    fn flatten(record: Self::Record) -> Result<Self::State, CodecError>;

    fn create_request(desired: &Self::State) -> Result<GraphRequest, CodecError>;
    fn read_request(id: &str) -> GraphRequest;
    fn update_request(planned: &Self::State, plan: &UpdatePlan)
    -> Result<GraphRequest, CodecError>;
    fn delete_request(id: &str) -> GraphRequest;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<S> {
    Present(S),
    /// The record no longer exists and should be dropped from state.
    Removed,
}

impl<S> ReadOutcome<S> {
    pub fn present(self) -> Option<S> {
        match self {
            ReadOutcome::Present(state) => Some(state),
            ReadOutcome::Removed => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, ReadOutcome::Removed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanAction {
    NoOp,
    Update { fields: Vec<&'static str> },
    Replace { fields: Vec<&'static str> },
}

pub struct Reconciler<R: Resource> {
    graph: GraphClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for Reconciler<R> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Reconciler<R> {
    pub fn new(transport: SharedTransport) -> Self {
        Self {
            graph: GraphClient::new(transport),
            _resource: PhantomData,
        }
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = R::identity(desired)))]
    pub async fn create(&self, desired: &R::State) -> Result<R::State, ProviderError> {
        R::validate(desired)?;
        let request = R::create_request(desired)?;
        let action = format!("create {}", R::RECORD);

        let outcome = match self.graph.execute(&request).await {
            Ok(raw) => crate::codec::decode_payload::<R::Record>(request.operation.key, &raw)?,
            Err(err)
                if R::ON_CREATE_CONFLICT == CreateConflict::AdoptExisting
                    && err.has_error_class(CONDITIONAL_CHECK_FAILED) =>
            {
                debug!(error = %err, "create rejected by conditional check");
                None
            }
            Err(err) => return Err(ProviderError::client(action, err)),
        };

        match (outcome, R::ON_CREATE_CONFLICT) {
            (Some(record), _) => {
                let state = R::flatten(record)?;
                info!("created {}", R::RECORD);
                Ok(state)
            }
            (None, CreateConflict::AdoptExisting) => self.adopt(desired).await,
            (None, CreateConflict::Fail) => Err(ProviderError::EmptyResult {
                operation: request.operation.name,
            }),
        }
    }

    async fn adopt(&self, desired: &R::State) -> Result<R::State, ProviderError> {
        let id = Self::require_identity(desired)?;
        warn!(
            id,
            "{} already exists; adopting the existing record. Import it explicitly to silence this warning",
            R::RECORD
        );
        match self.read_id(id).await? {
            ReadOutcome::Present(state) => Ok(state),
            ReadOutcome::Removed => Err(ProviderError::EmptyResult {
                operation: R::read_request(id).operation.name,
            }),
        }
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = R::identity(state)))]
    pub async fn read(&self, state: &R::State) -> Result<ReadOutcome<R::State>, ProviderError> {
        let id = Self::require_identity(state)?;
        self.read_id(id).await
    }

    async fn read_id(&self, id: &str) -> Result<ReadOutcome<R::State>, ProviderError> {
        let request = R::read_request(id);
        let record = self
            .graph
            .fetch::<R::Record>(&request, format!("read {}", R::RECORD))
            .await?;
        match record {
            Some(record) => Ok(ReadOutcome::Present(R::flatten(record)?)),
            None => {
                warn!(id, "received empty {}; removing it from state", R::RECORD);
                Ok(ReadOutcome::Removed)
            }
        }
    }

    /// Reads a record given only its identifier.
    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = id))]
    pub async fn import(&self, id: &str) -> Result<ReadOutcome<R::State>, ProviderError> {
        if id.trim().is_empty() {
            return Err(ProviderError::config("id", "import requires an identifier"));
        }
        self.read(&R::import_state(id)).await
    }

    /// Full configuration check: the pre-call checks plus attribute formats.
    pub fn validate_config(desired: &R::State) -> Result<(), ProviderError> {
        R::validate(desired)?;
        R::validate_schema(desired)
    }

    /// Classifies the transition from `previous` to `planned` without any backend call.
    pub fn plan(previous: &R::State, planned: &R::State) -> Result<PlanAction, ProviderError> {
        let plan = Self::detect(previous, planned)?;
        Ok(if plan.requires_replacement() {
            PlanAction::Replace {
                fields: plan.replaced(),
            }
        } else if plan.is_required() {
            PlanAction::Update {
                fields: plan.changed(),
            }
        } else {
            PlanAction::NoOp
        })
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = R::identity(planned).or(R::identity(previous))))]
    pub async fn update(
        &self,
        previous: &R::State,
        planned: &R::State,
    ) -> Result<R::State, ProviderError> {
        let plan = Self::detect(previous, planned)?;
        if !plan.is_required() {
            debug!("no tracked field changed; skipping update");
            return Ok(planned.clone());
        }
        if plan.requires_replacement() {
            return Err(ProviderError::RequiresReplacement {
                resource: R::TYPE_NAME,
                fields: plan.replaced(),
            });
        }

        R::validate(planned)?;
        let request = R::update_request(planned, &plan)?;
        let record = self
            .graph
            .fetch::<R::Record>(&request, format!("update {}", R::RECORD))
            .await?;
        match record {
            Some(record) => {
                info!(changed = ?plan.changed(), "updated {}", R::RECORD);
                Ok(R::flatten(record)?)
            }
            None => Err(ProviderError::EmptyResult {
                operation: request.operation.name,
            }),
        }
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = R::identity(state)))]
    pub async fn delete(&self, state: &R::State) -> Result<(), ProviderError> {
        let id = Self::require_identity(state)?;
        let request = R::delete_request(id);
        self.graph
            .execute(&request)
            .await
            .map_err(|err| ProviderError::client(format!("delete {}", R::RECORD), err))?;
        info!("deleted {}", R::RECORD);
        Ok(())
    }

    fn detect(previous: &R::State, planned: &R::State) -> Result<UpdatePlan, ProviderError> {
        let previous = R::encode_attributes(previous)?;
        let planned = R::encode_attributes(planned)?;
        Ok(change::detect(R::fields(), &previous, &planned))
    }

    fn require_identity(state: &R::State) -> Result<&str, ProviderError> {
        R::identity(state)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::config("id", format!("{} identifier is missing", R::RECORD)))
    }
}
