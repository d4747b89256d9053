//! Read-only lookups: the organization's accounts and the current settings.

use std::collections::BTreeSet;

use async_trait::async_trait;
use awsteam_client::SharedTransport;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::codec;
use crate::errors::ProviderError;
use crate::graph::documents::{GET_ACCOUNTS, GET_SETTINGS};
use crate::graph::models::{NamedRef, SettingsRecord};
use crate::graph::{GraphClient, GraphRequest};
use crate::resources::settings::{SETTINGS_ID, Settings};

/// Static identifier reported by the accounts data source.
pub const ACCOUNTS_ID: &str = "accounts";

/// A read-only lookup exposed to the configuration engine.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;
    async fn read(&self, config: Value) -> Result<Value, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub struct AccountsDataSource {
    graph: GraphClient,
}

impl AccountsDataSource {
    pub fn new(transport: SharedTransport) -> Self {
        Self {
            graph: GraphClient::new(transport),
        }
    }

    /// Lists accounts, one entry per account id.
    #[instrument(skip_all, fields(data_source = "awsteam_accounts"))]
    pub async fn accounts(&self) -> Result<Vec<Account>, ProviderError> {
        let request = GraphRequest::bare(GET_ACCOUNTS);
        let listed = self
            .graph
            .fetch::<Vec<Option<NamedRef>>>(&request, "read accounts")
            .await?
            .ok_or(ProviderError::EmptyResult {
                operation: GET_ACCOUNTS.name,
            })?;
        let accounts: BTreeSet<Account> = codec::flatten_records(
            Some(listed),
            |account: &Account| account.id.clone(),
            |named| Account {
                id: named.id,
                name: named.name,
            },
        );
        Ok(accounts.into_iter().collect())
    }
}

#[async_trait]
impl DataSource for AccountsDataSource {
    fn type_name(&self) -> &'static str {
        "awsteam_accounts"
    }

    async fn read(&self, _config: Value) -> Result<Value, ProviderError> {
        let accounts = self.accounts().await?;
        Ok(json!({ "id": ACCOUNTS_ID, "accounts": accounts }))
    }
}

/// Settings as exposed by the data source; audit fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsView {
    pub id: Option<String>,
    pub approval: Option<bool>,
    pub comments: Option<bool>,
    pub duration: Option<i64>,
    pub expiry: Option<i64>,
    pub ses_notifications_enabled: Option<bool>,
    pub sns_notifications_enabled: Option<bool>,
    pub slack_notifications_enabled: Option<bool>,
    pub ses_source_email: Option<String>,
    pub ses_source_arn: Option<String>,
    pub slack_token: Option<String>,
    pub team_admin_group: Option<String>,
    pub team_auditor_group: Option<String>,
    pub ticket_no: Option<bool>,
}

pub struct SettingsDataSource {
    graph: GraphClient,
}

impl SettingsDataSource {
    pub fn new(transport: SharedTransport) -> Self {
        Self {
            graph: GraphClient::new(transport),
        }
    }

    #[instrument(skip_all, fields(data_source = "awsteam_settings"))]
    pub async fn settings(&self) -> Result<SettingsView, ProviderError> {
        let request = GraphRequest::by_id(GET_SETTINGS, SETTINGS_ID);
        let record = self
            .graph
            .fetch::<SettingsRecord>(&request, "read settings")
            .await?
            .ok_or(ProviderError::EmptyResult {
                operation: GET_SETTINGS.name,
            })?;
        let state = Settings::state_from_record(record)?;
        Ok(SettingsView {
            id: state.id,
            approval: state.approval,
            comments: state.comments,
            duration: state.duration,
            expiry: state.expiry,
            ses_notifications_enabled: state.ses_notifications_enabled,
            sns_notifications_enabled: state.sns_notifications_enabled,
            slack_notifications_enabled: state.slack_notifications_enabled,
            ses_source_email: state.ses_source_email,
            ses_source_arn: state.ses_source_arn,
            slack_token: state.slack_token,
            team_admin_group: state.team_admin_group,
            team_auditor_group: state.team_auditor_group,
            ticket_no: state.ticket_no,
        })
    }
}

#[async_trait]
impl DataSource for SettingsDataSource {
    fn type_name(&self) -> &'static str {
        "awsteam_settings"
    }

    async fn read(&self, _config: Value) -> Result<Value, ProviderError> {
        let view = self.settings().await?;
        Ok(codec::encode_value("awsteam_settings", &view)?)
    }
}
