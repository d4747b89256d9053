//! Wire shapes of backend records and mutation inputs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub id: Option<String>,
    pub approval: Option<bool>,
    pub comments: Option<bool>,
    pub duration: Option<String>,
    pub expiry: Option<String>,
    pub ses_notifications_enabled: Option<bool>,
    pub sns_notifications_enabled: Option<bool>,
    pub slack_notifications_enabled: Option<bool>,
    pub ses_source_email: Option<String>,
    pub ses_source_arn: Option<String>,
    pub slack_token: Option<String>,
    pub team_admin_group: Option<String>,
    pub team_auditor_group: Option<String>,
    pub ticket_no: Option<bool>,
    pub modified_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Settings mutation input. Writable fields are always sent, `null` when
/// unset. The three overlay fields are omitted when the outer option is
/// `None`, so an update leaves their stored values alone.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    pub id: String,
    pub approval: Option<bool>,
    pub comments: Option<bool>,
    pub duration: Option<String>,
    pub expiry: Option<String>,
    pub ses_notifications_enabled: Option<bool>,
    pub sns_notifications_enabled: Option<bool>,
    pub slack_notifications_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ses_source_email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ses_source_arn: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_token: Option<Option<String>>,
    pub team_admin_group: Option<String>,
    pub team_auditor_group: Option<String>,
    pub ticket_no: Option<bool>,
    pub modified_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproversRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub approvers: Option<Vec<Option<String>>>,
    pub group_ids: Option<Vec<Option<String>>>,
    pub ticket_no: Option<String>,
    pub modified_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproversInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub approvers: Vec<String>,
    pub group_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

/// `{ id, name }` pair used for accounts, OUs and permission sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub ticket_no: Option<String>,
    pub approval_required: Option<bool>,
    pub duration: Option<String>,
    pub modified_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub accounts: Option<Vec<Option<NamedRef>>>,
    pub ous: Option<Vec<Option<NamedRef>>>,
    pub permissions: Option<Vec<Option<NamedRef>>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub accounts: Vec<NamedRef>,
    pub ous: Vec<NamedRef>,
    pub permissions: Vec<NamedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}
