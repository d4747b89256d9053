use serde::{Deserialize, Serialize};

use crate::change::{FieldSpec, UpdatePlan};
use crate::codec::{self, Attributes};
use crate::errors::{CodecError, ProviderError};
use crate::graph::documents::{CREATE_SETTINGS, DELETE_SETTINGS, GET_SETTINGS, UPDATE_SETTINGS};
use crate::graph::models::{SettingsInput, SettingsRecord};
use crate::graph::GraphRequest;
use crate::reconciler::{CreateConflict, Resource};
use crate::validate;

/// Identifier of the settings singleton.
pub const SETTINGS_ID: &str = "settings";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub approval: Option<bool>,
    #[serde(default)]
    pub comments: Option<bool>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub expiry: Option<i64>,
    #[serde(default)]
    pub ses_notifications_enabled: Option<bool>,
    #[serde(default)]
    pub sns_notifications_enabled: Option<bool>,
    #[serde(default)]
    pub slack_notifications_enabled: Option<bool>,
    #[serde(default)]
    pub ses_source_email: Option<String>,
    #[serde(default)]
    pub ses_source_arn: Option<String>,
    #[serde(default)]
    pub slack_token: Option<String>,
    #[serde(default)]
    pub team_admin_group: Option<String>,
    #[serde(default)]
    pub team_auditor_group: Option<String>,
    #[serde(default)]
    pub ticket_no: Option<bool>,
    #[serde(default)]
    pub modified_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::computed("id"),
    FieldSpec::input("approval"),
    FieldSpec::input("comments"),
    FieldSpec::input("duration"),
    FieldSpec::input("expiry"),
    FieldSpec::input("ses_notifications_enabled"),
    FieldSpec::input("sns_notifications_enabled"),
    FieldSpec::input("slack_notifications_enabled"),
    FieldSpec::send_if_changed("ses_source_email"),
    FieldSpec::send_if_changed("ses_source_arn"),
    FieldSpec::send_if_changed("slack_token"),
    FieldSpec::input("team_admin_group"),
    FieldSpec::input("team_auditor_group"),
    FieldSpec::input("ticket_no"),
    FieldSpec::input("modified_by"),
    FieldSpec::computed("created_at"),
    FieldSpec::computed("updated_at"),
];

/// The deployment-wide settings singleton.
pub struct Settings;

impl Settings {
    pub(crate) fn state_from_record(record: SettingsRecord) -> Result<SettingsState, CodecError> {
        Ok(SettingsState {
            id: record.id,
            approval: record.approval,
            comments: record.comments,
            duration: codec::decode_int("duration", record.duration.as_deref())?,
            expiry: codec::decode_int("expiry", record.expiry.as_deref())?,
            ses_notifications_enabled: record.ses_notifications_enabled,
            sns_notifications_enabled: record.sns_notifications_enabled,
            slack_notifications_enabled: record.slack_notifications_enabled,
            ses_source_email: record.ses_source_email,
            ses_source_arn: record.ses_source_arn,
            slack_token: record.slack_token,
            team_admin_group: record.team_admin_group,
            team_auditor_group: record.team_auditor_group,
            ticket_no: record.ticket_no,
            modified_by: record.modified_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn id_of(state: &SettingsState) -> &str {
    state
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(SETTINGS_ID)
}

impl Resource for Settings {
    type State = SettingsState;
    type Record = SettingsRecord;

    const TYPE_NAME: &'static str = "awsteam_settings";
    const RECORD: &'static str = "Settings";
    const ON_CREATE_CONFLICT: CreateConflict = CreateConflict::AdoptExisting;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn identity(state: &SettingsState) -> Option<&str> {
        Some(id_of(state))
    }

    fn import_state(id: &str) -> SettingsState {
        SettingsState {
            id: Some(id.to_string()),
            ..SettingsState::default()
        }
    }

    fn validate(desired: &SettingsState) -> Result<(), ProviderError> {
        validate::required_value("duration", desired.duration.as_ref())?;
        validate::required_value("expiry", desired.expiry.as_ref())?;
        validate::required("team_admin_group", desired.team_admin_group.as_deref())?;
        validate::required("team_auditor_group", desired.team_auditor_group.as_deref())?;
        Ok(())
    }

    fn encode_attributes(state: &SettingsState) -> Result<Attributes, CodecError> {
        Attributes::from_serialize(Self::TYPE_NAME, state)
    }

    fn decode_attributes(attrs: &Attributes) -> Result<SettingsState, CodecError> {
        attrs.deserialize(Self::TYPE_NAME)
    }

    fn flatten(record: SettingsRecord) -> Result<SettingsState, CodecError> {
        Self::state_from_record(record)
    }

    fn create_request(desired: &SettingsState) -> Result<GraphRequest, CodecError> {
        // Unset optional values take the backend's documented defaults.
        let input = SettingsInput {
            id: id_of(desired).to_string(),
            approval: Some(desired.approval.unwrap_or(false)),
            comments: Some(desired.comments.unwrap_or(false)),
            duration: codec::encode_int(desired.duration),
            expiry: codec::encode_int(desired.expiry),
            ses_notifications_enabled: Some(desired.ses_notifications_enabled.unwrap_or(false)),
            sns_notifications_enabled: Some(desired.sns_notifications_enabled.unwrap_or(false)),
            slack_notifications_enabled: Some(desired.slack_notifications_enabled.unwrap_or(false)),
            ses_source_email: Some(Some(desired.ses_source_email.clone().unwrap_or_default())),
            ses_source_arn: Some(Some(desired.ses_source_arn.clone().unwrap_or_default())),
            slack_token: Some(Some(desired.slack_token.clone().unwrap_or_default())),
            team_admin_group: desired.team_admin_group.clone(),
            team_auditor_group: desired.team_auditor_group.clone(),
            ticket_no: Some(desired.ticket_no.unwrap_or(false)),
            modified_by: desired.modified_by.clone(),
        };
        GraphRequest::with_input(CREATE_SETTINGS, &input)
    }

    fn read_request(id: &str) -> GraphRequest {
        GraphRequest::by_id(GET_SETTINGS, id)
    }

    fn update_request(planned: &SettingsState, plan: &UpdatePlan) -> Result<GraphRequest, CodecError> {
        let overlay = |field: &str, value: &Option<String>| plan.sends(field).then(|| value.clone());

        let input = SettingsInput {
            id: id_of(planned).to_string(),
            approval: planned.approval,
            comments: planned.comments,
            duration: codec::encode_int(planned.duration),
            expiry: codec::encode_int(planned.expiry),
            ses_notifications_enabled: planned.ses_notifications_enabled,
            sns_notifications_enabled: planned.sns_notifications_enabled,
            slack_notifications_enabled: planned.slack_notifications_enabled,
            ses_source_email: overlay("ses_source_email", &planned.ses_source_email),
            ses_source_arn: overlay("ses_source_arn", &planned.ses_source_arn),
            slack_token: overlay("slack_token", &planned.slack_token),
            team_admin_group: planned.team_admin_group.clone(),
            team_auditor_group: planned.team_auditor_group.clone(),
            ticket_no: planned.ticket_no,
            modified_by: planned.modified_by.clone(),
        };
        GraphRequest::with_input(UPDATE_SETTINGS, &input)
    }

    fn delete_request(id: &str) -> GraphRequest {
        GraphRequest::delete(DELETE_SETTINGS, id)
    }
}
