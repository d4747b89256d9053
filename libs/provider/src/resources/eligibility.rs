use std::collections::BTreeSet;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::change::{FieldSpec, UpdatePlan};
use crate::codec::{self, Attributes};
use crate::errors::{CodecError, ProviderError};
use crate::graph::GraphRequest;
use crate::graph::documents::{
    CREATE_ELIGIBILITY, DELETE_ELIGIBILITY, GET_ELIGIBILITY, UPDATE_ELIGIBILITY,
};
use crate::graph::models::{EligibilityInput, EligibilityRecord, NamedRef};
use crate::reconciler::Resource;
use crate::validate;

/// Who an eligibility policy grants access to.
pub trait Principal: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const KIND: &'static str;
    const RECORD: &'static str;
    const ID_ATTR: &'static str;
    const NAME_ATTR: &'static str;
    const FIELDS: &'static [FieldSpec];
}

pub struct UserPrincipal;

impl Principal for UserPrincipal {
    const TYPE_NAME: &'static str = "awsteam_eligibility_user";
    const KIND: &'static str = "User";
    const RECORD: &'static str = "Eligibility User";
    const ID_ATTR: &'static str = "user_id";
    const NAME_ATTR: &'static str = "user_name";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::computed("id"),
        FieldSpec::replace("user_id"),
        FieldSpec::replace("user_name"),
        FieldSpec::input("accounts"),
        FieldSpec::input("ous"),
        FieldSpec::input("permissions"),
        FieldSpec::input("approval_required"),
        FieldSpec::input("duration"),
        FieldSpec::input("ticket_no"),
        FieldSpec::input("modified_by"),
        FieldSpec::computed("created_at"),
        FieldSpec::computed("updated_at"),
    ];
}

pub struct GroupPrincipal;

impl Principal for GroupPrincipal {
    const TYPE_NAME: &'static str = "awsteam_eligibility_group";
    const KIND: &'static str = "Group";
    const RECORD: &'static str = "Eligibility Group";
    const ID_ATTR: &'static str = "group_id";
    const NAME_ATTR: &'static str = "group_name";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::computed("id"),
        FieldSpec::replace("group_id"),
        FieldSpec::replace("group_name"),
        FieldSpec::input("accounts"),
        FieldSpec::input("ous"),
        FieldSpec::input("permissions"),
        FieldSpec::input("approval_required"),
        FieldSpec::input("duration"),
        FieldSpec::input("ticket_no"),
        FieldSpec::input("modified_by"),
        FieldSpec::computed("created_at"),
        FieldSpec::computed("updated_at"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountTarget {
    pub account_id: Option<String>,
    pub account_name: Option<String>,
}

impl AccountTarget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            account_id: Some(id.into()),
            account_name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OuTarget {
    pub ou_id: Option<String>,
    pub ou_name: Option<String>,
}

impl OuTarget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ou_id: Some(id.into()),
            ou_name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionTarget {
    pub permission_arn: Option<String>,
    pub permission_name: Option<String>,
}

impl PermissionTarget {
    pub fn new(arn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            permission_arn: Some(arn.into()),
            permission_name: Some(name.into()),
        }
    }
}

/// Eligibility policy state. `principal_id`/`principal_name` are exposed
/// under the principal's attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityState {
    pub id: Option<String>,
    pub principal_id: Option<String>,
    pub principal_name: Option<String>,
    pub accounts: BTreeSet<AccountTarget>,
    pub ous: BTreeSet<OuTarget>,
    pub permissions: BTreeSet<PermissionTarget>,
    pub approval_required: Option<bool>,
    pub duration: Option<i64>,
    pub ticket_no: Option<String>,
    pub modified_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub struct Eligibility<P>(PhantomData<fn() -> P>);

pub type UserEligibility = Eligibility<UserPrincipal>;
pub type GroupEligibility = Eligibility<GroupPrincipal>;

impl<P: Principal> Eligibility<P> {
    fn input(state: &EligibilityState) -> EligibilityInput {
        EligibilityInput {
            id: state.principal_id.clone().unwrap_or_default(),
            name: state.principal_name.clone(),
            kind: P::KIND.to_string(),
            accounts: codec::expand_set(Some(&state.accounts), |a| NamedRef {
                id: a.account_id.clone(),
                name: a.account_name.clone(),
            }),
            ous: codec::expand_set(Some(&state.ous), |o| NamedRef {
                id: o.ou_id.clone(),
                name: o.ou_name.clone(),
            }),
            permissions: codec::expand_set(Some(&state.permissions), |p| NamedRef {
                id: p.permission_arn.clone(),
                name: p.permission_name.clone(),
            }),
            ticket_no: state.ticket_no.clone(),
            approval_required: state.approval_required,
            duration: codec::encode_int(state.duration),
            modified_by: state.modified_by.clone(),
        }
    }
}

impl<P: Principal> Resource for Eligibility<P> {
    type State = EligibilityState;
    type Record = EligibilityRecord;

    const TYPE_NAME: &'static str = P::TYPE_NAME;
    const RECORD: &'static str = P::RECORD;

    fn fields() -> &'static [FieldSpec] {
        P::FIELDS
    }

    fn identity(state: &EligibilityState) -> Option<&str> {
        state.principal_id.as_deref().or(state.id.as_deref())
    }

    fn import_state(id: &str) -> EligibilityState {
        EligibilityState {
            id: Some(id.to_string()),
            principal_id: Some(id.to_string()),
            ..EligibilityState::default()
        }
    }

    fn validate(desired: &EligibilityState) -> Result<(), ProviderError> {
        validate::required(P::ID_ATTR, desired.principal_id.as_deref())?;
        validate::required(P::NAME_ATTR, desired.principal_name.as_deref())?;
        validate::required_value("approval_required", desired.approval_required.as_ref())?;
        validate::required_value("duration", desired.duration.as_ref())?;

        for account in &desired.accounts {
            validate::required("accounts.account_id", account.account_id.as_deref())?;
            validate::required("accounts.account_name", account.account_name.as_deref())?;
        }
        for ou in &desired.ous {
            validate::required("ous.ou_id", ou.ou_id.as_deref())?;
            validate::required("ous.ou_name", ou.ou_name.as_deref())?;
        }
        if desired.permissions.is_empty() {
            return Err(ProviderError::config(
                "permissions",
                "must contain at least one permission set",
            ));
        }
        for permission in &desired.permissions {
            validate::required(
                "permissions.permission_arn",
                permission.permission_arn.as_deref(),
            )?;
            validate::required(
                "permissions.permission_name",
                permission.permission_name.as_deref(),
            )?;
        }
        Ok(())
    }

    fn validate_schema(desired: &EligibilityState) -> Result<(), ProviderError> {
        for id in desired.accounts.iter().filter_map(|a| a.account_id.as_deref()) {
            validate::account_id("accounts.account_id", id.trim())?;
        }
        for id in desired.ous.iter().filter_map(|o| o.ou_id.as_deref()) {
            validate::ou_id("ous.ou_id", id.trim())?;
        }
        for arn in desired.permissions.iter().filter_map(|p| p.permission_arn.as_deref()) {
            validate::permission_arn("permissions.permission_arn", arn.trim())?;
        }
        Ok(())
    }

    fn encode_attributes(state: &EligibilityState) -> Result<Attributes, CodecError> {
        let mut attrs = Attributes::new();
        attrs.set("id", &state.id)?;
        attrs.set(P::ID_ATTR, &state.principal_id)?;
        attrs.set(P::NAME_ATTR, &state.principal_name)?;
        attrs.set("accounts", &state.accounts)?;
        attrs.set("ous", &state.ous)?;
        attrs.set("permissions", &state.permissions)?;
        attrs.set("approval_required", &state.approval_required)?;
        attrs.set("duration", &state.duration)?;
        attrs.set("ticket_no", &state.ticket_no)?;
        attrs.set("modified_by", &state.modified_by)?;
        attrs.set("created_at", &state.created_at)?;
        attrs.set("updated_at", &state.updated_at)?;
        Ok(attrs)
    }

    fn decode_attributes(attrs: &Attributes) -> Result<EligibilityState, CodecError> {
        Ok(EligibilityState {
            id: attrs.get("id")?,
            principal_id: attrs.get(P::ID_ATTR)?,
            principal_name: attrs.get(P::NAME_ATTR)?,
            accounts: attrs.get("accounts")?.unwrap_or_default(),
            ous: attrs.get("ous")?.unwrap_or_default(),
            permissions: attrs.get("permissions")?.unwrap_or_default(),
            approval_required: attrs.get("approval_required")?,
            duration: attrs.get("duration")?,
            ticket_no: attrs.get("ticket_no")?,
            modified_by: attrs.get("modified_by")?,
            created_at: attrs.get("created_at")?,
            updated_at: attrs.get("updated_at")?,
        })
    }

    fn flatten(record: EligibilityRecord) -> Result<EligibilityState, CodecError> {
        Ok(EligibilityState {
            principal_id: record.id.clone(),
            id: record.id,
            principal_name: record.name,
            accounts: codec::flatten_records(
                record.accounts,
                |a: &AccountTarget| a.account_id.clone(),
                |r| AccountTarget {
                    account_id: r.id,
                    account_name: r.name,
                },
            ),
            ous: codec::flatten_records(
                record.ous,
                |o: &OuTarget| o.ou_id.clone(),
                |r| OuTarget {
                    ou_id: r.id,
                    ou_name: r.name,
                },
            ),
            permissions: codec::flatten_records(
                record.permissions,
                |p: &PermissionTarget| p.permission_arn.clone(),
                |r| PermissionTarget {
                    permission_arn: r.id,
                    permission_name: r.name,
                },
            ),
            approval_required: record.approval_required,
            duration: codec::decode_int("duration", record.duration.as_deref())?,
            ticket_no: record.ticket_no,
            modified_by: record.modified_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn create_request(desired: &EligibilityState) -> Result<GraphRequest, CodecError> {
        GraphRequest::with_input(CREATE_ELIGIBILITY, &Self::input(desired))
    }

    fn read_request(id: &str) -> GraphRequest {
        GraphRequest::by_id(GET_ELIGIBILITY, id)
    }

    fn update_request(
        planned: &EligibilityState,
        _plan: &UpdatePlan,
    ) -> Result<GraphRequest, CodecError> {
        GraphRequest::with_input(UPDATE_ELIGIBILITY, &Self::input(planned))
    }

    fn delete_request(id: &str) -> GraphRequest {
        GraphRequest::delete(DELETE_ELIGIBILITY, id)
    }
}

#[cfg(test)]
mod tests {
    use awsteam_client::testkit::RecordingTransport;
    use serde_json::{Value, json};

    use super::*;
    use crate::reconciler::Reconciler;

    const PERMISSION: &str =
        "arn:aws:sso:::permissionSet/ssoins-4334d1f197f50907/ps-f5ge203d3d2428d3";

    fn desired() -> EligibilityState {
        EligibilityState {
            principal_id: Some("c4f8e4a8-1031-70b7-2c5f-1a2b3c4d5e6f".into()),
            principal_name: Some("ops-engineers".into()),
            accounts: [AccountTarget::new("123456789012", "prod")].into(),
            ous: [OuTarget::new("ou-cxt3-2782ty5g", "workloads")].into(),
            permissions: [PermissionTarget::new(PERMISSION, "AdministratorAccess")].into(),
            approval_required: Some(true),
            duration: Some(5),
            ..EligibilityState::default()
        }
    }

    fn record(duration: &str) -> Value {
        json!({
            "id": "c4f8e4a8-1031-70b7-2c5f-1a2b3c4d5e6f",
            "name": "ops-engineers",
            "type": "Group",
            "ticketNo": "",
            "approvalRequired": true,
            "duration": duration,
            "modifiedBy": null,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "accounts": [
                { "name": "prod", "id": "123456789012" },
                { "name": "prod", "id": "123456789012" }
            ],
            "ous": [{ "name": "workloads", "id": "ou-cxt3-2782ty5g" }],
            "permissions": [{ "name": "AdministratorAccess", "id": PERMISSION }]
        })
    }

    #[tokio::test]
    async fn create_encodes_nested_targets_and_decodes_duration() {
        let transport = RecordingTransport::new()
            .respond_with(json!({ "createEligibility": record("5") }));
        let reconciler = Reconciler::<GroupEligibility>::new(transport.shared());

        let state = reconciler.create(&desired()).await.unwrap();
        assert_eq!(state.duration, Some(5));
        assert_eq!(state.accounts.len(), 1);
        assert_eq!(state.ticket_no.as_deref(), Some(""));
        assert!(state.modified_by.is_none());

        let input = &transport.calls()[0].variables["input"];
        assert_eq!(input["type"], "Group");
        assert_eq!(input["duration"], "5");
        assert_eq!(input["approvalRequired"], true);
        assert_eq!(input["accounts"], json!([{ "id": "123456789012", "name": "prod" }]));
        assert_eq!(input["permissions"][0]["id"], PERMISSION);
    }

    #[tokio::test]
    async fn non_numeric_duration_is_a_codec_error() {
        let transport = RecordingTransport::new()
            .respond_with(json!({ "getEligibility": record("five") }));
        let reconciler = Reconciler::<GroupEligibility>::new(transport.shared());

        let err = reconciler.import("c4f8e4a8").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Codec(CodecError::InvalidInteger {
                field: "duration",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn empty_permissions_are_rejected_before_any_call() {
        let transport = RecordingTransport::new();
        let reconciler = Reconciler::<UserEligibility>::new(transport.shared());
        let mut state = desired();
        state.permissions.clear();

        let err = reconciler.create(&state).await.unwrap_err();
        assert!(matches!(err, ProviderError::Config { ref field, .. } if field == "permissions"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn short_permission_set_ids_reach_the_backend() {
        let transport = RecordingTransport::new().respond_with(json!({
            "createEligibility": {
                "id": "user-7",
                "name": "jdoe",
                "type": "User",
                "approvalRequired": false,
                "duration": "5",
                "accounts": [],
                "ous": [],
                "permissions": [{ "name": "elevated", "id": "arn:aws:sso:::permissionSet/ssoins-x/ps-y" }]
            }
        }));
        let reconciler = Reconciler::<UserEligibility>::new(transport.shared());
        let desired = EligibilityState {
            principal_id: Some("user-7".into()),
            principal_name: Some("jdoe".into()),
            permissions: [PermissionTarget::new(
                "arn:aws:sso:::permissionSet/ssoins-x/ps-y",
                "elevated",
            )]
            .into(),
            approval_required: Some(false),
            duration: Some(5),
            ..EligibilityState::default()
        };

        let state = reconciler.create(&desired).await.unwrap();
        assert_eq!(state.duration, Some(5));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.calls()[0].variables["input"]["duration"], "5");
    }

    #[test]
    fn malformed_targets_fail_configuration_checks() {
        let mut state = desired();
        state.permissions = [PermissionTarget::new("arn:aws:iam::123:role/admin", "Admin")].into();
        let err = Reconciler::<UserEligibility>::validate_config(&state).unwrap_err();
        assert!(err.to_string().contains("permissions.permission_arn"));

        let mut state = desired();
        state.accounts = [AccountTarget::new("1234", "short")].into();
        let err = Reconciler::<UserEligibility>::validate_config(&state).unwrap_err();
        assert!(err.to_string().contains("accounts.account_id"));

        let mut state = desired();
        state.principal_id = Some(" ".into());
        let err = Reconciler::<UserEligibility>::validate_config(&state).unwrap_err();
        assert!(matches!(err, ProviderError::Config { ref field, .. } if field == "user_id"));

        assert!(Reconciler::<UserEligibility>::validate_config(&desired()).is_ok());
    }

    #[test]
    fn flattened_record_reexpands_to_the_same_update_input() {
        let backend = json!({
            "id": "c4f8e4a8-1031-70b7-2c5f-1a2b3c4d5e6f",
            "name": "ops-engineers",
            "type": "Group",
            "ticketNo": "CHG-7",
            "approvalRequired": true,
            "duration": "12",
            "modifiedBy": "pipeline",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "accounts": [{ "name": "prod", "id": "123456789012" }],
            "ous": [{ "name": "workloads", "id": "ou-cxt3-2782ty5g" }],
            "permissions": [{ "name": "AdministratorAccess", "id": PERMISSION }]
        });
        let state =
            GroupEligibility::flatten(serde_json::from_value(backend.clone()).unwrap()).unwrap();
        let request = GroupEligibility::update_request(&state, &UpdatePlan::default()).unwrap();

        assert_eq!(request.operation.name, "UpdateEligibility");
        let input = &request.variables["input"];
        for key in [
            "id",
            "name",
            "type",
            "ticketNo",
            "approvalRequired",
            "duration",
            "modifiedBy",
            "accounts",
            "ous",
            "permissions",
        ] {
            assert_eq!(input[key], backend[key], "{key}");
        }
    }

    #[tokio::test]
    async fn update_resends_whole_object_with_kind() {
        let mut updated = record("8");
        updated["type"] = json!("User");
        let transport =
            RecordingTransport::new().respond_with(json!({ "updateEligibility": updated }));
        let reconciler = Reconciler::<UserEligibility>::new(transport.shared());

        let previous = desired();
        let mut planned = previous.clone();
        planned.duration = Some(8);
        let state = reconciler.update(&previous, &planned).await.unwrap();
        assert_eq!(state.duration, Some(8));

        let input = &transport.calls()[0].variables["input"];
        assert_eq!(input["type"], "User");
        assert_eq!(input["duration"], "8");
        assert_eq!(input["ous"], json!([{ "id": "ou-cxt3-2782ty5g", "name": "workloads" }]));
        assert_eq!(input["name"], "ops-engineers");
    }

    #[tokio::test]
    async fn empty_update_response_is_an_error() {
        let transport =
            RecordingTransport::new().respond_with(json!({ "updateEligibility": null }));
        let reconciler = Reconciler::<UserEligibility>::new(transport.shared());
        let previous = desired();
        let mut planned = previous.clone();
        planned.approval_required = Some(false);

        let err = reconciler.update(&previous, &planned).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::EmptyResult {
                operation: "UpdateEligibility"
            }
        ));
    }

    #[tokio::test]
    async fn missing_collections_flatten_to_empty_sets() {
        let transport = RecordingTransport::new().respond_with(json!({
            "getEligibility": {
                "id": "c4f8e4a8",
                "name": "ops",
                "type": "User",
                "duration": "1",
                "accounts": null,
                "permissions": []
            }
        }));
        let reconciler = Reconciler::<UserEligibility>::new(transport.shared());

        let state = reconciler.import("c4f8e4a8").await.unwrap().present().unwrap();
        assert!(state.accounts.is_empty());
        assert!(state.ous.is_empty());
        assert!(state.permissions.is_empty());

        let attrs = UserEligibility::encode_attributes(&state).unwrap();
        assert_eq!(attrs.value("accounts"), &json!([]));
        assert_eq!(attrs.value("user_id"), "c4f8e4a8");
    }

    #[tokio::test]
    async fn delete_sends_identifier_and_ignores_body() {
        let transport =
            RecordingTransport::new().respond_with(json!({ "deleteEligibility": null }));
        let reconciler = Reconciler::<GroupEligibility>::new(transport.shared());

        reconciler.delete(&desired()).await.unwrap();
        let call = &transport.calls()[0];
        assert_eq!(call.operation, "DeleteEligibility");
        assert_eq!(
            call.variables["input"]["id"],
            "c4f8e4a8-1031-70b7-2c5f-1a2b3c4d5e6f"
        );
    }
}
