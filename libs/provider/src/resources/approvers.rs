use std::collections::BTreeSet;
use std::marker::PhantomData;

use crate::change::{FieldSpec, UpdatePlan};
use crate::codec::{self, Attributes};
use crate::errors::{CodecError, ProviderError};
use crate::graph::GraphRequest;
use crate::graph::documents::{CREATE_APPROVERS, DELETE_APPROVERS, GET_APPROVERS, UPDATE_APPROVERS};
use crate::graph::models::{ApproversInput, ApproversRecord};
use crate::reconciler::Resource;
use crate::validate;

/// What an approver policy is attached to.
pub trait ApproverScope: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const KIND: &'static str;
    const RECORD: &'static str;
    const ID_ATTR: &'static str;
    const NAME_ATTR: &'static str;
    const FIELDS: &'static [FieldSpec];

    fn validate_id(value: &str) -> Result<(), ProviderError>;
}

pub struct AccountScope;

impl ApproverScope for AccountScope {
    const TYPE_NAME: &'static str = "awsteam_approvers_account";
    const KIND: &'static str = "Account";
    const RECORD: &'static str = "Approvers Account";
    const ID_ATTR: &'static str = "account_id";
    const NAME_ATTR: &'static str = "account_name";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::computed("id"),
        FieldSpec::replace("account_id"),
        FieldSpec::replace("account_name"),
        FieldSpec::input("approvers"),
        FieldSpec::input("group_ids"),
        FieldSpec::input("ticket_no"),
        FieldSpec::input("modified_by"),
        FieldSpec::computed("created_at"),
        FieldSpec::computed("updated_at"),
    ];

    fn validate_id(value: &str) -> Result<(), ProviderError> {
        validate::account_id(Self::ID_ATTR, value)
    }
}

pub struct OuScope;

impl ApproverScope for OuScope {
    const TYPE_NAME: &'static str = "awsteam_approvers_ou";
    const KIND: &'static str = "OU";
    const RECORD: &'static str = "Approvers OU";
    const ID_ATTR: &'static str = "ou_id";
    const NAME_ATTR: &'static str = "ou_name";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::computed("id"),
        FieldSpec::replace("ou_id"),
        FieldSpec::replace("ou_name"),
        FieldSpec::input("approvers"),
        FieldSpec::input("group_ids"),
        FieldSpec::input("ticket_no"),
        FieldSpec::input("modified_by"),
        FieldSpec::computed("created_at"),
        FieldSpec::computed("updated_at"),
    ];

    fn validate_id(value: &str) -> Result<(), ProviderError> {
        validate::ou_id(Self::ID_ATTR, value)
    }
}

/// Approver policy state. `target_id`/`target_name` are exposed to the
/// engine under the scope's attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproversState {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    pub approvers: BTreeSet<String>,
    pub group_ids: BTreeSet<String>,
    pub ticket_no: Option<String>,
    pub modified_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub struct Approvers<K>(PhantomData<fn() -> K>);

pub type AccountApprovers = Approvers<AccountScope>;
pub type OuApprovers = Approvers<OuScope>;

impl<K: ApproverScope> Approvers<K> {
    fn input(state: &ApproversState) -> ApproversInput {
        ApproversInput {
            id: state.target_id.clone().unwrap_or_default(),
            name: state.target_name.clone(),
            kind: K::KIND.to_string(),
            approvers: codec::expand_set(Some(&state.approvers), String::clone),
            group_ids: codec::expand_set(Some(&state.group_ids), String::clone),
            ticket_no: state.ticket_no.clone(),
            modified_by: state.modified_by.clone(),
        }
    }
}

impl<K: ApproverScope> Resource for Approvers<K> {
    type State = ApproversState;
    type Record = ApproversRecord;

    const TYPE_NAME: &'static str = K::TYPE_NAME;
    const RECORD: &'static str = K::RECORD;

    fn fields() -> &'static [FieldSpec] {
        K::FIELDS
    }

    fn identity(state: &ApproversState) -> Option<&str> {
        state.target_id.as_deref().or(state.id.as_deref())
    }

    fn import_state(id: &str) -> ApproversState {
        ApproversState {
            id: Some(id.to_string()),
            target_id: Some(id.to_string()),
            ..ApproversState::default()
        }
    }

    fn validate(desired: &ApproversState) -> Result<(), ProviderError> {
        validate::required(K::ID_ATTR, desired.target_id.as_deref())?;
        validate::required(K::NAME_ATTR, desired.target_name.as_deref())?;
        if desired.group_ids.is_empty() {
            return Err(ProviderError::config(
                "group_ids",
                "must contain at least one group id",
            ));
        }
        if desired.approvers.len() != desired.group_ids.len() {
            return Err(ProviderError::config(
                "approvers",
                format!(
                    "lists {} approvers for {} group ids; each approver group needs its id",
                    desired.approvers.len(),
                    desired.group_ids.len()
                ),
            ));
        }
        Ok(())
    }

    fn validate_schema(desired: &ApproversState) -> Result<(), ProviderError> {
        match desired.target_id.as_deref() {
            Some(id) => K::validate_id(id.trim()),
            None => Ok(()),
        }
    }

    fn encode_attributes(state: &ApproversState) -> Result<Attributes, CodecError> {
        let mut attrs = Attributes::new();
        attrs.set("id", &state.id)?;
        attrs.set(K::ID_ATTR, &state.target_id)?;
        attrs.set(K::NAME_ATTR, &state.target_name)?;
        attrs.set("approvers", &state.approvers)?;
        attrs.set("group_ids", &state.group_ids)?;
        attrs.set("ticket_no", &state.ticket_no)?;
        attrs.set("modified_by", &state.modified_by)?;
        attrs.set("created_at", &state.created_at)?;
        attrs.set("updated_at", &state.updated_at)?;
        Ok(attrs)
    }

    fn decode_attributes(attrs: &Attributes) -> Result<ApproversState, CodecError> {
        Ok(ApproversState {
            id: attrs.get("id")?,
            target_id: attrs.get(K::ID_ATTR)?,
            target_name: attrs.get(K::NAME_ATTR)?,
            approvers: attrs.get("approvers")?.unwrap_or_default(),
            group_ids: attrs.get("group_ids")?.unwrap_or_default(),
            ticket_no: attrs.get("ticket_no")?,
            modified_by: attrs.get("modified_by")?,
            created_at: attrs.get("created_at")?,
            updated_at: attrs.get("updated_at")?,
        })
    }

    fn flatten(record: ApproversRecord) -> Result<ApproversState, CodecError> {
        Ok(ApproversState {
            target_id: record.id.clone(),
            id: record.id,
            target_name: record.name,
            approvers: codec::flatten_strings(record.approvers),
            group_ids: codec::flatten_strings(record.group_ids),
            ticket_no: record.ticket_no,
            modified_by: record.modified_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn create_request(desired: &ApproversState) -> Result<GraphRequest, CodecError> {
        GraphRequest::with_input(CREATE_APPROVERS, &Self::input(desired))
    }

    fn read_request(id: &str) -> GraphRequest {
        GraphRequest::by_id(GET_APPROVERS, id)
    }

    fn update_request(planned: &ApproversState, _plan: &UpdatePlan) -> Result<GraphRequest, CodecError> {
        GraphRequest::with_input(UPDATE_APPROVERS, &Self::input(planned))
    }

    fn delete_request(id: &str) -> GraphRequest {
        GraphRequest::delete(DELETE_APPROVERS, id)
    }
}

#[cfg(test)]
mod tests {
    use awsteam_client::testkit::RecordingTransport;
    use serde_json::{Value, json};

    use super::*;
    use crate::reconciler::{PlanAction, Reconciler};

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn desired(approvers: &[&str], group_ids: &[&str]) -> ApproversState {
        ApproversState {
            target_id: Some("123456789012".into()),
            target_name: Some("prod".into()),
            approvers: set(approvers),
            group_ids: set(group_ids),
            ..ApproversState::default()
        }
    }

    fn record(approvers: &[&str], group_ids: &[&str]) -> Value {
        json!({
            "id": "123456789012",
            "name": "prod",
            "type": "Account",
            "approvers": approvers,
            "groupIds": group_ids,
            "ticketNo": null,
            "modifiedBy": null,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn create_then_update_sends_one_update_with_new_approvers() {
        let finance = |approver: &str, group: &str| {
            json!({
                "id": "123456789012",
                "name": "finance",
                "type": "Account",
                "approvers": [approver],
                "groupIds": [group],
                "ticketNo": null,
                "modifiedBy": null,
                "createdAt": "2024-05-01T10:00:00Z",
                "updatedAt": "2024-05-01T10:00:00Z"
            })
        };
        let transport = RecordingTransport::new()
            .respond_with(json!({ "createApprovers": finance("alice@example.com", "g-1") }))
            .respond_with(json!({ "updateApprovers": finance("bob@example.com", "g-2") }));
        let reconciler = Reconciler::<AccountApprovers>::new(transport.shared());

        let desired = ApproversState {
            target_id: Some("123456789012".into()),
            target_name: Some("finance".into()),
            approvers: set(&["alice@example.com"]),
            group_ids: set(&["g-1"]),
            ..ApproversState::default()
        };
        let created = reconciler.create(&desired).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("123456789012"));
        assert_eq!(created.approvers, set(&["alice@example.com"]));

        let mut planned = created.clone();
        planned.approvers = set(&["bob@example.com"]);
        planned.group_ids = set(&["g-2"]);
        let updated = reconciler.update(&created, &planned).await.unwrap();
        assert_eq!(updated.approvers, set(&["bob@example.com"]));
        assert_eq!(updated.group_ids, set(&["g-2"]));

        let calls = transport.calls();
        assert_eq!(transport.operations(), vec!["CreateApprovers", "UpdateApprovers"]);
        let input = &calls[1].variables["input"];
        assert_eq!(input["approvers"], json!(["bob@example.com"]));
        assert_eq!(input["groupIds"], json!(["g-2"]));
        assert_eq!(input["type"], "Account");
        assert_eq!(input["id"], "123456789012");
    }

    #[test]
    fn flattened_record_reexpands_to_the_same_update_input() {
        let backend = json!({
            "id": "ou-cxt3-2782ty5g",
            "name": "workloads",
            "type": "OU",
            "approvers": ["alice@example.com", "bob@example.com"],
            "groupIds": ["g-1", "g-2"],
            "ticketNo": "CHG-42",
            "modifiedBy": "pipeline",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-02T10:00:00Z"
        });
        let state = OuApprovers::flatten(serde_json::from_value(backend.clone()).unwrap()).unwrap();
        let request = OuApprovers::update_request(&state, &UpdatePlan::default()).unwrap();

        assert_eq!(request.operation.name, "UpdateApprovers");
        let input = &request.variables["input"];
        for key in ["id", "name", "type", "approvers", "groupIds", "ticketNo", "modifiedBy"] {
            assert_eq!(input[key], backend[key], "{key}");
        }
    }

    #[tokio::test]
    async fn create_without_account_id_makes_no_calls() {
        let transport = RecordingTransport::new();
        let reconciler = Reconciler::<AccountApprovers>::new(transport.shared());
        let mut state = desired(&["alice"], &["g1"]);
        state.target_id = None;

        let err = reconciler.create(&state).await.unwrap_err();
        assert!(matches!(err, ProviderError::Config { ref field, .. } if field == "account_id"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_create_response_is_an_error() {
        let transport = RecordingTransport::new().respond_with(json!({ "createApprovers": null }));
        let reconciler = Reconciler::<AccountApprovers>::new(transport.shared());

        let err = reconciler.create(&desired(&["alice"], &["g1"])).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::EmptyResult {
                operation: "CreateApprovers"
            }
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_group_ids_are_rejected() {
        let transport = RecordingTransport::new();
        let reconciler = Reconciler::<AccountApprovers>::new(transport.shared());

        let err = reconciler.create(&desired(&[], &[])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Config { ref field, .. } if field == "group_ids"));

        let err = reconciler
            .create(&desired(&["alice", "bob"], &["g1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Config { ref field, .. } if field == "approvers"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn ou_policies_send_ou_kind_and_check_id_format() {
        let transport = RecordingTransport::new().respond_with(json!({
            "createApprovers": {
                "id": "ou-cxt3-2782ty5g",
                "name": "workloads",
                "type": "OU",
                "approvers": ["alice"],
                "groupIds": ["g1"]
            }
        }));
        let reconciler = Reconciler::<OuApprovers>::new(transport.shared());
        let mut state = desired(&["alice"], &["g1"]);
        state.target_id = Some("123456789012".into());
        let err = Reconciler::<OuApprovers>::validate_config(&state).unwrap_err();
        assert!(matches!(err, ProviderError::Config { ref field, .. } if field == "ou_id"));

        state.target_id = Some("ou-cxt3-2782ty5g".into());
        state.target_name = Some("workloads".into());
        let created = reconciler.create(&state).await.unwrap();
        assert_eq!(created.target_name.as_deref(), Some("workloads"));
        assert_eq!(transport.calls()[0].variables["input"]["type"], "OU");

        let attrs = OuApprovers::encode_attributes(&created).unwrap().into_value();
        assert_eq!(attrs["ou_id"], "ou-cxt3-2782ty5g");
        assert_eq!(attrs["ou_name"], "workloads");
        assert!(attrs.get("account_id").is_none());
    }

    #[tokio::test]
    async fn read_of_deleted_policy_signals_removal() {
        let transport = RecordingTransport::new().respond_with(json!({ "getApprovers": null }));
        let reconciler = Reconciler::<AccountApprovers>::new(transport.shared());

        let outcome = reconciler.import("999999999999").await.unwrap();
        assert!(outcome.is_removed());
        assert_eq!(transport.calls()[0].variables["id"], "999999999999");
    }

    #[tokio::test]
    async fn import_populates_full_state() {
        let transport = RecordingTransport::new()
            .respond_with(json!({ "getApprovers": record(&["alice", "alice"], &["g1"]) }));
        let reconciler = Reconciler::<AccountApprovers>::new(transport.shared());

        let state = reconciler.import("123456789012").await.unwrap().present().unwrap();
        assert_eq!(state.approvers, set(&["alice"]));
        assert_eq!(state.target_name.as_deref(), Some("prod"));
        assert!(state.ticket_no.is_none());
    }

    #[tokio::test]
    async fn renaming_the_account_requires_replacement() {
        let transport = RecordingTransport::new();
        let reconciler = Reconciler::<AccountApprovers>::new(transport.shared());
        let previous = desired(&["alice"], &["g1"]);
        let mut planned = previous.clone();
        planned.target_name = Some("production".into());

        assert_eq!(
            Reconciler::<AccountApprovers>::plan(&previous, &planned).unwrap(),
            PlanAction::Replace {
                fields: vec!["account_name"]
            }
        );
        let err = reconciler.update(&previous, &planned).await.unwrap_err();
        assert!(matches!(err, ProviderError::RequiresReplacement { .. }));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn attributes_round_trip_through_scope_names() {
        let state = desired(&["alice"], &["g1"]);
        let attrs = AccountApprovers::encode_attributes(&state).unwrap();
        assert_eq!(attrs.value("account_id"), "123456789012");
        assert_eq!(attrs.value("approvers"), &json!(["alice"]));
        assert_eq!(AccountApprovers::decode_attributes(&attrs).unwrap(), state);
    }
}
