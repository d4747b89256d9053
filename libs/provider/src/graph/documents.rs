//! GraphQL operation documents understood by the backend.

/// A named GraphQL operation and the top-level key its result is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub key: &'static str,
    pub document: &'static str,
}

macro_rules! settings_fields {
    () => {
        "id duration expiry comments ticketNo approval modifiedBy \
         sesNotificationsEnabled snsNotificationsEnabled slackNotificationsEnabled \
         sesSourceEmail sesSourceArn slackToken teamAdminGroup teamAuditorGroup \
         createdAt updatedAt"
    };
}

macro_rules! approvers_fields {
    () => {
        "id name type approvers groupIds ticketNo modifiedBy createdAt updatedAt"
    };
}

macro_rules! eligibility_fields {
    () => {
        "id name type ticketNo approvalRequired duration modifiedBy createdAt updatedAt \
         accounts { name id } ous { name id } permissions { name id }"
    };
}

pub const GET_SETTINGS: Operation = Operation {
    name: "GetSettings",
    key: "getSettings",
    document: concat!(
        "query GetSettings($id: ID!) { getSettings(id: $id) { ",
        settings_fields!(),
        " } }"
    ),
};

pub const CREATE_SETTINGS: Operation = Operation {
    name: "CreateSettings",
    key: "createSettings",
    document: concat!(
        "mutation CreateSettings($input: CreateSettingsInput!) { createSettings(input: $input) { ",
        settings_fields!(),
        " } }"
    ),
};

pub const UPDATE_SETTINGS: Operation = Operation {
    name: "UpdateSettings",
    key: "updateSettings",
    document: concat!(
        "mutation UpdateSettings($input: UpdateSettingsInput!) { updateSettings(input: $input) { ",
        settings_fields!(),
        " } }"
    ),
};

pub const DELETE_SETTINGS: Operation = Operation {
    name: "DeleteSettings",
    key: "deleteSettings",
    document: "mutation DeleteSettings($input: DeleteSettingsInput!) { deleteSettings(input: $input) { id } }",
};

pub const GET_APPROVERS: Operation = Operation {
    name: "GetApprovers",
    key: "getApprovers",
    document: concat!(
        "query GetApprovers($id: ID!) { getApprovers(id: $id) { ",
        approvers_fields!(),
        " } }"
    ),
};

pub const CREATE_APPROVERS: Operation = Operation {
    name: "CreateApprovers",
    key: "createApprovers",
    document: concat!(
        "mutation CreateApprovers($input: CreateApproversInput!) { createApprovers(input: $input) { ",
        approvers_fields!(),
        " } }"
    ),
};

pub const UPDATE_APPROVERS: Operation = Operation {
    name: "UpdateApprovers",
    key: "updateApprovers",
    document: concat!(
        "mutation UpdateApprovers($input: UpdateApproversInput!) { updateApprovers(input: $input) { ",
        approvers_fields!(),
        " } }"
    ),
};

pub const DELETE_APPROVERS: Operation = Operation {
    name: "DeleteApprovers",
    key: "deleteApprovers",
    document: "mutation DeleteApprovers($input: DeleteApproversInput!) { deleteApprovers(input: $input) { id } }",
};

pub const GET_ELIGIBILITY: Operation = Operation {
    name: "GetEligibility",
    key: "getEligibility",
    document: concat!(
        "query GetEligibility($id: ID!) { getEligibility(id: $id) { ",
        eligibility_fields!(),
        " } }"
    ),
};

pub const CREATE_ELIGIBILITY: Operation = Operation {
    name: "CreateEligibility",
    key: "createEligibility",
    document: concat!(
        "mutation CreateEligibility($input: CreateEligibilityInput!) { createEligibility(input: $input) { ",
        eligibility_fields!(),
        " } }"
    ),
};

pub const UPDATE_ELIGIBILITY: Operation = Operation {
    name: "UpdateEligibility",
    key: "updateEligibility",
    document: concat!(
        "mutation UpdateEligibility($input: UpdateEligibilityInput!) { updateEligibility(input: $input) { ",
        eligibility_fields!(),
        " } }"
    ),
};

pub const DELETE_ELIGIBILITY: Operation = Operation {
    name: "DeleteEligibility",
    key: "deleteEligibility",
    document: "mutation DeleteEligibility($input: DeleteEligibilityInput!) { deleteEligibility(input: $input) { id } }",
};

pub const GET_ACCOUNTS: Operation = Operation {
    name: "GetAccounts",
    key: "getAccounts",
    document: "query GetAccounts { getAccounts { name id } }",
};
