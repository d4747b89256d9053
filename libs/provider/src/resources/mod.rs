//! Descriptors for every managed resource type.

pub mod approvers;
pub mod eligibility;
pub mod settings;

pub use approvers::{AccountApprovers, AccountScope, ApproverScope, ApproversState, OuApprovers, OuScope};
pub use eligibility::{
    AccountTarget, EligibilityState, GroupEligibility, GroupPrincipal, OuTarget, PermissionTarget,
    Principal, UserEligibility, UserPrincipal,
};
pub use settings::{SETTINGS_ID, Settings, SettingsState};
