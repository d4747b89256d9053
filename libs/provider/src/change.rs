//! Change detection between the last observed state and a planned state.

use std::collections::BTreeSet;

use crate::codec::Attributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Supplied by the operator and tracked for changes.
    Input,
    /// Assigned by the backend; never triggers an update.
    Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePolicy {
    /// Updated in place and re-sent with every update.
    InPlace,
    /// A change requires deleting and recreating the record.
    Replace,
    /// Updated in place but only sent when the value itself changed.
    SendIfChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub role: FieldRole,
    pub policy: ChangePolicy,
}

impl FieldSpec {
    pub const fn input(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Input,
            policy: ChangePolicy::InPlace,
        }
    }

    pub const fn replace(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Input,
            policy: ChangePolicy::Replace,
        }
    }

    pub const fn send_if_changed(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Input,
            policy: ChangePolicy::SendIfChanged,
        }
    }

    pub const fn computed(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Computed,
            policy: ChangePolicy::InPlace,
        }
    }
}

/// Outcome of comparing two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    changed: BTreeSet<&'static str>,
    send: BTreeSet<&'static str>,
    replace: BTreeSet<&'static str>,
}

impl UpdatePlan {
    pub fn is_required(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn requires_replacement(&self) -> bool {
        !self.replace.is_empty()
    }

    pub fn changed(&self) -> Vec<&'static str> {
        self.changed.iter().copied().collect()
    }

    pub fn replaced(&self) -> Vec<&'static str> {
        self.replace.iter().copied().collect()
    }

    /// Whether `field` belongs in the update payload.
    pub fn sends(&self, field: &str) -> bool {
        self.send.contains(field)
    }
}

/// Compares the tracked fields of `previous` and `planned`.
pub fn detect(fields: &[FieldSpec], previous: &Attributes, planned: &Attributes) -> UpdatePlan {
    let mut plan = UpdatePlan::default();
    for field in fields.iter().filter(|f| f.role == FieldRole::Input) {
        if previous.value(field.name) != planned.value(field.name) {
            plan.changed.insert(field.name);
            if field.policy == ChangePolicy::Replace {
                plan.replace.insert(field.name);
            }
        }
    }

    if plan.is_required() {
        for field in fields.iter().filter(|f| f.role == FieldRole::Input) {
            let include = match field.policy {
                ChangePolicy::InPlace | ChangePolicy::Replace => true,
                ChangePolicy::SendIfChanged => plan.changed.contains(field.name),
            };
            if include {
                plan.send.insert(field.name);
            }
        }
    }
    plan
}
