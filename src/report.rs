//! Serializable view of an execution plan.

use serde::Serialize;

use crate::diagnostics::MemberRef;

/// What a class's setup will do, per handle, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    pub class: String,
    pub handles: Vec<HandleReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandleReport {
    pub name: String,
    pub member: MemberRef,
    /// `None` when the default binder configuration applies.
    pub binder: Option<MemberRef>,
    pub operations: Vec<OperationReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub member: MemberRef,
    pub order: u32,
}

impl PlanReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
