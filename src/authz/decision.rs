use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Failures in the engine's own contract. Denials are not errors; see [`Decision`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid actor: unrecognized role '{0}'")]
    InvalidActor(String),
    #[error("invalid action: unrecognized capability '{0}'")]
    InvalidAction(String),
    #[error("unknown permission path '{0}'")]
    UnknownPermissionPath(String),
    #[error("permission '{0}' must be a boolean")]
    InvalidPermissionValue(String),
    #[error("invalid permission table: {0}")]
    InvalidTable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    InsufficientRole,
    SelfActionForbidden,
    OverrideDenied,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::InsufficientRole => "insufficient_role",
            DenyReason::SelfActionForbidden => "self_action_forbidden",
            DenyReason::OverrideDenied => "override_denied",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DenyReason::InsufficientRole => "role does not grant this capability",
            DenyReason::SelfActionForbidden => "this action cannot target your own account",
            DenyReason::OverrideDenied => "vendor permissions do not allow this action",
        };
        f.write_str(msg)
    }
}

/// Outcome of an authorization check. Never partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }

    /// Logical AND of two checks; `next` only runs when `self` allows.
    pub fn and_then(self, next: impl FnOnce() -> Decision) -> Decision {
        match self {
            Decision::Allow => next(),
            deny => deny,
        }
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_then_short_circuits_on_first_deny() {
        let mut ran = false;
        let d = Decision::Deny(DenyReason::InsufficientRole).and_then(|| {
            ran = true;
            Decision::Allow
        });
        assert_eq!(d, Decision::Deny(DenyReason::InsufficientRole));
        assert!(!ran);

        let d = Decision::Allow.and_then(|| Decision::Deny(DenyReason::OverrideDenied));
        assert_eq!(d.reason(), Some(DenyReason::OverrideDenied));
    }

    #[test]
    fn deny_reason_serializes_snake_case() {
        let json = serde_json::to_string(&DenyReason::SelfActionForbidden).unwrap();
        assert_eq!(json, "\"self_action_forbidden\"");
        assert_eq!(DenyReason::OverrideDenied.as_str(), "override_denied");
    }
}
