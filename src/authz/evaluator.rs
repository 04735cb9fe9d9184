use std::sync::Arc;

use super::capability::Capability;
use super::decision::{AuthzError, Decision, DenyReason};
use super::principal::{Action, Actor, AuthzRequest, ResourceContext};
use super::role::Role;
use super::table::PermissionTable;

/// Policy evaluator trait for pluggable authorization logic
pub trait PolicyEvaluator: Send + Sync {
    /// Decide whether `actor` may perform `action`
    fn evaluate(&self, actor: &Actor, action: &Action, ctx: &ResourceContext) -> Decision;

    /// Capabilities the role holds before any per-resource checks
    fn capabilities_for(&self, role: Role) -> Vec<Capability>;

    /// Parse a raw request at the boundary, then evaluate it
    fn evaluate_request(&self, request: &AuthzRequest, ctx: &ResourceContext) -> Result<Decision, AuthzError> {
        let (actor, action) = request.parse()?;
        Ok(self.evaluate(&actor, &action, ctx))
    }
}

/// Table-driven evaluator.
///
/// Evaluation order:
/// 1. non-self-applicable capability aimed at the actor -> deny(SelfActionForbidden)
/// 2. role lacks the capability in the table -> deny(InsufficientRole)
/// 3. vendor override flag for the capability is false -> deny(OverrideDenied)
/// 4. allow
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    table: Arc<PermissionTable>,
}

impl AuthorizationEngine {
    pub fn new(table: impl Into<Arc<PermissionTable>>) -> Self {
        Self { table: table.into() }
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    fn self_guard(&self, actor: &Actor, action: &Action, ctx: &ResourceContext) -> Decision {
        let target = action.target_id.or(ctx.resource_owner_id);
        if self.table.is_non_self_applicable(action.capability) && target == Some(actor.id) {
            return Decision::Deny(DenyReason::SelfActionForbidden);
        }
        Decision::Allow
    }

    fn role_check(&self, actor: &Actor, action: &Action) -> Decision {
        if self.table.grants(actor.role, action.capability) {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::InsufficientRole)
        }
    }

    fn override_check(&self, action: &Action, ctx: &ResourceContext) -> Decision {
        match (ctx.vendor_permissions.as_ref(), action.capability.vendor_flag()) {
            (Some(perms), Some(flag)) if !perms.get(flag) => Decision::Deny(DenyReason::OverrideDenied),
            _ => Decision::Allow,
        }
    }
}

impl PolicyEvaluator for AuthorizationEngine {
    fn evaluate(&self, actor: &Actor, action: &Action, ctx: &ResourceContext) -> Decision {
        let decision = self
            .self_guard(actor, action, ctx)
            .and_then(|| self.role_check(actor, action))
            .and_then(|| self.override_check(action, ctx));

        match decision {
            Decision::Allow => tracing::debug!(
                actor_id = %actor.id,
                role = %actor.role,
                capability = %action.capability,
                "authorization granted"
            ),
            Decision::Deny(reason) => tracing::debug!(
                actor_id = %actor.id,
                role = %actor.role,
                capability = %action.capability,
                target_id = ?action.target_id,
                reason = reason.as_str(),
                "authorization denied"
            ),
        }

        decision
    }

    fn capabilities_for(&self, role: Role) -> Vec<Capability> {
        self.table.capabilities_for(role)
    }
}
