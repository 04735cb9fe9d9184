use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::capability::Capability;
use super::decision::AuthzError;
use super::role::Role;
use super::vendor::VendorPermissions;

/// The authenticated subject of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// Builds an actor from a stored or token-provided role name.
    pub fn parse(id: Uuid, role: &str) -> Result<Self, AuthzError> {
        Ok(Self { id, role: role.parse()? })
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_vendor(&self) -> bool {
        self.role.is_vendor()
    }

    pub fn is_client(&self) -> bool {
        self.role.is_client()
    }
}

/// What is being attempted, and on whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub capability: Capability,
    pub target_id: Option<Uuid>,
}

impl Action {
    pub fn new(capability: Capability) -> Self {
        Self { capability, target_id: None }
    }

    pub fn parse(capability: &str) -> Result<Self, AuthzError> {
        Ok(Self::new(capability.parse()?))
    }

    pub fn on(mut self, target_id: Uuid) -> Self {
        self.target_id = Some(target_id);
        self
    }
}

/// Resource state supplied by the caller for the finer checks.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext {
    /// Owner of the resource; used as the self-action target when the
    /// action itself names none.
    pub resource_owner_id: Option<Uuid>,
    pub vendor_permissions: Option<VendorPermissions>,
}

impl ResourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner_id: Uuid) -> Self {
        self.resource_owner_id = Some(owner_id);
        self
    }

    pub fn with_vendor_permissions(mut self, permissions: VendorPermissions) -> Self {
        self.vendor_permissions = Some(permissions);
        self
    }
}

/// Unvalidated request, as it arrives from a token, CLI or JSON body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuthzRequest {
    pub actor_id: Uuid,
    #[schema(example = "vendor")]
    pub role: String,
    #[schema(example = "refundOrder")]
    pub capability: String,
    pub target_id: Option<Uuid>,
}

impl AuthzRequest {
    pub fn parse(&self) -> Result<(Actor, Action), AuthzError> {
        let actor = Actor::parse(self.actor_id, &self.role)?;
        let mut action = Action::parse(&self.capability)?;
        action.target_id = self.target_id;
        Ok((actor, action))
    }
}
