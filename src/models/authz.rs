use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Capability, DenyReason, Role, VendorPermissions};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckRequest {
    #[schema(example = "refundOrder")]
    pub capability: String,
    pub target_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckResponse {
    pub capability: Capability,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CapabilitiesResponse {
    pub user_id: Uuid,
    pub role: Role,
    /// What the role grants, before per-resource checks
    pub capabilities: Vec<Capability>,
    /// Capabilities a vendor override currently blocks
    pub restricted: Vec<Capability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_permissions: Option<VendorPermissions>,
}
