use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::VendorPermissions;
use crate::events::{Loggable, Severity};

/// Stored vendor permissions plus their optimistic-lock version.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorPermissionsRecord {
    pub vendor_id: Uuid,
    pub permissions: VendorPermissions,
    /// 0 while the vendor still runs on defaults
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Loggable for VendorPermissionsRecord {
    fn entity_type() -> &'static str { "vendor_permissions" }
    fn subject_id(&self) -> Uuid { self.vendor_id }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchVendorPermissionsRequest {
    /// Partial flags, e.g. {"earnings": {"withdraw": true}}
    #[schema(value_type = Object)]
    pub patch: Value,
    /// Version the caller last read; stale versions are rejected
    pub expected_version: Option<i64>,
}
