use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::commission::CommissionBreakdown;
use crate::events::Loggable;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommissionRule {
    /// Percentage taken from every order
    #[schema(example = 10.0)]
    pub global_rate: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Loggable for CommissionRule {
    fn entity_type() -> &'static str { "commission_rule" }
    fn subject_id(&self) -> Uuid { Uuid::nil() }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorCommission {
    pub vendor_id: Uuid,
    #[schema(example = 12.0)]
    pub rate: f64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl VendorCommission {
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from.map_or(true, |from| from <= at) && self.valid_to.map_or(true, |to| at < to)
    }
}

impl Loggable for VendorCommission {
    fn entity_type() -> &'static str { "vendor_commission" }
    fn subject_id(&self) -> Uuid { self.vendor_id }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommissionRuleRequest {
    #[schema(example = 10.0)]
    pub global_rate: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VendorCommissionRequest {
    #[schema(example = 12.0)]
    pub rate: f64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CalculateCommissionRequest {
    #[schema(example = 120.0)]
    pub total: f64,
    /// Defaults to the caller
    pub vendor_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalculateCommissionResponse {
    pub total: f64,
    /// Vendor whose rate was looked up; the caller when none was given
    pub vendor_id: Uuid,
    #[serde(flatten)]
    pub breakdown: CommissionBreakdown,
}
