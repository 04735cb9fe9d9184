use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreSettings {
    pub vendor_id: Uuid,
    #[schema(example = "Ma Boutique")]
    pub store_name: String,
    pub store_description: String,
    #[schema(example = "light")]
    pub theme: String,
    pub two_factor_auth: bool,
    pub email_notifications: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreSettings {
    pub fn defaults_for(vendor_id: Uuid) -> Self {
        Self {
            vendor_id,
            store_name: "Ma Boutique".to_string(),
            store_description: "Description de ma boutique".to_string(),
            theme: "light".to_string(),
            two_factor_auth: false,
            email_notifications: true,
            updated_at: None,
        }
    }

    /// Fields present in `update` replace the current ones.
    pub fn merged(&self, update: StoreSettingsUpdate) -> Self {
        Self {
            vendor_id: self.vendor_id,
            store_name: update.store_name.unwrap_or_else(|| self.store_name.clone()),
            store_description: update.store_description.unwrap_or_else(|| self.store_description.clone()),
            theme: update.theme.unwrap_or_else(|| self.theme.clone()),
            two_factor_auth: update.two_factor_auth.unwrap_or(self.two_factor_auth),
            email_notifications: update.email_notifications.unwrap_or(self.email_notifications),
            updated_at: self.updated_at,
        }
    }
}

impl Loggable for StoreSettings {
    fn entity_type() -> &'static str { "store_settings" }
    fn subject_id(&self) -> Uuid { self.vendor_id }
    fn severity(&self) -> Severity { Severity::Noise }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StoreSettingsUpdate {
    pub store_name: Option<String>,
    pub store_description: Option<String>,
    #[schema(example = "dark")]
    pub theme: Option<String>,
    pub two_factor_auth: Option<bool>,
    pub email_notifications: Option<bool>,
}

pub const THEMES: [&str; 3] = ["light", "dark", "system"];
