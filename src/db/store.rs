use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::AppResult;
use crate::models::store::StoreSettings;

/// Stored settings, or the defaults when the vendor never saved any.
pub async fn settings_for(pool: &SqlitePool, vendor_id: Uuid) -> AppResult<StoreSettings> {
    let row = sqlx::query(
        "SELECT vendor_id, store_name, store_description, theme, two_factor_auth, email_notifications, updated_at \
         FROM store_settings WHERE vendor_id = ?",
    )
    .bind(vendor_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => row_parsers::store_settings_from_row(&row),
        None => Ok(StoreSettings::defaults_for(vendor_id)),
    }
}

pub async fn save(pool: &SqlitePool, settings: &StoreSettings) -> AppResult<StoreSettings> {
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO store_settings (vendor_id, store_name, store_description, theme, two_factor_auth, email_notifications, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(vendor_id) DO UPDATE SET store_name = excluded.store_name, store_description = excluded.store_description, \
         theme = excluded.theme, two_factor_auth = excluded.two_factor_auth, \
         email_notifications = excluded.email_notifications, updated_at = excluded.updated_at",
    )
    .bind(settings.vendor_id.to_string())
    .bind(&settings.store_name)
    .bind(&settings.store_description)
    .bind(&settings.theme)
    .bind(settings.two_factor_auth)
    .bind(settings.email_notifications)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(StoreSettings { updated_at: Some(now), ..settings.clone() })
}
