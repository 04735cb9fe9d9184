use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::commission::VendorCommission;
use crate::models::store::StoreSettings;
use crate::models::user::DbUser;
use crate::models::vendor::VendorPermissionsRecord;

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP format
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn parse_opt_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    match s {
        Some(s) if !s.trim().is_empty() => Ok(Some(parse_datetime(&s)?)),
        _ => Ok(None),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, AppError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| AppError::internal(format!("missing {}: {}", column, e)))
}

pub fn db_user_from_row(row: &SqliteRow) -> Result<DbUser, AppError> {
    let id: String = get(row, "id")?;
    let created_at: String = get(row, "created_at")?;
    let updated_at: String = get(row, "updated_at")?;

    Ok(DbUser {
        id: parse_uuid(&id)?,
        name: get(row, "name")?,
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        role: get(row, "role")?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

pub fn vendor_permissions_from_row(row: &SqliteRow) -> Result<VendorPermissionsRecord, AppError> {
    let vendor_id: String = get(row, "vendor_id")?;
    let permissions: String = get(row, "permissions")?;
    let updated_by: Option<String> = get(row, "updated_by")?;
    let updated_at: Option<String> = get(row, "updated_at")?;

    Ok(VendorPermissionsRecord {
        vendor_id: parse_uuid(&vendor_id)?,
        permissions: serde_json::from_str(&permissions)
            .map_err(|e| AppError::internal(format!("corrupt vendor permissions: {}", e)))?,
        version: get(row, "version")?,
        updated_by: updated_by.as_deref().map(parse_uuid).transpose()?,
        updated_at: parse_opt_datetime(updated_at)?,
    })
}

pub fn vendor_commission_from_row(row: &SqliteRow) -> Result<VendorCommission, AppError> {
    let vendor_id: String = get(row, "vendor_id")?;
    let updated_at: String = get(row, "updated_at")?;

    Ok(VendorCommission {
        vendor_id: parse_uuid(&vendor_id)?,
        rate: get(row, "rate")?,
        valid_from: parse_opt_datetime(get(row, "valid_from")?)?,
        valid_to: parse_opt_datetime(get(row, "valid_to")?)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

pub fn store_settings_from_row(row: &SqliteRow) -> Result<StoreSettings, AppError> {
    let vendor_id: String = get(row, "vendor_id")?;
    let updated_at: Option<String> = get(row, "updated_at")?;

    Ok(StoreSettings {
        vendor_id: parse_uuid(&vendor_id)?,
        store_name: get(row, "store_name")?,
        store_description: get(row, "store_description")?,
        theme: get(row, "theme")?,
        two_factor_auth: get(row, "two_factor_auth")?,
        email_notifications: get(row, "email_notifications")?,
        updated_at: parse_opt_datetime(updated_at)?,
    })
}
