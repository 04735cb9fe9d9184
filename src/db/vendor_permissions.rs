//! Persistence for vendor permission overrides.
//!
//! Writes are guarded by a `version` column: an update only lands when the
//! stored version still matches what the caller read.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{default_for, VendorPermissions};
use crate::db::row_parsers;
use crate::errors::{AppError, AppResult};
use crate::models::vendor::VendorPermissionsRecord;

pub async fn load(pool: &SqlitePool, vendor_id: Uuid) -> AppResult<Option<VendorPermissionsRecord>> {
    let row = sqlx::query(
        "SELECT vendor_id, permissions, version, updated_by, updated_at FROM vendor_permissions WHERE vendor_id = ?",
    )
    .bind(vendor_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_parsers::vendor_permissions_from_row).transpose()
}

/// Current record, or the defaults at version 0 when none is stored.
pub async fn load_or_default(pool: &SqlitePool, vendor_id: Uuid) -> AppResult<VendorPermissionsRecord> {
    Ok(load(pool, vendor_id).await?.unwrap_or_else(|| VendorPermissionsRecord {
        vendor_id,
        permissions: default_for(vendor_id),
        version: 0,
        updated_by: None,
        updated_at: None,
    }))
}

pub async fn snapshot(pool: &SqlitePool, vendor_id: Uuid) -> AppResult<VendorPermissions> {
    Ok(load_or_default(pool, vendor_id).await?.permissions)
}

/// Stores `permissions` if the stored version is still `expected_version`.
pub async fn save(
    pool: &SqlitePool,
    vendor_id: Uuid,
    permissions: &VendorPermissions,
    expected_version: i64,
    updated_by: Uuid,
) -> AppResult<VendorPermissionsRecord> {
    let now = chrono::Utc::now();
    let encoded = serde_json::to_string(permissions)
        .map_err(|e| AppError::internal(format!("failed to encode permissions: {e}")))?;

    let result = if expected_version == 0 {
        sqlx::query(
            "INSERT OR IGNORE INTO vendor_permissions (vendor_id, permissions, version, updated_by, updated_at) VALUES (?, ?, 1, ?, ?)",
        )
        .bind(vendor_id.to_string())
        .bind(&encoded)
        .bind(updated_by.to_string())
        .bind(now.to_rfc3339())
        .execute(pool)
        .await?
    } else {
        sqlx::query(
            "UPDATE vendor_permissions SET permissions = ?, version = version + 1, updated_by = ?, updated_at = ? WHERE vendor_id = ? AND version = ?",
        )
        .bind(&encoded)
        .bind(updated_by.to_string())
        .bind(now.to_rfc3339())
        .bind(vendor_id.to_string())
        .bind(expected_version)
        .execute(pool)
        .await?
    };

    if result.rows_affected() == 0 {
        return Err(AppError::conflict(format!(
            "vendor permissions changed since version {expected_version}"
        )));
    }

    Ok(VendorPermissionsRecord {
        vendor_id,
        permissions: *permissions,
        version: expected_version + 1,
        updated_by: Some(updated_by),
        updated_at: Some(now),
    })
}

/// Puts the vendor back on defaults.
///
/// The row is kept and its version bumped, so versions never repeat and a
/// writer holding an older version still conflicts. Without a stored row
/// there is nothing to reset and the default record is returned as is.
pub async fn reset(pool: &SqlitePool, vendor_id: Uuid, updated_by: Uuid) -> AppResult<VendorPermissionsRecord> {
    let current = load_or_default(pool, vendor_id).await?;
    if current.version == 0 {
        return Ok(current);
    }
    save(pool, vendor_id, &default_for(vendor_id), current.version, updated_by).await
}
