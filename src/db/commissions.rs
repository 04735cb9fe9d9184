use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::AppResult;
use crate::models::commission::{CommissionRule, VendorCommission};

pub async fn global_rule(pool: &SqlitePool, fallback_rate: f64) -> AppResult<CommissionRule> {
    let row: Option<(f64, String)> =
        sqlx::query_as("SELECT global_rate, updated_at FROM commission_rules WHERE id = 1")
            .fetch_optional(pool)
            .await?;

    match row {
        Some((global_rate, updated_at)) => Ok(CommissionRule {
            global_rate,
            updated_at: Some(row_parsers::parse_datetime(&updated_at)?),
        }),
        None => Ok(CommissionRule { global_rate: fallback_rate, updated_at: None }),
    }
}

pub async fn set_global_rate(pool: &SqlitePool, rate: f64) -> AppResult<CommissionRule> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO commission_rules (id, global_rate, updated_at) VALUES (1, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET global_rate = excluded.global_rate, updated_at = excluded.updated_at",
    )
    .bind(rate)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(CommissionRule { global_rate: rate, updated_at: Some(now) })
}

pub async fn vendor_rate(pool: &SqlitePool, vendor_id: Uuid) -> AppResult<Option<VendorCommission>> {
    let row = sqlx::query(
        "SELECT vendor_id, rate, valid_from, valid_to, updated_at FROM vendor_commissions WHERE vendor_id = ?",
    )
    .bind(vendor_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_parsers::vendor_commission_from_row).transpose()
}

pub async fn set_vendor_rate(
    pool: &SqlitePool,
    vendor_id: Uuid,
    rate: f64,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
) -> AppResult<VendorCommission> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO vendor_commissions (vendor_id, rate, valid_from, valid_to, updated_at) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(vendor_id) DO UPDATE SET rate = excluded.rate, valid_from = excluded.valid_from, \
         valid_to = excluded.valid_to, updated_at = excluded.updated_at",
    )
    .bind(vendor_id.to_string())
    .bind(rate)
    .bind(valid_from.map(|d| d.to_rfc3339()))
    .bind(valid_to.map(|d| d.to_rfc3339()))
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(VendorCommission { vendor_id, rate, valid_from, valid_to, updated_at: now })
}
