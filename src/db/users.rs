use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::Role;
use crate::db::row_parsers;
use crate::errors::{AppError, AppResult};
use crate::models::user::DbUser;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

pub async fn fetch_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<DbUser>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_parsers::db_user_from_row).transpose()
}

pub async fn require_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    fetch_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}

pub async fn fetch_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_parsers::db_user_from_row).transpose()
}

pub async fn list(pool: &SqlitePool) -> AppResult<Vec<DbUser>> {
    let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_parsers::db_user_from_row).collect()
}

pub async fn ensure_email_available(pool: &SqlitePool, email: &str) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(AppError::conflict("email already in use"));
    }

    Ok(())
}

pub async fn insert(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> AppResult<Uuid> {
    let user_id = Uuid::new_v4();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id.to_string())
    .bind(name.trim())
    .bind(email.trim().to_lowercase())
    .bind(password_hash)
    .bind(role.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|err| match err {
        // Another insert won the race past `ensure_email_available`.
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::conflict("email already in use"),
        other => AppError::from(other),
    })?;

    Ok(user_id)
}

pub async fn update_role(pool: &SqlitePool, user_id: Uuid, role: Role) -> AppResult<()> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, user_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }
    Ok(())
}

/// Stored role name of an account, unparsed.
pub async fn role_of(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<String>> {
    let role = sqlx::query_scalar("SELECT role FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;
    Ok(role)
}
