mod common;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::Value;

use marketplace_authz::create_app;
use marketplace_authz::errors::AppError;

// Everything lives in one test: PERMISSION_TABLE_PATH is process-wide.
#[tokio::test]
async fn permission_table_comes_from_the_configured_file() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let builtin = std::fs::read_to_string(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/permissions.json"),
    )?;
    let mut doc: Value = serde_json::from_str(&builtin)?;
    doc["roles"]["vendor"]
        .as_array_mut()
        .context("vendor grants are not a list")?
        .retain(|cap| cap != "viewCommission");
    let table_path = dir.path().join("permissions.json");
    std::fs::write(&table_path, doc.to_string())?;

    std::env::set_var("PERMISSION_TABLE_PATH", &table_path);
    let t = common::spawn_app().await?;
    let (vendor, _) = t.register_as("Vic", "vic@example.com", "vendor").await?;
    let (admin, _) = t.register_as("Ada", "ada@example.com", "admin").await?;

    let (status, body) = t.request("GET", "/commissions/rule", Some(&vendor), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
    assert!(body["message"].as_str().unwrap_or_default().contains("insufficient_role"), "{}", body);

    let (status, _) = t.request("GET", "/commissions/rule", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.request("GET", "/authz/capabilities", Some(&vendor), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.to_string().contains("\"viewCommission\""), "{}", body);

    // A table that fails to load stops startup.
    std::env::set_var("PERMISSION_TABLE_PATH", dir.path().join("absent.json"));
    let err = create_app(t.pool.clone()).await.err().context("missing table file was accepted")?;
    assert!(matches!(err, AppError::Configuration(_)), "{err:?}");

    let broken_path = dir.path().join("broken.json");
    std::fs::write(&broken_path, r#"{"roles": {"owner": []}}"#)?;
    std::env::set_var("PERMISSION_TABLE_PATH", &broken_path);
    let err = create_app(t.pool.clone()).await.err().context("invalid table was accepted")?;
    assert!(matches!(err, AppError::Configuration(_)), "{err:?}");

    std::env::remove_var("PERMISSION_TABLE_PATH");
    Ok(())
}
