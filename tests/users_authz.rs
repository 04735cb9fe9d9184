use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn client_cannot_list_users() -> Result<()> {
    let t = common::spawn_app().await?;
    let (token, _) = t.register("Carla", "carla@example.com").await?;

    let (status, body) = t.request("GET", "/users", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap_or_default().contains("insufficient_role"), "{}", body);

    Ok(())
}

#[tokio::test]
async fn owner_manages_users_but_not_itself() -> Result<()> {
    let t = common::spawn_app().await?;
    let (owner, owner_id) = t.register_as("Olivia", "olivia@example.com", "owner").await?;
    let (_, client_id) = t.register("Carl", "carl@example.com").await?;

    let (status, users) = t.request("GET", "/users", Some(&owner), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(2));

    // Promote the client to vendor.
    let (status, body) = t
        .request("PATCH", &format!("/users/{}/role", client_id), Some(&owner), Some(json!({ "role": "vendor" })))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["role"], "vendor");

    // Self-demotion and self-deletion are refused.
    let (status, body) = t
        .request("PATCH", &format!("/users/{}/role", owner_id), Some(&owner), Some(json!({ "role": "client" })))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap_or_default().contains("self_action_forbidden"), "{}", body);

    let (status, _) = t.request("DELETE", &format!("/users/{}", owner_id), Some(&owner), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.request("DELETE", &format!("/users/{}", client_id), Some(&owner), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.request("DELETE", &format!("/users/{}", client_id), Some(&owner), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn admin_creates_accounts_but_cannot_change_roles() -> Result<()> {
    let t = common::spawn_app().await?;
    let (admin, _) = t.register_as("Ada", "ada@example.com", "admin").await?;

    let (status, body) = t
        .request(
            "POST",
            "/users",
            Some(&admin),
            Some(json!({ "name": "Vera", "email": "vera@example.com", "role": "vendor" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["user"]["role"], "vendor");
    let password = body["temporary_password"].as_str().context("missing temporary password")?;
    let vendor_id = body["user"]["id"].as_str().context("missing id")?.to_string();

    // The generated password works.
    let (status, _) = t
        .request("POST", "/auth/login", None, Some(json!({ "email": "vera@example.com", "password": password })))
        .await?;
    assert_eq!(status, StatusCode::OK);

    // Staff roles are reserved to owners.
    let (status, body) = t
        .request(
            "POST",
            "/users",
            Some(&admin),
            Some(json!({ "name": "Oscar", "email": "oscar@example.com", "role": "owner" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap_or_default().contains("insufficient_role"), "{}", body);

    let (status, _) = t
        .request("PATCH", &format!("/users/{}/role", vendor_id), Some(&admin), Some(json!({ "role": "client" })))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.request("DELETE", &format!("/users/{}", vendor_id), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn role_change_applies_to_existing_tokens() -> Result<()> {
    let t = common::spawn_app().await?;
    let (owner, _) = t.register_as("Olivia", "olivia@example.com", "owner").await?;
    let (token, id) = t.register("Cleo", "cleo@example.com").await?;

    let (status, _) = t.request("GET", "/users", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .request("PATCH", &format!("/users/{}/role", id), Some(&owner), Some(json!({ "role": "admin" })))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.request("GET", "/users", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn role_changes_reach_the_activity_log() -> Result<()> {
    let t = common::spawn_app().await?;
    let (owner, _) = t.register_as("Olivia", "olivia@example.com", "owner").await?;
    let (_, id) = t.register("Cleo", "cleo@example.com").await?;

    let (status, _) = t
        .request("PATCH", &format!("/users/{}/role", id), Some(&owner), Some(json!({ "role": "vendor" })))
        .await?;
    assert_eq!(status, StatusCode::OK);

    // The listener writes asynchronously.
    let mut logs: Vec<(String, String, String)> = Vec::new();
    for _ in 0..15 {
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
        logs = sqlx::query_as(
            "SELECT event_name, description, severity FROM activity_log WHERE event_name = 'user.role_changed'",
        )
        .fetch_all(&t.pool)
        .await?;
        if !logs.is_empty() {
            break;
        }
    }

    assert!(!logs.is_empty(), "Activity log should contain user.role_changed event");
    assert_eq!(logs[0].1, "User role changed");
    assert_eq!(logs[0].2, "critical");

    Ok(())
}

#[tokio::test]
async fn owners_hand_out_staff_roles() -> Result<()> {
    let t = common::spawn_app().await?;
    let (owner, _) = t.register_as("Olivia", "olivia@example.com", "owner").await?;
    let (_, id) = t.register("Cleo", "cleo@example.com").await?;

    let (status, body) = t
        .request(
            "POST",
            "/users",
            Some(&owner),
            Some(json!({ "name": "Ada", "email": "ada@example.com", "role": "admin" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["user"]["role"], "admin");

    let (status, body) = t
        .request("PATCH", &format!("/users/{}/role", id), Some(&owner), Some(json!({ "role": "owner" })))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["role"], "owner");

    Ok(())
}
