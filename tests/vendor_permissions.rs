use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn vendor_refund_is_denied_until_an_admin_grants_it() -> Result<()> {
    let t = common::spawn_app().await?;
    let (admin, _) = t.register_as("Ada", "ada@example.com", "admin").await?;
    let (vendor, vendor_id) = t.register_as("Vic", "vic@example.com", "vendor").await?;

    let (status, body) = t
        .request("POST", "/authz/check", Some(&vendor), Some(json!({ "capability": "refundOrder" })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "override_denied");

    let (status, record) = t.request("GET", &format!("/vendors/{}/permissions", vendor_id), Some(&vendor), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 0);
    assert_eq!(record["permissions"]["orders"]["refund"], false);

    let (status, record) = t
        .request(
            "PATCH",
            &format!("/vendors/{}/permissions", vendor_id),
            Some(&admin),
            Some(json!({ "patch": { "orders": { "refund": true } }, "expected_version": 0 })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", record);
    assert_eq!(record["version"], 1);
    assert_eq!(record["permissions"]["orders"]["refund"], true);
    // Untouched flags keep their defaults.
    assert_eq!(record["permissions"]["products"]["create"], true);

    let (status, body) = t
        .request("POST", "/authz/check", Some(&vendor), Some(json!({ "capability": "refundOrder" })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);

    Ok(())
}

#[tokio::test]
async fn stale_versions_conflict_and_bad_patches_are_rejected() -> Result<()> {
    let t = common::spawn_app().await?;
    let (admin, _) = t.register_as("Ada", "ada@example.com", "admin").await?;
    let (_, vendor_id) = t.register_as("Vic", "vic@example.com", "vendor").await?;
    let uri = format!("/vendors/{}/permissions", vendor_id);

    let (status, _) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "earnings.withdraw": true }, "expected_version": 0 })))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "products": { "delete": true } }, "expected_version": 0 })))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "orders": { "cancel": true } } })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("orders.cancel"), "{}", body);

    let (status, _) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "orders": { "refund": "yes" } } })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A failed patch leaves the stored record alone.
    let (status, record) = t.request("GET", &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 1);
    assert_eq!(record["permissions"]["earnings"]["withdraw"], true);
    assert_eq!(record["permissions"]["orders"]["refund"], false);

    // Reset drops back to defaults under a new version.
    let (status, record) = t.request("DELETE", &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 2);
    assert_eq!(record["permissions"]["earnings"]["withdraw"], false);

    Ok(())
}

#[tokio::test]
async fn versions_keep_increasing_across_resets() -> Result<()> {
    let t = common::spawn_app().await?;
    let (admin, _) = t.register_as("Ada", "ada@example.com", "admin").await?;
    let (_, vendor_id) = t.register_as("Vic", "vic@example.com", "vendor").await?;
    let uri = format!("/vendors/{}/permissions", vendor_id);

    let (status, record) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "orders.refund": true }, "expected_version": 0 })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 1);

    let (status, record) = t.request("DELETE", &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 2);

    // A writer that saw the defaults before the first patch is stale now.
    let (status, _) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "orders.refund": true }, "expected_version": 0 })))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, record) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "products.delete": true }, "expected_version": 2 })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 3);

    // A writer still holding version 1 must not land on top of version 3.
    let (status, _) = t
        .request("PATCH", &uri, Some(&admin), Some(json!({ "patch": { "earnings.withdraw": true }, "expected_version": 1 })))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, record) = t.request("GET", &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 3);
    assert_eq!(record["permissions"]["products"]["delete"], true);
    assert_eq!(record["permissions"]["earnings"]["withdraw"], false);

    // Resetting a vendor that never had an override changes nothing.
    let (_, other_id) = t.register_as("Val", "val@example.com", "vendor").await?;
    let (status, record) = t
        .request("DELETE", &format!("/vendors/{}/permissions", other_id), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["version"], 0);

    Ok(())
}

#[tokio::test]
async fn vendors_cannot_touch_overrides() -> Result<()> {
    let t = common::spawn_app().await?;
    let (vendor, vendor_id) = t.register_as("Vic", "vic@example.com", "vendor").await?;
    let (_, other_id) = t.register_as("Val", "val@example.com", "vendor").await?;

    let (status, _) = t
        .request(
            "PATCH",
            &format!("/vendors/{}/permissions", vendor_id),
            Some(&vendor),
            Some(json!({ "patch": { "orders": { "refund": true } } })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.request("GET", &format!("/vendors/{}/permissions", other_id), Some(&vendor), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap_or_default().contains("insufficient_role"), "{}", body);

    // Reading one's own record is a granted capability of its own.
    let (status, body) = t.request("GET", &format!("/vendors/{}/permissions", vendor_id), Some(&vendor), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["version"], 0);

    // Clients hold no such grant, even for their own id.
    let (client, client_id) = t.register("Cleo", "cleo@example.com").await?;
    let (status, _) = t.request("GET", &format!("/vendors/{}/permissions", client_id), Some(&client), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn store_settings_follow_the_edit_store_flag() -> Result<()> {
    let t = common::spawn_app().await?;
    let (admin, _) = t.register_as("Ada", "ada@example.com", "admin").await?;
    let (vendor, vendor_id) = t.register_as("Vic", "vic@example.com", "vendor").await?;
    let (client, _) = t.register("Carl", "carl@example.com").await?;

    let (status, settings) = t.request("GET", "/store/settings", Some(&vendor), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "light");

    let (status, settings) = t
        .request("PUT", "/store/settings", Some(&vendor), Some(json!({ "store_name": "Vic's", "theme": "dark" })))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", settings);
    assert_eq!(settings["store_name"], "Vic's");
    assert_eq!(settings["theme"], "dark");
    assert_eq!(settings["email_notifications"], true);

    let (status, _) = t
        .request("PUT", "/store/settings", Some(&vendor), Some(json!({ "theme": "neon" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.request("GET", "/store/settings", Some(&client), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .request(
            "PATCH",
            &format!("/vendors/{}/permissions", vendor_id),
            Some(&admin),
            Some(json!({ "patch": { "settings": { "editStore": false } } })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .request("PUT", "/store/settings", Some(&vendor), Some(json!({ "theme": "light" })))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap_or_default().contains("override_denied"), "{}", body);

    Ok(())
}

#[tokio::test]
async fn capabilities_list_restrictions_for_vendors() -> Result<()> {
    let t = common::spawn_app().await?;
    let (vendor, _) = t.register_as("Vic", "vic@example.com", "vendor").await?;

    let (status, body) = t.request("GET", "/authz/capabilities", Some(&vendor), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "vendor");

    let restricted: Vec<&str> = body["restricted"]
        .as_array()
        .map(|caps| caps.iter().filter_map(|c| c.as_str()).collect())
        .unwrap_or_default();
    assert!(restricted.contains(&"refundOrder"));
    assert!(restricted.contains(&"withdrawEarnings"));
    assert!(restricted.contains(&"deleteProduct"));
    assert!(!restricted.contains(&"createProduct"));

    let (status, _) = t
        .request("POST", "/authz/check", Some(&vendor), Some(json!({ "capability": "launchRocket" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
