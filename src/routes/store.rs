use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Action, Capability, ResourceContext};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::jwt::CurrentActor;
use crate::models::store::{StoreSettings, StoreSettingsUpdate, THEMES};

#[utoipa::path(
    get,
    path = "/store/settings",
    tag = "Store",
    responses(
        (status = 200, description = "Caller's store settings", body = StoreSettings),
        (status = 403, description = "Role lacks manageStoreSettings or the vendor override blocks it")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_settings(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<StoreSettings>> {
    state
        .authorize(&actor, Action::new(Capability::ManageStoreSettings), ResourceContext::new().with_owner(actor.id))
        .await?;

    let settings = db::store::settings_for(&state.pool, actor.id).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/store/settings",
    tag = "Store",
    request_body = StoreSettingsUpdate,
    responses(
        (status = 200, description = "Settings stored", body = StoreSettings),
        (status = 400, description = "Unknown theme or empty store name"),
        (status = 403, description = "Role lacks manageStoreSettings or the vendor override blocks it")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_settings(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    headers: HeaderMap,
    Json(payload): Json<StoreSettingsUpdate>,
) -> AppResult<Json<StoreSettings>> {
    state
        .authorize(&actor, Action::new(Capability::ManageStoreSettings), ResourceContext::new().with_owner(actor.id))
        .await?;

    if let Some(theme) = payload.theme.as_deref() {
        if !THEMES.contains(&theme) {
            return Err(AppError::bad_request(format!(
                "theme must be one of {}",
                THEMES.join(", ")
            )));
        }
    }
    if payload.store_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::bad_request("store_name cannot be empty"));
    }

    let before = db::store::settings_for(&state.pool, actor.id).await?;
    let settings = db::store::save(&state.pool, &before.merged(payload)).await?;

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(actor.id),
        &settings,
        Some(&before),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(settings))
}
