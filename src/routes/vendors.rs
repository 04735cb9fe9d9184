use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{apply_override, Action, Capability, ResourceContext, Role};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::jwt::CurrentActor;
use crate::models::vendor::{PatchVendorPermissionsRequest, VendorPermissionsRecord};

async fn ensure_vendor(state: &AppState, vendor_id: Uuid) -> AppResult<()> {
    let role = db::users::role_of(&state.pool, vendor_id)
        .await?
        .ok_or_else(|| AppError::not_found("vendor not found"))?;
    let role: Role = role.parse().map_err(|err| AppError::internal(format!("user {vendor_id}: {err}")))?;
    if !role.is_vendor() || role.is_admin() {
        return Err(AppError::bad_request(format!("user {vendor_id} is not a vendor")));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/vendors/{vendor_id}/permissions",
    tag = "Vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor account")),
    responses(
        (status = 200, description = "Current flags and version", body = VendorPermissionsRecord),
        (status = 403, description = "Role lacks viewOwnVendorPermissions or manageVendorPermissions"),
        (status = 404, description = "Vendor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_permissions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(vendor_id): Path<Uuid>,
) -> AppResult<Json<VendorPermissionsRecord>> {
    let capability = if actor.id == vendor_id {
        Capability::ViewOwnVendorPermissions
    } else {
        Capability::ManageVendorPermissions
    };
    state
        .authorize(&actor, Action::new(capability).on(vendor_id), ResourceContext::new().with_owner(vendor_id))
        .await?;
    ensure_vendor(&state, vendor_id).await?;

    let record = db::vendor_permissions::load_or_default(&state.pool, vendor_id).await?;
    Ok(Json(record))
}

#[utoipa::path(
    patch,
    path = "/vendors/{vendor_id}/permissions",
    tag = "Vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor account")),
    request_body = PatchVendorPermissionsRequest,
    responses(
        (status = 200, description = "Override applied", body = VendorPermissionsRecord),
        (status = 400, description = "Unknown flag or non-boolean value"),
        (status = 403, description = "Role lacks manageVendorPermissions"),
        (status = 409, description = "expected_version is stale")
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_permissions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(vendor_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<PatchVendorPermissionsRequest>,
) -> AppResult<Json<VendorPermissionsRecord>> {
    state
        .authorize(&actor, Action::new(Capability::ManageVendorPermissions).on(vendor_id), ResourceContext::new())
        .await?;
    ensure_vendor(&state, vendor_id).await?;

    let current = db::vendor_permissions::load_or_default(&state.pool, vendor_id).await?;
    let expected_version = payload.expected_version.unwrap_or(current.version);
    if expected_version != current.version {
        return Err(AppError::conflict(format!(
            "vendor permissions are at version {}, not {expected_version}",
            current.version
        )));
    }

    let permissions = apply_override(&current.permissions, &payload.patch)?;
    let updated = db::vendor_permissions::save(&state.pool, vendor_id, &permissions, expected_version, actor.id).await?;

    tracing::info!(
        actor_id = %actor.id,
        vendor_id = %vendor_id,
        version = updated.version,
        "vendor permissions updated"
    );
    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(actor.id),
        &updated,
        Some(&current),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/vendors/{vendor_id}/permissions",
    tag = "Vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor account")),
    responses(
        (status = 200, description = "Back on defaults at a new version", body = VendorPermissionsRecord),
        (status = 409, description = "Changed concurrently"),
        (status = 403, description = "Role lacks manageVendorPermissions")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reset_permissions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(vendor_id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<Json<VendorPermissionsRecord>> {
    state
        .authorize(&actor, Action::new(Capability::ManageVendorPermissions).on(vendor_id), ResourceContext::new())
        .await?;
    ensure_vendor(&state, vendor_id).await?;

    let previous = db::vendor_permissions::load_or_default(&state.pool, vendor_id).await?;
    let record = db::vendor_permissions::reset(&state.pool, vendor_id, actor.id).await?;

    if record.version != previous.version {
        tracing::info!(actor_id = %actor.id, vendor_id = %vendor_id, version = record.version, "vendor permissions reset");
        log_activity_with_context(
            &state.event_bus,
            "reset",
            Some(actor.id),
            &record,
            Some(&previous),
            Some(RequestContext::from_headers(&headers)),
        );
    }

    Ok(Json(record))
}
