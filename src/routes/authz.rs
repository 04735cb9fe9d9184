use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Action, Actor, Capability, ResourceContext, Role};
use crate::db;
use crate::errors::AppResult;
use crate::jwt::CurrentActor;
use crate::models::authz::{CapabilitiesResponse, CheckRequest, CheckResponse};

/// Vendor callers carry their stored override flags into every check.
async fn context_for(state: &AppState, actor: &Actor) -> AppResult<ResourceContext> {
    let mut ctx = ResourceContext::new();
    if actor.role == Role::Vendor {
        ctx = ctx.with_vendor_permissions(db::vendor_permissions::snapshot(&state.pool, actor.id).await?);
    }
    Ok(ctx)
}

#[utoipa::path(
    post,
    path = "/authz/check",
    tag = "Authorization",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Decision for the caller", body = CheckResponse),
        (status = 400, description = "Unknown capability")
    ),
    security(("bearer_auth" = []))
)]
pub async fn check(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CheckRequest>,
) -> AppResult<Json<CheckResponse>> {
    let mut action = Action::parse(&payload.capability)?;
    action.target_id = payload.target_id;

    let ctx = context_for(&state, &actor).await?;
    let decision = state.authz.evaluate(&actor, &action, &ctx);

    Ok(Json(CheckResponse {
        capability: action.capability,
        allowed: decision.is_allowed(),
        reason: decision.reason(),
    }))
}

#[utoipa::path(
    get,
    path = "/authz/capabilities",
    tag = "Authorization",
    responses((status = 200, description = "Caller's capabilities", body = CapabilitiesResponse)),
    security(("bearer_auth" = []))
)]
pub async fn capabilities(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<CapabilitiesResponse>> {
    let capabilities = state.authz.capabilities_for(actor.role);
    let vendor_permissions = context_for(&state, &actor).await?.vendor_permissions;

    let restricted: Vec<Capability> = match vendor_permissions {
        Some(perms) => capabilities
            .iter()
            .copied()
            .filter(|cap| cap.vendor_flag().is_some_and(|flag| !perms.get(flag)))
            .collect(),
        None => Vec::new(),
    };

    Ok(Json(CapabilitiesResponse {
        user_id: actor.id,
        role: actor.role,
        capabilities,
        restricted,
        vendor_permissions,
    }))
}
