use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Action, Actor, Capability, ResourceContext};
use crate::commission::{calculate_commission, validate_rate};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::jwt::CurrentActor;
use crate::models::commission::{
    CalculateCommissionRequest, CalculateCommissionResponse, CommissionRule, CommissionRuleRequest,
    VendorCommission, VendorCommissionRequest,
};

/// Own rate needs `viewCommission`; anyone else's needs `viewVendorCommission`.
async fn authorize_vendor_read(state: &AppState, actor: &Actor, vendor_id: Uuid) -> AppResult<()> {
    let capability = if actor.id == vendor_id {
        Capability::ViewCommission
    } else {
        Capability::ViewVendorCommission
    };
    state
        .authorize(actor, Action::new(capability).on(vendor_id), ResourceContext::new().with_owner(vendor_id))
        .await
}

#[utoipa::path(
    get,
    path = "/commissions/rule",
    tag = "Commissions",
    responses(
        (status = 200, description = "Global commission rule", body = CommissionRule),
        (status = 403, description = "Role lacks viewCommission")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_rule(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<CommissionRule>> {
    state
        .authorize(&actor, Action::new(Capability::ViewCommission), ResourceContext::new())
        .await?;

    let rule = db::commissions::global_rule(&state.pool, state.default_commission_rate).await?;
    Ok(Json(rule))
}

#[utoipa::path(
    put,
    path = "/commissions/rule",
    tag = "Commissions",
    request_body = CommissionRuleRequest,
    responses(
        (status = 200, description = "Rule stored", body = CommissionRule),
        (status = 400, description = "Rate outside 0..=100"),
        (status = 403, description = "Role lacks editCommissionRule")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_rule(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    headers: HeaderMap,
    Json(payload): Json<CommissionRuleRequest>,
) -> AppResult<Json<CommissionRule>> {
    state
        .authorize(&actor, Action::new(Capability::EditCommissionRule), ResourceContext::new())
        .await?;
    let rate = validate_rate(payload.global_rate)?;

    let before = db::commissions::global_rule(&state.pool, state.default_commission_rate).await?;
    let rule = db::commissions::set_global_rate(&state.pool, rate).await?;

    tracing::info!(actor_id = %actor.id, from = before.global_rate, to = rate, "global commission rate changed");
    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(actor.id),
        &rule,
        Some(&before),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(rule))
}

#[utoipa::path(
    get,
    path = "/commissions/vendors/{vendor_id}",
    tag = "Commissions",
    params(("vendor_id" = Uuid, Path, description = "Vendor account")),
    responses(
        (status = 200, description = "Vendor-specific rate", body = VendorCommission),
        (status = 403, description = "Role lacks viewCommission or viewVendorCommission"),
        (status = 404, description = "No vendor-specific rate")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_vendor_rate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(vendor_id): Path<Uuid>,
) -> AppResult<Json<VendorCommission>> {
    authorize_vendor_read(&state, &actor, vendor_id).await?;

    db::commissions::vendor_rate(&state.pool, vendor_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("no vendor-specific commission"))
}

#[utoipa::path(
    put,
    path = "/commissions/vendors/{vendor_id}",
    tag = "Commissions",
    params(("vendor_id" = Uuid, Path, description = "Vendor account")),
    request_body = VendorCommissionRequest,
    responses(
        (status = 200, description = "Rate stored", body = VendorCommission),
        (status = 400, description = "Invalid rate or validity window"),
        (status = 403, description = "Role lacks editCommissionRule"),
        (status = 404, description = "Vendor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_vendor_rate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(vendor_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<VendorCommissionRequest>,
) -> AppResult<Json<VendorCommission>> {
    state
        .authorize(&actor, Action::new(Capability::EditCommissionRule), ResourceContext::new())
        .await?;
    let rate = validate_rate(payload.rate)?;
    if let (Some(from), Some(to)) = (payload.valid_from, payload.valid_to) {
        if from >= to {
            return Err(AppError::bad_request("valid_from must be before valid_to"));
        }
    }
    db::users::require_by_id(&state.pool, vendor_id).await?;

    let before = db::commissions::vendor_rate(&state.pool, vendor_id).await?;
    let commission =
        db::commissions::set_vendor_rate(&state.pool, vendor_id, rate, payload.valid_from, payload.valid_to).await?;

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(actor.id),
        &commission,
        before.as_ref(),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(commission))
}

#[utoipa::path(
    post,
    path = "/commissions/calculate",
    tag = "Commissions",
    request_body = CalculateCommissionRequest,
    responses(
        (status = 200, description = "Commission split", body = CalculateCommissionResponse),
        (status = 400, description = "Negative total"),
        (status = 403, description = "Role lacks viewCommission")
    ),
    security(("bearer_auth" = []))
)]
pub async fn calculate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CalculateCommissionRequest>,
) -> AppResult<Json<CalculateCommissionResponse>> {
    // Without a vendor the caller's own store is priced.
    let vendor_id = payload.vendor_id.unwrap_or(actor.id);
    authorize_vendor_read(&state, &actor, vendor_id).await?;

    let rule = db::commissions::global_rule(&state.pool, state.default_commission_rate).await?;
    let vendor_rate = db::commissions::vendor_rate(&state.pool, vendor_id)
        .await?
        .filter(|c| c.is_active_at(Utc::now()))
        .map(|c| c.rate);

    let breakdown = calculate_commission(payload.total, rule.global_rate, vendor_rate)?;
    Ok(Json(CalculateCommissionResponse {
        total: payload.total,
        vendor_id,
        breakdown,
    }))
}
