use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Action, Actor, Capability, ResourceContext, Role};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::jwt::CurrentActor;
use crate::models::user::{CreateUserRequest, CreatedUserResponse, MessageResponse, UpdateRoleRequest, User};
use crate::utils::{hash_password, normalize_email, temporary_password};

/// Staff roles need `assignStaffRole` on top of the route's own capability.
async fn ensure_can_assign(state: &AppState, actor: &Actor, role: Role, target: Option<Uuid>) -> AppResult<()> {
    if !role.is_admin() {
        return Ok(());
    }
    let mut action = Action::new(Capability::AssignStaffRole);
    action.target_id = target;
    state.authorize(actor, action, ResourceContext::new()).await
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All accounts", body = [User]),
        (status = 403, description = "Role lacks viewAllUsers")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<Vec<User>>> {
    state
        .authorize(&actor, Action::new(Capability::ViewAllUsers), ResourceContext::new())
        .await?;

    let users = db::users::list(&state.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = CreatedUserResponse),
        (status = 403, description = "Role lacks createUser"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    state
        .authorize(&actor, Action::new(Capability::CreateUser), ResourceContext::new())
        .await?;

    let role = payload.role.unwrap_or(Role::Client);
    ensure_can_assign(&state, &actor, role, None).await?;

    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    let email = normalize_email(&payload.email)?;
    db::users::ensure_email_available(&state.pool, &email).await?;

    let temporary_password = temporary_password();
    let password_hash = hash_password(&temporary_password)?;
    let user_id = db::users::insert(&state.pool, &payload.name, &email, &password_hash, role).await?;
    let user: User = db::users::require_by_id(&state.pool, user_id).await?.try_into()?;

    tracing::info!(actor_id = %actor.id, user_id = %user.id, role = %role, "user created");
    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(actor.id),
        &user,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(CreatedUserResponse { user, temporary_password })))
}

#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    tag = "Users",
    params(("id" = Uuid, Path, description = "Account to update")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 403, description = "Role lacks updateUserRole, or the target is the caller"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<User>> {
    state
        .authorize(&actor, Action::new(Capability::UpdateUserRole).on(user_id), ResourceContext::new())
        .await?;
    ensure_can_assign(&state, &actor, payload.role, Some(user_id)).await?;

    let before: User = db::users::require_by_id(&state.pool, user_id).await?.try_into()?;
    db::users::update_role(&state.pool, user_id, payload.role).await?;
    let after: User = db::users::require_by_id(&state.pool, user_id).await?.try_into()?;

    tracing::info!(
        actor_id = %actor.id,
        user_id = %user_id,
        from = %before.role,
        to = %after.role,
        "user role changed"
    );
    log_activity_with_context(
        &state.event_bus,
        "role_changed",
        Some(actor.id),
        &after,
        Some(&before),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(after))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "Account to delete")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Role lacks deleteUser, or the target is the caller"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<Json<MessageResponse>> {
    state
        .authorize(&actor, Action::new(Capability::DeleteUser).on(user_id), ResourceContext::new())
        .await?;

    let user: User = db::users::require_by_id(&state.pool, user_id).await?.try_into()?;
    db::users::delete(&state.pool, user_id).await?;

    tracing::info!(actor_id = %actor.id, user_id = %user_id, "user deleted");
    log_activity_with_context(
        &state.event_bus,
        "deleted",
        Some(actor.id),
        &user,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}
