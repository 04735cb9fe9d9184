use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{Action, Actor, AuthorizationEngine, PermissionTable, PolicyEvaluator, ResourceContext, Role};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::jwt::JwtConfig;
use crate::routes::{auth, authz, commissions, health, store, users, vendors};

const DEFAULT_COMMISSION_RATE: f64 = 10.0;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub authz: Arc<dyn PolicyEvaluator>,
    pub event_bus: EventBus,
    /// Used until an admin stores a global commission rule
    pub default_commission_rate: f64,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, authz: Arc<dyn PolicyEvaluator>, event_bus: EventBus) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            authz,
            event_bus,
            default_commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }

    pub fn with_default_commission_rate(mut self, rate: f64) -> Self {
        self.default_commission_rate = rate;
        self
    }

    /// Runs the policy for `actor`, turning a denial into a 403.
    ///
    /// Vendor actors get their stored override flags attached unless the
    /// caller already supplied a snapshot.
    pub async fn authorize(&self, actor: &Actor, action: Action, mut ctx: ResourceContext) -> AppResult<()> {
        if actor.role == Role::Vendor && ctx.vendor_permissions.is_none() && action.capability.vendor_flag().is_some() {
            ctx.vendor_permissions = Some(db::vendor_permissions::snapshot(&self.pool, actor.id).await?);
        }

        self.authz.evaluate(actor, &action, &ctx).into_result().map_err(|reason| {
            tracing::info!(
                actor_id = %actor.id,
                role = %actor.role,
                capability = %action.capability,
                reason = reason.as_str(),
                "request denied"
            );
            AppError::from(reason)
        })
    }
}

fn default_commission_rate_from_env() -> Result<f64, AppError> {
    std::env::var("DEFAULT_COMMISSION_RATE")
        .map(|val| val.parse::<f64>())
        .unwrap_or(Ok(DEFAULT_COMMISSION_RATE))
        .map_err(|_| AppError::configuration("DEFAULT_COMMISSION_RATE must be a number"))
        .and_then(|rate| {
            crate::commission::validate_rate(rate)
                .map_err(|err| AppError::configuration(format!("DEFAULT_COMMISSION_RATE: {err}")))
        })
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let table = PermissionTable::from_env()?;
    let engine: Arc<dyn PolicyEvaluator> = Arc::new(AuthorizationEngine::new(table));

    let (event_bus, rx) = init_event_bus();
    tokio::spawn(start_activity_listener(rx, pool.clone()));

    let state = AppState::new(pool, jwt_config, engine, event_bus)
        .with_default_commission_rate(default_commission_rate_from_env()?);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/:id", axum::routing::delete(users::delete_user))
        .route("/:id/role", patch(users::update_role));

    let vendor_routes = Router::new().route(
        "/:vendor_id/permissions",
        get(vendors::get_permissions)
            .patch(vendors::patch_permissions)
            .delete(vendors::reset_permissions),
    );

    let commission_routes = Router::new()
        .route("/rule", get(commissions::get_rule).put(commissions::update_rule))
        .route(
            "/vendors/:vendor_id",
            get(commissions::get_vendor_rate).put(commissions::update_vendor_rate),
        )
        .route("/calculate", post(commissions::calculate));

    let store_routes = Router::new().route("/settings", get(store::get_settings).put(store::update_settings));

    let authz_routes = Router::new()
        .route("/check", post(authz::check))
        .route("/capabilities", get(authz::capabilities));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/vendors", vendor_routes)
        .nest("/commissions", commission_routes)
        .nest("/store", store_routes)
        .nest("/authz", authz_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
