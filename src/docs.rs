use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{
    Capability, DenyReason, Role, VendorPermissions,
    vendor::{EarningsPermissions, OrderPermissions, ProductPermissions, SettingsPermissions},
};
use crate::commission::CommissionBreakdown;
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::auth::logout,
        routes::users::list_users,
        routes::users::create_user,
        routes::users::update_role,
        routes::users::delete_user,
        routes::vendors::get_permissions,
        routes::vendors::patch_permissions,
        routes::vendors::reset_permissions,
        routes::commissions::get_rule,
        routes::commissions::update_rule,
        routes::commissions::get_vendor_rate,
        routes::commissions::update_vendor_rate,
        routes::commissions::calculate,
        routes::store::get_settings,
        routes::store::update_settings,
        routes::authz::check,
        routes::authz::capabilities
    ),
    components(
        schemas(
            Role,
            Capability,
            DenyReason,
            VendorPermissions,
            ProductPermissions,
            OrderPermissions,
            EarningsPermissions,
            SettingsPermissions,
            CommissionBreakdown,
            routes::health::HealthResponse,
            models::user::User,
            models::user::AuthResponse,
            models::user::LoginRequest,
            models::user::RegisterRequest,
            models::user::CreateUserRequest,
            models::user::CreatedUserResponse,
            models::user::UpdateRoleRequest,
            models::user::MessageResponse,
            models::vendor::VendorPermissionsRecord,
            models::vendor::PatchVendorPermissionsRequest,
            models::commission::CommissionRule,
            models::commission::CommissionRuleRequest,
            models::commission::VendorCommission,
            models::commission::VendorCommissionRequest,
            models::commission::CalculateCommissionRequest,
            models::commission::CalculateCommissionResponse,
            models::store::StoreSettings,
            models::store::StoreSettingsUpdate,
            models::authz::CheckRequest,
            models::authz::CheckResponse,
            models::authz::CapabilitiesResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "Account administration"),
        (name = "Vendors", description = "Per-vendor permission overrides"),
        (name = "Commissions", description = "Commission rules and calculation"),
        (name = "Store", description = "Vendor store settings"),
        (name = "Authorization", description = "Decisions and effective capabilities")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

pub fn build_openapi(port: u16) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(format!("http://localhost:{port}"))]);
    doc
}

/// Swagger UI at `/docs`, raw document at `/api-docs/openapi.json`.
pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = build_openapi(8000);
        for path in [
            "/api/health",
            "/auth/login",
            "/users",
            "/users/{id}/role",
            "/vendors/{vendor_id}/permissions",
            "/commissions/calculate",
            "/store/settings",
            "/authz/check",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = build_openapi(8000);
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
