//! API router with OpenAPI document

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::middleware::{auth_middleware, AuthState};
use super::modules::auth::{self, AuthHandlerState};
use super::modules::health::{self, HealthState};
use super::modules::users::{self, UserHandlerState};
use crate::application::UserService;

/// Unified state for every route. Each handler keeps its own `State<T>`
/// extractor through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub auth: AuthState,
    pub health: HealthState,
}

impl AppState {
    pub fn new(users: Arc<UserService>, storage: &'static str) -> Self {
        let auth = AuthState {
            credentials: Arc::clone(users.credentials()),
        };

        Self {
            users,
            auth,
            health: HealthState {
                started_at: Arc::new(Instant::now()),
                storage,
            },
        }
    }
}

impl FromRef<AppState> for AuthHandlerState {
    fn from_ref(s: &AppState) -> Self {
        AuthHandlerState {
            users: Arc::clone(&s.users),
        }
    }
}

impl FromRef<AppState> for UserHandlerState {
    fn from_ref(s: &AppState) -> Self {
        UserHandlerState {
            users: Arc::clone(&s.users),
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        s.auth.clone()
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        s.health.clone()
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::handlers::root,
        health::handlers::health_check,
        auth::handlers::login,
        auth::handlers::register,
        auth::handlers::get_current_user,
        auth::handlers::update_current_user,
        auth::handlers::change_password,
        users::handlers::get_user,
        users::handlers::update_role,
        users::handlers::update_status,
    ),
    components(schemas(
        health::HealthResponse,
        auth::dto::LoginRequest,
        auth::dto::LoginResponse,
        auth::dto::RegisterRequest,
        auth::dto::ChangePasswordRequest,
        auth::dto::UpdateProfileRequest,
        auth::dto::UserInfo,
        users::dto::UpdateRoleRequest,
        users::dto::UpdateStatusRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness endpoints"),
        (name = "Authentication", description = "Registration, login and the caller's own account"),
        (name = "Users", description = "Account administration")
    ),
    info(title = "Verify AML/KYC API")
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full router: public routes, bearer-protected routes, and the
/// CORS / tracing / security-header layers around both.
pub fn create_api_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/auth/me",
            get(auth::handlers::get_current_user).patch(auth::handlers::update_current_user),
        )
        .route(
            "/api/v1/auth/change-password",
            post(auth::handlers::change_password),
        )
        .route("/api/v1/users/{id}", get(users::handlers::get_user))
        .route("/api/v1/users/{id}/role", patch(users::handlers::update_role))
        .route(
            "/api/v1/users/{id}/status",
            patch(users::handlers::update_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/v1/auth/register", post(auth::handlers::register))
        .route("/api/v1/auth/login", post(auth::handlers::login))
        .route("/api-docs/openapi.json", get(openapi_json));

    public
        .merge(protected)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
