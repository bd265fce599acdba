//! API route definitions

use super::auth_handlers;
use super::category_handlers;
use super::handlers::{self, ApiState};
use super::response_handlers;
use crate::auth::middleware::{authorize, require_auth, ADMINS, EDITORS};
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Permissive unless a single origin is configured
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid CORS origin: {}", e);
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the API router
pub fn create_router(state: ApiState, cors_origin: Option<&str>) -> Router {
    // ========================================================================
    // Public
    // ========================================================================
    let public = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/responses", get(response_handlers::list_responses))
        .route(
            "/api/responses/search",
            get(response_handlers::search_responses),
        )
        .route("/api/responses/{id}", get(response_handlers::get_response))
        .route(
            "/api/responses/{id}/pdf",
            get(response_handlers::export_pdf),
        )
        .route("/api/categories", get(category_handlers::list_categories))
        .route(
            "/api/categories/{id}",
            get(category_handlers::get_category),
        )
        .route(
            "/api/categories/{id}/responses",
            get(category_handlers::list_category_responses),
        )
        .route("/api/auth/register", post(auth_handlers::register))
        .route("/api/auth/login", post(auth_handlers::login));

    // ========================================================================
    // Admin + editor
    // ========================================================================
    let editors = Router::new()
        .route("/api/responses", post(response_handlers::create_response))
        .route(
            "/api/responses/{id}",
            put(response_handlers::update_response),
        )
        .route("/api/categories", post(category_handlers::create_category))
        .route(
            "/api/categories/{id}",
            put(category_handlers::update_category),
        )
        .route_layer(from_fn(|req: Request, next: Next| {
            authorize(EDITORS, req, next)
        }));

    // ========================================================================
    // Admin only
    // ========================================================================
    let admins = Router::new()
        .route(
            "/api/responses/{id}",
            delete(response_handlers::delete_response),
        )
        .route(
            "/api/categories/{id}",
            delete(category_handlers::delete_category),
        )
        .route_layer(from_fn(|req: Request, next: Next| {
            authorize(ADMINS, req, next)
        }));

    // ========================================================================
    // Any authenticated user
    // ========================================================================
    let protected = Router::new()
        .route(
            "/api/auth/profile",
            get(auth_handlers::get_profile).put(auth_handlers::update_profile),
        )
        .route(
            "/api/auth/change-password",
            post(auth_handlers::change_password),
        )
        .merge(editors)
        .merge(admins)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}
