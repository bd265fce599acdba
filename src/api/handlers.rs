//! Shared server state, error rendering and the health endpoint

use crate::categories::CategoryManager;
use crate::error::ServiceError;
use crate::responses::ResponseManager;
use crate::store::ContentStore;
use crate::users::UserManager;
use crate::AuthConfig;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub store: Arc<dyn ContentStore>,
    pub responses: ResponseManager,
    pub categories: CategoryManager,
    pub users: UserManager,
    /// Auth config: None means protected routes are denied
    pub auth_config: Option<AuthConfig>,
}

/// State handle passed to every handler
pub type ApiState = Arc<ServerState>;

impl ServerState {
    pub fn new(store: Arc<dyn ContentStore>, auth_config: Option<AuthConfig>) -> Self {
        Self {
            responses: ResponseManager::new(store.clone()),
            categories: CategoryManager::new(store.clone()),
            users: UserManager::new(store.clone(), auth_config.clone()),
            store,
            auth_config,
        }
    }
}

// ============================================================================
// Health check
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}

/// GET /api/health: 200 `"ok"` when the store answers, 503 `"unhealthy"` otherwise.
pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let store_ok = state.store.health_check().await.unwrap_or(false);

    let (http_status, status) = if store_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: state.store.backend_name().to_string(),
        }),
    )
}

// ============================================================================
// Errors
// ============================================================================

/// Whether 500 bodies carry the underlying error text. Off in production.
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

/// Switch internal-error detail off (production) or on.
pub fn set_production_mode(production: bool) {
    EXPOSE_INTERNAL_ERRORS.store(!production, Ordering::Relaxed);
}

/// Error type for API handlers
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// Duplicate or still-referenced record. Rendered as 400.
    Conflict(String),
}

impl AppError {
    fn render(self, expose_internal: bool) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                let mut body = serde_json::json!({
                    "success": false,
                    "message": "Internal server error",
                });
                if expose_internal {
                    body["error"] = serde_json::Value::String(format!("{:#}", e));
                }
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "message": message
        }));

        (status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.render(EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

/// Malformed or mistyped bodies are validation failures, rendered as 400 JSON.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// `Json` body extractor whose rejection goes through [`AppError`]
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::BadRequest(msg),
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::Unauthorized(msg) => AppError::Unauthorized(msg),
            ServiceError::Forbidden(msg) => AppError::Forbidden(msg),
            ServiceError::Store(e) => AppError::Internal(e),
        }
    }
}
