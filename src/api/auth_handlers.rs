//! Account endpoints under /api/auth

use super::handlers::{ApiState, AppError, JsonBody};
use super::query::{DataEnvelope, MessageEnvelope};
use crate::auth::AuthUser;
use crate::users::{
    AuthSession, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    UserProfile,
};
use axum::{extract::State, http::StatusCode, Json};

/// POST /api/auth/register: new accounts are viewers
pub async fn register(
    State(state): State<ApiState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<AuthSession>>), AppError> {
    let session = state.users.register(req).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(session))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ApiState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<DataEnvelope<AuthSession>>, AppError> {
    let session = state.users.login(req).await?;
    Ok(Json(DataEnvelope::new(session)))
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<DataEnvelope<UserProfile>>, AppError> {
    let profile = state.users.profile(user.user_id).await?;
    Ok(Json(DataEnvelope::new(profile)))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<ApiState>,
    user: AuthUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<DataEnvelope<UserProfile>>, AppError> {
    let profile = state.users.update_profile(user.user_id, req).await?;
    Ok(Json(DataEnvelope::new(profile)))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<ApiState>,
    user: AuthUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    state.users.change_password(user.user_id, req).await?;
    Ok(Json(MessageEnvelope::new("Password updated successfully")))
}
