//! Response API handlers

use super::handlers::{ApiState, AppError, JsonBody};
use super::query::{
    CollectionEnvelope, DataEnvelope, ListEnvelope, ListQuery, MessageEnvelope, Pagination,
    SearchQuery,
};
use crate::auth::AuthUser;
use crate::responses::{
    CreateResponseRequest, ListParams, PdfExport, ResponseDetail, ResponseSummary,
    UpdateResponseRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// GET /api/responses
pub async fn list_responses(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListEnvelope<ResponseSummary>>, AppError> {
    let (page, limit) = (query.page(), query.limit());
    let params = ListParams {
        sort: query.sort(),
        skip: query.skip(),
        limit,
        category: query.category,
        tag: query.tag,
    };

    let (items, total) = state.responses.list(params).await?;
    Ok(Json(ListEnvelope::new(
        items,
        Pagination::new(page, limit, total),
    )))
}

/// GET /api/responses/search?q=
pub async fn search_responses(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CollectionEnvelope<ResponseSummary>>, AppError> {
    let hits = state.responses.search(query.q.as_deref()).await?;
    Ok(Json(CollectionEnvelope::new(hits)))
}

/// GET /api/responses/{id}
pub async fn get_response(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<DataEnvelope<ResponseDetail>>, AppError> {
    let response = state.responses.get(&id).await?;
    Ok(Json(DataEnvelope::new(response)))
}

/// GET /api/responses/{id}/pdf: placeholder, nothing is rendered
pub async fn export_pdf(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MessageEnvelope<PdfExport>>, AppError> {
    let export = state.responses.export_pdf(&id).await?;
    Ok(Json(MessageEnvelope::with_data(
        "PDF generation would happen here",
        export,
    )))
}

/// POST /api/responses: the author is always the caller
pub async fn create_response(
    State(state): State<ApiState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateResponseRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<ResponseDetail>>), AppError> {
    let created = state.responses.create(req, &user.name).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(created))))
}

/// PUT /api/responses/{id}
pub async fn update_response(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateResponseRequest>,
) -> Result<Json<DataEnvelope<ResponseDetail>>, AppError> {
    let updated = state.responses.update(&id, req).await?;
    Ok(Json(DataEnvelope::new(updated)))
}

/// DELETE /api/responses/{id}
pub async fn delete_response(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MessageEnvelope>, AppError> {
    state.responses.delete(&id).await?;
    Ok(Json(MessageEnvelope::new("Response deleted successfully")))
}
