//! Category API handlers

use super::handlers::{ApiState, AppError, JsonBody};
use super::query::{
    CategoryListQuery, CollectionEnvelope, DataEnvelope, ListEnvelope, ListQuery,
    MessageEnvelope, Pagination,
};
use crate::categories::{
    Category, CategoryListing, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::responses::ResponseSummary;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// GET /api/categories: sorted by name; `?counts=true` adds response counts
pub async fn list_categories(
    State(state): State<ApiState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<CollectionEnvelope<CategoryListing>>, AppError> {
    let categories = state.categories.list(query.counts).await?;
    Ok(Json(CollectionEnvelope::new(categories)))
}

/// GET /api/categories/{id}: id or slug
pub async fn get_category(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<Json<DataEnvelope<Category>>, AppError> {
    let category = state.categories.get(&key).await?;
    Ok(Json(DataEnvelope::new(category)))
}

/// GET /api/categories/{id}/responses
pub async fn list_category_responses(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListEnvelope<ResponseSummary>>, AppError> {
    let (page, limit) = (query.page(), query.limit());
    let result = state
        .categories
        .responses(&key, query.sort(), query.skip(), limit)
        .await?;

    let mut envelope = ListEnvelope::new(result.responses, Pagination::new(page, limit, result.total));
    envelope.category = Some(result.category);
    Ok(Json(envelope))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<ApiState>,
    JsonBody(req): JsonBody<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<Category>>), AppError> {
    let category = state.categories.create(req).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(category))))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    JsonBody(req): JsonBody<UpdateCategoryRequest>,
) -> Result<Json<DataEnvelope<Category>>, AppError> {
    let category = state.categories.update(&key, req).await?;
    Ok(Json(DataEnvelope::new(category)))
}

/// DELETE /api/categories/{id}: refused while referenced
pub async fn delete_category(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<Json<MessageEnvelope>, AppError> {
    state.categories.delete(&key).await?;
    Ok(Json(MessageEnvelope::new("Category deleted successfully")))
}
