//! 分类的 HTTP 处理器

use crate::{
    error::AppError,
    extractors::{AppPath, ValidatedJson},
    middleware::AppState,
    models::category::CategoryRequest,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.stores.categories.list().await?))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .stores
        .categories
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    Ok(Json(category))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = state.stores.categories.create(&req).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .stores
        .categories
        .update(id, &req)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.stores.categories.delete(id).await? {
        return Err(AppError::NotFound("Category"));
    }

    Ok(StatusCode::NO_CONTENT)
}
