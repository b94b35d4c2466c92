//! 用户查询的 HTTP 处理器

use crate::{
    error::AppError,
    extractors::{AppPath, AppQuery, Pagination},
    middleware::AppState,
    models::user::UserResponse,
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let users = state
        .stores
        .users
        .list(page.limit(), page.offset())
        .await?;

    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(users))
}

/// 获取用户详情
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .stores
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(UserResponse::from(user)))
}
