//! 作品集的 HTTP 处理器
//! 读取公开，修改需要认证

use crate::{
    auth::AuthContext,
    error::AppError,
    extractors::{AppPath, AppQuery, Pagination, ValidatedJson},
    middleware::AppState,
    models::portfolio::PortfolioRequest,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_portfolio(
    State(state): State<Arc<AppState>>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let items = state
        .stores
        .portfolio
        .list(page.limit(), page.offset())
        .await?;

    Ok(Json(items))
}

pub async fn get_portfolio_item(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .stores
        .portfolio
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Portfolio item"))?;

    Ok(Json(item))
}

pub async fn create_portfolio_item(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<PortfolioRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.stores.portfolio.create(&req).await?;

    tracing::info!(
        item_id = %item.id,
        team_id = %item.team_id,
        created_by = %auth_context.user_id,
        "Portfolio item created"
    );

    Ok((StatusCode::CREATED, Json(item)))
}

/// 整体替换
pub async fn update_portfolio_item(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(req): ValidatedJson<PortfolioRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .stores
        .portfolio
        .update(id, &req)
        .await?
        .ok_or(AppError::NotFound("Portfolio item"))?;

    Ok(Json(item))
}

pub async fn delete_portfolio_item(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.stores.portfolio.delete(id).await? {
        return Err(AppError::NotFound("Portfolio item"));
    }

    Ok(StatusCode::NO_CONTENT)
}
