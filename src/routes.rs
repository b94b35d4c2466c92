//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

use crate::{auth::bearer_auth_middleware, handlers, middleware::AppState};

/// 请求体上限（作品集描述最长）
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查 + 只读目录）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/portfolio", get(handlers::portfolio::list_portfolio))
        .route("/portfolio/{id}", get(handlers::portfolio::get_portfolio_item))
        .route("/categories", get(handlers::category::list_categories))
        .route("/categories/{id}", get(handlers::category::get_category));

    // 认证路由（无需认证）
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh-token", post(handlers::auth::refresh_token));

    // 需要 Bearer 认证的路由
    let authenticated_routes = Router::new()
        .route("/me", get(handlers::auth::me))
        // 用户
        .route("/users", get(handlers::user::list_users))
        .route("/users/{id}", get(handlers::user::get_user))
        // 团队
        .route(
            "/teams",
            get(handlers::team::list_teams).post(handlers::team::create_team),
        )
        .route(
            "/teams/{id}",
            get(handlers::team::get_team)
                .put(handlers::team::update_team)
                .delete(handlers::team::delete_team),
        )
        .route("/teams/{id}/members", post(handlers::team::add_member))
        .route(
            "/teams/{id}/members/{user_id}",
            axum::routing::delete(handlers::team::remove_member),
        )
        // 作品集（写操作）
        .route("/portfolio", post(handlers::portfolio::create_portfolio_item))
        .route(
            "/portfolio/{id}",
            axum::routing::put(handlers::portfolio::update_portfolio_item)
                .delete(handlers::portfolio::delete_portfolio_item),
        )
        // 分类（写操作）
        .route("/categories", post(handlers::category::create_category))
        .route(
            "/categories/{id}",
            axum::routing::put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.issuer.clone(),
            bearer_auth_middleware,
        ));

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(
                    crate::middleware::request_tracking_middleware,
                ))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(CompressionLayer::new()),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
