//! HTTP 中间件与应用状态
//! 请求追踪（trace_id / request_id、日志、指标）

use crate::{
    auth::{PasswordHasher, TokenIssuer, TokenRegistry},
    config::AppConfig,
    error::{AppError, REQUEST_ID},
    repository::Stores,
    services::AuthService,
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 由 `Arc<AppState>` 在所有请求间共享；内部字段均为只读或自带同步。
pub struct AppState {
    pub config: AppConfig,
    pub stores: Stores,
    pub issuer: Arc<TokenIssuer>,
    pub registry: TokenRegistry,
    pub auth_service: Arc<AuthService>,
    /// 仅 postgres 后端存在，用于就绪探针
    pub db: Option<sqlx::PgPool>,
    pub started_at: Instant,
}

impl AppState {
    /// 根据配置与存储构建完整的应用状态
    pub fn build(
        config: AppConfig,
        stores: Stores,
        db: Option<sqlx::PgPool>,
    ) -> Result<Self, AppError> {
        let issuer = Arc::new(TokenIssuer::from_config(&config)?);
        let hasher = PasswordHasher::from_config(&config.security)?;
        let registry = TokenRegistry::new(stores.tokens.clone(), issuer.clone());

        let auth_service = Arc::new(AuthService::new(
            stores.users.clone(),
            registry.clone(),
            issuer.clone(),
            hasher,
        ));

        Ok(Self {
            config,
            stores,
            issuer,
            registry,
            auth_service,
            db,
            started_at: Instant::now(),
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    // 只记录路径，查询串可能带敏感参数
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();

        // 错误响应体中的 request_id 与响应头保持一致
        let mut response = REQUEST_ID.scope(request_id.clone(), next.run(req)).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签使用有限集合
        let method_label = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_label = match status {
            200..=299 => "2xx",
            400..=499 => "4xx",
            500..=599 => "5xx",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_label, "status" => status_label)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
