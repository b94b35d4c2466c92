//! 健康检查处理器
//! 提供 /health 和 /ready 端点

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{config::StorageBackend, db, middleware::AppState};

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// 就绪探针响应
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<HealthCheck>,
}

/// 健康检查项
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 存活探针
/// 快速响应，不检查依赖
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// 就绪探针
/// 检查存储后端；未就绪时返回 503
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = match (&state.db, state.config.storage.backend) {
        (Some(pool), _) => match db::health_check(pool).await {
            db::HealthStatus::Healthy => HealthCheck {
                name: "database".to_string(),
                status: "healthy".to_string(),
                message: None,
            },
            db::HealthStatus::Unhealthy(msg) => HealthCheck {
                name: "database".to_string(),
                status: "unhealthy".to_string(),
                message: Some(msg),
            },
        },
        (None, StorageBackend::Memory) => HealthCheck {
            name: "memory".to_string(),
            status: "healthy".to_string(),
            message: None,
        },
        (None, StorageBackend::Postgres) => HealthCheck {
            name: "database".to_string(),
            status: "unhealthy".to_string(),
            message: Some("database pool not initialised".to_string()),
        },
    };

    let checks = vec![storage];
    let ready = checks.iter().all(|c| c.status == "healthy");
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, checks }))
}
