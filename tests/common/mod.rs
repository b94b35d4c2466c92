//! 测试公共模块
//! 提供测试辅助函数和测试工具；HTTP 集成测试使用内存存储，
//! Postgres 存储测试仅在设置了 `ECO_DATABASE__URL` 时运行

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use eco_marketplace::{
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig, StorageBackend,
        StorageConfig,
    },
    db,
    middleware::AppState,
    repository::Stores,
    routes,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

pub const STRONG_PASSWORD: &str = "Str0ng!Pwd";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new("test-secret-key-for-testing-only-min-32-chars".to_string()),
            access_token_exp_secs: 300,   // 5分钟用于测试
            refresh_token_exp_secs: 3600, // 1小时用于测试
            // 低成本参数，加快测试
            password_hash_memory_kib: 1024,
            password_hash_iterations: 1,
            password_hash_parallelism: 1,
            password_hash_timeout_secs: 10,
        },
    }
}

/// 连接测试数据库并清空数据；未设置 `ECO_DATABASE__URL` 时返回 None
pub async fn setup_test_db() -> Option<PgPool> {
    let url = match std::env::var("ECO_DATABASE__URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("ECO_DATABASE__URL not set, skipping Postgres test");
            return None;
        }
    };

    let mut config = create_test_config().database;
    config.url = Some(Secret::new(url));

    let pool = db::create_pool(&config)
        .await
        .expect("Failed to create test database pool");

    // 运行迁移
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE TABLE refresh_tokens, team_members, portfolio_items, teams, categories, users CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to truncate test tables");

    Some(pool)
}

/// 创建测试应用状态（内存存储）
pub fn create_test_app_state() -> Arc<AppState> {
    let config = create_test_config();
    Arc::new(
        AppState::build(config, Stores::memory(), None).expect("Failed to build test app state"),
    )
}

/// 测试应用：路由 + 共享状态
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        let state = create_test_app_state();
        let router = routes::create_router(state.clone());
        Self { router, state }
    }

    /// 发送请求并解析 JSON 响应（空响应体返回 `Value::Null`）
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// 注册用户，返回响应体
    pub async fn register(&self, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/register",
            None,
            json!({
                "username": username,
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/login",
            None,
            json!({ "username": username, "password": password }),
        )
        .await
    }

    /// 注册并登录，返回 (user_id, access, refresh)
    pub async fn signup(&self, username: &str) -> (String, String, String) {
        let email = format!("{}@example.com", username);
        let (status, _) = self.register(username, &email, STRONG_PASSWORD).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(username, STRONG_PASSWORD).await;
        assert_eq!(status, StatusCode::OK);

        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["access"].as_str().unwrap().to_string(),
            body["refresh"].as_str().unwrap().to_string(),
        )
    }
}
