//! 认证 API 集成测试

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use eco_marketplace::auth::TokenIssuer;
use serde_json::json;
use uuid::Uuid;

mod common;
use common::{TestApp, STRONG_PASSWORD};

#[tokio::test]
async fn test_register_login_refresh_scenario() {
    let app = TestApp::new();

    let (status, user) = app.register("alice", "alice@x.com", "Str0ng!Pwd").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@x.com");
    assert_eq!(user["role"], "not_assigned");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let (status, login) = app.login("alice", "Str0ng!Pwd").await;
    assert_eq!(status, StatusCode::OK);
    assert!(login["access"].is_string());
    assert!(login["refresh"].is_string());
    assert_eq!(login["user"]["id"], user["id"]);

    let refresh = login["refresh"].as_str().unwrap();

    let (status, body) = app
        .post("/refresh-token", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());
    assert!(body.get("refresh").is_none());

    let (status, body) = app
        .post("/refresh-token", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "token_revoked");
}

#[tokio::test]
async fn test_refreshed_access_token_works_on_me() {
    let app = TestApp::new();
    let (user_id, _, refresh) = app.signup("alice").await;

    let (_, body) = app
        .post("/refresh-token", None, json!({ "refresh": refresh }))
        .await;
    let access = body["access"].as_str().unwrap();

    let (status, me) = app.get("/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id);
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn test_register_duplicate_username_and_email() {
    let app = TestApp::new();
    app.register("alice", "alice@x.com", STRONG_PASSWORD).await;

    let (status, body) = app.register("alice", "other@x.com", STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "duplicate_username");
    assert_eq!(body["error"]["message"], "This username is already taken.");

    let (status, body) = app.register("bob", "alice@x.com", STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "duplicate_email");
}

#[tokio::test]
async fn test_register_weak_password() {
    let app = TestApp::new();

    let (status, body) = app.register("alice", "alice@x.com", "password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "weak_password");
    assert_eq!(
        body["error"]["message"],
        "Password must contain at least one uppercase letter."
    );
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::new();

    let (status, body) = app.register("alice", "not-an-email", STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");
    assert!(body["error"]["fields"]["email"].is_array());

    // 缺少字段
    let (status, body) = app.post("/register", None, json!({ "username": "alice" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");
}

#[tokio::test]
async fn test_register_with_profile() {
    let app = TestApp::new();

    let (status, user) = app
        .post(
            "/register",
            None,
            json!({
                "username": "carol",
                "email": "carol@x.com",
                "password": STRONG_PASSWORD,
                "first_name": "Carol",
                "last_name": "Doe",
                "phone_number": "+1 555 0100",
                "telegram": "@carol",
                "role": "developer",
                "skills": ["rust", "sql"],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "developer");
    assert_eq!(user["skills"], json!(["rust", "sql"]));
    assert_eq!(user["first_name"], "Carol");
}

#[tokio::test]
async fn test_login_errors_are_indistinguishable() {
    let app = TestApp::new();
    app.register("u", "u@x.com", STRONG_PASSWORD).await;

    let (status_a, body_a) = app.login("u", "wrongpass").await;
    let (status_b, body_b) = app.login("nonexistent", "x").await;

    assert_eq!(status_a, StatusCode::BAD_REQUEST);
    assert_eq!(status_a, status_b);
    assert_eq!(body_a["error"]["kind"], "invalid_credentials");
    assert_eq!(body_a["error"]["kind"], body_b["error"]["kind"]);
    assert_eq!(body_a["error"]["message"], body_b["error"]["message"]);
    assert_eq!(body_a["error"]["message"], "Incorrect credentials.");
}

#[tokio::test]
async fn test_login_disabled_account() {
    let app = TestApp::new();
    let (status, user) = app.register("alice", "alice@x.com", STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::CREATED);

    let user_id = Uuid::parse_str(user["id"].as_str().unwrap()).unwrap();
    app.state.stores.users.set_active(user_id, false).await.unwrap();

    let (status, body) = app.login("alice", STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "account_disabled");
}

#[tokio::test]
async fn test_login_empty_fields() {
    let app = TestApp::new();

    let (status, body) = app.login("", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");
    assert!(body["error"]["fields"]["username"].is_array());
    assert!(body["error"]["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_refresh_with_garbage_token() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/refresh-token", None, json!({ "refresh": "not.a.jwt" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "token_invalid");
}

#[tokio::test]
async fn test_refresh_with_access_token_rejected() {
    let app = TestApp::new();
    let (_, access, _) = app.signup("alice").await;

    let (status, body) = app
        .post("/refresh-token", None, json!({ "refresh": access }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "token_invalid");
}

#[tokio::test]
async fn test_refresh_unknown_token_not_found() {
    let app = TestApp::new();
    let (user_id, _, _) = app.signup("alice").await;

    // 签名正确但从未登记的 refresh 令牌
    let issuer = TokenIssuer::from_config(&app.state.config).unwrap();
    let tokens = issuer
        .issue(&Uuid::parse_str(&user_id).unwrap(), "alice")
        .unwrap();

    let (status, body) = app
        .post("/refresh-token", None, json!({ "refresh": tokens.refresh }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "token_not_found");
}

#[tokio::test]
async fn test_me_requires_bearer() {
    let app = TestApp::new();

    let (status, body) = app.get("/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "unauthorized");

    let (status, body) = app.get("/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "token_invalid");
}

#[tokio::test]
async fn test_me_with_expired_access_token() {
    let app = TestApp::new();
    let (user_id, _, _) = app.signup("alice").await;

    let issuer = TokenIssuer::from_config(&app.state.config).unwrap();
    let expired = issuer
        .issue_access_at(
            &Uuid::parse_str(&user_id).unwrap(),
            "alice",
            Utc::now() - Duration::hours(1),
        )
        .unwrap();

    let (status, body) = app.get("/me", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "token_expired");
}

#[tokio::test]
async fn test_me_rejects_refresh_token_as_bearer() {
    let app = TestApp::new();
    let (_, _, refresh) = app.signup("alice").await;

    let (status, _) = app.get("/me", Some(&refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_error_response_shape() {
    let app = TestApp::new();

    let (_, body) = app.login("nobody", "x").await;
    let error = &body["error"];
    assert_eq!(error["code"], 400);
    assert!(error["request_id"].is_string());
    assert!(error.get("fields").is_none());
}

#[tokio::test]
async fn test_register_phone_number_too_long() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/register",
            None,
            json!({
                "username": "dave",
                "email": "dave@x.com",
                "password": STRONG_PASSWORD,
                "phone_number": "+998 90 123-4567",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["phone_number"].is_array());
}
