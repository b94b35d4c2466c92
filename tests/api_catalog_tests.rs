//! 作品集与分类 API 集成测试

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

mod common;
use common::TestApp;

fn portfolio_body(team_id: &str) -> Value {
    json!({
        "name": "Recycling bot",
        "description": "Finds the nearest drop-off point",
        "image": "portfolio/recycling-bot.png",
        "link": "https://example.com/recycling-bot",
        "demo_video": "https://videos.example.com/recycling-bot",
        "team_id": team_id,
    })
}

async fn create_team(app: &TestApp, token: &str) -> String {
    let (status, team) = app.post("/teams", Some(token), json!({ "name": "Core" })).await;
    assert_eq!(status, StatusCode::CREATED);
    team["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_portfolio_crud() {
    let app = TestApp::new();
    let (_, token, _) = app.signup("alice").await;
    let team_id = create_team(&app, &token).await;

    let (status, item) = app
        .post("/portfolio", Some(&token), portfolio_body(&team_id))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["team_id"], team_id.as_str());
    let item_id = item["id"].as_str().unwrap().to_string();

    // 读取公开
    let (status, items) = app.get("/portfolio", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items.as_array().unwrap().len(), 1);

    let (status, item) = app.get(&format!("/portfolio/{}", item_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["name"], "Recycling bot");

    let mut replacement = portfolio_body(&team_id);
    replacement["name"] = json!("Recycling bot v2");
    let (status, item) = app
        .put(&format!("/portfolio/{}", item_id), Some(&token), replacement)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["name"], "Recycling bot v2");

    let (status, _) = app
        .delete(&format!("/portfolio/{}", item_id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/portfolio/{}", item_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_portfolio_mutations_require_auth() {
    let app = TestApp::new();
    let (_, token, _) = app.signup("alice").await;
    let team_id = create_team(&app, &token).await;

    let (status, _) = app.post("/portfolio", None, portfolio_body(&team_id)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let id = Uuid::new_v4();
    let (status, _) = app
        .put(&format!("/portfolio/{}", id), None, portfolio_body(&team_id))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.delete(&format!("/portfolio/{}", id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_portfolio_validation() {
    let app = TestApp::new();
    let (_, token, _) = app.signup("alice").await;
    let team_id = create_team(&app, &token).await;

    let mut bad_link = portfolio_body(&team_id);
    bad_link["link"] = json!("ftp://example.com");
    let (status, body) = app.post("/portfolio", Some(&token), bad_link).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["fields"]["link"][0], "Invalid link.");

    let (status, body) = app
        .post(
            "/portfolio",
            Some(&token),
            portfolio_body(&Uuid::new_v4().to_string()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["fields"]["team_id"][0], "Team does not exist.");
}

#[tokio::test]
async fn test_team_delete_removes_portfolio() {
    let app = TestApp::new();
    let (_, token, _) = app.signup("alice").await;
    let team_id = create_team(&app, &token).await;

    app.post("/portfolio", Some(&token), portfolio_body(&team_id)).await;

    let (status, _) = app.delete(&format!("/teams/{}", team_id), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, items) = app.get("/portfolio", None).await;
    assert!(items.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_category_crud() {
    let app = TestApp::new();
    let (_, token, _) = app.signup("alice").await;

    let (status, _) = app
        .post("/categories", None, json!({ "name": "Energy" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, category) = app
        .post(
            "/categories",
            Some(&token),
            json!({ "name": "Energy", "description": "Solar and wind" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = category["id"].as_str().unwrap().to_string();

    let (status, categories) = app.get("/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories[0]["name"], "Energy");

    let (status, category) = app
        .put(
            &format!("/categories/{}", id),
            Some(&token),
            json!({ "name": "Renewable energy" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(category["name"], "Renewable energy");
    assert!(category["description"].is_null());

    let (status, _) = app.delete(&format!("/categories/{}", id), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/categories/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_portfolio_id_is_400() {
    let app = TestApp::new();

    let (status, body) = app.get("/portfolio/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["fields"]["path"].is_array());
}
