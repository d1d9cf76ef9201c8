use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::router::notification_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(config: AppConfig) -> Router {
    notification_routes(Arc::new(config))
}

fn authed(method: &str, uri: &str, user: &TestUser, config: &TestConfig) -> Request<Body> {
    let token = JwtTestUtils::create_test_token(user, &config.jwt_secret, None);
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let config = TestConfig::default();
    let app = create_test_app(config.to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_is_pinned_to_the_caller() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("recipient_id", format!("eq.{}", user.id)))
        .and(query_param("notification_type", "eq.appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, false),
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(config.to_app_config());
    let response = app
        .oneshot(authed("GET", "/?type=appointment", &user, &config))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_unread_reports_count() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::physiotherapist("physio@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("recipient_id", format!("eq.{}", user.id)))
        .and(query_param("is_read", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(config.to_app_config());
    let response = app.oneshot(authed("GET", "/unread", &user, &config)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_mark_read_updates_notification() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::patient("patient@example.com");
    let notification_id = Uuid::new_v4().to_string();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("id", format!("eq.{}", notification_id)))
        .and(query_param("recipient_id", format!("eq.{}", user.id)))
        .and(body_partial_json(json!({"is_read": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(&notification_id, &user.id, true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(config.to_app_config());
    let uri = format!("/{}/read", notification_id);
    let response = app.oneshot(authed("POST", &uri, &user, &config)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["is_read"], true);
}

#[tokio::test]
async fn test_mark_read_on_foreign_notification_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::patient("patient@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config.to_app_config());
    let uri = format!("/{}/read", Uuid::new_v4());
    let response = app.oneshot(authed("POST", &uri, &user, &config)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_all_read_reports_updated_rows() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::patient("patient@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("recipient_id", format!("eq.{}", user.id)))
        .and(query_param("is_read", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, true),
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, true),
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(config.to_app_config());
    let response = app.oneshot(authed("POST", "/read-all", &user, &config)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["updated"], 3);
}

#[tokio::test]
async fn test_delete_returns_no_content() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::patient("patient@example.com");
    let notification_id = Uuid::new_v4().to_string();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("id", format!("eq.{}", notification_id)))
        .and(query_param("recipient_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(&notification_id, &user.id, false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(config.to_app_config());
    let uri = format!("/{}", notification_id);
    let response = app.oneshot(authed("DELETE", &uri, &user, &config)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_statistics_break_down_by_type() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("recipient_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, false),
            MockSupabaseResponses::notification_response(&Uuid::new_v4().to_string(), &user.id, true)
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config.to_app_config());
    let response = app.oneshot(authed("GET", "/statistics", &user, &config)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["unread"], 1);
    assert_eq!(body["read"], 1);
    assert_eq!(body["recent_week"], 0);
    assert_eq!(body["by_type"]["appointment"], 2);
    assert_eq!(body["by_type"]["system"], 0);
}
