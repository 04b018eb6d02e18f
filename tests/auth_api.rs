use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::json;

use tokengate_server::auth::handlers::{login, logout, me, refresh, register};
use tokengate_server::auth::MemorySessionStore;
use tokengate_server::db::MemoryUserRepository;
use tokengate_server::{AppState, Settings};

fn test_state() -> web::Data<AppState> {
    let config = Settings::new_for_test().expect("Failed to load test config");
    web::Data::new(AppState::with_backends(
        config,
        Arc::new(MemoryUserRepository::new()),
        Arc::new(MemorySessionStore::new()),
    ))
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .route("/auth/register", web::post().to(register))
                .route("/auth/login", web::post().to(login))
                .route("/auth/refresh", web::post().to(refresh))
                .route("/auth/logout", web::post().to(logout))
                .route("/users/me", web::get().to(me)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_register_and_login() {
    let state = test_state();
    let app = test_app!(state);

    let register_response = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "name": "alice",
            "password": "secret1"
        }))
        .send_request(&app)
        .await;

    assert_eq!(register_response.status(), 201);
    let register_body: serde_json::Value = test::read_body_json(register_response).await;
    assert!(register_body.get("access_token").is_some());
    assert!(register_body.get("refresh_token").is_some());

    let login_response = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({
            "name": "alice",
            "password": "secret1"
        }))
        .send_request(&app)
        .await;

    assert_eq!(login_response.status(), 200);
    let login_body: serde_json::Value = test::read_body_json(login_response).await;
    assert_ne!(
        login_body["refresh_token"].as_str().unwrap(),
        register_body["refresh_token"].as_str().unwrap()
    );
}

#[actix_web::test]
async fn test_wrong_password_is_unauthorized() {
    let state = test_state();
    let app = test_app!(state);

    test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"name": "alice", "password": "secret1"}))
        .send_request(&app)
        .await;

    let response = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"name": "alice", "password": "wrong1"}))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 401);
}

#[actix_web::test]
async fn test_unknown_user_is_not_found() {
    let state = test_state();
    let app = test_app!(state);

    let response = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"name": "nobody", "password": "secret1"}))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 404);
}

#[actix_web::test]
async fn test_invalid_registration_is_bad_request() {
    let state = test_state();
    let app = test_app!(state);

    // Password below the 6 character minimum.
    let response = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"name": "alice", "password": "short"}))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn test_duplicate_registration_conflicts() {
    let state = test_state();
    let app = test_app!(state);

    test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"name": "alice", "password": "secret1"}))
        .send_request(&app)
        .await;

    let response = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"name": "alice", "password": "secret2"}))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 409);
}

#[actix_web::test]
async fn test_refresh_and_logout_flow() {
    let state = test_state();
    let app = test_app!(state);

    let register_response = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"name": "alice", "password": "secret1"}))
        .send_request(&app)
        .await;
    let body: serde_json::Value = test::read_body_json(register_response).await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    // Refresh yields a new access token while the refresh token stays valid.
    let refresh_response = test::TestRequest::post()
        .uri("/auth/refresh")
        .set_json(json!({"refresh_token": refresh_token}))
        .send_request(&app)
        .await;
    assert_eq!(refresh_response.status(), 200);
    let refresh_body: serde_json::Value = test::read_body_json(refresh_response).await;
    assert!(refresh_body.get("access_token").is_some());

    // Logout revokes it.
    let logout_response = test::TestRequest::post()
        .uri("/auth/logout")
        .set_json(json!({"refresh_token": refresh_token}))
        .send_request(&app)
        .await;
    assert_eq!(logout_response.status(), 204);

    // Refreshing with the revoked token is forbidden.
    let response = test::TestRequest::post()
        .uri("/auth/refresh")
        .set_json(json!({"refresh_token": refresh_token}))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 403);
}

#[actix_web::test]
async fn test_me_requires_bearer_token() {
    let state = test_state();
    let app = test_app!(state);

    let register_response = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"name": "alice", "password": "secret1"}))
        .send_request(&app)
        .await;
    let body: serde_json::Value = test::read_body_json(register_response).await;
    let access_token = body["access_token"].as_str().unwrap();

    let response = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(("Authorization", format!("Bearer {}", access_token)))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let me_body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(me_body["name"], "alice");
    assert!(me_body.get("password_hash").is_none());

    // Without a token the request is unauthorized.
    let response = test::TestRequest::get()
        .uri("/users/me")
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 401);

    // With a garbage token it is forbidden.
    let response = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 403);
}
