//! Integration tests for the account endpoints: registration, login,
//! profile and the password flows.

mod common;

use axum::http::{Method, StatusCode};
use common::{expect_json, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_returns_token_and_user() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Amina",
                "email": "amina@example.com",
                "password": "correct-horse-battery"
            })),
            None,
        )
        .await;

    let body = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "amina@example.com");
    assert_eq!(body["user"]["role"], "User");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new().await;
    app.create_user("Amina", "amina@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Somebody Else",
                "email": "amina@example.com",
                "password": "another-password1"
            })),
            None,
        )
        .await;

    let body = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already registered!");
}

#[tokio::test]
async fn login_succeeds_with_correct_credentials() {
    let app = TestApp::new().await;
    app.create_user("Amina", "amina@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "amina@example.com",
                "password": "correct-horse-battery"
            })),
            None,
        )
        .await;

    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::new().await;
    app.create_user("Amina", "amina@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "amina@example.com",
                "password": "not-the-password"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_a_token() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/auth/me", None, Some("garbage"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_current_profile() {
    let app = TestApp::new().await;
    let (account, token) = app
        .create_user("Amina", "amina@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;

    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["user"]["id"], account.id.to_string());
    assert_eq!(body["user"]["name"], "Amina");
}

#[tokio::test]
async fn update_password_requires_current_password() {
    let app = TestApp::new().await;
    let (_, token) = app
        .create_user("Amina", "amina@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/auth/password/update",
            Some(json!({
                "currentPassword": "wrong-password",
                "newPassword": "brand-new-password1"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::PUT,
            "/api/v1/auth/password/update",
            Some(json!({
                "currentPassword": "correct-horse-battery",
                "newPassword": "brand-new-password1"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, new one does
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "amina@example.com", "password": "correct-horse-battery" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "amina@example.com", "password": "brand-new-password1" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn forgot_and_reset_password_flow() {
    let app = TestApp::new().await;
    app.create_user("Amina", "amina@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/password/forgot",
            Some(json!({ "email": "amina@example.com" })),
            None,
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    let reset_token = body["resetToken"].as_str().expect("reset token").to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/auth/password/reset/{reset_token}"),
            Some(json!({ "password": "fresh-new-password1" })),
            None,
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some());

    // The token is single use
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/auth/password/reset/{reset_token}"),
            Some(json!({ "password": "yet-another-password1" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "amina@example.com", "password": "fresh-new-password1" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_with_unknown_token_fails() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/auth/password/reset/deadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
            Some(json!({ "password": "whatever-password1" })),
            None,
        )
        .await;

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn profile_update_changes_name_and_avatar() {
    let app = TestApp::new().await;
    let (_, token) = app
        .create_user("Amina", "amina@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/auth/profile/update",
            Some(json!({
                "name": "Amina B.",
                "avatar": { "url": "https://cdn.example.com/a.jpg", "public_id": "a" }
            })),
            Some(&token),
        )
        .await;

    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["user"]["name"], "Amina B.");
    assert_eq!(body["user"]["avatar"]["url"], "https://cdn.example.com/a.jpg");
}

#[tokio::test]
async fn profile_update_rejects_taken_email() {
    let app = TestApp::new().await;
    app.create_user("First", "first@example.com", "correct-horse-battery")
        .await;
    let (_, token) = app
        .create_user("Second", "second@example.com", "correct-horse-battery")
        .await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/auth/profile/update",
            Some(json!({ "email": "first@example.com" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
