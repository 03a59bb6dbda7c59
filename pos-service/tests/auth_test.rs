//! Account and token tests for pos-service.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_and_profile_work() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    // Login with the same credentials
    let response = app
        .client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({ "email": account.email, "password": "sup3r-secret-pw" }))
        .send()
        .await
        .expect("Failed to login");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Invalid login response");
    let token = body["accessToken"].as_str().expect("missing token");
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["email"], account.email.as_str());
    assert!(body["user"]["passwordHash"].is_null());

    // Fetch the profile with the fresh token
    let response = app.get("/users/me", token).await;
    assert_eq!(response.status(), 200);
    let profile: Value = response.json().await.expect("Invalid profile response");
    assert_eq!(profile["userId"], account.user_id.to_string());
    assert_eq!(profile["role"], "admin");

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .client
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "name": "Copycat",
            "email": account.email,
            "password": "another-secret",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({ "email": account.email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn short_password_fails_validation() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "name": "Weak",
            "email": "weak@example.com",
            "password": "short",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/users/me", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app.get("/daily-cash/today", "not-a-real-token").await;
    assert_eq!(response.status(), 401);

    app.cleanup().await;
}
