//! Client and supplier directory integration tests for pos-service.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn client_crud_works() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .post_json(
            "/clients",
            &account.token,
            &json!({ "name": "Maria Gomez", "phone": "555-1234" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Invalid client response");
    let client_id = created["clientId"].as_str().expect("missing id").to_string();

    let response = app
        .put_json(
            &format!("/clients/{}", client_id),
            &account.token,
            &json!({ "email": "maria@example.com" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.expect("Invalid update response");
    assert_eq!(updated["email"], "maria@example.com");
    assert_eq!(updated["name"], "Maria Gomez");

    let response = app.get("/clients", &account.token).await;
    let listed: Vec<Value> = response.json().await.expect("Invalid list response");
    assert_eq!(listed.len(), 1);

    let response = app
        .delete(&format!("/clients/{}", client_id), &account.token)
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get("/clients", &account.token).await;
    let listed: Vec<Value> = response.json().await.expect("Invalid list response");
    assert!(listed.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn supplier_crud_works() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .post_json(
            "/suppliers",
            &account.token,
            &json!({ "name": "Distribuidora Norte", "contactName": "Pablo", "phone": "555-9876" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Invalid supplier response");
    let supplier_id = created["supplierId"]
        .as_str()
        .expect("missing id")
        .to_string();
    assert_eq!(created["contactName"], "Pablo");

    let response = app
        .put_json(
            &format!("/suppliers/{}", supplier_id),
            &account.token,
            &json!({ "notes": "Delivers on Tuesdays" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.expect("Invalid update response");
    assert_eq!(updated["notes"], "Delivers on Tuesdays");

    let response = app
        .delete(&format!("/suppliers/{}", supplier_id), &account.token)
        .await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn directory_records_are_scoped_to_their_owner() {
    let app = TestApp::spawn().await;
    let owner = app.register_account().await;
    let stranger = app.register_account().await;

    let response = app
        .post_json("/clients", &owner.token, &json!({ "name": "Private Client" }))
        .await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Invalid client response");
    let client_id = created["clientId"].as_str().expect("missing id").to_string();

    let response = app.get("/clients", &stranger.token).await;
    let listed: Vec<Value> = response.json().await.expect("Invalid list response");
    assert!(listed.is_empty());

    // A stranger cannot update or delete someone else's record
    let response = app
        .put_json(
            &format!("/clients/{}", client_id),
            &stranger.token,
            &json!({ "name": "Hijacked" }),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .delete(&format!("/clients/{}", client_id), &stranger.token)
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
