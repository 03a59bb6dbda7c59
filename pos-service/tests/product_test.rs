//! Product catalog integration tests for pos-service.

mod common;

use common::{money, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn admin_can_create_and_list_products() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .post_json(
            "/products",
            &account.token,
            &json!({
                "name": "Yerba Mate 1kg",
                "category": "grocery",
                "price": "3500.00",
                "cost": "2100.00",
                "stock": 24,
                "barcode": "779-001",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let created: Value = response.json().await.expect("Invalid product response");
    assert_eq!(created["name"], "Yerba Mate 1kg");
    assert_eq!(money(&created, "price"), "3500".parse().unwrap());
    assert_eq!(created["stock"], 24);

    let response = app.get("/products", &account.token).await;
    assert_eq!(response.status(), 200);
    let listed: Vec<Value> = response.json().await.expect("Invalid list response");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["productId"], created["productId"]);

    app.cleanup().await;
}

#[tokio::test]
async fn update_and_delete_product_work() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;
    let product_id = app
        .create_product(&account.token, "Flour 1kg", "900.00", 10)
        .await;

    let response = app
        .put_json(
            &format!("/products/{}", product_id),
            &account.token,
            &json!({ "price": "950.00", "stock": 12 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.expect("Invalid update response");
    assert_eq!(money(&updated, "price"), "950".parse().unwrap());
    assert_eq!(updated["stock"], 12);
    assert_eq!(updated["name"], "Flour 1kg");

    let response = app
        .delete(&format!("/products/{}", product_id), &account.token)
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .get(&format!("/products/{}", product_id), &account.token)
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn employee_cannot_modify_catalog() {
    let app = TestApp::spawn().await;
    let employee = app.register_account_with_role("employee").await;

    let response = app
        .post_json(
            "/products",
            &employee.token,
            &json!({ "name": "Contraband", "price": "1.00", "stock": 1 }),
        )
        .await;
    assert_eq!(response.status(), 403);

    // Listing stays available to employees
    let response = app.get("/products", &employee.token).await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_barcode_is_rejected() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let body = json!({ "name": "Soda", "price": "700.00", "stock": 5, "barcode": "779-XYZ" });
    let response = app.post_json("/products", &account.token, &body).await;
    assert_eq!(response.status(), 201);

    let response = app
        .post_json(
            "/products",
            &account.token,
            &json!({ "name": "Other Soda", "price": "800.00", "stock": 5, "barcode": "779-XYZ" }),
        )
        .await;
    assert_eq!(response.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn products_are_scoped_to_their_owner() {
    let app = TestApp::spawn().await;
    let owner = app.register_account().await;
    let stranger = app.register_account().await;

    let product_id = app
        .create_product(&owner.token, "Private Stock", "100.00", 3)
        .await;

    let response = app.get("/products", &stranger.token).await;
    let listed: Vec<Value> = response.json().await.expect("Invalid list response");
    assert!(listed.is_empty());

    let response = app
        .get(&format!("/products/{}", product_id), &stranger.token)
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
