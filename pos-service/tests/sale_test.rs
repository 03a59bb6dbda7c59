//! Sale recording and reversal integration tests for pos-service.

mod common;

use common::{money, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn recording_a_sale_decrements_stock_and_accretes_the_day() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;
    let product_id = app
        .create_product(&account.token, "Coffee Beans", "100.00", 10)
        .await;

    let response = app
        .post_json(
            "/sales",
            &account.token,
            &json!({
                "products": [{ "product": product_id, "quantity": 3, "price": "100.00" }],
                "total": "300.00",
                "paymentMethod": "cash",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Invalid sale response");
    assert_eq!(body["sale"]["status"], "active");
    assert_eq!(money(&body["sale"], "total"), "300".parse().unwrap());
    assert_eq!(body["sale"]["items"][0]["displayName"], "Coffee Beans");
    assert_eq!(money(&body["dailyCash"], "totalSalesAmount"), "300".parse().unwrap());
    assert_eq!(body["dailyCash"]["totalOperations"], 1);
    assert_eq!(body["dailyCash"]["status"], "open");

    // Stock was decremented
    let response = app
        .get(&format!("/products/{}", product_id), &account.token)
        .await;
    let product: Value = response.json().await.expect("Invalid product response");
    assert_eq!(product["stock"], 7);

    app.cleanup().await;
}

#[tokio::test]
async fn free_text_items_do_not_touch_stock() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .post_json(
            "/sales",
            &account.token,
            &json!({
                "products": [{ "name": "Gift wrapping", "quantity": 2, "price": "50.00" }],
                "total": "100.00",
                "paymentMethod": "card",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Invalid sale response");
    assert_eq!(body["sale"]["items"][0]["displayName"], "Gift wrapping");
    assert!(body["sale"]["items"][0]["productId"].is_null());

    app.cleanup().await;
}

#[tokio::test]
async fn total_mismatch_is_rejected() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;
    let product_id = app
        .create_product(&account.token, "Tea", "200.00", 5)
        .await;

    let response = app
        .post_json(
            "/sales",
            &account.token,
            &json!({
                "products": [{ "product": product_id, "quantity": 2, "price": "200.00" }],
                "total": "999.00",
                "paymentMethod": "cash",
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Nothing was written
    let response = app
        .get(&format!("/products/{}", product_id), &account.token)
        .await;
    let product: Value = response.json().await.expect("Invalid product response");
    assert_eq!(product["stock"], 5);

    let response = app.get("/sales", &account.token).await;
    let sales: Vec<Value> = response.json().await.expect("Invalid sales response");
    assert!(sales.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn insufficient_stock_rolls_back_every_line_item() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;
    let plenty = app
        .create_product(&account.token, "Plenty", "10.00", 100)
        .await;
    let scarce = app
        .create_product(&account.token, "Scarce", "10.00", 1)
        .await;

    let response = app
        .post_json(
            "/sales",
            &account.token,
            &json!({
                "products": [
                    { "product": plenty, "quantity": 5, "price": "10.00" },
                    { "product": scarce, "quantity": 3, "price": "10.00" },
                ],
                "total": "80.00",
                "paymentMethod": "cash",
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // The first line's decrement must have been rolled back with the rest
    let response = app
        .get(&format!("/products/{}", plenty), &account.token)
        .await;
    let product: Value = response.json().await.expect("Invalid product response");
    assert_eq!(product["stock"], 100);

    let response = app.get("/daily-cash/today", &account.token).await;
    let day: Value = response.json().await.expect("Invalid day response");
    assert_eq!(day["totalOperations"], 0);
    assert_eq!(money(&day, "totalSalesAmount"), "0".parse().unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn sale_without_items_fails_validation() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .post_json(
            "/sales",
            &account.token,
            &json!({ "products": [], "total": "0.00", "paymentMethod": "cash" }),
        )
        .await;
    assert_eq!(response.status(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_product_reference_is_rejected() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    let response = app
        .post_json(
            "/sales",
            &account.token,
            &json!({
                "products": [{ "product": uuid::Uuid::new_v4(), "quantity": 1, "price": "10.00" }],
                "total": "10.00",
                "paymentMethod": "cash",
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn reverting_a_sale_restores_stock_and_retracts_the_day() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;
    let product_id = app
        .create_product(&account.token, "Notebook", "250.00", 10)
        .await;

    let response = app
        .post_json(
            "/sales",
            &account.token,
            &json!({
                "products": [{ "product": product_id, "quantity": 4, "price": "250.00" }],
                "total": "1000.00",
                "paymentMethod": "cash",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Invalid sale response");
    let sale_id = body["sale"]["saleId"].as_str().expect("missing id").to_string();

    let response = app
        .post_json(&format!("/sales/{}/revert", sale_id), &account.token, &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Invalid revert response");
    assert_eq!(body["sale"]["status"], "reverted");

    // Stock restored
    let response = app
        .get(&format!("/products/{}", product_id), &account.token)
        .await;
    let product: Value = response.json().await.expect("Invalid product response");
    assert_eq!(product["stock"], 10);

    // Day totals retracted, floored at zero
    let response = app.get("/daily-cash/today", &account.token).await;
    let day: Value = response.json().await.expect("Invalid day response");
    assert_eq!(money(&day, "totalSalesAmount"), "0".parse().unwrap());
    assert_eq!(day["totalOperations"], 0);
    assert!(day["sales"].as_array().expect("sales array").is_empty());

    // A second revert is rejected before any further stock change
    let response = app
        .post_json(&format!("/sales/{}/revert", sale_id), &account.token, &json!({}))
        .await;
    assert_eq!(response.status(), 409);

    let response = app
        .get(&format!("/products/{}", product_id), &account.token)
        .await;
    let product: Value = response.json().await.expect("Invalid product response");
    assert_eq!(product["stock"], 10);

    app.cleanup().await;
}

#[tokio::test]
async fn reverting_a_foreign_sale_is_not_found() {
    let app = TestApp::spawn().await;
    let owner = app.register_account().await;
    let stranger = app.register_account().await;

    let response = app
        .post_json(
            "/sales",
            &owner.token,
            &json!({
                "products": [{ "name": "Mystery", "quantity": 1, "price": "10.00" }],
                "total": "10.00",
                "paymentMethod": "cash",
            }),
        )
        .await;
    let body: Value = response.json().await.expect("Invalid sale response");
    let sale_id = body["sale"]["saleId"].as_str().expect("missing id").to_string();

    let response = app
        .post_json(&format!("/sales/{}/revert", sale_id), &stranger.token, &json!({}))
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn sale_listing_and_detail_work() {
    let app = TestApp::spawn().await;
    let account = app.register_account().await;

    for price in ["10.00", "20.00"] {
        let response = app
            .post_json(
                "/sales",
                &account.token,
                &json!({
                    "products": [{ "name": "Item", "quantity": 1, "price": price }],
                    "total": price,
                    "paymentMethod": "cash",
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = app.get("/sales", &account.token).await;
    assert_eq!(response.status(), 200);
    let sales: Vec<Value> = response.json().await.expect("Invalid sales response");
    assert_eq!(sales.len(), 2);

    let sale_id = sales[0]["saleId"].as_str().expect("missing id");
    let response = app.get(&format!("/sales/{}", sale_id), &account.token).await;
    assert_eq!(response.status(), 200);
    let detail: Value = response.json().await.expect("Invalid detail response");
    assert_eq!(detail["items"].as_array().expect("items").len(), 1);

    app.cleanup().await;
}
