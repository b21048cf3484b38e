//! Checkout and order history through the HTTP API.

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use cartwheel_core::{ItemId, Price};
use cartwheel_integration_tests::TestApp;

/// Alice's cart: A(10.00) x5 and B(5.00) x1. Returns (token, cart id, A, B).
async fn filled_cart(app: &TestApp) -> (String, i64, i64, i64) {
    let token = app.signup("alice").await;
    let a = app.create_item("A", "10.00").await;
    let b = app.create_item("B", "5.00").await;

    let mut cart = Value::Null;
    for (item_id, quantity) in [(a, 2), (a, 3), (b, 1)] {
        cart = app
            .request(
                Method::POST,
                "/carts",
                Some(&token),
                Some(json!({ "item_id": item_id, "quantity": quantity })),
            )
            .await
            .body;
    }
    let cart_id = cart["id"].as_i64().expect("cart has no id");
    (token, cart_id, a, b)
}

async fn checkout(app: &TestApp, token: &str, cart_id: i64) -> (StatusCode, Value) {
    let resp = app
        .request(
            Method::POST,
            "/orders",
            Some(token),
            Some(json!({ "cart_id": cart_id })),
        )
        .await;
    (resp.status, resp.body)
}

fn order_line(order: &Value, item_id: i64) -> &Value {
    order["order_items"]
        .as_array()
        .expect("order_items is not an array")
        .iter()
        .find(|line| line["item_id"] == item_id)
        .expect("no line for item")
}

#[tokio::test]
async fn test_checkout_creates_order() {
    let app = TestApp::new();
    let (token, cart_id, a, b) = filled_cart(&app).await;

    let (status, order) = checkout(&app, &token, cart_id).await;
    assert_eq!(status, StatusCode::CREATED, "{order:?}");
    assert_eq!(order["status"], "completed");
    assert_eq!(order["cart_id"], cart_id);
    assert_eq!(order["total_price"], "55.00");
    assert_eq!(order_line(&order, a)["quantity"], 5);
    assert_eq!(order_line(&order, a)["price"], "10.00");
    assert_eq!(order_line(&order, b)["price"], "5.00");
    assert_eq!(order_line(&order, b)["item"]["name"], "B");

    let carts = app.request(Method::GET, "/carts", Some(&token), None).await;
    assert_eq!(carts.body[0]["status"], "ordered");

    let orders = app.request(Method::GET, "/orders", Some(&token), None).await;
    assert_eq!(orders.status, StatusCode::OK);
    assert_eq!(orders.body.as_array().map(Vec::len), Some(1));
    assert_eq!(orders.body[0]["id"], order["id"]);
}

#[tokio::test]
async fn test_second_checkout_is_not_found() {
    let app = TestApp::new();
    let (token, cart_id, _, _) = filled_cart(&app).await;

    let (status, _) = checkout(&app, &token, cart_id).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = checkout(&app, &token, cart_id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Cart not found or already ordered" }));
}

#[tokio::test]
async fn test_cart_of_another_user_is_not_found() {
    let app = TestApp::new();
    let (_, cart_id, _, _) = filled_cart(&app).await;
    let mallory = app.signup("mallory").await;

    let (status, _) = checkout(&app, &mallory, cart_id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = checkout(&app, &mallory, 9_999).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_cart_is_bad_request() {
    let app = TestApp::new();
    let token = app.signup("alice").await;

    // An empty active cart can only come from storage directly.
    let cart_id = {
        use cartwheel_server::db::Store;

        let user_id = app
            .request(Method::GET, "/users", None, None)
            .await
            .body[0]["id"]
            .as_i64()
            .expect("no user id");
        let mut tx = app.store.begin().await.expect("begin failed");
        let cart = tx
            .insert_active_cart(user_id.into())
            .await
            .expect("insert failed");
        tx.commit().await.expect("commit failed");
        cart.id.as_i64()
    };

    let (status, body) = checkout(&app, &token, cart_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Cart is empty" }));

    let orders = app.request(Method::GET, "/orders", Some(&token), None).await;
    assert_eq!(orders.body, json!([]));
}

#[tokio::test]
async fn test_price_change_after_checkout_keeps_order() {
    let app = TestApp::new();
    let (token, cart_id, a, _) = filled_cart(&app).await;
    let (_, order) = checkout(&app, &token, cart_id).await;

    app.store
        .set_item_price(
            ItemId::new(a),
            Price::new(Decimal::new(2500, 2)).expect("valid price"),
        )
        .await
        .expect("reprice failed");

    let orders = app.request(Method::GET, "/orders", Some(&token), None).await;
    let stored = &orders.body[0];
    assert_eq!(stored["total_price"], order["total_price"]);
    assert_eq!(order_line(stored, a)["price"], "10.00");
    assert_eq!(order_line(stored, a)["item"]["price"], "25.00");
}

#[tokio::test]
async fn test_add_after_checkout_starts_new_cart() {
    let app = TestApp::new();
    let (token, cart_id, a, _) = filled_cart(&app).await;
    checkout(&app, &token, cart_id).await;

    let fresh = app
        .request(Method::POST, "/carts", Some(&token), Some(json!({ "item_id": a })))
        .await;
    assert_eq!(fresh.status, StatusCode::OK);
    assert_ne!(fresh.body["id"], cart_id);
    assert_eq!(fresh.body["status"], "active");
    assert_eq!(fresh.body["cart_items"].as_array().map(Vec::len), Some(1));

    let carts = app.request(Method::GET, "/carts", Some(&token), None).await;
    assert_eq!(carts.body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_concurrent_checkouts_place_one_order() {
    let app = std::sync::Arc::new(TestApp::new());
    let (token, cart_id, _, _) = filled_cart(&app).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let app = std::sync::Arc::clone(&app);
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            checkout(&app, &token, cart_id).await.0
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.expect("task panicked"));
    }
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CREATED).count(),
        1
    );
    assert!(
        statuses
            .iter()
            .all(|s| *s == StatusCode::CREATED || *s == StatusCode::NOT_FOUND)
    );

    let orders = app.request(Method::GET, "/orders", Some(&token), None).await;
    assert_eq!(orders.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_orders_require_auth() {
    let app = TestApp::new();
    let resp = app
        .request(Method::POST, "/orders", None, Some(json!({ "cart_id": 1 })))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
