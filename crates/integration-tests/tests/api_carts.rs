//! Catalog and cart routes through the HTTP API.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use cartwheel_integration_tests::TestApp;

fn line_for(cart: &Value, item_id: i64) -> &Value {
    cart["cart_items"]
        .as_array()
        .expect("cart_items is not an array")
        .iter()
        .find(|line| line["item_id"] == item_id)
        .expect("no line for item")
}

#[tokio::test]
async fn test_create_and_fetch_items() {
    let app = TestApp::new();

    let created = app
        .request(
            Method::POST,
            "/items",
            None,
            Some(json!({ "name": "Lamp", "description": "Desk lamp", "price": 19.5 })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["price"], "19.5");
    let id = created.body["id"].as_i64().expect("no id");

    let shown = app
        .request(Method::GET, &format!("/items/{id}"), None, None)
        .await;
    assert_eq!(shown.status, StatusCode::OK);
    assert_eq!(shown.body["name"], "Lamp");
    assert_eq!(shown.body["description"], "Desk lamp");

    let listed = app.request(Method::GET, "/items", None, None).await;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_item_validation_and_not_found() {
    let app = TestApp::new();

    for body in [
        json!({ "name": "", "price": "1.00" }),
        json!({ "name": "Free lunch", "price": "-1" }),
        json!({ "name": "Fraction", "price": "0.001" }),
        json!({ "name": "No price" }),
    ] {
        let resp = app.request(Method::POST, "/items", None, Some(body.clone())).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{body}");
    }

    for uri in ["/items/999", "/items/not-a-number"] {
        let resp = app.request(Method::GET, uri, None, None).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(resp.body, json!({ "error": "Item not found" }));
    }
}

#[tokio::test]
async fn test_add_item_accumulates_on_one_line() {
    let app = TestApp::new();
    let token = app.signup("alice").await;
    let a = app.create_item("A", "10.00").await;
    let b = app.create_item("B", "5.00").await;

    for (item_id, quantity) in [(a, 2), (a, 3), (b, 1)] {
        let resp = app
            .request(
                Method::POST,
                "/carts",
                Some(&token),
                Some(json!({ "item_id": item_id, "quantity": quantity })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    }

    let carts = app.request(Method::GET, "/carts", Some(&token), None).await;
    let carts = carts.body.as_array().expect("carts is not an array");
    assert_eq!(carts.len(), 1);

    let cart = carts.first().expect("no cart");
    assert_eq!(cart["status"], "active");
    assert_eq!(cart["cart_items"].as_array().map(Vec::len), Some(2));
    assert_eq!(line_for(cart, a)["quantity"], 5);
    assert_eq!(line_for(cart, b)["quantity"], 1);
    assert_eq!(line_for(cart, a)["item"]["name"], "A");
    assert_eq!(line_for(cart, a)["item"]["price"], "10.00");
}

#[tokio::test]
async fn test_non_positive_or_missing_quantity_counts_as_one() {
    let app = TestApp::new();
    let token = app.signup("alice").await;
    let a = app.create_item("A", "1.00").await;

    let mut last = Value::Null;
    for body in [
        json!({ "item_id": a, "quantity": 0 }),
        json!({ "item_id": a, "quantity": -7 }),
        json!({ "item_id": a }),
    ] {
        let resp = app.request(Method::POST, "/carts", Some(&token), Some(body)).await;
        assert_eq!(resp.status, StatusCode::OK);
        last = resp.body;
    }

    assert_eq!(line_for(&last, a)["quantity"], 3);
}

#[tokio::test]
async fn test_add_unknown_item_is_not_found() {
    let app = TestApp::new();
    let token = app.signup("alice").await;

    let resp = app
        .request(
            Method::POST,
            "/carts",
            Some(&token),
            Some(json!({ "item_id": 404, "quantity": 1 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body, json!({ "error": "Item not found" }));

    let carts = app.request(Method::GET, "/carts", Some(&token), None).await;
    assert_eq!(carts.body, json!([]));
}

#[tokio::test]
async fn test_quantity_out_of_range_is_bad_request() {
    let app = TestApp::new();
    let token = app.signup("alice").await;
    let a = app.create_item("A", "1.00").await;

    let too_big = app
        .request(
            Method::POST,
            "/carts",
            Some(&token),
            Some(json!({ "item_id": a, "quantity": i64::from(i32::MAX) + 1 })),
        )
        .await;
    assert_eq!(too_big.status, StatusCode::BAD_REQUEST);

    let full = app
        .request(
            Method::POST,
            "/carts",
            Some(&token),
            Some(json!({ "item_id": a, "quantity": i32::MAX })),
        )
        .await;
    assert_eq!(full.status, StatusCode::OK);

    let overflow = app
        .request(
            Method::POST,
            "/carts",
            Some(&token),
            Some(json!({ "item_id": a, "quantity": 1 })),
        )
        .await;
    assert_eq!(overflow.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_item_id_is_bad_request() {
    let app = TestApp::new();
    let token = app.signup("alice").await;

    let resp = app
        .request(Method::POST, "/carts", Some(&token), Some(json!({ "quantity": 1 })))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let app = TestApp::new();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let a = app.create_item("A", "1.00").await;

    let alice_cart = app
        .request(Method::POST, "/carts", Some(&alice), Some(json!({ "item_id": a })))
        .await;
    let bob_cart = app
        .request(Method::POST, "/carts", Some(&bob), Some(json!({ "item_id": a })))
        .await;
    assert_ne!(alice_cart.body["id"], bob_cart.body["id"]);

    let listed = app.request(Method::GET, "/carts", Some(&bob), None).await;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
    assert_eq!(listed.body[0]["id"], bob_cart.body["id"]);
}

#[tokio::test]
async fn test_carts_require_auth() {
    let app = TestApp::new();
    let a = app.create_item("A", "1.00").await;

    let resp = app
        .request(Method::POST, "/carts", None, Some(json!({ "item_id": a })))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
