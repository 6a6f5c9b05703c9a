//! Order placement and order status changes against a real database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use medsupply_core::{OrderStatus, Role};
use medsupply_integration_tests::{
    TestApp, create_category, create_product, create_user, stock_of, test_pool,
};
use medsupply_marketplace::db::{CartRepository, OrderRepository};
use medsupply_marketplace::models::{CreateOrderRequest, OrderLineRequest, OrderScope};
use medsupply_marketplace::services::{CheckoutError, place_orders};

fn request(items: Option<Vec<OrderLineRequest>>) -> CreateOrderRequest {
    CreateOrderRequest {
        items,
        shipping_address: Some("Kenyatta National Hospital, Nairobi".to_owned()),
        payment_method: Some("mpesa".to_owned()),
        notes: None,
    }
}

#[tokio::test]
async fn test_order_total_and_units_follow_current_prices() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let supplier = create_user(&pool, Role::Supplier).await;
    let category = create_category(&pool).await;
    let a = create_product(&pool, supplier.supplier_id(), category, Decimal::from(100), 10).await;
    let b = create_product(&pool, supplier.supplier_id(), category, Decimal::from(50), 10).await;

    let orders = place_orders(
        &pool,
        buyer.id(),
        request(Some(vec![
            OrderLineRequest {
                product_id: a,
                quantity: 2,
                price: Some(Decimal::from(100)),
            },
            OrderLineRequest {
                product_id: b,
                quantity: 1,
                price: None,
            },
        ])),
    )
    .await
    .unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total_amount, Decimal::from(250));
    assert_eq!(orders[0].status, OrderStatus::Pending);
    assert!(orders[0].order_number.starts_with("ORD-"));

    let view = OrderRepository::new(&pool)
        .get(orders[0].id)
        .await
        .unwrap()
        .unwrap();
    let units: i32 = view.items.iter().map(|i| i.quantity).sum();
    assert_eq!(units, 3);

    assert_eq!(stock_of(&pool, a).await, 8);
    assert_eq!(stock_of(&pool, b).await, 9);
}

#[tokio::test]
async fn test_stale_client_price_writes_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let supplier = create_user(&pool, Role::Supplier).await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, supplier.supplier_id(), category, Decimal::from(120), 5).await;

    let err = place_orders(
        &pool,
        buyer.id(),
        request(Some(vec![OrderLineRequest {
            product_id: product,
            quantity: 1,
            price: Some(Decimal::from(99)),
        }])),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CheckoutError::PriceMismatch { .. }));

    let orders = OrderRepository::new(&pool)
        .list(OrderScope::Buyer(buyer.id()))
        .await
        .unwrap();
    assert!(orders.is_empty());
    assert_eq!(stock_of(&pool, product).await, 5);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_everything() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let supplier = create_user(&pool, Role::Supplier).await;
    let category = create_category(&pool).await;
    let plenty = create_product(&pool, supplier.supplier_id(), category, Decimal::from(10), 50).await;
    let scarce = create_product(&pool, supplier.supplier_id(), category, Decimal::from(10), 1).await;

    let err = place_orders(
        &pool,
        buyer.id(),
        request(Some(vec![
            OrderLineRequest {
                product_id: plenty,
                quantity: 5,
                price: None,
            },
            OrderLineRequest {
                product_id: scarce,
                quantity: 2,
                price: None,
            },
        ])),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

    assert_eq!(stock_of(&pool, plenty).await, 50);
    assert_eq!(stock_of(&pool, scarce).await, 1);
}

#[tokio::test]
async fn test_cart_checkout_splits_by_supplier_and_clears_cart() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let first = create_user(&pool, Role::Supplier).await;
    let second = create_user(&pool, Role::Supplier).await;
    let category = create_category(&pool).await;
    let a = create_product(&pool, first.supplier_id(), category, Decimal::from(30), 10).await;
    let b = create_product(&pool, second.supplier_id(), category, Decimal::from(70), 10).await;

    let cart = CartRepository::new(&pool);
    cart.add(buyer.id(), a, 2).await.unwrap();
    cart.add(buyer.id(), b, 1).await.unwrap();

    let mut orders = place_orders(&pool, buyer.id(), request(None)).await.unwrap();
    orders.sort_by_key(|o| o.total_amount);

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].supplier_id, first.supplier_id());
    assert_eq!(orders[0].total_amount, Decimal::from(60));
    assert_eq!(orders[1].supplier_id, second.supplier_id());
    assert_eq!(orders[1].total_amount, Decimal::from(70));
    assert_ne!(orders[0].order_number, orders[1].order_number);

    assert!(cart.list(buyer.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_cart_checkout_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let app = TestApp::new(pool);
    let cookie = app.login(&buyer).await;

    let (status, body) = app
        .post(
            "/api/orders",
            Some(&cookie),
            json!({"shippingAddress": "Aga Khan Hospital, Kisumu"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_order_total_beyond_price_range_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let supplier = create_user(&pool, Role::Supplier).await;
    let category = create_category(&pool).await;
    let product = create_product(
        &pool,
        supplier.supplier_id(),
        category,
        Decimal::new(999_999_999_999, 2),
        10,
    )
    .await;

    let app = TestApp::new(pool.clone());
    let cookie = app.login(&buyer).await;

    let (status, body) = app
        .post(
            "/api/orders",
            Some(&cookie),
            json!({
                "items": [{"productId": product, "quantity": 2}],
                "shippingAddress": "Coast General Hospital, Mombasa"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exceeds"));
    assert_eq!(stock_of(&pool, product).await, 10);
}

#[tokio::test]
async fn test_order_visibility_and_status_rules() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let stranger = create_user(&pool, Role::Buyer).await;
    let supplier = create_user(&pool, Role::Supplier).await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, supplier.supplier_id(), category, Decimal::from(15), 10).await;

    let app = TestApp::new(pool);
    let buyer_cookie = app.login(&buyer).await;
    let stranger_cookie = app.login(&stranger).await;
    let supplier_cookie = app.login(&supplier).await;

    let (status, body) = app
        .post(
            "/api/orders",
            Some(&buyer_cookie),
            json!({
                "items": [{"productId": product, "quantity": 2}],
                "shippingAddress": "Moi Teaching and Referral Hospital, Eldoret"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["orders"][0]["id"].as_str().unwrap().to_owned();
    let detail = format!("/api/orders/{order_id}");
    let status_uri = format!("{detail}/status");

    let (status, _) = app.get(&detail, Some(&stranger_cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get(&detail, Some(&supplier_cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 2);

    // Buyers may only cancel
    let (status, _) = app
        .patch(&status_uri, Some(&buyer_cookie), json!({"status": "confirmed"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .patch(&status_uri, Some(&supplier_cookie), json!({"status": "teleported"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .patch(&status_uri, Some(&supplier_cookie), json!({"status": "confirmed"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    // Confirmed orders are past the buyer's cancel window
    let (status, _) = app
        .patch(&status_uri, Some(&buyer_cookie), json!({"status": "cancelled"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // No skipping ahead
    let (status, _) = app
        .patch(&status_uri, Some(&supplier_cookie), json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .patch(&status_uri, Some(&supplier_cookie), json!({"paymentStatus": "paid"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_status"], "paid");
}
