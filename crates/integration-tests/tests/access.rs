//! Role checks and self-service account endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use medsupply_core::Role;
use medsupply_integration_tests::{TestApp, create_user, test_pool};

const ADMIN_ROUTES: [&str; 3] = [
    "/api/admin/stats",
    "/api/admin/recent-activity",
    "/api/admin/verifications",
];

const SUPPLIER_ROUTES: [&str; 4] = [
    "/api/supplier/stats",
    "/api/supplier/orders",
    "/api/supplier/low-stock",
    "/api/supplier/verification",
];

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let supplier = create_user(&pool, Role::Supplier).await;
    let admin = create_user(&pool, Role::Admin).await;

    let app = TestApp::new(pool);
    let admin_cookie = app.login(&admin).await;

    for user in [&buyer, &supplier] {
        let cookie = app.login(user).await;
        for uri in ADMIN_ROUTES {
            let (status, body) = app.get(uri, Some(&cookie)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} as {}", user.profile.role);
            assert!(body["error"].is_string());
        }
    }

    for uri in ADMIN_ROUTES {
        let (status, _) = app.get(uri, Some(&admin_cookie)).await;
        assert_eq!(status, StatusCode::OK, "{uri} as admin");
    }

    let (status, body) = app
        .get("/api/admin/verifications?status=bogus", Some(&admin_cookie))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_supplier_routes_reject_buyers() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let supplier = create_user(&pool, Role::Supplier).await;

    let app = TestApp::new(pool);
    let buyer_cookie = app.login(&buyer).await;
    let supplier_cookie = app.login(&supplier).await;

    for uri in SUPPLIER_ROUTES {
        let (status, _) = app.get(uri, Some(&buyer_cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} as buyer");

        let (status, _) = app.get(uri, Some(&supplier_cookie)).await;
        assert_eq!(status, StatusCode::OK, "{uri} as supplier");
    }
}

#[tokio::test]
async fn test_profile_update_ignores_protected_fields() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let app = TestApp::new(pool);
    let cookie = app.login(&buyer).await;

    let (status, body) = app
        .patch("/api/user", Some(&cookie), json!({"role": "admin"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    let (status, body) = app
        .patch(
            "/api/user",
            Some(&cookie),
            json!({"full_name": "Dr. Achieng Otieno", "role": "admin", "verification_status": "verified"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Dr. Achieng Otieno");
    assert_eq!(body["role"], "buyer");

    let (status, body) = app.get("/api/user", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["role"], "buyer");
    assert_eq!(body["orders"], json!([]));
    assert!(body["redirectUrl"].as_str().unwrap().ends_with("/dashboard"));
}

#[tokio::test]
async fn test_notification_preferences_default_then_persist() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let buyer = create_user(&pool, Role::Buyer).await;
    let app = TestApp::new(pool);
    let cookie = app.login(&buyer).await;

    let (status, body) = app.get("/api/notifications", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_order_updates"], true);
    assert_eq!(body["email_promotions"], false);

    let (status, _) = app.patch("/api/notifications", Some(&cookie), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .patch(
            "/api/notifications",
            Some(&cookie),
            json!({"email_promotions": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_promotions"], true);
    assert_eq!(body["email_order_updates"], true);

    let (_, body) = app.get("/api/notifications", Some(&cookie)).await;
    assert_eq!(body["email_promotions"], true);
}
