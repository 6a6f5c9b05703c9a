//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                           - Liveness
//! GET    /health/ready                     - Readiness (database)
//!
//! # Auth (rate limited)
//! POST   /api/auth/register                - Sign up a buyer or supplier
//! POST   /api/auth/login                   - Password sign-in
//! POST   /api/auth/logout                  - Sign out
//! POST   /api/auth/forgot-password         - Send recovery e-mail
//! POST   /api/reset-password               - Set password with recovery code
//!
//! # Catalog (public reads)
//! GET    /api/categories                   - Categories with product counts
//! GET    /api/products                     - In-stock product listing
//! GET    /api/products/{id}                - Product detail
//! GET    /api/suppliers                    - Verified supplier directory
//! POST   /api/products                     - Create product (verified supplier)
//! PATCH  /api/products/{id}                - Edit own product (supplier)
//! POST   /api/products/{id}/image          - Upload product image (supplier)
//!
//! # Account (signed in)
//! GET    /api/user                         - Identity, profile and orders
//! PATCH  /api/user                         - Edit profile
//! GET    /api/notifications                - Notification switches
//! PATCH  /api/notifications                - Edit notification switches
//! POST   /api/avatar                       - Upload avatar
//!
//! # Cart
//! GET    /api/cart                         - Cart (empty when anonymous)
//! POST   /api/cart                         - Add product
//! DELETE /api/cart                         - Empty cart
//! PATCH  /api/cart/{product_id}            - Set quantity
//! DELETE /api/cart/{product_id}            - Remove product
//!
//! # Orders
//! POST   /api/orders                       - Place orders (lines or cart)
//! GET    /api/orders                       - Orders visible to caller
//! GET    /api/orders/{id}                  - Order detail
//! PATCH  /api/orders/{id}/status           - Change order/payment status
//!
//! # Supplier dashboard
//! GET    /api/supplier/stats
//! GET    /api/supplier/orders
//! GET    /api/supplier/low-stock
//! GET    /api/supplier/verification        - Latest review and documents
//! POST   /api/supplier/verification        - Resubmit after rejection
//! POST   /api/supplier/verification/documents - Upload a document
//!
//! # Admin dashboard
//! GET    /api/admin/stats
//! GET    /api/admin/recent-activity
//! GET    /api/admin/verifications          - Review queue (?status=)
//! POST   /api/admin/verifications/update   - Approve or reject
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod supplier;
pub mod suppliers;
pub mod user;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::middleware::auth_rate_limiter;
use crate::services::uploads::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Request body cap for multipart routes: one file plus form overhead.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter())
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(catalog::get_product).patch(catalog::update_product),
        )
        .route("/suppliers", get(suppliers::list))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(user::show).patch(user::update))
        .route(
            "/notifications",
            get(user::notifications).patch(user::update_notifications),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cart",
            get(cart::show).post(cart::add).delete(cart::clear),
        )
        .route(
            "/cart/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", patch(orders::update_status))
}

/// Create the supplier dashboard routes router.
pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/supplier/stats", get(supplier::stats))
        .route("/supplier/orders", get(supplier::orders))
        .route("/supplier/low-stock", get(supplier::low_stock))
        .route(
            "/supplier/verification",
            get(supplier::verification).post(supplier::resubmit),
        )
}

/// Create the admin dashboard routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(admin::stats))
        .route("/admin/recent-activity", get(admin::recent_activity))
        .route("/admin/verifications", get(admin::verifications))
        .route("/admin/verifications/update", post(admin::decide))
}

/// Create the multipart upload routes router, with a larger body limit.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/avatar", post(user::upload_avatar))
        .route("/products/{id}/image", post(catalog::upload_product_image))
        .route(
            "/supplier/verification/documents",
            post(supplier::upload_document),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create all routes for the marketplace.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(auth_routes())
        .merge(catalog_routes())
        .merge(account_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .merge(upload_routes())
        .merge(supplier_routes())
        .merge(admin_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}
