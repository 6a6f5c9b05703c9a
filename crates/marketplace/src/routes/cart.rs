//! Cart route handlers.
//!
//! Reads are open: an anonymous caller gets an empty cart. Every write needs
//! a signed-in user with a profile and answers with the updated cart.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use medsupply_core::{ProductId, ProfileId};

use crate::db::{CartRepository, RepositoryError, cart::MAX_LINE_QUANTITY};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::{OptionalAuth, RequireProfile};
use crate::models::{AddToCart, Cart, SetQuantity};
use crate::state::AppState;

async fn load_cart(state: &AppState, user_id: ProfileId) -> Result<Json<Cart>> {
    let lines = CartRepository::new(state.pool()).list(user_id).await?;
    Ok(Json(Cart::from(lines)))
}

/// The caller's cart.
///
/// GET /api/cart
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Cart>> {
    match user {
        Some(user) => load_cart(&state, user.id).await,
        None => Ok(Json(Cart::default())),
    }
}

/// Add units of a product, merging with an existing line.
///
/// POST /api/cart
#[instrument(skip(state, profile, request), fields(user_id = %profile.id, product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
    Json(request): Json<AddToCart>,
) -> Result<Json<Cart>> {
    if request.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_owned(),
        ));
    }

    match CartRepository::new(state.pool())
        .add(profile.id, request.product_id, request.quantity)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(AppError::BadRequest(format!(
                "Quantity in cart cannot exceed {MAX_LINE_QUANTITY}"
            )));
        }
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound("Product not found".to_owned()));
        }
        Err(e) => return Err(e.into()),
    }

    load_cart(&state, profile.id).await
}

/// Set a line's quantity; zero or less removes it.
///
/// PATCH /api/cart/{product_id}
#[instrument(skip(state, profile, request), fields(user_id = %profile.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
    Path(product_id): Path<ProductId>,
    Json(request): Json<SetQuantity>,
) -> Result<Json<Cart>> {
    let changed = CartRepository::new(state.pool())
        .set_quantity(profile.id, product_id, request.quantity)
        .await?;

    if !changed && request.quantity > 0 {
        return Err(AppError::NotFound("Item not in cart".to_owned()));
    }

    load_cart(&state, profile.id).await
}

/// Remove one product from the cart.
///
/// DELETE /api/cart/{product_id}
#[instrument(skip(state, profile), fields(user_id = %profile.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Cart>> {
    CartRepository::new(state.pool())
        .remove(profile.id, product_id)
        .await?;
    load_cart(&state, profile.id).await
}

/// Empty the cart.
///
/// DELETE /api/cart
#[instrument(skip(state, profile), fields(user_id = %profile.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
) -> Result<StatusCode> {
    let removed = CartRepository::new(state.pool()).clear(profile.id).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(StatusCode::NO_CONTENT)
}
