//! Public supplier directory.

use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use crate::db::SupplierRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::models::SupplierListing;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SuppliersResponse {
    pub suppliers: Vec<SupplierListing>,
}

/// Verified suppliers, best rated first.
///
/// GET /api/suppliers
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<SuppliersResponse>> {
    let suppliers = SupplierRepository::new(state.pool()).list_verified().await?;
    Ok(Json(SuppliersResponse { suppliers }))
}
