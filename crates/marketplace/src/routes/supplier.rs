//! Supplier dashboard route handlers.
//!
//! Every handler here requires a signed-in supplier. Only product creation
//! additionally requires a verified one, and that lives in the catalog routes.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use medsupply_core::VerificationStatus;

use crate::db::{CatalogRepository, OrderRepository, StatsRepository, VerificationRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Multipart};
use crate::middleware::RequireSupplier;
use crate::models::{
    LowStockProduct, OrderScope, OrderView, ResubmitRequest, SupplierStats, Verification,
    VerificationDocument, VerificationSummary,
};
use crate::routes::orders::OrdersResponse;
use crate::services::uploads::{self, UploadForm, UploadKind};
use crate::state::AppState;

/// GET /api/supplier/stats
#[instrument(skip(state, supplier), fields(supplier_id = %supplier.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireSupplier { supplier, .. }: RequireSupplier,
) -> Result<Json<SupplierStats>> {
    let stats = StatsRepository::new(state.pool())
        .supplier(supplier.id)
        .await?;
    Ok(Json(stats))
}

/// Orders addressed to the caller.
///
/// GET /api/supplier/orders
#[instrument(skip(state, supplier), fields(supplier_id = %supplier.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireSupplier { supplier, .. }: RequireSupplier,
) -> Result<Json<OrdersResponse<OrderView>>> {
    let orders = OrderRepository::new(state.pool())
        .list(OrderScope::Supplier(supplier.id))
        .await?;
    Ok(Json(OrdersResponse { orders }))
}

/// GET /api/supplier/low-stock
#[instrument(skip(state, supplier), fields(supplier_id = %supplier.id))]
pub async fn low_stock(
    State(state): State<AppState>,
    RequireSupplier { supplier, .. }: RequireSupplier,
) -> Result<Json<Vec<LowStockProduct>>> {
    let products = CatalogRepository::new(state.pool())
        .low_stock(supplier.id)
        .await?;
    Ok(Json(products))
}

/// The caller's standing, latest review and its documents.
///
/// GET /api/supplier/verification
#[instrument(skip(state, profile, supplier), fields(supplier_id = %supplier.id))]
pub async fn verification(
    State(state): State<AppState>,
    RequireSupplier { profile, supplier }: RequireSupplier,
) -> Result<Json<VerificationSummary>> {
    let repo = VerificationRepository::new(state.pool());
    let verification = repo.latest_for_profile(profile.id).await?;
    let documents = match &verification {
        Some(v) => repo.documents(v.id).await?,
        None => Vec::new(),
    };

    Ok(Json(VerificationSummary {
        verification_status: supplier.verification_status,
        verification,
        documents,
    }))
}

/// Open a new review after a rejection.
///
/// POST /api/supplier/verification
#[instrument(skip(state, profile, request), fields(profile_id = %profile.id, documents = request.documents.len()))]
pub async fn resubmit(
    State(state): State<AppState>,
    RequireSupplier { profile, .. }: RequireSupplier,
    Json(request): Json<ResubmitRequest>,
) -> Result<(StatusCode, Json<Verification>)> {
    for doc in &request.documents {
        if doc.document_type.trim().is_empty() || doc.file_url.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Each document needs a type and a file URL".to_owned(),
            ));
        }
    }

    let verification = VerificationRepository::new(state.pool())
        .resubmit(profile.id, &request.documents)
        .await?;

    add_breadcrumb(
        "verification",
        "Verification resubmitted",
        Some(&[("verification_id", verification.id.to_string().as_str())]),
    );
    Ok((StatusCode::CREATED, Json(verification)))
}

/// Upload a document into the caller's pending review.
///
/// POST /api/supplier/verification/documents (multipart fields
/// `document_type` and `file`)
#[instrument(skip(state, profile, multipart), fields(profile_id = %profile.id))]
pub async fn upload_document(
    State(state): State<AppState>,
    RequireSupplier { profile, .. }: RequireSupplier,
    Multipart(multipart): Multipart,
) -> Result<(StatusCode, Json<VerificationDocument>)> {
    let repo = VerificationRepository::new(state.pool());
    let verification = repo
        .latest_for_profile(profile.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No verification to attach documents to".to_owned()))?;
    if verification.status != VerificationStatus::Pending {
        return Err(AppError::Conflict(
            "Documents can only be added to a pending verification".to_owned(),
        ));
    }

    let form = UploadForm::read(multipart, "file").await?;
    let document_type = form
        .text("document_type")
        .ok_or_else(|| AppError::BadRequest("document_type is required".to_owned()))?
        .to_owned();

    let stored = uploads::store(
        state.storage(),
        &format!("verifications/{}", verification.id),
        form.file,
        UploadKind::VerificationDocument,
    )
    .await?;

    let document = repo
        .add_document(
            verification.id,
            &document_type,
            &stored.public_url,
            &stored.path,
        )
        .await?;

    tracing::info!(
        verification_id = %verification.id,
        document_type = %document.document_type,
        "Verification document uploaded"
    );
    Ok((StatusCode::CREATED, Json(document)))
}
