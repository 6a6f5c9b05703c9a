//! Admin dashboard and verification review handlers.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use medsupply_core::VerificationStatus;

use crate::db::{RepositoryError, StatsRepository, VerificationRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Query};
use crate::middleware::RequireAdmin;
use crate::models::{ActivityEvent, AdminStats, Verification, VerificationDecision, VerificationView};
use crate::state::AppState;

/// Review queue filter.
#[derive(Debug, Default, Deserialize)]
pub struct VerificationQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerificationsResponse {
    pub verifications: Vec<VerificationView>,
}

/// Parse the target of an admin decision. Only final states are accepted.
pub fn decision_status(raw: &str) -> Result<VerificationStatus> {
    match raw.trim().parse::<VerificationStatus>() {
        Ok(status) if status.is_terminal() => Ok(status),
        _ => Err(AppError::BadRequest(
            "Status must be approved or rejected".to_owned(),
        )),
    }
}

/// GET /api/admin/stats
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<AdminStats>> {
    let stats = StatsRepository::new(state.pool()).admin().await?;
    Ok(Json(stats))
}

/// Newest orders, registrations and decisions.
///
/// GET /api/admin/recent-activity
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn recent_activity(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<ActivityEvent>>> {
    let events = StatsRepository::new(state.pool()).recent_activity().await?;
    Ok(Json(events))
}

/// Review queue with supplier details and documents.
///
/// GET /api/admin/verifications?status=
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn verifications(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<VerificationQuery>,
) -> Result<Json<VerificationsResponse>> {
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<VerificationStatus>()
                .map_err(|e| AppError::BadRequest(e.to_string()))
        })
        .transpose()?;

    let verifications = VerificationRepository::new(state.pool())
        .list(status)
        .await?;
    Ok(Json(VerificationsResponse { verifications }))
}

/// Approve or reject a pending verification.
///
/// POST /api/admin/verifications/update
#[instrument(
    skip(state, admin, decision),
    fields(admin_id = %admin.id, verification_id = %decision.verification_id)
)]
pub async fn decide(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(decision): Json<VerificationDecision>,
) -> Result<Json<Verification>> {
    let status = decision_status(&decision.status)?;

    let verification = match VerificationRepository::new(state.pool())
        .decide(decision.verification_id, status, decision.reason, admin.id)
        .await
    {
        Ok(v) => v,
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound("Verification not found".to_owned()));
        }
        Err(e) => return Err(e.into()),
    };

    add_breadcrumb(
        "verification",
        "Verification decided",
        Some(&[("status", status.as_str())]),
    );
    Ok(Json(verification))
}
