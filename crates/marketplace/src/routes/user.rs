//! Signed-in user's own account: profile, notification switches, avatar.

use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use crate::db::{NotificationRepository, OrderRepository, ProfileRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Multipart};
use crate::middleware::{RequireAuth, RequireProfile};
use crate::models::{
    CurrentUser, NotificationPreferences, NotificationUpdate, OrderView, Profile, ProfileUpdate,
};
use crate::routes::orders::OrderViewer;
use crate::services::uploads::{self, UploadForm};
use crate::state::AppState;

/// Account overview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user: CurrentUser,
    pub profile: Profile,
    pub orders: Vec<OrderView>,
    pub redirect_url: String,
}

/// Avatar upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub avatar_url: String,
    pub path: String,
}

/// The caller's identity, profile and orders.
///
/// GET /api/user
#[instrument(skip(state, user, profile), fields(user_id = %profile.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    RequireProfile(profile): RequireProfile,
) -> Result<Json<UserResponse>> {
    let viewer = OrderViewer::resolve(&state, &profile).await?;
    let orders = OrderRepository::new(state.pool())
        .list(viewer.scope())
        .await?;

    Ok(Json(UserResponse {
        redirect_url: state.config().redirect_url_for(profile.role),
        user,
        profile,
        orders,
    }))
}

/// Edit allow-listed profile fields. Role and verification status are not
/// writable here.
///
/// PATCH /api/user
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_owned()));
    }
    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await?;
    Ok(Json(profile))
}

/// Notification switches; defaults when none are stored or the read fails.
///
/// GET /api/notifications
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn notifications(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Json<NotificationPreferences> {
    let prefs = match NotificationRepository::new(state.pool()).get(user.id).await {
        Ok(Some(prefs)) => prefs,
        Ok(None) => NotificationPreferences::defaults(user.id),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read notification preferences");
            NotificationPreferences::defaults(user.id)
        }
    };
    Json(prefs)
}

/// Update notification switches.
///
/// PATCH /api/notifications
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update_notifications(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<NotificationUpdate>,
) -> Result<Json<NotificationPreferences>> {
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_owned()));
    }
    let prefs = NotificationRepository::new(state.pool())
        .upsert(user.id, &update)
        .await?;
    Ok(Json(prefs))
}

/// Upload an avatar and store its URL on the profile.
///
/// The object is written first; if the profile write fails the object stays
/// in storage and the request fails.
///
/// POST /api/avatar (multipart field `avatar`)
#[instrument(skip(state, profile, multipart), fields(user_id = %profile.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
    Multipart(multipart): Multipart,
) -> Result<Json<AvatarResponse>> {
    let form = UploadForm::read(multipart, "avatar").await?;
    let stored = uploads::store_avatar(state.storage(), profile.id, form.file).await?;

    ProfileRepository::new(state.pool())
        .set_avatar_url(profile.id, &stored.public_url)
        .await?;

    Ok(Json(AvatarResponse {
        avatar_url: stored.public_url,
        path: stored.path,
    }))
}
