//! Authentication route handlers.
//!
//! Credentials are checked by the auth provider; on success the marketplace
//! stores a [`CurrentUser`] in its own cookie session.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::Json;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, Profile};
use crate::services::{AuthService, Registration};
use crate::state::AppState;

/// Sign-up response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub profile: Profile,
    pub redirect_url: String,
    pub requires_confirmation: bool,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: CurrentUser,
    pub profile: Profile,
    pub redirect_url: String,
}

/// Recovery e-mail request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Password reset request.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub code: Option<String>,
    pub password: Option<String>,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Register a buyer or supplier.
///
/// POST /api/auth/register
#[instrument(skip(state, session, request), fields(role = ?request.role))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<Registration>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let auth = AuthService::new(state.pool(), state.auth());
    let registered = auth.register(request).await?;

    if let Some(user) = &registered.session_user {
        set_current_user(&session, user).await?;
        set_sentry_user(&user.id, Some(user.email.as_str()));
    }

    tracing::info!(
        user_id = %registered.profile.id,
        role = %registered.profile.role,
        requires_confirmation = registered.requires_confirmation,
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            redirect_url: state.config().redirect_url_for(registered.profile.role),
            requires_confirmation: registered.requires_confirmation,
            profile: registered.profile,
        }),
    ))
}

/// Sign in with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), state.auth());
    let (user, profile) = auth.login(&request.email, request.password).await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, role = %profile.role, "User logged in");

    Ok(Json(LoginResponse {
        redirect_url: state.config().redirect_url_for(profile.role),
        user,
        profile,
    }))
}

/// Sign out.
///
/// POST /api/auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Send a password recovery e-mail. Answers the same whether or not the
/// address has an account.
///
/// POST /api/auth/forgot-password
#[instrument(skip(state, request))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.auth())
        .forgot_password(&request.email, &state.config().password_reset_url())
        .await?;

    Ok(Json(MessageResponse {
        message: "If an account exists for this email, a reset link has been sent",
    }))
}

/// Set a new password with a recovery code.
///
/// POST /api/reset-password
#[instrument(skip(state, request))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.auth())
        .reset_password(request.code, request.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}
