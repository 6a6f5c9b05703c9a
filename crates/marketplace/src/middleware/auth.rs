//! Authentication and role-gate extractors.
//!
//! `RequireAuth` only reads the session. The role gates additionally load the
//! caller's profile on every request and fail closed: a lookup error, a
//! missing profile and a role mismatch all reject with 401.
//!
//! ```rust,ignore
//! async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
//!     format!("Hello, {}!", admin.email)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use medsupply_core::{Role, SupplierVerificationStatus};

use crate::db::{ProfileRepository, SupplierRepository};
use crate::error::AppError;
use crate::models::{CurrentUser, Profile, Supplier, session_keys};
use crate::state::AppState;

const AUTH_REQUIRED: &str = "Authentication required";
const NOT_PERMITTED: &str = "Unauthorized";

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            None
        }
    }
}

async fn load_profile(parts: &Parts, state: &AppState) -> Result<Profile, AppError> {
    let RequireAuth(user) = RequireAuth::from_parts(parts).await?;

    match ProfileRepository::new(state.pool()).get_by_id(user.id).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => {
            tracing::warn!(user_id = %user.id, "Session user has no profile");
            Err(AppError::Unauthorized(NOT_PERMITTED.to_owned()))
        }
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Profile lookup failed");
            Err(AppError::Unauthorized(NOT_PERMITTED.to_owned()))
        }
    }
}

async fn load_supplier(
    parts: &Parts,
    state: &AppState,
) -> Result<(Profile, Supplier), AppError> {
    let profile = load_profile(parts, state).await?;
    if profile.role != Role::Supplier {
        return Err(AppError::Unauthorized(NOT_PERMITTED.to_owned()));
    }

    match SupplierRepository::new(state.pool())
        .get_by_profile(profile.id)
        .await
    {
        Ok(Some(supplier)) => Ok((profile, supplier)),
        Ok(None) => {
            tracing::warn!(profile_id = %profile.id, "Supplier profile has no supplier row");
            Err(AppError::Unauthorized(NOT_PERMITTED.to_owned()))
        }
        Err(e) => {
            tracing::error!(profile_id = %profile.id, error = %e, "Supplier lookup failed");
            Err(AppError::Unauthorized(NOT_PERMITTED.to_owned()))
        }
    }
}

/// Requires a signed-in user. Rejects with 401 JSON otherwise.
pub struct RequireAuth(pub CurrentUser);

impl RequireAuth {
    async fn from_parts(parts: &Parts) -> Result<Self, AppError> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(AUTH_REQUIRED.to_owned()))
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).await
    }
}

/// The signed-in user, if any. Never rejects.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Requires a signed-in user with a profile, of any role.
pub struct RequireProfile(pub Profile);

impl FromRequestParts<AppState> for RequireProfile {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_profile(parts, state).await.map(Self)
    }
}

/// Requires the `admin` role.
pub struct RequireAdmin(pub Profile);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let profile = load_profile(parts, state).await?;
        if profile.role != Role::Admin {
            tracing::warn!(user_id = %profile.id, role = %profile.role, "Admin route denied");
            return Err(AppError::Unauthorized(NOT_PERMITTED.to_owned()));
        }
        Ok(Self(profile))
    }
}

/// Requires the `supplier` role and resolves the caller's supplier row.
pub struct RequireSupplier {
    pub profile: Profile,
    pub supplier: Supplier,
}

impl FromRequestParts<AppState> for RequireSupplier {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (profile, supplier) = load_supplier(parts, state).await?;
        Ok(Self { profile, supplier })
    }
}

/// Requires a supplier whose verification has been approved.
pub struct RequireVerifiedSupplier {
    pub profile: Profile,
    pub supplier: Supplier,
}

impl FromRequestParts<AppState> for RequireVerifiedSupplier {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (profile, supplier) = load_supplier(parts, state).await?;
        if supplier.verification_status != SupplierVerificationStatus::Verified {
            return Err(AppError::Unauthorized(
                "supplier verification required".to_owned(),
            ));
        }
        Ok(Self { profile, supplier })
    }
}

/// Store the signed-in user in the session, rotating the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
