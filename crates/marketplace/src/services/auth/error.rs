//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::supabase::SupabaseError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] medsupply_core::EmailError),

    /// Invalid KRA PIN on a supplier sign-up.
    #[error("invalid KRA PIN: {0}")]
    InvalidKraPin(#[from] medsupply_core::KraPinError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// A required field was absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Role cannot be chosen at sign-up.
    #[error("role not allowed: {0}")]
    RoleNotAllowed(String),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Provider user has no marketplace profile.
    #[error("profile not found")]
    ProfileMissing,

    /// Recovery code was rejected by the provider.
    #[error("invalid or expired reset code")]
    InvalidResetCode,

    /// Auth provider call failed.
    #[error("auth provider error: {0}")]
    Provider(#[from] SupabaseError),

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
