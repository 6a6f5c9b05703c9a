//! Clients for the hosted backend's REST APIs.
//!
//! The marketplace delegates identity and file storage to the hosted
//! backend (a Supabase-compatible service):
//!
//! - [`AuthClient`] - sign-up, password sign-in, recovery e-mails and the
//!   administrative user endpoints (password reset, compensation deletes)
//! - [`StorageClient`] - object uploads, removals and public URLs
//!
//! Both share one `reqwest::Client`. Administrative calls need the
//! service-role key; when it is not configured they fail with
//! [`SupabaseError::NotConfigured`] instead of being attempted.

pub mod auth;
pub mod storage;

pub use auth::{AuthClient, ProviderSession, ProviderUser, SignUpOutcome};
pub use storage::{StorageClient, StoredObject};

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Timeout applied to every hosted-backend request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when calling the hosted backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Email/password pair was rejected.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Sign-up for an email that already has an account.
    #[error("User already registered")]
    UserAlreadyExists,

    /// A required key is not configured.
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    /// The configured base URL cannot carry API paths.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SupabaseError {
    /// Whether the upstream rejected the request itself (4xx), as opposed to
    /// failing to serve it.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }
}

/// Build the shared HTTP client.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client() -> Result<reqwest::Client, SupabaseError> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Append path segments to a base URL, keeping any path the base already has.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SupabaseError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| SupabaseError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments.iter().flat_map(|s| s.split('/')).filter(|s| !s.is_empty()));
    Ok(url)
}

/// Error body shapes returned by the auth and storage APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

/// Turn a non-success response into a `SupabaseError`.
async fn api_error(response: reqwest::Response) -> SupabaseError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    if body.error_code.as_deref() == Some("user_already_exists")
        || body
            .message()
            .is_some_and(|m| m.to_lowercase().contains("already registered"))
    {
        return SupabaseError::UserAlreadyExists;
    }
    if body.error.as_deref() == Some("invalid_grant")
        || body.error_code.as_deref() == Some("invalid_credentials")
    {
        return SupabaseError::InvalidCredentials;
    }

    let message = body.message().map_or_else(
        || {
            if text.is_empty() {
                "empty response".to_string()
            } else {
                text.clone()
            }
        },
        str::to_string,
    );
    SupabaseError::Api { status, message }
}
