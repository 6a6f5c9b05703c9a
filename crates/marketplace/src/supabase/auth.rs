//! Auth provider REST client.
//!
//! Wraps the hosted backend's `/auth/v1` endpoints. Public calls are made with
//! the anonymous key; administrative calls use the service-role key.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use super::{SupabaseError, api_error, endpoint};
use crate::config::SupabaseConfig;

/// A user record as returned by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

/// A signed-in session as returned by the auth provider.
///
/// Tokens are held only long enough to identify the user; the marketplace
/// keeps its own cookie session.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    #[serde(default)]
    pub access_token: Option<String>,
    pub user: ProviderUser,
}

/// Result of a sign-up call.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    /// E-mail confirmation is disabled: the user is signed in immediately.
    SignedIn(ProviderSession),
    /// A confirmation e-mail was sent; no session yet.
    ConfirmationRequired(ProviderUser),
}

impl SignUpOutcome {
    /// The created user.
    #[must_use]
    pub const fn user(&self) -> &ProviderUser {
        match self {
            Self::SignedIn(session) => &session.user,
            Self::ConfirmationRequired(user) => user,
        }
    }

    /// Whether the user must confirm their e-mail before signing in.
    #[must_use]
    pub const fn requires_confirmation(&self) -> bool {
        matches!(self, Self::ConfirmationRequired(_))
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a Value,
}

#[derive(Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    token_hash: &'a str,
}

#[derive(Serialize)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

/// Client for the auth provider.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    service_key: Option<SecretString>,
}

impl AuthClient {
    /// Create a new auth client.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            http,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            service_key: config.service_role_key.clone(),
        }
    }

    /// Whether administrative calls can be made.
    #[must_use]
    pub const fn has_service_key(&self) -> bool {
        self.service_key.is_some()
    }

    fn service_key(&self) -> Result<&str, SupabaseError> {
        self.service_key
            .as_ref()
            .map(|key| key.expose_secret())
            .ok_or(SupabaseError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY"))
    }

    fn public_post(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Register a new user with e-mail and password.
    ///
    /// `metadata` is stored on the provider's user record.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::UserAlreadyExists` for a taken e-mail, or
    /// `SupabaseError::Api` if the provider rejects the request.
    #[instrument(skip(self, password, metadata), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        metadata: &Value,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let url = endpoint(&self.base_url, &["auth", "v1", "signup"])?;
        let response = self
            .public_post(url)
            .json(&SignUpRequest {
                email,
                password: password.expose_secret(),
                data: metadata,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Sign in with e-mail and password.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::InvalidCredentials` if the pair is rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProviderSession, SupabaseError> {
        let mut url = endpoint(&self.base_url, &["auth", "v1", "token"])?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .public_post(url)
            .json(&Credentials {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(match api_error(response).await {
                SupabaseError::Api { status: 400, .. } => SupabaseError::InvalidCredentials,
                other => other,
            });
        }
        Ok(response.json().await?)
    }

    /// Send a password recovery e-mail that links back to `redirect_to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn send_recovery_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), SupabaseError> {
        let mut url = endpoint(&self.base_url, &["auth", "v1", "recover"])?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        let response = self
            .public_post(url)
            .json(&RecoverRequest { email })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// Exchange a recovery code from the reset e-mail for the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` with a 4xx status if the code is invalid
    /// or expired.
    #[instrument(skip_all)]
    pub async fn verify_recovery_code(&self, code: &str) -> Result<ProviderUser, SupabaseError> {
        let url = endpoint(&self.base_url, &["auth", "v1", "verify"])?;
        let response = self
            .public_post(url)
            .json(&VerifyRequest {
                kind: "recovery",
                token_hash: code,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let session: ProviderSession = response.json().await?;
        Ok(session.user)
    }

    /// Set a user's password through the administrative endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotConfigured` without a service-role key.
    #[instrument(skip(self, password))]
    pub async fn admin_update_password(
        &self,
        user_id: Uuid,
        password: &SecretString,
    ) -> Result<(), SupabaseError> {
        let key = self.service_key()?;
        let url = endpoint(
            &self.base_url,
            &["auth", "v1", "admin", "users", &user_id.to_string()],
        )?;

        let response = self
            .http
            .put(url)
            .header("apikey", key)
            .bearer_auth(key)
            .json(&PasswordUpdate {
                password: password.expose_secret(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// Delete a user through the administrative endpoint.
    ///
    /// Used to undo a sign-up whose local records could not be written.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotConfigured` without a service-role key.
    #[instrument(skip(self))]
    pub async fn admin_delete_user(&self, user_id: Uuid) -> Result<(), SupabaseError> {
        let key = self.service_key()?;
        let url = endpoint(
            &self.base_url,
            &["auth", "v1", "admin", "users", &user_id.to_string()],
        )?;

        let response = self
            .http
            .delete(url)
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_outcome_with_session() {
        let json = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "user": {"id": "5f0c8a3e-58d4-4d43-9a43-0a3b0d0f6a11", "email": "a@b.co"}
        }"#;
        let outcome: SignUpOutcome = serde_json::from_str(json).unwrap();
        assert!(!outcome.requires_confirmation());
        assert_eq!(outcome.user().email.as_deref(), Some("a@b.co"));
    }

    #[test]
    fn test_sign_up_outcome_pending_confirmation() {
        let json = r#"{
            "id": "5f0c8a3e-58d4-4d43-9a43-0a3b0d0f6a11",
            "email": "a@b.co",
            "confirmation_sent_at": "2026-03-01T10:00:00Z"
        }"#;
        let outcome: SignUpOutcome = serde_json::from_str(json).unwrap();
        assert!(outcome.requires_confirmation());
    }

    #[tokio::test]
    async fn test_admin_calls_require_service_key() {
        let config = SupabaseConfig {
            url: Url::parse("http://127.0.0.1:1").unwrap(),
            anon_key: "anon".to_string(),
            service_role_key: None,
            storage_bucket: "marketplace".to_string(),
        };
        let client = AuthClient::new(reqwest::Client::new(), &config);
        assert!(!client.has_service_key());

        let err = client.admin_delete_user(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, SupabaseError::NotConfigured(_)));
    }
}
