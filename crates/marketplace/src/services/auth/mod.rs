//! Authentication service.
//!
//! Credentials live with the auth provider; the marketplace keeps the
//! profile rows and its own cookie session. Sign-up therefore spans two
//! systems: the provider user is created first, then the database rows in
//! one transaction, and the provider user is deleted again if that
//! transaction fails.

mod error;

pub use error::AuthError;

use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use medsupply_core::{Email, KraPin, ProfileId, Role};

use crate::db::{ProfileRepository, RepositoryError};
use crate::models::{CurrentUser, NewProfile, NewSupplier, Profile, Supplier};
use crate::supabase::{AuthClient, SupabaseError};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Sign-up request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "organizationName")]
    pub organization_name: Option<String>,
    #[serde(alias = "organizationType")]
    pub organization_type: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub department: Option<String>,
    #[serde(alias = "businessName")]
    pub business_name: Option<String>,
    #[serde(alias = "kraPin")]
    pub kra_pin: Option<String>,
    #[serde(alias = "businessRegistrationNumber")]
    pub business_registration_number: Option<String>,
    #[serde(alias = "businessAddress")]
    pub business_address: Option<String>,
    #[serde(alias = "businessDescription")]
    pub business_description: Option<String>,
}

/// Outcome of a successful sign-up.
#[derive(Debug)]
pub struct Registered {
    pub profile: Profile,
    pub supplier: Option<Supplier>,
    /// Set when the provider signed the user in straight away.
    pub session_user: Option<CurrentUser>,
    pub requires_confirmation: bool,
}

/// Authentication service.
pub struct AuthService<'a> {
    profiles: ProfileRepository<'a>,
    client: &'a AuthClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, client: &'a AuthClient) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
            client,
        }
    }

    /// Register a buyer or supplier.
    ///
    /// # Errors
    ///
    /// Returns a validation variant (`InvalidEmail`, `WeakPassword`,
    /// `MissingField`, `RoleNotAllowed`, `InvalidKraPin`) for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AuthError::Provider` or `AuthError::Repository` if a backend
    /// call fails.
    pub async fn register(&self, request: Registration) -> Result<Registered, AuthError> {
        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;

        let role_text = non_blank(request.role).ok_or(AuthError::MissingField("role"))?;
        let role: Role = role_text
            .parse()
            .map_err(|_| AuthError::RoleNotAllowed(role_text.clone()))?;
        if !role.is_self_service() {
            return Err(AuthError::RoleNotAllowed(role_text));
        }

        let full_name = non_blank(request.full_name).ok_or(AuthError::MissingField("full_name"))?;

        let supplier = if role == Role::Supplier {
            let business_name = non_blank(request.business_name)
                .ok_or(AuthError::MissingField("business_name"))?;
            let kra_pin = non_blank(request.kra_pin).ok_or(AuthError::MissingField("kra_pin"))?;
            Some(NewSupplier {
                business_name,
                kra_pin: KraPin::parse(&kra_pin)?.to_string(),
                business_registration_number: non_blank(request.business_registration_number),
                business_address: non_blank(request.business_address),
                business_description: non_blank(request.business_description),
            })
        } else {
            None
        };

        let metadata = json!({ "full_name": full_name, "role": role });
        let password = SecretString::from(request.password);
        let outcome = self
            .client
            .sign_up(email.as_str(), &password, &metadata)
            .await
            .map_err(provider_error)?;

        let user_id = ProfileId::new(outcome.user().id);
        let new_profile = NewProfile {
            id: user_id,
            email: email.as_str().to_owned(),
            role,
            full_name,
            phone: non_blank(request.phone),
            organization_name: non_blank(request.organization_name),
            organization_type: non_blank(request.organization_type),
            city: non_blank(request.city),
            county: non_blank(request.county),
            department: non_blank(request.department),
        };

        let (profile, supplier) = match self
            .profiles
            .register(&new_profile, supplier.as_ref())
            .await
        {
            Ok(created) => created,
            // A conflicting profile belongs to an existing account; leave its
            // provider user alone.
            Err(RepositoryError::Conflict(_)) => return Err(AuthError::UserAlreadyExists),
            Err(err) => {
                self.compensate(user_id).await;
                return Err(AuthError::Repository(err));
            }
        };

        let requires_confirmation = outcome.requires_confirmation();
        let session_user = (!requires_confirmation).then(|| CurrentUser {
            id: profile.id,
            email,
        });

        Ok(Registered {
            profile,
            supplier,
            session_user,
            requires_confirmation,
        })
    }

    /// Remove a provider user whose profile could not be written.
    async fn compensate(&self, user_id: ProfileId) {
        if !self.client.has_service_key() {
            tracing::warn!(user_id = %user_id, "Profile write failed; provider user left without profile");
            return;
        }
        if let Err(e) = self.client.admin_delete_user(user_id.as_uuid()).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to delete provider user after profile write failed");
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the provider rejects the
    /// pair, `AuthError::ProfileMissing` if the user has no profile.
    pub async fn login(
        &self,
        email: &str,
        password: String,
    ) -> Result<(CurrentUser, Profile), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self
            .client
            .sign_in_with_password(email.as_str(), &SecretString::from(password))
            .await
            .map_err(provider_error)?;

        let id = ProfileId::new(session.user.id);
        let profile = self
            .profiles
            .get_by_id(id)
            .await?
            .ok_or(AuthError::ProfileMissing)?;

        Ok((CurrentUser { id, email }, profile))
    }

    /// Send a recovery e-mail.
    ///
    /// Provider failures are logged, not returned, so callers cannot tell
    /// whether the address has an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address is malformed.
    pub async fn forgot_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        if let Err(e) = self
            .client
            .send_recovery_email(email.as_str(), redirect_to)
            .await
        {
            tracing::warn!(error = %e, "Recovery e-mail request failed");
        }
        Ok(())
    }

    /// Set a new password using a recovery code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider(NotConfigured)` if no service key is set,
    /// `AuthError::MissingField` or `AuthError::WeakPassword` for bad input,
    /// and `AuthError::InvalidResetCode` if the provider rejects the code.
    pub async fn reset_password(
        &self,
        code: Option<String>,
        password: Option<String>,
    ) -> Result<(), AuthError> {
        if !self.client.has_service_key() {
            return Err(SupabaseError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY").into());
        }

        let code = non_blank(code).ok_or(AuthError::MissingField("code"))?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::MissingField("password"))?;
        validate_password(&password)?;

        let user = self
            .client
            .verify_recovery_code(&code)
            .await
            .map_err(|e| {
                if e.is_client_error() {
                    AuthError::InvalidResetCode
                } else {
                    AuthError::Provider(e)
                }
            })?;

        self.client
            .admin_update_password(user.id, &SecretString::from(password))
            .await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }
}

/// Validate password strength.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn provider_error(err: SupabaseError) -> AuthError {
    match err {
        SupabaseError::InvalidCredentials => AuthError::InvalidCredentials,
        SupabaseError::UserAlreadyExists => AuthError::UserAlreadyExists,
        other => AuthError::Provider(other),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
