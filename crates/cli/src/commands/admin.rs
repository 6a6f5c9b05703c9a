//! Admin bootstrap.
//!
//! The API has no role-change endpoint and sign-up refuses the admin role, so
//! this is the only way to create an admin.
//!
//! # Usage
//!
//! ```bash
//! # The user signs up as a buyer first, then:
//! ms-cli admin grant --user 6a1f0e4c-2b55-4c1e-9a0e-3d1c8e2f7b90
//! ```

use medsupply_core::{ProfileId, Role, SupplierVerificationStatus};
use uuid::Uuid;

use super::{CommandError, connect};

/// Give an existing profile the admin role.
///
/// Admins are treated as verified. Supplier profiles are refused: their
/// business records would be left orphaned.
///
/// # Errors
///
/// Returns `CommandError::NotFound` if no profile has this ID and
/// `CommandError::Invalid` if the profile belongs to a supplier.
pub async fn grant(user: Uuid) -> Result<(), CommandError> {
    let id = ProfileId::new(user);
    let pool = connect().await?;

    let current = sqlx::query_scalar::<_, Role>("SELECT role FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("profile {id}")))?;

    match current {
        Role::Admin => {
            tracing::info!(user_id = %id, "Profile is already an admin");
            return Ok(());
        }
        Role::Supplier => {
            return Err(CommandError::Invalid(format!(
                "profile {id} is a supplier; create a separate account for the admin"
            )));
        }
        Role::Buyer => {}
    }

    sqlx::query(
        "UPDATE profiles SET role = $2, verification_status = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(Role::Admin)
    .bind(SupplierVerificationStatus::Verified)
    .execute(&pool)
    .await?;

    tracing::info!(user_id = %id, "Admin role granted");
    Ok(())
}
