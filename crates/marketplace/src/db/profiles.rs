//! Profile repository.
//!
//! Profiles share their UUID with the auth provider's user record. Sign-up
//! writes the profile, its default notification preferences and (for
//! suppliers) the supplier row and first verification in one transaction.

use sqlx::PgPool;

use medsupply_core::{ProfileId, Role, VerificationStatus};

use super::RepositoryError;
use crate::models::{NewProfile, NewSupplier, Profile, ProfileUpdate, Supplier};

const PROFILE_COLUMNS: &str = "id, email, role, full_name, phone, address, organization_name, \
     organization_type, city, county, department, avatar_url, verification_status, \
     created_at, updated_at";

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(profile)
    }

    /// Create the rows for a newly signed-up user.
    ///
    /// For suppliers this also creates the `suppliers` row and a `pending`
    /// verification. Either everything is written or nothing is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a profile with this ID or email
    /// already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn register(
        &self,
        profile: &NewProfile,
        supplier: Option<&NewSupplier>,
    ) -> Result<(Profile, Option<Supplier>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO profiles (id, email, role, full_name, phone, organization_name, \
             organization_type, city, county, department, verification_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Profile>(&sql)
            .bind(profile.id)
            .bind(&profile.email)
            .bind(profile.role)
            .bind(&profile.full_name)
            .bind(&profile.phone)
            .bind(&profile.organization_name)
            .bind(&profile.organization_type)
            .bind(&profile.city)
            .bind(&profile.county)
            .bind(&profile.department)
            .bind(profile.role.initial_verification_status())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::on_unique_violation(e, "profile already exists"))?;

        sqlx::query("INSERT INTO notification_preferences (user_id) VALUES ($1)")
            .bind(created.id)
            .execute(&mut *tx)
            .await?;

        let supplier = match (profile.role, supplier) {
            (Role::Supplier, Some(details)) => {
                let row = sqlx::query_as::<_, Supplier>(
                    r"
                    INSERT INTO suppliers (profile_id, business_name, kra_pin,
                        business_registration_number, business_address, business_description,
                        verification_status)
                    VALUES ($1, $2, $3, $4, $5, $6, 'pending')
                    RETURNING id, profile_id, business_name, kra_pin,
                              business_registration_number, business_address,
                              business_description, verification_status, rating,
                              created_at, updated_at
                    ",
                )
                .bind(created.id)
                .bind(&details.business_name)
                .bind(&details.kra_pin)
                .bind(&details.business_registration_number)
                .bind(&details.business_address)
                .bind(&details.business_description)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query("INSERT INTO verifications (profile_id, status) VALUES ($1, $2)")
                    .bind(created.id)
                    .bind(VerificationStatus::Pending)
                    .execute(&mut *tx)
                    .await?;

                Some(row)
            }
            _ => None,
        };

        tx.commit().await?;

        tracing::info!(profile_id = %created.id, role = %created.role, "Profile registered");
        Ok((created, supplier))
    }

    /// Apply a self-service edit. Absent fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ProfileId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let sql = format!(
            "UPDATE profiles SET \
                full_name = COALESCE($2, full_name), \
                phone = COALESCE($3, phone), \
                address = COALESCE($4, address), \
                organization_name = COALESCE($5, organization_name), \
                organization_type = COALESCE($6, organization_type), \
                city = COALESCE($7, city), \
                county = COALESCE($8, county), \
                department = COALESCE($9, department), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(&update.full_name)
            .bind(&update.phone)
            .bind(&update.address)
            .bind(&update.organization_name)
            .bind(&update.organization_type)
            .bind(&update.city)
            .bind(&update.county)
            .bind(&update.department)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Store a new avatar URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_avatar_url(&self, id: ProfileId, url: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE profiles SET avatar_url = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(url)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
