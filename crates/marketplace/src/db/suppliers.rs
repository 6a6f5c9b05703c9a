//! Supplier repository.

use sqlx::PgPool;

use medsupply_core::ProfileId;

use super::RepositoryError;
use crate::models::{Supplier, SupplierListing};

/// Repository for supplier database operations.
pub struct SupplierRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupplierRepository<'a> {
    /// Create a new supplier repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the supplier row owned by a profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<Supplier>, RepositoryError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r"
            SELECT id, profile_id, business_name, kra_pin, business_registration_number,
                   business_address, business_description, verification_status, rating,
                   created_at, updated_at
            FROM suppliers
            WHERE profile_id = $1
            ",
        )
        .bind(profile_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(supplier)
    }

    /// List verified suppliers with their in-stock product counts, best rated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_verified(&self) -> Result<Vec<SupplierListing>, RepositoryError> {
        let suppliers = sqlx::query_as::<_, SupplierListing>(
            r"
            SELECT s.id, s.business_name, s.business_description, s.business_address,
                   p.city, p.county, s.verification_status, s.rating,
                   COUNT(pr.id) FILTER (WHERE pr.in_stock) AS product_count,
                   s.created_at
            FROM suppliers s
            JOIN profiles p ON p.id = s.profile_id
            LEFT JOIN products pr ON pr.supplier_id = s.id
            WHERE s.verification_status = 'verified'
            GROUP BY s.id, p.city, p.county
            ORDER BY s.rating DESC, s.business_name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(suppliers)
    }
}
