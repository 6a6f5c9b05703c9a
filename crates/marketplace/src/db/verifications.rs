//! Verification repository.
//!
//! A decision and its cascade onto the supplier's profile and business row
//! commit together or not at all.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use medsupply_core::{
    ProfileId, SupplierVerificationStatus, VerificationId, VerificationStatus,
};

use super::RepositoryError;
use crate::models::{DocumentRef, Verification, VerificationDocument, VerificationView};

const VERIFICATION_COLUMNS: &str =
    "id, profile_id, status, reason, reviewed_by, reviewed_at, created_at, updated_at";

const DOCUMENT_COLUMNS: &str =
    "id, verification_id, document_type, file_url, file_path, status, created_at";

/// Repository for verification database operations.
pub struct VerificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerificationRepository<'a> {
    /// Create a new verification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Review queue for admins, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<VerificationView>, RepositoryError> {
        let mut views = sqlx::query_as::<_, VerificationView>(
            r"
            SELECT v.id, v.profile_id, v.status, v.reason, v.reviewed_by, v.reviewed_at,
                   v.created_at, v.updated_at,
                   p.full_name, p.email, p.phone,
                   s.business_name, s.kra_pin, s.business_registration_number,
                   s.business_address,
                   s.verification_status AS supplier_status,
                   s.rating AS supplier_rating
            FROM verifications v
            JOIN profiles p ON p.id = v.profile_id
            LEFT JOIN suppliers s ON s.profile_id = v.profile_id
            WHERE ($1::verification_status IS NULL OR v.status = $1)
            ORDER BY v.created_at DESC, v.id
            ",
        )
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        if views.is_empty() {
            return Ok(views);
        }

        let ids: Vec<Uuid> = views
            .iter()
            .map(|v| v.verification.id.as_uuid())
            .collect();
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM verification_documents \
             WHERE verification_id = ANY($1) ORDER BY created_at, id"
        );
        let documents = sqlx::query_as::<_, VerificationDocument>(&sql)
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        let mut by_verification: HashMap<VerificationId, Vec<VerificationDocument>> =
            HashMap::new();
        for doc in documents {
            by_verification
                .entry(doc.verification_id)
                .or_default()
                .push(doc);
        }
        for view in &mut views {
            view.documents = by_verification
                .remove(&view.verification.id)
                .unwrap_or_default();
        }
        Ok(views)
    }

    /// Record an admin decision and cascade it to the supplier.
    ///
    /// The rejection reason is kept only when `status` is `rejected`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the verification does not exist.
    /// Returns `RepositoryError::Conflict` if it has already been decided.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn decide(
        &self,
        id: VerificationId,
        status: VerificationStatus,
        reason: Option<String>,
        reviewer: ProfileId,
    ) -> Result<Verification, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, VerificationStatus>(
            "SELECT status FROM verifications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(status) {
            return Err(RepositoryError::Conflict(format!(
                "verification is already {current}"
            )));
        }

        let sql = format!(
            "UPDATE verifications SET status = $2, reason = $3, reviewed_by = $4, \
                reviewed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {VERIFICATION_COLUMNS}"
        );
        let verification = sqlx::query_as::<_, Verification>(&sql)
            .bind(id)
            .bind(status)
            .bind(status.reason_for(reason))
            .bind(reviewer)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(cascade) = status.cascaded_supplier_status() {
            sqlx::query(
                "UPDATE profiles SET verification_status = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(verification.profile_id)
            .bind(cascade)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE suppliers SET verification_status = $2, updated_at = NOW() \
                 WHERE profile_id = $1",
            )
            .bind(verification.profile_id)
            .bind(cascade)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE verification_documents SET status = $2 WHERE verification_id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            verification_id = %id,
            profile_id = %verification.profile_id,
            status = %status,
            reviewer = %reviewer,
            "Verification decided"
        );
        Ok(verification)
    }

    /// Most recent verification of a profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<Verification>, RepositoryError> {
        let sql = format!(
            "SELECT {VERIFICATION_COLUMNS} FROM verifications \
             WHERE profile_id = $1 ORDER BY created_at DESC, id LIMIT 1"
        );
        let verification = sqlx::query_as::<_, Verification>(&sql)
            .bind(profile_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(verification)
    }

    /// Documents attached to a verification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn documents(
        &self,
        verification_id: VerificationId,
    ) -> Result<Vec<VerificationDocument>, RepositoryError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM verification_documents \
             WHERE verification_id = $1 ORDER BY created_at, id"
        );
        let documents = sqlx::query_as::<_, VerificationDocument>(&sql)
            .bind(verification_id)
            .fetch_all(self.pool)
            .await?;
        Ok(documents)
    }

    /// Open a new review for a supplier whose last one was rejected.
    ///
    /// Resets the profile and supplier standing to `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    /// Returns `RepositoryError::Conflict` if the supplier is already verified
    /// or a review is already pending.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn resubmit(
        &self,
        profile_id: ProfileId,
        documents: &[DocumentRef],
    ) -> Result<Verification, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let standing = sqlx::query_scalar::<_, SupplierVerificationStatus>(
            "SELECT verification_status FROM profiles WHERE id = $1 FOR UPDATE",
        )
        .bind(profile_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if standing == SupplierVerificationStatus::Verified {
            return Err(RepositoryError::Conflict(
                "supplier is already verified".to_owned(),
            ));
        }

        let sql = format!(
            "INSERT INTO verifications (profile_id, status) VALUES ($1, 'pending') \
             RETURNING {VERIFICATION_COLUMNS}"
        );
        let verification = sqlx::query_as::<_, Verification>(&sql)
            .bind(profile_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                RepositoryError::on_unique_violation(e, "a verification is already pending")
            })?;

        for doc in documents {
            sqlx::query(
                "INSERT INTO verification_documents \
                    (verification_id, document_type, file_url, file_path) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(verification.id)
            .bind(&doc.document_type)
            .bind(&doc.file_url)
            .bind(doc.file_path.as_deref().unwrap_or(&doc.file_url))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE profiles SET verification_status = 'pending', updated_at = NOW() WHERE id = $1",
        )
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE suppliers SET verification_status = 'pending', updated_at = NOW() \
             WHERE profile_id = $1",
        )
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(verification_id = %verification.id, profile_id = %profile_id, "Verification resubmitted");
        Ok(verification)
    }

    /// Attach an uploaded document to a verification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_document(
        &self,
        verification_id: VerificationId,
        document_type: &str,
        file_url: &str,
        file_path: &str,
    ) -> Result<VerificationDocument, RepositoryError> {
        let sql = format!(
            "INSERT INTO verification_documents \
                (verification_id, document_type, file_url, file_path) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let document = sqlx::query_as::<_, VerificationDocument>(&sql)
            .bind(verification_id)
            .bind(document_type)
            .bind(file_url)
            .bind(file_path)
            .fetch_one(self.pool)
            .await?;
        Ok(document)
    }
}
