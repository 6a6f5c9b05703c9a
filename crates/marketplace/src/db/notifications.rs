//! Notification preference repository.

use sqlx::PgPool;

use medsupply_core::ProfileId;

use super::RepositoryError;
use crate::models::{NotificationPreferences, NotificationUpdate};

/// Repository for notification preferences.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Stored preferences for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: ProfileId,
    ) -> Result<Option<NotificationPreferences>, RepositoryError> {
        let prefs = sqlx::query_as::<_, NotificationPreferences>(
            r"
            SELECT user_id, email_order_updates, email_verification_updates,
                   email_promotions, sms_order_updates
            FROM notification_preferences
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(prefs)
    }

    /// Apply a partial update, creating the row with defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: ProfileId,
        update: &NotificationUpdate,
    ) -> Result<NotificationPreferences, RepositoryError> {
        let prefs = sqlx::query_as::<_, NotificationPreferences>(
            r"
            INSERT INTO notification_preferences (
                user_id, email_order_updates, email_verification_updates,
                email_promotions, sms_order_updates
            )
            VALUES ($1, COALESCE($2, TRUE), COALESCE($3, TRUE),
                    COALESCE($4, FALSE), COALESCE($5, FALSE))
            ON CONFLICT (user_id) DO UPDATE SET
                email_order_updates =
                    COALESCE($2, notification_preferences.email_order_updates),
                email_verification_updates =
                    COALESCE($3, notification_preferences.email_verification_updates),
                email_promotions = COALESCE($4, notification_preferences.email_promotions),
                sms_order_updates = COALESCE($5, notification_preferences.sms_order_updates),
                updated_at = NOW()
            RETURNING user_id, email_order_updates, email_verification_updates,
                      email_promotions, sms_order_updates
            ",
        )
        .bind(user_id)
        .bind(update.email_order_updates)
        .bind(update.email_verification_updates)
        .bind(update.email_promotions)
        .bind(update.sms_order_updates)
        .fetch_one(self.pool)
        .await?;
        Ok(prefs)
    }
}
