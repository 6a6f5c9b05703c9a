//! Cart repository.
//!
//! One row per (user, product). Quantities are always positive: setting a
//! quantity of zero or less deletes the row.

use sqlx::PgPool;

use medsupply_core::{ProductId, ProfileId};

use super::RepositoryError;
use crate::models::CartLine;

/// Largest quantity a single cart line can hold.
pub const MAX_LINE_QUANTITY: i32 = i32::MAX;

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Lines in a user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: ProfileId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id, ci.quantity, ci.created_at,
                   p.id AS product_id, p.name AS product_name, p.price, p.image_url,
                   p.stock_count, p.in_stock, p.supplier_id,
                   s.business_name AS supplier_name
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            JOIN suppliers s ON s.id = p.supplier_id
            WHERE ci.user_id = $1
            ORDER BY ci.created_at, ci.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Add `quantity` units, merging into an existing line for the product.
    ///
    /// Returns the line's new quantity, or `None` when the merged quantity
    /// would exceed `MAX_LINE_QUANTITY` and the line is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        user_id: ProfileId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Option<i32>, RepositoryError> {
        sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            WHERE cart_items.quantity <= $4 - EXCLUDED.quantity
            RETURNING quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(MAX_LINE_QUANTITY)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })
    }

    /// Set a line's quantity. A quantity of zero or less removes the line.
    ///
    /// Returns whether a line was changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        user_id: ProfileId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        if quantity <= 0 {
            return self.remove(user_id, product_id).await;
        }

        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3, updated_at = NOW() \
             WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a product from the cart. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: ProfileId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty a user's cart. Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: ProfileId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
