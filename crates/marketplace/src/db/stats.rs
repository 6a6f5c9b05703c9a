//! Dashboard aggregates.
//!
//! Each counter is its own query; they run concurrently and are not
//! snapshot-consistent with one another.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use medsupply_core::SupplierId;

use super::RepositoryError;
use super::catalog::LOW_STOCK_THRESHOLD;
use crate::models::{
    ActivityEvent, ActivityKind, AdminStats, SupplierStats, merge_activity,
    stats::ACTIVITY_FEED_LEN,
};

type EventRow = (Uuid, String, DateTime<Utc>);

/// Repository for dashboard statistics.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Marketplace-wide counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn admin(&self) -> Result<AdminStats, RepositoryError> {
        let profiles = sqlx::query_as::<_, (i64, i64, i64)>(
            r"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE role = 'buyer'),
                   COUNT(*) FILTER (WHERE role = 'supplier')
            FROM profiles
            ",
        )
        .fetch_one(self.pool);
        let verified = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM suppliers WHERE verification_status = 'verified'",
        )
        .fetch_one(self.pool);
        let pending_reviews = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM verifications WHERE status = 'pending'",
        )
        .fetch_one(self.pool);
        let products = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool);
        let orders = sqlx::query_as::<_, (i64, i64, Decimal)>(
            r"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'pending'),
                   COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'paid'), 0)
            FROM orders
            ",
        )
        .fetch_one(self.pool);

        let (
            (total_users, total_buyers, total_suppliers),
            verified_suppliers,
            pending_verifications,
            total_products,
            (total_orders, pending_orders, total_revenue),
        ) = tokio::try_join!(profiles, verified, pending_reviews, products, orders)?;

        Ok(AdminStats {
            total_users,
            total_buyers,
            total_suppliers,
            verified_suppliers,
            pending_verifications,
            total_products,
            total_orders,
            pending_orders,
            total_revenue,
        })
    }

    /// Counters for one supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn supplier(&self, supplier_id: SupplierId) -> Result<SupplierStats, RepositoryError> {
        let products = sqlx::query_as::<_, (i64, i64, i64)>(
            r"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE in_stock),
                   COUNT(*) FILTER (WHERE stock_count <= $2)
            FROM products
            WHERE supplier_id = $1
            ",
        )
        .bind(supplier_id)
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool);
        let orders = sqlx::query_as::<_, (i64, i64, Decimal)>(
            r"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'pending'),
                   COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'paid'), 0)
            FROM orders
            WHERE supplier_id = $1
            ",
        )
        .bind(supplier_id)
        .fetch_one(self.pool);

        let (
            (total_products, in_stock_products, low_stock_products),
            (total_orders, pending_orders, total_revenue),
        ) = tokio::try_join!(products, orders)?;

        Ok(SupplierStats {
            total_products,
            in_stock_products,
            low_stock_products,
            total_orders,
            pending_orders,
            total_revenue,
        })
    }

    /// Latest orders, registrations and verification decisions, merged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn recent_activity(&self) -> Result<Vec<ActivityEvent>, RepositoryError> {
        let limit = i64::try_from(ACTIVITY_FEED_LEN).unwrap_or(i64::MAX);

        let orders = sqlx::query_as::<_, EventRow>(
            r"
            SELECT o.id,
                   'Order ' || o.order_number || ' placed by ' || COALESCE(b.full_name, b.email),
                   o.created_at
            FROM orders o
            JOIN profiles b ON b.id = o.buyer_id
            ORDER BY o.created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool);
        let registrations = sqlx::query_as::<_, EventRow>(
            r"
            SELECT id,
                   COALESCE(full_name, email) || ' registered as ' || role::text,
                   created_at
            FROM profiles
            ORDER BY created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool);
        let decisions = sqlx::query_as::<_, EventRow>(
            r"
            SELECT v.id,
                   'Verification for ' || COALESCE(s.business_name, p.email) || ' '
                       || v.status::text,
                   v.reviewed_at
            FROM verifications v
            JOIN profiles p ON p.id = v.profile_id
            LEFT JOIN suppliers s ON s.profile_id = v.profile_id
            WHERE v.reviewed_at IS NOT NULL
            ORDER BY v.reviewed_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool);

        let (orders, registrations, decisions) =
            tokio::try_join!(orders, registrations, decisions)?;

        let to_events = |kind: ActivityKind, rows: Vec<EventRow>| -> Vec<ActivityEvent> {
            rows.into_iter()
                .map(|(subject_id, description, occurred_at)| ActivityEvent {
                    kind,
                    subject_id,
                    description,
                    occurred_at,
                })
                .collect()
        };

        Ok(merge_activity([
            to_events(ActivityKind::Order, orders),
            to_events(ActivityKind::Registration, registrations),
            to_events(ActivityKind::Verification, decisions),
        ]))
    }
}
