//! Dashboard aggregates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Number of events shown in the admin activity feed.
pub const ACTIVITY_FEED_LEN: usize = 10;

/// Marketplace-wide counters for admins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_buyers: i64,
    pub total_suppliers: i64,
    pub verified_suppliers: i64,
    pub pending_verifications: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Sum of paid order totals.
    pub total_revenue: Decimal,
}

/// Counters for one supplier's dashboard.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct SupplierStats {
    pub total_products: i64,
    pub in_stock_products: i64,
    pub low_stock_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_revenue: Decimal,
}

/// Kind of event in the admin activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Order,
    Registration,
    Verification,
}

/// One entry in the admin activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    /// ID of the order, profile or verification the event is about.
    pub subject_id: Uuid,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Merge per-source event lists into the newest `ACTIVITY_FEED_LEN` events.
#[must_use]
pub fn merge_activity(sources: impl IntoIterator<Item = Vec<ActivityEvent>>) -> Vec<ActivityEvent> {
    let mut events: Vec<ActivityEvent> = sources.into_iter().flatten().collect();
    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    events.truncate(ACTIVITY_FEED_LEN);
    events
}
