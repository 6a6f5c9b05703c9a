//! Profiles, suppliers and notification preferences.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medsupply_core::{ProfileId, Role, SupplierId, SupplierVerificationStatus};

/// Application profile of an auth-provider user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: ProfileId,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization_name: Option<String>,
    pub organization_type: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub department: Option<String>,
    pub avatar_url: Option<String>,
    pub verification_status: SupplierVerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Whether the profile has passed supplier verification (always true for
    /// buyers and admins).
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verification_status == SupplierVerificationStatus::Verified
    }
}

/// Fields written when a profile is created at sign-up.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: ProfileId,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    pub phone: Option<String>,
    pub organization_name: Option<String>,
    pub organization_type: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub department: Option<String>,
}

/// Self-service profile edit.
///
/// Only these fields can be changed by the owner; anything else in the
/// request body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization_name: Option<String>,
    pub organization_type: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub department: Option<String>,
}

impl ProfileUpdate {
    /// Whether at least one allow-listed field was provided.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.organization_name.is_none()
            && self.organization_type.is_none()
            && self.city.is_none()
            && self.county.is_none()
            && self.department.is_none()
    }
}

/// Business details of a supplier profile.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Supplier {
    pub id: SupplierId,
    pub profile_id: ProfileId,
    pub business_name: String,
    pub kra_pin: String,
    pub business_registration_number: Option<String>,
    pub business_address: Option<String>,
    pub business_description: Option<String>,
    pub verification_status: SupplierVerificationStatus,
    pub rating: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written when a supplier registers.
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub business_name: String,
    pub kra_pin: String,
    pub business_registration_number: Option<String>,
    pub business_address: Option<String>,
    pub business_description: Option<String>,
}

/// Public supplier directory entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SupplierListing {
    pub id: SupplierId,
    pub business_name: String,
    pub business_description: Option<String>,
    pub business_address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub verification_status: SupplierVerificationStatus,
    pub rating: Decimal,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Per-user notification switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NotificationPreferences {
    pub user_id: ProfileId,
    pub email_order_updates: bool,
    pub email_verification_updates: bool,
    pub email_promotions: bool,
    pub sms_order_updates: bool,
}

impl NotificationPreferences {
    /// Preferences used for new accounts and whenever the stored row cannot
    /// be read.
    #[must_use]
    pub const fn defaults(user_id: ProfileId) -> Self {
        Self {
            user_id,
            email_order_updates: true,
            email_verification_updates: true,
            email_promotions: false,
            sms_order_updates: false,
        }
    }
}

/// Partial update of notification preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationUpdate {
    pub email_order_updates: Option<bool>,
    pub email_verification_updates: Option<bool>,
    pub email_promotions: Option<bool>,
    pub sms_order_updates: Option<bool>,
}

impl NotificationUpdate {
    /// Whether no switch was provided.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email_order_updates.is_none()
            && self.email_verification_updates.is_none()
            && self.email_promotions.is_none()
            && self.sms_order_updates.is_none()
    }
}
