//! Roles and lifecycle statuses.
//!
//! Each enum mirrors a Postgres enum type created by the marketplace
//! migrations, and serializes to the same lowercase strings the API exposes.
//!
//! Two of them carry lifecycle rules:
//!
//! ```text
//! Order:         pending -> confirmed -> processing -> shipped -> delivered
//!                   \            \             \
//!                    +------------+-------------+--> cancelled
//!
//! Verification:  pending -> approved | rejected   (both terminal)
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct StatusParseError {
    /// Which enum was being parsed (e.g. "order status").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl StatusParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Implements `Display`/`FromStr` over a fixed string table.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire/database spelling of this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StatusParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(StatusParseError::new($kind, s)),
                }
            }
        }
    };
}

/// Application role stored on a profile.
///
/// Fixed at sign-up; there is no endpoint that changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Hospitals, clinics and pharmacies purchasing supplies.
    Buyer,
    /// Businesses listing products.
    Supplier,
    /// Marketplace operators.
    Admin,
}

string_enum!(Role, "role", {
    Buyer => "buyer",
    Supplier => "supplier",
    Admin => "admin",
});

impl Role {
    /// Roles that may be chosen at self-service sign-up.
    #[must_use]
    pub const fn is_self_service(&self) -> bool {
        matches!(self, Self::Buyer | Self::Supplier)
    }

    /// Initial `verification_status` for a freshly registered profile.
    ///
    /// Only suppliers go through document verification.
    #[must_use]
    pub const fn initial_verification_status(&self) -> SupplierVerificationStatus {
        match self {
            Self::Supplier => SupplierVerificationStatus::Pending,
            Self::Buyer | Self::Admin => SupplierVerificationStatus::Verified,
        }
    }
}

/// Verification standing of a profile / supplier business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "supplier_verification_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SupplierVerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

string_enum!(SupplierVerificationStatus, "supplier verification status", {
    Pending => "pending",
    Verified => "verified",
    Rejected => "rejected",
});

/// Status of a single verification review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "verification_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

string_enum!(VerificationStatus, "verification status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl VerificationStatus {
    /// Whether a review in this state has been decided.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Whether an admin may move a review from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved | Self::Rejected)
        )
    }

    /// The profile/supplier standing implied by a decided review.
    #[must_use]
    pub const fn cascaded_supplier_status(&self) -> Option<SupplierVerificationStatus> {
        match self {
            Self::Approved => Some(SupplierVerificationStatus::Verified),
            Self::Rejected => Some(SupplierVerificationStatus::Rejected),
            Self::Pending => None,
        }
    }

    /// Normalize a rejection reason for this status.
    ///
    /// The reason is kept only for `rejected`; every other status clears it.
    /// Blank reasons are treated as absent.
    #[must_use]
    pub fn reason_for(&self, reason: Option<String>) -> Option<String> {
        match self {
            Self::Rejected => reason
                .map(|r| r.trim().to_owned())
                .filter(|r| !r.is_empty()),
            Self::Pending | Self::Approved => None,
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the order may still be cancelled.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Processing)
    }

    /// The next forward step in the lifecycle, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Processing),
            Self::Processing => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }

    /// Whether moving from `self` to `to` is a legal lifecycle step.
    ///
    /// Re-applying the current status is allowed and treated as a no-op by
    /// callers.
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        if *self == to {
            return true;
        }
        if to == Self::Cancelled {
            return self.is_cancellable();
        }
        self.next() == Some(to)
    }
}

/// Payment status recorded on an order.
///
/// Payments are recorded, not processed, so any value may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(*role));
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_is_not_self_service() {
        assert!(Role::Buyer.is_self_service());
        assert!(Role::Supplier.is_self_service());
        assert!(!Role::Admin.is_self_service());
    }

    #[test]
    fn test_only_suppliers_start_pending() {
        assert_eq!(
            Role::Supplier.initial_verification_status(),
            SupplierVerificationStatus::Pending
        );
        assert_eq!(
            Role::Buyer.initial_verification_status(),
            SupplierVerificationStatus::Verified
        );
    }

    #[test]
    fn test_order_forward_path() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        for pair in path.windows(2) {
            if let [from, to] = pair {
                assert!(from.can_transition_to(*to), "{from} -> {to}");
                assert!(!to.can_transition_to(*from), "{to} -> {from}");
            }
        }
    }

    #[test]
    fn test_order_cannot_skip_steps() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_order_cancellation_window() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_order_same_status_is_allowed() {
        for status in OrderStatus::ALL {
            assert!(status.can_transition_to(*status));
        }
    }

    #[test]
    fn test_terminal_order_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_verification_decisions_only_from_pending() {
        let pending = VerificationStatus::Pending;
        assert!(pending.can_transition_to(VerificationStatus::Approved));
        assert!(pending.can_transition_to(VerificationStatus::Rejected));
        assert!(!pending.can_transition_to(VerificationStatus::Pending));
        assert!(!VerificationStatus::Approved.can_transition_to(VerificationStatus::Rejected));
        assert!(!VerificationStatus::Rejected.can_transition_to(VerificationStatus::Approved));
    }

    #[test]
    fn test_verification_cascade() {
        assert_eq!(
            VerificationStatus::Approved.cascaded_supplier_status(),
            Some(SupplierVerificationStatus::Verified)
        );
        assert_eq!(
            VerificationStatus::Rejected.cascaded_supplier_status(),
            Some(SupplierVerificationStatus::Rejected)
        );
        assert_eq!(VerificationStatus::Pending.cascaded_supplier_status(), None);
    }

    #[test]
    fn test_reason_kept_only_on_rejection() {
        let reason = Some("expired licence".to_string());
        assert_eq!(
            VerificationStatus::Rejected.reason_for(reason.clone()),
            Some("expired licence".to_string())
        );
        assert_eq!(VerificationStatus::Approved.reason_for(reason.clone()), None);
        assert_eq!(VerificationStatus::Pending.reason_for(reason), None);
        assert_eq!(
            VerificationStatus::Rejected.reason_for(Some("   ".to_string())),
            None
        );
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Processing).expect("serialize");
        assert_eq!(json, "\"processing\"");
        let parsed: PaymentStatus = serde_json::from_str("\"refunded\"").expect("deserialize");
        assert_eq!(parsed, PaymentStatus::Refunded);
        assert!(serde_json::from_str::<OrderStatus>("\"lost\"").is_err());
    }

    #[test]
    fn test_parse_error_names_kind() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: lost");
    }
}
