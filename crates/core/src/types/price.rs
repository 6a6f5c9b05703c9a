//! Decimal price in Kenyan shillings.
//!
//! All money in the marketplace is KES held as `rust_decimal::Decimal` with two
//! fractional digits. Floating point is never used for amounts.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// Amount has more than two decimal places.
    #[error("price must have at most 2 decimal places")]
    TooPrecise,
    /// Amount does not fit a `NUMERIC(12, 2)` column.
    #[error("amount cannot exceed {}", Price::MAX.0)]
    TooLarge,
}

/// A non-negative amount in KES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// ISO 4217 code for every amount in the marketplace.
    pub const CURRENCY: &'static str = "KES";

    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount storable in the `NUMERIC(12, 2)` money columns.
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Validate and wrap an amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has more than two
    /// decimal places, or exceeds [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for a negative quantity and
    /// `PriceError::TooLarge` if the result exceeds [`Price::MAX`].
    pub fn times(&self, quantity: i32) -> Result<Self, PriceError> {
        if quantity < 0 {
            return Err(PriceError::Negative);
        }
        let amount = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::TooLarge)?;
        Self::new(amount)
    }

    /// Sum of two amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the sum exceeds [`Price::MAX`].
    pub fn checked_add(&self, other: Self) -> Result<Self, PriceError> {
        let amount = self.0.checked_add(other.0).ok_or(PriceError::TooLarge)?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", Self::CURRENCY, self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn kes(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).expect("valid price")
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 0)), Err(PriceError::Negative));
    }

    #[test]
    fn test_rejects_sub_cent_precision() {
        assert_eq!(
            Price::new(Decimal::new(1001, 3)),
            Err(PriceError::TooPrecise)
        );
        // Trailing zeros are not extra precision.
        assert!(Price::new(Decimal::new(1000, 3)).is_ok());
    }

    #[test]
    fn test_rejects_amounts_beyond_column_range() {
        assert_eq!(Price::MAX.amount(), Decimal::new(999_999_999_999, 2));
        assert!(Price::new(Decimal::new(999_999_999_999, 2)).is_ok());
        assert_eq!(
            Price::new(Decimal::new(100_000_000_000, 0)),
            Err(PriceError::TooLarge)
        );
        assert_eq!(
            Price::new(Decimal::new(1_000_000_000_000, 2)),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_line_totals_add_up() {
        let total = Price::ZERO
            .checked_add(kes(10_000).times(2).unwrap())
            .unwrap()
            .checked_add(kes(5_000).times(1).unwrap())
            .unwrap();
        assert_eq!(total, kes(25_000));
    }

    #[test]
    fn test_totals_past_max_are_rejected() {
        assert_eq!(Price::MAX.times(2), Err(PriceError::TooLarge));
        assert_eq!(Price::MAX.checked_add(kes(1)), Err(PriceError::TooLarge));
        assert_eq!(kes(100).times(-1), Err(PriceError::Negative));
        assert_eq!(Price::MAX.times(1), Ok(Price::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(kes(123_450).to_string(), "KES 1234.50");
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Price>("\"12.50\"").is_ok());
        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }
}
