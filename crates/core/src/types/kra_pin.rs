//! Kenya Revenue Authority PIN.
//!
//! Suppliers register with their KRA tax PIN: eleven characters, a letter,
//! nine digits and a closing check letter (e.g. `P051234567Q`). Individuals'
//! PINs start with `A`, companies' with `P`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`KraPin`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KraPinError {
    #[error("KRA PIN must be exactly 11 characters")]
    Length,
    #[error("KRA PIN must be a letter, 9 digits and a letter")]
    Format,
}

/// A syntactically valid KRA PIN, stored uppercase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct KraPin(String);

impl KraPin {
    const LENGTH: usize = 11;

    /// Parse a PIN, accepting lowercase input and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the PIN has the wrong length or shape.
    pub fn parse(s: &str) -> Result<Self, KraPinError> {
        let pin = s.trim().to_ascii_uppercase();
        if pin.len() != Self::LENGTH || !pin.is_ascii() {
            return Err(KraPinError::Length);
        }

        let bytes = pin.as_bytes();
        let (Some(first), Some(last), Some(digits)) =
            (bytes.first(), bytes.last(), bytes.get(1..Self::LENGTH - 1))
        else {
            return Err(KraPinError::Format);
        };

        if !first.is_ascii_alphabetic()
            || !last.is_ascii_alphabetic()
            || !digits.iter().all(u8::is_ascii_digit)
        {
            return Err(KraPinError::Format);
        }

        Ok(Self(pin))
    }

    /// Returns the PIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the PIN belongs to a company rather than an individual.
    #[must_use]
    pub fn is_company(&self) -> bool {
        self.0.starts_with('P')
    }
}

impl TryFrom<String> for KraPin {
    type Error = KraPinError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KraPin> for String {
    fn from(pin: KraPin) -> Self {
        pin.0
    }
}

impl fmt::Display for KraPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
