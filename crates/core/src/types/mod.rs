//! Core types for MedSupply.
//!
//! This module provides type-safe wrappers for marketplace domain concepts.

pub mod email;
pub mod id;
pub mod kra_pin;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use kra_pin::{KraPin, KraPinError};
pub use price::{Price, PriceError};
pub use status::*;
