//! Business logic services for the marketplace.
//!
//! # Services
//!
//! - `auth` - Sign-up, login and password recovery against the auth provider
//! - `checkout` - Pricing, stock checks and order placement
//! - `uploads` - Multipart file intake and object storage writes

pub mod auth;
pub mod checkout;
pub mod uploads;

pub use auth::{AuthError, AuthService, Registered, Registration};
pub use checkout::{CheckoutError, place_orders};
pub use uploads::{UploadError, UploadForm, UploadKind};
