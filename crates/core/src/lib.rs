//! MedSupply Core - Shared domain types.
//!
//! This crate provides the types shared by every MedSupply component:
//! - `marketplace` - The JSON API serving buyers, suppliers and admins
//! - `cli` - Command-line tools for migrations, seeding and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. The lifecycle rules for orders and supplier
//! verification live here so they can be checked without a database.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, roles and statuses, prices, emails and tax PINs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
