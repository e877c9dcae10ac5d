//! Order Desk Core - Shared types library.
//!
//! This crate provides common types used across all Order Desk components:
//! - `web` - Sales order pages backed by the ERP and the local cache
//! - `cli` - Command-line tools for migrations, credentials and refreshes
//!
//! # Architecture
//!
//! The core crate contains only types and static data - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, order types, order statuses and the order key
//! - [`options`] - Static drop-down data for the order forms

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod options;
pub mod types;

pub use types::*;
