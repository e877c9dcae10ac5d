//! Core types for Order Desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order;
pub mod status;

pub use id::*;
pub use order::{OrderKeyError, OrderType, SalesOrderKey};
pub use status::OrderStatus;
