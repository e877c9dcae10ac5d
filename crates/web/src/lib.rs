//! Order Desk web library.
//!
//! Manages ERP site credentials and the sales orders of the selected site.
//! The ERP is the system of record; orders are mirrored into a local
//! `PostgreSQL` cache so lists and filters do not need a round trip.
//!
//! The library form exists so the CLI can reuse the repositories and the
//! sync service, and so handlers can be tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod erp;
pub mod error;
pub mod filters;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
