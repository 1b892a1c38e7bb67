//! KiaKart Vendor Backend Library
//!
//! Vendor authentication plus the vendor-scoped product and order API.
//! The binary in `main.rs` only wires configuration into these modules.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod middleware;
pub mod uploads;
