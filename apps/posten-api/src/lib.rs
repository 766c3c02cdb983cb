//! Posten delivery-days API library
//!
//! Proxies the posten.no delivery-days service with a token fallback and a
//! day-scoped cache, and serves raw, text and relative views of the dates.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
