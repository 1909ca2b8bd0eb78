//! Core traits for the DNS sync system
//!
//! - [`DnsApi`]: Domain operations against a DNS provider's REST API

pub mod dns_api;

pub use dns_api::{AuthToken, DnsApi, Record, Zone};
