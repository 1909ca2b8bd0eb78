// # LopDNS Provider
//
// This crate provides the LopDNS API v2 client used by the DNS sync agent.
//
// ## Responsibilities
//
// - Token lifecycle: request, validate, invalidate (`/auth/*`)
// - Zone and record listing (`/zones`, `/records/{zone}`)
// - Content updates of a single record (`PUT /records/{zone}`)
// - Record creation and deletion (`POST` / `DELETE /records/{zone}`)
//
// The client makes exactly one HTTP request per operation. It never retries,
// never caches records between calls and never spawns background tasks;
// scheduling and refresh decisions belong to `SyncRunner` in dnssync-core.
//
// ## Security Requirements
//
// - The client id and the token NEVER appear in logs or Debug output
// - The token is only sent in the `x-token` header
//
// ## API Reference
//
// - LopDNS API v2: https://api.lopdns.se/v2/docs

mod client;
mod config;
mod transport;

pub use client::LopDnsClient;
pub use config::LopDnsConfig;
pub use transport::{RestTransport, USER_AGENT};
