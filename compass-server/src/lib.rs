//! HTTP surface for Compass: routing, CORS, rate limiting, and the
//! error-to-response mapping. The binary in `main.rs` wires configuration
//! into [`app::build_router`].

pub mod app;
pub mod cors;
pub mod error;
pub mod rate;
pub mod routes;
