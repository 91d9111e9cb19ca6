//! Cadence Agent Library Crate
//!
//! The service side of the voice agent: configuration, catalog prewarm, the
//! liveness responder, and the gateway WebSocket that drives each session.
//! The `agent` binary is a thin wrapper around this library.

pub mod catalog_loader;
pub mod config;
pub mod liveness;
pub mod router;
pub mod state;
pub mod ws;
