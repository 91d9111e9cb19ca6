//! Gateway WebSocket Sessions
//!
//! One WebSocket connection from the media gateway is one voice session.
//!
//! - `protocol`: The JSON message format exchanged with the gateway.
//! - `gateway`: Transport and speech pipeline implementations over the socket.
//! - `session`: The connection lifecycle, from upgrade to disconnect.

pub mod gateway;
pub mod protocol;
pub mod session;

pub use session::ws_handler;
