//! Server endpoints
//!
//! One [`ServerEndpoint`] per configured backend, owning at most one TCP
//! connection, its liveness state, and the 30-second quarantine applied when
//! the backend is marked dead.

pub mod connection;
pub mod server;

pub use connection::Connection;
pub use server::{ServerEndpoint, ServerSpec, DEFAULT_PORT, DEFAULT_WEIGHT};
