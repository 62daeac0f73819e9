//! # mcdb
//!
//! Client library for MemcacheDB: a persistent key-value store speaking the
//! memcached ASCII protocol plus the `rget` range extension.
//!
//! The client addresses a pool of servers as a single logical cache:
//!
//! - Consistent-hash routing over a weighted continuum (CRC-32 keys, SHA-1
//!   ring positions), with minimal redistribution when membership changes
//! - One lazily-opened TCP connection per server, with per-I/O timeouts,
//!   liveness tracking, and a 30-second quarantine for dead backends
//! - Transparent failover: a failed request is retried once on the same
//!   server and once on a freshly routed fallback
//! - Single-key, multi-key, and lexicographic-range retrieval
//!
//! ## Example
//!
//! ```ignore
//! use mcdb::{Client, ClientConfig};
//!
//! let config = ClientConfig {
//!     namespace: Some("my_app".to_string()),
//!     ..ClientConfig::default()
//! };
//! let client = Client::new(&["cache1:21201", "cache2:21201:2"], config)?;
//!
//! client.set("greeting", b"hello", 0)?;
//! let value = client.get("greeting")?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────────────┐
//! │ Client      │────▶│ Continuum  │────▶│ ServerEndpoint           │
//! │ (facade,    │     │ (CRC-32 →  │     │  ├─ lazy TCP connection  │
//! │  retry      │     │  weighted  │     │  ├─ liveness/quarantine  │
//! │  envelopes) │     │  SHA-1 ring│     │  └─ protocol codec I/O   │
//! └─────────────┘     └────────────┘     └──────────────────────────┘
//! ```

// Modules
pub mod client;
pub mod config;
pub mod continuum;
pub mod endpoint;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod transcode;

// Re-exports for convenience
pub use client::Client;
pub use config::ClientConfig;
pub use error::{McdbError, Result};
pub use protocol::{StatValue, StoreReply};
pub use transcode::{Identity, Transcoder};
