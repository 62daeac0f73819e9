//! Prelude module for common imports.
//!
//! This module re-exports commonly used types and traits for convenience.
//!
//! # Usage
//!
//! ```ignore
//! use mcdb::prelude::*;
//! ```

// Error types
pub use crate::error::{McdbError, Result};

// Configuration
pub use crate::config::ClientConfig;

// Client
pub use crate::client::{Client, DEFAULT_RANGE_LIMIT};

// Routing
pub use crate::continuum::Continuum;

// Endpoints
pub use crate::endpoint::{ServerEndpoint, ServerSpec};

// Protocol
pub use crate::protocol::{StatValue, StoreReply};

// Transcoding
pub use crate::transcode::{Identity, Transcoder};

// Common external crates
pub use std::sync::Arc;
pub use tracing::{debug, error, info, trace, warn};
