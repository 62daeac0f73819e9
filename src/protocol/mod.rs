//! Memcached ASCII protocol support
//!
//! Request formatting and response parsing for the memcached text protocol
//! plus the MemcacheDB `rget` range extension. Everything here is pure over
//! byte buffers; the endpoint layer does the I/O.

pub mod request;
pub mod response;

pub use request::RequestWriter;
pub use response::{check_reply, convert_stat, parse_value, StatValue, StoreReply, ValueHeader};

use crate::McdbError;

/// Maximum key length on the wire, after namespacing (memcached spec)
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum value size in bytes (memcached spec)
pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Validate an effective (namespaced) key before it goes anywhere near a
/// socket. Keys must contain no whitespace and fit in 250 bytes.
pub fn validate_key(key: &str) -> Result<(), McdbError> {
    if key.chars().any(|c| c.is_whitespace()) {
        return Err(McdbError::BadArgument(format!(
            "illegal character in key {key:?}"
        )));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(McdbError::BadArgument(format!(
            "key too long: {} bytes (max {MAX_KEY_LENGTH})",
            key.len()
        )));
    }
    Ok(())
}
