//! Value transcoding
//!
//! Values are opaque bytes on the wire. A [`Transcoder`] supplied at client
//! construction runs over every stored and retrieved value, so callers can
//! plug in their own envelope format (serialization, compression, …). The
//! `_raw` client methods bypass it entirely.

use crate::Result;

/// Caller-supplied encode/decode pair applied to values
pub trait Transcoder: Send + Sync {
    /// Transform a value before transmission
    fn encode(&self, value: &[u8]) -> Result<Vec<u8>>;

    /// Transform a retrieved value before returning it to the caller
    fn decode(&self, raw: Vec<u8>) -> Result<Vec<u8>>;
}

/// The default transcoder: bytes pass through unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Transcoder for Identity {
    fn encode(&self, value: &[u8]) -> Result<Vec<u8>> {
        Ok(value.to_vec())
    }

    fn decode(&self, raw: Vec<u8>) -> Result<Vec<u8>> {
        Ok(raw)
    }
}
