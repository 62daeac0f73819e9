//! Error types for the MemcacheDB client

use thiserror::Error;

/// Main error type for the client
#[derive(Error, Debug)]
pub enum McdbError {
    /// Illegal key, malformed server spec, or oversized value. Raised before
    /// any wire traffic.
    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("update of readonly cache")]
    ReadOnly,

    /// Empty server list, or the rehash loop exhausted its attempts without
    /// finding a live server.
    #[error("no servers available")]
    NoServersAvailable,

    /// A single-thread-mode client was used from a thread other than the one
    /// that constructed it.
    #[error("client used from a thread other than its owner")]
    WrongThread,

    /// The server answered with `ERROR`, `CLIENT_ERROR`, or `SERVER_ERROR`.
    /// The payload is the server-supplied message where available.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No usable connection remained after the retry discipline ran out of
    /// options. The payload is the endpoint's status string.
    #[error("No connection to server ({0})")]
    NoConnection(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The caller-supplied transcoder failed to encode or decode a value.
    #[error("transcode error: {0}")]
    Transcode(String),
}

pub type Result<T> = std::result::Result<T, McdbError>;
