//! Per-backend endpoint state machine
//!
//! An endpoint owns at most one connection and tracks its liveness. A failed
//! connect or an exhausted request marks it dead: the connection is dropped
//! and the endpoint is quarantined for [`RETRY_DELAY`], during which routing
//! skips it entirely. `close` is the benign variant that drops the socket
//! without quarantine.

use crate::endpoint::Connection;
use crate::McdbError;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::warn;

/// Default MemcacheDB port
pub const DEFAULT_PORT: u16 = 21201;

/// Default server weight
pub const DEFAULT_WEIGHT: u32 = 1;

/// Quarantine period after an endpoint is marked dead
pub(crate) const RETRY_DELAY: Duration = Duration::from_secs(30);

/// A parsed `host[:port[:weight]]` server description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub host: String,
    pub port: u16,
    pub weight: u32,
}

impl ServerSpec {
    /// Parse a server spec of the form `host`, `host:port`, or
    /// `host:port:weight`. Port defaults to 21201, weight to 1; weight must
    /// be at least 1.
    pub fn parse(spec: &str) -> Result<Self, McdbError> {
        let mut parts = spec.split(':');

        let host = match parts.next() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => {
                return Err(McdbError::BadArgument(format!(
                    "invalid server spec {spec:?}: missing host"
                )))
            }
        };

        let port = match parts.next() {
            None => DEFAULT_PORT,
            Some(p) => p.parse().map_err(|_| {
                McdbError::BadArgument(format!("invalid server spec {spec:?}: bad port"))
            })?,
        };

        let weight = match parts.next() {
            None => DEFAULT_WEIGHT,
            Some(w) => w.parse().map_err(|_| {
                McdbError::BadArgument(format!("invalid server spec {spec:?}: bad weight"))
            })?,
        };
        if weight < 1 {
            return Err(McdbError::BadArgument(format!(
                "invalid server spec {spec:?}: weight must be at least 1"
            )));
        }

        if parts.next().is_some() {
            return Err(McdbError::BadArgument(format!(
                "invalid server spec {spec:?}: too many fields"
            )));
        }

        Ok(Self { host, port, weight })
    }
}

/// Mutable endpoint state, guarded by the endpoint's internal mutex
struct EndpointState {
    conn: Option<Connection>,
    retry_at: Option<Instant>,
    status: String,
}

/// One configured backend.
///
/// Shared (`Arc`) between the client's server list and the continuum
/// entries. Invariant: a connection is present exactly when `retry_at` is
/// absent and the status is `CONNECTED`.
pub struct ServerEndpoint {
    host: String,
    port: u16,
    weight: u32,
    timeout: Option<Duration>,
    state: Mutex<EndpointState>,
}

impl ServerEndpoint {
    pub fn new(spec: ServerSpec, timeout: Option<Duration>) -> Self {
        Self {
            host: spec.host,
            port: spec.port,
            weight: spec.weight,
            timeout,
            state: Mutex::new(EndpointState {
                conn: None,
                retry_at: None,
                status: "NOT CONNECTED".to_string(),
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn status(&self) -> String {
        self.state.lock().status.clone()
    }

    /// Acquire the live connection, opening one if needed.
    ///
    /// Returns `None` when the endpoint is quarantined (`retry_at` in the
    /// future) or when a fresh connect attempt fails, in which case the
    /// endpoint is left dead.
    pub fn socket(&self) -> Option<MappedMutexGuard<'_, Connection>> {
        let mut state = self.state.lock();

        if let Some(retry_at) = state.retry_at {
            if Instant::now() < retry_at {
                return None;
            }
        }

        if state.conn.is_none() {
            match Connection::open(&self.host, self.port, self.timeout) {
                Ok(conn) => {
                    state.conn = Some(conn);
                    state.retry_at = None;
                    state.status = "CONNECTED".to_string();
                }
                Err(err) => {
                    state.retry_at = Some(Instant::now() + RETRY_DELAY);
                    state.status = format!(
                        "DEAD: {err}, will retry in {}s",
                        RETRY_DELAY.as_secs()
                    );
                    warn!(server = %self, %err, "connect failed, marking server dead");
                    return None;
                }
            }
        }

        MutexGuard::try_map(state, |s| s.conn.as_mut()).ok()
    }

    /// Drop any connection and quarantine the endpoint for [`RETRY_DELAY`]
    pub fn mark_dead(&self, reason: &str) {
        let mut state = self.state.lock();
        state.conn = None;
        state.retry_at = Some(Instant::now() + RETRY_DELAY);
        state.status = format!("DEAD: {reason}, will retry in {}s", RETRY_DELAY.as_secs());
        warn!(server = %self, reason, "marking server dead");
    }

    /// Drop any connection without quarantine; the next use reconnects
    /// immediately
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.conn = None;
        state.retry_at = None;
        state.status = "NOT CONNECTED".to_string();
    }

    /// Whether [`ServerEndpoint::socket`] would return a stream right now
    pub fn alive(&self) -> bool {
        self.socket().is_some()
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<ServerEndpoint: {}:{} [{}] ({})>",
            self.host,
            self.port,
            self.weight,
            self.state.lock().status
        )
    }
}
