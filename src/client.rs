//! Client facade
//!
//! The public API over the continuum, the endpoints, and the protocol
//! codec. Every single-key operation runs through two nested retry
//! envelopes: [`Client::with_socket`] retries once on the same server after
//! a transport fault or malformed reply (then marks the server dead), and
//! [`Client::with_server`] retries the whole operation once on a freshly
//! resolved server when the first one turned out to be unusable. Together
//! they give each request two chances on its primary server and one on a
//! fallback.

use crate::config::ClientConfig;
use crate::continuum::{self, Continuum};
use crate::endpoint::{Connection, ServerEndpoint, ServerSpec};
use crate::error::{McdbError, Result};
use crate::protocol::{self, response, RequestWriter, StatValue, StoreReply};
use crate::transcode::{Identity, Transcoder};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default maximum number of keys returned by [`Client::get_range`]
pub const DEFAULT_RANGE_LIMIT: usize = 100;

/// Ceiling on continuum probes before a request gives up on routing
const MAX_ROUTE_ATTEMPTS: usize = 20;

/// Failure inside one socket transaction
enum Fault {
    /// Transport error or malformed reply: retryable on a fresh connection
    Transient(String),
    /// Definitive answer from the server (an `ERROR`-class reply): no retry
    Hard(McdbError),
}

impl From<io::Error> for Fault {
    fn from(err: io::Error) -> Self {
        Fault::Transient(err.to_string())
    }
}

fn garbled(line: &[u8]) -> Fault {
    Fault::Transient(format!(
        "unexpected response {:?}",
        String::from_utf8_lossy(line)
    ))
}

/// Failure of one attempt at an operation, after the socket envelope ran
enum OpError {
    /// The server is not usable for this request; routing may pick another.
    /// Never escapes the facade.
    Dead(String),
    Hard(McdbError),
}

/// Threading discipline selected at construction
enum ThreadGuard {
    /// Single-thread mode: only the constructing thread may use the client
    Single(ThreadId),
    /// Multi-thread mode: one client-wide mutex held across every operation
    Shared(Mutex<()>),
}

/// A MemcacheDB client addressing a pool of servers as one logical cache
pub struct Client {
    servers: Vec<Arc<ServerEndpoint>>,
    continuum: Option<Continuum>,
    namespace: Option<String>,
    readonly: bool,
    failover: bool,
    timeout: Option<Duration>,
    guard: ThreadGuard,
    transcoder: Box<dyn Transcoder>,
}

impl Client {
    /// Create a client with the identity transcoder.
    ///
    /// Server specs take the form `host`, `host:port`, or
    /// `host:port:weight`.
    pub fn new<S: AsRef<str>>(servers: &[S], config: ClientConfig) -> Result<Self> {
        Self::with_transcoder(servers, config, Box::new(Identity))
    }

    /// Create a client with a caller-supplied transcoder applied to every
    /// non-`_raw` value
    pub fn with_transcoder<S: AsRef<str>>(
        servers: &[S],
        config: ClientConfig,
        transcoder: Box<dyn Transcoder>,
    ) -> Result<Self> {
        let timeout = config.io_timeout()?;
        let guard = if config.multithread {
            ThreadGuard::Shared(Mutex::new(()))
        } else {
            ThreadGuard::Single(thread::current().id())
        };

        let mut client = Self {
            servers: Vec::new(),
            continuum: None,
            namespace: config.namespace,
            readonly: config.readonly,
            failover: config.failover,
            timeout,
            guard,
            transcoder,
        };
        client.set_servers(servers)?;
        Ok(client)
    }

    /// Replace the server list and rebuild the continuum
    pub fn set_servers<S: AsRef<str>>(&mut self, specs: &[S]) -> Result<()> {
        let mut servers = Vec::with_capacity(specs.len());
        for spec in specs {
            let spec = ServerSpec::parse(spec.as_ref())?;
            servers.push(Arc::new(ServerEndpoint::new(spec, self.timeout)));
        }
        self.continuum = if servers.len() >= 2 {
            Some(Continuum::build(&servers))
        } else {
            None
        };
        self.servers = servers;
        info!(servers = self.servers.len(), "server list configured");
        Ok(())
    }

    /// The configured endpoints
    pub fn servers(&self) -> &[Arc<ServerEndpoint>] {
        &self.servers
    }

    /// Whether any servers are configured
    pub fn active(&self) -> bool {
        !self.servers.is_empty()
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Retrieve one key. `Ok(None)` is a cache miss.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_impl(key, false)
    }

    /// Retrieve one key, bypassing the transcoder
    pub fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_impl(key, true)
    }

    /// Retrieve many keys at once.
    ///
    /// Keys are partitioned by target server and fetched with one `get` per
    /// server. Missing keys are simply absent from the result; a per-server
    /// failure is logged and the remaining servers' results are returned.
    pub fn get_multi<S: AsRef<str>>(&self, keys: &[S]) -> Result<HashMap<String, Vec<u8>>> {
        self.get_multi_impl(keys, false)
    }

    /// [`Client::get_multi`] without the transcoder
    pub fn get_multi_raw<S: AsRef<str>>(&self, keys: &[S]) -> Result<HashMap<String, Vec<u8>>> {
        self.get_multi_impl(keys, true)
    }

    /// Retrieve a lexicographic key range (MemcacheDB `rget`).
    ///
    /// The query is broadcast to every server and the per-server results are
    /// merged: servers hold disjoint key subsets under the continuum, so the
    /// merged map is the union of per-server ordered ranges, not a
    /// cluster-wide sorted range. Any single-server failure aborts the call
    /// and yields an empty map with a warning.
    pub fn get_range(
        &self,
        start_key: &str,
        end_key: &str,
        limit: usize,
    ) -> Result<HashMap<String, Vec<u8>>> {
        self.get_range_impl(start_key, end_key, limit, false)
    }

    /// [`Client::get_range`] without the transcoder
    pub fn get_range_raw(
        &self,
        start_key: &str,
        end_key: &str,
        limit: usize,
    ) -> Result<HashMap<String, Vec<u8>>> {
        self.get_range_impl(start_key, end_key, limit, true)
    }

    /// Store a value unconditionally
    pub fn set(&self, key: &str, value: &[u8], expiry: u32) -> Result<StoreReply> {
        self.store_impl("set", key, value, expiry, false)
    }

    /// [`Client::set`] without the transcoder
    pub fn set_raw(&self, key: &str, value: &[u8], expiry: u32) -> Result<StoreReply> {
        self.store_impl("set", key, value, expiry, true)
    }

    /// Store a value only if the key is not already present. Returns the raw
    /// `Stored`/`NotStored` sentinel.
    pub fn add(&self, key: &str, value: &[u8], expiry: u32) -> Result<StoreReply> {
        self.store_impl("add", key, value, expiry, false)
    }

    /// [`Client::add`] without the transcoder
    pub fn add_raw(&self, key: &str, value: &[u8], expiry: u32) -> Result<StoreReply> {
        self.store_impl("add", key, value, expiry, true)
    }

    /// Delete a key. Returns whether the key existed.
    pub fn delete(&self, key: &str, expiry: u32) -> Result<bool> {
        let _guard = self.enter()?;
        if self.readonly {
            return Err(McdbError::ReadOnly);
        }
        let cache_key = self.effective_key(key)?;
        self.with_server(&cache_key, |server| {
            self.with_socket(server, |conn| {
                let mut req = RequestWriter::default();
                req.delete(&cache_key, expiry);
                conn.write_all(req.buffer())?;
                let line = conn.read_line()?;
                response::check_reply(&line).map_err(Fault::Hard)?;
                match line.as_slice() {
                    b"DELETED" => Ok(true),
                    b"NOT_FOUND" => Ok(false),
                    _ => Err(garbled(&line)),
                }
            })
        })
    }

    /// Increment a server-side counter. `Ok(None)` when the key is missing.
    pub fn incr(&self, key: &str, amount: u64) -> Result<Option<u64>> {
        self.arith_impl("incr", key, amount)
    }

    /// Decrement a server-side counter; the server floors the result at 0.
    /// `Ok(None)` when the key is missing.
    pub fn decr(&self, key: &str, amount: u64) -> Result<Option<u64>> {
        self.arith_impl("decr", key, amount)
    }

    /// Flush every server's store
    pub fn flush_all(&self) -> Result<()> {
        let _guard = self.enter()?;
        if self.servers.is_empty() {
            return Err(McdbError::NoServersAvailable);
        }
        if self.readonly {
            return Err(McdbError::ReadOnly);
        }
        for server in &self.servers {
            let outcome = self.with_socket(server, |conn| {
                let mut req = RequestWriter::default();
                req.flush_all();
                conn.write_all(req.buffer())?;
                let line = conn.read_line()?;
                response::check_reply(&line).map_err(Fault::Hard)?;
                if line == b"OK" {
                    Ok(())
                } else {
                    Err(garbled(&line))
                }
            });
            match outcome {
                Ok(()) => {}
                Err(OpError::Hard(err)) => return Err(err),
                Err(OpError::Dead(status)) => return Err(McdbError::NoConnection(status)),
            }
        }
        Ok(())
    }

    /// Collect `stats` from every live server, keyed by `host:port`.
    ///
    /// Dead servers are skipped; fails when none are alive.
    pub fn stats(&self) -> Result<HashMap<String, HashMap<String, StatValue>>> {
        let _guard = self.enter()?;
        if self.servers.is_empty() {
            return Err(McdbError::NoServersAvailable);
        }
        let mut out = HashMap::new();
        for server in &self.servers {
            if !server.alive() {
                continue;
            }
            let outcome = self.with_socket(server, |conn| {
                let mut req = RequestWriter::default();
                req.stats();
                conn.write_all(req.buffer())?;
                let mut stats = HashMap::new();
                loop {
                    let line = conn.read_line()?;
                    response::check_reply(&line).map_err(Fault::Hard)?;
                    if line == b"END" {
                        return Ok(stats);
                    }
                    let text = String::from_utf8_lossy(&line).into_owned();
                    let mut parts = text.splitn(3, ' ');
                    match (parts.next(), parts.next(), parts.next()) {
                        (Some("STAT"), Some(name), Some(value)) => {
                            stats.insert(name.to_string(), response::convert_stat(name, value));
                        }
                        _ => return Err(garbled(&line)),
                    }
                }
            });
            match outcome {
                Ok(stats) => {
                    out.insert(server.to_string(), stats);
                }
                Err(OpError::Hard(err)) => return Err(err),
                Err(OpError::Dead(status)) => return Err(McdbError::NoConnection(status)),
            }
        }
        if out.is_empty() {
            return Err(McdbError::NoServersAvailable);
        }
        Ok(out)
    }

    /// Close every socket without quarantining any endpoint
    pub fn reset(&self) -> Result<()> {
        let _guard = self.enter()?;
        for server in &self.servers {
            server.close();
        }
        Ok(())
    }

    fn get_impl(&self, key: &str, raw: bool) -> Result<Option<Vec<u8>>> {
        let _guard = self.enter()?;
        let cache_key = self.effective_key(key)?;
        let values = self.with_server(&cache_key, |server| {
            self.with_socket(server, |conn| {
                let mut req = RequestWriter::default();
                req.get([cache_key.as_str()]);
                conn.write_all(req.buffer())?;
                read_values(conn)
            })
        })?;
        let value = values.into_iter().next().map(|(_, data)| data);
        match value {
            Some(data) if !raw => Ok(Some(self.transcoder.decode(data)?)),
            other => Ok(other),
        }
    }

    fn get_multi_impl<S: AsRef<str>>(
        &self,
        keys: &[S],
        raw: bool,
    ) -> Result<HashMap<String, Vec<u8>>> {
        let _guard = self.enter()?;
        if self.servers.is_empty() {
            return Err(McdbError::NoServersAvailable);
        }

        // wire key -> caller key, and keys grouped by target server
        let mut cache_keys: HashMap<String, String> = HashMap::new();
        let mut groups: Vec<(Arc<ServerEndpoint>, Vec<String>)> = Vec::new();
        for key in keys {
            let key = key.as_ref();
            let cache_key = self.effective_key(key)?;
            let server = self.server_for_key(&cache_key)?;
            match groups.iter_mut().find(|(s, _)| Arc::ptr_eq(s, &server)) {
                Some((_, group)) => group.push(cache_key.clone()),
                None => groups.push((server, vec![cache_key.clone()])),
            }
            cache_keys.insert(cache_key, key.to_string());
        }

        let mut results = HashMap::new();
        for (server, group) in &groups {
            let outcome = self.with_socket(server, |conn| {
                let mut req = RequestWriter::default();
                req.get(group.iter().map(|k| k.as_str()));
                conn.write_all(req.buffer())?;
                read_values(conn)
            });
            match outcome {
                Ok(values) => {
                    for (wire_key, data) in values {
                        let orig = match cache_keys.get(&wire_key) {
                            Some(orig) => orig,
                            None => {
                                debug!(key = %wire_key, "dropping value for unrequested key");
                                continue;
                            }
                        };
                        let data = if raw { data } else { self.transcoder.decode(data)? };
                        results.insert(orig.clone(), data);
                    }
                }
                Err(OpError::Hard(err)) => {
                    warn!(server = %server, error = %err, "unable to get multi from server");
                }
                Err(OpError::Dead(status)) => {
                    warn!(server = %server, %status, "unable to get multi from server");
                }
            }
        }
        Ok(results)
    }

    fn get_range_impl(
        &self,
        start_key: &str,
        end_key: &str,
        limit: usize,
        raw: bool,
    ) -> Result<HashMap<String, Vec<u8>>> {
        let _guard = self.enter()?;
        if self.servers.is_empty() {
            return Err(McdbError::NoServersAvailable);
        }
        let start = self.effective_key(start_key)?;
        let end = self.effective_key(end_key)?;

        let mut results = HashMap::new();
        for server in &self.servers {
            let outcome = self.with_socket(server, |conn| {
                let mut req = RequestWriter::default();
                req.rget(&start, &end, limit);
                conn.write_all(req.buffer())?;
                read_values(conn)
            });
            match outcome {
                Ok(values) => {
                    for (wire_key, data) in values {
                        let data = if raw { data } else { self.transcoder.decode(data)? };
                        results.insert(self.strip_namespace(&wire_key), data);
                    }
                }
                Err(OpError::Hard(err)) => {
                    warn!(server = %server, error = %err, "range query failed, returning empty result");
                    return Ok(HashMap::new());
                }
                Err(OpError::Dead(status)) => {
                    warn!(server = %server, %status, "range query failed, returning empty result");
                    return Ok(HashMap::new());
                }
            }
        }
        Ok(results)
    }

    fn store_impl(
        &self,
        verb: &str,
        key: &str,
        value: &[u8],
        expiry: u32,
        raw: bool,
    ) -> Result<StoreReply> {
        let _guard = self.enter()?;
        if self.readonly {
            return Err(McdbError::ReadOnly);
        }
        let cache_key = self.effective_key(key)?;
        let payload = if raw {
            value.to_vec()
        } else {
            self.transcoder.encode(value)?
        };
        if payload.len() > protocol::MAX_VALUE_SIZE {
            return Err(McdbError::BadArgument(format!(
                "value too large: {} bytes (max {})",
                payload.len(),
                protocol::MAX_VALUE_SIZE
            )));
        }
        self.with_server(&cache_key, |server| {
            self.with_socket(server, |conn| {
                let mut req = RequestWriter::new(payload.len() + cache_key.len() + 32);
                req.store(verb, &cache_key, expiry, &payload);
                conn.write_all(req.buffer())?;
                let line = conn.read_line()?;
                response::check_reply(&line).map_err(Fault::Hard)?;
                response::parse_store_reply(&line).ok_or_else(|| garbled(&line))
            })
        })
    }

    fn arith_impl(&self, verb: &str, key: &str, amount: u64) -> Result<Option<u64>> {
        let _guard = self.enter()?;
        if self.readonly {
            return Err(McdbError::ReadOnly);
        }
        let cache_key = self.effective_key(key)?;
        self.with_server(&cache_key, |server| {
            self.with_socket(server, |conn| {
                let mut req = RequestWriter::default();
                req.arith(verb, &cache_key, amount);
                conn.write_all(req.buffer())?;
                let line = conn.read_line()?;
                response::check_reply(&line).map_err(Fault::Hard)?;
                // the reply line may carry trailing spaces
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end();
                if text == "NOT_FOUND" {
                    return Ok(None);
                }
                text.parse::<u64>().map(Some).map_err(|_| garbled(&line))
            })
        })
    }

    /// Enforce the threading discipline for one public operation
    fn enter(&self) -> Result<Option<MutexGuard<'_, ()>>> {
        match &self.guard {
            ThreadGuard::Single(owner) => {
                if thread::current().id() != *owner {
                    return Err(McdbError::WrongThread);
                }
                Ok(None)
            }
            ThreadGuard::Shared(mutex) => Ok(Some(mutex.lock())),
        }
    }

    /// Namespace and validate a caller key
    fn effective_key(&self, key: &str) -> Result<String> {
        let cache_key = match &self.namespace {
            Some(ns) => format!("{ns}:{key}"),
            None => key.to_string(),
        };
        protocol::validate_key(&cache_key)?;
        Ok(cache_key)
    }

    fn strip_namespace(&self, wire_key: &str) -> String {
        match &self.namespace {
            Some(ns) => wire_key
                .strip_prefix(ns.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .unwrap_or(wire_key)
                .to_string(),
            None => wire_key.to_string(),
        }
    }

    /// Route an effective key to a live server.
    ///
    /// A single configured server is returned unconditionally. Otherwise the
    /// continuum is probed up to 20 times, rehashing with an attempt-counter
    /// prefix whenever the chosen server is dead; with failover disabled the
    /// first dead server fails the request.
    fn server_for_key(&self, cache_key: &str) -> Result<Arc<ServerEndpoint>> {
        if self.servers.is_empty() {
            return Err(McdbError::NoServersAvailable);
        }
        if self.servers.len() == 1 {
            return Ok(Arc::clone(&self.servers[0]));
        }

        let continuum = match &self.continuum {
            Some(c) if !c.is_empty() => c,
            _ => return Err(McdbError::NoServersAvailable),
        };

        let mut hash = continuum::hash_key(cache_key.as_bytes());
        for attempt in 0..MAX_ROUTE_ATTEMPTS {
            let entry = continuum.entry(continuum.binary_search(hash));
            if entry.server.alive() {
                return Ok(Arc::clone(&entry.server));
            }
            if !self.failover {
                return Err(McdbError::NoServersAvailable);
            }
            hash = continuum::hash_key(format!("{attempt}{cache_key}").as_bytes());
        }
        Err(McdbError::NoServersAvailable)
    }

    /// Operation envelope: resolve the target server and run the operation,
    /// retrying once on a freshly resolved server when the first turned out
    /// to be unusable mid-request
    fn with_server<T>(
        &self,
        cache_key: &str,
        mut op: impl FnMut(&Arc<ServerEndpoint>) -> std::result::Result<T, OpError>,
    ) -> Result<T> {
        let server = self.server_for_key(cache_key)?;
        match op(&server) {
            Ok(value) => Ok(value),
            Err(OpError::Hard(err)) => Err(err),
            Err(OpError::Dead(status)) => {
                if self.servers.len() > 1 {
                    info!(server = %server, "server died mid-request, retrying with a new server");
                    let server = self.server_for_key(cache_key)?;
                    match op(&server) {
                        Ok(value) => Ok(value),
                        Err(OpError::Hard(err)) => Err(err),
                        Err(OpError::Dead(status)) => Err(McdbError::NoConnection(status)),
                    }
                } else {
                    Err(McdbError::NoConnection(status))
                }
            }
        }
    }

    /// Socket envelope: acquire the endpoint's connection and run one
    /// request, retrying once on a fresh connection after a transient fault;
    /// a second fault marks the server dead
    fn with_socket<T>(
        &self,
        server: &ServerEndpoint,
        mut op: impl FnMut(&mut Connection) -> std::result::Result<T, Fault>,
    ) -> std::result::Result<T, OpError> {
        let mut retried = false;
        loop {
            let mut conn = match server.socket() {
                Some(conn) => conn,
                None => return Err(OpError::Dead(server.status())),
            };
            match op(&mut conn) {
                Ok(value) => return Ok(value),
                Err(Fault::Hard(err)) => return Err(OpError::Hard(err)),
                Err(Fault::Transient(reason)) => {
                    drop(conn);
                    server.close();
                    if retried {
                        server.mark_dead(&reason);
                        return Err(OpError::Dead(server.status()));
                    }
                    debug!(server = %server, %reason, "request failed, retrying on the same server");
                    retried = true;
                }
            }
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Mcdb: {} servers, ns: {:?}, ro: {}>",
            self.servers.len(),
            self.namespace,
            self.readonly
        )
    }
}

/// Read a stream of `VALUE <key> <flags> <bytes>` blocks terminated by
/// `END`, as produced by `get` and `rget`
fn read_values(conn: &mut Connection) -> std::result::Result<Vec<(String, Vec<u8>)>, Fault> {
    let mut values = Vec::new();
    loop {
        let line = conn.read_line()?;
        response::check_reply(&line).map_err(Fault::Hard)?;
        if line == b"END" {
            return Ok(values);
        }
        let header = response::parse_value(&line).ok_or_else(|| garbled(&line))?;
        let data = conn.read_block(header.bytes)?;
        values.push((header.key, data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(servers: &[&str], config: ClientConfig) -> Client {
        Client::new(servers, config).unwrap()
    }

    #[test]
    fn test_key_validation_before_any_io() {
        let c = client(&["localhost:1"], ClientConfig::default());
        match c.get("bad key") {
            Err(McdbError::BadArgument(msg)) => assert!(msg.contains("illegal character")),
            other => panic!("unexpected: {other:?}"),
        }
        match c.get(&"a".repeat(251)) {
            Err(McdbError::BadArgument(msg)) => assert!(msg.contains("too long")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_namespace_counts_toward_key_length() {
        let config = ClientConfig {
            namespace: Some("my_namespace".to_string()),
            ..ClientConfig::default()
        };
        let c = client(&["localhost:1"], config);
        // 240 + "my_namespace:" pushes past 250
        assert!(matches!(
            c.get(&"a".repeat(240)),
            Err(McdbError::BadArgument(_))
        ));
        // without the namespace the same key is fine... but the sole server
        // is unreachable, so anything past validation is a connection error
        let plain = client(&["localhost:1"], ClientConfig::default());
        assert!(matches!(
            plain.get(&"a".repeat(240)),
            Err(McdbError::NoConnection(_))
        ));
    }

    #[test]
    fn test_readonly_rejects_mutations() {
        let config = ClientConfig {
            readonly: true,
            ..ClientConfig::default()
        };
        let c = client(&["localhost:1"], config);
        assert!(matches!(c.set("k", b"v", 0), Err(McdbError::ReadOnly)));
        assert!(matches!(c.add("k", b"v", 0), Err(McdbError::ReadOnly)));
        assert!(matches!(c.delete("k", 0), Err(McdbError::ReadOnly)));
        assert!(matches!(c.incr("k", 1), Err(McdbError::ReadOnly)));
        assert!(matches!(c.decr("k", 1), Err(McdbError::ReadOnly)));
        assert!(matches!(c.flush_all(), Err(McdbError::ReadOnly)));
    }

    #[test]
    fn test_oversized_value_rejected_before_io() {
        let c = client(&["localhost:1"], ClientConfig::default());
        let value = vec![0u8; protocol::MAX_VALUE_SIZE + 1];
        match c.set("key", &value, 0) {
            Err(McdbError::BadArgument(msg)) => assert!(msg.contains("value too large")),
            other => panic!("unexpected: {other:?}"),
        }
        // exactly at the limit passes validation and reaches the (dead) wire
        let value = vec![0u8; protocol::MAX_VALUE_SIZE];
        assert!(matches!(
            c.set("key", &value, 0),
            Err(McdbError::NoConnection(_))
        ));
    }

    #[test]
    fn test_empty_server_list() {
        let c = client(&[] as &[&str], ClientConfig::default());
        assert!(!c.active());
        assert!(matches!(c.get("key"), Err(McdbError::NoServersAvailable)));
        assert!(matches!(
            c.flush_all(),
            Err(McdbError::NoServersAvailable)
        ));
        assert!(matches!(c.stats(), Err(McdbError::NoServersAvailable)));
    }

    #[test]
    fn test_single_thread_guard() {
        let c = client(&["localhost:1"], ClientConfig::default());
        let result = thread::spawn(move || c.get("key")).join().unwrap();
        assert!(matches!(result, Err(McdbError::WrongThread)));
    }

    #[test]
    fn test_multithread_mode_allows_other_threads() {
        let config = ClientConfig {
            multithread: true,
            readonly: true,
            ..ClientConfig::default()
        };
        let c = Arc::new(client(&["localhost:1"], config));
        let shared = Arc::clone(&c);
        let result = thread::spawn(move || shared.set("k", b"v", 0))
            .join()
            .unwrap();
        // past the thread guard; stopped by the readonly check instead
        assert!(matches!(result, Err(McdbError::ReadOnly)));
    }

    #[test]
    fn test_effective_key_namespacing() {
        let config = ClientConfig {
            namespace: Some("app".to_string()),
            ..ClientConfig::default()
        };
        let c = client(&["localhost:1"], config);
        assert_eq!(c.effective_key("key").unwrap(), "app:key");
        assert_eq!(c.strip_namespace("app:key"), "key");
        assert_eq!(c.strip_namespace("other:key"), "other:key");

        let plain = client(&["localhost:1"], ClientConfig::default());
        assert_eq!(plain.effective_key("key").unwrap(), "key");
        assert_eq!(plain.strip_namespace("app:key"), "app:key");
    }

    #[test]
    fn test_set_servers_rebuilds_continuum() {
        let mut c = client(&["localhost:1"], ClientConfig::default());
        assert!(c.continuum.is_none());

        c.set_servers(&["mike1:11211", "mike2:11211"]).unwrap();
        assert_eq!(c.servers().len(), 2);
        assert!(c.continuum.is_some());

        c.set_servers(&["mike1:11211"]).unwrap();
        assert!(c.continuum.is_none());
    }

    #[test]
    fn test_debug_format() {
        let config = ClientConfig {
            namespace: Some("app".to_string()),
            readonly: true,
            ..ClientConfig::default()
        };
        let c = client(&["localhost:1"], config);
        assert_eq!(
            format!("{c:?}"),
            "<Mcdb: 1 servers, ns: Some(\"app\"), ro: true>"
        );
    }
}
