//! Shared helpers for integration tests: a scripted TCP backend that speaks
//! just enough of the memcached wire format to exercise the client, plus
//! routing helpers that predict which mock a key lands on.

// each test binary uses a different subset of these helpers
#![allow(dead_code)]

use mcdb::continuum::{self, Continuum};
use mcdb::endpoint::{ServerEndpoint, ServerSpec};
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// How a mock backend answers requests
pub enum Script {
    /// Responses served in order, one per request; further requests get
    /// nothing
    Sequence(Vec<Vec<u8>>),
    /// The same response for every request, forever
    Repeat(Vec<u8>),
    /// Accept connections and consume requests but never reply
    Silent,
}

/// A scripted backend on an ephemeral localhost port.
///
/// Binding and serving are split so tests can learn the port (and compute
/// routing) before committing to a script.
pub struct MockServer {
    listener: Option<TcpListener>,
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockServer {
    pub fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        Self {
            listener: Some(listener),
            addr,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The `host:port` spec for this mock
    pub fn spec(&self) -> String {
        format!("127.0.0.1:{}", self.addr.port())
    }

    /// Start answering requests. Connections are handled one at a time,
    /// which matches the client's one-connection-per-endpoint model.
    pub fn serve(&mut self, script: Script) {
        let listener = self.listener.take().expect("serve called twice");
        let requests = Arc::clone(&self.requests);
        thread::spawn(move || {
            let mut queue: VecDeque<Vec<u8>> = VecDeque::new();
            let mut repeat: Option<Vec<u8>> = None;
            match script {
                Script::Sequence(responses) => queue = responses.into(),
                Script::Repeat(response) => repeat = Some(response),
                Script::Silent => {}
            }
            for stream in listener.incoming() {
                let mut stream = match stream {
                    Ok(s) => s,
                    Err(_) => break,
                };
                while let Some(request) = read_request(&mut stream) {
                    requests.lock().unwrap().push(request);
                    let response = match &repeat {
                        Some(r) => Some(r.clone()),
                        None => queue.pop_front(),
                    };
                    if let Some(response) = response {
                        if stream.write_all(&response).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Read one full request: the command line, plus the data block for storage
/// commands. Returns `None` when the connection is gone.
fn read_request(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut request = read_line(stream)?;
    if request.starts_with(b"set ") || request.starts_with(b"add ") {
        let line = String::from_utf8_lossy(&request);
        let bytes: usize = line
            .split_whitespace()
            .last()
            .and_then(|n| n.parse().ok())?;
        let mut data = vec![0u8; bytes + 2];
        stream.read_exact(&mut data).ok()?;
        request.extend_from_slice(&data);
    }
    Some(request)
}

/// Read bytes up to and including CRLF
fn read_line(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) => return None,
            Ok(_) => line.push(byte[0]),
            Err(_) => return None,
        }
        if line.ends_with(b"\r\n") {
            return Some(line);
        }
    }
}

/// A VALUE block followed by END, as a backend would send for a single hit
pub fn value_reply(key: &str, data: &[u8]) -> Vec<u8> {
    let mut reply = value_block(key, data);
    reply.extend_from_slice(b"END\r\n");
    reply
}

/// A bare VALUE block without the END terminator, for multi-value replies
pub fn value_block(key: &str, data: &[u8]) -> Vec<u8> {
    let mut block = format!("VALUE {key} 0 {}\r\n", data.len()).into_bytes();
    block.extend_from_slice(data);
    block.extend_from_slice(b"\r\n");
    block
}

/// Build the same continuum the client will use for these specs, for
/// predicting routing without touching the network
pub fn continuum_for(specs: &[String]) -> Continuum {
    let endpoints: Vec<Arc<ServerEndpoint>> = specs
        .iter()
        .map(|s| Arc::new(ServerEndpoint::new(ServerSpec::parse(s).unwrap(), None)))
        .collect();
    Continuum::build(&endpoints)
}

/// The `host:port` a cache key routes to when every server is alive
pub fn primary_for(continuum: &Continuum, cache_key: &str) -> String {
    let hash = continuum::hash_key(cache_key.as_bytes());
    continuum.entry(continuum.binary_search(hash)).server.to_string()
}

/// Whether the rehash loop would reach a server other than `dead` within
/// its 20 attempts, assuming only `dead` is down
pub fn fails_over(continuum: &Continuum, cache_key: &str, dead: &str) -> bool {
    let mut hash = continuum::hash_key(cache_key.as_bytes());
    for attempt in 0..20 {
        if primary_hash(continuum, hash) != dead {
            return true;
        }
        hash = continuum::hash_key(format!("{attempt}{cache_key}").as_bytes());
    }
    false
}

fn primary_hash(continuum: &Continuum, hash: u32) -> String {
    continuum.entry(continuum.binary_search(hash)).server.to_string()
}

/// Find a caller key whose effective key routes to `target`, optionally
/// requiring that failover away from `target` succeeds
pub fn key_routed_to(
    continuum: &Continuum,
    namespace: Option<&str>,
    target: &str,
    must_fail_over: bool,
) -> String {
    for i in 0..10_000 {
        let key = format!("key{i}");
        let cache_key = match namespace {
            Some(ns) => format!("{ns}:{key}"),
            None => key.clone(),
        };
        if primary_for(continuum, &cache_key) != target {
            continue;
        }
        if must_fail_over && !fails_over(continuum, &cache_key, target) {
            continue;
        }
        return key;
    }
    panic!("no key routed to {target} in 10000 candidates");
}

/// Initialize test logging once; repeated calls are no-ops
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
