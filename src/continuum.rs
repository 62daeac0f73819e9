//! Consistent-hash continuum
//!
//! A sorted ring of `(hash, server)` entries, built from the weighted server
//! list. Keys are routed by CRC-32 of the effective key; ring positions are
//! SHA-1-derived from `host:port:index`. The two hash functions are
//! deliberately distinct.

use crate::endpoint::ServerEndpoint;
use sha1::{Digest, Sha1};
use std::sync::Arc;

/// Ring entries per unit of server weight, scaled by server count over total
/// weight at build time
pub const POINTS_PER_SERVER: usize = 160;

/// One point on the ring
#[derive(Clone)]
pub struct Entry {
    pub hash: u32,
    pub server: Arc<ServerEndpoint>,
}

/// Sorted ring of hash-labeled server references
pub struct Continuum {
    entries: Vec<Entry>,
}

impl Continuum {
    /// Build the ring from a weighted server list.
    ///
    /// Each server contributes `floor(n * 160 * weight / total_weight)`
    /// entries. Floor rounding may leave a lightly-weighted server with
    /// fewer points than its share, or none at all; that is accepted.
    pub fn build(servers: &[Arc<ServerEndpoint>]) -> Self {
        let total_weight: u64 = servers.iter().map(|s| u64::from(s.weight())).sum();
        let mut entries = Vec::with_capacity(servers.len() * POINTS_PER_SERVER);

        for server in servers {
            let count = servers.len() as u64 * POINTS_PER_SERVER as u64
                * u64::from(server.weight())
                / total_weight;
            for idx in 0..count {
                let digest =
                    Sha1::digest(format!("{}:{}:{}", server.host(), server.port(), idx));
                let hash = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
                entries.push(Entry {
                    hash,
                    server: Arc::clone(server),
                });
            }
        }

        entries.sort_by_key(|entry| entry.hash);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the index of the entry with the largest hash `<= value`.
    ///
    /// Returns -1 when `value` is below every entry; callers index with
    /// [`Continuum::entry`], where -1 resolves to the last entry. The
    /// failover rehash loop relies on this exact boundary behavior.
    pub fn binary_search(&self, value: u32) -> isize {
        let mut upper = self.entries.len() as isize - 1;
        let mut lower: isize = 0;

        while lower <= upper {
            let idx = (lower + upper) / 2;
            let hash = self.entries[idx as usize].hash;
            if hash == value {
                return idx;
            } else if hash > value {
                upper = idx - 1;
            } else {
                lower = idx + 1;
            }
        }
        upper
    }

    /// Fetch an entry by index; negative indices count back from the end.
    pub fn entry(&self, idx: isize) -> &Entry {
        let len = self.entries.len() as isize;
        let idx = if idx < 0 { len + idx } else { idx };
        &self.entries[idx as usize]
    }
}

/// The key hash used for continuum lookup: CRC-32 of the effective key
pub fn hash_key(key: &[u8]) -> u32 {
    crc32fast::hash(key)
}
