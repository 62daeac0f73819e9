//! Memcached ASCII protocol response parsing
//!
//! Lines arrive here already stripped of their CRLF terminator. Anything
//! that deviates from the documented reply grammar is rejected; the caller
//! decides whether that is a retryable transport fault or a hard error.

use crate::McdbError;

/// Parsed header of a `VALUE <key> <flags> <bytes>` reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueHeader {
    pub key: String,
    pub flags: u32,
    pub bytes: usize,
}

/// Outcome of a storage command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreReply {
    Stored,
    NotStored,
}

/// A converted statistic value from a `STAT <name> <value>` line
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Check a reply line for an error response.
///
/// A reply whose first token is `ERROR`, `CLIENT_ERROR`, or `SERVER_ERROR`
/// is a protocol error carrying the remainder of the line.
pub fn check_reply(line: &[u8]) -> Result<(), McdbError> {
    let text = String::from_utf8_lossy(line);
    let mut parts = text.splitn(2, ' ');
    let head = parts.next().unwrap_or("");
    if head == "ERROR" || head == "CLIENT_ERROR" || head == "SERVER_ERROR" {
        let detail = parts.next().unwrap_or("").trim();
        if detail.is_empty() {
            return Err(McdbError::Protocol(head.to_string()));
        }
        return Err(McdbError::Protocol(detail.to_string()));
    }
    Ok(())
}

/// Parse a `VALUE <key> <flags> <bytes>` header line. Returns `None` when
/// the line does not match exactly.
pub fn parse_value(line: &[u8]) -> Option<ValueHeader> {
    let text = std::str::from_utf8(line).ok()?;
    let mut parts = text.split(' ');
    if parts.next()? != "VALUE" {
        return None;
    }
    let key = parts.next()?.to_string();
    let flags = parts.next()?.parse().ok()?;
    let bytes = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ValueHeader { key, flags, bytes })
}

/// Parse a storage reply line into a [`StoreReply`]
pub fn parse_store_reply(line: &[u8]) -> Option<StoreReply> {
    match line {
        b"STORED" => Some(StoreReply::Stored),
        b"NOT_STORED" => Some(StoreReply::NotStored),
        _ => None,
    }
}

/// Convert a raw statistic into its typed form.
///
/// `version` stays a string; `rusage_user` and `rusage_system` parse
/// `<sec>:<usec>` into seconds (a missing `:<usec>` implies 0); all-digit
/// values become integers; everything else stays a string.
pub fn convert_stat(name: &str, raw: &str) -> StatValue {
    if name == "version" {
        return StatValue::Text(raw.to_string());
    }
    if name == "rusage_user" || name == "rusage_system" {
        let mut parts = raw.splitn(2, ':');
        let seconds = parts.next().unwrap_or("0");
        let microseconds = parts.next().unwrap_or("0");
        if let (Ok(s), Ok(us)) = (seconds.parse::<f64>(), microseconds.parse::<f64>()) {
            return StatValue::Float(s + us / 1_000_000.0);
        }
        return StatValue::Text(raw.to_string());
    }
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<u64>() {
            return StatValue::Int(n);
        }
    }
    StatValue::Text(raw.to_string())
}
