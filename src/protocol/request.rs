//! Memcached ASCII protocol request builder

use bytes::BytesMut;
use itoa::Buffer;

/// Request writer for the memcached ASCII protocol
pub struct RequestWriter {
    buf: BytesMut,
}

impl RequestWriter {
    /// Create a new request writer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the internal buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Take the buffer, leaving an empty buffer in its place
    pub fn take(&mut self) -> BytesMut {
        std::mem::take(&mut self.buf)
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Returns true if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write a retrieval request for one or more keys
    /// Format: get <k1> <k2> …\r\n
    pub fn get<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        self.buf.extend_from_slice(b"get");
        for key in keys {
            self.buf.extend_from_slice(b" ");
            self.buf.extend_from_slice(key.as_bytes());
        }
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Write a range retrieval request (MemcacheDB extension)
    /// Format: rget <start> <end> 0 0 <max>\r\n
    pub fn rget(&mut self, start_key: &str, end_key: &str, limit: usize) {
        let mut itoa_buf = Buffer::new();
        self.buf.extend_from_slice(b"rget ");
        self.buf.extend_from_slice(start_key.as_bytes());
        self.buf.extend_from_slice(b" ");
        self.buf.extend_from_slice(end_key.as_bytes());
        self.buf.extend_from_slice(b" 0 0 ");
        self.buf
            .extend_from_slice(itoa_buf.format(limit).as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Write a storage request
    /// Format: <verb> <key> 0 <expiry> <bytes>\r\n<data>\r\n
    pub fn store(&mut self, verb: &str, key: &str, expiry: u32, data: &[u8]) {
        let mut itoa_buf = Buffer::new();
        self.buf.extend_from_slice(verb.as_bytes());
        self.buf.extend_from_slice(b" ");
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.extend_from_slice(b" 0 ");
        self.buf
            .extend_from_slice(itoa_buf.format(expiry).as_bytes());
        self.buf.extend_from_slice(b" ");
        self.buf
            .extend_from_slice(itoa_buf.format(data.len()).as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Write a delete request
    /// Format: delete <key> <expiry>\r\n
    pub fn delete(&mut self, key: &str, expiry: u32) {
        let mut itoa_buf = Buffer::new();
        self.buf.extend_from_slice(b"delete ");
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.extend_from_slice(b" ");
        self.buf
            .extend_from_slice(itoa_buf.format(expiry).as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Write an incr/decr request
    /// Format: <verb> <key> <amount>\r\n
    pub fn arith(&mut self, verb: &str, key: &str, amount: u64) {
        let mut itoa_buf = Buffer::new();
        self.buf.extend_from_slice(verb.as_bytes());
        self.buf.extend_from_slice(b" ");
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.extend_from_slice(b" ");
        self.buf
            .extend_from_slice(itoa_buf.format(amount).as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Write a flush_all request
    pub fn flush_all(&mut self) {
        self.buf.extend_from_slice(b"flush_all\r\n");
    }

    /// Write a stats request
    pub fn stats(&mut self) {
        self.buf.extend_from_slice(b"stats\r\n");
    }
}

impl Default for RequestWriter {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let mut writer = RequestWriter::default();
        writer.get(["mykey"]);
        assert_eq!(writer.buffer(), b"get mykey\r\n");
    }

    #[test]
    fn test_get_multi() {
        let mut writer = RequestWriter::default();
        writer.get(["foo", "bar", "baz"]);
        assert_eq!(writer.buffer(), b"get foo bar baz\r\n");
    }

    #[test]
    fn test_rget() {
        let mut writer = RequestWriter::default();
        writer.rget("a", "z", 100);
        assert_eq!(writer.buffer(), b"rget a z 0 0 100\r\n");
    }

    #[test]
    fn test_store() {
        let mut writer = RequestWriter::default();
        writer.store("set", "my_namespace:key", 0, b"value");
        assert_eq!(
            writer.buffer(),
            b"set my_namespace:key 0 0 5\r\nvalue\r\n"
        );

        writer.clear();
        writer.store("add", "key", 3600, b"data");
        assert_eq!(writer.buffer(), b"add key 0 3600 4\r\ndata\r\n");
    }

    #[test]
    fn test_delete() {
        let mut writer = RequestWriter::default();
        writer.delete("mykey", 0);
        assert_eq!(writer.buffer(), b"delete mykey 0\r\n");
    }

    #[test]
    fn test_arith() {
        let mut writer = RequestWriter::default();
        writer.arith("incr", "counter", 1);
        assert_eq!(writer.buffer(), b"incr counter 1\r\n");

        writer.clear();
        writer.arith("decr", "counter", 5);
        assert_eq!(writer.buffer(), b"decr counter 5\r\n");
    }

    #[test]
    fn test_broadcast_commands() {
        let mut writer = RequestWriter::default();
        writer.flush_all();
        assert_eq!(writer.take().as_ref(), b"flush_all\r\n");

        writer.stats();
        assert_eq!(writer.take().as_ref(), b"stats\r\n");
    }
}
