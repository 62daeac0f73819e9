//! Buffered blocking connection to one backend
//!
//! Wraps a `std::net::TcpStream` with a read buffer so the protocol layer
//! can consume CRLF-terminated lines and exact-length data blocks. Leftover
//! bytes persist across calls; a multi-`VALUE` reply stream is read
//! incrementally from the same buffer.

use bytes::BytesMut;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// Timeout for the TCP connect itself, separate from the per-I/O timeout
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// Read buffer size
const READ_BUFFER_SIZE: usize = 8192;

/// A live, buffered connection to one backend
pub struct Connection {
    stream: TcpStream,
    buf: BytesMut,
}

impl Connection {
    /// Open a connection, bounded by [`CONNECT_TIMEOUT`]. Every subsequent
    /// read and write is bounded by `timeout` (`None` disables).
    pub fn open(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<Self> {
        let mut last_err = None;
        let mut stream = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = match stream {
            Some(s) => s,
            None => {
                return Err(last_err.unwrap_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no addresses for {host}:{port}"),
                    )
                }))
            }
        };

        // Disable Nagle's algorithm for lower latency
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
        })
    }

    /// Write an entire request
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)
    }

    /// Read one CRLF-terminated line, returned without the terminator
    pub fn read_line(&mut self) -> io::Result<Vec<u8>> {
        loop {
            if let Some(pos) = find_crlf(&self.buf) {
                let mut line = self.buf.split_to(pos + 2);
                line.truncate(pos);
                return Ok(line.to_vec());
            }
            self.fill()?;
        }
    }

    /// Read exactly `len` bytes of data followed by CRLF
    pub fn read_block(&mut self, len: usize) -> io::Result<Vec<u8>> {
        while self.buf.len() < len + 2 {
            self.fill()?;
        }
        let data = self.buf.split_to(len);
        let terminator = self.buf.split_to(2);
        if &terminator[..] != b"\r\n" {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "missing CRLF after data block",
            ));
        }
        Ok(data.to_vec())
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_BUFFER_SIZE];
        let n = self.stream.read(&mut chunk)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            ));
        }
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}

/// Find \r\n in buffer
fn find_crlf(buf: &[u8]) -> Option<usize> {
    memchr::memchr_iter(b'\r', buf).find(|&i| buf.get(i + 1) == Some(&b'\n'))
}
