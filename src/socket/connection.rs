//! Buffered, timeout-aware byte I/O over one socket.
//!
//! A [`Connection`] owns exactly one [`Socket`] plus independently
//! configurable send and receive timeouts. Reads go through an internal
//! replay buffer so line-oriented parsing can over-read and hand the
//! surplus back to the next call; no byte is ever discarded. Every
//! blocking call is bounded by the corresponding timeout and surfaces
//! expiry as a typed error, never a silent hang.

use crate::base::NetError;
use crate::socket::Socket;
use socket2::SockAddr;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default replay-buffer capacity, which doubles as the line-length cap.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// A connected socket with buffering and timeouts.
///
/// Created on `accept()` or `connect()`; dropping (or [`close`]) shuts
/// the socket down exactly once.
///
/// [`close`]: Connection::close
#[derive(Debug)]
pub struct Connection {
    socket: Socket,
    buf: Vec<u8>,
    buf_pos: usize,
    capacity: usize,
    recv_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
}

impl Connection {
    /// Wraps a connected socket with the default buffer capacity.
    pub fn new(socket: Socket) -> Self {
        Self::with_capacity(socket, DEFAULT_BUFFER_CAPACITY)
    }

    /// Wraps a connected socket with an explicit buffer capacity.
    ///
    /// The capacity bounds both buffered read-ahead and the maximum
    /// accepted line length in [`read_line`](Self::read_line).
    pub fn with_capacity(socket: Socket, capacity: usize) -> Self {
        Self {
            socket,
            buf: Vec::new(),
            buf_pos: 0,
            capacity: capacity.max(1),
            recv_timeout: None,
            send_timeout: None,
        }
    }

    /// Sets the receive timeout; `None` blocks indefinitely.
    pub fn set_recv_timeout(&mut self, timeout: Option<Duration>) -> Result<(), NetError> {
        self.socket
            .raw()?
            .set_read_timeout(timeout)
            .map_err(|e| NetError::Io(Arc::new(e)))?;
        self.recv_timeout = timeout;
        Ok(())
    }

    /// Sets the send timeout; `None` blocks indefinitely.
    pub fn set_send_timeout(&mut self, timeout: Option<Duration>) -> Result<(), NetError> {
        self.socket
            .raw()?
            .set_write_timeout(timeout)
            .map_err(|e| NetError::Io(Arc::new(e)))?;
        self.send_timeout = timeout;
        Ok(())
    }

    /// The configured receive timeout.
    pub fn recv_timeout(&self) -> Option<Duration> {
        self.recv_timeout
    }

    /// The configured send timeout.
    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout
    }

    /// True while the underlying socket is open.
    pub fn is_open(&self) -> bool {
        self.socket.is_open()
    }

    /// The peer's address.
    pub fn peer_addr(&self) -> Result<SockAddr, NetError> {
        self.socket
            .raw()?
            .peer_addr()
            .map_err(|e| NetError::Io(Arc::new(e)))
    }

    /// Shutdown-only handle for waking a blocked read from another
    /// thread (see [`Socket::interrupter`]).
    pub fn interrupter(&self) -> Result<crate::socket::Interrupter, NetError> {
        self.socket.interrupter()
    }

    /// Writes all of `data`, retrying partial writes within the send
    /// timeout budget.
    ///
    /// Fails with [`NetError::WriteTimeout`] when the budget elapses
    /// before the last byte is accepted, or with a connection error.
    pub fn send(&mut self, data: &[u8]) -> Result<(), NetError> {
        let deadline = self.send_timeout.map(|t| Instant::now() + t);
        let mut written = 0;
        while written < data.len() {
            if let Some(d) = deadline {
                // The OS write timeout tracks the remaining budget so a
                // single stalled write cannot overshoot the deadline.
                let remaining = d.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    self.restore_send_timeout();
                    return Err(NetError::WriteTimeout);
                }
                self.socket
                    .raw()?
                    .set_write_timeout(Some(remaining))
                    .map_err(|e| NetError::Io(Arc::new(e)))?;
            }
            let mut raw = self.socket.raw()?;
            match raw.write(&data[written..]) {
                Ok(0) => return Err(NetError::BrokenPipe),
                Ok(n) => written += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.restore_send_timeout();
                    return Err(NetError::from_write_io(e));
                }
            }
        }
        self.restore_send_timeout();
        Ok(())
    }

    /// Puts the configured send timeout back after a deadline-driven
    /// per-write adjustment. Best effort; the socket may be gone.
    fn restore_send_timeout(&self) {
        if self.send_timeout.is_some() {
            if let Ok(raw) = self.socket.raw() {
                let _ = raw.set_write_timeout(self.send_timeout);
            }
        }
    }

    /// Reads at least one byte into `buf`.
    ///
    /// Returns `Ok(0)` on peer close (a normal EOF signal, not an
    /// error) and [`NetError::ReadTimeout`] when the receive timeout
    /// elapses first. Bytes buffered by an earlier over-read are
    /// returned before the socket is touched.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        if self.buffered_len() > 0 {
            let n = self.buffered_len().min(buf.len());
            buf[..n].copy_from_slice(&self.buf[self.buf_pos..self.buf_pos + n]);
            self.consume(n);
            return Ok(n);
        }
        let mut raw = self.socket.raw()?;
        loop {
            match raw.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(NetError::from_read_io(e)),
            }
        }
    }

    /// Reads one CRLF- or LF-terminated line, without its terminator.
    ///
    /// Returns `Ok(None)` on a clean EOF before any byte of the line;
    /// an EOF mid-line yields the partial line. Lines longer than the
    /// buffer capacity fail with [`NetError::LineTooLong`]. Bytes past
    /// the terminator stay buffered for the next read.
    pub fn read_line(&mut self) -> Result<Option<String>, NetError> {
        loop {
            if let Some(rel) = self.buf[self.buf_pos..].iter().position(|&b| b == b'\n') {
                let end = self.buf_pos + rel;
                let mut line = &self.buf[self.buf_pos..end];
                if line.last() == Some(&b'\r') {
                    line = &line[..line.len() - 1];
                }
                let out = String::from_utf8_lossy(line).into_owned();
                self.consume(rel + 1);
                return Ok(Some(out));
            }
            if self.buffered_len() >= self.capacity {
                return Err(NetError::LineTooLong);
            }
            if self.fill()? == 0 {
                // EOF: hand back whatever is pending, if anything.
                if self.buffered_len() == 0 {
                    return Ok(None);
                }
                let out = String::from_utf8_lossy(&self.buf[self.buf_pos..]).into_owned();
                self.consume(self.buffered_len());
                return Ok(Some(out));
            }
        }
    }

    /// Reads exactly `n` bytes, honoring the replay buffer.
    ///
    /// Premature EOF fails with [`NetError::ContentLengthMismatch`].
    pub fn read_exact_buffered(&mut self, n: usize) -> Result<Vec<u8>, NetError> {
        let mut out = Vec::with_capacity(n);
        let take = self.buffered_len().min(n);
        out.extend_from_slice(&self.buf[self.buf_pos..self.buf_pos + take]);
        self.consume(take);

        let mut chunk = [0u8; 4096];
        while out.len() < n {
            let want = (n - out.len()).min(chunk.len());
            let got = {
                let mut raw = self.socket.raw()?;
                loop {
                    match raw.read(&mut chunk[..want]) {
                        Ok(m) => break m,
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                        Err(e) => return Err(NetError::from_read_io(e)),
                    }
                }
            };
            if got == 0 {
                return Err(NetError::ContentLengthMismatch);
            }
            out.extend_from_slice(&chunk[..got]);
        }
        Ok(out)
    }

    /// Reads until the peer closes.
    pub fn read_to_end_buffered(&mut self) -> Result<Vec<u8>, NetError> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.buf[self.buf_pos..]);
        let drained = self.buffered_len();
        self.consume(drained);

        let mut chunk = [0u8; 4096];
        loop {
            let got = {
                let mut raw = self.socket.raw()?;
                loop {
                    match raw.read(&mut chunk) {
                        Ok(m) => break m,
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                        Err(e) => return Err(NetError::from_read_io(e)),
                    }
                }
            };
            if got == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..got]);
        }
    }

    /// Closes the connection. Idempotent; double close is a no-op.
    pub fn close(&mut self) {
        self.socket.close();
    }

    fn buffered_len(&self) -> usize {
        self.buf.len() - self.buf_pos
    }

    fn consume(&mut self, n: usize) {
        self.buf_pos += n;
        if self.buf_pos >= self.buf.len() {
            self.buf.clear();
            self.buf_pos = 0;
        } else if self.buf_pos >= self.capacity {
            // Compact the consumed prefix so the buffer stays bounded
            // by the capacity even when it never fully drains.
            self.buf.drain(..self.buf_pos);
            self.buf_pos = 0;
        }
    }

    /// Pulls one read's worth of bytes off the socket into the buffer.
    /// Returns the number of bytes added; 0 means EOF.
    fn fill(&mut self) -> Result<usize, NetError> {
        let mut chunk = [0u8; 1024];
        let room = (self.capacity - self.buffered_len()).min(chunk.len());
        let got = {
            let mut raw = self.socket.raw()?;
            loop {
                match raw.read(&mut chunk[..room]) {
                    Ok(m) => break m,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(NetError::from_read_io(e)),
                }
            }
        };
        self.buf.extend_from_slice(&chunk[..got]);
        Ok(got)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
