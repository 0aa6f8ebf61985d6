// Bidirectional byte stream to one connected peer.
//
// Grounded in two places: the short-I/O read/write wrappers mirror
// `micro_http`'s `common::net::PollableStream` (Read/Write impls over an enum
// wrapping the OS stream type), while the poll-with-timeout discipline that
// lets a session loop notice a shutdown promptly is carried from
// `nemok::client::read_some` (a 100ms `poll()` retried on timeout/EINTR).

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MockError, Result};

/// How long a single `read_some` poll waits before re-checking for more work.
/// Short enough that a session loop notices a shutdown/EOF promptly.
const POLL_TIMEOUT_MS: i32 = 100;

/// A connected byte stream, wrapping one TCP connection.
///
/// `Stream` is used both for the server side of a connection (handed to
/// actions as they fire) and the client side (returned by `connect_client`).
pub struct Stream {
    inner: Option<TcpStream>,
}

impl Stream {
    pub fn new(inner: TcpStream) -> Self {
        // Blocking mode: reads are subjected to our own poll-with-timeout
        // loop below rather than the kernel's non-blocking short reads.
        let _ = inner.set_nodelay(true);
        Self { inner: Some(inner) }
    }

    /// True while the underlying handle is present (not yet `disconnect`ed).
    pub fn connected(&self) -> bool {
        self.inner.is_some()
    }

    fn handle(&mut self) -> Result<&mut TcpStream> {
        self.inner.as_mut().ok_or(MockError::NotConnected)
    }

    /// Reads up to `buf.len()` bytes, polling in `POLL_TIMEOUT_MS` slices so
    /// callers driving a loop can observe termination requests between reads.
    ///
    /// Returns `Ok(0)` when the peer has closed its write half.
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_some_while(buf, None)
    }

    /// Like `read_some`, but also returns `Ok(0)` as soon as `terminate` is
    /// raised, even if the peer never sends anything — this is what lets a
    /// session loop serving an idle connection notice a server shutdown
    /// within one `POLL_TIMEOUT_MS` slice instead of blocking forever.
    pub fn read_some_interruptible(
        &mut self,
        buf: &mut [u8],
        terminate: &Arc<AtomicBool>,
    ) -> Result<usize> {
        self.read_some_while(buf, Some(terminate))
    }

    fn read_some_while(&mut self, buf: &mut [u8], terminate: Option<&Arc<AtomicBool>>) -> Result<usize> {
        let fd = self.handle()?.as_raw_fd();
        loop {
            if terminate.map(|t| t.load(Ordering::SeqCst)).unwrap_or(false) {
                return Ok(0);
            }
            match poll_readable(fd, POLL_TIMEOUT_MS) {
                PollOutcome::Ready => {
                    let stream = self.handle()?;
                    match stream.read(buf) {
                        Ok(n) => return Ok(n),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                        Err(e) => return Err(MockError::NetworkError(e)),
                    }
                }
                PollOutcome::Timeout => continue,
                PollOutcome::Error(e) => return Err(MockError::NetworkError(e)),
            }
        }
    }

    /// Reads until `buf` is completely filled or the connection errors.
    pub fn read_all(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut read = 0;
        while read < buf.len() {
            let n = self.read_some(&mut buf[read..])?;
            if n == 0 {
                return Err(MockError::NetworkError(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed mid-frame",
                )));
            }
            read += n;
        }
        Ok(())
    }

    /// Writes some prefix of `buf`, retrying on interruption.
    pub fn write_some(&mut self, buf: &[u8]) -> Result<usize> {
        loop {
            let stream = self.handle()?;
            match stream.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MockError::NetworkError(e)),
            }
        }
    }

    /// Writes the full buffer, looping over short writes.
    pub fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < buf.len() {
            written += self.write_some(&buf[written..])?;
        }
        Ok(())
    }

    /// Half-closes both directions of the socket; the handle stays present.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(stream) = self.inner.as_ref() {
            // A peer that already dropped its end makes this a harmless no-op.
            let _ = stream.shutdown(Shutdown::Both);
        }
        Ok(())
    }

    /// Half-closes and releases the underlying handle.
    pub fn disconnect(&mut self) {
        if self.inner.is_some() {
            let _ = self.shutdown();
            self.inner = None;
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.disconnect();
    }
}

enum PollOutcome {
    Ready,
    Timeout,
    Error(io::Error),
}

fn poll_readable(fd: i32, timeout_ms: i32) -> PollOutcome {
    let mut fds = [libc::pollfd {
        fd,
        events: libc::POLLIN | libc::POLLERR | libc::POLLHUP,
        revents: 0,
    }];

    // SAFETY: `fds` is a valid, uniquely-owned array of one `pollfd` for the
    // duration of the call.
    let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };

    match ret {
        0 => PollOutcome::Timeout,
        n if n < 0 => {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                PollOutcome::Timeout
            } else {
                PollOutcome::Error(err)
            }
        }
        _ => PollOutcome::Ready,
    }
}

/// Opens a TCP connection to a locally running [`crate::MockServer`].
pub fn connect(port: u16) -> Result<Stream> {
    let stream = TcpStream::connect(("127.0.0.1", port)).map_err(MockError::NetworkError)?;
    Ok(Stream::new(stream))
}

/// Reads exactly `len` bytes from `stream`, as a `String` of raw bytes.
///
/// Convenience mirroring the scenario helpers in spec.md §8 — tests assert on
/// a fixed number of expected response bytes.
pub fn read_all(stream: &mut Stream, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    stream.read_all(&mut buf)?;
    Ok(buf)
}

/// Reads whatever is immediately available, up to `len` bytes.
pub fn read_some(stream: &mut Stream, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let n = stream.read_some(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn read_some_returns_zero_on_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (sock, _) = listener.accept().unwrap();
            drop(sock);
        });

        let mut client = connect(port).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(client.read_some(&mut buf).unwrap(), 0);
        handle.join().unwrap();
    }

    #[test]
    fn write_all_then_read_all_round_trips() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (sock, _) = listener.accept().unwrap();
            let mut server_side = Stream::new(sock);
            let mut buf = [0u8; 5];
            server_side.read_all(&mut buf).unwrap();
            server_side.write_all(&buf).unwrap();
        });

        let mut client = connect(port).unwrap();
        client.write_all(b"hello").unwrap();
        let echoed = read_all(&mut client, 5).unwrap();
        assert_eq!(&echoed, b"hello");
        handle.join().unwrap();
    }

    #[test]
    fn not_connected_after_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let _ = listener.accept().unwrap();
        });
        let mut client = connect(port).unwrap();
        client.disconnect();
        assert!(!client.connected());
        assert!(client.write_all(b"x").is_err());
        handle.join().unwrap();
    }
}
