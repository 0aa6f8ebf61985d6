// The TCP acceptor and thread-per-connection harness.
//
// Grounded in `original_source/nemok/server.cpp`'s `server::start/stop/wait`
// and `accept_connections`/`client_pool`: a non-blocking listener polled in a
// retry loop (`usleep`-on-`EWOULDBLOCK` there, a short `thread::sleep` here),
// one thread per accepted connection, and a join-all on shutdown. The
// readiness rendezvous (bind happens before `start` returns, with the
// effective port available immediately) mirrors the reference's
// promise/future handshake, done here with a channel.

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, trace, warn};

use crate::engine::ExpectationSet;
use crate::error::{MockError, Result};
use crate::stream::Stream;

/// How long the accept loop sleeps between non-blocking `accept` attempts.
const ACCEPT_RETRY: Duration = Duration::from_millis(1);

/// A programmable mock TCP server.
///
/// Declare expectations against a fresh `MockServer` before calling
/// [`MockServer::start`]; mutating the template set after that point is not
/// observed by sessions already snapshotted from it (spec.md §5, "Shared-
/// resource policy").
pub struct MockServer {
    template: ExpectationSet,
    effective_port: Arc<AtomicU16>,
    terminate: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn new(template: ExpectationSet) -> Self {
        Self {
            template,
            effective_port: Arc::new(AtomicU16::new(0)),
            terminate: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            acceptor: None,
        }
    }

    /// Binds an ephemeral port (pass `0`) or a specific one, spawns the
    /// accept loop, and returns the port actually bound. Blocks until the
    /// listener is bound and ready to accept.
    pub fn start(&mut self, port: u16) -> Result<u16> {
        if self.running.load(Ordering::SeqCst) {
            return Err(MockError::AlreadyRunning);
        }

        let listener =
            TcpListener::bind(("127.0.0.1", port)).map_err(MockError::NetworkError)?;
        listener
            .set_nonblocking(true)
            .map_err(MockError::NetworkError)?;
        let effective_port = listener.local_addr().map_err(MockError::NetworkError)?.port();

        self.terminate.store(false, Ordering::SeqCst);
        self.effective_port.store(effective_port, Ordering::SeqCst);

        let template = self.template.clone();
        let terminate = Arc::clone(&self.terminate);
        let running = Arc::clone(&self.running);
        let effective_port_handle = Arc::clone(&self.effective_port);

        let (ready_tx, ready_rx) = mpsc::channel();
        self.acceptor = Some(thread::spawn(move || {
            running.store(true, Ordering::SeqCst);
            let _ = ready_tx.send(());
            accept_loop(listener, template, &terminate);
            running.store(false, Ordering::SeqCst);
            effective_port_handle.store(0, Ordering::SeqCst);
        }));

        let _ = ready_rx.recv();
        debug!("mock server listening on 127.0.0.1:{}", effective_port);
        Ok(effective_port)
    }

    /// Requests shutdown; does not block. Call [`MockServer::wait`] to join
    /// the acceptor thread afterwards.
    pub fn stop(&mut self) {
        debug!("mock server on port {} received a stop request", self.port());
        self.terminate.store(true, Ordering::SeqCst);
    }

    /// Joins the acceptor thread, returning once every worker it spawned has
    /// also finished.
    pub fn wait(&mut self) {
        if let Some(handle) = self.acceptor.take() {
            let _ = handle.join();
        }
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn port(&self) -> u16 {
        self.effective_port.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}

/// One-call convenience: builds a server from `set`, starts it on `port`
/// (`0` for an ephemeral port), and returns the running handle.
///
/// Mirrors the reference's `nemok::start<T>()` factory (`server.h`): a test
/// normally only wants "declare expectations, then get back a live server",
/// not a separate `MockServer::new` followed by `.start`. `MockServer`'s
/// `Drop` already stops and joins the acceptor, so the handle returned here
/// auto-stops on destruction exactly like the reference's scoped `mock<T>`.
pub fn start(set: ExpectationSet, port: u16) -> Result<MockServer> {
    let mut server = MockServer::new(set);
    server.start(port)?;
    Ok(server)
}

fn accept_loop(listener: TcpListener, template: ExpectationSet, terminate: &Arc<AtomicBool>) {
    let mut workers = Vec::new();

    while !terminate.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((socket, addr)) => {
                trace!("accepted connection from {}", addr);
                let session_set = template.clone();
                let session_terminate = Arc::clone(terminate);
                workers.push(thread::spawn(move || {
                    run_session(socket, session_set, &session_terminate);
                }));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_RETRY);
            }
            Err(e) => {
                warn!("accept() failed: {}", e);
                thread::sleep(ACCEPT_RETRY);
            }
        }
    }

    debug!("accept loop exiting, joining {} worker(s)", workers.len());
    for worker in workers {
        let _ = worker.join();
    }
}

/// Drives one connection to completion: read whatever arrived, feed it to
/// the engine, repeat until EOF, a hard I/O error, or `terminate` is raised.
///
/// A single bad expectation's action error ends only this session; it never
/// propagates to the acceptor or other connections.
fn run_session(socket: std::net::TcpStream, mut set: ExpectationSet, terminate: &Arc<AtomicBool>) {
    let mut stream = Stream::new(socket);
    let mut input = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        if terminate.load(Ordering::SeqCst) {
            break;
        }
        if !stream.connected() {
            break;
        }

        let n = match stream.read_some_interruptible(&mut buf, terminate) {
            Ok(n) => n,
            Err(e) => {
                error!("session read failed: {}", e);
                break;
            }
        };
        if n == 0 {
            break;
        }
        input.extend_from_slice(&buf[..n]);

        if let Err(e) = set.feed(&mut input, &mut stream, terminate) {
            error!("expectation action failed, ending session: {}", e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telnet::TelnetMock;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    #[test]
    fn start_reports_the_bound_port_and_accepts_a_connection() {
        let mut mock = TelnetMock::new();
        mock.when("ping").reply("pong");
        let mut server = MockServer::new(mock.build());

        let port = server.start(0).unwrap();
        assert!(port > 0);
        assert!(server.running());

        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");

        server.stop();
        server.wait();
        assert!(!server.running());
    }

    #[test]
    fn restart_cycle_returns_to_a_clean_state() {
        let mock = TelnetMock::new();
        let mut server = MockServer::new(mock.build());

        let first_port = server.start(0).unwrap();
        server.stop();
        server.wait();
        assert_eq!(server.port(), 0);

        let second_port = server.start(0).unwrap();
        assert!(second_port > 0);
        server.stop();
        server.wait();
        let _ = first_port;
    }

    #[test]
    fn starting_twice_is_rejected() {
        let mut server = MockServer::new(TelnetMock::new().build());
        server.start(0).unwrap();
        assert!(matches!(server.start(0), Err(MockError::AlreadyRunning)));
        server.stop();
        server.wait();
    }

    #[test]
    fn start_factory_returns_an_already_running_handle() {
        let mut mock = TelnetMock::new();
        mock.when("ping").reply("pong");

        let mut server = start(mock.build(), 0).unwrap();
        assert!(server.running());

        let mut client = TcpStream::connect(("127.0.0.1", server.port())).unwrap();
        client.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");

        server.stop();
        server.wait();
    }
}
