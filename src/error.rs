// Error taxonomy for the mock server and its client-side helpers.
//
// Modeled on `micro_http`'s hand-rolled `*Error` enums (`common/mod.rs`): a
// closed set of variants with a manual `Display` impl, no `thiserror`.

use std::fmt::{self, Display, Formatter};
use std::io;

/// Errors produced by the mock server, its connections, and its test client.
#[derive(Debug)]
pub enum MockError {
    /// A syscall on a connected stream failed, or a peer closed mid-frame.
    NetworkError(io::Error),
    /// An operation was attempted on a client handle that isn't connected.
    NotConnected,
    /// `Server::start` was called while the server was already running.
    AlreadyRunning,
    /// An operation that requires a running server was attempted while down.
    ServerIsDown,
    /// A client attempted to connect while already connected.
    AlreadyConnected,
}

impl Display for MockError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::NetworkError(inner) => write!(f, "network error: {}", inner),
            Self::NotConnected => write!(f, "client is not connected"),
            Self::AlreadyRunning => write!(f, "server already running"),
            Self::ServerIsDown => write!(f, "server is down"),
            Self::AlreadyConnected => write!(f, "client is already connected"),
        }
    }
}

impl std::error::Error for MockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NetworkError(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<io::Error> for MockError {
    fn from(e: io::Error) -> Self {
        Self::NetworkError(e)
    }
}

pub type Result<T> = std::result::Result<T, MockError>;
