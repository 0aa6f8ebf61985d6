// Actions: side effects an expectation performs against a client stream once
// its trigger fires.
//
// Grounded in `nemok::action`/`expectation::act` (`server.h`): a FIFO list of
// closures run strictly in declaration order, where `close_connection` makes
// later actions in the same expectation no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::stream::Stream;

/// A single side effect run when an expectation fires.
#[derive(Clone)]
pub enum Action {
    /// Writes the given bytes to the connection (`write_all` discipline).
    Write(Vec<u8>),
    /// Sleeps the firing thread for the given duration.
    Freeze(Duration),
    /// Half-closes and releases the stream; later actions in the same
    /// expectation become no-ops.
    CloseConnection,
    /// Raises the server-wide terminate flag.
    ShutdownServer,
}

impl Action {
    /// Runs one action. Returns `Ok(true)` if the connection was just closed
    /// (so the caller should stop running the remaining actions).
    fn fire(&self, stream: &mut Stream, terminate: &Arc<AtomicBool>) -> Result<bool> {
        match self {
            Self::Write(bytes) => {
                stream.write_all(bytes)?;
                Ok(false)
            }
            Self::Freeze(duration) => {
                thread::sleep(*duration);
                Ok(false)
            }
            Self::CloseConnection => {
                stream.disconnect();
                Ok(true)
            }
            Self::ShutdownServer => {
                terminate.store(true, Ordering::SeqCst);
                Ok(false)
            }
        }
    }
}

/// Runs a list of actions in order, short-circuiting once the connection is
/// closed by one of them.
pub fn fire_all(actions: &[Action], stream: &mut Stream, terminate: &Arc<AtomicBool>) -> Result<()> {
    for action in actions {
        if action.fire(stream, terminate)? {
            break;
        }
    }
    Ok(())
}
