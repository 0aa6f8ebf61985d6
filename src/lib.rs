//! Programmable mock TCP servers for integration tests.
//!
//! A test declares a sequence of *expectations* — "when input matches
//! pattern P, perform actions A" — against a line protocol ([`telnet`]) or
//! HTTP/1.x ([`http`]), starts a [`MockServer`] on an ephemeral port, and
//! drives it with ordinary client sockets. Every accepted connection gets
//! its own thread and its own private snapshot of the declared expectations;
//! firing an expectation rotates it to the back of its priority bucket (or
//! retires it once it has fired `times()` times), never across connections.
//!
//! ```no_run
//! use mockwire::telnet::TelnetMock;
//!
//! let mut mock = TelnetMock::new();
//! mock.when("hello world").reply("hola mundo");
//! let mut server = mockwire::start(mock.build(), 0).unwrap();
//! # let _ = server.port();
//! ```
//!
//! [`start`] binds and starts in one call and returns an already-running
//! handle; [`MockServer::new`] plus a separate [`MockServer::start`] is
//! available when a test needs to declare expectations and start the
//! listener as distinct steps.

pub mod action;
mod declare;
pub mod engine;
pub mod error;
pub mod expectation;
pub mod http;
mod server;
pub mod stream;
pub mod telnet;
pub mod trigger;

pub use error::{MockError, Result};
pub use server::{start, MockServer};
pub use stream::{connect, read_all, read_some, Stream};
