// HTTP/1.x specialization: structural request matchers and response
// builders layered over the shared `MockBuilder` chain.
//
// Grounded in `original_source/nemok/http.h`'s `http::GET/POST/.../unexpected`
// static factories and `http_response`. The uppercase factory names are kept
// verbatim from the reference (`#[allow(non_snake_case)]`) since they read as
// the HTTP verbs they represent, the same way the reference's `GET`/`POST`
// free functions do; everything downstream of them is idiomatic Rust.

use std::time::Duration;

use super::status::reason_phrase;
use super::wire::Method;
use super::RequestPattern;
use crate::declare::MockBuilder;
use crate::engine::ExpectationSet;
use crate::trigger::TriggerKind;

/// Declares a sequence of HTTP expectations, finalizing into an
/// [`ExpectationSet`] via [`HttpMock::build`].
pub struct HttpMock(MockBuilder);

impl HttpMock {
    pub fn new() -> Self {
        Self(MockBuilder::new())
    }

    /// Stages a new expectation matching `pattern`. Finalizes whatever was
    /// previously staged, mirroring `telnet::TelnetMock::when`.
    pub fn when(&mut self, pattern: RequestPattern) -> &mut Self {
        self.0.when(TriggerKind::Http(pattern));
        self
    }

    /// Adds a header requirement to the pattern currently being staged.
    /// Panics if called before `when`, same as any other modifier here.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let pattern = self
            .0
            .http_pattern_mut()
            .expect("header() only applies to an HTTP when()");
        *pattern = std::mem::take(pattern).header(name, value);
        self
    }

    pub fn content(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        let pattern = self
            .0
            .http_pattern_mut()
            .expect("content() only applies to an HTTP when()");
        *pattern = std::mem::take(pattern).body(body);
        self
    }

    /// Stages a write action of `response(code)`.
    pub fn reply(&mut self, status: u16) -> &mut Self {
        self.0.write(response(status));
        self
    }

    /// Like `reply`, but with a body and a `Content-Length` header.
    pub fn reply_with(&mut self, status: u16, body: impl AsRef<[u8]>) -> &mut Self {
        let mut bytes = status_line(status);
        let body = body.as_ref();
        bytes.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
        bytes.extend_from_slice(body);
        self.0.write(bytes);
        self
    }

    pub fn freeze(&mut self, micros: u64) -> &mut Self {
        self.0.freeze(Duration::from_micros(micros));
        self
    }

    pub fn times(&mut self, n: u32) -> &mut Self {
        self.0.times(n);
        self
    }

    pub fn once(&mut self) -> &mut Self {
        self.times(1)
    }

    pub fn order(&mut self, order: i32) -> &mut Self {
        self.0.order(order);
        self
    }

    pub fn close_connection(&mut self) -> &mut Self {
        self.0.close_connection();
        self
    }

    pub fn shutdown_server(&mut self) -> &mut Self {
        self.0.shutdown_server();
        self
    }

    pub fn build(self) -> ExpectationSet {
        self.0.build()
    }
}

impl Default for HttpMock {
    fn default() -> Self {
        Self::new()
    }
}

fn status_line(code: u16) -> Vec<u8> {
    let reason = reason_phrase(code).unwrap_or("");
    format!("HTTP/1.1 {} {}\r\n", code, reason).into_bytes()
}

/// The serialized status line plus an empty header block, e.g.
/// `HTTP/1.1 200 OK\r\n\r\n`. Unknown codes serialize with an empty reason.
pub fn response(code: u16) -> Vec<u8> {
    let mut bytes = status_line(code);
    bytes.extend_from_slice(b"\r\n");
    bytes
}

/// Serializes a request the way a test client sends one: used by
/// integration tests exercising the server from the outside.
pub fn serialize_request(
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> Vec<u8> {
    let mut out = format!("{} {} HTTP/1.1\r\n", method.as_str(), uri).into_bytes();
    out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    for (name, value) in headers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

#[allow(non_snake_case)]
pub fn GET() -> RequestPattern {
    RequestPattern::new().method(Method::Get)
}
#[allow(non_snake_case)]
pub fn POST() -> RequestPattern {
    RequestPattern::new().method(Method::Post)
}
#[allow(non_snake_case)]
pub fn HEAD() -> RequestPattern {
    RequestPattern::new().method(Method::Head)
}
#[allow(non_snake_case)]
pub fn PUT() -> RequestPattern {
    RequestPattern::new().method(Method::Put)
}
#[allow(non_snake_case)]
pub fn DELETE() -> RequestPattern {
    RequestPattern::new().method(Method::Delete)
}
#[allow(non_snake_case)]
pub fn TRACE() -> RequestPattern {
    RequestPattern::new().method(Method::Trace)
}
#[allow(non_snake_case)]
pub fn OPTIONS() -> RequestPattern {
    RequestPattern::new().method(Method::Options)
}
#[allow(non_snake_case)]
pub fn CONNECT() -> RequestPattern {
    RequestPattern::new().method(Method::Connect)
}
#[allow(non_snake_case)]
pub fn PATCH() -> RequestPattern {
    RequestPattern::new().method(Method::Patch)
}

/// A wildcard pattern matching any well-formed request. Does not get a
/// lower priority automatically — pair with `.order(n)` above
/// [`crate::expectation::DEFAULT_ORDER`] so it only fires once nothing more
/// specific matched (see spec.md §4.9 and the Open Question it resolves).
pub fn unexpected() -> RequestPattern {
    RequestPattern::new()
}
