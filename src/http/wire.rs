// Wire-level HTTP/1.x framing: locates a full request frame in a byte
// buffer and tokenizes its request line, headers, and body.
//
// Grounded in `original_source/nemok/http.cpp`'s `wire::request::parse`:
// locate the end of the header block (`\r\n\r\n`), read `Content-Length` out
// of the headers, and only call the frame complete once that many body bytes
// have also arrived. The byte-search helper (`find`) mirrors
// `micro_http::request::find`.

use std::collections::HashMap;
use std::str::from_utf8;

use log::warn;

const CRLF: &[u8] = b"\r\n";
const CRLFCRLF: &[u8] = b"\r\n\r\n";

/// Finds the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Delete,
    Trace,
    Options,
    Connect,
    Patch,
    /// A token that doesn't match any known method (spec.md §4.6: BAD frames
    /// are complete but unmatchable, never "incomplete").
    Bad,
}

impl Method {
    fn parse(token: &[u8]) -> Self {
        match token {
            b"GET" => Self::Get,
            b"POST" => Self::Post,
            b"HEAD" => Self::Head,
            b"PUT" => Self::Put,
            b"DELETE" => Self::Delete,
            b"TRACE" => Self::Trace,
            b"OPTIONS" => Self::Options,
            b"CONNECT" => Self::Connect,
            b"PATCH" => Self::Patch,
            _ => Self::Bad,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Head => "HEAD",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Trace => "TRACE",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Patch => "PATCH",
            Self::Bad => "BAD",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
    /// See `Method::Bad`.
    Bad,
}

impl Version {
    fn parse(token: &[u8]) -> Self {
        match token {
            b"HTTP/1.0" => Self::Http10,
            b"HTTP/1.1" => Self::Http11,
            _ => Self::Bad,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
            Self::Bad => "BAD",
        }
    }
}

/// A fully-framed HTTP request: enough bytes have arrived to know the frame's
/// length, whether or not its contents are well-formed.
#[derive(Debug)]
pub struct ParsedRequest {
    pub method: Method,
    pub uri: String,
    pub version: Version,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Total bytes this frame occupies in the input buffer; the trigger
    /// consumes exactly this many bytes on a full match.
    pub frame_length: usize,
}

pub enum ParseOutcome {
    /// Not enough bytes have arrived yet to know the frame's length.
    Incomplete,
    Complete(ParsedRequest),
}

/// Attempts to frame one HTTP request out of the front of `input`.
///
/// A malformed method/version still produces a `Complete` frame (tagged
/// `Method::Bad`/`Version::Bad`) so a declared `unexpected()` catch-all can
/// consume it; only a missing header terminator or short body counts as
/// `Incomplete`.
pub fn parse_request(input: &[u8]) -> ParseOutcome {
    let header_end = match find(input, CRLFCRLF) {
        Some(pos) => pos,
        None => return ParseOutcome::Incomplete,
    };

    let head = &input[..header_end];
    let body_start = header_end + CRLFCRLF.len();

    let line_end = match find(head, CRLF) {
        Some(pos) => pos,
        None => return ParseOutcome::Incomplete,
    };
    let request_line = &head[..line_end];
    let header_block = &head[line_end + CRLF.len()..];

    let (method, uri, version) = match parse_request_line(request_line) {
        Some(parts) => parts,
        None => return ParseOutcome::Incomplete,
    };

    let headers = parse_headers(header_block);
    let content_length = headers
        .get("Content-Length")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let frame_length = body_start + content_length;
    if input.len() < frame_length {
        return ParseOutcome::Incomplete;
    }

    let body = input[body_start..frame_length].to_vec();

    if method == Method::Bad || version == Version::Bad {
        warn!("parsed a malformed request frame (method={:?}, version={:?})", method, version);
    }

    ParseOutcome::Complete(ParsedRequest {
        method,
        uri,
        version,
        headers,
        body,
        frame_length,
    })
}

fn parse_request_line(line: &[u8]) -> Option<(Method, String, Version)> {
    let first_space = find(line, b" ")?;
    let method = Method::parse(&line[..first_space]);

    let rest = &line[first_space + 1..];
    let second_space = find(rest, b" ")?;
    let uri = from_utf8(&rest[..second_space]).ok()?.to_string();
    let version = Version::parse(&rest[second_space + 1..]);

    Some((method, uri, version))
}

fn parse_headers(block: &[u8]) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    let mut rest = block;
    while let Some(pos) = find(rest, CRLF) {
        let line = &rest[..pos];
        if let Some(colon) = find(line, b":") {
            if let (Ok(name), Ok(value)) = (
                from_utf8(&line[..colon]),
                from_utf8(&line[colon + 1..]),
            ) {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
        rest = &rest[pos + CRLF.len()..];
    }
    // The final header line has no trailing CRLF captured by the loop above
    // once `rest` no longer contains one; handle it directly.
    if !rest.is_empty() {
        if let Some(colon) = find(rest, b":") {
            if let (Ok(name), Ok(value)) = (
                from_utf8(&rest[..colon]),
                from_utf8(&rest[colon + 1..]),
            ) {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }
    headers
}
