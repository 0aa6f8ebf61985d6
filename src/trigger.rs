// Triggers: pure predicates over the input buffer that consume matched bytes
// on success.
//
// The reference implementation (`original_source/nemok/server.h`) models each
// trigger kind as its own callable struct (`starts_with`, `any_line`, `regex`)
// implementing `operator()(buffer_type&)`. `server.h`'s design comment
// recommends a tagged variant over boxed callables "to make engine state
// inspectable for tests" (see spec.md §9) — `TriggerKind` is that tagged
// variant.

use regex::bytes::Regex;

use crate::http::{self, RequestPattern};

/// A predicate over the connection's input buffer.
///
/// On a successful match the matched bytes are removed from the front of the
/// buffer (for `Prefix`/`AnyLine`/`Http`) or from the matched range (`Regex`).
/// A failed match must leave the buffer bytewise unchanged — this invariant is
/// relied on by the matching engine's progress guarantee.
#[derive(Clone)]
pub enum TriggerKind {
    /// Matches iff the buffer starts with the given bytes.
    Prefix(Vec<u8>),
    /// Matches iff a terminator byte is present anywhere in the buffer.
    AnyLine { terminator: u8 },
    /// Matches iff the compiled pattern matches a prefix of the buffer.
    Regex(Regex),
    /// Delegates to the HTTP wire parser; matches a complete, pattern-matching
    /// request frame.
    Http(RequestPattern),
}

impl TriggerKind {
    /// Attempts the match, mutating `input` only when it succeeds.
    pub fn try_match(&self, input: &mut Vec<u8>) -> bool {
        match self {
            Self::Prefix(expected) => {
                if input.starts_with(expected) {
                    input.drain(..expected.len());
                    true
                } else {
                    false
                }
            }
            Self::AnyLine { terminator } => {
                match input.iter().position(|b| b == terminator) {
                    Some(pos) => {
                        input.drain(..=pos);
                        true
                    }
                    None => false,
                }
            }
            // Mirrors the reference regex trigger: a match anywhere in the
            // buffer consumes everything from the start up to match.end(),
            // not just the matched span itself (see spec.md §4.3).
            Self::Regex(re) => match re.find(input) {
                Some(m) => {
                    let end = m.end();
                    input.drain(..end);
                    true
                }
                None => false,
            },
            Self::Http(pattern) => match http::parse_request(input) {
                http::ParseOutcome::Incomplete => false,
                http::ParseOutcome::Complete(parsed) => {
                    if pattern.matches(&parsed) {
                        input.drain(..parsed.frame_length);
                        true
                    } else {
                        false
                    }
                }
            },
        }
    }
}
