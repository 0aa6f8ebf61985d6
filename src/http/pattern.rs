// Structural request matching: a declared pattern matches a parsed wire
// request when every field the pattern specifies agrees, and fields left
// unspecified are wildcards.
//
// Grounded in `original_source/nemok/http.h`'s `http_request::match_opt` (a
// field matches if the pattern side is empty/unset or equal to the wire
// side). The original only compares one header pair; spec.md §3 generalizes
// this to an ordered list of headers matched as a subset (every pattern
// header must be present with an equal value; extra wire headers are
// ignored).

use super::wire::{Method, ParsedRequest, Version};

#[derive(Clone, Default)]
pub struct RequestPattern {
    method: Option<Method>,
    uri: Option<String>,
    version: Option<Version>,
    body: Option<Vec<u8>>,
    /// Matched as a subset: every pair here must appear in the wire request
    /// with an equal value (comparison is case-sensitive, per spec.md's
    /// resolution of this Open Question against the reference header map).
    headers: Vec<(String, String)>,
}

impl RequestPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn matches(&self, request: &ParsedRequest) -> bool {
        if let Some(method) = self.method {
            if method != request.method {
                return false;
            }
        }
        if let Some(uri) = &self.uri {
            if uri != &request.uri {
                return false;
            }
        }
        if let Some(version) = self.version {
            if version != request.version {
                return false;
            }
        }
        if let Some(body) = &self.body {
            if body != &request.body {
                return false;
            }
        }
        self.headers.iter().all(|(name, value)| {
            request
                .headers
                .get(name.as_str())
                .map(|v| v == value)
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_request;
    use crate::http::ParseOutcome;

    fn parsed(raw: &[u8]) -> ParsedRequest {
        match parse_request(raw) {
            ParseOutcome::Complete(p) => p,
            ParseOutcome::Incomplete => panic!("expected a complete frame in test fixture"),
        }
    }

    #[test]
    fn unset_fields_are_wildcards() {
        let req = parsed(b"GET /widgets HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(RequestPattern::new().matches(&req));
        assert!(RequestPattern::new().method(Method::Get).matches(&req));
        assert!(!RequestPattern::new().method(Method::Post).matches(&req));
    }

    #[test]
    fn header_subset_match_ignores_extra_headers() {
        let req = parsed(b"GET /widgets HTTP/1.1\r\nHost: x\r\nX-Trace: abc\r\n\r\n");
        let pattern = RequestPattern::new().header("Host", "x");
        assert!(pattern.matches(&req));
    }

    #[test]
    fn header_match_is_case_sensitive_on_value() {
        let req = parsed(b"GET / HTTP/1.1\r\nX-Token: Secret\r\n\r\n");
        assert!(RequestPattern::new().header("X-Token", "Secret").matches(&req));
        assert!(!RequestPattern::new().header("X-Token", "secret").matches(&req));
    }

    #[test]
    fn header_match_is_case_sensitive_on_name() {
        // The wire parser stores header names exactly as sent; a pattern
        // declared with different casing is a different key and must not
        // match, per the reference's exact-case `std::map<std::string, ...>`.
        let req = parsed(b"GET / HTTP/1.1\r\nContent-Type: application/json\r\n\r\n");
        assert!(RequestPattern::new()
            .header("Content-Type", "application/json")
            .matches(&req));
        assert!(!RequestPattern::new()
            .header("content-type", "application/json")
            .matches(&req));
    }

    #[test]
    fn missing_required_header_fails_the_match() {
        let req = parsed(b"GET / HTTP/1.1\r\n\r\n");
        assert!(!RequestPattern::new().header("Authorization", "token").matches(&req));
    }
}
