// HTTP/1.x wire parsing and structural matching.
//
// Split the way `micro_http` splits `request.rs`/`response.rs`/`common`: wire
// framing (`wire`), the status-reason table (`status`), structural matching
// (`pattern`), and the fluent specialization built on top (`mock`).

mod mock;
mod pattern;
mod status;
mod wire;

pub use mock::{
    response, serialize_request, unexpected, HttpMock, CONNECT, DELETE, GET, HEAD, OPTIONS,
    PATCH, POST, PUT, TRACE,
};
pub use pattern::RequestPattern;
pub use status::reason_phrase;
pub use wire::{parse_request, Method, ParseOutcome, ParsedRequest, Version};
