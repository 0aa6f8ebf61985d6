// Line-protocol specialization: a thin fluent façade over the shared
// declaration builder using prefix/any-line/regex triggers.
//
// Grounded in `original_source/nemok/server.h`'s `telnet` class and spec.md
// §4.8: `when(string).reply(string).freeze(us).times(n).close_connection()`.

use std::time::Duration;

use regex::bytes::Regex;

use crate::declare::MockBuilder;
use crate::engine::ExpectationSet;
use crate::trigger::TriggerKind;

/// Declares a sequence of line-protocol expectations, finalizing into an
/// [`ExpectationSet`] via [`TelnetMock::build`].
pub struct TelnetMock(MockBuilder);

impl TelnetMock {
    pub fn new() -> Self {
        Self(MockBuilder::new())
    }

    /// Stages a new expectation: fires when the buffer starts with `text`.
    /// Finalizes whatever expectation was previously staged.
    pub fn when(&mut self, text: impl AsRef<[u8]>) -> &mut Self {
        self.0.when(TriggerKind::Prefix(text.as_ref().to_vec()));
        self
    }

    /// Stages a new expectation: fires on the first line terminated by
    /// `terminator` (commonly `b'\n'`).
    pub fn when_any_line(&mut self, terminator: u8) -> &mut Self {
        self.0.when(TriggerKind::AnyLine { terminator });
        self
    }

    /// Stages a new expectation: fires on the first regex match, consuming
    /// everything from the buffer's start through the match's end.
    pub fn when_matching(&mut self, pattern: Regex) -> &mut Self {
        self.0.when(TriggerKind::Regex(pattern));
        self
    }

    pub fn reply(&mut self, text: impl AsRef<[u8]>) -> &mut Self {
        self.0.write(text.as_ref().to_vec());
        self
    }

    /// `reply(text).times(1)`.
    pub fn reply_once(&mut self, text: impl AsRef<[u8]>) -> &mut Self {
        self.reply(text);
        self.times(1)
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

impl Default for TelnetMock {
    fn default() -> Self {
        Self::new()
    }
}
