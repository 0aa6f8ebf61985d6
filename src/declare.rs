// Shared expectation-declaration builder underlying both protocol
// specializations.
//
// Grounded in `nemok::basic_mock<T>` (`server.h`): a single `when`/`exec`/
// `freeze`/`times`/`once`/`order`/`close_connection` chain shared by the
// `telnet` and `http` specializations, which only differ in how they build
// the trigger passed to `when`. `MockBuilder` is that shared chain;
// `telnet::TelnetMock` and `http::HttpMock` are thin wrappers that supply
// their own trigger/action vocabulary (spec.md §4.8/§4.9).

use std::time::Duration;

use crate::action::Action;
use crate::engine::ExpectationSet;
use crate::expectation::Expectation;
use crate::http::RequestPattern;
use crate::trigger::TriggerKind;

/// Stages one expectation at a time; each `when` finalizes the previously
/// staged expectation into the set before starting the next one.
pub struct MockBuilder {
    set: ExpectationSet,
    staged: Option<Expectation>,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self {
            set: ExpectationSet::new(),
            staged: None,
        }
    }

    pub fn when(&mut self, trigger: TriggerKind) {
        self.finalize();
        self.staged = Some(Expectation::new(trigger));
    }

    fn staged_mut(&mut self) -> &mut Expectation {
        self.staged
            .as_mut()
            .expect("declare a trigger with when() before configuring its actions")
    }

    pub fn write(&mut self, bytes: Vec<u8>) {
        self.staged_mut().actions.push(Action::Write(bytes));
    }

    pub fn freeze(&mut self, duration: Duration) {
        self.staged_mut().actions.push(Action::Freeze(duration));
    }

    pub fn close_connection(&mut self) {
        self.staged_mut().actions.push(Action::CloseConnection);
    }

    pub fn shutdown_server(&mut self) {
        self.staged_mut().actions.push(Action::ShutdownServer);
    }

    pub fn times(&mut self, n: u32) {
        self.staged_mut().max_calls = n;
    }

    pub fn order(&mut self, order: i32) {
        self.staged_mut().order = order;
    }

    /// Gives HTTP builders mutable access to the pattern under construction;
    /// `None` if the staged trigger isn't an HTTP one.
    pub fn http_pattern_mut(&mut self) -> Option<&mut RequestPattern> {
        match &mut self.staged_mut().trigger {
            TriggerKind::Http(pattern) => Some(pattern),
            _ => None,
        }
    }

    /// Moves the staged expectation, if any, into the set.
    pub fn finalize(&mut self) {
        if let Some(expectation) = self.staged.take() {
            self.set.insert(expectation);
        }
    }

    /// Finalizes and returns the completed set, ready to hand to
    /// [`crate::MockServer`].
    pub fn build(mut self) -> ExpectationSet {
        self.finalize();
        self.set
    }
}

impl Default for MockBuilder {
    fn default() -> Self {
        Self::new()
    }
}
