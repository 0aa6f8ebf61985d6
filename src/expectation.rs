// A single declared expectation: one trigger, its actions, a priority, and a
// fire budget.
//
// Grounded in `nemok::expectation` (`server.h`): `trigger`, `act`,
// `times_fired`, `max_calls`, `order`, with `active()` iff the fire count is
// still under budget.

use crate::action::Action;
use crate::trigger::TriggerKind;

/// Default priority bucket for expectations that don't call `.order(n)`.
pub const DEFAULT_ORDER: i32 = 100;

#[derive(Clone)]
pub struct Expectation {
    pub trigger: TriggerKind,
    pub actions: Vec<Action>,
    pub order: i32,
    pub max_calls: u32,
    pub times_fired: u32,
}

impl Expectation {
    pub fn new(trigger: TriggerKind) -> Self {
        Self {
            trigger,
            actions: Vec::new(),
            order: DEFAULT_ORDER,
            max_calls: u32::MAX,
            times_fired: 0,
        }
    }

    /// True iff this expectation may still fire (`times_fired < max_calls`).
    pub fn active(&self) -> bool {
        self.times_fired < self.max_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_expectation_is_active_and_unlimited() {
        let e = Expectation::new(TriggerKind::Prefix(b"x".to_vec()));
        assert!(e.active());
        assert_eq!(e.order, DEFAULT_ORDER);
    }

    #[test]
    fn retires_once_max_calls_reached() {
        let mut e = Expectation::new(TriggerKind::Prefix(b"x".to_vec()));
        e.max_calls = 2;
        assert!(e.active());
        e.times_fired = 1;
        assert!(e.active());
        e.times_fired = 2;
        assert!(!e.active());
    }
}
