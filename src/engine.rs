// The expectation-matching engine: walks the input buffer to a fixpoint,
// firing expectations under the priority/rotation rules in spec.md §4.5.
//
// Grounded in `nemok::expect_list`/`matcher::match` (`server.h`): a
// priority-keyed map of FIFO lists (`std::map<int, std::list<expectation>>`),
// walked lowest-priority-first, restarting the whole scan after each
// successful match so that rotation is observed within the same pass.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::trace;

use crate::action;
use crate::error::Result;
use crate::expectation::Expectation;
use crate::stream::Stream;

/// Expectations grouped by priority (`order`), each bucket a FIFO list.
///
/// Cloned once per accepted connection so that fire counters and rotation
/// stay private to each session (spec.md §5, "Shared-resource policy").
#[derive(Clone, Default)]
pub struct ExpectationSet {
    buckets: BTreeMap<i32, VecDeque<Expectation>>,
}

impl ExpectationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, expectation: Expectation) {
        self.buckets
            .entry(expectation.order)
            .or_insert_with(VecDeque::new)
            .push_back(expectation);
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|bucket| bucket.is_empty())
    }

    /// Runs the engine to a fixpoint on whatever bytes are currently in
    /// `input`, firing matched expectations' actions against `stream`.
    ///
    /// Never waits for more bytes: if no bucket has a matching expectation,
    /// returns immediately and leaves `input` for the next `feed` call.
    pub fn feed(
        &mut self,
        input: &mut Vec<u8>,
        stream: &mut Stream,
        terminate: &Arc<AtomicBool>,
    ) -> Result<()> {
        while self.try_fire_one(input, stream, terminate)? {}
        Ok(())
    }

    /// Scans buckets in ascending priority order, firing the first matching
    /// expectation found. Returns `Ok(true)` if something fired, so `feed`
    /// can restart the scan from the top (required so rotation within a
    /// bucket is observed by the rest of the same pass).
    fn try_fire_one(
        &mut self,
        input: &mut Vec<u8>,
        stream: &mut Stream,
        terminate: &Arc<AtomicBool>,
    ) -> Result<bool> {
        let orders: Vec<i32> = self.buckets.keys().cloned().collect();
        for order in orders {
            let len = match self.buckets.get(&order) {
                Some(bucket) => bucket.len(),
                None => continue,
            };

            for idx in 0..len {
                let matched = self
                    .buckets
                    .get(&order)
                    .and_then(|bucket| bucket.get(idx))
                    .map(|e| e.trigger.try_match(input))
                    .unwrap_or(false);

                if !matched {
                    continue;
                }

                let bucket = self.buckets.get_mut(&order).expect("bucket just matched");
                let mut fired = bucket.remove(idx).expect("index just matched");
                fired.times_fired += 1;
                trace!(
                    "expectation fired (order={}, times_fired={})",
                    order,
                    fired.times_fired
                );
                action::fire_all(&fired.actions, stream, terminate)?;

                if fired.active() {
                    bucket.push_back(fired);
                }

                return Ok(true);
            }
        }
        Ok(false)
    }
}
