//! The "should a draw start now" predicate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RoundConfig;
use crate::round::Round;

/// Outcome of evaluating the upkeep predicate, one leg per condition.
///
/// Carried inside `DrawError::UpkeepNotNeeded` so keepers can see which leg
/// failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepCheck {
    /// Round is open, no draw in flight.
    pub round_open: bool,
    /// At least the configured interval elapsed since the last draw.
    pub interval_elapsed: bool,
    /// At least one entry to pick a winner from.
    pub has_participants: bool,
    /// Prize pool is funded.
    pub has_pool: bool,
}

impl UpkeepCheck {
    /// True iff every leg holds.
    pub fn needed(&self) -> bool {
        self.round_open && self.interval_elapsed && self.has_participants && self.has_pool
    }
}

impl fmt::Display for UpkeepCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "open={} interval_elapsed={} has_participants={} has_pool={}",
            self.round_open, self.interval_elapsed, self.has_participants, self.has_pool
        )
    }
}

/// Evaluate the upkeep predicate for `round` at caller-supplied `now_ms`.
///
/// Pure: no side effects, so any number of calls with the same round and
/// clock value return the same answer, and anyone may call it at any time.
///
/// `has_participants` and `has_pool` are redundant under the ledger invariant
/// that the pool only grows with entries; both are still checked so a draw
/// can never start without an eligible winner.
pub fn check_upkeep(round: &Round, config: &RoundConfig, now_ms: i64) -> UpkeepCheck {
    UpkeepCheck {
        round_open: round.is_open(),
        interval_elapsed: now_ms - round.last_draw_at_ms() >= config.interval_ms,
        has_participants: round.participant_count() > 0,
        has_pool: round.pool() > 0,
    }
}
