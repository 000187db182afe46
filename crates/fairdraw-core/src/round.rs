//! The round record and its invariants.

use serde::{Deserialize, Serialize};

use crate::{Amount, DrawError, ParticipantId, RequestId, Result};

/// Lifecycle state of the round.
///
/// `Calculating` carries the in-flight randomness request id, so "at most one
/// outstanding request" and "no outstanding request while Open" hold by
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// Accepting entries; no draw in flight.
    Open,
    /// Winner selection in flight; entries are rejected until the response
    /// for `request_id` arrives.
    Calculating { request_id: RequestId },
}

/// The sole persistent entity: one recurring entry-collection/payout cycle.
///
/// Exclusively owned and mutated by `DrawEngine`; ledger, upkeep and
/// randomness components are pure operations over it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    state: RoundState,
    /// Entry order; duplicates allowed, each entry is a separate weighted slot.
    participants: Vec<ParticipantId>,
    pool: Amount,
    /// Timestamp of the last completed draw, or round creation.
    last_draw_at_ms: i64,
    recent_winner: Option<ParticipantId>,
}

impl Round {
    /// Create a fresh round, open for entries.
    pub fn open(created_at_ms: i64) -> Self {
        Self {
            state: RoundState::Open,
            participants: Vec::new(),
            pool: 0,
            last_draw_at_ms: created_at_ms,
            recent_winner: None,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, RoundState::Open)
    }

    /// Id of the in-flight randomness request, if any.
    pub fn outstanding_request(&self) -> Option<RequestId> {
        match self.state {
            RoundState::Open => None,
            RoundState::Calculating { request_id } => Some(request_id),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Participant holding slot `index`, in entry order.
    pub fn participant_at(&self, index: usize) -> Result<ParticipantId> {
        self.participants
            .get(index)
            .copied()
            .ok_or(DrawError::IndexOutOfRange {
                index,
                count: self.participants.len(),
            })
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn pool(&self) -> Amount {
        self.pool
    }

    pub fn last_draw_at_ms(&self) -> i64 {
        self.last_draw_at_ms
    }

    pub fn recent_winner(&self) -> Option<ParticipantId> {
        self.recent_winner
    }

    // Mutations are crate-internal: every transition goes through the engine,
    // which checks invariants before and after.

    /// Append one weighted slot and add its fee to the pool.
    ///
    /// The pool is increased before the slot is appended, so an overflow
    /// leaves the round untouched.
    pub(crate) fn record_entry(
        &mut self,
        participant: ParticipantId,
        amount: Amount,
    ) -> Result<()> {
        self.pool = self
            .pool
            .checked_add(amount)
            .ok_or(DrawError::PoolOverflow)?;
        self.participants.push(participant);
        Ok(())
    }

    pub(crate) fn begin_calculating(&mut self, request_id: RequestId) {
        self.state = RoundState::Calculating { request_id };
    }

    /// Commit the post-draw form: winner recorded, bookkeeping cleared, clock
    /// reset, round reopened. Returns the prize captured before clearing.
    pub(crate) fn finish_draw(&mut self, winner: ParticipantId, now_ms: i64) -> Amount {
        let prize = self.pool;
        self.recent_winner = Some(winner);
        self.participants.clear();
        self.pool = 0;
        self.last_draw_at_ms = now_ms;
        self.state = RoundState::Open;
        prize
    }

    /// Check structural invariants, returning the first violated one.
    pub fn check_invariants(&self) -> Result<()> {
        if self.participants.is_empty() && self.pool != 0 {
            return Err(DrawError::InvariantViolation(
                "pool funded with no participants",
            ));
        }
        if !self.participants.is_empty() && self.pool == 0 {
            return Err(DrawError::InvariantViolation(
                "participants recorded with empty pool",
            ));
        }
        if !self.is_open() && self.participants.is_empty() {
            return Err(DrawError::InvariantViolation(
                "calculating with no participants",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(byte: u8) -> ParticipantId {
        ParticipantId([byte; 32])
    }

    #[test]
    fn fresh_round_is_open_and_empty() {
        let round = Round::open(500);
        assert!(round.is_open());
        assert_eq!(round.participant_count(), 0);
        assert_eq!(round.pool(), 0);
        assert_eq!(round.last_draw_at_ms(), 500);
        assert_eq!(round.recent_winner(), None);
        assert_eq!(round.outstanding_request(), None);
        round.check_invariants().expect("fresh round is consistent");
    }

    #[test]
    fn record_entry_appends_slots_in_order() {
        let mut round = Round::open(0);
        round.record_entry(pid(1), 10).unwrap();
        round.record_entry(pid(2), 10).unwrap();
        round.record_entry(pid(1), 10).unwrap();

        assert_eq!(round.participant_count(), 3);
        assert_eq!(round.pool(), 30);
        assert_eq!(round.participant_at(0).unwrap(), pid(1));
        assert_eq!(round.participant_at(2).unwrap(), pid(1));
    }

    #[test]
    fn participant_at_reports_out_of_range() {
        let mut round = Round::open(0);
        round.record_entry(pid(1), 5).unwrap();

        let err = round.participant_at(1).unwrap_err();
        assert!(matches!(
            err,
            DrawError::IndexOutOfRange { index: 1, count: 1 }
        ));
    }

    #[test]
    fn record_entry_overflow_leaves_round_untouched() {
        let mut round = Round::open(0);
        round.record_entry(pid(1), Amount::MAX).unwrap();

        let err = round.record_entry(pid(2), 1).unwrap_err();
        assert!(matches!(err, DrawError::PoolOverflow));
        assert_eq!(round.participant_count(), 1);
        assert_eq!(round.pool(), Amount::MAX);
    }

    #[test]
    fn calculating_carries_the_request_id() {
        let mut round = Round::open(0);
        round.record_entry(pid(1), 5).unwrap();
        round.begin_calculating(RequestId(7));

        assert!(!round.is_open());
        assert_eq!(round.outstanding_request(), Some(RequestId(7)));
        round.check_invariants().unwrap();
    }

    #[test]
    fn finish_draw_commits_the_post_draw_form() {
        let mut round = Round::open(0);
        round.record_entry(pid(1), 5).unwrap();
        round.record_entry(pid(2), 5).unwrap();
        round.begin_calculating(RequestId(1));

        let prize = round.finish_draw(pid(2), 1234);

        assert_eq!(prize, 10);
        assert!(round.is_open());
        assert_eq!(round.participant_count(), 0);
        assert_eq!(round.pool(), 0);
        assert_eq!(round.last_draw_at_ms(), 1234);
        assert_eq!(round.recent_winner(), Some(pid(2)));
        assert_eq!(round.outstanding_request(), None);
        round.check_invariants().unwrap();
    }

    #[test]
    fn invariants_catch_inconsistent_rounds() {
        let funded_empty = Round {
            state: RoundState::Open,
            participants: Vec::new(),
            pool: 10,
            last_draw_at_ms: 0,
            recent_winner: None,
        };
        assert!(matches!(
            funded_empty.check_invariants(),
            Err(DrawError::InvariantViolation(_))
        ));

        let unfunded_entries = Round {
            state: RoundState::Open,
            participants: vec![pid(1)],
            pool: 0,
            last_draw_at_ms: 0,
            recent_winner: None,
        };
        assert!(matches!(
            unfunded_entries.check_invariants(),
            Err(DrawError::InvariantViolation(_))
        ));

        let empty_calculating = Round {
            state: RoundState::Calculating {
                request_id: RequestId(1),
            },
            participants: Vec::new(),
            pool: 0,
            last_draw_at_ms: 0,
            recent_winner: None,
        };
        assert!(matches!(
            empty_calculating.check_invariants(),
            Err(DrawError::InvariantViolation(_))
        ));
    }
}
