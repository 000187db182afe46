//! The draw state machine.
//!
//! `DrawEngine` exclusively owns the `Round` and is the single chokepoint
//! for its transitions:
//!
//! - `Open -> Calculating` only through `perform_upkeep`,
//! - `Calculating -> Open` only through `complete_draw`,
//! - no self-loop mutates round-critical fields.
//!
//! Each operation runs to completion and either fully commits or leaves the
//! round untouched. The state field itself is the mutual-exclusion flag
//! (Open = entries allowed, Calculating = draw in flight); no other locking
//! exists. Suspension only exists between operations: after `perform_upkeep`
//! the round sits in Calculating for an unbounded external delay until the
//! oracle's response is delivered, and no timeout path exists.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::RoundConfig;
use crate::events::{DrawCompleted, DrawStarted, EntryAccepted};
use crate::ledger;
use crate::metrics::DrawMetrics;
use crate::payout::PayoutExecutor;
use crate::randomness;
use crate::round::Round;
use crate::upkeep::{self, UpkeepCheck};
use crate::{
    Amount, DrawError, OracleId, ParticipantId, RandomnessSource, RequestId, Result,
    TransferChannel,
};

/// Owns the round and orchestrates every transition.
pub struct DrawEngine<O: RandomnessSource, C: TransferChannel> {
    config: RoundConfig,
    round: Round,
    oracle: O,
    /// Captured once at construction; callbacks claiming any other identity
    /// are rejected before the round is read.
    oracle_id: OracleId,
    payout: PayoutExecutor<C>,
    metrics: Arc<DrawMetrics>,
}

impl<O: RandomnessSource, C: TransferChannel> DrawEngine<O, C> {
    /// Create an engine over a fresh, open round.
    pub fn new(config: RoundConfig, oracle: O, transfers: C, created_at_ms: i64) -> Result<Self> {
        config.validate()?;
        let oracle_id = oracle.id();
        Ok(Self {
            config,
            round: Round::open(created_at_ms),
            oracle,
            oracle_id,
            payout: PayoutExecutor::new(transfers),
            metrics: Arc::new(DrawMetrics::new()),
        })
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn transfers(&self) -> &C {
        self.payout.channel()
    }

    pub fn metrics(&self) -> Arc<DrawMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Accept an entry into the current round.
    pub fn enter(&mut self, participant: ParticipantId, amount: Amount) -> Result<EntryAccepted> {
        self.round.check_invariants()?;

        let accepted = match ledger::enter(&mut self.round, &self.config, participant, amount) {
            Ok(accepted) => accepted,
            Err(e) => {
                self.metrics.entries_rejected.inc();
                debug!(participant = %participant, amount, error = %e, "entry rejected");
                return Err(e);
            }
        };
        self.round.check_invariants()?;

        self.metrics.entries_total.inc();
        self.metrics.pool_balance.set(self.round.pool());
        self.metrics
            .participant_slots
            .set(self.round.participant_count() as u64);
        debug!(
            participant = %accepted.participant,
            amount = accepted.amount,
            slot = accepted.slot as u64,
            "entry accepted"
        );
        Ok(accepted)
    }

    /// Evaluate the upkeep predicate at `now_ms`.
    ///
    /// Pure; callable by anyone at any time.
    pub fn check_upkeep(&self, now_ms: i64) -> UpkeepCheck {
        upkeep::check_upkeep(&self.round, &self.config, now_ms)
    }

    /// Start a draw if one is due.
    ///
    /// Re-validates the predicate at call time (the keeper may fire
    /// arbitrarily late), issues exactly one randomness request, and commits
    /// the `Open -> Calculating` transition carrying the request id. Entries
    /// accepted before this call are exactly the entries eligible for the
    /// draw it starts.
    pub fn perform_upkeep(&mut self, now_ms: i64) -> Result<DrawStarted> {
        self.round.check_invariants()?;

        let check = self.check_upkeep(now_ms);
        if !check.needed() {
            debug!(%check, "upkeep not needed");
            return Err(DrawError::UpkeepNotNeeded { check });
        }

        // The id must exist before Calculating can carry it, and a failed
        // request must leave the round Open.
        let request_id = self.oracle.request(&self.config.oracle)?;
        self.round.begin_calculating(request_id);
        self.round.check_invariants()?;

        self.metrics.draws_started.inc();
        info!(
            request_id = %request_id,
            participants = self.round.participant_count() as u64,
            pool = self.round.pool(),
            "draw started"
        );
        Ok(DrawStarted { request_id })
    }

    /// Deliver the oracle's response and complete the draw.
    ///
    /// SECURITY: Checks-Effects-Interactions
    /// - Check: `caller` must be the bound oracle identity, and `request_id`
    ///   must match the outstanding request while Calculating.
    /// - Effect: winner recorded, bookkeeping cleared, timestamp reset,
    ///   round reopened in one commit; the prize is captured before clearing.
    /// - Interaction: the funds transfer runs last, so a failing or
    ///   re-entrant payout finds the round already in its post-draw form and
    ///   can never draw or pay twice.
    ///
    /// On `PayoutFailed` the round is NOT rolled back to Calculating: it
    /// stays Open with the owed `{recipient, amount}` carried in the error
    /// for operator remediation.
    pub fn complete_draw(
        &mut self,
        caller: OracleId,
        request_id: RequestId,
        random_value: u64,
        now_ms: i64,
    ) -> Result<DrawCompleted> {
        if caller != self.oracle_id {
            self.metrics.unauthorized_callbacks.inc();
            warn!(caller = %caller, "rejected randomness callback from unknown sender");
            return Err(DrawError::UnauthorizedCallback { caller });
        }
        self.round.check_invariants()?;

        let index = match randomness::resolve(&self.round, request_id, random_value) {
            Ok(index) => index,
            Err(e) => {
                self.metrics.stale_responses.inc();
                debug!(request_id = %request_id, error = %e, "randomness response rejected");
                return Err(e);
            }
        };
        let winner = self.round.participant_at(index)?;

        let prize = self.round.finish_draw(winner, now_ms);
        self.round.check_invariants()?;
        self.metrics.draws_completed.inc();
        self.metrics.pool_balance.set(0);
        self.metrics.participant_slots.set(0);
        info!(winner = %winner, prize, request_id = %request_id, "draw completed");

        if let Err(e) = self.payout.pay(winner, prize) {
            self.metrics.payout_failures.inc();
            warn!(winner = %winner, prize, error = %e, "payout failed; round reopened, funds owed");
            return Err(e);
        }

        Ok(DrawCompleted {
            winner,
            amount: prize,
            request_id,
        })
    }
}
