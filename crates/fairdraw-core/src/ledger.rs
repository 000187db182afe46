//! Entry acceptance over the round ledger.

use crate::config::RoundConfig;
use crate::events::EntryAccepted;
use crate::round::Round;
use crate::{Amount, DrawError, ParticipantId, Result};

/// Accept one entry into the current round.
///
/// The state check precedes the fee check: while a draw is in flight no fee,
/// however large, buys a slot. On success the participant is appended as one
/// weighted slot (repeats allowed) and `amount` is added to the pool; on any
/// failure the round is untouched.
pub fn enter(
    round: &mut Round,
    config: &RoundConfig,
    participant: ParticipantId,
    amount: Amount,
) -> Result<EntryAccepted> {
    if !round.is_open() {
        return Err(DrawError::RoundNotOpen);
    }
    if amount < config.entrance_fee {
        return Err(DrawError::InsufficientFee {
            provided: amount,
            required: config.entrance_fee,
        });
    }

    round.record_entry(participant, amount)?;
    Ok(EntryAccepted {
        participant,
        amount,
        slot: round.participant_count() - 1,
    })
}
