//! Randomness response correlation and winner selection.

use crate::round::{Round, RoundState};
use crate::{DrawError, RequestId, Result};

/// Validate an oracle response against the round and compute the winner slot.
///
/// Fails with `UnknownRequest` when no draw is in flight, or when
/// `request_id` does not match the outstanding request (a late delivery for
/// a superseded or never-issued request). Duplicate and late deliveries are
/// expected under real network conditions, so the caller treats this as a
/// no-op failure, never a crash.
///
/// Pure: the round is only read. The outstanding request is cleared by the
/// caller's single post-draw commit.
pub fn resolve(round: &Round, request_id: RequestId, random_value: u64) -> Result<usize> {
    match round.state() {
        RoundState::Calculating {
            request_id: outstanding,
        } if outstanding == request_id => {}
        _ => return Err(DrawError::UnknownRequest { request_id }),
    }

    winner_index(random_value, round.participant_count())
}

/// Map a random value onto the participant slots.
///
/// `random_value % count` is uniform only up to the bias introduced when
/// `count` does not divide the value range evenly; the bias is a known,
/// documented limitation of the scheme and is not corrected.
pub fn winner_index(random_value: u64, participant_count: usize) -> Result<usize> {
    if participant_count == 0 {
        return Err(DrawError::InvariantViolation(
            "winner selection over zero participants",
        ));
    }
    Ok((random_value % participant_count as u64) as usize)
}
