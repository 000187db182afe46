//! The single point where value leaves the system.

use crate::{Amount, DrawError, ParticipantId, Result, TransferChannel};

/// Pays the prize out through a `TransferChannel`.
///
/// Stateless: at-most-once-per-draw is enforced by the caller's ordering
/// (round bookkeeping is cleared before `pay` runs), not here.
pub struct PayoutExecutor<C: TransferChannel> {
    channel: C,
}

impl<C: TransferChannel> PayoutExecutor<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Transfer `amount` to `recipient`.
    ///
    /// A rejected transfer surfaces as `PayoutFailed` carrying who is owed
    /// what; it is never swallowed.
    pub fn pay(&self, recipient: ParticipantId, amount: Amount) -> Result<()> {
        self.channel
            .transfer(recipient, amount)
            .map_err(|e| DrawError::PayoutFailed {
                recipient,
                amount,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryBank;

    fn pid(byte: u8) -> ParticipantId {
        ParticipantId([byte; 32])
    }

    #[test]
    fn pay_credits_the_recipient() {
        let bank = InMemoryBank::new();
        let payout = PayoutExecutor::new(bank.clone());

        payout.pay(pid(1), 300).unwrap();
        assert_eq!(bank.balance(&pid(1)), 300);
    }

    #[test]
    fn rejection_surfaces_as_payout_failed() {
        let bank = InMemoryBank::new();
        bank.refuse(pid(1));
        let payout = PayoutExecutor::new(bank.clone());

        let err = payout.pay(pid(1), 300).unwrap_err();
        match err {
            DrawError::PayoutFailed {
                recipient,
                amount,
                reason,
            } => {
                assert_eq!(recipient, pid(1));
                assert_eq!(amount, 300);
                assert!(reason.contains("refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(bank.balance(&pid(1)), 0);
    }
}
