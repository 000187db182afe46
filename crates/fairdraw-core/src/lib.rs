use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod adapters;
pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod payout;
pub mod randomness;
pub mod round;
pub mod upkeep;

pub use config::{OracleParams, RoundConfig};
pub use engine::DrawEngine;
pub use events::{DrawCompleted, DrawEvent, DrawStarted, EntryAccepted};
pub use round::{Round, RoundState};
pub use upkeep::UpkeepCheck;

/// Amount of value carried by entries and the prize pool, in the smallest unit.
pub type Amount = u64;

/// Domain separation tag for participant id derivation.
pub const PARTICIPANT_ID_DOMAIN_V1: &[u8] = b"FAIRDRAW_PARTICIPANT_ID_V1";

/// Domain separation tag for oracle id derivation.
pub const ORACLE_ID_DOMAIN_V1: &[u8] = b"FAIRDRAW_ORACLE_ID_V1";

/// 32-byte identity of a draw participant.
///
/// Identities are opaque to the core. Two entries with the same id are two
/// separate weighted slots, not a deduplicated membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ParticipantId(pub [u8; 32]);

impl ParticipantId {
    /// Derive a deterministic id from a human-readable label.
    pub fn from_label(label: &str) -> Self {
        Self(derive_id(PARTICIPANT_ID_DOMAIN_V1, label.as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// 32-byte identity of the randomness oracle authorized to deliver responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OracleId(pub [u8; 32]);

impl OracleId {
    /// Derive a deterministic id from a human-readable label.
    pub fn from_label(label: &str) -> Self {
        Self(derive_id(ORACLE_ID_DOMAIN_V1, label.as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn derive_id(domain: &[u8], label: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update((label.len() as u32).to_le_bytes());
    hasher.update(label);
    hasher.finalize().into()
}

/// Identifier correlating a randomness request with its eventual response.
///
/// The response carries only this id and a random value; there is no other
/// correlation mechanism between the two halves of a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unified error type for draw operations.
///
/// Every failure aborts its operation with no partial state mutation, and
/// every kind is distinguishable so external tooling (keepers, monitoring)
/// can decide whether to retry, alert, or ignore.
#[derive(Debug, Error)]
pub enum DrawError {
    // Entry errors
    #[error("insufficient fee: provided {provided}, entrance fee is {required}")]
    InsufficientFee { provided: Amount, required: Amount },

    #[error("round is not open for entries")]
    RoundNotOpen,

    #[error("prize pool overflow")]
    PoolOverflow,

    // Upkeep errors
    #[error("upkeep not needed: {check}")]
    UpkeepNotNeeded { check: UpkeepCheck },

    // Randomness response errors
    #[error("unknown randomness request {request_id}")]
    UnknownRequest { request_id: RequestId },

    #[error("unauthorized randomness callback from {caller}")]
    UnauthorizedCallback { caller: OracleId },

    #[error("randomness request failed: {0}")]
    RandomnessRequestFailed(String),

    // Ledger read errors
    #[error("participant index {index} out of range for {count} participants")]
    IndexOutOfRange { index: usize, count: usize },

    // Payout errors
    #[error("payout of {amount} to {recipient} failed: {reason}")]
    PayoutFailed {
        recipient: ParticipantId,
        amount: Amount,
        reason: String,
    },

    // Configuration errors
    #[error("configuration error: {0}")]
    ConfigError(String),

    // Event log errors
    #[error("event log error: {0}")]
    EventLog(String),

    // A violated round invariant indicates a bug, not bad input.
    #[error("round invariant violated: {0}")]
    InvariantViolation(&'static str),
}

pub type Result<T> = std::result::Result<T, DrawError>;

/// Source of unpredictable randomness, integrated via request/response
/// correlation.
///
/// One `request` yields exactly one eventual delivery of
/// `(request_id, random_value)`; delivery latency is unbounded and delivery
/// order across requests is not guaranteed.
pub trait RandomnessSource {
    /// Identity the source delivers its responses under.
    ///
    /// Deliveries claiming any other identity are rejected before any round
    /// state is read.
    fn id(&self) -> OracleId;

    /// Issue one randomness request.
    ///
    /// Preconditions:
    /// - `params` satisfy `OracleParams::validate`.
    ///
    /// Postconditions:
    /// - On success, the returned id is unique among this source's requests.
    /// - On failure, no request was issued.
    fn request(&self, params: &OracleParams) -> Result<RequestId>;
}

/// Rejection reported by a `TransferChannel`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransferError(pub String);

/// Channel through which the prize pool leaves the system.
pub trait TransferChannel {
    /// Transfer `amount` to `recipient`.
    ///
    /// Postconditions:
    /// - Either the transfer fully happened, or `Err` names why the channel
    ///   or the recipient rejected it. Partial transfers do not occur.
    fn transfer(
        &self,
        recipient: ParticipantId,
        amount: Amount,
    ) -> std::result::Result<(), TransferError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_derivation_is_deterministic() {
        assert_eq!(
            ParticipantId::from_label("alice"),
            ParticipantId::from_label("alice")
        );
        assert_ne!(
            ParticipantId::from_label("alice"),
            ParticipantId::from_label("bob")
        );
    }

    #[test]
    fn participant_and_oracle_domains_are_separated() {
        let p = ParticipantId::from_label("x");
        let o = OracleId::from_label("x");
        assert_ne!(p.0, o.0);
    }

    #[test]
    fn ids_display_as_hex() {
        let p = ParticipantId([0xab; 32]);
        assert_eq!(p.to_string(), "ab".repeat(32));
        assert_eq!(p.to_string(), p.to_hex());
    }

    #[test]
    fn errors_name_their_kind() {
        let err = DrawError::InsufficientFee {
            provided: 1,
            required: 100,
        };
        assert_eq!(
            err.to_string(),
            "insufficient fee: provided 1, entrance fee is 100"
        );

        let err = DrawError::UnknownRequest {
            request_id: RequestId(9),
        };
        assert_eq!(err.to_string(), "unknown randomness request 9");
    }
}
