//! CLI Command Implementations

pub mod check;
pub mod simulate;
pub mod verify_log;

use serde::{Deserialize, Serialize};

use fairdraw_core::config::RoundConfig;
use fairdraw_core::round::Round;

/// On-disk round state, written by `simulate --snapshot` and read by `check`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Configuration the round was running under.
    pub config: RoundConfig,

    /// Full round state.
    pub round: Round,

    /// When the snapshot was taken.
    pub saved_at_ms: i64,
}
