//! In-memory collaborators for simulations and tests.
//!
//! Production deployments implement `RandomnessSource` and `TransferChannel`
//! against a real oracle and a real transfer rail; these adapters model the
//! same contracts deterministically in process.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::OracleParams;
use crate::{
    Amount, DrawError, OracleId, ParticipantId, RandomnessSource, RequestId, Result,
    TransferChannel, TransferError,
};

/// Deterministic in-memory randomness oracle.
///
/// Request ids are monotonic from 1. Responses are not produced until the
/// driver asks for one (`next_response`), modelling the unbounded delay
/// between a request and its callback.
pub struct InMemoryOracle {
    id: OracleId,
    state: Mutex<OracleState>,
}

struct OracleState {
    next_request_id: u64,
    pending: VecDeque<RequestId>,
    rng: StdRng,
    fail_requests: bool,
}

impl InMemoryOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            id: OracleId::from_label("in-memory-oracle"),
            state: Mutex::new(OracleState {
                next_request_id: 1,
                pending: VecDeque::new(),
                rng: StdRng::seed_from_u64(seed),
                fail_requests: false,
            }),
        }
    }

    /// Make subsequent `request` calls fail, for fault testing.
    pub fn set_fail_requests(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_requests = fail;
        }
    }

    /// Produce the response for the oldest pending request.
    ///
    /// Returns `None` when nothing is outstanding.
    pub fn next_response(&self) -> Option<(RequestId, u64)> {
        let mut state = self.state.lock().ok()?;
        let request_id = state.pending.pop_front()?;
        let random_value = state.rng.gen::<u64>();
        Some((request_id, random_value))
    }

    pub fn pending_requests(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.pending.len(),
            Err(poisoned) => poisoned.into_inner().pending.len(),
        }
    }
}

impl RandomnessSource for InMemoryOracle {
    fn id(&self) -> OracleId {
        self.id
    }

    fn request(&self, _params: &OracleParams) -> Result<RequestId> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DrawError::RandomnessRequestFailed("oracle lock poisoned".into()))?;

        if state.fail_requests {
            return Err(DrawError::RandomnessRequestFailed("oracle offline".into()));
        }

        let id = RequestId(state.next_request_id);
        state.next_request_id += 1;
        state.pending.push_back(id);
        Ok(id)
    }
}

/// In-memory transfer rail tracking a balance per participant.
///
/// Cloned handles share one balance book, so a driver can keep a handle
/// while the engine owns another.
#[derive(Clone)]
pub struct InMemoryBank {
    inner: Arc<Mutex<BankState>>,
}

struct BankState {
    balances: HashMap<ParticipantId, Amount>,
    refusing: HashSet<ParticipantId>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BankState {
                balances: HashMap::new(),
                refusing: HashSet::new(),
            })),
        }
    }

    /// Mark `recipient` as refusing transfers, modelling a recipient that
    /// rejects funds.
    pub fn refuse(&self, recipient: ParticipantId) {
        if let Ok(mut state) = self.inner.lock() {
            state.refusing.insert(recipient);
        }
    }

    /// Undo `refuse`.
    pub fn accept(&self, recipient: ParticipantId) {
        if let Ok(mut state) = self.inner.lock() {
            state.refusing.remove(&recipient);
        }
    }

    pub fn balance(&self, participant: &ParticipantId) -> Amount {
        match self.inner.lock() {
            Ok(state) => state.balances.get(participant).copied().unwrap_or(0),
            Err(poisoned) => poisoned
                .into_inner()
                .balances
                .get(participant)
                .copied()
                .unwrap_or(0),
        }
    }

    /// Every balance held, in unspecified order.
    pub fn balances(&self) -> Vec<(ParticipantId, Amount)> {
        match self.inner.lock() {
            Ok(state) => state.balances.iter().map(|(k, v)| (*k, *v)).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .balances
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect(),
        }
    }

    pub fn total(&self) -> Amount {
        self.balances().iter().map(|(_, v)| v).sum()
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferChannel for InMemoryBank {
    fn transfer(
        &self,
        recipient: ParticipantId,
        amount: Amount,
    ) -> std::result::Result<(), TransferError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| TransferError("bank lock poisoned".into()))?;

        if state.refusing.contains(&recipient) {
            return Err(TransferError("recipient refused the transfer".into()));
        }

        let balance = state.balances.entry(recipient).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError("balance overflow".into()))?;
        Ok(())
    }
}
