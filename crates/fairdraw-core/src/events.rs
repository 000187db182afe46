//! Observable events and the append-only audit log.
//!
//! Operations return their events as plain data; drivers forward them to an
//! `EventRecorder`. The durable recorder is a minimal transparency log:
//! - append-only JSONL file,
//! - hash-chained records (anti-equivocation within the log),
//! - deterministic record hash domain separation.
//!
//! External consumers replay the file with `verify_chain` to detect
//! truncation or rewriting of draw history. Consumers never acknowledge
//! events; a recorder failure is the driver's problem, not the round's.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Amount, DrawError, ParticipantId, RequestId, Result};

/// Entry accepted into the open round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAccepted {
    pub participant: ParticipantId,
    pub amount: Amount,
    /// Slot index this entry occupies, in entry order.
    pub slot: usize,
}

/// Draw started; the round now waits on `request_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawStarted {
    pub request_id: RequestId,
}

/// Winner selected and prize paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCompleted {
    pub winner: ParticipantId,
    pub amount: Amount,
    pub request_id: RequestId,
}

/// Any observable event, for recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawEvent {
    EntryAccepted(EntryAccepted),
    DrawStarted(DrawStarted),
    DrawCompleted(DrawCompleted),
}

impl From<EntryAccepted> for DrawEvent {
    fn from(event: EntryAccepted) -> Self {
        Self::EntryAccepted(event)
    }
}

impl From<DrawStarted> for DrawEvent {
    fn from(event: DrawStarted) -> Self {
        Self::DrawStarted(event)
    }
}

impl From<DrawCompleted> for DrawEvent {
    fn from(event: DrawCompleted) -> Self {
        Self::DrawCompleted(event)
    }
}

/// Sink for observable events.
pub trait EventRecorder {
    fn record(&self, event: &DrawEvent) -> Result<()>;
}

/// In-memory recorder for tests and dry runs.
pub struct MemoryEventLog {
    events: Mutex<Vec<DrawEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<DrawEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRecorder for MemoryEventLog {
    fn record(&self, event: &DrawEvent) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| DrawError::EventLog("event buffer lock poisoned".into()))?;
        events.push(*event);
        Ok(())
    }
}

/// Domain separation tag for event log record hashing.
pub const EVENT_LOG_RECORD_DOMAIN_V1: &[u8] = b"FAIRDRAW_EVENT_LOG_RECORD_V1";

/// 32-byte record hash in the log chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHash(pub [u8; 32]);

impl RecordHash {
    /// Chain genesis (the `prev` of the first record).
    pub fn genesis() -> Self {
        Self([0u8; 32])
    }
}

/// One line of the JSONL event log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecordV1 {
    pub record_version: u32,
    pub sequence: u64,
    pub recorded_at_ms: i64,
    pub prev_record_hash: RecordHash,
    pub record_hash: RecordHash,
    pub event: DrawEvent,
}

fn now_ms() -> Result<i64> {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| DrawError::EventLog("system clock error".into()))?
        .as_millis();
    i64::try_from(ms).map_err(|_| DrawError::EventLog("system clock overflow".into()))
}

/// Deterministic hash of one record's binding fields.
pub fn record_hash_v1(
    prev_record_hash: &RecordHash,
    sequence: u64,
    recorded_at_ms: i64,
    event: &DrawEvent,
) -> Result<RecordHash> {
    let event_bytes = serde_json::to_vec(event)
        .map_err(|e| DrawError::EventLog(format!("failed to serialize event: {e}")))?;

    let mut hasher = Sha256::new();
    hasher.update(EVENT_LOG_RECORD_DOMAIN_V1);
    hasher.update(1u32.to_le_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(recorded_at_ms.to_le_bytes());
    hasher.update(prev_record_hash.0);
    hasher.update((event_bytes.len() as u32).to_le_bytes());
    hasher.update(&event_bytes);
    Ok(RecordHash(hasher.finalize().into()))
}

/// Append-only file recorder.
///
/// Each line is one JSON-encoded `EventRecordV1`, hash-chained to the
/// previous line. A fresh log starts at the zero genesis hash; opening an
/// existing log resumes from its tail record, so appends across sessions
/// verify as one chain.
pub struct FileEventLog {
    path: PathBuf,
    /// Per-process serialization of appends and the chain head.
    state: Mutex<ChainState>,
}

struct ChainState {
    last_hash: RecordHash,
    next_sequence: u64,
}

impl FileEventLog {
    /// Open a log for appending; the file itself is created on first append.
    ///
    /// An existing file is scanned and the chain resumes after its last
    /// record. Fails if an existing record does not parse.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut last_hash = RecordHash::genesis();
        let mut next_sequence = 0u64;

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                for (line_no, line) in contents.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let record: EventRecordV1 = serde_json::from_str(line).map_err(|e| {
                        DrawError::EventLog(format!("line {}: invalid record: {e}", line_no + 1))
                    })?;
                    last_hash = record.record_hash;
                    next_sequence = record.sequence + 1;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DrawError::EventLog(format!(
                    "failed to read event log: {e}"
                )))
            }
        }

        Ok(Self {
            path,
            state: Mutex::new(ChainState {
                last_hash,
                next_sequence,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hash of the chain tail (genesis for an empty log).
    pub fn last_record_hash(&self) -> RecordHash {
        match self.state.lock() {
            Ok(guard) => guard.last_hash,
            Err(poisoned) => poisoned.into_inner().last_hash,
        }
    }
}

impl EventRecorder for FileEventLog {
    fn record(&self, event: &DrawEvent) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DrawError::EventLog("event log lock poisoned".into()))?;

        let recorded_at_ms = now_ms()?;
        let record_hash =
            record_hash_v1(&state.last_hash, state.next_sequence, recorded_at_ms, event)?;
        let record = EventRecordV1 {
            record_version: 1,
            sequence: state.next_sequence,
            recorded_at_ms,
            prev_record_hash: state.last_hash,
            record_hash,
            event: *event,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DrawError::EventLog(format!("failed to open event log: {e}")))?;

        let line = serde_json::to_vec(&record)
            .map_err(|e| DrawError::EventLog(format!("failed to serialize record: {e}")))?;
        file.write_all(&line)
            .map_err(|e| DrawError::EventLog(format!("failed to write record: {e}")))?;
        file.write_all(b"\n")
            .map_err(|e| DrawError::EventLog(format!("failed to write newline: {e}")))?;
        file.sync_all()
            .map_err(|e| DrawError::EventLog(format!("failed to sync event log: {e}")))?;

        state.last_hash = record_hash;
        state.next_sequence += 1;
        Ok(())
    }
}

/// Verify a log file's hash chain from genesis. Returns the record count.
pub fn verify_chain(path: &Path) -> Result<u64> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DrawError::EventLog(format!("failed to read event log: {e}")))?;

    let mut prev = RecordHash::genesis();
    let mut expected_sequence = 0u64;
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: EventRecordV1 = serde_json::from_str(line)
            .map_err(|e| DrawError::EventLog(format!("line {}: invalid record: {e}", line_no + 1)))?;

        if record.record_version != 1 {
            return Err(DrawError::EventLog(format!(
                "line {}: unsupported record version {}",
                line_no + 1,
                record.record_version
            )));
        }
        if record.sequence != expected_sequence {
            return Err(DrawError::EventLog(format!(
                "line {}: sequence {} breaks the chain (expected {})",
                line_no + 1,
                record.sequence,
                expected_sequence
            )));
        }
        if record.prev_record_hash != prev {
            return Err(DrawError::EventLog(format!(
                "line {}: prev hash does not match the chain head",
                line_no + 1
            )));
        }
        let recomputed = record_hash_v1(
            &record.prev_record_hash,
            record.sequence,
            record.recorded_at_ms,
            &record.event,
        )?;
        if recomputed != record.record_hash {
            return Err(DrawError::EventLog(format!(
                "line {}: record hash mismatch",
                line_no + 1
            )));
        }

        prev = record.record_hash;
        expected_sequence += 1;
    }

    Ok(expected_sequence)
}
