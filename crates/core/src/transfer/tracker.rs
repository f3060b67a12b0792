use ethers::types::TxHash;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::SystemTime;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use super::classify::ErrorKind;
use super::{Phase, TransferKind, TxStep};
use crate::Error;

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 64;

/// Normalized failure kept on the state while in the error phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for TransferFailure {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Observable state of the transfer currently owned by an orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct TransferState {
    pub kind: Option<TransferKind>,
    pub phase: Phase,
    pub message: String,
    pub progress: u8,
    pub transaction_hashes: BTreeMap<TxStep, TxHash>,
    pub error: Option<TransferFailure>,
    pub started_at: Option<SystemTime>,
}

impl TransferState {
    pub fn is_in_flight(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Success | Phase::Error)
    }

    pub fn is_success(&self) -> bool {
        self.phase == Phase::Success
    }

    pub fn is_error(&self) -> bool {
        self.phase == Phase::Error
    }

    pub fn transaction_hash(&self, step: TxStep) -> Option<TxHash> {
        self.transaction_hashes.get(&step).copied()
    }
}

/// Change notifications, one per tracker mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Started { kind: TransferKind },
    Progress { phase: Phase, message: String, progress: u8 },
    TransactionSubmitted { step: TxStep, hash: TxHash },
    Completed { message: String },
    Failed { failure: TransferFailure },
    Reset,
}

/// Holds phase, message and progress as one value.
///
/// Readers either poll [`snapshot`](Self::snapshot), watch whole-state
/// values via [`subscribe`](Self::subscribe), or receive every mutation
/// via [`events`](Self::events).
pub struct ProgressTracker {
    state: watch::Sender<TransferState>,
    events: broadcast::Sender<TransferEvent>,
}

impl ProgressTracker {
    /// Creates a new tracker in the idle state
    pub fn new() -> Self {
        let (state, _) = watch::channel(TransferState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { state, events }
    }

    /// Returns a copy of the current state
    pub fn snapshot(&self) -> TransferState {
        self.state.borrow().clone()
    }

    /// Returns a watch receiver holding the latest state
    pub fn subscribe(&self) -> watch::Receiver<TransferState> {
        self.state.subscribe()
    }

    /// Returns a receiver for every mutation from now on
    pub fn events(&self) -> broadcast::Receiver<TransferEvent> {
        self.events.subscribe()
    }

    /// Opens a new operation, dropping hashes and error of the previous one
    pub fn begin(&self, kind: TransferKind) {
        self.state.send_replace(TransferState {
            kind: Some(kind),
            started_at: Some(SystemTime::now()),
            ..TransferState::default()
        });
        self.emit(TransferEvent::Started { kind });
    }

    /// Overwrites phase, message and progress together
    pub fn set(&self, phase: Phase, message: impl Into<String>, progress: u8) {
        let message = message.into();
        let progress = progress.min(100);

        self.state.send_modify(|state| {
            if !phase.is_terminal() && progress < state.progress {
                warn!(
                    phase = %phase,
                    from = state.progress,
                    to = progress,
                    "Progress moved backwards"
                );
            }
            state.phase = phase;
            state.message = message.clone();
            state.progress = progress;
        });

        info!(phase = %phase, progress, "{}", message);
        self.emit(TransferEvent::Progress { phase, message, progress });
    }

    /// Records a submitted transaction; an existing entry is never replaced
    pub fn record_hash(&self, step: TxStep, hash: TxHash) {
        let mut inserted = false;
        self.state.send_if_modified(|state| {
            if let Some(existing) = state.transaction_hashes.get(&step).copied() {
                warn!(step = %step, existing = ?existing, ignored = ?hash, "Transaction hash already recorded");
                return false;
            }
            state.transaction_hashes.insert(step, hash);
            inserted = true;
            true
        });

        if inserted {
            info!(step = %step, hash = ?hash, "Transaction submitted");
            self.emit(TransferEvent::TransactionSubmitted { step, hash });
        }
    }

    /// Terminal success at 100, keeping recorded hashes
    pub fn succeed(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|state| {
            state.phase = Phase::Success;
            state.message = message.clone();
            state.progress = 100;
            state.error = None;
        });
        info!("{}", message);
        self.emit(TransferEvent::Completed { message });
    }

    /// Terminal error: progress drops to 0, recorded hashes are kept
    pub fn fail(&self, error: &Error) {
        let failure = TransferFailure::from(error);
        self.state.send_modify(|state| {
            state.phase = Phase::Error;
            state.message = failure.message.clone();
            state.progress = 0;
            state.error = Some(failure.clone());
        });
        self.emit(TransferEvent::Failed { failure });
    }

    /// Back to `{idle, "", 0}` with no hashes or error
    pub fn reset(&self) {
        self.state.send_replace(TransferState::default());
        self.emit(TransferEvent::Reset);
    }

    fn emit(&self, event: TransferEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
