pub mod classify;
pub mod orchestrator;
pub mod tracker;

#[cfg(test)]
mod scripted;

use ethers::types::TxHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::NativeAmount;

pub use classify::{classify, ErrorKind};
pub use orchestrator::TransferOrchestrator;
pub use tracker::{ProgressTracker, TransferEvent, TransferFailure, TransferState};

/// Kind of cross-domain transfer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransferKind {
    /// Native token L1 -> L2
    NativeDeposit,
    /// Native token L2 -> L1
    NativeWithdrawal,
    /// Non-fungible asset L2 -> L1
    AssetWithdrawal,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::NativeDeposit => "native_deposit",
            TransferKind::NativeWithdrawal => "native_withdrawal",
            TransferKind::AssetWithdrawal => "asset_withdrawal",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer phase. Each kind walks its own subset:
///
/// - deposit: idle, approving, depositing, waiting_l1, waiting_l2
/// - native withdrawal: initiating, waiting_state_root, proving, waiting_challenge, finalizing
/// - asset withdrawal: initiating, waiting_prove, proving, waiting_challenge, finalizing
///
/// All kinds end in `success` or `error`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Approving,
    Depositing,
    #[serde(rename = "waiting_l1")]
    WaitingL1,
    #[serde(rename = "waiting_l2")]
    WaitingL2,
    Initiating,
    WaitingStateRoot,
    WaitingProve,
    Proving,
    WaitingChallenge,
    Finalizing,
    Success,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Approving => "approving",
            Phase::Depositing => "depositing",
            Phase::WaitingL1 => "waiting_l1",
            Phase::WaitingL2 => "waiting_l2",
            Phase::Initiating => "initiating",
            Phase::WaitingStateRoot => "waiting_state_root",
            Phase::WaitingProve => "waiting_prove",
            Phase::Proving => "proving",
            Phase::WaitingChallenge => "waiting_challenge",
            Phase::Finalizing => "finalizing",
            Phase::Success => "success",
            Phase::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Success | Phase::Error)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction slots recorded on a transfer, in submission order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TxStep {
    Approval,
    Initiating,
    Proof,
    Finalize,
}

impl TxStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStep::Approval => "approval",
            TxStep::Initiating => "initiating",
            TxStep::Proof => "proof",
            TxStep::Finalize => "finalize",
        }
    }
}

impl fmt::Display for TxStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a completed native deposit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepositReceipt {
    pub amount: NativeAmount,
    pub transaction_hash: TxHash,
    pub elapsed: Duration,
}

/// Result of a completed native withdrawal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub amount: NativeAmount,
    pub withdraw_transaction_hash: TxHash,
    pub prove_transaction_hash: TxHash,
    pub finalize_transaction_hash: TxHash,
    pub elapsed: Duration,
}

/// Result of a completed asset withdrawal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetWithdrawalReceipt {
    pub token_id: String,
    pub withdraw_transaction_hash: TxHash,
    pub prove_transaction_hash: TxHash,
    pub finalize_transaction_hash: TxHash,
    pub elapsed: Duration,
}

/// Renders a duration as seconds rounded half-up to one decimal
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let tenths = (elapsed.as_millis() + 50) / 100;
    format!("{}.{}s", tenths / 10, tenths % 10)
}
