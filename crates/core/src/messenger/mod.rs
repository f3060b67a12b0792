//! Collaborators the transfer sequencer drives but never implements.
//!
//! A [`CrossDomainMessenger`] submits bridge transactions and reports the
//! relay status of cross-domain messages. A [`MessengerConnector`] builds a
//! messenger for one invocation from the configuration and the caller's
//! wallet, which is always passed in explicitly.

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::domain::Domain;

/// Relay lifecycle states the sequencer waits for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    /// Deposit message executed on L2
    Relayed,
    /// Withdrawal state root published on L1, proof may be submitted
    ReadyToProve,
    /// Proof accepted, challenge window running
    InChallengePeriod,
    /// Challenge window elapsed, withdrawal may be finalized
    ReadyForRelay,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageStatus::Relayed => "RELAYED",
            MessageStatus::ReadyToProve => "READY_TO_PROVE",
            MessageStatus::InChallengePeriod => "IN_CHALLENGE_PERIOD",
            MessageStatus::ReadyForRelay => "READY_FOR_RELAY",
        };
        f.write_str(name)
    }
}

/// Caller-supplied transaction overrides, passed through untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOverrides {
    pub gas_limit: Option<U256>,
}

impl TxOverrides {
    pub fn with_gas_limit(gas_limit: u64) -> Self {
        Self {
            gas_limit: Some(U256::from(gas_limit)),
        }
    }
}

/// A submitted transaction whose confirmation can be awaited
#[async_trait]
pub trait PendingTx: Send + Sync {
    /// Transaction hash, known as soon as the transaction is submitted
    fn hash(&self) -> TxHash;

    /// Resolves once the transaction is confirmed, fails if it reverted or was dropped
    async fn wait(&self) -> anyhow::Result<()>;
}

/// Cross-domain messenger bound to a signer on one side of the bridge
#[async_trait]
pub trait CrossDomainMessenger: Send + Sync {
    /// Grant the bridge an allowance over the L1 token
    async fn approve_allowance(
        &self,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
    ) -> anyhow::Result<Box<dyn PendingTx>>;

    async fn deposit_native(&self, amount: U256) -> anyhow::Result<Box<dyn PendingTx>>;

    async fn withdraw_native(&self, amount: U256) -> anyhow::Result<Box<dyn PendingTx>>;

    async fn withdraw_asset(
        &self,
        l1_token: Address,
        l2_token: Address,
        token_id: U256,
    ) -> anyhow::Result<Box<dyn PendingTx>>;

    /// Submit the L1 proof for the message sent by `source_tx`
    async fn prove_message(&self, source_tx: TxHash) -> anyhow::Result<Box<dyn PendingTx>>;

    /// Submit the L1 finalization for the message sent by `source_tx`
    async fn finalize_message(
        &self,
        source_tx: TxHash,
        overrides: TxOverrides,
    ) -> anyhow::Result<Box<dyn PendingTx>>;

    /// Resolves once the relay reports `status` for the message.
    ///
    /// Implementations must not impose their own deadline: challenge
    /// periods legitimately last days.
    async fn wait_for_message_status(&self, source_tx: TxHash, status: MessageStatus) -> anyhow::Result<()>;
}

/// The caller's signing identity
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connected account, `None` when the wallet is disconnected
    async fn resolve_account(&self) -> Option<Address>;
}

/// Builds a messenger for one transfer from the caller's wallet
#[async_trait]
pub trait MessengerConnector: Send + Sync {
    type Wallet: WalletProvider;

    /// `signing_domain` is the side whose transactions the wallet signs first:
    /// L1 for deposits, L2 for withdrawals.
    async fn connect(
        &self,
        config: &BridgeConfig,
        wallet: &Self::Wallet,
        signing_domain: Domain,
    ) -> anyhow::Result<Arc<dyn CrossDomainMessenger>>;
}
