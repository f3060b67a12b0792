//! Transfer step sequencer.
//!
//! Each entry point checks its preconditions without touching the tracker,
//! then walks a fixed list of submissions, confirmations and relay waits.
//! Steps never overlap and are never retried; the first failure is
//! classified, put on the tracker and returned.

use ethers::types::{Address, TxHash};
use std::future::Future;
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info};

use super::classify::classify;
use super::tracker::{ProgressTracker, TransferEvent, TransferState};
use super::{
    format_elapsed, AssetWithdrawalReceipt, DepositReceipt, Phase, TransferKind, TxStep, WithdrawalReceipt,
};
use crate::config::{BridgeConfig, NativeTokenConfig};
use crate::domain::{chain_label, AssetRef, Domain, NativeAmount};
use crate::messenger::{CrossDomainMessenger, MessageStatus, MessengerConnector, PendingTx, TxOverrides, WalletProvider};
use crate::{Error, Result};

/// Relay gates between a proven withdrawal and its finalization
struct ChallengeGate {
    status: MessageStatus,
    message: &'static str,
}

const CHALLENGE_MESSAGE: &str =
    "Waiting for challenge period (this may take up to 7 days on mainnet, shorter on testnet)...";

const NATIVE_CHALLENGE_GATES: &[ChallengeGate] = &[ChallengeGate {
    status: MessageStatus::ReadyForRelay,
    message: CHALLENGE_MESSAGE,
}];

const ASSET_CHALLENGE_GATES: &[ChallengeGate] = &[
    ChallengeGate {
        status: MessageStatus::InChallengePeriod,
        message: CHALLENGE_MESSAGE,
    },
    ChallengeGate {
        status: MessageStatus::ReadyForRelay,
        message: "In challenge period, waiting until the withdrawal is ready for relay...",
    },
];

/// L1 side of a withdrawal, shared by native and asset withdrawals
struct WithdrawalPlan {
    prove_gate: Phase,
    challenge_gates: &'static [ChallengeGate],
    finalize_overrides: TxOverrides,
}

/// Hashes of the L1 transactions that complete a withdrawal
struct Settlement {
    prove: TxHash,
    finalize: TxHash,
}

/// Drives one transfer at a time and exposes its progress
pub struct TransferOrchestrator<C: MessengerConnector> {
    config: BridgeConfig,
    connector: C,
    tracker: ProgressTracker,
}

impl<C: MessengerConnector> TransferOrchestrator<C> {
    /// Validates the configuration up front so no transfer starts with a bad one
    pub fn new(config: BridgeConfig, connector: C) -> Result<Self> {
        config.validate()?;

        info!(
            l1 = %chain_label(config.l1.chain_id),
            l2 = %chain_label(config.l2.chain_id),
            "Bridge orchestrator configured"
        );

        Ok(Self {
            config,
            connector,
            tracker: ProgressTracker::new(),
        })
    }

    /// Returns the validated configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Current state of the live (or last) transfer
    pub fn state(&self) -> TransferState {
        self.tracker.snapshot()
    }

    /// Returns a receiver that always holds the latest state
    pub fn subscribe(&self) -> watch::Receiver<TransferState> {
        self.tracker.subscribe()
    }

    /// Returns a receiver for every tracker mutation from now on
    pub fn events(&self) -> broadcast::Receiver<TransferEvent> {
        self.tracker.events()
    }

    /// Returns the tracker to idle so a new transfer can be started
    pub fn reset(&self) {
        self.tracker.reset();
    }

    /// Deposits the native token from L1 to L2.
    ///
    /// Progress: 5, 15, 25, 40, 60, 80, 100.
    pub async fn deposit_native(&self, amount: &str, wallet: Option<&C::Wallet>) -> Result<DepositReceipt> {
        let (wallet, account) = resolve_wallet(wallet).await?;
        let token = self.config.native_token()?;
        let amount = NativeAmount::parse(amount)?;

        let started = Instant::now();
        let kind = TransferKind::NativeDeposit;
        self.tracker.begin(kind);
        info!(kind = %kind, account = ?account, amount = %amount, "Starting transfer");

        let outcome = self.run_native_deposit(wallet, token, amount, started).await;
        self.settle(kind, outcome)
    }

    /// Withdraws the native token from L2 to L1.
    ///
    /// Progress: 15, 25, 40, 60, 70, 75, 90, 95, 100.
    pub async fn withdraw_native(&self, amount: &str, wallet: Option<&C::Wallet>) -> Result<WithdrawalReceipt> {
        let (wallet, account) = resolve_wallet(wallet).await?;
        let token = self.config.native_token()?;
        let amount = NativeAmount::parse(amount)?;

        let started = Instant::now();
        let kind = TransferKind::NativeWithdrawal;
        self.tracker.begin(kind);
        info!(kind = %kind, account = ?account, amount = %amount, "Starting transfer");

        let outcome = self.run_native_withdrawal(wallet, token, amount, started).await;
        self.settle(kind, outcome)
    }

    /// Withdraws a non-fungible token from L2 to L1.
    ///
    /// Progress: 15, 25, 40, 60, 70, 75, 75, 90, 95, 100.
    pub async fn withdraw_asset(
        &self,
        l1_token: &str,
        l2_token: &str,
        token_id: &str,
        wallet: Option<&C::Wallet>,
    ) -> Result<AssetWithdrawalReceipt> {
        let (wallet, account) = resolve_wallet(wallet).await?;
        let asset = AssetRef::parse(l1_token, l2_token, token_id)?;

        let started = Instant::now();
        let kind = TransferKind::AssetWithdrawal;
        self.tracker.begin(kind);
        info!(
            kind = %kind,
            account = ?account,
            l1_token = ?asset.l1_token,
            token_id = %asset.token_id_text,
            "Starting transfer"
        );

        let outcome = self.run_asset_withdrawal(wallet, asset, started).await;
        self.settle(kind, outcome)
    }

    async fn run_native_deposit(
        &self,
        wallet: &C::Wallet,
        token: &NativeTokenConfig,
        amount: NativeAmount,
        started: Instant,
    ) -> anyhow::Result<DepositReceipt> {
        let symbol = &token.symbol;

        self.tracker.set(Phase::Idle, "Initializing bridge...", 5);
        let messenger = self.connector.connect(&self.config, wallet, Domain::L1).await?;

        self.tracker.set(Phase::Approving, format!("Approving {}... (confirm in wallet)", symbol), 15);
        let approval = self
            .submit(
                TxStep::Approval,
                messenger.approve_allowance(token.l1_address, token.l2_address, amount.raw()),
            )
            .await?;

        self.tracker.set(Phase::Approving, "Waiting for approval confirmation...", 25);
        approval.wait().await?;

        self.tracker.set(Phase::Depositing, format!("Depositing {}... (confirm in wallet)", symbol), 40);
        let deposit = self
            .submit(TxStep::Initiating, messenger.deposit_native(amount.raw()))
            .await?;

        self.tracker.set(Phase::WaitingL1, "Waiting for L1 confirmation...", 60);
        deposit.wait().await?;

        self.tracker.set(Phase::WaitingL2, "Waiting for L2 relay...", 80);
        await_relay(messenger.as_ref(), deposit.hash(), MessageStatus::Relayed).await?;

        let elapsed = started.elapsed();
        self.tracker.succeed(format!("{} deposit complete in {}!", symbol, format_elapsed(elapsed)));

        Ok(DepositReceipt {
            amount,
            transaction_hash: deposit.hash(),
            elapsed,
        })
    }

    async fn run_native_withdrawal(
        &self,
        wallet: &C::Wallet,
        token: &NativeTokenConfig,
        amount: NativeAmount,
        started: Instant,
    ) -> anyhow::Result<WithdrawalReceipt> {
        let messenger = self.connector.connect(&self.config, wallet, Domain::L2).await?;

        self.tracker.set(
            Phase::Initiating,
            format!("Initiating {} withdrawal from L2... (confirm in wallet)", token.symbol),
            15,
        );
        let withdrawal = self
            .submit(TxStep::Initiating, messenger.withdraw_native(amount.raw()))
            .await?;

        let plan = WithdrawalPlan {
            prove_gate: Phase::WaitingStateRoot,
            challenge_gates: NATIVE_CHALLENGE_GATES,
            finalize_overrides: TxOverrides::default(),
        };
        let settlement = self.settle_withdrawal(messenger.as_ref(), withdrawal.as_ref(), &plan).await?;

        let elapsed = started.elapsed();
        self.tracker.succeed(format!("Withdrawal complete in {}!", format_elapsed(elapsed)));

        Ok(WithdrawalReceipt {
            amount,
            withdraw_transaction_hash: withdrawal.hash(),
            prove_transaction_hash: settlement.prove,
            finalize_transaction_hash: settlement.finalize,
            elapsed,
        })
    }

    async fn run_asset_withdrawal(
        &self,
        wallet: &C::Wallet,
        asset: AssetRef,
        started: Instant,
    ) -> anyhow::Result<AssetWithdrawalReceipt> {
        let messenger = self.connector.connect(&self.config, wallet, Domain::L2).await?;

        self.tracker.set(
            Phase::Initiating,
            "Initiating asset withdrawal from L2... (confirm in wallet)",
            15,
        );
        let withdrawal = self
            .submit(
                TxStep::Initiating,
                messenger.withdraw_asset(asset.l1_token, asset.l2_token, asset.token_id),
            )
            .await?;

        let plan = WithdrawalPlan {
            prove_gate: Phase::WaitingProve,
            challenge_gates: ASSET_CHALLENGE_GATES,
            finalize_overrides: TxOverrides::with_gas_limit(self.config.asset_finalize_gas_limit),
        };
        let settlement = self.settle_withdrawal(messenger.as_ref(), withdrawal.as_ref(), &plan).await?;

        let elapsed = started.elapsed();
        self.tracker.succeed(format!("Asset withdrawal complete in {}!", format_elapsed(elapsed)));

        Ok(AssetWithdrawalReceipt {
            token_id: asset.token_id_text,
            withdraw_transaction_hash: withdrawal.hash(),
            prove_transaction_hash: settlement.prove,
            finalize_transaction_hash: settlement.finalize,
            elapsed,
        })
    }

    /// L2 confirmation, prove, challenge period and finalize (25 through 95)
    async fn settle_withdrawal(
        &self,
        messenger: &dyn CrossDomainMessenger,
        withdrawal: &dyn PendingTx,
        plan: &WithdrawalPlan,
    ) -> anyhow::Result<Settlement> {
        let source = withdrawal.hash();

        self.tracker.set(Phase::Initiating, "Waiting for L2 confirmation...", 25);
        withdrawal.wait().await?;

        self.tracker.set(
            plan.prove_gate,
            "Waiting for state root to be published to L1 (this may take several minutes)...",
            40,
        );
        await_relay(messenger, source, MessageStatus::ReadyToProve).await?;

        self.tracker.set(Phase::Proving, "Proving withdrawal on L1... (confirm in wallet)", 60);
        let prove = self.submit(TxStep::Proof, messenger.prove_message(source)).await?;

        self.tracker.set(Phase::Proving, "Waiting for prove confirmation...", 70);
        prove.wait().await?;

        // no deadline: the challenge window may last days
        for gate in plan.challenge_gates {
            self.tracker.set(Phase::WaitingChallenge, gate.message, 75);
            await_relay(messenger, source, gate.status).await?;
        }

        self.tracker.set(Phase::Finalizing, "Finalizing withdrawal on L1... (confirm in wallet)", 90);
        let finalize = self
            .submit(TxStep::Finalize, messenger.finalize_message(source, plan.finalize_overrides))
            .await?;

        self.tracker.set(Phase::Finalizing, "Waiting for finalization...", 95);
        finalize.wait().await?;

        Ok(Settlement {
            prove: prove.hash(),
            finalize: finalize.hash(),
        })
    }

    /// Awaits a submission and records its hash before anything else happens
    async fn submit<F>(&self, step: TxStep, submission: F) -> anyhow::Result<Box<dyn PendingTx>>
    where
        F: Future<Output = anyhow::Result<Box<dyn PendingTx>>>,
    {
        let pending = submission.await?;
        self.tracker.record_hash(step, pending.hash());
        Ok(pending)
    }

    fn settle<T>(&self, kind: TransferKind, outcome: anyhow::Result<T>) -> Result<T> {
        outcome.map_err(|err| {
            let normalized = classify(&err);
            error!(kind = %kind, cause = %format!("{:#}", err), "Transfer failed: {}", normalized);
            self.tracker.fail(&normalized);
            normalized
        })
    }
}

/// A wallet must be supplied and report an account
async fn resolve_wallet<W: WalletProvider>(wallet: Option<&W>) -> Result<(&W, Address)> {
    let wallet = wallet.ok_or(Error::NotConnected)?;
    let account = wallet.resolve_account().await.ok_or(Error::NotConnected)?;
    Ok((wallet, account))
}

async fn await_relay(messenger: &dyn CrossDomainMessenger, source: TxHash, status: MessageStatus) -> anyhow::Result<()> {
    debug!(tx = ?source, status = %status, "Waiting for relay status");
    messenger.wait_for_message_status(source, status).await?;
    debug!(tx = ?source, status = %status, "Relay status reached");
    Ok(())
}
