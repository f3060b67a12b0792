//! In-memory messenger that records every call and fails or stalls on demand.

use anyhow::anyhow;
use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::BridgeConfig;
use crate::domain::Domain;
use crate::messenger::{
    CrossDomainMessenger, MessageStatus, MessengerConnector, PendingTx, TxOverrides, WalletProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Approve,
    Deposit,
    WithdrawNative,
    WithdrawAsset,
    Prove,
    Finalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Submit(Call),
    Confirm(Call),
    Wait(MessageStatus),
}

#[derive(Default)]
struct Journal {
    steps: Mutex<Vec<Step>>,
    amounts: Mutex<Vec<U256>>,
    token_ids: Mutex<Vec<U256>>,
    finalize_overrides: Mutex<Option<TxOverrides>>,
}

impl Journal {
    fn push(&self, step: Step) {
        self.steps.lock().unwrap().push(step);
    }
}

#[derive(Default)]
pub(crate) struct ScriptedMessenger {
    journal: Arc<Journal>,
    next_hash: AtomicU64,
    failures: Mutex<Vec<(Step, String)>>,
    stall_on: Mutex<Option<MessageStatus>>,
}

impl ScriptedMessenger {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes `step` fail with `message`
    pub(crate) fn fail_at(&self, step: Step, message: &str) {
        self.failures.lock().unwrap().push((step, message.to_string()));
    }

    /// Makes the wait for `status` never resolve
    pub(crate) fn stall_on(&self, status: MessageStatus) {
        *self.stall_on.lock().unwrap() = Some(status);
    }

    pub(crate) fn steps(&self) -> Vec<Step> {
        self.journal.steps.lock().unwrap().clone()
    }

    pub(crate) fn amounts(&self) -> Vec<U256> {
        self.journal.amounts.lock().unwrap().clone()
    }

    pub(crate) fn token_ids(&self) -> Vec<U256> {
        self.journal.token_ids.lock().unwrap().clone()
    }

    pub(crate) fn finalize_overrides(&self) -> Option<TxOverrides> {
        *self.journal.finalize_overrides.lock().unwrap()
    }

    fn failure_for(&self, step: Step) -> Option<String> {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .find(|(at, _)| *at == step)
            .map(|(_, message)| message.clone())
    }

    fn submit(&self, call: Call) -> anyhow::Result<Box<dyn PendingTx>> {
        self.journal.push(Step::Submit(call));
        if let Some(message) = self.failure_for(Step::Submit(call)) {
            return Err(anyhow!(message));
        }

        let n = self.next_hash.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedTx {
            call,
            hash: TxHash::from_low_u64_be(0xb000 + n),
            journal: Arc::clone(&self.journal),
            failure: self.failure_for(Step::Confirm(call)),
        }))
    }
}

struct ScriptedTx {
    call: Call,
    hash: TxHash,
    journal: Arc<Journal>,
    failure: Option<String>,
}

#[async_trait]
impl PendingTx for ScriptedTx {
    fn hash(&self) -> TxHash {
        self.hash
    }

    async fn wait(&self) -> anyhow::Result<()> {
        self.journal.push(Step::Confirm(self.call));
        match &self.failure {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CrossDomainMessenger for ScriptedMessenger {
    async fn approve_allowance(
        &self,
        _l1_token: Address,
        _l2_token: Address,
        amount: U256,
    ) -> anyhow::Result<Box<dyn PendingTx>> {
        self.journal.amounts.lock().unwrap().push(amount);
        self.submit(Call::Approve)
    }

    async fn deposit_native(&self, amount: U256) -> anyhow::Result<Box<dyn PendingTx>> {
        self.journal.amounts.lock().unwrap().push(amount);
        self.submit(Call::Deposit)
    }

    async fn withdraw_native(&self, amount: U256) -> anyhow::Result<Box<dyn PendingTx>> {
        self.journal.amounts.lock().unwrap().push(amount);
        self.submit(Call::WithdrawNative)
    }

    async fn withdraw_asset(
        &self,
        _l1_token: Address,
        _l2_token: Address,
        token_id: U256,
    ) -> anyhow::Result<Box<dyn PendingTx>> {
        self.journal.token_ids.lock().unwrap().push(token_id);
        self.submit(Call::WithdrawAsset)
    }

    async fn prove_message(&self, _source_tx: TxHash) -> anyhow::Result<Box<dyn PendingTx>> {
        self.submit(Call::Prove)
    }

    async fn finalize_message(
        &self,
        _source_tx: TxHash,
        overrides: TxOverrides,
    ) -> anyhow::Result<Box<dyn PendingTx>> {
        *self.journal.finalize_overrides.lock().unwrap() = Some(overrides);
        self.submit(Call::Finalize)
    }

    async fn wait_for_message_status(&self, _source_tx: TxHash, status: MessageStatus) -> anyhow::Result<()> {
        self.journal.push(Step::Wait(status));
        if let Some(message) = self.failure_for(Step::Wait(status)) {
            return Err(anyhow!(message));
        }

        let stalled = *self.stall_on.lock().unwrap() == Some(status);
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

pub(crate) struct ScriptedWallet {
    pub(crate) account: Option<Address>,
}

impl ScriptedWallet {
    pub(crate) fn connected() -> Self {
        Self {
            account: Some(Address::from_low_u64_be(0xa11ce)),
        }
    }

    pub(crate) fn disconnected() -> Self {
        Self { account: None }
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    async fn resolve_account(&self) -> Option<Address> {
        self.account
    }
}

pub(crate) struct ScriptedConnector {
    messenger: Arc<ScriptedMessenger>,
    domains: Mutex<Vec<Domain>>,
    failure: Option<String>,
}

impl ScriptedConnector {
    pub(crate) fn new(messenger: Arc<ScriptedMessenger>) -> Self {
        Self {
            messenger,
            domains: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub(crate) fn failing(messenger: Arc<ScriptedMessenger>, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(messenger)
        }
    }

    /// Signing domains requested so far
    pub(crate) fn domains(&self) -> Vec<Domain> {
        self.domains.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessengerConnector for ScriptedConnector {
    type Wallet = ScriptedWallet;

    async fn connect(
        &self,
        _config: &BridgeConfig,
        _wallet: &ScriptedWallet,
        signing_domain: Domain,
    ) -> anyhow::Result<Arc<dyn CrossDomainMessenger>> {
        self.domains.lock().unwrap().push(signing_domain);
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }
        Ok(self.messenger.clone())
    }
}
