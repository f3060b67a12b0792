use anyhow::{anyhow, bail};
use async_trait::async_trait;
use bridge_core::PendingTx;
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::types::{TransactionReceipt, TxHash, U64};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default delay between receipt polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Confirmation tracker for a submitted transaction.
///
/// Polls until the receipt shows up and the requested depth is reached.
/// There is no overall deadline; callers bound it themselves if needed.
pub struct ReceiptWatcher<P: JsonRpcClient> {
    provider: Arc<Provider<P>>,
    hash: TxHash,
    confirmations: u64,
    poll_interval: Duration,
}

impl<P: JsonRpcClient> ReceiptWatcher<P> {
    pub fn new(provider: Arc<Provider<P>>, hash: TxHash) -> Self {
        Self {
            provider,
            hash,
            confirmations: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Blocks required on top of (and including) the receipt block
    pub fn confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Waits for a successful receipt at the configured depth
    pub async fn receipt(&self) -> anyhow::Result<TransactionReceipt> {
        let receipt = loop {
            match self.provider.get_transaction_receipt(self.hash).await? {
                Some(receipt) => break receipt,
                None => {
                    debug!(tx = ?self.hash, "Receipt not available yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        };

        if receipt.status == Some(U64::zero()) {
            bail!("transaction {:?} reverted in block {:?}", self.hash, receipt.block_number);
        }

        if self.confirmations > 1 {
            let mined = receipt
                .block_number
                .ok_or_else(|| anyhow!("receipt for {:?} has no block number", self.hash))?;
            let target = mined + U64::from(self.confirmations - 1);

            loop {
                let head = self.provider.get_block_number().await?;
                if head >= target {
                    break;
                }
                debug!(tx = ?self.hash, head = %head, target = %target, "Waiting for confirmations");
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Ok(receipt)
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> PendingTx for ReceiptWatcher<P> {
    fn hash(&self) -> TxHash {
        self.hash
    }

    async fn wait(&self) -> anyhow::Result<()> {
        self.receipt().await.map(|_| ())
    }
}
