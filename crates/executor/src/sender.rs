use alloy::primitives::B256;
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Terminal state of a submitted race transaction. A lost race (reverted or
/// never mined) is an expected outcome, not a system failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed { block: u64 },
    Reverted,
    TimedOut,
}

#[derive(Clone)]
pub struct TxSender {
    provider: DynProvider,
    poll_interval: Duration,
    timeout: Duration,
}

impl TxSender {
    pub fn new(provider: DynProvider, poll_interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            provider,
            poll_interval: Duration::from_millis(poll_interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Broadcasts under the wallet attached to the provider. Rejections
    /// (underpriced, nonce conflict, insufficient funds) surface as `Err`
    /// and are the caller's to log; there is no retry.
    pub async fn send(&self, tx: TransactionRequest) -> Result<B256> {
        let pending = self.provider.send_transaction(tx).await?;
        let hash = *pending.inner().tx_hash();
        info!(%hash, "race tx broadcast");
        Ok(hash)
    }

    /// Polls for the receipt until the configured timeout.
    pub async fn confirm(&self, hash: B256) -> Result<TxOutcome> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(hash).await? {
                let block = receipt.block_number.unwrap_or_default();
                if receipt.status() {
                    return Ok(TxOutcome::Confirmed { block });
                }
                return Ok(TxOutcome::Reverted);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(TxOutcome::TimedOut);
            }
            sleep(self.poll_interval).await;
        }
    }
}
