use alloy::consensus::Transaction as TransactionTrait;
use alloy::network::TransactionResponse;
use alloy::primitives::B256;
use alloy::providers::{DynProvider, Provider};
use anyhow::Result;
use forerun_core::types::PendingTx;
use forerun_core::utils::now_ms;
use std::time::Duration;
use tracing::warn;

/// Looks up the full record for a feed hash. `Ok(None)` covers both a real
/// lookup miss (already mined or evicted) and a fetch timeout; neither is an
/// error on this path.
#[derive(Clone)]
pub struct TxFetcher {
    provider: DynProvider,
    timeout: Duration,
}

impl TxFetcher {
    pub fn new(provider: DynProvider, timeout_ms: u64) -> Self {
        Self {
            provider,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub async fn fetch(&self, hash: B256) -> Result<Option<PendingTx>> {
        let fut = self.provider.get_transaction_by_hash(hash);
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => {
                let tx_opt = result?;
                Ok(tx_opt.map(|tx| Self::map_tx(tx, now_ms())))
            }
            Err(_) => {
                warn!(%hash, timeout_ms = self.timeout.as_millis(), "tx fetch timed out");
                Ok(None)
            }
        }
    }

    fn map_tx<T>(tx: T, first_seen_ms: u64) -> PendingTx
    where
        T: TransactionTrait + TransactionResponse,
    {
        // Legacy and 2930 transactions carry a gas price, not a 1559 fee
        // pair; leave both fee fields empty so the builder skips them.
        let max_fee_per_gas = if tx.is_dynamic_fee() {
            Some(TransactionTrait::max_fee_per_gas(&tx))
        } else {
            None
        };
        PendingTx {
            hash: tx.tx_hash(),
            from: tx.from(),
            to: tx.to(),
            input: tx.input().clone(),
            value: tx.value(),
            nonce: tx.nonce(),
            gas_limit: tx.gas_limit(),
            max_fee_per_gas,
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas(),
            first_seen_ms,
        }
    }
}
