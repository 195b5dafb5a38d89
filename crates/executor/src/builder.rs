use crate::fees::FeeBump;
use alloy::primitives::{Address, TxKind};
use alloy::rpc::types::transaction::TransactionInput;
use alloy::rpc::types::TransactionRequest;
use forerun_core::types::PendingTx;

/// Derives the competing transaction for a matched pending transaction:
/// same recipient, value, and calldata, fee fields bumped so it outbids the
/// original, sent from our own signer.
#[derive(Clone)]
pub struct RaceTxBuilder {
    pub owner: Address,
    pub bump: FeeBump,
}

impl RaceTxBuilder {
    pub fn new(owner: Address, bump: FeeBump) -> Self {
        Self { owner, bump }
    }

    /// Returns `None` when the original cannot be raced: no recipient
    /// (contract creation) or no EIP-1559 fee pair to outbid.
    pub fn build(&self, tx: &PendingTx) -> Option<TransactionRequest> {
        let to = tx.to?;
        let max_fee = tx.max_fee_per_gas?;
        let priority_fee = tx.max_priority_fee_per_gas?;

        Some(TransactionRequest {
            from: Some(self.owner),
            to: Some(TxKind::Call(to)),
            value: Some(tx.value),
            input: TransactionInput::new(tx.input.clone()),
            max_fee_per_gas: Some(self.bump.bump_fee_cap(max_fee)),
            max_priority_fee_per_gas: Some(self.bump.bump_priority_fee(priority_fee)),
            gas: Some(self.bump.bump_gas_limit(tx.gas_limit)),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes, B256, U256};

    fn bump() -> FeeBump {
        FeeBump {
            priority_fee_pct: 120,
            fee_cap_pct: 120,
            gas_limit_pct: 200,
        }
    }

    fn observed() -> PendingTx {
        PendingTx {
            hash: B256::repeat_byte(0xaa),
            from: address!("0x1000000000000000000000000000000000000001"),
            to: Some(address!("0x2000000000000000000000000000000000000002")),
            input: Bytes::from(vec![0x12, 0x49, 0xc5, 0x8b]),
            value: U256::from(1_000u64),
            nonce: 7,
            gas_limit: 100_000,
            max_fee_per_gas: Some(20),
            max_priority_fee_per_gas: Some(10),
            first_seen_ms: 0,
        }
    }

    #[test]
    fn race_tx_copies_call_and_bumps_fees() {
        let owner = address!("0x3000000000000000000000000000000000000003");
        let builder = RaceTxBuilder::new(owner, bump());
        let req = builder.build(&observed()).unwrap();

        assert_eq!(req.from, Some(owner));
        assert_eq!(
            req.to,
            Some(TxKind::Call(address!(
                "0x2000000000000000000000000000000000000002"
            )))
        );
        assert_eq!(req.value, Some(U256::from(1_000u64)));
        assert_eq!(
            req.input.input(),
            Some(&Bytes::from(vec![0x12, 0x49, 0xc5, 0x8b]))
        );
        assert_eq!(req.max_priority_fee_per_gas, Some(12));
        assert_eq!(req.max_fee_per_gas, Some(24));
        assert_eq!(req.gas, Some(200_000));
    }

    #[test]
    fn legacy_original_is_not_raced() {
        let builder = RaceTxBuilder::new(Address::ZERO, bump());
        let mut tx = observed();
        tx.max_fee_per_gas = None;
        tx.max_priority_fee_per_gas = None;
        assert!(builder.build(&tx).is_none());
    }

    #[test]
    fn contract_creation_is_not_raced() {
        let builder = RaceTxBuilder::new(Address::ZERO, bump());
        let mut tx = observed();
        tx.to = None;
        assert!(builder.build(&tx).is_none());
    }
}
