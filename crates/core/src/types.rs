use alloy::primitives::{Address, Bytes, B256, U256};

/// Full detail of a pending transaction as fetched from the node. Immutable
/// once built; owned by the reaction task that fetched it.
#[derive(Debug, Clone)]
pub struct PendingTx {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub input: Bytes,
    pub value: U256,
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub first_seen_ms: u64,
}
