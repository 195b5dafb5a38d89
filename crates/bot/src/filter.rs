use alloy::primitives::Address;
use forerun_core::types::PendingTx;
use forerun_core::utils::fn_selector;

/// Stateless match predicate: calldata starts with the target selector
/// and the sender is not us. Both fields are fixed at startup, so the
/// filter can be evaluated from any number of concurrent reaction tasks.
#[derive(Debug, Clone, Copy)]
pub struct TargetFilter {
    selector: [u8; 4],
    own_address: Address,
}

impl TargetFilter {
    pub fn new(signature: &str, own_address: Address) -> Self {
        Self {
            selector: fn_selector(signature),
            own_address,
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    pub fn is_target(&self, tx: &PendingTx) -> bool {
        // Excluding our own sends prevents the bot from racing its own race
        // transactions in a feedback loop.
        tx.input.len() >= 4 && tx.input[..4] == self.selector && tx.from != self.own_address
    }
}

#[cfg(test)]
mod tests {
    use super::TargetFilter;
    use alloy::primitives::{address, Address, Bytes, B256, U256};
    use forerun_core::types::PendingTx;

    const SELF: Address = address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

    fn tx(from: Address, input: Vec<u8>) -> PendingTx {
        PendingTx {
            hash: B256::ZERO,
            from,
            to: Some(address!("0x2000000000000000000000000000000000000002")),
            input: Bytes::from(input),
            value: U256::ZERO,
            nonce: 0,
            gas_limit: 21_000,
            max_fee_per_gas: Some(1),
            max_priority_fee_per_gas: Some(1),
            first_seen_ms: 0,
        }
    }

    #[test]
    fn matching_selector_from_other_sender_is_a_target() {
        let filter = TargetFilter::new("mint()", SELF);
        let other = address!("0x1000000000000000000000000000000000000001");
        assert!(filter.is_target(&tx(other, vec![0x12, 0x49, 0xc5, 0x8b])));
    }

    #[test]
    fn selector_match_includes_trailing_calldata() {
        let filter = TargetFilter::new("mint()", SELF);
        let other = address!("0x1000000000000000000000000000000000000001");
        let mut input = vec![0x12, 0x49, 0xc5, 0x8b];
        input.extend_from_slice(&[0u8; 32]);
        assert!(filter.is_target(&tx(other, input)));
    }

    #[test]
    fn wrong_selector_is_not_a_target() {
        let filter = TargetFilter::new("mint()", SELF);
        let other = address!("0x1000000000000000000000000000000000000001");
        assert!(!filter.is_target(&tx(other, vec![0xde, 0xad, 0xbe, 0xef])));
    }

    #[test]
    fn short_calldata_is_not_a_target() {
        let filter = TargetFilter::new("mint()", SELF);
        let other = address!("0x1000000000000000000000000000000000000001");
        assert!(!filter.is_target(&tx(other, vec![0x12, 0x49])));
        assert!(!filter.is_target(&tx(other, vec![])));
    }

    #[test]
    fn own_transaction_is_never_a_target() {
        let filter = TargetFilter::new("mint()", SELF);
        assert!(!filter.is_target(&tx(SELF, vec![0x12, 0x49, 0xc5, 0x8b])));
    }
}
