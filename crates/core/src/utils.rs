use alloy::primitives::{keccak256, Address};
use anyhow::anyhow;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    Address::from_str(s).map_err(|e| anyhow!("invalid address {s}: {e}"))
}

/// 4-byte function selector for a canonical signature string, e.g.
/// `fn_selector("mint()")` == `0x1249c58b`.
pub fn fn_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

#[cfg(test)]
mod tests {
    use super::fn_selector;

    #[test]
    fn mint_selector_matches_known_value() {
        assert_eq!(fn_selector("mint()"), [0x12, 0x49, 0xc5, 0x8b]);
    }

    #[test]
    fn transfer_selector_matches_known_value() {
        assert_eq!(
            fn_selector("transfer(address,uint256)"),
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn selector_is_deterministic() {
        assert_eq!(fn_selector("claim(uint256)"), fn_selector("claim(uint256)"));
    }
}
