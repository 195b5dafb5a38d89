/// Percentage bump applied to a matched transaction's priority parameters.
/// Whole percentages keep the math in integers: 120 means x1.2. Fee
/// percentages must exceed 100 so the race strictly outbids the original;
/// the gas percentage may equal 100. Config validation enforces both.
#[derive(Debug, Clone, Copy)]
pub struct FeeBump {
    pub priority_fee_pct: u32,
    pub fee_cap_pct: u32,
    pub gas_limit_pct: u32,
}

impl FeeBump {
    pub fn bump_priority_fee(&self, wei: u128) -> u128 {
        scale_up(wei, self.priority_fee_pct)
    }

    pub fn bump_fee_cap(&self, wei: u128) -> u128 {
        scale_up(wei, self.fee_cap_pct)
    }

    pub fn bump_gas_limit(&self, gas: u64) -> u64 {
        scale_down(gas as u128, self.gas_limit_pct).min(u64::MAX as u128) as u64
    }
}

// Fees round up: truncating 4 * 120 / 100 to 4 would not outbid the
// original, so any non-zero fee at pct > 100 must land strictly above it.
fn scale_up(value: u128, pct: u32) -> u128 {
    value.saturating_mul(pct as u128).div_ceil(100)
}

// Gas rounds down; pct 100 keeps the original limit.
fn scale_down(value: u128, pct: u32) -> u128 {
    value.saturating_mul(pct as u128) / 100
}

#[cfg(test)]
mod tests {
    use super::FeeBump;

    const BUMP: FeeBump = FeeBump {
        priority_fee_pct: 120,
        fee_cap_pct: 120,
        gas_limit_pct: 200,
    };

    #[test]
    fn bumps_match_reference_scenario() {
        assert_eq!(BUMP.bump_priority_fee(10), 12);
        assert_eq!(BUMP.bump_fee_cap(20), 24);
        assert_eq!(BUMP.bump_gas_limit(100_000), 200_000);
    }

    #[test]
    fn small_fees_are_strictly_bumped() {
        assert_eq!(BUMP.bump_priority_fee(4), 5); // 4.8 rounds up
        assert_eq!(BUMP.bump_priority_fee(1), 2);
        assert_eq!(BUMP.bump_fee_cap(1), 2);
        for wei in 1..200u128 {
            assert!(BUMP.bump_priority_fee(wei) > wei);
            assert!(BUMP.bump_fee_cap(wei) > wei);
        }
    }

    #[test]
    fn fees_round_up_and_gas_rounds_down() {
        let bump = FeeBump {
            priority_fee_pct: 110,
            fee_cap_pct: 110,
            gas_limit_pct: 100,
        };
        assert_eq!(bump.bump_priority_fee(15), 17); // 16.5 rounds up
        assert_eq!(bump.bump_gas_limit(21_000), 21_000);
    }

    #[test]
    fn large_values_do_not_overflow() {
        let wei = u128::MAX / 2;
        assert!(BUMP.bump_priority_fee(wei) > 0);
    }
}
