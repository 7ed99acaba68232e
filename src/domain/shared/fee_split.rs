use serde::{Deserialize, Serialize};

use super::money::Money;

/// How a fee is covered: prepaid wallet first, the rest payable externally.
///
/// Invariants (hold for every value built through `compute`):
/// - `wallet_deducted <= available balance`
/// - `total == wallet_deducted + remaining`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub total: Money,
    pub wallet_deducted: Money,
    pub remaining: Money,
}

impl FeeSplit {
    pub fn compute(total: Money, available_balance: Money) -> Self {
        let wallet_deducted = total.min(available_balance);
        Self {
            total,
            wallet_deducted,
            remaining: total.saturating_sub(wallet_deducted),
        }
    }

    pub fn without_wallet(total: Money) -> Self {
        Self::compute(total, Money::zero())
    }

    /// Nothing left to pay externally
    pub fn is_settled(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn is_consistent(&self) -> bool {
        self.wallet_deducted + self.remaining == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_covers_whole_fee() {
        let split = FeeSplit::compute(Money::from_major(500), Money::from_major(800));
        assert_eq!(split.wallet_deducted, Money::from_major(500));
        assert_eq!(split.remaining, Money::zero());
        assert!(split.is_settled());
        assert!(split.is_consistent());
    }

    #[test]
    fn test_shortfall_becomes_remaining() {
        let split = FeeSplit::compute(Money::from_major(500), Money::from_minor(12_050));
        assert_eq!(split.wallet_deducted, Money::from_minor(12_050));
        assert_eq!(split.remaining, Money::from_minor(37_950));
        assert!(!split.is_settled());
        assert!(split.is_consistent());
    }

    #[test]
    fn test_empty_wallet() {
        let split = FeeSplit::without_wallet(Money::from_major(100));
        assert_eq!(split.wallet_deducted, Money::zero());
        assert_eq!(split.remaining, Money::from_major(100));
    }

    #[test]
    fn test_split_is_consistent_across_balances() {
        let total = Money::from_minor(75_000);
        for balance in [0u64, 1, 999, 74_999, 75_000, 75_001, 1_000_000] {
            let available = Money::from_minor(balance);
            let split = FeeSplit::compute(total, available);
            assert!(split.is_consistent());
            assert!(split.wallet_deducted <= available);
            assert!(split.wallet_deducted <= total);
        }
    }

    #[test]
    fn test_zero_fee() {
        let split = FeeSplit::compute(Money::zero(), Money::from_major(10));
        assert!(split.wallet_deducted.is_zero());
        assert!(split.is_settled());
    }
}
