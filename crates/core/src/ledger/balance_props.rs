//! Property-based tests for balance arithmetic.

use proptest::prelude::*;

use crate::domain::TransactionKind;
use crate::ledger::balance::{ensure_withdrawable, signed_amount};

fn any_kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::Deposit),
        Just(TransactionKind::Withdraw),
        Just(TransactionKind::Reward),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The signed effect preserves the magnitude of the amount.
    #[test]
    fn prop_signed_amount_preserves_magnitude(
        kind in any_kind(),
        amount in 1i64..1_000_000_000,
    ) {
        prop_assert_eq!(signed_amount(kind, amount).abs(), amount);
    }

    /// Only withdrawals are negative.
    #[test]
    fn prop_only_withdraw_is_negative(
        kind in any_kind(),
        amount in 1i64..1_000_000_000,
    ) {
        let signed = signed_amount(kind, amount);
        match kind {
            TransactionKind::Withdraw => prop_assert!(signed < 0),
            TransactionKind::Deposit | TransactionKind::Reward => prop_assert!(signed > 0),
        }
    }

    /// A withdrawal passes validation exactly when it fits in the balance.
    #[test]
    fn prop_withdrawable_iff_amount_fits(
        balance in 0i64..1_000_000_000,
        amount in 1i64..1_000_000_000,
    ) {
        prop_assert_eq!(ensure_withdrawable(balance, amount).is_ok(), amount <= balance);
    }

    /// Applying only validated operations never drives a balance negative,
    /// and the final balance equals the signed sum of the applied amounts.
    #[test]
    fn prop_validated_sequence_keeps_balance_consistent(
        ops in prop::collection::vec((any_kind(), 1i64..10_000), 0..50),
    ) {
        let mut balance = 0i64;
        let mut applied_sum = 0i64;
        for (kind, amount) in ops {
            if kind == TransactionKind::Withdraw && ensure_withdrawable(balance, amount).is_err() {
                // Rejected operations must leave the balance untouched.
                continue;
            }
            let delta = signed_amount(kind, amount);
            balance += delta;
            applied_sum += delta;
            prop_assert!(balance >= 0);
        }
        prop_assert_eq!(balance, applied_sum);
    }
}
