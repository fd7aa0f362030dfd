//! Pure balance arithmetic and amount validation.

use kidbank_shared::{DomainError, DomainResult};

use crate::domain::TransactionKind;

/// Signed effect of a transaction on the balance. Deposits and rewards are
/// positive, withdrawals negative.
#[must_use]
pub const fn signed_amount(kind: TransactionKind, amount: i64) -> i64 {
    match kind {
        TransactionKind::Deposit | TransactionKind::Reward => amount,
        TransactionKind::Withdraw => -amount,
    }
}

/// Validates that a transaction amount is strictly positive.
///
/// # Errors
///
/// Returns `InvalidAmount` if `amount <= 0`.
pub fn ensure_positive(amount: i64) -> DomainResult<()> {
    if amount > 0 {
        Ok(())
    } else {
        Err(DomainError::InvalidAmount {
            amount,
            reason: "Amount must be positive".to_string(),
        })
    }
}

/// Validates that `amount` can be withdrawn from `balance`.
///
/// # Errors
///
/// Returns `InvalidAmount` naming the current balance and the requested
/// amount if the withdrawal would overdraw the account.
pub fn ensure_withdrawable(balance: i64, amount: i64) -> DomainResult<()> {
    if amount <= balance {
        Ok(())
    } else {
        Err(DomainError::InvalidAmount {
            amount,
            reason: format!("Insufficient balance. Current: {balance}, Required: {amount}"),
        })
    }
}
