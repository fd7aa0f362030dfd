//! Daily batch logic for recurring deposits.
//!
//! One rule's failure is converted into a `failed` audit record and must not
//! abort the rest of the batch; only storage faults while loading rules or
//! writing audit records propagate, since those mean the run itself cannot
//! be trusted.

use chrono::{DateTime, Datelike, Utc};

use kidbank_shared::types::{ExecutionId, TransactionId};
use kidbank_shared::{DomainError, DomainResult};

use crate::domain::{ExecutionStatus, RecurringDeposit, RecurringDepositExecution, TransactionKind};
use crate::ledger::LedgerService;
use crate::storage::{RecurringDepositExecutionRepository, RecurringDepositRepository};

/// Description attached to every scheduled deposit transaction.
const DEPOSIT_DESCRIPTION: &str = "Monthly allowance";

/// Outcome of processing one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The deposit was posted.
    Success(TransactionId),
    /// The rule already ran this month.
    Skipped,
    /// The deposit attempt failed; the message is recorded in the audit
    /// trail.
    Failed(String),
}

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rules considered.
    pub processed: usize,
    /// Deposits posted.
    pub succeeded: usize,
    /// Rules skipped by the monthly guard.
    pub skipped: usize,
    /// Rules whose deposit failed.
    pub failed: usize,
}

/// Executes due recurring deposit rules.
pub struct RecurringDepositScheduler<'a> {
    rules: &'a dyn RecurringDepositRepository,
    executions: &'a dyn RecurringDepositExecutionRepository,
    ledger: LedgerService<'a>,
}

impl<'a> RecurringDepositScheduler<'a> {
    /// Creates a scheduler over the given repositories.
    pub fn new(
        rules: &'a dyn RecurringDepositRepository,
        executions: &'a dyn RecurringDepositExecutionRepository,
        ledger: LedgerService<'a>,
    ) -> Self {
        Self {
            rules,
            executions,
            ledger,
        }
    }

    /// Processes every active rule due on `now`'s day of month.
    ///
    /// # Errors
    ///
    /// Returns an error only on storage faults; per-rule deposit failures
    /// are recorded in the audit trail and counted in the summary.
    pub async fn process_day(&self, now: DateTime<Utc>) -> DomainResult<BatchSummary> {
        let day = u8::try_from(now.day())
            .map_err(|_| DomainError::Storage(format!("day of month out of range: {}", now.day())))?;
        let due = self.rules.active_for_day(day).await?;

        let mut summary = BatchSummary::default();
        for rule in due {
            summary.processed += 1;
            match self.run_rule(&rule, now).await? {
                RuleOutcome::Success(transaction_id) => {
                    summary.succeeded += 1;
                    tracing::info!(
                        rule_id = %rule.id,
                        account_id = %rule.account_id,
                        transaction_id = %transaction_id,
                        amount = rule.amount,
                        "recurring deposit posted"
                    );
                }
                RuleOutcome::Skipped => {
                    summary.skipped += 1;
                    tracing::debug!(rule_id = %rule.id, "recurring deposit already ran this month");
                }
                RuleOutcome::Failed(message) => {
                    summary.failed += 1;
                    tracing::warn!(
                        rule_id = %rule.id,
                        account_id = %rule.account_id,
                        error = %message,
                        "recurring deposit failed"
                    );
                }
            }
        }
        Ok(summary)
    }

    /// Runs one rule and appends its audit record. The returned error covers
    /// storage faults only; a failed deposit becomes [`RuleOutcome::Failed`].
    pub async fn run_rule(
        &self,
        rule: &RecurringDeposit,
        now: DateTime<Utc>,
    ) -> DomainResult<RuleOutcome> {
        if self
            .executions
            .has_success_in_month(rule.id, now.year(), now.month())
            .await?
        {
            self.record(rule, now, ExecutionStatus::Skipped, None, Some("Already executed this month"))
                .await?;
            return Ok(RuleOutcome::Skipped);
        }

        match self
            .ledger
            .post(
                rule.account_id,
                TransactionKind::Deposit,
                rule.amount,
                Some(DEPOSIT_DESCRIPTION.to_string()),
            )
            .await
        {
            Ok(transaction) => {
                self.record(rule, now, ExecutionStatus::Success, Some(transaction.id), None)
                    .await?;
                Ok(RuleOutcome::Success(transaction.id))
            }
            Err(err) => {
                let message = err.to_string();
                self.record(rule, now, ExecutionStatus::Failed, None, Some(&message))
                    .await?;
                Ok(RuleOutcome::Failed(message))
            }
        }
    }

    async fn record(
        &self,
        rule: &RecurringDeposit,
        now: DateTime<Utc>,
        status: ExecutionStatus,
        transaction_id: Option<TransactionId>,
        error_message: Option<&str>,
    ) -> DomainResult<()> {
        self.executions
            .insert(RecurringDepositExecution {
                id: ExecutionId::new(),
                recurring_deposit_id: rule.id,
                transaction_id,
                status,
                amount: rule.amount,
                day_of_month: rule.day_of_month,
                error_message: error_message.map(str::to_string),
                executed_at: now,
                created_at: Utc::now(),
            })
            .await?;
        Ok(())
    }
}
