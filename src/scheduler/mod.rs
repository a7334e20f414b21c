//! Batch process that fires due payment schedules.
//!
//! A pass takes a snapshot of every schedule due on the reference date, groups
//! the rows by account, and handles each account as one unit: load, post every
//! due schedule in creation order, commit. A failed load or commit leaves the
//! account untouched in storage, so its schedules stay due for the next pass.
//! Accounts the due-set query could not read are reported as failures too.
//!
//! Each schedule fires at most once per pass and advances a single interval,
//! even when it is several periods overdue.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::{LedgerError, Result},
    ledger::Account,
    storage::{DueSchedule, LedgerStore},
    time::Clock,
};

/// A schedule that fired and was committed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedPayment {
    pub account_id: Uuid,
    pub schedule_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: Decimal,
    /// The `next_run` the schedule had when it fired.
    pub fired_on: NaiveDate,
    pub next_run: NaiveDate,
}

/// An account whose unit of work was rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFailure {
    pub account_id: Uuid,
    pub schedules: usize,
    pub error: String,
}

/// Outcome of one `execute_updates` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerReport {
    pub as_of: NaiveDate,
    pub posted: Vec<PostedPayment>,
    pub failures: Vec<AccountFailure>,
    /// Snapshot rows that were no longer due once their account was loaded.
    pub skipped: usize,
    /// Set when cancellation stopped the pass before every account was visited.
    pub interrupted: bool,
}

impl SchedulerReport {
    fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            posted: Vec::new(),
            failures: Vec::new(),
            skipped: 0,
            interrupted: false,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    pub fn total_posted(&self) -> Decimal {
        self.posted.iter().map(|payment| payment.amount).sum()
    }
}

/// Finds due payment schedules and posts them to their accounts.
pub struct SchedulerService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    cancellation: CancellationToken,
}

impl SchedulerService {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cancellation: CancellationToken::new(),
        }
    }

    /// Lets a driver stop a pass between accounts.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Runs a pass using the clock's current date as the reference date.
    pub fn run_today(&self) -> Result<SchedulerReport> {
        self.execute_updates(self.clock.today())
    }

    /// Posts every schedule due on `as_of` and advances it by one interval.
    ///
    /// Only a failing due-set query aborts the pass; per-account failures are
    /// collected in the report.
    pub fn execute_updates(&self, as_of: NaiveDate) -> Result<SchedulerReport> {
        let due = self.store.find_due_schedules(as_of)?;
        let batches = group_by_account(due.rows);
        info!(
            %as_of,
            accounts = batches.len(),
            unreadable = due.unreadable.len(),
            "Starting scheduler pass"
        );

        let mut report = SchedulerReport::new(as_of);
        for unreadable in due.unreadable {
            warn!(
                account_id = %unreadable.account_id,
                error = %unreadable.error,
                "Scheduler: account could not be read"
            );
            report.failures.push(AccountFailure {
                account_id: unreadable.account_id,
                schedules: 0,
                error: unreadable.error.to_string(),
            });
        }
        for (account_id, rows) in batches {
            if self.cancellation.is_cancelled() {
                warn!(%as_of, "Scheduler pass cancelled before all accounts were processed");
                report.interrupted = true;
                break;
            }
            match self.process_account(account_id, &rows, as_of) {
                Ok(outcome) => {
                    report.skipped += outcome.skipped;
                    report.posted.extend(outcome.posted);
                }
                Err(err) => {
                    warn!(
                        account_id = %account_id,
                        schedules = rows.len(),
                        error = %err,
                        "Scheduler: account update rolled back"
                    );
                    report.failures.push(AccountFailure {
                        account_id,
                        schedules: rows.len(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            %as_of,
            posted = report.posted.len(),
            failed = report.failures.len(),
            skipped = report.skipped,
            "Scheduler pass finished"
        );
        Ok(report)
    }

    fn process_account(
        &self,
        account_id: Uuid,
        rows: &[DueSchedule],
        as_of: NaiveDate,
    ) -> Result<AccountOutcome> {
        let mut account = self.store.load_account(account_id)?;
        let recorded_at = self.clock.now();
        let mut outcome = AccountOutcome::default();

        for row in rows {
            match account.schedule(row.schedule_id) {
                Some(schedule) if schedule.is_due(as_of) => {}
                Some(schedule) => {
                    debug!(
                        account_id = %account_id,
                        schedule_id = %row.schedule_id,
                        next_run = %schedule.next_run(),
                        "Schedule no longer due, skipping"
                    );
                    outcome.skipped += 1;
                    continue;
                }
                None => {
                    debug!(
                        account_id = %account_id,
                        schedule_id = %row.schedule_id,
                        "Schedule vanished from account, skipping"
                    );
                    outcome.skipped += 1;
                    continue;
                }
            }
            let payment = post_schedule(&mut account, row.schedule_id, as_of, recorded_at)?;
            outcome.posted.push(payment);
        }

        if outcome.posted.is_empty() {
            return Ok(outcome);
        }
        self.store.commit_account(&account)?;
        for payment in &outcome.posted {
            info!(
                account_id = %payment.account_id,
                schedule_id = %payment.schedule_id,
                amount = %payment.amount,
                next_run = %payment.next_run,
                "Scheduler: posted payment"
            );
        }
        Ok(outcome)
    }
}

#[derive(Default)]
struct AccountOutcome {
    posted: Vec<PostedPayment>,
    skipped: usize,
}

fn post_schedule(
    account: &mut Account,
    schedule_id: Uuid,
    as_of: NaiveDate,
    recorded_at: DateTime<Utc>,
) -> Result<PostedPayment> {
    let account_id = account.id;
    let fired_on = account
        .schedule(schedule_id)
        .map(|schedule| schedule.next_run())
        .ok_or(LedgerError::ScheduleNotFound(schedule_id))?;
    let (transaction_id, amount) = {
        let txn = account.post(schedule_id, as_of, recorded_at)?;
        (txn.id(), txn.amount())
    };
    let next_run = account
        .schedule(schedule_id)
        .map(|schedule| schedule.next_run())
        .ok_or(LedgerError::ScheduleNotFound(schedule_id))?;
    Ok(PostedPayment {
        account_id,
        schedule_id,
        transaction_id,
        amount,
        fired_on,
        next_run,
    })
}

/// Groups rows by account in first-seen order, each group sorted by schedule
/// creation order. Duplicate rows for the same schedule collapse to one.
fn group_by_account(rows: Vec<DueSchedule>) -> Vec<(Uuid, Vec<DueSchedule>)> {
    let mut batches: Vec<(Uuid, Vec<DueSchedule>)> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for row in rows {
        match index.get(&row.account_id) {
            Some(&slot) => batches[slot].1.push(row),
            None => {
                index.insert(row.account_id, batches.len());
                batches.push((row.account_id, vec![row]));
            }
        }
    }
    for (_, group) in &mut batches {
        group.sort_by_key(|row| row.position);
        group.dedup_by_key(|row| row.schedule_id);
    }
    batches
}
