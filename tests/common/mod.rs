#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use allowance_core::{
    ledger::{Account, Interval},
    scheduler::SchedulerService,
    storage::{DueSchedule, DueSet, LedgerStore, MemoryStorage},
    time::FixedClock,
    LedgerError, Result,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Reference date used by the scheduler scenarios.
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 4, 5).expect("valid date")
}

pub fn days(offset: i64) -> NaiveDate {
    reference_date() + Duration::days(offset)
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2010, 4, 5, 6, 30, 0)
            .single()
            .expect("valid timestamp"),
    ))
}

/// Account owned by `owner` with a single weekly "Pocket Money" schedule.
pub fn weekly_account(owner: &str, amount: i64, start: NaiveDate) -> Account {
    let mut account = Account::new(owner, format!("{owner}'s account"));
    account
        .add_payment_schedule(start, Interval::weekly(), Decimal::from(amount), "Pocket Money")
        .expect("valid schedule");
    account
}

/// Five accounts starting two days before the reference date through two days after,
/// paying 1..=5 weekly.
pub fn five_weekly_accounts() -> Vec<Account> {
    ["one", "two", "three", "four", "five"]
        .iter()
        .zip(-2..=2)
        .enumerate()
        .map(|(idx, (owner, offset))| weekly_account(owner, idx as i64 + 1, days(offset)))
        .collect()
}

pub fn scheduler_for(store: Arc<dyn LedgerStore>) -> SchedulerService {
    SchedulerService::new(store, fixed_clock())
}

pub fn account_by_owner(store: &dyn LedgerStore, owner: &str) -> Account {
    store
        .list_accounts()
        .expect("list accounts")
        .into_iter()
        .find(|account| account.owner == owner)
        .expect("account present")
}

/// Store wrapper that injects persistence failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStorage,
    failing_commits: Mutex<HashSet<Uuid>>,
    fail_query: AtomicBool,
    extra_rows: Mutex<Vec<DueSchedule>>,
}

impl FlakyStore {
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            inner: MemoryStorage::with_accounts(accounts),
            ..Self::default()
        }
    }

    pub fn fail_commits_for(&self, account_id: Uuid) {
        self.failing_commits.lock().unwrap().insert(account_id);
    }

    pub fn heal(&self) {
        self.failing_commits.lock().unwrap().clear();
        self.fail_query.store(false, Ordering::SeqCst);
    }

    pub fn fail_queries(&self) {
        self.fail_query.store(true, Ordering::SeqCst);
    }

    /// Appends rows to every due-set snapshot, simulating a stale query result.
    pub fn inject_rows(&self, rows: Vec<DueSchedule>) {
        self.extra_rows.lock().unwrap().extend(rows);
    }
}

impl LedgerStore for FlakyStore {
    fn find_due_schedules(&self, as_of: NaiveDate) -> Result<DueSet> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(LedgerError::StorageError("due-set query unavailable".into()));
        }
        let mut due = self.inner.find_due_schedules(as_of)?;
        due.rows.extend(self.extra_rows.lock().unwrap().iter().copied());
        Ok(due)
    }

    fn load_account(&self, id: Uuid) -> Result<Account> {
        self.inner.load_account(id)
    }

    fn commit_account(&self, account: &Account) -> Result<()> {
        if self.failing_commits.lock().unwrap().contains(&account.id) {
            return Err(LedgerError::StorageError(format!(
                "commit refused for {}",
                account.id
            )));
        }
        self.inner.commit_account(account)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.inner.list_accounts()
    }
}
