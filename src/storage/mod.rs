pub mod json_backend;
pub mod memory;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    errors::{LedgerError, Result},
    ledger::Account,
};

/// One row of the due-set snapshot taken at the start of a scheduler pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueSchedule {
    pub account_id: Uuid,
    pub schedule_id: Uuid,
    /// Creation index of the schedule within its account.
    pub position: usize,
    pub next_run: NaiveDate,
}

/// An account the due-set query could not read. The scheduler reports it as a
/// failed account instead of dropping its schedules.
#[derive(Debug)]
pub struct UnreadableAccount {
    pub account_id: Uuid,
    pub error: LedgerError,
}

/// Snapshot returned by [`LedgerStore::find_due_schedules`].
#[derive(Debug, Default)]
pub struct DueSet {
    pub rows: Vec<DueSchedule>,
    pub unreadable: Vec<UnreadableAccount>,
}

impl DueSet {
    pub fn from_rows(rows: Vec<DueSchedule>) -> Self {
        Self {
            rows,
            unreadable: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.unreadable.is_empty()
    }
}

/// Persistence collaborator consumed by the scheduler.
///
/// `commit_account` must be all-or-nothing: either the whole account document
/// (transactions, balance, and schedules) is stored or the previous state remains.
pub trait LedgerStore: Send + Sync {
    fn find_due_schedules(&self, as_of: NaiveDate) -> Result<DueSet>;
    fn load_account(&self, id: Uuid) -> Result<Account>;
    fn commit_account(&self, account: &Account) -> Result<()>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
}

/// Collects the due rows of one account in creation order.
pub(crate) fn due_rows(
    account: &Account,
    as_of: NaiveDate,
) -> impl Iterator<Item = DueSchedule> + '_ {
    account
        .schedules()
        .iter()
        .enumerate()
        .filter(move |(_, schedule)| schedule.is_due(as_of))
        .map(move |(position, schedule)| DueSchedule {
            account_id: account.id,
            schedule_id: schedule.id(),
            position,
            next_run: schedule.next_run(),
        })
}

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;
