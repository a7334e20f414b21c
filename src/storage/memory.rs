use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    errors::{LedgerError, Result},
    ledger::Account,
};

use super::{due_rows, DueSet, LedgerStore};

/// In-process store keeping accounts in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts.into_iter().collect()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Account>>> {
        self.accounts
            .lock()
            .map_err(|_| LedgerError::StorageError("account store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStorage {
    fn find_due_schedules(&self, as_of: NaiveDate) -> Result<DueSet> {
        let accounts = self.lock()?;
        Ok(DueSet::from_rows(
            accounts
                .iter()
                .flat_map(|account| due_rows(account, as_of))
                .collect(),
        ))
    }

    fn load_account(&self, id: Uuid) -> Result<Account> {
        self.lock()?
            .iter()
            .find(|account| account.id == id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    fn commit_account(&self, account: &Account) -> Result<()> {
        let mut accounts = self.lock()?;
        match accounts.iter_mut().find(|existing| existing.id == account.id) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.lock()?.clone())
    }
}
