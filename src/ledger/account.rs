use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{interval::Interval, schedule::PaymentSchedule, transaction::Transaction};
use crate::errors::{LedgerError, Result};

/// An account owning its payment schedules and an append-only transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    balance: Decimal,
    #[serde(default)]
    schedules: Vec<PaymentSchedule>,
    #[serde(default)]
    transactions: Vec<Transaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with a zero balance.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            balance: Decimal::ZERO,
            schedules: Vec::new(),
            transactions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Schedules in creation order.
    pub fn schedules(&self) -> &[PaymentSchedule] {
        &self.schedules
    }

    /// Transactions in the order they were appended.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn schedule(&self, id: Uuid) -> Option<&PaymentSchedule> {
        self.schedules.iter().find(|schedule| schedule.id() == id)
    }

    /// Configures a recurring payment that first fires on `start_date`.
    pub fn add_payment_schedule(
        &mut self,
        start_date: NaiveDate,
        interval: Interval,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Uuid> {
        let schedule = PaymentSchedule::new(start_date, interval, amount, description)?;
        let id = schedule.id();
        self.schedules.push(schedule);
        self.touch();
        Ok(id)
    }

    /// Schedules due on `as_of`, in creation order.
    pub fn due_schedules(&self, as_of: NaiveDate) -> impl Iterator<Item = &PaymentSchedule> {
        self.schedules
            .iter()
            .filter(move |schedule| schedule.is_due(as_of))
    }

    /// Records a manual deposit (positive) or withdrawal (negative).
    pub fn record(
        &mut self,
        amount: Decimal,
        description: Option<String>,
        date: NaiveDate,
        recorded_at: DateTime<Utc>,
    ) -> Result<&Transaction> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidInput(
                "transaction amount must not be zero".into(),
            ));
        }
        let balance = self.credited(amount)?;
        if balance < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: -amount,
            });
        }
        Ok(self.append(Transaction::new(amount, description, date, recorded_at), balance))
    }

    /// Fires a due schedule: appends its transaction, credits the balance, and
    /// advances the schedule by one interval.
    ///
    /// The transaction and the schedule change form one unit; callers persist the
    /// whole account or discard it.
    pub fn post(
        &mut self,
        schedule_id: Uuid,
        as_of: NaiveDate,
        recorded_at: DateTime<Utc>,
    ) -> Result<&Transaction> {
        let index = self
            .schedules
            .iter()
            .position(|schedule| schedule.id() == schedule_id)
            .ok_or(LedgerError::ScheduleNotFound(schedule_id))?;
        let schedule = &self.schedules[index];
        debug_assert!(
            schedule.is_due(as_of),
            "schedule {} posted before it was due ({} > {})",
            schedule_id,
            schedule.next_run(),
            as_of
        );
        let txn = Transaction::from_schedule(schedule, as_of, recorded_at);
        let balance = self.credited(txn.amount())?;
        self.schedules[index].mark_fired();
        Ok(self.append(txn, balance))
    }

    /// Re-checks schedule configuration and that the balance matches the log.
    pub fn validate(&self) -> Result<()> {
        for schedule in &self.schedules {
            schedule.validate()?;
        }
        let total = self
            .transactions
            .iter()
            .try_fold(Decimal::ZERO, |total, txn| {
                total
                    .checked_add(txn.amount())
                    .ok_or(LedgerError::BalanceOverflow {
                        balance: total,
                        amount: txn.amount(),
                    })
            })?;
        if total != self.balance {
            return Err(LedgerError::InvalidInput(format!(
                "account {} balance {} does not match transaction total {}",
                self.id, self.balance, total
            )));
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Balance after applying `amount`, without touching the account.
    fn credited(&self, amount: Decimal) -> Result<Decimal> {
        self.balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.balance,
                amount,
            })
    }

    fn append(&mut self, txn: Transaction, balance: Decimal) -> &Transaction {
        self.balance = balance;
        self.transactions.push(txn);
        self.touch();
        &self.transactions[self.transactions.len() - 1]
    }
}
