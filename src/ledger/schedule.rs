use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::interval::Interval;
use crate::errors::{LedgerError, Result};

/// A recurring payment configured on an account.
///
/// `next_run` only ever moves forward, one interval step per firing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentSchedule {
    id: Uuid,
    amount: Decimal,
    description: String,
    interval: Interval,
    start_date: NaiveDate,
    next_run: NaiveDate,
    #[serde(default)]
    runs: u32,
    #[serde(default)]
    last_run: Option<NaiveDate>,
}

impl PaymentSchedule {
    /// Validates and creates a schedule whose first run is `start_date`.
    pub fn new(
        start_date: NaiveDate,
        interval: Interval,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Self> {
        let description = description.into().trim().to_string();
        let schedule = Self {
            id: Uuid::new_v4(),
            amount,
            description,
            interval,
            start_date,
            next_run: start_date,
            runs: 0,
            last_run: None,
        };
        schedule.validate()?;
        if interval.advance(start_date) <= start_date {
            return Err(LedgerError::InvalidSchedule(format!(
                "start date {} leaves no room for a following run",
                start_date
            )));
        }
        Ok(schedule)
    }

    /// Checks the configuration rules applied at creation time.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidSchedule(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.description.trim().is_empty() {
            return Err(LedgerError::InvalidSchedule(
                "description must not be empty".into(),
            ));
        }
        if !self.interval.is_supported() {
            return Err(LedgerError::InvalidSchedule(format!(
                "unsupported interval: every {} {:?}",
                self.interval.every, self.interval.unit
            )));
        }
        if self.next_run < self.start_date {
            return Err(LedgerError::InvalidSchedule(format!(
                "next run {} precedes start date {}",
                self.next_run, self.start_date
            )));
        }
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn next_run(&self) -> NaiveDate {
        self.next_run
    }

    /// Number of times this schedule has fired.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn last_run(&self) -> Option<NaiveDate> {
        self.last_run
    }

    /// A schedule is due when its next run is on or before `as_of`.
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.next_run <= as_of
    }

    /// Advances `next_run` by exactly one interval and returns the date that fired.
    ///
    /// Overdue schedules still move a single step; callers check `is_due` first.
    pub fn mark_fired(&mut self) -> NaiveDate {
        let fired = self.next_run;
        self.next_run = self.interval.advance(fired);
        self.runs = self.runs.saturating_add(1);
        self.last_run = Some(fired);
        fired
    }
}
