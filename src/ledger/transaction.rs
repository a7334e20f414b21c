use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schedule::PaymentSchedule;

/// Immutable entry in an account's transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    id: Uuid,
    amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    date: NaiveDate,
    recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schedule_id: Option<Uuid>,
}

impl Transaction {
    pub fn new(
        amount: Decimal,
        description: Option<String>,
        date: NaiveDate,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            description: description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            date,
            recorded_at,
            schedule_id: None,
        }
    }

    /// Builds the posting produced when `schedule` fires on `date`.
    pub fn from_schedule(
        schedule: &PaymentSchedule,
        date: NaiveDate,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        let mut txn = Self::new(
            schedule.amount(),
            Some(schedule.description().to_string()),
            date,
            recorded_at,
        );
        txn.schedule_id = Some(schedule.id());
        txn
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Business date of the entry.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// The schedule that produced this entry, if it was posted by the scheduler.
    pub fn schedule_id(&self) -> Option<Uuid> {
        self.schedule_id
    }
}
