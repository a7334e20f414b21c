#![doc(test(attr(deny(warnings))))]

//! Allowance Core keeps per-account ledgers with recurring payment schedules and
//! runs the batch scheduler that posts whatever has fallen due.
//!
//! ```
//! use std::sync::Arc;
//!
//! use allowance_core::{
//!     ledger::{Account, Interval},
//!     scheduler::SchedulerService,
//!     storage::{LedgerStore, MemoryStorage},
//!     time::SystemClock,
//! };
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! let start = NaiveDate::from_ymd_opt(2010, 4, 5).unwrap();
//! let mut account = Account::new("leo", "Pocket money");
//! account
//!     .add_payment_schedule(start, Interval::weekly(), Decimal::from(2), "Pocket Money")
//!     .unwrap();
//!
//! let store = Arc::new(MemoryStorage::with_accounts([account]));
//! let scheduler = SchedulerService::new(store.clone(), Arc::new(SystemClock));
//! let report = scheduler.execute_updates(start).unwrap();
//! assert_eq!(report.posted.len(), 1);
//! assert_eq!(store.list_accounts().unwrap()[0].balance(), Decimal::from(2));
//! ```

pub mod config;
pub mod errors;
pub mod ledger;
pub mod scheduler;
pub mod storage;
pub mod time;
pub mod utils;

pub use errors::{LedgerError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Allowance Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
