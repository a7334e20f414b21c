//! Ledger domain models: accounts, their payment schedules, and posted transactions.

pub mod account;
pub mod interval;
pub mod schedule;
pub mod transaction;

pub use account::Account;
pub use interval::{Interval, TimeUnit};
pub use schedule::PaymentSchedule;
pub use transaction::Transaction;
