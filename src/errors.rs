use std::result::Result as StdResult;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Error type that captures ledger, scheduling, and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid payment schedule: {0}")]
    InvalidSchedule(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Payment schedule not found: {0}")]
    ScheduleNotFound(Uuid),
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },
    #[error("Balance overflow: {balance} + {amount} exceeds the representable range")]
    BalanceOverflow { balance: Decimal, amount: Decimal },
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = StdResult<T, LedgerError>;

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::StorageError(err.to_string())
    }
}
