//! Fintrack is a personal finance tracker for recording income and expenses,
//! setting a monthly salary and budget, and summarising spending.
//!
//! This library provides the data-access core: SQLite backed stores for
//! transactions and user settings, live queries that re-emit after every
//! write, and a [TransactionService] façade that callers drive.

#![warn(missing_docs)]

mod app_state;
mod budget;
mod category;
mod config;
mod currency;
mod database_id;
mod db;
mod live;
mod logging;
mod service;
mod settings;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use budget::{BUDGET_ALERT_THRESHOLD, BudgetAlertNotifier, BudgetStatus, LogAlertNotifier};
pub use category::{CategoryTotal, SUGGESTED_CATEGORIES};
pub use config::Config;
pub use currency::format_currency;
pub use database_id::{DatabaseId, SETTINGS_ROW_ID, TransactionId};
pub use db::{Database, SCHEMA_VERSION, initialize as initialize_db};
pub use live::{Live, Table};
pub use logging::setup_logging;
pub use service::TransactionService;
pub use settings::{DEFAULT_CURRENCY, SettingsStore, UserSettings};
pub use timezone::get_local_offset;
pub use transaction::{Transaction, TransactionBuilder, TransactionStore, TransactionType};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction was given a title that is empty or only whitespace.
    #[error("transaction title cannot be empty")]
    EmptyTitle,

    /// A transaction was given a category that is empty or only whitespace.
    #[error("transaction category cannot be empty")]
    EmptyCategory,

    /// A transaction amount must be a finite number greater than zero.
    ///
    /// Amounts are magnitudes, whether money was spent or earned is recorded
    /// by the [TransactionType].
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// Salary and budget amounts must be finite and not negative.
    #[error("{0} is not a valid salary or budget amount, it must be zero or more")]
    NegativeSettingsAmount(f64),

    /// The currency code was empty or only whitespace.
    #[error("currency code cannot be empty")]
    EmptyCurrency,

    /// The currency code could not be used as a number format prefix.
    #[error("could not format amounts in the currency \"{0}\"")]
    InvalidCurrencyFormat(String),

    /// The text did not name a transaction type.
    #[error("\"{0}\" is not a transaction type, expected EXPENSE or INCOME")]
    InvalidTransactionType(String),

    /// The year and 1-based month do not describe a calendar month.
    #[error("{0}-{1} is not a valid year and month")]
    InvalidMonth(i32, u8),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The background task running a database operation panicked or was
    /// cancelled before it finished.
    #[error("the database worker failed: {0}")]
    WorkerFailed(String),

    /// The database has been closed and no longer accepts operations.
    #[error("the database has been closed")]
    StoreClosed,

    /// The database file was written by a newer version of the application.
    #[error("the database schema version {0} is newer than this application supports")]
    UnsupportedSchemaVersion(i64),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The log file could not be opened for writing.
    #[error("could not open the log file \"{0}\": {1}")]
    LogFileError(String, String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
