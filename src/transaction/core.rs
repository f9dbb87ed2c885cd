//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was spent or earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money that was spent.
    Expense,
    /// Money that was earned.
    Income,
}

impl TransactionType {
    /// The text stored in the database for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "EXPENSE",
            TransactionType::Income => "INCOME",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EXPENSE" => Ok(TransactionType::Expense),
            "INCOME" => Ok(TransactionType::Income),
            _ => Err(Error::InvalidTransactionType(s.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short name for the transaction, e.g. "Lunch".
    pub title: String,
    /// The amount of money spent or earned, always greater than zero.
    pub amount: f64,
    /// The category of the transaction, e.g. "Food", "Transport", "Salary".
    pub category: String,
    /// Whether money was spent or earned.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// When the transaction happened, stored with millisecond precision.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Optional notes about the transaction.
    pub description: Option<String>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        title: &str,
        amount: f64,
        category: &str,
        transaction_type: TransactionType,
        date: OffsetDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            title: title.to_owned(),
            amount,
            category: category.to_owned(),
            transaction_type,
            date,
            description: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The builder holds every field except the ID, which the store assigns when
/// the transaction is inserted.
///
/// # Examples
///
/// ```
/// use fintrack::{Transaction, TransactionType};
/// use time::macros::datetime;
///
/// let builder = Transaction::build(
///         "Lunch",
///         12.50,
///         "Food",
///         TransactionType::Expense,
///         datetime!(2024-02-14 12:30 UTC),
///     )
///     .description("Noodles with the team");
///
/// assert!(builder.validate().is_ok());
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// A short, non-empty name for the transaction.
    pub title: String,

    /// The magnitude of the transaction, must be greater than zero.
    ///
    /// Unlike bank statements, expenses are not negative. The direction of the
    /// money is given by `transaction_type`.
    pub amount: f64,

    /// A non-empty category name.
    ///
    /// Usually one of [SUGGESTED_CATEGORIES](crate::SUGGESTED_CATEGORIES),
    /// but any name is accepted.
    pub category: String,

    /// Whether money was spent or earned.
    pub transaction_type: TransactionType,

    /// When the transaction happened.
    pub date: OffsetDateTime,

    /// Optional notes. A blank description is stored as `None`.
    pub description: Option<String>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Check the fields against the rules enforced by the store.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTitle] if the title is empty or whitespace,
    /// - [Error::InvalidAmount] if the amount is not a finite number greater than zero,
    /// - or [Error::EmptyCategory] if the category is empty or whitespace.
    pub fn validate(&self) -> Result<(), Error> {
        validate_fields(&self.title, self.amount, &self.category)
    }

    /// Attach `id` to produce the stored form of the transaction.
    #[cfg(test)]
    pub(crate) fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            title: self.title,
            amount: self.amount,
            category: self.category,
            transaction_type: self.transaction_type,
            date: self.date,
            description: self.description,
        }
    }
}

fn validate_fields(title: &str, amount: f64, category: &str) -> Result<(), Error> {
    if title.trim().is_empty() {
        return Err(Error::EmptyTitle);
    }

    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    if category.trim().is_empty() {
        return Err(Error::EmptyCategory);
    }

    Ok(())
}

/// Trim the description and drop it if nothing is left.
fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map(str::to_owned)
}

/// Convert `date` to the Unix timestamp in milliseconds used for storage.
pub(crate) fn to_unix_millis(date: OffsetDateTime) -> i64 {
    date.unix_timestamp_nanos().div_euclid(1_000_000) as i64
}

/// Convert a stored Unix timestamp in milliseconds back into a UTC date-time.
pub(crate) fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, title, amount, category, type, date, description";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - validation error if the builder fails [TransactionBuilder::validate],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate()?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (title, amount, category, type, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.title.trim(),
                builder.amount,
                builder.category.trim(),
                builder.transaction_type,
                to_unix_millis(builder.date),
                normalize_description(builder.description.as_deref()),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Replace every field of the stored transaction with the ID `transaction.id`.
///
/// # Errors
/// This function will return a:
/// - validation error if the fields are invalid,
/// - [Error::UpdateMissingTransaction] if no transaction has the ID,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(transaction: &Transaction, connection: &Connection) -> Result<(), Error> {
    validate_fields(
        &transaction.title,
        transaction.amount,
        &transaction.category,
    )?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET title = ?1, amount = ?2, category = ?3, type = ?4, date = ?5, description = ?6
         WHERE id = ?7",
        (
            transaction.title.trim(),
            transaction.amount,
            transaction.category.trim(),
            transaction.transaction_type,
            to_unix_millis(transaction.date),
            normalize_description(transaction.description.as_deref()),
            transaction.id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction by ID.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the transaction doesn't exist,
/// or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Delete every transaction and return how many were deleted.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_all_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM \"transaction\"", [])
        .map_err(|error| error.into())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('EXPENSE', 'INCOME')),
                date INTEGER NOT NULL,
                description TEXT
                )",
        (),
    )?;

    // Covers the date range queries and the per-type totals.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_type_date ON \"transaction\"(type, date);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;

    Ok(())
}

/// Map a database row selected with the transaction columns to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;
    let category = row.get(3)?;
    let transaction_type = row.get(4)?;
    let raw_date: i64 = row.get(5)?;
    let description = row.get(6)?;

    let date = from_unix_millis(raw_date).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Integer,
            Box::new(error),
        )
    })?;

    Ok(Transaction {
        id,
        title,
        amount,
        category,
        transaction_type,
        date,
        description,
    })
}

// ============================================================================
// TESTS
// ============================================================================



#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::{datetime, offset};

    use crate::{
        Error,
        db::initialize,
        transaction::{
            Transaction, TransactionType, count_transactions, create_transaction,
            delete_all_transactions, delete_transaction, get_transaction, update_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn lunch() -> crate::TransactionBuilder {
        Transaction::build(
            "Lunch",
            12.5,
            "Food",
            TransactionType::Expense,
            datetime!(2025-10-05 12:30 UTC),
        )
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let result = create_transaction(lunch().description("Curry"), &conn);

        match result {
            Ok(transaction) => {
                assert!(transaction.id > 0);
                assert_eq!(transaction.title, "Lunch");
                assert_eq!(transaction.amount, 12.5);
                assert_eq!(transaction.category, "Food");
                assert_eq!(transaction.transaction_type, TransactionType::Expense);
                assert_eq!(transaction.date, datetime!(2025-10-05 12:30 UTC));
                assert_eq!(transaction.description.as_deref(), Some("Curry"));
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_assigns_unique_ids() {
        let conn = get_test_connection();

        let first = create_transaction(lunch(), &conn).unwrap();
        let second = create_transaction(lunch(), &conn).unwrap();

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn create_does_not_reuse_deleted_ids() {
        let conn = get_test_connection();
        let first = create_transaction(lunch(), &conn).unwrap();
        delete_transaction(first.id, &conn).unwrap();

        let second = create_transaction(lunch(), &conn).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn create_fails_on_invalid_amount() {
        let conn = get_test_connection();
        let mut builder = lunch();
        builder.amount = -1.0;

        let result = create_transaction(builder, &conn);

        assert_eq!(result, Err(Error::InvalidAmount(-1.0)));
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn create_stores_blank_description_as_none() {
        let conn = get_test_connection();

        let transaction = create_transaction(lunch().description("   "), &conn).unwrap();

        assert_eq!(transaction.description, None);
    }

    #[test]
    fn date_keeps_instant_and_millisecond_precision() {
        let conn = get_test_connection();
        let mut builder = lunch();
        builder.date = datetime!(2024-02-29 23:59:59.999 +05:30);

        let transaction = create_transaction(builder, &conn).unwrap();

        assert_eq!(transaction.date, datetime!(2024-02-29 23:59:59.999 +05:30));
        assert_eq!(transaction.date.offset(), offset!(UTC));
    }

    #[test]
    fn get_succeeds() {
        let conn = get_test_connection();
        let inserted = create_transaction(lunch(), &conn).unwrap();

        let selected = get_transaction(inserted.id, &conn);

        assert_eq!(selected, Ok(inserted));
    }

    #[test]
    fn get_with_invalid_id_returns_not_found() {
        let conn = get_test_connection();
        let inserted = create_transaction(lunch(), &conn).unwrap();

        let selected = get_transaction(inserted.id + 123, &conn);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn update_replaces_fields() {
        let conn = get_test_connection();
        let mut transaction = create_transaction(lunch(), &conn).unwrap();
        transaction.title = "Salary".to_owned();
        transaction.amount = 1000.0;
        transaction.category = "Salary".to_owned();
        transaction.transaction_type = TransactionType::Income;
        transaction.description = Some("October".to_owned());

        update_transaction(&transaction, &conn).unwrap();

        assert_eq!(get_transaction(transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn update_missing_transaction_fails() {
        let conn = get_test_connection();
        let transaction = lunch().into_transaction(42);

        let result = update_transaction(&transaction, &conn);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn update_rejects_invalid_fields() {
        let conn = get_test_connection();
        let mut transaction = create_transaction(lunch(), &conn).unwrap();
        transaction.title = String::new();

        let result = update_transaction(&transaction, &conn);

        assert_eq!(result, Err(Error::EmptyTitle));
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let transaction = create_transaction(lunch(), &conn).unwrap();

        delete_transaction(transaction.id, &conn).unwrap();

        assert_eq!(get_transaction(transaction.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let conn = get_test_connection();

        let result = delete_transaction(1337, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn delete_all_returns_count() {
        let conn = get_test_connection();
        for _ in 0..3 {
            create_transaction(lunch(), &conn).unwrap();
        }

        assert_eq!(delete_all_transactions(&conn), Ok(3));
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let want_count = 20;
        for i in 1..=want_count {
            let mut builder = lunch();
            builder.amount = i as f64;
            create_transaction(builder, &conn).expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
