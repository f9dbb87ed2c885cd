//! The asynchronous, observable transaction store.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    category::{CategoryTotal, get_top_expense_categories},
    database_id::TransactionId,
    db::Database,
    live::{Live, Table},
};

use super::{
    core::{
        Transaction, TransactionBuilder, TransactionType, create_transaction,
        delete_all_transactions, delete_transaction, get_transaction, update_transaction,
    },
    query::{
        get_all_transactions, get_total_expenses_between_dates, get_total_income_between_dates,
        get_transactions_between_dates, get_transactions_by_type,
    },
};

/// Stores transactions in the application database.
///
/// Reads that return a [Live] keep refreshing after every write to the
/// transaction table. Writes run on a background worker and resolve once the
/// write has been committed; callers that don't need the result can
/// `tokio::spawn` them since the store is cheap to clone.
#[derive(Debug, Clone)]
pub struct TransactionStore {
    database: Database,
}

impl TransactionStore {
    /// Create a new store for `database`.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Subscribe to every transaction, newest first.
    ///
    /// # Errors
    /// Returns an error if the first query fails or the database is closed.
    pub async fn get_all_transactions(&self) -> Result<Live<Vec<Transaction>>, Error> {
        self.observe(get_all_transactions).await
    }

    /// Subscribe to the transactions of one type, newest first.
    ///
    /// # Errors
    /// Returns an error if the first query fails or the database is closed.
    pub async fn get_transactions_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Live<Vec<Transaction>>, Error> {
        self.observe(move |connection| get_transactions_by_type(transaction_type, connection))
            .await
    }

    /// Subscribe to the transactions dated between `start` and `end` (inclusive), newest first.
    ///
    /// # Errors
    /// Returns an error if the first query fails or the database is closed.
    pub async fn get_transactions_between_dates(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Live<Vec<Transaction>>, Error> {
        self.observe(move |connection| get_transactions_between_dates(start, end, connection))
            .await
    }

    /// Subscribe to the expense totals per category between `start` and `end` (inclusive).
    ///
    /// # Errors
    /// Returns an error if the first query fails or the database is closed.
    pub async fn get_top_expense_categories(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Live<Vec<CategoryTotal>>, Error> {
        self.observe(move |connection| get_top_expense_categories(start, end, connection))
            .await
    }

    /// Retrieve a single transaction.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not refer to a transaction.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.database
            .read(move |connection| get_transaction(id, connection))
            .await
    }

    /// Validate and insert a new transaction, returning it with its new ID.
    ///
    /// # Errors
    /// Returns a validation error for invalid fields, or a storage error if
    /// the insert fails.
    pub async fn insert_transaction(
        &self,
        builder: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        let transaction = self
            .database
            .write(Table::Transactions, move |connection| {
                create_transaction(builder, connection)
            })
            .await?;

        tracing::debug!("inserted transaction {}", transaction.id);

        Ok(transaction)
    }

    /// Replace the stored transaction that has the ID `transaction.id`.
    ///
    /// # Errors
    /// Returns [Error::UpdateMissingTransaction] if there is no such
    /// transaction, or a validation error for invalid fields.
    pub async fn update_transaction(&self, transaction: Transaction) -> Result<(), Error> {
        let id = transaction.id;

        self.database
            .write(Table::Transactions, move |connection| {
                update_transaction(&transaction, connection)
            })
            .await?;

        tracing::debug!("updated transaction {id}");

        Ok(())
    }

    /// Delete the transaction with the ID `id`.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingTransaction] if there is no such transaction.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        self.database
            .write(Table::Transactions, move |connection| {
                delete_transaction(id, connection)
            })
            .await?;

        tracing::debug!("deleted transaction {id}");

        Ok(())
    }

    /// Delete every transaction, returning how many were deleted.
    pub async fn delete_all_transactions(&self) -> Result<usize, Error> {
        let deleted = self
            .database
            .write(Table::Transactions, delete_all_transactions)
            .await?;

        tracing::debug!("deleted all {deleted} transactions");

        Ok(deleted)
    }

    /// Sum the income between `start` and `end` (inclusive), `0.0` if there is none.
    pub async fn get_total_income_between_dates(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<f64, Error> {
        self.database
            .read(move |connection| get_total_income_between_dates(start, end, connection))
            .await
    }

    /// Sum the expenses between `start` and `end` (inclusive), `0.0` if there are none.
    pub async fn get_total_expenses_between_dates(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<f64, Error> {
        self.database
            .read(move |connection| get_total_expenses_between_dates(start, end, connection))
            .await
    }

    /// Subscribe to an arbitrary query over the transaction table.
    pub(crate) async fn observe<T, F>(&self, query: F) -> Result<Live<T>, Error>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Connection) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.database.observe(Table::Transactions, query).await
    }
}
