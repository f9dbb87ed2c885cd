//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and summing transactions
//! - The asynchronous [TransactionStore] with live queries

mod core;
mod query;
mod store;

pub use core::{Transaction, TransactionBuilder, TransactionType, create_transaction_table};
pub(crate) use core::to_unix_millis;
pub(crate) use query::get_transactions_between_dates;
pub use store::TransactionStore;

#[cfg(test)]
pub use core::{
    count_transactions, create_transaction, delete_all_transactions, delete_transaction,
    get_transaction, update_transaction,
};
#[cfg(test)]
pub use query::get_all_transactions;
