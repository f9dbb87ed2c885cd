//! Category suggestions and per-category expense totals.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    transaction::{TransactionType, to_unix_millis},
};

/// Category names offered when entering a transaction.
///
/// The store accepts any non-empty category, these are only suggestions.
pub const SUGGESTED_CATEGORIES: [&str; 10] = [
    "Food",
    "Transport",
    "Bills",
    "Entertainment",
    "Shopping",
    "Health",
    "Education",
    "Salary",
    "Investment",
    "Other",
];

/// The amount spent in a category over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of expense amounts in the category.
    pub total: f64,
}

/// Sum the expenses dated between `start` and `end` (inclusive) per category.
///
/// Every category with at least one expense in range is returned, the largest
/// total first. Categories with equal totals are ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_top_expense_categories(
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT category, SUM(amount) AS total FROM \"transaction\" \
            WHERE type = ?1 AND date BETWEEN ?2 AND ?3 \
            GROUP BY category \
            ORDER BY total DESC, category ASC",
        )?
        .query_map(
            (
                TransactionType::Expense,
                to_unix_millis(start),
                to_unix_millis(end),
            ),
            |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )?
        .collect::<Result<Vec<CategoryTotal>, rusqlite::Error>>()
        .map_err(|error| error.into())
}
