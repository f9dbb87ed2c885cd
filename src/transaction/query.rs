//! Read queries over the transaction table.
//!
//! Lists are ordered newest first: by date descending, then by ID descending
//! so that transactions on the same instant keep the order they were added in.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::Error;

use super::core::{
    TRANSACTION_COLUMNS, Transaction, TransactionType, map_transaction_row, to_unix_millis,
};

/// Get every transaction.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" ORDER BY date DESC, id DESC"
        ))?
        .query_map([], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get the transactions of a single type.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transactions_by_type(
    transaction_type: TransactionType,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE type = ?1 \
            ORDER BY date DESC, id DESC"
        ))?
        .query_map([transaction_type], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get the transactions dated between `start` and `end`, inclusive.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transactions_between_dates(
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE date BETWEEN ?1 AND ?2 \
            ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            [to_unix_millis(start), to_unix_millis(end)],
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Sum the amounts of `transaction_type` transactions dated between `start`
/// and `end`, inclusive. Returns `0.0` when no transactions match.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_total_between_dates(
    transaction_type: TransactionType,
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" \
            WHERE type = ?1 AND date BETWEEN ?2 AND ?3",
            (transaction_type, to_unix_millis(start), to_unix_millis(end)),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Sum the income dated between `start` and `end`, inclusive.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_total_income_between_dates(
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<f64, Error> {
    get_total_between_dates(TransactionType::Income, start, end, connection)
}

/// Sum the expenses dated between `start` and `end`, inclusive.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_total_expenses_between_dates(
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<f64, Error> {
    get_total_between_dates(TransactionType::Expense, start, end, connection)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{
        Duration,
        macros::{datetime, offset},
    };

    use crate::{
        db::initialize,
        transaction::{Transaction, TransactionType, create_transaction, delete_transaction},
    };

    use super::{
        get_all_transactions, get_total_expenses_between_dates, get_total_income_between_dates,
        get_transactions_between_dates, get_transactions_by_type,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert(
        title: &str,
        amount: f64,
        transaction_type: TransactionType,
        date: time::OffsetDateTime,
        conn: &Connection,
    ) -> Transaction {
        create_transaction(
            Transaction::build(title, amount, "Food", transaction_type, date),
            conn,
        )
        .expect("Could not create transaction")
    }

    #[test]
    fn get_all_contains_inserted_transaction() {
        let conn = get_test_connection();
        let want = insert(
            "Lunch",
            12.5,
            TransactionType::Expense,
            datetime!(2025-10-05 12:00 UTC),
            &conn,
        );

        let got = get_all_transactions(&conn).unwrap();

        assert_eq!(got, vec![want]);
    }

    #[test]
    fn get_all_orders_newest_first() {
        let conn = get_test_connection();
        let day = datetime!(2025-10-05 12:00 UTC);
        let older = insert(
            "Older",
            1.0,
            TransactionType::Expense,
            day - Duration::days(1),
            &conn,
        );
        let first_today = insert("First", 2.0, TransactionType::Expense, day, &conn);
        let second_today = insert("Second", 3.0, TransactionType::Income, day, &conn);

        let got = get_all_transactions(&conn).unwrap();

        assert_eq!(got, vec![second_today, first_today, older]);
    }

    #[test]
    fn get_all_excludes_deleted_transaction() {
        let conn = get_test_connection();
        let date = datetime!(2025-10-05 12:00 UTC);
        let kept = insert("Kept", 1.0, TransactionType::Expense, date, &conn);
        let deleted = insert("Deleted", 2.0, TransactionType::Expense, date, &conn);

        delete_transaction(deleted.id, &conn).unwrap();

        let got = get_all_transactions(&conn).unwrap();
        assert_eq!(got, vec![kept]);
    }

    #[test]
    fn get_by_type_filters() {
        let conn = get_test_connection();
        let date = datetime!(2025-10-05 12:00 UTC);
        let income = insert("Salary", 1000.0, TransactionType::Income, date, &conn);
        insert("Lunch", 12.5, TransactionType::Expense, date, &conn);

        let got = get_transactions_by_type(TransactionType::Income, &conn).unwrap();

        assert_eq!(got, vec![income]);
    }

    #[test]
    fn get_between_dates_is_inclusive() {
        let conn = get_test_connection();
        let start = datetime!(2025-02-01 00:00 UTC);
        let end = datetime!(2025-02-28 23:59:59.999 UTC);
        insert(
            "Before",
            1.0,
            TransactionType::Expense,
            start - Duration::milliseconds(1),
            &conn,
        );
        let on_start = insert("Start", 2.0, TransactionType::Expense, start, &conn);
        let on_end = insert("End", 3.0, TransactionType::Income, end, &conn);
        insert(
            "After",
            4.0,
            TransactionType::Expense,
            end + Duration::milliseconds(1),
            &conn,
        );

        let got = get_transactions_between_dates(start, end, &conn).unwrap();

        assert_eq!(got, vec![on_end, on_start]);
    }

    #[test]
    fn get_between_dates_compares_instants_across_offsets() {
        let conn = get_test_connection();
        // 2025-03-01 02:00 in Colombo is still February in UTC.
        let colombo_morning = datetime!(2025-03-01 02:00 +05:30);
        let transaction = insert(
            "Late snack",
            4.0,
            TransactionType::Expense,
            colombo_morning,
            &conn,
        );

        let got = get_transactions_between_dates(
            datetime!(2025-02-01 00:00 UTC),
            datetime!(2025-02-28 23:59:59.999 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(got, vec![transaction]);
        assert_eq!(got[0].date.to_offset(offset!(+05:30)), colombo_morning);
    }

    #[test]
    fn total_expenses_for_single_day() {
        let conn = get_test_connection();
        let date = datetime!(2025-10-05 00:00 UTC);
        insert("Lunch", 12.5, TransactionType::Expense, date, &conn);

        let total = get_total_expenses_between_dates(date, date, &conn).unwrap();

        assert_eq!(total, 12.5);
    }

    #[test]
    fn totals_sum_by_type_within_range() {
        let conn = get_test_connection();
        let start = datetime!(2025-10-01 00:00 UTC);
        let end = datetime!(2025-10-31 23:59:59.999 UTC);
        insert("Lunch", 12.5, TransactionType::Expense, start, &conn);
        insert("Dinner", 20.0, TransactionType::Expense, end, &conn);
        insert(
            "Salary",
            1000.0,
            TransactionType::Income,
            start + Duration::days(3),
            &conn,
        );
        insert(
            "Old lunch",
            99.0,
            TransactionType::Expense,
            start - Duration::days(1),
            &conn,
        );

        assert_eq!(get_total_expenses_between_dates(start, end, &conn), Ok(32.5));
        assert_eq!(get_total_income_between_dates(start, end, &conn), Ok(1000.0));
    }

    #[test]
    fn totals_are_zero_for_empty_range() {
        let conn = get_test_connection();
        let start = datetime!(2025-10-01 00:00 UTC);
        let end = datetime!(2025-10-31 23:59:59.999 UTC);

        assert_eq!(get_total_expenses_between_dates(start, end, &conn), Ok(0.0));
        assert_eq!(get_total_income_between_dates(start, end, &conn), Ok(0.0));
    }

    #[test]
    fn get_between_dates_keeps_pre_epoch_instant_in_its_day() {
        let conn = get_test_connection();
        let last_instant_of_1969 = datetime!(1969-12-31 23:59:59.9995 UTC);
        let transaction = insert(
            "New Year's Eve",
            8.0,
            TransactionType::Expense,
            last_instant_of_1969,
            &conn,
        );

        let new_years_eve = get_transactions_between_dates(
            datetime!(1969-12-31 00:00 UTC),
            datetime!(1969-12-31 23:59:59.999 UTC),
            &conn,
        )
        .unwrap();
        let new_years_day = get_transactions_between_dates(
            datetime!(1970-01-01 00:00 UTC),
            datetime!(1970-01-01 23:59:59.999 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(new_years_eve.len(), 1);
        assert_eq!(new_years_eve[0].id, transaction.id);
        assert!(new_years_day.is_empty());
    }
}
