//! The transaction service, the single entry point callers use to reach the stores.

use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    budget::{BudgetAlertNotifier, BudgetStatus},
    category::CategoryTotal,
    database_id::TransactionId,
    db::Database,
    live::Live,
    settings::{SettingsStore, UserSettings},
    transaction::{
        Transaction, TransactionBuilder, TransactionStore, TransactionType,
        get_transactions_between_dates,
    },
};

/// Combines the transaction and settings stores, and answers questions about
/// calendar months in the user's local time.
#[derive(Debug, Clone)]
pub struct TransactionService {
    transactions: TransactionStore,
    settings: SettingsStore,
    local_offset: UtcOffset,
}

impl TransactionService {
    /// Create a service over `database` where months start at midnight in `local_offset`.
    pub fn new(database: Database, local_offset: UtcOffset) -> Self {
        Self {
            transactions: TransactionStore::new(database.clone()),
            settings: SettingsStore::new(database),
            local_offset,
        }
    }

    /// The UTC offset used to find the start and end of a month.
    pub fn local_offset(&self) -> UtcOffset {
        self.local_offset
    }

    /// See [TransactionStore::get_all_transactions].
    pub async fn get_all_transactions(&self) -> Result<Live<Vec<Transaction>>, Error> {
        self.transactions.get_all_transactions().await
    }

    /// See [TransactionStore::get_transactions_by_type].
    pub async fn get_transactions_by_type(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Live<Vec<Transaction>>, Error> {
        self.transactions
            .get_transactions_by_type(transaction_type)
            .await
    }

    /// See [TransactionStore::get_transactions_between_dates].
    pub async fn get_transactions_between_dates(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Live<Vec<Transaction>>, Error> {
        self.transactions
            .get_transactions_between_dates(start, end)
            .await
    }

    /// See [TransactionStore::get_top_expense_categories].
    pub async fn get_top_expense_categories(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Live<Vec<CategoryTotal>>, Error> {
        self.transactions
            .get_top_expense_categories(start, end)
            .await
    }

    /// See [TransactionStore::get_transaction].
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.transactions.get_transaction(id).await
    }

    /// See [TransactionStore::insert_transaction].
    pub async fn insert_transaction(
        &self,
        builder: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        self.transactions.insert_transaction(builder).await
    }

    /// See [TransactionStore::update_transaction].
    pub async fn update_transaction(&self, transaction: Transaction) -> Result<(), Error> {
        self.transactions.update_transaction(transaction).await
    }

    /// See [TransactionStore::delete_transaction].
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        self.transactions.delete_transaction(id).await
    }

    /// See [TransactionStore::delete_all_transactions].
    pub async fn delete_all_transactions(&self) -> Result<usize, Error> {
        self.transactions.delete_all_transactions().await
    }

    /// See [TransactionStore::get_total_income_between_dates].
    pub async fn get_total_income_between_dates(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<f64, Error> {
        self.transactions
            .get_total_income_between_dates(start, end)
            .await
    }

    /// See [TransactionStore::get_total_expenses_between_dates].
    pub async fn get_total_expenses_between_dates(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<f64, Error> {
        self.transactions
            .get_total_expenses_between_dates(start, end)
            .await
    }

    /// See [SettingsStore::get_user_settings].
    pub async fn get_user_settings(&self) -> Result<Live<Option<UserSettings>>, Error> {
        self.settings.get_user_settings().await
    }

    /// See [SettingsStore::get_user_settings_once].
    pub async fn get_user_settings_once(&self) -> Result<Option<UserSettings>, Error> {
        self.settings.get_user_settings_once().await
    }

    /// See [SettingsStore::save_user_settings].
    pub async fn save_user_settings(&self, settings: UserSettings) -> Result<(), Error> {
        self.settings.save_user_settings(settings).await
    }

    /// See [SettingsStore::update_monthly_salary].
    pub async fn update_monthly_salary(&self, salary: f64) -> Result<(), Error> {
        self.settings.update_monthly_salary(salary).await
    }

    /// See [SettingsStore::update_monthly_budget].
    pub async fn update_monthly_budget(&self, budget: f64) -> Result<(), Error> {
        self.settings.update_monthly_budget(budget).await
    }

    /// See [SettingsStore::update_currency].
    pub async fn update_currency(&self, currency: &str) -> Result<(), Error> {
        self.settings.update_currency(currency).await
    }

    /// See [SettingsStore::update_budget_alerts_enabled].
    pub async fn update_budget_alerts_enabled(&self, enabled: bool) -> Result<(), Error> {
        self.settings.update_budget_alerts_enabled(enabled).await
    }

    /// Get the first and last millisecond of a calendar month in the local offset.
    ///
    /// `month` counts from 1 for January.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `year` and `month` do not name a month
    /// that can be represented.
    pub fn month_range(
        &self,
        year: i32,
        month: u8,
    ) -> Result<(OffsetDateTime, OffsetDateTime), Error> {
        let invalid_month = || Error::InvalidMonth(year, month);

        let calendar_month = Month::try_from(month).map_err(|_| invalid_month())?;
        let first_day =
            Date::from_calendar_date(year, calendar_month, 1).map_err(|_| invalid_month())?;

        let last_day = Date::from_calendar_date(year, calendar_month, calendar_month.length(year))
            .and_then(|date| date.with_hms_milli(23, 59, 59, 999))
            .map_err(|_| invalid_month())?;

        let start = first_day.midnight().assume_offset(self.local_offset);
        let end = last_day.assume_offset(self.local_offset);

        Ok((start, end))
    }

    /// Subscribe to the expenses of a calendar month, newest first.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] for an invalid month, or the error of the
    /// first query.
    pub async fn get_monthly_expenses(
        &self,
        year: i32,
        month: u8,
    ) -> Result<Live<Vec<Transaction>>, Error> {
        let (start, end) = self.month_range(year, month)?;

        self.transactions
            .observe(move |connection| {
                let expenses = get_transactions_between_dates(start, end, connection)?
                    .into_iter()
                    .filter(|transaction| transaction.transaction_type == TransactionType::Expense)
                    .collect();

                Ok(expenses)
            })
            .await
    }

    /// Summarise a month's spending against the user's salary and budget.
    ///
    /// The default settings are used if none have been saved.
    pub async fn get_budget_status(&self, year: i32, month: u8) -> Result<BudgetStatus, Error> {
        let (_, status) = self.settings_and_status(year, month).await?;

        Ok(status)
    }

    /// Tell `notifier` if budget alerts are enabled and the month's spending
    /// has reached the alert threshold. Returns whether `notifier` was called.
    pub async fn check_budget_alert(
        &self,
        year: i32,
        month: u8,
        notifier: &dyn BudgetAlertNotifier,
    ) -> Result<bool, Error> {
        let (settings, status) = self.settings_and_status(year, month).await?;

        if !settings.budget_alerts_enabled || !status.is_near_limit() {
            return Ok(false);
        }

        notifier.notify_budget_warning(status.current_spending, status.monthly_budget);

        Ok(true)
    }

    async fn settings_and_status(
        &self,
        year: i32,
        month: u8,
    ) -> Result<(UserSettings, BudgetStatus), Error> {
        let (start, end) = self.month_range(year, month)?;

        let settings = self
            .settings
            .get_user_settings_once()
            .await?
            .unwrap_or_default();
        let spending = self
            .transactions
            .get_total_expenses_between_dates(start, end)
            .await?;
        let income = self
            .transactions
            .get_total_income_between_dates(start, end)
            .await?;

        let status = BudgetStatus::new(
            settings.monthly_salary,
            settings.monthly_budget,
            spending,
            income,
        );

        Ok((settings, status))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::{
        Duration, OffsetDateTime,
        macros::{datetime, offset},
    };

    use crate::{
        BudgetAlertNotifier, Error, Transaction, TransactionType, UserSettings, db::Database,
    };

    use super::TransactionService;

    fn get_test_service() -> TransactionService {
        TransactionService::new(Database::open_in_memory().unwrap(), offset!(UTC))
    }

    async fn insert(
        service: &TransactionService,
        amount: f64,
        transaction_type: TransactionType,
        date: OffsetDateTime,
    ) -> Transaction {
        service
            .insert_transaction(Transaction::build(
                "Test",
                amount,
                "Food",
                transaction_type,
                date,
            ))
            .await
            .unwrap()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        warnings: Mutex<Vec<(f64, f64)>>,
    }

    impl BudgetAlertNotifier for RecordingNotifier {
        fn notify_budget_warning(&self, current_spending: f64, monthly_budget: f64) {
            self.warnings
                .lock()
                .unwrap()
                .push((current_spending, monthly_budget));
        }
    }

    #[test]
    fn month_range_covers_leap_february() {
        let service = get_test_service();

        let got = service.month_range(2024, 2);

        assert_eq!(
            got,
            Ok((
                datetime!(2024-02-01 00:00 UTC),
                datetime!(2024-02-29 23:59:59.999 UTC)
            ))
        );
    }

    #[test]
    fn month_range_wraps_december() {
        let service = get_test_service();

        let (_, end) = service.month_range(2023, 12).unwrap();

        assert_eq!(end, datetime!(2023-12-31 23:59:59.999 UTC));
    }

    #[test]
    fn month_range_covers_last_representable_month() {
        let service = get_test_service();

        let got = service.month_range(9999, 12);

        assert_eq!(
            got,
            Ok((
                datetime!(9999-12-01 00:00 UTC),
                datetime!(9999-12-31 23:59:59.999 UTC)
            ))
        );
    }

    #[test]
    fn month_range_ends_on_short_months() {
        let service = get_test_service();

        let (_, non_leap_february) = service.month_range(2023, 2).unwrap();
        let (_, april) = service.month_range(2024, 4).unwrap();

        assert_eq!(non_leap_february, datetime!(2023-02-28 23:59:59.999 UTC));
        assert_eq!(april, datetime!(2024-04-30 23:59:59.999 UTC));
    }

    #[test]
    fn month_range_uses_local_offset() {
        let service =
            TransactionService::new(Database::open_in_memory().unwrap(), offset!(+05:30));

        let (start, end) = service.month_range(2025, 3).unwrap();

        assert_eq!(start, datetime!(2025-03-01 00:00 +05:30));
        assert_eq!(end, datetime!(2025-03-31 23:59:59.999 +05:30));
    }

    #[test]
    fn month_range_rejects_invalid_months() {
        let service = get_test_service();

        assert_eq!(service.month_range(2024, 0), Err(Error::InvalidMonth(2024, 0)));
        assert_eq!(service.month_range(2024, 13), Err(Error::InvalidMonth(2024, 13)));
    }

    #[tokio::test]
    async fn monthly_expenses_only_include_expenses_in_month() {
        let service = get_test_service();
        let start = datetime!(2024-02-01 00:00 UTC);
        let end = datetime!(2024-02-29 23:59:59.999 UTC);
        let on_start = insert(&service, 1.0, TransactionType::Expense, start).await;
        let on_end = insert(&service, 2.0, TransactionType::Expense, end).await;
        insert(&service, 3.0, TransactionType::Income, start + Duration::days(2)).await;
        insert(
            &service,
            4.0,
            TransactionType::Expense,
            start - Duration::milliseconds(1),
        )
        .await;
        insert(
            &service,
            5.0,
            TransactionType::Expense,
            end + Duration::milliseconds(1),
        )
        .await;

        let live = service.get_monthly_expenses(2024, 2).await.unwrap();

        assert_eq!(live.current(), vec![on_end, on_start]);
    }

    #[tokio::test]
    async fn monthly_expenses_emit_after_insert() {
        let service = get_test_service();
        let mut live = service.get_monthly_expenses(2024, 2).await.unwrap();

        let inserted = insert(
            &service,
            12.5,
            TransactionType::Expense,
            datetime!(2024-02-10 12:00 UTC),
        )
        .await;

        assert_eq!(live.changed().await, Ok(vec![inserted]));
    }

    #[tokio::test]
    async fn monthly_expenses_reject_invalid_month() {
        let service = get_test_service();

        let result = service.get_monthly_expenses(2024, 13).await;

        assert!(matches!(result, Err(Error::InvalidMonth(2024, 13))));
    }

    #[tokio::test]
    async fn budget_status_uses_defaults_without_settings() {
        let service = get_test_service();
        insert(
            &service,
            40.0,
            TransactionType::Expense,
            datetime!(2024-02-10 12:00 UTC),
        )
        .await;

        let status = service.get_budget_status(2024, 2).await.unwrap();

        assert_eq!(status.monthly_salary, 0.0);
        assert_eq!(status.monthly_budget, 0.0);
        assert_eq!(status.current_spending, 40.0);
        assert_eq!(status.percent_used(), 0.0);
    }

    #[tokio::test]
    async fn budget_status_combines_settings_and_totals() {
        let service = get_test_service();
        service
            .save_user_settings(UserSettings {
                monthly_salary: 1000.0,
                monthly_budget: 300.0,
                ..Default::default()
            })
            .await
            .unwrap();
        insert(
            &service,
            150.0,
            TransactionType::Expense,
            datetime!(2024-02-10 12:00 UTC),
        )
        .await;
        insert(
            &service,
            200.0,
            TransactionType::Income,
            datetime!(2024-02-11 12:00 UTC),
        )
        .await;

        let status = service.get_budget_status(2024, 2).await.unwrap();

        assert_eq!(status.total_to_spend(), 1200.0);
        assert_eq!(status.remaining_balance(), 1050.0);
        assert_eq!(status.remaining_budget(), 150.0);
        assert_eq!(status.progress(), 50);
    }

    #[tokio::test]
    async fn budget_alert_fires_at_threshold() {
        let service = get_test_service();
        service.update_monthly_budget(100.0).await.unwrap();
        insert(
            &service,
            90.0,
            TransactionType::Expense,
            datetime!(2024-02-10 12:00 UTC),
        )
        .await;
        let notifier = RecordingNotifier::default();

        let fired = service.check_budget_alert(2024, 2, &notifier).await;

        assert_eq!(fired, Ok(true));
        assert_eq!(*notifier.warnings.lock().unwrap(), vec![(90.0, 100.0)]);
    }

    #[tokio::test]
    async fn budget_alert_is_silent_below_threshold() {
        let service = get_test_service();
        service.update_monthly_budget(100.0).await.unwrap();
        insert(
            &service,
            50.0,
            TransactionType::Expense,
            datetime!(2024-02-10 12:00 UTC),
        )
        .await;
        let notifier = RecordingNotifier::default();

        let fired = service.check_budget_alert(2024, 2, &notifier).await;

        assert_eq!(fired, Ok(false));
        assert!(notifier.warnings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn budget_alert_is_silent_when_disabled() {
        let service = get_test_service();
        service.update_monthly_budget(100.0).await.unwrap();
        service.update_budget_alerts_enabled(false).await.unwrap();
        insert(
            &service,
            95.0,
            TransactionType::Expense,
            datetime!(2024-02-10 12:00 UTC),
        )
        .await;
        let notifier = RecordingNotifier::default();

        let fired = service.check_budget_alert(2024, 2, &notifier).await;

        assert_eq!(fired, Ok(false));
        assert!(notifier.warnings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn settings_pass_through() {
        let service = get_test_service();
        let mut live = service.get_user_settings().await.unwrap();

        service.update_currency("USD").await.unwrap();

        let got = live.changed().await.unwrap().unwrap();
        assert_eq!(got.currency, "USD");
        assert_eq!(service.get_user_settings_once().await, Ok(Some(got)));
    }
}
