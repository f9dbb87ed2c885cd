//! The asynchronous, observable user settings store.

use crate::{
    Error,
    db::Database,
    live::{Live, Table},
};

use super::core::{
    SettingsField, UserSettings, get_user_settings, save_user_settings, update_settings_field,
};

/// Stores the single user settings row in the application database.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    database: Database,
}

impl SettingsStore {
    /// Create a new store for `database`.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Subscribe to the settings, `None` until they are first saved.
    ///
    /// # Errors
    /// Returns an error if the first query fails or the database is closed.
    pub async fn get_user_settings(&self) -> Result<Live<Option<UserSettings>>, Error> {
        self.database
            .observe(Table::Settings, get_user_settings)
            .await
    }

    /// Read the settings once, `None` if they have never been saved.
    pub async fn get_user_settings_once(&self) -> Result<Option<UserSettings>, Error> {
        self.database.read(get_user_settings).await
    }

    /// Insert the settings, or overwrite them if they already exist.
    ///
    /// # Errors
    /// Returns a validation error for invalid fields, or a storage error if the write fails.
    pub async fn save_user_settings(&self, settings: UserSettings) -> Result<(), Error> {
        self.database
            .write(Table::Settings, move |connection| {
                save_user_settings(&settings, connection)
            })
            .await?;

        tracing::debug!("saved user settings");

        Ok(())
    }

    /// Set the monthly salary, keeping the other settings.
    pub async fn update_monthly_salary(&self, salary: f64) -> Result<(), Error> {
        self.update_field(SettingsField::MonthlySalary(salary)).await
    }

    /// Set the monthly budget, keeping the other settings.
    pub async fn update_monthly_budget(&self, budget: f64) -> Result<(), Error> {
        self.update_field(SettingsField::MonthlyBudget(budget)).await
    }

    /// Set the currency code, keeping the other settings.
    pub async fn update_currency(&self, currency: &str) -> Result<(), Error> {
        self.update_field(SettingsField::Currency(currency.to_owned()))
            .await
    }

    /// Turn budget alerts on or off, keeping the other settings.
    pub async fn update_budget_alerts_enabled(&self, enabled: bool) -> Result<(), Error> {
        self.update_field(SettingsField::BudgetAlertsEnabled(enabled))
            .await
    }

    async fn update_field(&self, field: SettingsField) -> Result<(), Error> {
        tracing::debug!("updating user setting {field:?}");

        self.database
            .write(Table::Settings, move |connection| {
                update_settings_field(field, connection)
            })
            .await
    }
}
