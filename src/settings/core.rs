//! The user settings model and its single-row table.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, currency::validate_currency_code, database_id::SETTINGS_ROW_ID};

/// The currency used until the user picks one.
pub const DEFAULT_CURRENCY: &str = "LKR";

/// The user's monthly figures and preferences.
///
/// There is at most one settings row. Until it is first written, callers
/// should fall back to [UserSettings::default].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Money earned each month, zero or more.
    pub monthly_salary: f64,
    /// The most the user wants to spend each month, zero or more.
    pub monthly_budget: f64,
    /// The currency code amounts are shown in, e.g. "LKR".
    pub currency: String,
    /// Whether to warn when spending nears the monthly budget.
    pub budget_alerts_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            monthly_salary: 0.0,
            monthly_budget: 0.0,
            currency: DEFAULT_CURRENCY.to_owned(),
            budget_alerts_enabled: true,
        }
    }
}

impl UserSettings {
    /// Check the fields against the rules enforced by the store.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NegativeSettingsAmount] if the salary or budget is negative or not finite,
    /// - [Error::EmptyCurrency] if the currency is empty or whitespace,
    /// - or [Error::InvalidCurrencyFormat] if the currency is too long to display.
    pub fn validate(&self) -> Result<(), Error> {
        validate_settings_amount(self.monthly_salary)?;
        validate_settings_amount(self.monthly_budget)?;
        validate_currency_code(&self.currency)?;

        Ok(())
    }
}

fn validate_settings_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() || amount < 0.0 {
        Err(Error::NegativeSettingsAmount(amount))
    } else {
        Ok(())
    }
}


/// A single settings field that can be changed on its own.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SettingsField {
    MonthlySalary(f64),
    MonthlyBudget(f64),
    Currency(String),
    BudgetAlertsEnabled(bool),
}

impl SettingsField {
    fn column(&self) -> &'static str {
        match self {
            SettingsField::MonthlySalary(_) => "monthly_salary",
            SettingsField::MonthlyBudget(_) => "monthly_budget",
            SettingsField::Currency(_) => "currency",
            SettingsField::BudgetAlertsEnabled(_) => "budget_alerts_enabled",
        }
    }

    fn apply(&self, settings: &mut UserSettings) {
        match self {
            SettingsField::MonthlySalary(salary) => settings.monthly_salary = *salary,
            SettingsField::MonthlyBudget(budget) => settings.monthly_budget = *budget,
            SettingsField::Currency(currency) => settings.currency = currency.trim().to_owned(),
            SettingsField::BudgetAlertsEnabled(enabled) => {
                settings.budget_alerts_enabled = *enabled
            }
        }
    }
}

/// Create the user settings table.
///
/// The `CHECK` constraint keeps the table to the single row [SETTINGS_ROW_ID].
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_settings_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS user_settings (
                id INTEGER PRIMARY KEY CHECK (id = {SETTINGS_ROW_ID}),
                monthly_salary REAL NOT NULL,
                monthly_budget REAL NOT NULL,
                currency TEXT NOT NULL,
                budget_alerts_enabled INTEGER NOT NULL
                )"
        ),
        (),
    )?;

    Ok(())
}

/// Get the stored settings, or `None` if they have never been saved.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_user_settings(connection: &Connection) -> Result<Option<UserSettings>, Error> {
    connection
        .prepare(
            "SELECT monthly_salary, monthly_budget, currency, budget_alerts_enabled
             FROM user_settings WHERE id = :id",
        )?
        .query_row(&[(":id", &SETTINGS_ROW_ID)], map_settings_row)
        .optional()
        .map_err(|error| error.into())
}

/// Insert the settings row, or overwrite every field if it already exists.
///
/// Saving the same settings twice leaves a single row holding those values.
///
/// # Errors
///
/// Returns a validation error for invalid fields, or [Error::SqlError] if an
/// SQL related error occurred.
pub fn save_user_settings(settings: &UserSettings, connection: &Connection) -> Result<(), Error> {
    settings.validate()?;

    connection.execute(
        "INSERT INTO user_settings
            (id, monthly_salary, monthly_budget, currency, budget_alerts_enabled)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            monthly_salary = excluded.monthly_salary,
            monthly_budget = excluded.monthly_budget,
            currency = excluded.currency,
            budget_alerts_enabled = excluded.budget_alerts_enabled",
        (
            SETTINGS_ROW_ID,
            settings.monthly_salary,
            settings.monthly_budget,
            settings.currency.trim(),
            settings.budget_alerts_enabled,
        ),
    )?;

    Ok(())
}

/// Change one field of the settings, keeping the others.
///
/// If the settings have never been saved, the row is created from
/// [UserSettings::default] with `field` applied.
///
/// # Errors
///
/// Returns a validation error for an invalid value, or [Error::SqlError] if
/// an SQL related error occurred.
pub(crate) fn update_settings_field(
    field: SettingsField,
    connection: &Connection,
) -> Result<(), Error> {
    let mut defaults = UserSettings::default();
    field.apply(&mut defaults);
    defaults.validate()?;

    let column = field.column();

    connection.execute(
        &format!(
            "INSERT INTO user_settings
                (id, monthly_salary, monthly_budget, currency, budget_alerts_enabled)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET {column} = excluded.{column}"
        ),
        (
            SETTINGS_ROW_ID,
            defaults.monthly_salary,
            defaults.monthly_budget,
            &defaults.currency,
            defaults.budget_alerts_enabled,
        ),
    )?;

    Ok(())
}

/// Get the number of settings rows, either zero or one.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
#[cfg(test)]
pub fn count_settings_rows(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user_settings;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn map_settings_row(row: &Row) -> Result<UserSettings, rusqlite::Error> {
    Ok(UserSettings {
        monthly_salary: row.get(0)?,
        monthly_budget: row.get(1)?,
        currency: row.get(2)?,
        budget_alerts_enabled: row.get(3)?,
    })
}
