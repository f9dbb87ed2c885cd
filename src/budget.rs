//! Monthly budget summaries and the budget alert collaborator.

use serde::Serialize;

/// The fraction of the monthly budget at which a budget alert is raised.
pub const BUDGET_ALERT_THRESHOLD: f64 = 0.9;

/// How a month's spending compares to the user's salary and budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    /// The sum of the month's expenses.
    pub current_spending: f64,
    /// The sum of the month's income transactions.
    pub additional_income: f64,
    /// The monthly salary from the user settings.
    pub monthly_salary: f64,
    /// The monthly budget from the user settings.
    pub monthly_budget: f64,
}

impl BudgetStatus {
    /// Create the status for a month from the settings and the month's totals.
    pub fn new(
        monthly_salary: f64,
        monthly_budget: f64,
        current_spending: f64,
        additional_income: f64,
    ) -> Self {
        Self {
            current_spending,
            additional_income,
            monthly_salary,
            monthly_budget,
        }
    }

    /// The salary plus any additional income.
    pub fn total_to_spend(&self) -> f64 {
        self.monthly_salary + self.additional_income
    }

    /// What is left of the money to spend after this month's expenses.
    pub fn remaining_balance(&self) -> f64 {
        self.total_to_spend() - self.current_spending
    }

    /// What is left of the budget, negative once the budget is exceeded.
    pub fn remaining_budget(&self) -> f64 {
        self.monthly_budget - self.current_spending
    }

    /// Spending as a percentage of the budget, `0.0` when there is no budget.
    pub fn percent_used(&self) -> f64 {
        if self.monthly_budget > 0.0 {
            self.current_spending / self.monthly_budget * 100.0
        } else {
            0.0
        }
    }

    /// [BudgetStatus::percent_used] clamped to `0..=100` and truncated, for progress bars.
    pub fn progress(&self) -> u8 {
        self.percent_used().clamp(0.0, 100.0) as u8
    }

    /// Whether spending has reached [BUDGET_ALERT_THRESHOLD] of a non-zero budget.
    pub fn is_near_limit(&self) -> bool {
        self.monthly_budget > 0.0
            && self.current_spending >= BUDGET_ALERT_THRESHOLD * self.monthly_budget
    }
}

/// Receives budget warnings. Presenting the warning is up to the implementor.
pub trait BudgetAlertNotifier {
    /// Called when spending has reached the alert threshold of the budget.
    fn notify_budget_warning(&self, current_spending: f64, monthly_budget: f64);
}

/// A [BudgetAlertNotifier] that writes warnings to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertNotifier;

impl BudgetAlertNotifier for LogAlertNotifier {
    fn notify_budget_warning(&self, current_spending: f64, monthly_budget: f64) {
        tracing::warn!(
            "spending of {current_spending:.2} has reached {:.0}% of the monthly budget \
            of {monthly_budget:.2}",
            BUDGET_ALERT_THRESHOLD * 100.0
        );
    }
}
