use std::process::ExitCode;

use clap::{Parser, Subcommand};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    macros::{format_description, time},
};

use fintrack::{
    AppState, Config, LogAlertNotifier, SUGGESTED_CATEGORIES, Transaction, TransactionId,
    TransactionService, TransactionType, UserSettings, format_currency, setup_logging,
};

/// Track income, expenses and a monthly budget.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new transaction.
    Add {
        /// A short name, e.g. "Lunch".
        #[arg(long)]
        title: String,

        /// The amount spent or earned, greater than zero.
        #[arg(long)]
        amount: f64,

        /// The category, e.g. "Food".
        #[arg(long)]
        category: String,

        /// EXPENSE or INCOME.
        #[arg(long = "type", default_value = "EXPENSE")]
        transaction_type: TransactionType,

        /// The date as YYYY-MM-DD, today if omitted.
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,

        /// Optional notes.
        #[arg(long)]
        description: Option<String>,
    },

    /// Change the fields of an existing transaction.
    Edit {
        /// The ID of the transaction.
        id: TransactionId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        amount: Option<f64>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long = "type")]
        transaction_type: Option<TransactionType>,

        /// The date as YYYY-MM-DD.
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,

        /// New notes, an empty string removes them.
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a transaction.
    Delete {
        /// The ID of the transaction.
        id: TransactionId,
    },

    /// List transactions, newest first.
    List {
        /// Only show EXPENSE or INCOME transactions.
        #[arg(long = "type")]
        transaction_type: Option<TransactionType>,

        /// The first day to include, as YYYY-MM-DD.
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,

        /// The last day to include, as YYYY-MM-DD.
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,

        /// Print the transactions as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the expenses of a calendar month.
    Month {
        year: i32,

        /// The month number, 1 for January.
        month: u8,

        /// Print the expenses as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the budget status and top categories of a month, the current month by default.
    Summary {
        #[arg(requires = "month")]
        year: Option<i32>,

        month: Option<u8>,
    },

    /// Show or change the user settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Delete every transaction.
    Clear {
        /// Confirm deleting every transaction.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print the current settings.
    Show,

    /// Change one or more settings, keeping the rest.
    Set {
        #[arg(long)]
        salary: Option<f64>,

        #[arg(long)]
        budget: Option<f64>,

        #[arg(long)]
        currency: Option<String>,

        /// Whether to warn when spending nears the budget.
        #[arg(long)]
        alerts: Option<bool>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    App(#[from] fintrack::Error),

    #[error("could not write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("refusing to delete every transaction without --yes")]
    ClearNotConfirmed,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = setup_logging(cli.config.log_file.as_deref()) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }

    let state = match AppState::start(&cli.config) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("could not start: {error}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli.command, &state.service).await;
    state.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, service: &TransactionService) -> Result<(), CliError> {
    let offset = service.local_offset();
    let currency = service
        .get_user_settings_once()
        .await?
        .unwrap_or_default()
        .currency;

    match command {
        Command::Add {
            title,
            amount,
            category,
            transaction_type,
            date,
            description,
        } => {
            if !SUGGESTED_CATEGORIES.contains(&category.as_str()) {
                tracing::info!("\"{category}\" is not one of the suggested categories");
            }

            let date = date.unwrap_or_else(|| today(offset));
            let mut builder = Transaction::build(
                &title,
                amount,
                &category,
                transaction_type,
                start_of_day(date, offset),
            );
            if let Some(description) = description {
                builder = builder.description(&description);
            }

            let transaction = service.insert_transaction(builder).await?;
            println!("added {}", format_transaction(&transaction, &currency, offset)?);

            check_alert(service, transaction.date.to_offset(offset)).await?;
        }
        Command::Edit {
            id,
            title,
            amount,
            category,
            transaction_type,
            date,
            description,
        } => {
            let mut transaction = service.get_transaction(id).await?;

            if let Some(title) = title {
                transaction.title = title;
            }
            if let Some(amount) = amount {
                transaction.amount = amount;
            }
            if let Some(category) = category {
                transaction.category = category;
            }
            if let Some(transaction_type) = transaction_type {
                transaction.transaction_type = transaction_type;
            }
            if let Some(date) = date {
                transaction.date = start_of_day(date, offset);
            }
            if let Some(description) = description {
                transaction.description = Some(description);
            }

            service.update_transaction(transaction).await?;
            let transaction = service.get_transaction(id).await?;
            println!("updated {}", format_transaction(&transaction, &currency, offset)?);
        }
        Command::Delete { id } => {
            service.delete_transaction(id).await?;
            println!("deleted transaction {id}");
        }
        Command::List {
            transaction_type,
            from,
            to,
            json,
        } => {
            let transactions = match (from, to) {
                (None, None) => match transaction_type {
                    Some(transaction_type) => {
                        service.get_transactions_by_type(transaction_type).await?
                    }
                    None => service.get_all_transactions().await?,
                },
                (from, to) => {
                    let (start, end) = list_bounds(from, to, offset);
                    service.get_transactions_between_dates(start, end).await?
                }
            }
            .current();

            let transactions: Vec<Transaction> = transactions
                .into_iter()
                .filter(|transaction| {
                    transaction_type.is_none_or(|wanted| transaction.transaction_type == wanted)
                })
                .collect();

            print_transactions(&transactions, json, &currency, offset)?;
        }
        Command::Month { year, month, json } => {
            let expenses = service
                .get_monthly_expenses(year, month)
                .await?
                .current();
            print_transactions(&expenses, json, &currency, offset)?;

            if !json {
                let total: f64 = expenses.iter().map(|expense| expense.amount).sum();
                println!("total {}", format_currency(total, &currency)?);
            }
        }
        Command::Summary { year, month } => {
            let now = OffsetDateTime::now_utc().to_offset(offset);
            let (year, month) = match (year, month) {
                (Some(year), Some(month)) => (year, month),
                (None, Some(month)) => (now.year(), month),
                _ => (now.year(), u8::from(now.month())),
            };

            let status = service.get_budget_status(year, month).await?;
            let (start, end) = service.month_range(year, month)?;
            let categories = service
                .get_top_expense_categories(start, end)
                .await?
                .current();

            println!("{year}-{month:02}");
            let rows = [
                ("salary", status.monthly_salary),
                ("additional income", status.additional_income),
                ("total to spend", status.total_to_spend()),
                ("spent", status.current_spending),
                ("remaining", status.remaining_balance()),
                ("budget", status.monthly_budget),
                ("remaining budget", status.remaining_budget()),
            ];
            for (label, amount) in rows {
                println!("  {label:<18}{}", format_currency(amount, &currency)?);
            }
            println!(
                "  {:<18}{:.1}% [{}]",
                "budget used",
                status.percent_used(),
                progress_bar(status.progress())
            );

            if !categories.is_empty() {
                println!("top categories");
                for category in categories {
                    println!(
                        "  {:<16}{}",
                        category.category,
                        format_currency(category.total, &currency)?
                    );
                }
            }

            service
                .check_budget_alert(year, month, &LogAlertNotifier)
                .await?;
        }
        Command::Settings { command } => match command {
            SettingsCommand::Show => {
                let settings = service.get_user_settings_once().await?;
                print_settings(&settings.unwrap_or_default())?;
            }
            SettingsCommand::Set {
                salary,
                budget,
                currency,
                alerts,
            } => {
                if let Some(salary) = salary {
                    service.update_monthly_salary(salary).await?;
                }
                if let Some(budget) = budget {
                    service.update_monthly_budget(budget).await?;
                }
                if let Some(currency) = currency {
                    service.update_currency(&currency).await?;
                }
                if let Some(alerts) = alerts {
                    service.update_budget_alerts_enabled(alerts).await?;
                }

                let settings = service.get_user_settings_once().await?;
                print_settings(&settings.unwrap_or_default())?;
            }
        },
        Command::Clear { yes } => {
            if !yes {
                return Err(CliError::ClearNotConfirmed);
            }

            let deleted = service.delete_all_transactions().await?;
            println!("deleted {deleted} transactions");
        }
    }

    Ok(())
}

fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
}

fn today(offset: UtcOffset) -> Date {
    OffsetDateTime::now_utc().to_offset(offset).date()
}

fn start_of_day(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.midnight().assume_offset(offset)
}

fn end_of_day(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.with_time(time!(23:59:59.999)).assume_offset(offset)
}

/// The inclusive range for `list`, unbounded on whichever side is missing.
fn list_bounds(
    from: Option<Date>,
    to: Option<Date>,
    offset: UtcOffset,
) -> (OffsetDateTime, OffsetDateTime) {
    let start = from
        .map(|from| start_of_day(from, offset))
        .unwrap_or(PrimitiveDateTime::MIN.assume_utc());
    let end = to
        .map(|to| end_of_day(to, offset))
        .unwrap_or(PrimitiveDateTime::MAX.assume_utc());

    (start, end)
}

async fn check_alert(service: &TransactionService, date: OffsetDateTime) -> Result<(), CliError> {
    service
        .check_budget_alert(date.year(), u8::from(date.month()), &LogAlertNotifier)
        .await?;

    Ok(())
}

fn format_transaction(
    transaction: &Transaction,
    currency: &str,
    offset: UtcOffset,
) -> Result<String, CliError> {
    let mut line = format!(
        "{:>5}  {}  {:<7}  {:>16}  {:<14}  {}",
        transaction.id,
        transaction.date.to_offset(offset).date(),
        transaction.transaction_type,
        format_currency(transaction.amount, currency)?,
        transaction.category,
        transaction.title,
    );

    if let Some(description) = &transaction.description {
        line.push_str(&format!(" ({description})"));
    }

    Ok(line)
}

fn print_transactions(
    transactions: &[Transaction],
    json: bool,
    currency: &str,
    offset: UtcOffset,
) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("no transactions");
    }

    for transaction in transactions {
        println!("{}", format_transaction(transaction, currency, offset)?);
    }

    Ok(())
}

fn print_settings(settings: &UserSettings) -> Result<(), CliError> {
    println!(
        "monthly salary  {}",
        format_currency(settings.monthly_salary, &settings.currency)?
    );
    println!(
        "monthly budget  {}",
        format_currency(settings.monthly_budget, &settings.currency)?
    );
    println!("currency        {}", settings.currency);
    println!(
        "budget alerts   {}",
        if settings.budget_alerts_enabled {
            "on"
        } else {
            "off"
        }
    );

    Ok(())
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress / 5);

    format!("{}{}", "#".repeat(filled), "-".repeat(20 - filled))
}
