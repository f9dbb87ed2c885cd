//! Formatting amounts of money for display.

use numfmt::{Formatter, Precision};

use crate::Error;

/// numfmt switches to scientific notation at this many whole units.
const SCIENTIFIC_CUTOFF: u64 = 1_000_000_000_000;

/// Format `amount` with the currency code as a prefix, thousands separators
/// and exactly two decimal places, e.g. "LKR 1,234.50" or "-LKR 45.99".
///
/// The amount is rounded to the nearest cent first, so 19.999 is shown as
/// "LKR 20.00". Amounts that round to zero are shown without a sign.
///
/// # Errors
/// Returns [Error::InvalidCurrencyFormat] if `currency_code` cannot be used as
/// a prefix, for example because it is too long.
pub fn format_currency(amount: f64, currency_code: &str) -> Result<String, Error> {
    let code = currency_code.trim();
    validate_currency_code(code)?;

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;

    let prefix = if amount < 0.0 && cents > 0 {
        format!("-{code} ")
    } else {
        format!("{code} ")
    };

    let formatter = currency_formatter(&prefix, code)?;

    let whole_text = if whole == 0 {
        // numfmt renders zero as "0" without the prefix.
        format!("{prefix}0")
    } else if whole < SCIENTIFIC_CUTOFF {
        strip_decimals(formatter.fmt_string(whole as f64))
    } else {
        let billions = strip_decimals(formatter.fmt_string((whole / 1_000_000_000) as f64));
        let rest = whole % 1_000_000_000;

        format!(
            "{billions},{:03},{:03},{:03}",
            rest / 1_000_000,
            rest / 1_000 % 1_000,
            rest % 1_000
        )
    };

    Ok(format!("{whole_text}.{:02}", cents % 100))
}

/// Check that `currency_code` is not blank and can prefix any formatted amount.
///
/// # Errors
/// Returns [Error::EmptyCurrency] for a blank code, or
/// [Error::InvalidCurrencyFormat] if the code is too long to use as a prefix.
pub fn validate_currency_code(currency_code: &str) -> Result<(), Error> {
    let code = currency_code.trim();

    if code.is_empty() {
        return Err(Error::EmptyCurrency);
    }

    // The negative prefix is the longest one format_currency builds.
    currency_formatter(&format!("-{code} "), code).map(|_| ())
}

fn currency_formatter(prefix: &str, code: &str) -> Result<Formatter, Error> {
    Formatter::currency(prefix)
        .map(|formatter| formatter.precision(Precision::Decimals(0)))
        .map_err(|_| Error::InvalidCurrencyFormat(code.to_owned()))
}

/// Only whole units are given to numfmt, so anything after the point is noise.
fn strip_decimals(mut formatted: String) -> String {
    if let Some(index) = formatted.find('.') {
        formatted.truncate(index);
    }

    formatted
}
