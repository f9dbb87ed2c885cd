//! Runtime configuration shared by the library and the command line tool.

use std::path::PathBuf;

use clap::Args;
use time::UtcOffset;

use crate::{Error, timezone::get_local_offset};

/// The default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "fintrack.db";

/// The timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Where the data lives and how dates are interpreted.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct Config {
    /// File path to the application SQLite database.
    #[arg(long, env = "FINTRACK_DB", default_value = DEFAULT_DB_PATH, global = true)]
    pub db_path: PathBuf,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Colombo".
    #[arg(
        long = "timezone",
        env = "FINTRACK_TIMEZONE",
        default_value = DEFAULT_TIMEZONE,
        global = true
    )]
    pub local_timezone: String,

    /// Also write debug logs to this file.
    #[arg(long, env = "FINTRACK_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
            log_file: None,
        }
    }
}

impl Config {
    /// Resolve the configured timezone to its current UTC offset.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the timezone name is not known.
    pub fn local_offset(&self) -> Result<UtcOffset, Error> {
        get_local_offset(&self.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(self.local_timezone.clone()))
    }
}
