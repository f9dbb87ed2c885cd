//! The opened application: the database and the service built on it.

use crate::{Error, config::Config, db::Database, service::TransactionService};

/// Everything a caller needs once the application has started.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The application database.
    pub database: Database,

    /// The service that all reads and writes go through.
    pub service: TransactionService,
}

impl AppState {
    /// Open the database described by `config` and build the service.
    ///
    /// # Errors
    /// Returns an error if the timezone is unknown, or if the database cannot
    /// be opened or initialised.
    pub fn start(config: &Config) -> Result<Self, Error> {
        let local_offset = config.local_offset()?;
        let database = Database::open(&config.db_path)?;

        tracing::debug!(
            "started with database {} in timezone {} ({local_offset})",
            config.db_path.display(),
            config.local_timezone
        );

        Ok(Self::new(database, local_offset))
    }

    /// Build the state for an already opened database.
    pub fn new(database: Database, local_offset: time::UtcOffset) -> Self {
        let service = TransactionService::new(database.clone(), local_offset);

        Self { database, service }
    }

    /// Close the database. Live queries stop and later calls fail with [Error::StoreClosed].
    pub fn shutdown(&self) {
        self.database.close();
    }
}
