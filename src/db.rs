//! Database initialisation and the shared database handle used by the stores.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use tokio::sync::watch;

use crate::{
    Error,
    live::{ChangeNotifier, Live, Table},
    settings::create_settings_table,
    transaction::create_transaction_table,
};

/// The schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Create the application tables if they do not exist and record the schema version.
///
/// # Errors
/// Returns an [Error::UnsupportedSchemaVersion] if the database was created
/// by a newer schema version, or an [Error::SqlError] if a table could not be
/// created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let version = get_schema_version(connection)?;

    if version > SCHEMA_VERSION {
        return Err(Error::UnsupportedSchemaVersion(version));
    }

    let transaction = connection.unchecked_transaction()?;

    create_transaction_table(&transaction)?;
    create_settings_table(&transaction)?;
    transaction.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;

    transaction.commit()?;

    Ok(())
}

/// Get the schema version recorded in the database, `0` for a new database.
pub(crate) fn get_schema_version(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// A handle to the application database.
///
/// All queries run on tokio's blocking thread pool so that callers on the
/// async runtime are never blocked by SQLite. Writes made through the handle
/// refresh the live queries of the table they touched.
///
/// The handle is cheap to clone, clones share the same connection.
#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
    notifier: Arc<ChangeNotifier>,
}

impl Database {
    /// Open the database file at `path`, creating it if needed, and initialise
    /// the schema.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// initialised.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!("opening database at {}", path.display());

        let connection = Connection::open(path)?;

        Self::new(connection)
    }

    /// Open a private in-memory database with the schema initialised.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be initialised.
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, initialising the schema.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be initialised.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            notifier: Arc::new(ChangeNotifier::new()),
        })
    }

    /// Close the database.
    ///
    /// Live queries stop publishing snapshots and every later operation fails
    /// with [Error::StoreClosed]. The connection itself is released once the
    /// last clone of the handle is dropped.
    pub fn close(&self) {
        tracing::debug!("closing database");
        self.notifier.shut_down();
    }

    /// Whether [Database::close] has been called.
    pub fn is_closed(&self) -> bool {
        self.notifier.is_shut_down()
    }

    /// Run `operation` against the connection on the blocking thread pool.
    pub(crate) async fn read<T, F>(&self, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
    {
        if self.is_closed() {
            return Err(Error::StoreClosed);
        }

        let connection = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let connection = connection.lock().map_err(|_| Error::DatabaseLockError)?;
            operation(&connection)
        })
        .await
        .map_err(|error| Error::WorkerFailed(error.to_string()))?
    }

    /// Run `operation` like [Database::read], then refresh the live queries on
    /// `table` if it succeeded.
    pub(crate) async fn write<T, F>(&self, table: Table, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
    {
        let result = self.read(operation).await?;
        self.notifier.notify(table);

        Ok(result)
    }

    /// Subscribe to `query`, re-running it after every write to `table`.
    ///
    /// The query runs once before this function returns, so the returned
    /// [Live] always holds a snapshot.
    ///
    /// # Errors
    /// Returns the error of the first run of `query`.
    pub(crate) async fn observe<T, F>(&self, table: Table, query: F) -> Result<Live<T>, Error>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Connection) -> Result<T, Error> + Send + Sync + 'static,
    {
        // Subscribe before the first run so writes that land mid-query still trigger a refresh.
        let mut changes = self.notifier.subscribe(table);
        let mut shutdown = self.notifier.subscribe_shutdown();
        let query = Arc::new(query);

        let first_query = query.clone();
        let initial = self.read(move |connection| first_query(connection)).await?;

        let (sender, receiver) = watch::channel(initial);
        let database = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = shutdown.changed() => break,
                    _ = sender.closed() => break,
                }

                let query = query.clone();
                match database.read(move |connection| query(connection)).await {
                    Ok(snapshot) => {
                        if sender.send(snapshot).is_err() {
                            break;
                        }
                    }
                    Err(Error::StoreClosed) => break,
                    Err(error) => {
                        tracing::error!(
                            "could not refresh live query on the {table} table: {error}"
                        );
                    }
                }
            }

            tracing::debug!("live query on the {table} table stopped");
        });

        Ok(Live::new(receiver))
    }
}
