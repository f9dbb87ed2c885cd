//! Live queries: snapshots that are refreshed after every write to a table.
//!
//! Each table has a revision counter held in a [watch] channel. Writers bump
//! the revision of the table they changed, and every live query subscribed to
//! that table re-runs its query and publishes the new snapshot to its [Live]
//! handle.

use std::fmt::Display;

use tokio::sync::watch;

use crate::Error;

/// The tables that live queries can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// The transaction table.
    Transactions,
    /// The single-row user settings table.
    Settings,
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::Transactions => write!(f, "transaction"),
            Table::Settings => write!(f, "user_settings"),
        }
    }
}

/// Broadcasts table changes and the shutdown signal to live queries.
#[derive(Debug)]
pub(crate) struct ChangeNotifier {
    transactions: watch::Sender<u64>,
    settings: watch::Sender<u64>,
    shutdown: watch::Sender<bool>,
}

impl ChangeNotifier {
    pub(crate) fn new() -> Self {
        Self {
            transactions: watch::Sender::new(0),
            settings: watch::Sender::new(0),
            shutdown: watch::Sender::new(false),
        }
    }

    fn channel(&self, table: Table) -> &watch::Sender<u64> {
        match table {
            Table::Transactions => &self.transactions,
            Table::Settings => &self.settings,
        }
    }

    /// Get a receiver that is marked as changed after each write to `table`.
    ///
    /// The current revision counts as seen, so only later writes wake the receiver.
    pub(crate) fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.channel(table).subscribe()
    }

    /// Record that `table` was written to.
    pub(crate) fn notify(&self, table: Table) {
        self.channel(table).send_modify(|revision| *revision += 1);
        tracing::debug!("{table} table changed");
    }

    pub(crate) fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub(crate) fn shut_down(&self) {
        self.shutdown.send_replace(true);
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// A handle to the latest result of a live query.
///
/// The first snapshot is taken when the query is subscribed to, and a new
/// snapshot is published after every write to the query's table. Several
/// writes in quick succession may be folded into one refresh. Dropping the
/// handle stops the refreshes.
#[derive(Debug)]
pub struct Live<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Live<T> {
    pub(crate) fn new(receiver: watch::Receiver<T>) -> Self {
        Self { receiver }
    }

    /// The most recent snapshot.
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot and return it.
    ///
    /// # Errors
    /// Returns [Error::StoreClosed] once the database has been closed and no
    /// further snapshots will be published.
    pub async fn changed(&mut self) -> Result<T, Error> {
        self.receiver
            .changed()
            .await
            .map_err(|_| Error::StoreClosed)?;

        Ok(self.receiver.borrow_and_update().clone())
    }
}
