//! Scoped connection acquisition and units of work.
//!
//! # Responsibility
//! - Hand out a connection for the duration of one logical operation.
//! - Release it on every exit path by dropping the scope guard.
//! - Wrap multi-statement writes in one transaction that commits on success
//!   and rolls back on error or unwind.
//!
//! # Invariants
//! - Nested acquisition from the same source reuses the live connection.
//! - A unit of work started while a transaction is open runs under a
//!   savepoint of that transaction: its own failure undoes only its writes,
//!   and the outer owner still decides the final outcome.
//! - Scopes are single-threaded; sources are not `Sync`.

use super::open::{open_db_in_memory, open_db_with_config};
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::Rc;

/// Supplies connections for repository operations.
pub trait ConnectionSource {
    /// Acquires a connection scope. Dropping the scope releases it.
    fn acquire(&self) -> DbResult<ConnectionScope<'_>>;
}

impl<T: ConnectionSource + ?Sized> ConnectionSource for &T {
    fn acquire(&self) -> DbResult<ConnectionScope<'_>> {
        (**self).acquire()
    }
}

enum Handle<'s> {
    Borrowed(&'s Connection),
    Leased(Rc<Connection>),
}

/// RAII guard over one acquired connection.
pub struct ConnectionScope<'s> {
    handle: Handle<'s>,
    lease: Option<&'s Lease>,
}

impl ConnectionScope<'_> {
    pub fn connection(&self) -> &Connection {
        match &self.handle {
            Handle::Borrowed(conn) => *conn,
            Handle::Leased(conn) => conn.as_ref(),
        }
    }

    /// Runs `work` inside one transaction.
    ///
    /// Commits when `work` returns `Ok`. Any `Err` (or a panic) drops the
    /// transaction guard, which rolls everything back. When the connection
    /// is already inside a transaction, `work` runs under a savepoint: an
    /// `Err` rolls back to it, an `Ok` releases it into the outer
    /// transaction.
    pub fn unit_of_work<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let conn = self.connection();
        if !conn.is_autocommit() {
            let savepoint = NestedSavepoint::open(conn)?;
            let value = work(conn)?;
            savepoint.release()?;
            return Ok(value);
        }

        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = work(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

/// Savepoint guard for a unit of work nested in an open transaction.
///
/// Dropping the guard without `release` rolls back to the savepoint.
struct NestedSavepoint<'c> {
    conn: &'c Connection,
    released: bool,
}

impl<'c> NestedSavepoint<'c> {
    const NAME: &'static str = "unit_of_work";

    fn open(conn: &'c Connection) -> DbResult<Self> {
        conn.execute_batch(&format!("SAVEPOINT {};", Self::NAME))?;
        Ok(Self {
            conn,
            released: false,
        })
    }

    fn release(mut self) -> DbResult<()> {
        self.conn
            .execute_batch(&format!("RELEASE {};", Self::NAME))?;
        self.released = true;
        Ok(())
    }
}

impl Drop for NestedSavepoint<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let name = Self::NAME;
        if let Err(err) = self
            .conn
            .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};"))
        {
            warn!("event=db_savepoint module=db status=error reason=rollback_failed error={err}");
        }
    }
}

impl Deref for ConnectionScope<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.connection()
    }
}

impl Drop for ConnectionScope<'_> {
    fn drop(&mut self) {
        if let Some(lease) = self.lease {
            lease.release();
        }
    }
}

#[derive(Default)]
struct Lease {
    active: RefCell<Option<Rc<Connection>>>,
    depth: Cell<usize>,
}

impl Lease {
    fn release(&self) {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if depth == 0 {
            // Last scope out closes the connection once its own handle drops.
            self.active.borrow_mut().take();
            debug!("event=db_scope module=db status=closed");
        }
    }
}

/// Opens the configured database file per outermost scope.
///
/// The file is opened when the first scope is acquired and closed when the
/// last live scope is dropped.
pub struct FileSource {
    config: StoreConfig,
    lease: Lease,
}

impl FileSource {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            lease: Lease::default(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of live scopes sharing the current connection.
    pub fn active_scopes(&self) -> usize {
        self.lease.depth.get()
    }
}

impl ConnectionSource for FileSource {
    fn acquire(&self) -> DbResult<ConnectionScope<'_>> {
        let live = self.lease.active.borrow().clone();
        let conn = match live {
            Some(conn) => conn,
            None => {
                let conn = Rc::new(open_db_with_config(&self.config)?);
                *self.lease.active.borrow_mut() = Some(Rc::clone(&conn));
                conn
            }
        };

        let depth = self.lease.depth.get() + 1;
        self.lease.depth.set(depth);
        debug!("event=db_scope module=db status=acquired depth={depth}");

        Ok(ConnectionScope {
            handle: Handle::Leased(conn),
            lease: Some(&self.lease),
        })
    }
}

/// Wraps a connection opened by the embedding environment.
pub struct SharedConnection {
    conn: Connection,
}

impl SharedConnection {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens a bootstrapped in-memory store.
    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ConnectionSource for SharedConnection {
    fn acquire(&self) -> DbResult<ConnectionScope<'_>> {
        Ok(ConnectionScope {
            handle: Handle::Borrowed(&self.conn),
            lease: None,
        })
    }
}
