//! Session: the (connection, cursor) pair of one active scope
//!
//! A session is created by the outermost wrapped call for a slot and shared
//! (through `Rc`) with every reentrant call on the same thread. `Rc` keeps
//! sessions `!Send`: a connection opened on one thread cannot be used or
//! closed from another.

use super::slots::{RegistryId, SlotTable};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};
use transact_core::{Connection, Cursor, Error, Resource, Result};

/// Connection and cursor exposed to code running inside a scope
pub struct Session<C: Connection> {
    slot: String,
    connection: Rc<C>,
    cursor: Rc<C::Cursor>,
}

impl<C: Connection> Session<C> {
    pub(crate) fn new(slot: String, connection: C, cursor: C::Cursor) -> Self {
        Session {
            slot,
            connection: Rc::new(connection),
            cursor: Rc::new(cursor),
        }
    }

    /// Slot this session was opened for
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// The scope's connection
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// The scope's cursor
    pub fn cursor(&self) -> &C::Cursor {
        &self.cursor
    }

    /// Shared handle to the connection
    pub fn connection_handle(&self) -> Rc<C> {
        Rc::clone(&self.connection)
    }

    /// Shared handle to the cursor
    pub fn cursor_handle(&self) -> Rc<C::Cursor> {
        Rc::clone(&self.cursor)
    }
}

impl<C: Connection> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

/// Owns the release of one registered session
///
/// `release` closes the cursor, then the connection, then removes the
/// session from the slot table. It runs at most once; if the guard is
/// dropped without an explicit release (the body panicked), `Drop` does it
/// and logs any failure.
pub(crate) struct SessionGuard<C: Connection> {
    registry: RegistryId,
    session: Rc<Session<C>>,
    released: bool,
}

impl<C: Connection> SessionGuard<C> {
    pub(crate) fn new(registry: RegistryId, session: Rc<Session<C>>) -> Self {
        SessionGuard {
            registry,
            session,
            released: false,
        }
    }

    pub(crate) fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Close both resources and unregister the session
    ///
    /// A cursor close failure does not stop the connection close, and
    /// neither stops the removal. When both closes fail the cursor error is
    /// returned and the connection error logged. The remaining steps also
    /// run when a close panics.
    pub(crate) fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let slot = self.session.slot();
        // Dropped in reverse: on unwind the connection closes, then the
        // session is unregistered.
        let unregister = Unregister {
            registry: self.registry,
            slot,
        };
        let connection = CloseGuard::new(self.session.connection(), slot);

        let cursor_closed = self
            .session
            .cursor
            .close()
            .map_err(|e| Error::close(slot, Resource::Cursor, e));
        let connection_closed = connection.close();
        drop(unregister);

        debug!(
            target: "transact::registry",
            registry = self.registry.as_u64(),
            slot,
            "Closed transaction session"
        );

        match (cursor_closed, connection_closed) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(cursor_err), Err(connection_err)) => {
                warn!(
                    target: "transact::registry",
                    slot,
                    resource = %Resource::Connection,
                    error = %connection_err,
                    "Suppressed close failure: cursor close already failed"
                );
                Err(cursor_err)
            }
        }
    }
}

/// Removes a session from the slot table when dropped
struct Unregister<'a> {
    registry: RegistryId,
    slot: &'a str,
}

impl Drop for Unregister<'_> {
    fn drop(&mut self) {
        SlotTable::remove(self.registry, self.slot);
    }
}

/// Closes a connection exactly once: explicitly through `close`, or on drop
///
/// `disarm` hands the connection over without closing it.
pub(crate) struct CloseGuard<'a, C: Connection> {
    connection: Option<&'a C>,
    slot: &'a str,
}

impl<'a, C: Connection> CloseGuard<'a, C> {
    pub(crate) fn new(connection: &'a C, slot: &'a str) -> Self {
        CloseGuard {
            connection: Some(connection),
            slot,
        }
    }

    /// Close now, returning the driver failure
    pub(crate) fn close(mut self) -> Result<()> {
        match self.connection.take() {
            Some(connection) => connection
                .close()
                .map_err(|e| Error::close(self.slot, Resource::Connection, e)),
            None => Ok(()),
        }
    }

    /// Keep the connection open
    pub(crate) fn disarm(mut self) {
        self.connection = None;
    }
}

impl<C: Connection> Drop for CloseGuard<'_, C> {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        if let Err(e) = connection.close() {
            warn!(
                target: "transact::registry",
                slot = self.slot,
                resource = %Resource::Connection,
                panicking = std::thread::panicking(),
                error = %e,
                "Failed to close connection during unwind"
            );
        }
    }
}

impl<C: Connection> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.release() {
            warn!(
                target: "transact::registry",
                slot = self.session.slot(),
                panicking = std::thread::panicking(),
                error = %e,
                "Failed to release transaction session during unwind"
            );
        }
    }
}
