//! Transaction registry
//!
//! A [`TransactionRegistry`] scopes a driver connection and cursor to the
//! dynamic extent of a wrapped call:
//! - the outermost call for a slot on a thread opens a connection, derives a
//!   cursor and registers both as a [`Session`]
//! - reentrant calls for the same slot on the same thread reuse that
//!   session and release nothing
//! - when the outermost call finishes (returns, fails or unwinds) the cursor
//!   is closed, then the connection, then the session is unregistered
//!
//! Commit and rollback stay with the wrapped code; the registry only
//! guarantees disposal. Nested transactions (savepoints) are not supported:
//! inner calls share the outer resources.
//!
//! # Example
//!
//! ```text
//! let registry = TransactionRegistry::new();
//!
//! let add_person = registry
//!     .transact(move || open_db(&path))
//!     .wrap(|session, (id, name): (i64, String)| {
//!         session.cursor().execute("INSERT INTO persons VALUES (?1, ?2)", (id, name))?;
//!         session.connection().commit()?;
//!         Ok::<_, AppError>(())
//!     });
//!
//! add_person((1, "Joe".to_string()))?;
//! assert!(!registry.has("default"));
//! ```

use crate::transaction::{CloseGuard, RegistryId, Session, SessionGuard, SlotTable};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, trace, warn};
use transact_core::{Connection, Error, Result, DEFAULT_SLOT};

/// Default cursor factory: [`Connection::cursor`]
pub type DefaultCursorFactory<C> =
    fn(&C) -> std::result::Result<<C as Connection>::Cursor, <C as Connection>::Error>;

/// Registry of per-thread transaction sessions for one driver type
///
/// Constructed explicitly and handed to the call sites that need it.
/// Clones are handles to the same registry. Separate registries never
/// share sessions, even under the same slot name.
pub struct TransactionRegistry<C> {
    id: RegistryId,
    _driver: PhantomData<fn() -> C>,
}

impl<C> Clone for TransactionRegistry<C> {
    fn clone(&self) -> Self {
        TransactionRegistry {
            id: self.id,
            _driver: PhantomData,
        }
    }
}

impl<C> fmt::Debug for TransactionRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRegistry")
            .field("id", &self.id.as_u64())
            .finish()
    }
}

impl<C: Connection> Default for TransactionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> TransactionRegistry<C> {
    /// Create an empty registry
    pub fn new() -> Self {
        TransactionRegistry {
            id: RegistryId::next(),
            _driver: PhantomData,
        }
    }

    /// Start configuring a transaction scope
    ///
    /// `connect` is called once per outer call to open a fresh connection.
    /// The scope uses the default slot and [`Connection::cursor`] unless
    /// configured otherwise on the returned [`Transact`].
    pub fn transact<F>(&self, connect: F) -> Transact<C, F>
    where
        F: Fn() -> std::result::Result<C, C::Error>,
    {
        Transact {
            registry: self.clone(),
            slot: DEFAULT_SLOT.to_string(),
            connect,
            open_cursor: C::cursor,
        }
    }

    /// True if the calling thread has an active session for `slot`
    pub fn has(&self, slot: &str) -> bool {
        SlotTable::contains(self.id, slot)
    }

    /// Active session of the calling thread for `slot`
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` if no wrapped call for `slot` is running on
    /// this thread.
    pub fn get(&self, slot: &str) -> Result<Rc<Session<C>>> {
        SlotTable::lookup(self.id, slot).ok_or_else(|| Error::NoActiveTransaction {
            slot: slot.to_string(),
        })
    }

    /// Connection of the default slot
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` outside a default-slot scope.
    pub fn connection(&self) -> Result<Rc<C>> {
        self.get(DEFAULT_SLOT).map(|s| s.connection_handle())
    }

    /// Cursor of the default slot
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` outside a default-slot scope.
    pub fn cursor(&self) -> Result<Rc<C::Cursor>> {
        self.get(DEFAULT_SLOT).map(|s| s.cursor_handle())
    }

    /// Slots with an active session on the calling thread, sorted by name
    pub fn active_slots(&self) -> Vec<String> {
        SlotTable::slots(self.id)
    }
}

/// A configured transaction scope
///
/// Built by [`TransactionRegistry::transact`]. Run one wrapped call with
/// [`Transact::run`], or turn a function into a wrapped one with
/// [`Transact::wrap`].
pub struct Transact<C: Connection, F, K = DefaultCursorFactory<C>> {
    registry: TransactionRegistry<C>,
    slot: String,
    connect: F,
    open_cursor: K,
}

impl<C: Connection, F, K> fmt::Debug for Transact<C, F, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transact")
            .field("registry", &self.registry)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl<C, F, K> Transact<C, F, K>
where
    C: Connection,
    F: Fn() -> std::result::Result<C, C::Error>,
    K: Fn(&C) -> std::result::Result<C::Cursor, C::Error>,
{
    /// Use `slot` instead of the default slot
    pub fn slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Derive cursors with `open_cursor` instead of [`Connection::cursor`]
    ///
    /// Called once per outer call, never on reentrant calls.
    pub fn cursor_factory<K2>(self, open_cursor: K2) -> Transact<C, F, K2>
    where
        K2: Fn(&C) -> std::result::Result<C::Cursor, C::Error>,
    {
        Transact {
            registry: self.registry,
            slot: self.slot,
            connect: self.connect,
            open_cursor,
        }
    }

    /// Slot this scope reads and writes
    pub fn slot_name(&self) -> &str {
        &self.slot
    }

    /// Execute `body` inside the scope
    ///
    /// If the calling thread already has a session for the slot, `body`
    /// runs against it and nothing is opened or closed. Otherwise a session
    /// is opened for the duration of `body` and released afterwards on
    /// every exit path, panics included.
    ///
    /// # Errors
    ///
    /// - errors returned by `body`, unchanged; a release failure that
    ///   happens after a failing body is logged, never returned
    /// - acquisition failures (`Connect`, `OpenCursor`)
    /// - release failures (`Close`) when `body` succeeded
    pub fn run<T, E, B>(&self, body: B) -> std::result::Result<T, E>
    where
        B: FnOnce(&Session<C>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        if let Some(session) = SlotTable::lookup::<C>(self.registry.id, &self.slot) {
            trace!(
                target: "transact::registry",
                slot = %self.slot,
                "Reentrant call reuses active session"
            );
            return body(&*session);
        }

        let mut guard = self.open()?;
        let outcome = body(guard.session());
        let released = guard.release();

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!(
                    target: "transact::registry",
                    slot = %self.slot,
                    error = %close_err,
                    "Suppressed close failure: wrapped call already failed"
                );
                Err(e)
            }
        }
    }

    /// Turn `body` into a function that runs inside the scope on each call
    ///
    /// The returned function takes the same argument as `body` (use a tuple
    /// for several) and returns what `body` returns. `body` receives the
    /// active session explicitly as its first parameter.
    pub fn wrap<A, T, E, B>(self, body: B) -> impl Fn(A) -> std::result::Result<T, E>
    where
        B: Fn(&Session<C>, A) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        move |arg| self.run(|session| body(session, arg))
    }

    fn open(&self) -> Result<SessionGuard<C>> {
        let connection = (self.connect)().map_err(|e| Error::connect(&self.slot, e))?;

        // Closed on drop until the cursor exists, so a panicking cursor
        // factory does not leak the connection.
        let pending = CloseGuard::new(&connection, &self.slot);
        let cursor = match (self.open_cursor)(&connection) {
            Ok(cursor) => {
                pending.disarm();
                cursor
            }
            Err(e) => {
                if let Err(close_err) = pending.close() {
                    warn!(
                        target: "transact::registry",
                        slot = %self.slot,
                        error = %close_err,
                        "Failed to close connection after cursor open failure"
                    );
                }
                return Err(Error::open_cursor(&self.slot, e));
            }
        };

        let session = Rc::new(Session::new(self.slot.clone(), connection, cursor));
        // Free: `run` found no session, and any scope a factory opened on
        // this slot was released before the factory returned.
        let inserted = SlotTable::insert(self.registry.id, Rc::clone(&session));
        debug_assert!(inserted, "slot occupied while opening a session");

        debug!(
            target: "transact::registry",
            registry = self.registry.id.as_u64(),
            slot = %self.slot,
            "Opened transaction session"
        );
        Ok(SessionGuard::new(self.registry.id, session))
    }
}
