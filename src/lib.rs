//! transact - thread-scoped database transaction sessions
//!
//! A [`TransactionRegistry`] opens a connection and a cursor for the
//! outermost wrapped call on a thread, shares them with every nested call
//! on the same slot, and closes both (cursor first) when that outer call
//! finishes, however it finishes.
//!
//! # Quick Start
//!
//! ```ignore
//! use transact::{TransactionRegistry, DEFAULT_SLOT};
//!
//! let registry = TransactionRegistry::new();
//!
//! let count_persons = registry
//!     .transact(move || MyDriver::open(&path))
//!     .wrap(|session, ()| {
//!         session.cursor().execute("SELECT COUNT(*) FROM persons")?;
//!         Ok::<_, AppError>(session.cursor().fetchone()?)
//!     });
//!
//! let count = count_persons(())?;
//! assert!(!registry.has(DEFAULT_SLOT));
//! ```
//!
//! # Architecture
//!
//! Driver types plug in through the [`Connection`] and [`Cursor`] traits.
//! Sessions live in thread-local storage and are `Rc`-shared, so they never
//! cross threads. The registry never commits or rolls back.

pub use transact_core::{BoxError, Connection, Cursor, Error, Resource, Result, DEFAULT_SLOT};
pub use transact_engine::{DefaultCursorFactory, Session, Transact, TransactionRegistry};
