//! Transaction scope engine for transact
//!
//! This crate ties the driver traits from `transact-core` to the
//! thread-local session table:
//! - TransactionRegistry: explicit registry instance with has/get accessors
//! - Transact: configured scope (slot, cursor factory) with run/wrap
//! - Session: connection and cursor exposed to wrapped code
//!
//! The engine never commits or rolls back; it only guarantees that what it
//! opened is closed exactly once, on the thread that opened it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;
pub mod transaction;


pub use registry::{DefaultCursorFactory, Transact, TransactionRegistry};
pub use transaction::Session;
