//! Core types and traits for transact
//!
//! This crate defines the foundational types used throughout the system:
//! - Connection / Cursor: driver traits the registry manages
//! - Resource: discriminates connection and cursor in release failures
//! - DEFAULT_SLOT: slot name used when none is given
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BoxError, Error, Result};
pub use traits::{Connection, Cursor};
pub use types::{Resource, DEFAULT_SLOT};
