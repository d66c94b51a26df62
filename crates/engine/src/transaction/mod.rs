//! Per-thread session management
//!
//! This module provides:
//! - Session: the (connection, cursor) pair exposed to wrapped code
//! - Thread-local slot table (no cross-thread sharing, no locking)
//! - Release guard closing cursor then connection on every exit path
//!
//! # Architecture
//!
//! The slot table uses thread-local storage to avoid synchronization:
//! - Each thread maps registry -> slot name -> session
//! - At most one session per (registry, thread, slot)
//! - Sessions are `Rc`-shared, so they cannot leave their thread

pub mod session;
pub(crate) mod slots;

pub(crate) use session::{CloseGuard, SessionGuard};
pub use session::Session;
pub(crate) use slots::{RegistryId, SlotTable};
