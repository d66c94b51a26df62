//! Core types for transaction scopes
//!
//! This module defines the foundational types:
//! - DEFAULT_SLOT: the slot used when a call site does not name one
//! - Resource: discriminates the two driver resources a scope owns

use std::fmt;

/// Slot name used when a call site does not pick one
pub const DEFAULT_SLOT: &str = "default";

/// Driver resource held by an active scope
///
/// Used to label release failures so callers can tell which half of the
/// (connection, cursor) pair refused to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The connection produced by the connection factory
    Connection,
    /// The cursor derived from that connection
    Cursor,
}

impl Resource {
    /// Lowercase name used in log fields and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Connection => "connection",
            Resource::Cursor => "cursor",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
