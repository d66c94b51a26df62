//! Driver traits for connection and cursor abstraction
//!
//! The registry never talks to a database itself. Callers plug in a driver
//! by implementing these traits for their connection and cursor types.
//! Query execution and result iteration stay on the driver's own API; the
//! registry only needs to create and dispose of the resources.

/// Cursor derived from a [`Connection`]
pub trait Cursor: 'static {
    /// Driver error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Release the cursor
    ///
    /// Called exactly once by the registry, before the owning connection is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the cursor could not be released.
    fn close(&self) -> Result<(), Self::Error>;
}

/// Database connection
///
/// Transaction boundaries belong to the code running inside a scope: the
/// registry never calls `commit` or `rollback`.
pub trait Connection: 'static {
    /// Cursor type produced by [`Connection::cursor`]
    type Cursor: Cursor<Error = Self::Error>;

    /// Driver error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a cursor on this connection
    ///
    /// This is the default cursor factory.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the cursor could not be opened.
    fn cursor(&self) -> Result<Self::Cursor, Self::Error>;

    /// Commit pending work
    ///
    /// # Errors
    ///
    /// Returns the driver error if the commit failed.
    fn commit(&self) -> Result<(), Self::Error>;

    /// Discard pending work
    ///
    /// # Errors
    ///
    /// Returns the driver error if the rollback failed.
    fn rollback(&self) -> Result<(), Self::Error>;

    /// Release the connection
    ///
    /// Called exactly once by the registry, after the cursor was closed.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the connection could not be released.
    fn close(&self) -> Result<(), Self::Error>;
}
