//! Shared test utilities for the integration test suites.
//!
//! Provides a small sqlite driver on top of `rusqlite` that behaves like a
//! DB-API connection: work runs inside an implicit transaction that
//! `commit` ends and restarts, `close` discards anything uncommitted, and
//! the cursor buffers the rows of its last statement.
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use rusqlite::types::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;
use transact::{Connection, Cursor};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

pub const CREATE_PERSONS: &str = "CREATE TABLE IF NOT EXISTS persons (
    id integer PRIMARY KEY,
    name text NOT NULL
)";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] transact::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0}")]
    Rejected(String),
}

// ============================================================================
// SqliteConnection
// ============================================================================

/// sqlite connection with an implicit transaction always open
#[derive(Debug)]
pub struct SqliteConnection {
    id: u64,
    conn: Rc<rusqlite::Connection>,
    closes: Cell<u32>,
}

impl SqliteConnection {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(2))?;
        conn.execute_batch("BEGIN")?;
        Ok(SqliteConnection {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            conn: Rc::new(conn),
            closes: Cell::new(0),
        })
    }

    /// Process-unique id, comparable across threads
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn close_count(&self) -> u32 {
        self.closes.get()
    }
}

impl Connection for SqliteConnection {
    type Cursor = SqliteCursor;
    type Error = rusqlite::Error;

    fn cursor(&self) -> rusqlite::Result<SqliteCursor> {
        Ok(SqliteCursor {
            conn: Rc::clone(&self.conn),
            rows: RefCell::new(VecDeque::new()),
            closes: Cell::new(0),
        })
    }

    fn commit(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch("COMMIT; BEGIN")
    }

    fn rollback(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch("ROLLBACK; BEGIN")
    }

    fn close(&self) -> rusqlite::Result<()> {
        self.closes.set(self.closes.get() + 1);
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

// ============================================================================
// SqliteCursor
// ============================================================================

/// Cursor buffering the rows of the last executed statement
#[derive(Debug)]
pub struct SqliteCursor {
    conn: Rc<rusqlite::Connection>,
    rows: RefCell<VecDeque<Vec<Value>>>,
    closes: Cell<u32>,
}

impl SqliteCursor {
    pub fn execute<P: rusqlite::Params>(&self, sql: &str, params: P) -> rusqlite::Result<()> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = stmt.column_count();
        let mut buffered = VecDeque::new();
        {
            let mut rows = stmt.query(params)?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns);
                for i in 0..columns {
                    values.push(row.get::<_, Value>(i)?);
                }
                buffered.push_back(values);
            }
        }
        *self.rows.borrow_mut() = buffered;
        Ok(())
    }

    pub fn fetchone(&self) -> Option<Vec<Value>> {
        self.rows.borrow_mut().pop_front()
    }

    pub fn fetchall(&self) -> Vec<Vec<Value>> {
        self.rows.borrow_mut().drain(..).collect()
    }

    pub fn close_count(&self) -> u32 {
        self.closes.get()
    }
}

impl Cursor for SqliteCursor {
    type Error = rusqlite::Error;

    fn close(&self) -> rusqlite::Result<()> {
        self.closes.set(self.closes.get() + 1);
        self.rows.borrow_mut().clear();
        Ok(())
    }
}

// ============================================================================
// TestDb - database file in a temp dir
// ============================================================================

pub struct TestDb {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persons.db");
        TestDb { dir, path }
    }

    /// Connection factory for this database
    pub fn connector(&self) -> impl Fn() -> rusqlite::Result<SqliteConnection> + Send + Sync + Clone {
        let path = self.path.clone();
        move || SqliteConnection::open(&path)
    }

    /// Committed rows of `persons`, read through an independent connection
    pub fn persons(&self) -> Vec<(i64, String)> {
        let conn = rusqlite::Connection::open(&self.path).unwrap();
        let mut stmt = conn
            .prepare("SELECT id, name FROM persons ORDER BY id")
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        rows.collect::<rusqlite::Result<Vec<_>>>().unwrap()
    }
}

/// Decode a `(id, name)` row fetched from `persons`
pub fn person(row: &[Value]) -> (i64, String) {
    match (&row[0], &row[1]) {
        (Value::Integer(id), Value::Text(name)) => (*id, name.clone()),
        other => panic!("unexpected row: {other:?}"),
    }
}
