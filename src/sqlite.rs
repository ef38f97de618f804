use rusqlite::{params_from_iter, Connection, OpenFlags, Params};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::record::{ColumnMap, Record};
use crate::sql::{self, StatementKind};
use crate::value::Value;

const MEMORY_PATH: &str = ":memory:";

/// SQLite database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file, or `:memory:`
    pub db_path: PathBuf,
    /// Create the file when it does not exist. When false, opening a
    /// missing path fails with [`Error::NotFound`].
    #[serde(default)]
    pub create_if_missing: bool,
}

impl SqliteConfig {
    /// Create a new SQLite config for an existing database file
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            create_if_missing: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    fn is_memory(&self) -> bool {
        self.db_path.as_os_str() == MEMORY_PATH
    }
}

/// Counters reported by SQLite after a write.
///
/// Both counters are read after every write. `last_insert_id` is the
/// connection-wide rowid of the most recent successful INSERT, so after an
/// UPDATE it still names an earlier insert; use [`inserted_id`] and
/// [`rows_affected`] to read only the counter that matches the statement.
///
/// [`inserted_id`]: WriteOutcome::inserted_id
/// [`rows_affected`]: WriteOutcome::rows_affected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub kind: StatementKind,
    pub changes: usize,
    pub last_insert_id: i64,
}

impl WriteOutcome {
    /// Rowid of the inserted row, only for INSERT-shaped statements that
    /// changed a row. `INSERT OR IGNORE` skipping a conflict gives `None`
    /// rather than the rowid of an earlier insert.
    pub fn inserted_id(&self) -> Option<i64> {
        (self.kind == StatementKind::Insert && self.changes > 0).then_some(self.last_insert_id)
    }

    /// Rows changed, only for statements that are not INSERT-shaped.
    pub fn rows_affected(&self) -> Option<usize> {
        (self.kind != StatementKind::Insert).then_some(self.changes)
    }
}

/// A single open SQLite database.
///
/// Owns one connection. Not `Sync`: share it across threads only behind
/// a mutex. The connection is closed when the value is dropped or passed
/// to [`Database::close`].
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens the database described by `config`.
    ///
    /// Without `create_if_missing` the path must already exist; an existing
    /// empty file opens as an empty database. No transaction is started.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let path = config.db_path.clone();
        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else if config.create_if_missing {
            Connection::open(&path)?
        } else {
            let exists = path.try_exists().map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            if !exists {
                return Err(Error::NotFound(path));
            }
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(&path, flags)?
        };
        info!(path = %path.display(), "opened sqlite database");
        Ok(Self { conn, path })
    }

    pub fn open_path(path: impl AsRef<Path>, create_if_missing: bool) -> Result<Self> {
        Self::open(&SqliteConfig::new(path.as_ref()).with_create_if_missing(create_if_missing))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&SqliteConfig::in_memory())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying rusqlite connection, for anything this wrapper
    /// does not cover (transactions, pragmas, ...).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Compiles `sql` into a statement that can be queried repeatedly.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        debug!(sql, "preparing statement");
        let inner = self.conn.prepare(sql)?;
        Ok(Statement { inner })
    }

    /// Runs `sql`, which must not return rows, with positional `params`.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<WriteOutcome> {
        let changes = self.conn.execute(sql, params)?;
        let outcome = WriteOutcome {
            kind: StatementKind::classify(sql),
            changes,
            last_insert_id: self.conn.last_insert_rowid(),
        };
        debug!(
            sql,
            changes = outcome.changes,
            last_insert_id = outcome.last_insert_id,
            "executed statement"
        );
        Ok(outcome)
    }

    /// Runs semicolon-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(sql, "executing batch");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Runs a query and hands its cursor to `f`. The statement lives only
    /// for the duration of the call.
    pub fn query<P, T, F>(&self, sql: &str, params: P, f: F) -> Result<T>
    where
        P: Params,
        F: FnOnce(&mut Cursor<'_>) -> Result<T>,
    {
        let mut stmt = self.prepare(sql)?;
        let mut cursor = stmt.query(params)?;
        f(&mut cursor)
    }

    /// All rows of a query as records.
    pub fn query_records<R: Record, P: Params>(&self, sql: &str, params: P) -> Result<Vec<R>> {
        self.query(sql, params, |cursor| cursor.collect_records())
    }

    /// First row of a query as a record; [`Error::NoCurrentRow`] when the
    /// query returns nothing.
    pub fn query_record<R: Record, P: Params>(&self, sql: &str, params: P) -> Result<R> {
        self.query(sql, params, |cursor| {
            let mut record = R::default();
            if cursor.fetch(&mut record)? {
                Ok(record)
            } else {
                Err(Error::NoCurrentRow)
            }
        })
    }

    /// Inserts one row from a column map, binding every value as text.
    /// An empty map inserts a row of defaults.
    pub fn insert_map(&self, table: &str, data: &ColumnMap) -> Result<WriteOutcome> {
        let stmt = sql::insert_statement(table, data.keys().map(String::as_str));
        self.execute(&stmt, params_from_iter(data.values()))
    }

    /// Inserts the set fields of `record`, bound with their own types.
    pub fn insert_record<R: Record>(&self, table: &str, record: &R) -> Result<WriteOutcome> {
        let values = record.to_values();
        let stmt = sql::insert_statement(table, values.keys().copied());
        self.execute(&stmt, params_from_iter(values.values()))
    }

    /// Updates rows from a column map. `where_clause` may use `?`
    /// placeholders, bound from `where_params` after the SET values.
    pub fn update_map(
        &self,
        table: &str,
        data: &ColumnMap,
        where_clause: Option<&str>,
        where_params: &[Value],
    ) -> Result<WriteOutcome> {
        if data.is_empty() {
            return Err(Error::EmptyUpdate {
                table: table.to_string(),
            });
        }
        let stmt = sql::update_statement(table, data.keys().map(String::as_str), where_clause);
        let params = data
            .values()
            .map(|v| Value::Text(v.clone()))
            .chain(where_params.iter().cloned());
        self.execute(&stmt, params_from_iter(params))
    }

    /// Updates rows with the set fields of `record`.
    pub fn update_record<R: Record>(
        &self,
        table: &str,
        record: &R,
        where_clause: Option<&str>,
        where_params: &[Value],
    ) -> Result<WriteOutcome> {
        let values = record.to_values();
        if values.is_empty() {
            return Err(Error::EmptyUpdate {
                table: table.to_string(),
            });
        }
        let stmt = sql::update_statement(table, values.keys().copied(), where_clause);
        let params = values.into_values().chain(where_params.iter().cloned());
        self.execute(&stmt, params_from_iter(params))
    }

    /// Closes the connection, reporting any failure to do so.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, err)| Error::Engine(err))?;
        info!(path = %path.display(), "closed sqlite database");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A compiled statement.
///
/// Each [`query`](Statement::query) replaces the previous cursor: the
/// borrow checker keeps an earlier cursor, and its column positions, from
/// outliving the next query.
pub struct Statement<'conn> {
    inner: rusqlite::Statement<'conn>,
}

impl<'conn> Statement<'conn> {
    /// Binds `params` positionally and steps to the first row.
    pub fn query<P: Params>(&mut self, params: P) -> Result<Cursor<'_>> {
        let names = self.column_names();
        let rows = self.inner.query(params)?;
        Cursor::open(rows, names)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.inner
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn column_count(&self) -> usize {
        self.inner.column_count()
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("columns", &self.column_names())
            .finish_non_exhaustive()
    }
}
