//! SQLite record mapping and cursor utilities for the Runar ecosystem.
//!
//! # Intention
//!
//! - Provide a small, blocking wrapper over one SQLite connection.
//! - Map application records to bound INSERT/UPDATE parameters, and
//!   result rows back into records, through a per-type field description.
//! - Expose query results as a forward-only cursor with an explicit
//!   end-of-results flag.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - SQL parsing, transactions, locking and the file format stay with
//!   SQLite (through `rusqlite`).
//! - No pooling, migrations or dialect abstraction.
//! - Errors are returned, never turned into panics or process exits.

pub mod cursor;
pub mod error;
pub mod record;
pub mod sql;
pub mod sqlite;
pub mod value;

pub use cursor::{Cursor, Records};
pub use error::{Error, Result};
pub use record::{populate_record, ColumnIndex, ColumnMap, ColumnType, FieldDef, FieldKind, Record};
pub use sql::StatementKind;
pub use sqlite::{Database, SqliteConfig, Statement, WriteOutcome};
pub use value::Value;

pub use rusqlite::params;
