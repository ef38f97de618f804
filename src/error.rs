//! Error types for the SQLite wrapper.

use std::path::PathBuf;

/// Errors returned by every fallible operation in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The database file must already exist but does not.
    #[error("database file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    /// Open, compile, bind, step or write failure reported by SQLite.
    #[error("sqlite error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// A row was requested after the end of the result set.
    #[error("no current row")]
    NoCurrentRow,

    /// The existence check on the database path failed.
    #[error("cannot inspect database path {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An update was requested with nothing to set.
    #[error("update of table `{table}` has no columns to set")]
    EmptyUpdate { table: String },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;
