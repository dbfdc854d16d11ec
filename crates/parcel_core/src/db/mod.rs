//! Parcel storage bootstrap.
//!
//! `open_db*` hand out connections whose `parcel` schema is at
//! [`migrations::latest_version`]. Every storage failure below the repository
//! surfaces as [`DbError`], which the repository reports as `RepoError::Db`.

use rusqlite::Error as SqliteError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Store-level fault: connection, statement, or parcel schema upgrade.
#[derive(Debug)]
pub enum DbError {
    /// Statement or connection failure reported by SQLite.
    Sqlite(SqliteError),
    /// The file was written by a newer build; it is left untouched.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A parcel schema step failed; the whole upgrade was rolled back.
    Migration {
        version: u32,
        step: &'static str,
        source: SqliteError,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "parcel store error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "parcel store is at schema version {db_version}; this build supports up to {latest_supported}"
            ),
            Self::Migration {
                version,
                step,
                source,
            } => write!(f, "parcel schema step {version} `{step}` failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<SqliteError> for DbError {
    fn from(value: SqliteError) -> Self {
        Self::Sqlite(value)
    }
}
