//! Parcel repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/mutate APIs over the `parcel` table.
//! - Enforce the lifecycle guard: address edits and deletion only while a
//!   parcel is `registered`.
//!
//! # Invariants
//! - Write paths call `Parcel::validate()` (or `validate_address`) before SQL.
//! - Read paths return rows as stored. Only a status outside the vocabulary
//!   is treated as corruption (`InvalidData`).
//! - Guarded mutations are one conditional statement inside an immediate
//!   transaction; the guard read and the write cannot interleave with
//!   another writer.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::parcel::{
    validate_address, ClientId, Parcel, ParcelId, ParcelStatus, ParcelValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

const PARCEL_COLUMNS: [&str; 5] = ["number", "client", "status", "address", "created_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from parcel persistence and lifecycle guards.
#[derive(Debug)]
pub enum RepoError {
    /// Record-level invariant rejected before persistence.
    Validation(ParcelValidationError),
    /// Underlying SQLite failure.
    Db(DbError),
    /// No parcel with this number.
    NotFound(ParcelId),
    /// Guarded mutation attempted outside `registered`.
    InvalidState {
        number: ParcelId,
        status: ParcelStatus,
    },
    /// Persisted row cannot be converted to a valid parcel.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::InvalidState { number, status } => write!(
                f,
                "parcel {number} is `{status}`; only `registered` parcels can be changed or deleted"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "parcel repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "parcel repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "parcel repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidState { .. } => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ParcelValidationError> for RepoError {
    fn from(value: ParcelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for parcel lifecycle operations.
pub trait ParcelRepository {
    /// Inserts a parcel and returns the storage-assigned number.
    ///
    /// `parcel.number` is ignored.
    fn add_parcel(&self, parcel: &Parcel) -> RepoResult<ParcelId>;
    /// Loads one parcel by number.
    fn get_parcel(&self, number: ParcelId) -> RepoResult<Parcel>;
    /// Lists every parcel owned by `client`. Empty when none exist.
    fn list_client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
    /// Sets status unconditionally. Regressions are allowed.
    fn set_status(&self, number: ParcelId, status: ParcelStatus) -> RepoResult<()>;
    /// Replaces the address of a `registered` parcel.
    fn set_address(&self, number: ParcelId, address: &str) -> RepoResult<()>;
    /// Physically removes a `registered` parcel.
    fn delete_parcel(&self, number: ParcelId) -> RepoResult<()>;
}

/// SQLite-backed parcel repository.
pub struct SqliteParcelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails when the schema version or `parcel` table shape does not match
    /// what this binary expects.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_parcel_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParcelRepository for SqliteParcelRepository<'_> {
    fn add_parcel(&self, parcel: &Parcel) -> RepoResult<ParcelId> {
        parcel.validate()?;

        self.conn.execute(
            "INSERT INTO parcel (
                client,
                status,
                address,
                created_at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_parcel(&self, number: ParcelId) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let mut rows = stmt.query([number])?;
        if let Some(row) = rows.next()? {
            return parse_parcel_row(row);
        }

        Err(RepoError::NotFound(number))
    }

    fn list_client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARCEL_SELECT_SQL}
             WHERE client = ?1
             ORDER BY number ASC;"
        ))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }

    fn set_status(&self, number: ParcelId, status: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?2 WHERE number = ?1;",
            params![number, status.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        Ok(())
    }

    fn set_address(&self, number: ParcelId, address: &str) -> RepoResult<()> {
        validate_address(address)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE parcel
             SET address = ?2
             WHERE number = ?1
               AND status = ?3;",
            params![number, address, ParcelStatus::Registered.as_str()],
        )?;

        if changed == 0 {
            return Err(guard_rejection(&tx, number)?);
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_parcel(&self, number: ParcelId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "DELETE FROM parcel
             WHERE number = ?1
               AND status = ?2;",
            params![number, ParcelStatus::Registered.as_str()],
        )?;

        if changed == 0 {
            return Err(guard_rejection(&tx, number)?);
        }

        tx.commit()?;
        Ok(())
    }
}

/// Classifies why a guarded statement touched no rows.
///
/// Runs inside the caller's transaction so the status read matches the state
/// the conditional write saw.
fn guard_rejection(tx: &Transaction<'_>, number: ParcelId) -> RepoResult<RepoError> {
    let status_text: Option<String> = tx
        .query_row(
            "SELECT status FROM parcel WHERE number = ?1;",
            [number],
            |row| row.get(0),
        )
        .optional()?;

    match status_text {
        None => Ok(RepoError::NotFound(number)),
        Some(text) => {
            let status = parse_status(&text)?;
            Ok(RepoError::InvalidState { number, status })
        }
    }
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let status_text: String = row.get("status")?;
    let parcel = Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status: parse_status(&status_text)?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    };
    Ok(parcel)
}

fn parse_status(value: &str) -> RepoResult<ParcelStatus> {
    ParcelStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid parcel status `{value}` in parcel.status"))
    })
}

fn ensure_parcel_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "parcel")? {
        return Err(RepoError::MissingRequiredTable("parcel"));
    }

    for column in PARCEL_COLUMNS {
        if !table_has_column(conn, "parcel", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "parcel",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
