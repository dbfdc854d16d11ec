//! Parcel schema versions.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one; the applied version is
//!   mirrored to `PRAGMA user_version`.
//! - An upgrade runs in one `IMMEDIATE` transaction: the version check and
//!   every pending step commit together or not at all.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// One upgrade of the `parcel` storage shape.
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const PARCEL_SCHEMA: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "create_parcel_table",
    sql: include_str!("0001_init.sql"),
}];

/// Parcel schema version this build writes and expects.
pub fn latest_version() -> u32 {
    PARCEL_SCHEMA.last().map_or(0, |step| step.version)
}

/// Reads the parcel schema version recorded on `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings the parcel schema on `conn` up to [`latest_version`].
///
/// Returns the version found before the upgrade.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let found = schema_version(&tx)?;
    let latest = latest_version();

    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    for step in PARCEL_SCHEMA.iter().filter(|step| step.version > found) {
        tx.execute_batch(step.sql)
            .map_err(|source| DbError::Migration {
                version: step.version,
                step: step.name,
                source,
            })?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            step.version, step.name
        );
    }

    tx.commit()?;
    Ok(found)
}
