use parcel_core::db::migrations::latest_version;
use parcel_core::db::{open_db, open_db_in_memory, DbError};
use parcel_core::{Parcel, ParcelRepository, SqliteParcelRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "parcel");

    let columns = table_columns(&conn, "parcel");
    for column in ["number", "client", "status", "address", "created_at"] {
        assert!(columns.iter().any(|name| name == column), "missing {column}");
    }
}

#[test]
fn reopening_file_database_is_idempotent_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parcels.db");

    let conn_first = open_db(&path).unwrap();
    let id = SqliteParcelRepository::try_new(&conn_first)
        .unwrap()
        .add_parcel(&Parcel::new(7, "harbour road 3"))
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let stored = SqliteParcelRepository::try_new(&conn_second)
        .unwrap()
        .get_parcel(id)
        .unwrap();
    assert_eq!(stored.address, "harbour road 3");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_schema_step_rolls_back_whole_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflict.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE idx_parcel_client (id INTEGER);")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 1),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    let parcel_tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'parcel';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(parcel_tables, 0);
}

#[test]
fn status_column_rejects_unknown_values() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO parcel (client, status, address, created_at)
         VALUES (1, 'lost', 'street 1', '2024-03-01T10:15:00Z');",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});")).unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        columns.push(row.get(1).unwrap());
    }
    columns
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
