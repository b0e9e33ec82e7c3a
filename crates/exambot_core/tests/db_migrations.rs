use exambot_core::db::migrations::latest_version;
use exambot_core::db::{open_db, open_db_in_memory, DbError};
use exambot_core::{RepoError, SqliteExamRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "exams");
}

#[test]
fn reopening_file_database_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exams.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO exams (name, date) VALUES ('final', '2030-07-01T00:00:00+02:00');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let stored: String = conn
        .query_row("SELECT date FROM exams WHERE name = 'final';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, "2030-07-01T00:00:00+02:00");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(err.to_string().contains("schema version 999"));
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteExamRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_missing_table_and_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();
    assert!(matches!(
        SqliteExamRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("exams"))
    ));

    conn.execute_batch("CREATE TABLE exams (name TEXT PRIMARY KEY NOT NULL);")
        .unwrap();
    assert!(matches!(
        SqliteExamRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "exams",
            column: "date"
        })
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
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
