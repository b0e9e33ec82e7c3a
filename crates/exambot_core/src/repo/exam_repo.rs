//! Exam repository contract and SQLite implementation.
//!
//! # Invariants
//! - Dates are written in the canonical RFC 3339 form only.
//! - Insert checks uniqueness and writes in one statement, so no reader can
//!   observe a half-created record.

use crate::db::migrations::{latest_version, schema_state, SchemaState};
use crate::db::DbError;
use crate::model::exam::ExamRecord;
use crate::time::codec::{parse_canonical, to_canonical};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EXAM_SELECT_SQL: &str = "SELECT name, date FROM exams";
const REQUIRED_EXAM_COLUMNS: &[&str] = &["name", "date"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for exam persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(String),
    AlreadyExists(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "exam not found: {name}"),
            Self::AlreadyExists(name) => write!(f, "exam already exists: {name}"),
            Self::InvalidData(message) => write!(f, "invalid persisted exam data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

/// Repository interface for exam CRUD operations.
pub trait ExamRepository {
    /// Inserts `exam` unless its name is taken (`AlreadyExists`).
    fn insert_if_absent(&self, exam: &ExamRecord) -> RepoResult<()>;
    fn get(&self, name: &str) -> RepoResult<Option<ExamRecord>>;
    /// Overwrites the date of an existing exam (`NotFound` otherwise).
    fn update_date(&self, exam: &ExamRecord) -> RepoResult<()>;
    fn delete(&self, name: &str) -> RepoResult<()>;
    fn list(&self) -> RepoResult<Vec<ExamRecord>>;
}

/// SQLite-backed exam repository.
pub struct SqliteExamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExamRepository<'conn> {
    /// Wraps a connection that went through `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not carry the `exams` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        match schema_state(conn)? {
            SchemaState::UpToDate => {}
            SchemaState::Behind { found } | SchemaState::Ahead { found } => {
                return Err(RepoError::UninitializedConnection {
                    expected_version: latest_version(),
                    actual_version: found,
                });
            }
        }

        ensure_exams_schema(conn)?;
        Ok(Self { conn })
    }
}

impl ExamRepository for SqliteExamRepository<'_> {
    fn insert_if_absent(&self, exam: &ExamRecord) -> RepoResult<()> {
        let changed = self.conn.execute(
            "INSERT INTO exams (name, date) VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING;",
            params![exam.name.as_str(), to_canonical(&exam.date)],
        )?;

        if changed == 0 {
            return Err(RepoError::AlreadyExists(exam.name.clone()));
        }

        Ok(())
    }

    fn get(&self, name: &str) -> RepoResult<Option<ExamRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("{EXAM_SELECT_SQL} WHERE name = ?1;"),
                [name],
                read_raw_row,
            )
            .optional()?;

        row.map(parse_exam_row).transpose()
    }

    fn update_date(&self, exam: &ExamRecord) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE exams SET date = ?1 WHERE name = ?2;",
            params![to_canonical(&exam.date), exam.name.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(exam.name.clone()));
        }

        Ok(())
    }

    fn delete(&self, name: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM exams WHERE name = ?1;", [name])?;

        if changed == 0 {
            return Err(RepoError::NotFound(name.to_string()));
        }

        Ok(())
    }

    fn list(&self) -> RepoResult<Vec<ExamRecord>> {
        let mut stmt = self.conn.prepare(&format!("{EXAM_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut exams = Vec::new();

        while let Some(row) = rows.next()? {
            exams.push(parse_exam_row(read_raw_row(row)?)?);
        }

        // Text order of RFC 3339 values breaks across offsets; sort on instants.
        exams.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        Ok(exams)
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get("name")?, row.get("date")?))
}

fn parse_exam_row((name, date_text): (String, String)) -> RepoResult<ExamRecord> {
    let date = parse_canonical(&date_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date value `{date_text}` in exams.date for `{name}`"
        ))
    })?;
    Ok(ExamRecord { name, date })
}

fn ensure_exams_schema(conn: &Connection) -> RepoResult<()> {
    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'exams'
        );",
        [],
        |row| row.get(0),
    )?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable("exams"));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('exams');")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for &column in REQUIRED_EXAM_COLUMNS {
        if !columns.iter().any(|existing| existing == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "exams",
                column,
            });
        }
    }

    Ok(())
}
