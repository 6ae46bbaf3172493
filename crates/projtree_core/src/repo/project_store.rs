//! Project store contract and SQLite implementation.
//!
//! # Responsibility
//! - Create, update, look up, scan and soft-delete project rows.
//! - Enforce parent existence at insert time and identifier uniqueness.
//!
//! # Invariants
//! - Parent check and insert run in one `IMMEDIATE` transaction.
//! - `scan_all` ignores the soft-delete flag; callers filter.
//! - Every write refreshes `last_update`; `create_time` is written once.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::coordinate::{CoordinateError, GeoPoint};
use crate::model::project::{
    stored_location, Project, ProjectId, ProjectUpdate, ProjectValidationError,
};
use rusqlite::{ffi, params, Connection, ErrorCode, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PROJECT_SELECT_SQL: &str = "SELECT
    project_id,
    parent_proj_id,
    description,
    location,
    coordinate,
    create_time,
    last_update,
    deleted
FROM projects";

const PROJECT_COLUMNS: [&str; 8] = [
    "project_id",
    "parent_proj_id",
    "description",
    "location",
    "coordinate",
    "create_time",
    "last_update",
    "deleted",
];

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Validation(ProjectValidationError),
    NotFound(ProjectId),
    /// Insert referenced a parent id that does not exist.
    ParentNotFound(ProjectId),
    /// Identifier already taken, including by soft-deleted rows.
    Duplicate(ProjectId),
    /// Stored coordinate text cannot be decoded.
    MalformedCoordinate {
        project_id: ProjectId,
        source: CoordinateError,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent project not found: {id}"),
            Self::Duplicate(id) => write!(f, "project already exists: {id}"),
            Self::MalformedCoordinate { project_id, source } => {
                write!(f, "project {project_id} has {source}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "project store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "project store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "project store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::MalformedCoordinate { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ProjectValidationError> for StoreError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Durable store contract for project records.
pub trait ProjectStore {
    /// Inserts a new project and returns its id.
    fn create(&self, project: &Project) -> StoreResult<ProjectId>;
    /// Overwrites description, location and coordinate.
    fn update_fields(&self, project_id: &str, update: &ProjectUpdate) -> StoreResult<()>;
    fn find_by_id(&self, project_id: &str, include_deleted: bool) -> StoreResult<Option<Project>>;
    /// Names resolve against the project identifier.
    fn find_by_name(&self, name: &str, include_deleted: bool) -> StoreResult<Option<Project>>;
    /// Every row, soft-deleted included, in insertion order.
    fn scan_all(&self) -> StoreResult<Vec<Project>>;
    /// Direct children of `parent_id`; an empty id lists roots.
    fn list_children(&self, parent_id: &str, include_deleted: bool) -> StoreResult<Vec<Project>>;
    fn set_deleted_flag(&self, project_id: &str, deleted: bool) -> StoreResult<()>;
    /// Whether the id occupies the uniqueness space (soft-deleted included).
    fn exists(&self, project_id: &str) -> StoreResult<bool>;
    fn count(&self) -> StoreResult<u64>;
}

/// SQLite-backed project store.
pub struct SqliteProjectStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectStore<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectStore for SqliteProjectStore<'_> {
    fn create(&self, project: &Project) -> StoreResult<ProjectId> {
        project.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !project.is_root() && !project_exists(&tx, &project.parent_proj_id)? {
            return Err(StoreError::ParentNotFound(project.parent_proj_id.clone()));
        }

        tx.execute(
            "INSERT INTO projects (
                project_id,
                parent_proj_id,
                description,
                location,
                coordinate,
                create_time,
                last_update,
                deleted
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                (strftime('%s', 'now') * 1000),
                (strftime('%s', 'now') * 1000),
                0
            );",
            params![
                project.project_id.as_str(),
                project.parent_proj_id.as_str(),
                project.description.as_str(),
                stored_location(&project.location),
                project.coordinate.as_ref().map(GeoPoint::to_wkt),
            ],
        )
        .map_err(|err| map_insert_error(err, &project.project_id))?;
        tx.commit()?;

        Ok(project.project_id.clone())
    }

    fn update_fields(&self, project_id: &str, update: &ProjectUpdate) -> StoreResult<()> {
        update.validate()?;

        let changed = self.conn.execute(
            "UPDATE projects
             SET
                description = ?2,
                location = ?3,
                coordinate = ?4,
                last_update = (strftime('%s', 'now') * 1000)
             WHERE project_id = ?1;",
            params![
                project_id,
                update.description.as_str(),
                stored_location(&update.location),
                update.coordinate.as_ref().map(GeoPoint::to_wkt),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(project_id.to_string()));
        }
        Ok(())
    }

    fn find_by_id(
        &self,
        project_id: &str,
        include_deleted: bool,
    ) -> StoreResult<Option<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE project_id = ?1
               AND (?2 = 1 OR deleted = 0);"
        ))?;
        let mut rows = stmt.query(params![project_id, bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn find_by_name(&self, name: &str, include_deleted: bool) -> StoreResult<Option<Project>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        self.find_by_id(name, include_deleted)
    }

    fn scan_all(&self) -> StoreResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL} ORDER BY create_time ASC, rowid ASC;"
        ))?;
        let rows = stmt.query([])?;
        collect_projects(rows)
    }

    fn list_children(&self, parent_id: &str, include_deleted: bool) -> StoreResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE parent_proj_id = ?1
               AND (?2 = 1 OR deleted = 0)
             ORDER BY create_time ASC, rowid ASC;"
        ))?;
        let rows = stmt.query(params![parent_id, bool_to_int(include_deleted)])?;
        collect_projects(rows)
    }

    fn set_deleted_flag(&self, project_id: &str, deleted: bool) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                deleted = ?2,
                last_update = (strftime('%s', 'now') * 1000)
             WHERE project_id = ?1;",
            params![project_id, bool_to_int(deleted)],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(project_id.to_string()));
        }
        Ok(())
    }

    fn exists(&self, project_id: &str) -> StoreResult<bool> {
        project_exists(self.conn, project_id)
    }

    fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative project count {count}")))
    }
}

fn project_exists(conn: &Connection, project_id: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = ?1);",
        [project_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn map_insert_error(err: rusqlite::Error, project_id: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE) =>
        {
            StoreError::Duplicate(project_id.to_string())
        }
        _ => err.into(),
    }
}

fn collect_projects(mut rows: rusqlite::Rows<'_>) -> StoreResult<Vec<Project>> {
    let mut projects = Vec::new();
    while let Some(row) = rows.next()? {
        projects.push(parse_project_row(row)?);
    }
    Ok(projects)
}

fn parse_project_row(row: &Row<'_>) -> StoreResult<Project> {
    let project_id: String = row.get("project_id")?;

    let coordinate = row
        .get::<_, Option<String>>("coordinate")?
        .map(|text| GeoPoint::from_wkt(&text))
        .transpose()
        .map_err(|source| StoreError::MalformedCoordinate {
            project_id: project_id.clone(),
            source,
        })?;

    let deleted = match row.get::<_, i64>("deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid deleted value `{other}` in projects.deleted for {project_id}"
            )));
        }
    };

    Ok(Project {
        parent_proj_id: row.get("parent_proj_id")?,
        description: row.get("description")?,
        location: row.get("location")?,
        coordinate,
        create_time: row.get("create_time")?,
        last_update: row.get("last_update")?,
        deleted,
        project_id,
    })
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'projects'
        );",
        [],
        |row| row.get(0),
    )?;
    if table_exists != 1 {
        return Err(StoreError::MissingRequiredTable("projects"));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(projects);")?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        present.push(row.get::<_, String>(1)?);
    }
    for column in PROJECT_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(StoreError::MissingRequiredColumn {
                table: "projects",
                column,
            });
        }
    }
    Ok(())
}
