//! Root-to-leaf ancestry resolution over parent references.
//!
//! # Invariants
//! - Each hop is one `find_by_id` lookup; soft-deleted ancestors are kept.
//! - A dangling parent reference fails the whole walk.
//! - The walk is bounded: repeats fail with `CycleDetected`, and more hops
//!   than `max_depth` (default: number of stored projects) fail with
//!   `DepthExceeded`.

use crate::model::project::{Project, ProjectId};
use crate::repo::project_store::{ProjectStore, StoreError};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum PathError {
    /// The leaf or one of its ancestors does not resolve.
    NotFound(ProjectId),
    /// `project_id` was reached twice while walking up.
    CycleDetected { project_id: ProjectId },
    DepthExceeded { limit: usize },
    Store(StoreError),
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::CycleDetected { project_id } => {
                write!(f, "ancestry cycle detected at project {project_id}")
            }
            Self::DepthExceeded { limit } => {
                write!(f, "ancestry walk exceeded {limit} hops")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PathError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for PathError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Returns the ancestry of `leaf_id` ordered root first, leaf last.
///
/// `max_depth` caps the number of parent hops; `None` uses the project count,
/// which no acyclic chain can exceed.
pub fn resolve_path<S>(
    store: &S,
    leaf_id: &str,
    max_depth: Option<usize>,
) -> Result<Vec<Project>, PathError>
where
    S: ProjectStore + ?Sized,
{
    let leaf = store
        .find_by_id(leaf_id, true)?
        .ok_or_else(|| PathError::NotFound(leaf_id.to_string()))?;

    let limit = match max_depth {
        Some(limit) => limit,
        None => usize::try_from(store.count()?).unwrap_or(usize::MAX),
    };

    let mut visited = HashSet::from([leaf.project_id.clone()]);
    let mut path = vec![leaf];
    let mut hops = 0_usize;

    loop {
        let parent_id = match path.last() {
            Some(current) if !current.is_root() => current.parent_proj_id.clone(),
            _ => break,
        };

        if !visited.insert(parent_id.clone()) {
            return Err(PathError::CycleDetected {
                project_id: parent_id,
            });
        }
        hops += 1;
        if hops > limit {
            return Err(PathError::DepthExceeded { limit });
        }

        let parent = store
            .find_by_id(&parent_id, true)?
            .ok_or(PathError::NotFound(parent_id))?;
        path.push(parent);
    }

    path.reverse();
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{resolve_path, PathError};
    use crate::db::open_db_in_memory;
    use crate::model::project::Project;
    use crate::repo::project_store::{ProjectStore, SqliteProjectStore};

    fn ids(path: &[Project]) -> Vec<&str> {
        path.iter().map(|p| p.project_id.as_str()).collect()
    }

    #[test]
    fn root_resolves_to_single_element() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteProjectStore::try_new(&conn).unwrap();
        store.create(&Project::new("root")).unwrap();

        let path = resolve_path(&store, "root", None).unwrap();
        assert_eq!(ids(&path), ["root"]);
    }

    #[test]
    fn chain_is_ordered_root_first() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteProjectStore::try_new(&conn).unwrap();
        store.create(&Project::new("a")).unwrap();
        store.create(&Project::with_parent("b", "a")).unwrap();
        store.create(&Project::with_parent("c", "b")).unwrap();

        let path = resolve_path(&store, "c", None).unwrap();
        assert_eq!(ids(&path), ["a", "b", "c"]);
    }

    #[test]
    fn explicit_depth_limit_is_enforced() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteProjectStore::try_new(&conn).unwrap();
        store.create(&Project::new("a")).unwrap();
        store.create(&Project::with_parent("b", "a")).unwrap();
        store.create(&Project::with_parent("c", "b")).unwrap();

        let err = resolve_path(&store, "c", Some(1)).unwrap_err();
        assert!(matches!(err, PathError::DepthExceeded { limit: 1 }));
        assert!(resolve_path(&store, "c", Some(2)).is_ok());
    }

    #[test]
    fn cyclic_parents_fail_fast() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteProjectStore::try_new(&conn).unwrap();
        store.create(&Project::new("a")).unwrap();
        store.create(&Project::with_parent("b", "a")).unwrap();
        store.create(&Project::with_parent("c", "b")).unwrap();
        conn.execute(
            "UPDATE projects SET parent_proj_id = 'c' WHERE project_id = 'a';",
            [],
        )
        .unwrap();

        let err = resolve_path(&store, "c", None).unwrap_err();
        assert!(matches!(err, PathError::CycleDetected { project_id } if project_id == "c"));
    }

    #[test]
    fn dangling_parent_is_a_hard_stop() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteProjectStore::try_new(&conn).unwrap();
        store.create(&Project::new("a")).unwrap();
        store.create(&Project::with_parent("b", "a")).unwrap();
        conn.execute(
            "UPDATE projects SET parent_proj_id = 'ghost' WHERE project_id = 'a';",
            [],
        )
        .unwrap();

        let err = resolve_path(&store, "b", None).unwrap_err();
        assert!(matches!(err, PathError::NotFound(id) if id == "ghost"));
    }
}
