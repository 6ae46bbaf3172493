use crate::model::coordinate::CoordinateError;
use crate::model::project::{ProjectId, ProjectValidationError};
use crate::repo::hierarchy::PathError;
use crate::repo::project_store::StoreError;
use crate::search::proximity::SearchError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ProjectResult<T> = Result<T, ProjectError>;

/// Failures surfaced by `ProjectRepository` and `ProjectManager`.
#[derive(Debug)]
pub enum ProjectError {
    NotFound(ProjectId),
    ParentNotFound(ProjectId),
    Duplicate(ProjectId),
    Validation(ProjectValidationError),
    MalformedCoordinate {
        project_id: Option<ProjectId>,
        source: CoordinateError,
    },
    CycleDetected {
        project_id: ProjectId,
    },
    DepthExceeded {
        limit: usize,
    },
    InvalidRadius(f64),
    /// Store I/O or schema failure, propagated unchanged.
    Store(StoreError),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent project not found: {id}"),
            Self::Duplicate(id) => write!(f, "project already exists: {id}"),
            Self::Validation(err) => write!(f, "invalid project: {err}"),
            Self::MalformedCoordinate {
                project_id: Some(id),
                source,
            } => write!(f, "project {id} has {source}"),
            Self::MalformedCoordinate {
                project_id: None,
                source,
            } => write!(f, "{source}"),
            Self::CycleDetected { project_id } => {
                write!(f, "ancestry cycle detected at project {project_id}")
            }
            Self::DepthExceeded { limit } => write!(f, "ancestry walk exceeded {limit} hops"),
            Self::InvalidRadius(radius) => write!(f, "invalid search radius {radius} km"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::MalformedCoordinate { source, .. } => Some(source),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ProjectError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::ParentNotFound(id) => Self::ParentNotFound(id),
            StoreError::Duplicate(id) => Self::Duplicate(id),
            StoreError::Validation(ProjectValidationError::Coordinate(source)) => {
                Self::MalformedCoordinate {
                    project_id: None,
                    source,
                }
            }
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::MalformedCoordinate { project_id, source } => Self::MalformedCoordinate {
                project_id: Some(project_id),
                source,
            },
            other => Self::Store(other),
        }
    }
}

impl From<ProjectValidationError> for ProjectError {
    fn from(value: ProjectValidationError) -> Self {
        StoreError::Validation(value).into()
    }
}

impl From<PathError> for ProjectError {
    fn from(value: PathError) -> Self {
        match value {
            PathError::NotFound(id) => Self::NotFound(id),
            PathError::CycleDetected { project_id } => Self::CycleDetected { project_id },
            PathError::DepthExceeded { limit } => Self::DepthExceeded { limit },
            PathError::Store(err) => err.into(),
        }
    }
}

impl From<SearchError> for ProjectError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::InvalidRadius(radius) => Self::InvalidRadius(radius),
            SearchError::Store(err) => err.into(),
        }
    }
}
