//! Project record.
//!
//! # Responsibility
//! - Define the canonical project row shared by store, resolver and search.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `project_id` is non-blank and never changes after creation.
//! - An empty `parent_proj_id` marks a root project.
//! - `deleted` is the source of truth for tombstone state.

use crate::model::coordinate::{CoordinateError, GeoPoint};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Placeholder label for projects created without a location.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Project identifiers are caller-chosen strings; the id doubles as the
/// project name for by-name lookups.
pub type ProjectId = String;

/// Write-path validation failures for project records.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectValidationError {
    EmptyProjectId,
    /// Ids are matched verbatim, so surrounding whitespace would make the
    /// row unreachable by name.
    PaddedProjectId(ProjectId),
    /// A project cannot name itself as parent.
    SelfParent(ProjectId),
    Coordinate(CoordinateError),
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProjectId => write!(f, "project_id must not be blank"),
            Self::PaddedProjectId(id) => {
                write!(f, "project_id `{id}` has leading or trailing whitespace")
            }
            Self::SelfParent(id) => write!(f, "project `{id}` cannot be its own parent"),
            Self::Coordinate(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Coordinate(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoordinateError> for ProjectValidationError {
    fn from(value: CoordinateError) -> Self {
        Self::Coordinate(value)
    }
}

/// Canonical project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    /// Empty for root projects.
    pub parent_proj_id: ProjectId,
    pub description: String,
    /// Human-readable place label (province, city, district).
    pub location: String,
    /// `None` keeps the project out of proximity search.
    pub coordinate: Option<GeoPoint>,
    /// Epoch ms, assigned by the store on insert.
    pub create_time: i64,
    /// Epoch ms, refreshed by the store on every write.
    pub last_update: i64,
    pub deleted: bool,
}

impl Project {
    /// Creates a root project with default description and location.
    ///
    /// Timestamps stay zero until the store assigns them.
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
            parent_proj_id: String::new(),
            description: String::new(),
            location: UNKNOWN_LOCATION.to_string(),
            coordinate: None,
            create_time: 0,
            last_update: 0,
            deleted: false,
        }
    }

    /// Creates a project placed under `parent_proj_id`.
    pub fn with_parent(
        project_id: impl Into<ProjectId>,
        parent_proj_id: impl Into<ProjectId>,
    ) -> Self {
        Self {
            parent_proj_id: parent_proj_id.into(),
            ..Self::new(project_id)
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn coordinate(mut self, coordinate: GeoPoint) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Validates write-path invariants.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.project_id.trim().is_empty() {
            return Err(ProjectValidationError::EmptyProjectId);
        }
        if self.project_id.trim() != self.project_id {
            return Err(ProjectValidationError::PaddedProjectId(
                self.project_id.clone(),
            ));
        }
        if self.parent_proj_id == self.project_id {
            return Err(ProjectValidationError::SelfParent(self.project_id.clone()));
        }
        if let Some(coordinate) = &self.coordinate {
            coordinate.validate()?;
        }
        Ok(())
    }

    pub fn is_root(&self) -> bool {
        self.parent_proj_id.is_empty()
    }

    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }

    pub fn restore(&mut self) {
        self.deleted = false;
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Extracts the mutable subset of this record.
    pub fn to_update(&self) -> ProjectUpdate {
        ProjectUpdate {
            description: self.description.clone(),
            location: self.location.clone(),
            coordinate: self.coordinate,
        }
    }
}

/// Location as persisted: blank input falls back to `UNKNOWN_LOCATION`.
pub fn stored_location(location: &str) -> &str {
    if location.trim().is_empty() {
        UNKNOWN_LOCATION
    } else {
        location
    }
}

/// Fields an update may overwrite. Parent and identity are not part of it,
/// so there is no re-parenting path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub description: String,
    pub location: String,
    pub coordinate: Option<GeoPoint>,
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if let Some(coordinate) = &self.coordinate {
            coordinate.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{stored_location, Project, ProjectValidationError, UNKNOWN_LOCATION};
    use crate::model::coordinate::GeoPoint;

    #[test]
    fn new_sets_root_defaults() {
        let project = Project::new("alpha");
        assert!(project.is_root());
        assert!(project.is_active());
        assert_eq!(project.location, UNKNOWN_LOCATION);
        assert_eq!(project.coordinate, None);
    }

    #[test]
    fn validate_rejects_blank_id_and_self_parent() {
        assert_eq!(
            Project::new("   ").validate(),
            Err(ProjectValidationError::EmptyProjectId)
        );
        assert_eq!(
            Project::with_parent("loop", "loop").validate(),
            Err(ProjectValidationError::SelfParent("loop".to_string()))
        );
    }

    #[test]
    fn validate_rejects_padded_id() {
        assert_eq!(
            Project::new(" x ").validate(),
            Err(ProjectValidationError::PaddedProjectId(" x ".to_string()))
        );
        assert!(Project::new("x").validate().is_ok());
    }

    #[test]
    fn blank_location_falls_back_to_unknown() {
        assert_eq!(stored_location(""), UNKNOWN_LOCATION);
        assert_eq!(stored_location("  \t"), UNKNOWN_LOCATION);
        assert_eq!(stored_location("Nairobi"), "Nairobi");
    }

    #[test]
    fn validate_checks_unchecked_coordinates() {
        let project = Project::new("far").coordinate(GeoPoint {
            latitude: 120.0,
            longitude: 0.0,
        });
        assert!(matches!(
            project.validate(),
            Err(ProjectValidationError::Coordinate(_))
        ));
    }

    #[test]
    fn soft_delete_and_restore_toggle_activity() {
        let mut project = Project::new("beta");
        project.soft_delete();
        assert!(!project.is_active());
        project.restore();
        assert!(project.is_active());
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let project = Project::with_parent("child", "root")
            .description("site survey")
            .coordinate(GeoPoint::new(1.5, 2.5).unwrap());
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["project_id"], "child");
        assert_eq!(json["parent_proj_id"], "root");
        assert_eq!(json["coordinate"]["latitude"], 1.5);
        assert_eq!(json["deleted"], false);
    }
}
