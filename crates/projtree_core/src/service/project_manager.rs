//! Business-layer facade over `ProjectRepository`.
//!
//! # Responsibility
//! - Offer the use-case entry points the transport layer calls.
//! - Compose repository primitives into `remove_by_id`.
//! - Emit one metadata-only log event per call.

use crate::cache::existence::ExistenceCache;
use crate::model::coordinate::GeoPoint;
use crate::model::project::{Project, ProjectId};
use crate::repo::project_store::ProjectStore;
use crate::service::project_repository::ProjectRepository;
use crate::service::{ProjectError, ProjectResult};
use log::{info, warn};

/// Project use-case service.
pub struct ProjectManager<S: ProjectStore, C: ExistenceCache> {
    repo: ProjectRepository<S, C>,
}

impl<S: ProjectStore, C: ExistenceCache> ProjectManager<S, C> {
    pub fn new(repo: ProjectRepository<S, C>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &ProjectRepository<S, C> {
        &self.repo
    }

    pub fn add(&self, project: &Project) -> ProjectResult<ProjectId> {
        let result = self.repo.add(project);
        log_outcome("project_add", &project.project_id, &result);
        result
    }

    /// Soft-deletes a project by id.
    ///
    /// # Errors
    /// - `NotFound` when no project (active or deleted) has this id.
    pub fn remove_by_id(&self, project_id: &str) -> ProjectResult<()> {
        let result = self
            .repo
            .find_by_id_with(project_id, true)
            .and_then(|project| self.repo.remove(&project));
        log_outcome("project_remove", project_id, &result);
        result
    }

    /// Applies the mutable fields of `project` to the stored record.
    ///
    /// `parent_proj_id`, timestamps and the deleted flag of `project` are
    /// ignored.
    pub fn update(&self, project: &Project) -> ProjectResult<()> {
        let result = self
            .repo
            .update(&project.project_id, &project.to_update());
        log_outcome("project_update", &project.project_id, &result);
        result
    }

    pub fn get_by_id(&self, project_id: &str) -> ProjectResult<Project> {
        self.repo.find_by_id(project_id)
    }

    pub fn get_by_name(&self, name: &str) -> ProjectResult<Project> {
        self.repo.find_by_name(name)
    }

    pub fn recover_by_id(&self, project_id: &str) -> ProjectResult<()> {
        let result = self.repo.recover_by_id(project_id);
        log_outcome("project_recover", project_id, &result);
        result
    }

    pub fn is_project_id_exist(&self, project_id: &str) -> ProjectResult<bool> {
        self.repo.is_project_id_exist(project_id)
    }

    pub fn get_project_path(&self, project_id: &str) -> ProjectResult<Vec<Project>> {
        let result = self.repo.get_project_path(project_id);
        match &result {
            Ok(path) => info!(
                "event=project_path module=service status=ok project_id={project_id} depth={}",
                path.len()
            ),
            Err(err) => log_error("project_path", project_id, err),
        }
        result
    }

    pub fn find_nearby_projects(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> ProjectResult<Vec<Project>> {
        let result = self.repo.find_nearby_projects(center, radius_km);
        match &result {
            Ok(projects) => info!(
                "event=project_nearby module=service status=ok radius_km={radius_km} matches={}",
                projects.len()
            ),
            Err(err) => warn!(
                "event=project_nearby module=service status=error radius_km={radius_km} error={err}"
            ),
        }
        result
    }

    pub fn list_children(&self, parent_id: &str) -> ProjectResult<Vec<Project>> {
        self.repo.list_children(parent_id)
    }
}

fn log_outcome<T>(event: &str, project_id: &str, result: &ProjectResult<T>) {
    match result {
        Ok(_) => info!("event={event} module=service status=ok project_id={project_id}"),
        Err(err) => log_error(event, project_id, err),
    }
}

fn log_error(event: &str, project_id: &str, err: &ProjectError) {
    warn!(
        "event={event} module=service status=error project_id={project_id} error_code={} error={err}",
        error_code(err)
    );
}

fn error_code(err: &ProjectError) -> &'static str {
    match err {
        ProjectError::NotFound(_) => "project_not_found",
        ProjectError::ParentNotFound(_) => "parent_not_found",
        ProjectError::Duplicate(_) => "duplicate_project",
        ProjectError::Validation(_) => "invalid_project",
        ProjectError::MalformedCoordinate { .. } => "malformed_coordinate",
        ProjectError::CycleDetected { .. } => "cycle_detected",
        ProjectError::DepthExceeded { .. } => "depth_exceeded",
        ProjectError::InvalidRadius(_) => "invalid_radius",
        ProjectError::Store(_) => "store_failure",
    }
}
