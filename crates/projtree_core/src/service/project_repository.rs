//! Project repository: the single contract the business layer consumes.
//!
//! # Responsibility
//! - Compose store, existence cache, ancestry resolver and proximity search.
//! - Keep the cache advisory: its failures never change a write outcome.
//!
//! # Invariants
//! - The cache is populated only after a successful `create`.
//! - Existence answers from the cache are confirmed by the store.
//! - No operation mutates `parent_proj_id` after creation.

use crate::cache::existence::ExistenceCache;
use crate::config::RepositoryConfig;
use crate::model::coordinate::GeoPoint;
use crate::model::project::{Project, ProjectId, ProjectUpdate};
use crate::repo::hierarchy::resolve_path;
use crate::repo::project_store::ProjectStore;
use crate::search::proximity::{find_nearest_hits, find_within_radius, NearbyHit};
use crate::service::{ProjectError, ProjectResult};
use log::{debug, warn};

/// Store + cache composition with dependency-injected handles.
pub struct ProjectRepository<S: ProjectStore, C: ExistenceCache> {
    store: S,
    cache: C,
    config: RepositoryConfig,
}

impl<S: ProjectStore, C: ExistenceCache> ProjectRepository<S, C> {
    /// Creates a repository with default configuration.
    pub fn new(store: S, cache: C) -> Self {
        Self::with_config(store, cache, RepositoryConfig::default())
    }

    pub fn with_config(store: S, cache: C, config: RepositoryConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Persists a new project, then records its id in the existence cache.
    ///
    /// # Errors
    /// - `ParentNotFound` when a non-empty parent does not exist.
    /// - `Duplicate` when the id is already taken.
    /// - `Validation` / `MalformedCoordinate` for invalid input.
    pub fn add(&self, project: &Project) -> ProjectResult<ProjectId> {
        let project_id = self.store.create(project)?;
        if let Err(err) = self.cache.add(&project_id) {
            warn!(
                "event=cache_add module=service status=error project_id={project_id} error={err}"
            );
        }
        Ok(project_id)
    }

    /// Soft-deletes the stored record matching `project.project_id`.
    pub fn remove(&self, project: &Project) -> ProjectResult<()> {
        let existing = self.find_by_id_with(&project.project_id, true)?;
        self.store
            .set_deleted_flag(&existing.project_id, true)
            .map_err(Into::into)
    }

    /// Overwrites description, location and coordinate.
    pub fn update(&self, project_id: &str, update: &ProjectUpdate) -> ProjectResult<()> {
        self.store
            .update_fields(project_id, update)
            .map_err(Into::into)
    }

    /// Looks up by id using `config.lookups_include_deleted`.
    pub fn find_by_id(&self, project_id: &str) -> ProjectResult<Project> {
        self.find_by_id_with(project_id, self.config.lookups_include_deleted)
    }

    pub fn find_by_id_with(&self, project_id: &str, include_deleted: bool) -> ProjectResult<Project> {
        self.store
            .find_by_id(project_id, include_deleted)?
            .ok_or_else(|| ProjectError::NotFound(project_id.to_string()))
    }

    /// Looks up by name using `config.lookups_include_deleted`.
    pub fn find_by_name(&self, name: &str) -> ProjectResult<Project> {
        self.find_by_name_with(name, self.config.lookups_include_deleted)
    }

    pub fn find_by_name_with(&self, name: &str, include_deleted: bool) -> ProjectResult<Project> {
        self.store
            .find_by_name(name, include_deleted)?
            .ok_or_else(|| ProjectError::NotFound(name.trim().to_string()))
    }

    /// Clears the soft-delete flag.
    pub fn recover_by_id(&self, project_id: &str) -> ProjectResult<()> {
        let existing = self.find_by_id_with(project_id, true)?;
        self.store
            .set_deleted_flag(&existing.project_id, false)
            .map_err(Into::into)
    }

    /// Cache-gated existence check.
    ///
    /// Ids the cache has never seen report `false` without a store lookup,
    /// even if a row was written through another path.
    pub fn is_project_id_exist(&self, project_id: &str) -> ProjectResult<bool> {
        match self.cache.might_contain(project_id) {
            Ok(false) => {
                debug!("event=exists_check module=service status=ok project_id={project_id} source=cache result=false");
                return Ok(false);
            }
            Ok(true) => {}
            Err(err) => {
                warn!(
                    "event=exists_check module=service status=error project_id={project_id} error_code=cache_lookup_failed error={err}"
                );
            }
        }
        let exists = self.store.exists(project_id)?;
        debug!("event=exists_check module=service status=ok project_id={project_id} source=store result={exists}");
        Ok(exists)
    }

    /// Ancestry of `project_id`, root first.
    pub fn get_project_path(&self, project_id: &str) -> ProjectResult<Vec<Project>> {
        resolve_path(&self.store, project_id, self.config.max_path_depth).map_err(Into::into)
    }

    /// Projects within `radius_km` (inclusive) of `center`, in scan order.
    pub fn find_nearby_projects(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> ProjectResult<Vec<Project>> {
        find_within_radius(&self.store, center, radius_km).map_err(Into::into)
    }

    /// Same matches as `find_nearby_projects`, nearest first with distances.
    pub fn find_nearby_hits(&self, center: GeoPoint, radius_km: f64) -> ProjectResult<Vec<NearbyHit>> {
        find_nearest_hits(&self.store, center, radius_km).map_err(Into::into)
    }

    /// Active direct children of `parent_id`; an empty id lists roots.
    pub fn list_children(&self, parent_id: &str) -> ProjectResult<Vec<Project>> {
        self.store
            .list_children(parent_id, false)
            .map_err(Into::into)
    }
}
