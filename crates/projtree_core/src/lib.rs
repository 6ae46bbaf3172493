//! Data-access and query core for hierarchical, geo-located projects.
//! This crate owns the project invariants; transports stay thin on top.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use cache::bloom::BloomFilter;
pub use cache::existence::{ExistenceCache, MemoryExistenceCache, SqliteExistenceCache};
pub use cache::{CacheError, CacheResult};
pub use config::{ConfigError, RepositoryConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::coordinate::{CoordinateError, GeoPoint};
pub use model::project::{
    stored_location, Project, ProjectId, ProjectUpdate, ProjectValidationError, UNKNOWN_LOCATION,
};
pub use repo::hierarchy::{resolve_path, PathError};
pub use repo::project_store::{ProjectStore, SqliteProjectStore, StoreError, StoreResult};
pub use search::proximity::{
    find_nearest_hits, find_within_radius, haversine_km, NearbyHit, SearchError, SearchResult,
    EARTH_RADIUS_KM,
};
pub use service::project_manager::ProjectManager;
pub use service::project_repository::ProjectRepository;
pub use service::{ProjectError, ProjectResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
