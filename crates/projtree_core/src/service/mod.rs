//! Use-case layer over the project store, existence cache and searches.
//!
//! # Responsibility
//! - Compose store, cache, resolver and search behind one contract.
//! - Translate layer errors into the `ProjectError` taxonomy.

mod error;
pub mod project_manager;
pub mod project_repository;

pub use error::{ProjectError, ProjectResult};
