//! Domain model for the project hierarchy.
//!
//! # Responsibility
//! - Define the canonical `Project` record and its mutable subset.
//! - Convert coordinates between structured and WKT text form.
//!
//! # Invariants
//! - Every project is identified by a non-blank, immutable `project_id`.
//! - Removal is a soft-delete flag, never a hard delete.

pub mod coordinate;
pub mod project;
