//! Durable project persistence and the ancestry walk built on it.
//!
//! # Responsibility
//! - Define the store contract consumed by search and orchestration layers.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - The store is the only writer of durable project state.
//! - Lookups return soft-deleted rows only when asked to.

pub mod hierarchy;
pub mod project_store;
