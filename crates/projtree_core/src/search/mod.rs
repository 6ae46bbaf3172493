//! Query paths that scan the store instead of using a point lookup.
//!
//! # See also
//! - `repo::hierarchy` for the ancestry walk.

pub mod proximity;
