//! Great-circle proximity search over stored projects.
//!
//! # Responsibility
//! - Compute haversine distance on a sphere of radius 6371 km.
//! - Filter a full store scan by distance from a query point.
//!
//! # Invariants
//! - Projects without a coordinate never match.
//! - The radius boundary is inclusive: `distance <= radius_km`.
//! - Soft-deleted projects are not filtered here.
//!
//! Every call is one full scan; there is no spatial index yet.

use crate::model::coordinate::GeoPoint;
use crate::model::project::Project;
use crate::repo::project_store::{ProjectStore, StoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mean Earth radius used by the distance formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    /// Radius is negative, NaN or infinite.
    InvalidRadius(f64),
    Store(StoreError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRadius(radius) => write!(f, "invalid search radius {radius} km"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRadius(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for SearchError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// One proximity match with its distance from the query point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyHit {
    pub project: Project,
    pub distance_km: f64,
}

/// Haversine distance between two points in kilometers.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Returns projects within `radius_km` of `center`, in store scan order.
pub fn find_within_radius<S>(
    store: &S,
    center: GeoPoint,
    radius_km: f64,
) -> SearchResult<Vec<Project>>
where
    S: ProjectStore + ?Sized,
{
    Ok(scan_hits(store, center, radius_km)?
        .into_iter()
        .map(|hit| hit.project)
        .collect())
}

/// Same inclusion rule as `find_within_radius`, ranked nearest first.
pub fn find_nearest_hits<S>(
    store: &S,
    center: GeoPoint,
    radius_km: f64,
) -> SearchResult<Vec<NearbyHit>>
where
    S: ProjectStore + ?Sized,
{
    let mut hits = scan_hits(store, center, radius_km)?;
    hits.sort_by(|left, right| left.distance_km.total_cmp(&right.distance_km));
    Ok(hits)
}

fn scan_hits<S>(store: &S, center: GeoPoint, radius_km: f64) -> SearchResult<Vec<NearbyHit>>
where
    S: ProjectStore + ?Sized,
{
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(SearchError::InvalidRadius(radius_km));
    }

    let hits = store
        .scan_all()?
        .into_iter()
        .filter_map(|project| {
            let distance_km = haversine_km(center, project.coordinate?);
            (distance_km <= radius_km).then_some(NearbyHit {
                project,
                distance_km,
            })
        })
        .collect();
    Ok(hits)
}
