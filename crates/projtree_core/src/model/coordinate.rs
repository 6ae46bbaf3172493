//! Geographic coordinate and its WKT text codec.
//!
//! Stored and wire form is `POINT(<lng> <lat>)`, longitude first, matching
//! the column layout spatial databases use for 2D points.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static WKT_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*POINT\s*\(\s*(\S+)\s+(\S+)\s*\)\s*$").expect("static WKT regex is valid")
});

/// Coordinate codec failures.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// Text is not a `POINT(<lng> <lat>)` literal with numeric members.
    Malformed(String),
    /// Values parsed but fall outside the valid degree ranges.
    OutOfRange { latitude: f64, longitude: f64 },
}

impl Display for CoordinateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(text) => write!(f, "malformed coordinate `{text}`"),
            Self::OutOfRange {
                latitude,
                longitude,
            } => write!(
                f,
                "coordinate out of range: latitude {latitude}, longitude {longitude}"
            ),
        }
    }
}

impl Error for CoordinateError {}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Builds a validated point.
    ///
    /// # Errors
    /// - `OutOfRange` for non-finite values, `|lat| > 90` or `|lon| > 180`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Checks degree ranges. Public fields allow unchecked construction, so
    /// write paths call this before persisting.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        let in_range = self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);
        if in_range {
            Ok(())
        } else {
            Err(CoordinateError::OutOfRange {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Encodes as `POINT(<lng> <lat>)` with six fractional digits.
    pub fn to_wkt(&self) -> String {
        format!("POINT({:.6} {:.6})", self.longitude, self.latitude)
    }

    /// Decodes a `POINT(<lng> <lat>)` literal.
    ///
    /// The keyword is case-insensitive and extra whitespace is tolerated.
    pub fn from_wkt(text: &str) -> Result<Self, CoordinateError> {
        let malformed = || CoordinateError::Malformed(text.to_string());
        let captures = WKT_POINT.captures(text).ok_or_else(malformed)?;
        let longitude = captures[1].parse::<f64>().map_err(|_| malformed())?;
        let latitude = captures[2].parse::<f64>().map_err(|_| malformed())?;
        Self::new(latitude, longitude)
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

impl FromStr for GeoPoint {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wkt(s)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateError, GeoPoint};

    #[test]
    fn wkt_puts_longitude_first() {
        let point = GeoPoint::new(31.2304, 121.4737).unwrap();
        assert_eq!(point.to_wkt(), "POINT(121.473700 31.230400)");
    }

    #[test]
    fn from_wkt_tolerates_case_and_whitespace() {
        let point = GeoPoint::from_wkt("  point (  -0.1276   51.5072 ) ").unwrap();
        assert!((point.latitude - 51.5072).abs() < 1e-9);
        assert!((point.longitude + 0.1276).abs() < 1e-9);
    }

    #[test]
    fn wkt_text_decodes_back_to_same_point() {
        let point = GeoPoint::new(-33.8688, 151.2093).unwrap();
        let decoded: GeoPoint = point.to_string().parse().unwrap();
        assert!((decoded.latitude - point.latitude).abs() < 1e-6);
        assert!((decoded.longitude - point.longitude).abs() < 1e-6);
    }

    #[test]
    fn from_wkt_rejects_garbage() {
        for text in ["", "POINT()", "POINT(1)", "POINT(a b)", "LINESTRING(1 2)", "POINT(1 2 3)"] {
            let err = GeoPoint::from_wkt(text).unwrap_err();
            assert_eq!(err, CoordinateError::Malformed(text.to_string()));
        }
    }

    #[test]
    fn from_wkt_rejects_out_of_range_values() {
        let err = GeoPoint::from_wkt("POINT(10 95)").unwrap_err();
        assert!(matches!(err, CoordinateError::OutOfRange { latitude, .. } if latitude == 95.0));
    }

    #[test]
    fn new_rejects_non_finite_values() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
        assert!(GeoPoint::new(90.0, -180.0).is_ok());
    }
}
