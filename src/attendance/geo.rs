use serde::{Deserialize, Serialize};

use super::error::AttendanceError;

/// Mean Earth radius in meters, as used by the Haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 coordinate pair. Construction validates ranges, so a held value
/// is always a plausible position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AttendanceError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(AttendanceError::InvalidCoordinate(
                "coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AttendanceError::InvalidCoordinate(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AttendanceError::InvalidCoordinate(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a point from optional request fields; a missing half is a
    /// `LocationRequired` rejection, not a validation error.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Self, AttendanceError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => Err(AttendanceError::LocationRequired),
        }
    }
}

/// Great-circle distance between two points in meters (Haversine).
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// The fixed office point and its allowed clock-in radius. Built from
/// configuration at startup and injected; never mutated afterwards.
#[derive(Debug, Clone, Copy)]
pub struct OfficeLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub allowed_radius_m: f64,
}

impl OfficeLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn distance_to(&self, point: GeoPoint) -> f64 {
        distance_meters(point, self.point())
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        self.distance_to(point) <= self.allowed_radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The default office point from the service configuration.
    const OFFICE: OfficeLocation = OfficeLocation {
        latitude: 5.848864439722045,
        longitude: 0.6102520623942992,
        allowed_radius_m: 100.0,
    };

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(5.8488, 0.6102).unwrap();
        assert!(distance_meters(p, p).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(5.8488, 0.6102).unwrap();
        let b = GeoPoint::new(5.9388, 0.6102).unwrap();
        let ab = distance_meters(a, b);
        let ba = distance_meters(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn office_point_is_inside_fence() {
        assert!(OFFICE.contains(OFFICE.point()));
    }

    #[test]
    fn ten_kilometers_away_is_outside_fence() {
        // ~0.09 degrees of latitude is ~10 km
        let far = GeoPoint::new(OFFICE.latitude + 0.09, OFFICE.longitude).unwrap();
        let d = OFFICE.distance_to(far);
        assert!(d > 9_900.0 && d < 10_200.0, "got {d}");
        assert!(!OFFICE.contains(far));
    }

    #[test]
    fn just_inside_radius_is_accepted() {
        // ~0.0008 degrees of latitude is ~89 m
        let near = GeoPoint::new(OFFICE.latitude + 0.0008, OFFICE.longitude).unwrap();
        assert!(OFFICE.distance_to(near) < 100.0);
        assert!(OFFICE.contains(near));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(
            GeoPoint::new(91.0, 0.0),
            Err(AttendanceError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, -181.0),
            Err(AttendanceError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            GeoPoint::new(f64::NAN, 0.0),
            Err(AttendanceError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn missing_coordinates_are_location_required() {
        assert!(matches!(
            GeoPoint::from_parts(None, Some(0.6102)),
            Err(AttendanceError::LocationRequired)
        ));
        assert!(matches!(
            GeoPoint::from_parts(Some(5.8488), None),
            Err(AttendanceError::LocationRequired)
        ));
        assert!(matches!(
            GeoPoint::from_parts(None, None),
            Err(AttendanceError::LocationRequired)
        ));
    }
}
