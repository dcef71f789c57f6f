// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Great-circle proximity filtering.
//!
//! Distances use the haversine formula on a spherical Earth with no
//! ellipsoidal correction.

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate distance between two lat/lon points using the haversine formula (in kilometres).
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance from a reference point to an observation, or `None` when the
/// observation has no position.
#[must_use]
pub fn distance_km(ref_lat: f64, ref_lon: f64, lat: Option<f64>, lon: Option<f64>) -> Option<f64> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some(haversine_km(ref_lat, ref_lon, lat, lon)),
        _ => None,
    }
}

/// Distance to an observation that lies within `radius_km`, or `None` when it
/// is outside or has no position. The boundary is inclusive.
#[must_use]
pub fn distance_within(ref_lat: f64, ref_lon: f64, lat: Option<f64>, lon: Option<f64>, radius_km: f64) -> Option<f64> {
    distance_km(ref_lat, ref_lon, lat, lon).filter(|d| *d <= radius_km)
}

/// Decide whether an observation lies within `radius_km` of the reference point.
///
/// Fails closed: an observation with a missing coordinate is never inside.
/// The boundary is inclusive.
#[must_use]
pub fn is_within(ref_lat: f64, ref_lon: f64, lat: Option<f64>, lon: Option<f64>, radius_km: f64) -> bool {
    distance_within(ref_lat, ref_lon, lat, lon, radius_km).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: (f64, f64) = (37.399_746, -121.962_585);

    #[test]
    fn test_haversine_known_distance() {
        // SFO to JFK is roughly 4,150 km
        let distance = haversine_km(37.6213, -122.3790, 40.6413, -73.7781);
        assert!((distance - 4150.0).abs() < 20.0);
    }

    #[test]
    fn test_same_point_is_zero() {
        assert!(haversine_km(HOME.0, HOME.1, HOME.0, HOME.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_coordinate_fails_closed() {
        assert!(!is_within(HOME.0, HOME.1, None, Some(HOME.1), 100.0));
        assert!(!is_within(HOME.0, HOME.1, Some(HOME.0), None, 100.0));
        assert!(!is_within(HOME.0, HOME.1, None, None, 100.0));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let (lat, lon) = (37.42, -121.95);
        let exact = haversine_km(HOME.0, HOME.1, lat, lon);
        assert!(is_within(HOME.0, HOME.1, Some(lat), Some(lon), exact));
        assert!(!is_within(HOME.0, HOME.1, Some(lat), Some(lon), exact * 0.999));
    }

    #[test]
    fn test_distance_within_returns_distance_once_inside() {
        let (lat, lon) = (HOME.0 + 0.009, HOME.1);
        let expected = haversine_km(HOME.0, HOME.1, lat, lon);

        assert_eq!(distance_within(HOME.0, HOME.1, Some(lat), Some(lon), 3.2), Some(expected));
        assert_eq!(distance_within(HOME.0, HOME.1, Some(lat), Some(lon), expected), Some(expected));
        assert_eq!(distance_within(HOME.0, HOME.1, Some(37.7749), Some(-122.4194), 3.2), None);
        assert_eq!(distance_within(HOME.0, HOME.1, None, Some(lon), 3.2), None);
    }

    #[test]
    fn test_inside_and_outside_radius() {
        // ~1 km north of home
        assert!(is_within(HOME.0, HOME.1, Some(HOME.0 + 0.009), Some(HOME.1), 3.2));
        // San Francisco is ~60 km away
        assert!(!is_within(HOME.0, HOME.1, Some(37.7749), Some(-122.4194), 3.2));
    }
}
