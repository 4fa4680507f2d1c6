use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A point on the globe in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoord {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// One record of the location dataset served by the backend.
///
/// Field names follow the wire format, which is camelCase JSON. Records are
/// immutable once loaded for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub country: String,
    pub city: String,
    pub point_name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date_added: DateTime<Utc>,
}

impl Location {
    pub fn coord(&self) -> Result<GeoCoord, CoordError> {
        GeoCoord::new(self.latitude, self.longitude)
    }
}

/// Newest first, the order the globe presents markers in.
pub fn sort_newest_first(locations: &mut [Location]) {
    locations.sort_by(|a, b| b.date_added.cmp(&a.date_added));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, date: &str) -> Location {
        Location {
            country: "France".into(),
            city: "Paris".into(),
            point_name: name.into(),
            description: "Capital city of France".into(),
            latitude: 48.8566,
            longitude: 2.3522,
            date_added: date.parse().unwrap(),
        }
    }

    #[test]
    fn deserialize_location_record() {
        let json = r#"{
            "country": "United States",
            "city": "Washington D.C.",
            "pointName": "Washington D.C. Capital",
            "description": "Capital city of the United States",
            "latitude": 38.8951,
            "longitude": -77.0364,
            "dateAdded": "2025-05-18T00:00:00Z"
        }"#;
        let location: Location = serde_json::from_str(json).unwrap();
        assert_eq!(location.point_name, "Washington D.C. Capital");
        assert_eq!(location.latitude, 38.8951);
        assert!(location.coord().is_ok());
    }

    #[test]
    fn serialize_uses_camel_case() {
        let json = serde_json::to_string(&record("Eiffel Tower", "2025-05-18T00:00:00Z")).unwrap();
        assert!(json.contains("\"pointName\""));
        assert!(json.contains("\"dateAdded\""));
        assert!(!json.contains("point_name"));
    }

    #[test]
    fn coord_rejects_out_of_range() {
        assert!(GeoCoord::new(90.1, 0.0).is_err());
        assert!(GeoCoord::new(-90.1, 0.0).is_err());
        assert!(GeoCoord::new(0.0, 180.5).is_err());
        assert!(GeoCoord::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn sort_orders_newest_first() {
        let mut locations = vec![
            record("old", "2024-01-01T00:00:00Z"),
            record("new", "2025-05-18T00:00:00Z"),
            record("middle", "2024-12-31T00:00:00Z"),
        ];
        sort_newest_first(&mut locations);
        let names: Vec<_> = locations.iter().map(|l| l.point_name.as_str()).collect();
        assert_eq!(names, vec!["new", "middle", "old"]);
    }
}
