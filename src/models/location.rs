//! Location model for geographic coordinates and metadata

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// Location coordinates, immutable once geocoded
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Location name (city, region, etc.)
    pub name: String,
    /// Country name as reported by the geocoder
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: None,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Great-circle distance to a point, in statute miles
    #[must_use]
    pub fn miles_to(&self, latitude: f64, longitude: f64) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            HaversineLocation {
                latitude,
                longitude,
            },
            Units::Miles,
        )
    }
}

/// Free-text location input as typed by the user
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// "lat,lon" pair, resolved without the geocoder
    Coordinates(f64, f64),
    /// Anything else: a place name or postal code
    Name(String),
}

impl LocationInput {
    /// Parse user input. A comma-separated pair of in-range numbers is treated as coordinates.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Some((lat, lon)) = trimmed.split_once(',') {
            if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
                    return LocationInput::Coordinates(lat, lon);
                }
            }
        }
        LocationInput::Name(trimmed.to_string())
    }
}
