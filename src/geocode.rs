//! Location resolution
//!
//! Turns the user's free-text location into coordinates. Coordinate pairs are
//! accepted as-is; everything else goes through the Open-Meteo geocoding API.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::cache::{self, PersistentCache};
use crate::http;
use crate::models::{Location, LocationInput};
use crate::{Result, SkiScoutError};

/// Geocoding collaborator: free text in, best match out (`None` when nothing matches)
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Location>>;
}

/// Open-Meteo geocoding client (no API key required)
pub struct OpenMeteoGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(result: GeocodingResult) -> Self {
        let name = match result.admin1 {
            Some(state) if state != result.name => format!("{}, {}", result.name, state),
            _ => result.name,
        };
        Location {
            latitude: result.latitude,
            longitude: result.longitude,
            name,
            country: result.country,
        }
    }
}

impl OpenMeteoGeocoder {
    #[must_use]
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: None,
            cache_ttl: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PersistentCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Open-Meteo matches on place names only, so "Lake Tahoe, CA" is searched as
    /// "Lake Tahoe" and the qualifier is used to prefer a matching region.
    async fn search(&self, query: &str) -> Result<Vec<GeocodingResult>> {
        let place = query.split(',').next().unwrap_or(query).trim();
        let url = format!(
            "{}/search?name={}&count=10&language=en&format=json",
            self.base_url,
            urlencoding::encode(place)
        );
        let response: GeocodingResponse =
            http::get_json(self.client.get(url), "geocoding").await?;
        Ok(response.results.unwrap_or_default())
    }
}

/// Pick the result whose region or country matches the text after the first comma.
fn best_match(query: &str, results: Vec<GeocodingResult>) -> Option<GeocodingResult> {
    let qualifier = query
        .split_once(',')
        .map(|(_, rest)| rest.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    if let Some(qualifier) = qualifier {
        let matching = results.iter().position(|r| {
            let admin = r.admin1.as_deref().unwrap_or_default().to_lowercase();
            let country = r.country.as_deref().unwrap_or_default().to_lowercase();
            admin == qualifier
                || country == qualifier
                || us_state_name(&qualifier).is_some_and(|state| admin == state)
        });
        if let Some(index) = matching {
            return results.into_iter().nth(index);
        }
    }
    results.into_iter().next()
}

/// Expand the two-letter codes of snow states people commonly type
fn us_state_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "ca" => "california",
        "nv" => "nevada",
        "co" => "colorado",
        "ut" => "utah",
        "wy" => "wyoming",
        "mt" => "montana",
        "id" => "idaho",
        "wa" => "washington",
        "or" => "oregon",
        "nm" => "new mexico",
        "az" => "arizona",
        "vt" => "vermont",
        "nh" => "new hampshire",
        "me" => "maine",
        "ny" => "new york",
        "mi" => "michigan",
        "ak" => "alaska",
        _ => return None,
    };
    Some(name)
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        let key = format!("geocode:{}", query.trim().to_lowercase());
        let results = cache::fetch_through(self.cache.as_deref(), &key, self.cache_ttl, || {
            self.search(query)
        })
        .await?;

        if results.is_empty() {
            warn!("No geocoding results for '{}'", query);
            return Ok(None);
        }
        debug!(
            "Geocoding candidates: {:?}",
            results
                .iter()
                .map(|r| format!("{} ({:.4}, {:.4})", r.name, r.latitude, r.longitude))
                .collect::<Vec<_>>()
        );
        Ok(best_match(query, results).map(Location::from))
    }
}

/// Service for resolving location inputs
pub struct LocationResolver;

impl LocationResolver {
    /// Resolve user input into a Location. Anything the geocoder cannot place,
    /// including a failed geocoding call, is reported as `LocationNotFound`.
    pub async fn resolve(geocoder: &dyn Geocoder, input: &str) -> Result<Location> {
        match LocationInput::parse(input) {
            LocationInput::Coordinates(lat, lon) => {
                debug!("Using coordinates as given: ({}, {})", lat, lon);
                Ok(Location::new(lat, lon, format!("{lat:.4}, {lon:.4}")))
            }
            LocationInput::Name(name) => {
                if name.is_empty() {
                    return Err(SkiScoutError::validation("Location cannot be empty"));
                }
                match geocoder.geocode(&name).await {
                    Ok(Some(location)) => {
                        info!(
                            "Resolved '{}' to {} ({:.4}, {:.4})",
                            name, location.name, location.latitude, location.longitude
                        );
                        Ok(location)
                    }
                    Ok(None) => Err(SkiScoutError::location_not_found(name)),
                    Err(e) => {
                        warn!("Geocoding '{}' failed: {}", name, e);
                        Err(SkiScoutError::location_not_found(name))
                    }
                }
            }
        }
    }
}
