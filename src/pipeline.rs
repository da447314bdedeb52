//! One scouting run: geocode, discover, enrich, resolve booking links
//!
//! Only an unplaceable location (or invalid input) fails a run. Every other
//! collaborator failure degrades: discovery falls back to the static table and
//! weather becomes "unavailable".

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::booking::BookingCatalog;
use crate::cache::PersistentCache;
use crate::config::{SearchConfig, SkiScoutConfig, validate_radius};
use crate::discovery::{
    self, FeatureFilter, FeatureSource, LiveDiscovery, OverpassClient, StaticResortTable,
};
use crate::enrichment::{Enricher, NwsClient, ReputationTable, WeatherSource};
use crate::geocode::{Geocoder, LocationResolver, OpenMeteoGeocoder};
use crate::http;
use crate::models::{BookingOptions, DateRange, Location, ScoutedResort};
use crate::{Result, SkiScoutError};

/// Validated input for one run
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub location: String,
    pub radius_miles: u32,
    pub dates: DateRange,
    pub options: BookingOptions,
}

impl SearchRequest {
    pub fn new(
        location: impl Into<String>,
        radius_miles: u32,
        dates: DateRange,
        options: BookingOptions,
    ) -> Result<Self> {
        let location = location.into().trim().to_string();
        if location.is_empty() {
            return Err(SkiScoutError::validation("Location cannot be empty"));
        }
        validate_radius(radius_miles)?;
        Ok(Self {
            location,
            radius_miles,
            dates,
            options,
        })
    }
}

/// Outcome of a run, resorts in discovery (distance) order
#[derive(Debug, Clone, Serialize)]
pub struct ScoutReport {
    pub query: String,
    pub origin: Location,
    pub radius_miles: u32,
    pub dates: DateRange,
    pub options: BookingOptions,
    /// Live discovery failed or found nothing, so the curated table was used
    pub used_fallback: bool,
    pub resorts: Vec<ScoutedResort>,
    pub generated_at: DateTime<Utc>,
}

/// External services a run depends on
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub features: Arc<dyn FeatureSource>,
    pub weather: Arc<dyn WeatherSource>,
}

/// Read-only lookup tables, built once at startup
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub resorts: Arc<StaticResortTable>,
    pub reputation: Arc<ReputationTable>,
    pub booking: Arc<BookingCatalog>,
}

impl ReferenceTables {
    pub fn builtin(search: &SearchConfig) -> Result<Self> {
        Ok(Self {
            resorts: Arc::new(StaticResortTable::builtin()),
            reputation: Arc::new(
                ReputationTable::builtin(search.sentiment_match)
                    .with_neutral(search.neutral_sentiment),
            ),
            booking: Arc::new(BookingCatalog::builtin()?),
        })
    }
}

pub struct ScoutPipeline {
    geocoder: Arc<dyn Geocoder>,
    live: LiveDiscovery,
    tables: ReferenceTables,
    enricher: Enricher,
}

impl ScoutPipeline {
    /// `weather_timeout` bounds each resort's weather lookup; expiry counts as unavailable.
    pub fn new(
        collaborators: Collaborators,
        tables: ReferenceTables,
        weather_timeout: Duration,
    ) -> Self {
        let enricher = Enricher::new(
            collaborators.weather,
            Arc::clone(&tables.reputation),
            Arc::clone(&tables.resorts),
            weather_timeout,
        );
        Self {
            geocoder: collaborators.geocoder,
            live: LiveDiscovery::new(collaborators.features, FeatureFilter::default()),
            tables,
            enricher,
        }
    }

    /// Wire the real HTTP collaborators, sharing one client and cache
    pub fn from_config(config: &SkiScoutConfig) -> Result<Self> {
        let client = http::build_client(&config.http)?;
        let ttl = Duration::from_secs(u64::from(config.cache.ttl_minutes) * 60);
        let cache = if config.cache.enabled {
            open_cache(&config.cache.location)
        } else {
            None
        };

        let mut geocoder = OpenMeteoGeocoder::new(client.clone(), &config.endpoints.geocoding_url);
        let http_timeout = Duration::from_secs(u64::from(config.http.timeout_seconds));
        let mut overpass = OverpassClient::new(client.clone(), &config.endpoints.overpass_url)
            .with_query_timeout(http_timeout);
        let mut nws = NwsClient::new(client, &config.endpoints.weather_url);
        if let Some(cache) = cache {
            geocoder = geocoder.with_cache(Arc::clone(&cache), ttl);
            overpass = overpass.with_cache(Arc::clone(&cache), ttl);
            nws = nws.with_cache(cache, ttl);
        }

        let collaborators = Collaborators {
            geocoder: Arc::new(geocoder),
            features: Arc::new(overpass),
            weather: Arc::new(nws),
        };
        let tables = ReferenceTables::builtin(&config.search)?;
        Ok(Self::new(collaborators, tables, http_timeout))
    }

    #[instrument(skip(self, request), fields(location = %request.location, radius = request.radius_miles))]
    pub async fn run(&self, request: &SearchRequest) -> Result<ScoutReport> {
        let origin = LocationResolver::resolve(self.geocoder.as_ref(), &request.location).await?;

        let discovery = discovery::discover(
            &self.live,
            self.tables.resorts.as_ref(),
            &origin,
            f64::from(request.radius_miles),
        )
        .await;

        let enrichments = self.enricher.enrich_all(&discovery.resorts).await;

        let resorts: Vec<ScoutedResort> = discovery
            .resorts
            .into_iter()
            .zip(enrichments)
            .map(|(resort, enrichment)| {
                let links = self
                    .tables
                    .booking
                    .resolve(&resort.name, &request.dates, request.options);
                ScoutedResort {
                    resort,
                    weather: enrichment.weather,
                    sentiment: enrichment.sentiment,
                    profile: enrichment.profile,
                    links,
                }
            })
            .collect();

        info!(
            "Scouted {} resorts within {} mi of {}",
            resorts.len(),
            request.radius_miles,
            origin.name
        );

        Ok(ScoutReport {
            query: request.location.clone(),
            origin,
            radius_miles: request.radius_miles,
            dates: request.dates,
            options: request.options,
            used_fallback: discovery.used_fallback,
            resorts,
            generated_at: Utc::now(),
        })
    }
}

/// A cache that cannot be opened only costs speed
fn open_cache(location: &str) -> Option<Arc<PersistentCache>> {
    match PersistentCache::open(Path::new(location)) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!("Response cache at {} unavailable: {}", location, e);
            None
        }
    }
}
