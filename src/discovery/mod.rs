//! Resort discovery
//!
//! Two tiers composed explicitly: a live [`ResortProvider`] backed by a
//! map-feature search, and a static secondary provider consulted only when the
//! live tier fails or finds nothing.

pub mod fallback;
pub mod filter;
pub mod overpass;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::models::{Location, Resort, ResortSource, resort::sort_by_distance};

pub use fallback::{FallbackEntry, StaticResortTable};
pub use filter::{FeatureFilter, FilterDecision};
pub use overpass::OverpassClient;

/// Miles per degree of latitude
const MILES_PER_DEGREE: f64 = 69.0;

/// A raw map feature as returned by the feature-search collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    pub id: i64,
    /// node, way or relation
    pub kind: String,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub tags: BTreeMap<String, String>,
}

/// Search area in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Smallest box containing the circle of `radius_miles` around `center`
    pub fn around(center: &Location, radius_miles: f64) -> Self {
        let lat_delta = radius_miles / MILES_PER_DEGREE;
        let cos_lat = center.latitude.to_radians().cos().abs().max(0.01);
        let lon_delta = (radius_miles / (MILES_PER_DEGREE * cos_lat)).min(180.0);
        Self {
            south: (center.latitude - lat_delta).max(-90.0),
            west: (center.longitude - lon_delta).max(-180.0),
            north: (center.latitude + lat_delta).min(90.0),
            east: (center.longitude + lon_delta).min(180.0),
        }
    }
}

/// Feature-search collaborator
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn search(&self, bbox: &BoundingBox) -> Result<Vec<RawFeature>>;
}

/// Anything that can list resorts around a point
#[async_trait]
pub trait ResortProvider: Send + Sync {
    fn label(&self) -> &'static str;
    async fn resorts_near(&self, center: &Location, radius_miles: f64) -> Result<Vec<Resort>>;
}

/// Live tier: feature search, tag filter, distance cut, sort
pub struct LiveDiscovery {
    source: Arc<dyn FeatureSource>,
    filter: FeatureFilter,
}

impl LiveDiscovery {
    pub fn new(source: Arc<dyn FeatureSource>, filter: FeatureFilter) -> Self {
        Self { source, filter }
    }
}

#[async_trait]
impl ResortProvider for LiveDiscovery {
    fn label(&self) -> &'static str {
        "live map search"
    }

    async fn resorts_near(&self, center: &Location, radius_miles: f64) -> Result<Vec<Resort>> {
        let bbox = BoundingBox::around(center, radius_miles);
        let features = self.source.search(&bbox).await?;
        let total = features.len();

        let candidates = features
            .into_iter()
            .filter(|feature| self.filter.accepts(feature))
            .filter_map(|feature| {
                let name = feature.name?.trim().to_string();
                let distance_miles = center.miles_to(feature.latitude, feature.longitude);
                if distance_miles > radius_miles {
                    debug!("Dropping '{}' at {:.1} mi (outside radius)", name, distance_miles);
                    return None;
                }
                Some(Resort {
                    name,
                    latitude: feature.latitude,
                    longitude: feature.longitude,
                    distance_miles,
                    source: ResortSource::Live,
                })
            });

        let resorts = dedupe_by_name(candidates);
        debug!("{} of {} features survived filtering", resorts.len(), total);
        Ok(resorts)
    }
}

/// One entry per case-insensitive name, keeping the nearest, sorted by distance.
/// A resort mapped both as a node and as an area comes back twice from the search.
fn dedupe_by_name(resorts: impl IntoIterator<Item = Resort>) -> Vec<Resort> {
    let mut nearest: HashMap<String, Resort> = HashMap::new();
    for resort in resorts {
        let key = resort.name.to_lowercase();
        match nearest.get(&key) {
            Some(existing) if existing.cmp_by_distance(&resort).is_le() => {}
            _ => {
                nearest.insert(key, resort);
            }
        }
    }
    let mut resorts: Vec<Resort> = nearest.into_values().collect();
    sort_by_distance(&mut resorts);
    resorts
}

/// Result of a discovery run
#[derive(Debug, Clone)]
pub struct Discovery {
    pub resorts: Vec<Resort>,
    pub used_fallback: bool,
}

/// Try the primary provider; on error or an empty result use the secondary.
/// Never fails: a failing secondary yields an empty discovery.
#[instrument(skip(primary, secondary, center), fields(primary = primary.label(), secondary = secondary.label()))]
pub async fn discover(
    primary: &dyn ResortProvider,
    secondary: &dyn ResortProvider,
    center: &Location,
    radius_miles: f64,
) -> Discovery {
    match primary.resorts_near(center, radius_miles).await {
        Ok(resorts) if !resorts.is_empty() => {
            info!("Discovered {} resorts via {}", resorts.len(), primary.label());
            return Discovery {
                resorts,
                used_fallback: false,
            };
        }
        Ok(_) => info!("{} found nothing, using {}", primary.label(), secondary.label()),
        Err(e) => warn!(
            "{} failed ({}), using {}",
            primary.label(),
            e,
            secondary.label()
        ),
    }

    let resorts = match secondary.resorts_near(center, radius_miles).await {
        Ok(resorts) => resorts,
        Err(e) => {
            warn!("{} failed too: {}", secondary.label(), e);
            Vec::new()
        }
    };
    info!("Discovered {} resorts via {}", resorts.len(), secondary.label());
    Discovery {
        resorts,
        used_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkiScoutError;

    struct StaticFeatures(Vec<RawFeature>);

    #[async_trait]
    impl FeatureSource for StaticFeatures {
        async fn search(&self, _bbox: &BoundingBox) -> Result<Vec<RawFeature>> {
            Ok(self.0.clone())
        }
    }

    struct FailingFeatures;

    #[async_trait]
    impl FeatureSource for FailingFeatures {
        async fn search(&self, _bbox: &BoundingBox) -> Result<Vec<RawFeature>> {
            Err(SkiScoutError::api("overpass timeout"))
        }
    }

    fn ski_feature(id: i64, name: &str, lat: f64, lon: f64) -> RawFeature {
        RawFeature {
            id,
            kind: "node".to_string(),
            name: Some(name.to_string()),
            latitude: lat,
            longitude: lon,
            tags: BTreeMap::from([
                ("leisure".to_string(), "ski_resort".to_string()),
                ("name".to_string(), name.to_string()),
            ]),
        }
    }

    fn origin() -> Location {
        Location::new(39.0968, -120.0324, "Lake Tahoe".to_string())
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let bbox = BoundingBox::around(&origin(), 69.0);
        assert!((bbox.north - bbox.south - 2.0).abs() < 1e-9);
        assert!(bbox.east - bbox.west > 2.0);
    }

    #[tokio::test]
    async fn test_live_discovery_filters_cuts_and_sorts() {
        let source = StaticFeatures(vec![
            ski_feature(1, "Sugar Bowl", 39.304, -120.334),
            ski_feature(2, "Heavenly", 38.935, -119.940),
            ski_feature(3, "Heavenly Parking", 38.936, -119.941),
            ski_feature(4, "Kirkwood", 38.685, -120.066),
            ski_feature(5, "Heavenly", 38.940, -119.930),
        ]);
        let live = LiveDiscovery::new(Arc::new(source), FeatureFilter::default());
        let resorts = live.resorts_near(&origin(), 25.0).await.unwrap();

        let names: Vec<_> = resorts.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Heavenly", "Sugar Bowl"]);
        assert!(resorts.iter().all(|r| r.distance_miles <= 25.0));
        assert!(resorts.iter().all(|r| r.source == ResortSource::Live));
    }

    #[tokio::test]
    async fn test_discover_falls_back_on_empty_and_error() {
        let table = StaticResortTable::builtin();

        let empty = LiveDiscovery::new(Arc::new(StaticFeatures(vec![])), FeatureFilter::default());
        let discovery = discover(&empty, &table, &origin(), 20.0).await;
        assert!(discovery.used_fallback);
        assert!(!discovery.resorts.is_empty());

        let failing = LiveDiscovery::new(Arc::new(FailingFeatures), FeatureFilter::default());
        let discovery = discover(&failing, &table, &origin(), 20.0).await;
        assert!(discovery.used_fallback);
        assert!(
            discovery
                .resorts
                .iter()
                .all(|r| r.source == ResortSource::Fallback)
        );
    }

    #[tokio::test]
    async fn test_discover_prefers_live_results() {
        let table = StaticResortTable::builtin();
        let live = LiveDiscovery::new(
            Arc::new(StaticFeatures(vec![ski_feature(1, "Granlibakken", 39.155, -120.14)])),
            FeatureFilter::default(),
        );
        let discovery = discover(&live, &table, &origin(), 20.0).await;
        assert!(!discovery.used_fallback);
        assert_eq!(discovery.resorts.len(), 1);
        assert_eq!(discovery.resorts[0].name, "Granlibakken");
    }
}
