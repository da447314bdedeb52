//! Overpass API adapter: bounding-box search for ski-tagged OpenStreetMap features

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use super::{BoundingBox, FeatureSource, RawFeature};
use crate::Result;
use crate::cache::{self, PersistentCache};
use crate::http;

/// Server-side query budget used unless the client timeout says otherwise
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(25);

pub struct OverpassClient {
    client: ClientWithMiddleware,
    endpoint: String,
    query_timeout: Duration,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    /// Nodes carry lat/lon directly, ways and relations a computed center.
    /// Elements without usable coordinates are dropped.
    fn into_feature(self) -> Option<RawFeature> {
        let (latitude, longitude) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(center)) => (center.lat, center.lon),
            _ => return None,
        };
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(RawFeature {
            id: self.id,
            kind: self.element_type,
            name: self.tags.get("name").cloned(),
            latitude,
            longitude,
            tags: self.tags,
        })
    }
}

/// Overpass QL for every node/way/relation tagged as a ski resort or skiing area.
/// `timeout` becomes the server's `[timeout:N]`, at least one second.
pub fn build_query(bbox: &BoundingBox, timeout: Duration) -> String {
    let timeout_secs = timeout.as_secs().max(1);
    let area = format!(
        "({:.5},{:.5},{:.5},{:.5})",
        bbox.south, bbox.west, bbox.north, bbox.east
    );
    format!(
        "[out:json][timeout:{timeout_secs}];\n(\n  nwr[\"leisure\"=\"ski_resort\"]{area};\n  nwr[\"sport\"~\"(^|;)skiing(;|$)\"]{area};\n);\nout center tags;"
    )
}

impl OverpassClient {
    #[must_use]
    pub fn new(client: ClientWithMiddleware, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            cache: None,
            cache_ttl: Duration::ZERO,
        }
    }

    /// Ask the server to give up within `timeout`, so a slow query fails
    /// there instead of being cut off and retried by the HTTP client.
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PersistentCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    async fn query(&self, bbox: &BoundingBox) -> Result<Vec<RawFeature>> {
        let body = format!("data={}", urlencoding::encode(&build_query(bbox, self.query_timeout)));
        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let response: OverpassResponse = http::get_json(request, "overpass").await?;
        Ok(response
            .elements
            .into_iter()
            .filter_map(OverpassElement::into_feature)
            .collect())
    }
}

#[async_trait]
impl FeatureSource for OverpassClient {
    #[instrument(skip(self))]
    async fn search(&self, bbox: &BoundingBox) -> Result<Vec<RawFeature>> {
        let key = format!(
            "overpass:{:.3}:{:.3}:{:.3}:{:.3}",
            bbox.south, bbox.west, bbox.north, bbox.east
        );
        let features =
            cache::fetch_through(self.cache.as_deref(), &key, self.cache_ttl, || self.query(bbox))
                .await?;
        info!("Overpass returned {} ski-tagged features", features.len());
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::models::Location;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> ClientWithMiddleware {
        http::build_client(&HttpConfig {
            timeout_seconds: 5,
            max_retries: 0,
            user_agent: "skiscout-test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_query_mentions_both_tag_filters() {
        let bbox = BoundingBox::around(&Location::new(39.0, -120.0, "x".to_string()), 10.0);
        let query = build_query(&bbox, DEFAULT_QUERY_TIMEOUT);
        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains("nwr[\"leisure\"=\"ski_resort\"]"));
        assert!(query.contains("skiing"));
        assert!(query.ends_with("out center tags;"));
    }

    #[test]
    fn test_query_timeout_follows_client_budget() {
        let bbox = BoundingBox::around(&Location::new(39.0, -120.0, "x".to_string()), 10.0);
        assert!(build_query(&bbox, Duration::from_secs(10)).starts_with("[out:json][timeout:10];"));
        assert!(build_query(&bbox, Duration::ZERO).starts_with("[out:json][timeout:1];"));
    }

    #[tokio::test]
    async fn test_search_sends_configured_query_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .and(body_string_contains("timeout%3A7%5D"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"elements": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = OverpassClient::new(test_client(), format!("{}/api/interpreter", server.uri()))
            .with_query_timeout(Duration::from_secs(7));
        let bbox = BoundingBox::around(&Location::new(39.0, -120.0, "x".to_string()), 30.0);
        assert!(client.search(&bbox).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_parses_nodes_and_way_centers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .and(body_string_contains("data="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "elements": [
                    {"type": "node", "id": 1, "lat": 39.27, "lon": -120.12,
                     "tags": {"name": "Northstar California", "leisure": "ski_resort"}},
                    {"type": "way", "id": 2, "center": {"lat": 38.93, "lon": -119.94},
                     "tags": {"name": "Heavenly", "landuse": "winter_sports", "sport": "skiing"}},
                    {"type": "relation", "id": 3, "tags": {"name": "No Geometry"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = OverpassClient::new(test_client(), format!("{}/api/interpreter", server.uri()));
        let bbox = BoundingBox::around(&Location::new(39.0, -120.0, "x".to_string()), 30.0);
        let features = client.search(&bbox).await.unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name.as_deref(), Some("Northstar California"));
        assert_eq!(features[1].kind, "way");
        assert_eq!(features[1].latitude, 38.93);
    }
}
