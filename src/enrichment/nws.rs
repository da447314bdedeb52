//! National Weather Service (api.weather.gov) adapter
//!
//! Two calls per resort: resolve the coordinates to the nearest forecast
//! point, then read the first forecast period. Points outside NWS coverage
//! answer 404 on the first call.

use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use super::WeatherSource;
use crate::cache::{self, PersistentCache};
use crate::http::{self, Fetched};
use crate::models::WeatherSnapshot;
use crate::{Result, SkiScoutError};

pub struct NwsClient {
    client: ClientWithMiddleware,
    base_url: String,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    temperature: Option<f64>,
    short_forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    features: Vec<serde_json::Value>,
}

impl NwsClient {
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

    async fn forecast_url(&self, latitude: f64, longitude: f64) -> Result<String> {
        let url = format!("{}/points/{:.4},{:.4}", self.base_url, latitude, longitude);
        match http::send_json::<PointResponse>(self.client.get(url), "weather point").await? {
            Fetched::Found(point) => point.properties.forecast.ok_or_else(|| {
                SkiScoutError::api("Weather point has no forecast endpoint")
            }),
            Fetched::NotFound => Err(SkiScoutError::api(format!(
                "({latitude:.4}, {longitude:.4}) is outside weather service coverage"
            ))),
        }
    }

    async fn has_active_alerts(&self, latitude: f64, longitude: f64) -> Result<bool> {
        let url = format!(
            "{}/alerts/active?point={:.4},{:.4}",
            self.base_url, latitude, longitude
        );
        let alerts: AlertsResponse = http::get_json(self.client.get(url), "weather alerts").await?;
        Ok(!alerts.features.is_empty())
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot> {
        let forecast_url = self.forecast_url(latitude, longitude).await?;
        debug!("Forecast endpoint: {}", forecast_url);

        let forecast: ForecastResponse =
            http::get_json(self.client.get(&forecast_url), "forecast").await?;

        match forecast.properties.periods.into_iter().next() {
            Some(period) => Ok(WeatherSnapshot {
                summary: period
                    .short_forecast
                    .unwrap_or_else(|| "No forecast".to_string()),
                temperature_f: period.temperature.map(|t| t.round() as i32),
                fetched_at: Utc::now(),
                alert: false,
            }),
            None => {
                // No periods yet; the alert flag is still worth surfacing.
                let alert = self
                    .has_active_alerts(latitude, longitude)
                    .await
                    .unwrap_or(false);
                Ok(WeatherSnapshot {
                    summary: "No forecast periods".to_string(),
                    temperature_f: None,
                    fetched_at: Utc::now(),
                    alert,
                })
            }
        }
    }
}

#[async_trait]
impl WeatherSource for NwsClient {
    #[instrument(skip(self))]
    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot> {
        let key = format!("nws:{latitude:.3}:{longitude:.3}");
        cache::fetch_through(self.cache.as_deref(), &key, self.cache_ttl, || {
            self.fetch(latitude, longitude)
        })
        .await
    }
}
