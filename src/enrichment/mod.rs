//! Per-resort enrichment: best-effort weather, static reputation, pricing profile
//!
//! Each resort is enriched independently; [`Enricher::enrich_all`] runs them
//! concurrently and returns results in input order.

pub mod nws;
pub mod reputation;

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::Result;
use crate::discovery::StaticResortTable;
use crate::models::{Resort, ResortProfile, SentimentScore, WeatherInfo, WeatherSnapshot};

pub use nws::NwsClient;
pub use reputation::{MatchPolicy, ReputationTable};

/// Weather collaborator: current conditions at a point
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot>;
}

/// Everything attached to a resort after discovery
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub weather: WeatherInfo,
    pub sentiment: SentimentScore,
    pub profile: Option<ResortProfile>,
}

pub struct Enricher {
    weather: Arc<dyn WeatherSource>,
    reputation: Arc<ReputationTable>,
    profiles: Arc<StaticResortTable>,
    call_timeout: Duration,
}

impl Enricher {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        reputation: Arc<ReputationTable>,
        profiles: Arc<StaticResortTable>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            weather,
            reputation,
            profiles,
            call_timeout,
        }
    }

    /// Never fails: weather problems become [`WeatherInfo::Unavailable`]
    pub async fn enrich(&self, resort: &Resort) -> Enrichment {
        let weather = self.weather_for(resort).await;
        let sentiment = self.reputation.score(&resort.name);
        let profile = self
            .profiles
            .profile_for(&resort.name, self.reputation.policy());
        Enrichment {
            weather,
            sentiment,
            profile,
        }
    }

    /// Enrich every resort concurrently, output aligned with `resorts`
    pub async fn enrich_all(&self, resorts: &[Resort]) -> Vec<Enrichment> {
        join_all(resorts.iter().map(|resort| self.enrich(resort))).await
    }

    async fn weather_for(&self, resort: &Resort) -> WeatherInfo {
        let call = self
            .weather
            .current_conditions(resort.latitude, resort.longitude);
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(snapshot)) => {
                debug!("Weather for '{}': {}", resort.name, snapshot);
                WeatherInfo::Available(snapshot)
            }
            Ok(Err(e)) => {
                warn!("Weather unavailable for '{}': {}", resort.name, e);
                WeatherInfo::Unavailable
            }
            Err(_) => {
                warn!(
                    "Weather lookup for '{}' timed out after {:?}",
                    resort.name, self.call_timeout
                );
                WeatherInfo::Unavailable
            }
        }
    }
}
