//! Resort model: a discovered ski area plus everything attached to it afterwards

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::{BookingLinkSet, SentimentScore, WeatherInfo};

/// Where a resort entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResortSource {
    /// Live map-feature search
    Live,
    /// Curated static table
    Fallback,
}

impl fmt::Display for ResortSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResortSource::Live => write!(f, "live"),
            ResortSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A ski area candidate. The name is the join key for all later enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resort {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Great-circle distance from the search origin in miles
    pub distance_miles: f64,
    pub source: ResortSource,
}

impl Resort {
    /// Ascending distance, ties broken lexicographically by name
    #[must_use]
    pub fn cmp_by_distance(&self, other: &Self) -> Ordering {
        self.distance_miles
            .total_cmp(&other.distance_miles)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Sort resorts in place: nearest first, equal distances by name.
pub fn sort_by_distance(resorts: &mut [Resort]) {
    resorts.sort_by(Resort::cmp_by_distance);
}

/// Pricing and terrain figures for well-known resorts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResortProfile {
    /// Adult one-day lift ticket, USD
    pub day_pass_usd: u32,
    /// One-day ski/board rental, USD
    pub rental_usd: u32,
    /// Share of terrain rated advanced or expert, percent
    pub advanced_terrain_pct: u8,
}

impl ResortProfile {
    /// Estimated cost of a day on the mountain
    #[must_use]
    pub fn total_day_cost_usd(&self, with_rental: bool) -> u32 {
        if with_rental {
            self.day_pass_usd + self.rental_usd
        } else {
            self.day_pass_usd
        }
    }
}

/// A resort after enrichment and booking-link resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutedResort {
    pub resort: Resort,
    pub weather: WeatherInfo,
    pub sentiment: SentimentScore,
    pub profile: Option<ResortProfile>,
    pub links: BookingLinkSet,
}
