//! `SkiScout` - find ski resorts near a location
//!
//! Geocodes a free-text location, discovers nearby resorts (live map search
//! with a curated fallback), attaches current weather and a static reputation
//! score, and resolves pre-filled booking links for a date range.

pub mod api;
pub mod booking;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod geocode;
pub mod http;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod web;

// Re-export core types for public API
pub use booking::BookingCatalog;
pub use cache::PersistentCache;
pub use config::SkiScoutConfig;
pub use discovery::{Discovery, StaticResortTable, discover};
pub use enrichment::{Enricher, MatchPolicy, ReputationTable};
pub use error::SkiScoutError;
pub use geocode::{Geocoder, LocationResolver};
pub use models::{
    BookingLinkSet, BookingOptions, DateRange, Location, Resort, ResortSource, ScoutedResort,
    SentimentScore, WeatherInfo,
};
pub use pipeline::{ScoutPipeline, ScoutReport, SearchRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SkiScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
