//! Data models for `SkiScout`
//!
//! This module contains the core domain models organized by concern:
//! - Location: geocoded search origin
//! - Resort: discovered ski areas and their provenance
//! - Weather: best-effort current conditions
//! - Sentiment: static reputation scores
//! - Booking: date ranges, services and generated links

pub mod booking;
pub mod location;
pub mod resort;
pub mod sentiment;
pub mod weather;

// Re-export all public types for convenient access
pub use booking::{BookingLinkSet, BookingOptions, BookingService, DateRange, LinkProvider};
pub use location::{Location, LocationInput};
pub use resort::{Resort, ResortProfile, ResortSource, ScoutedResort};
pub use sentiment::{Mood, SentimentScore};
pub use weather::{WeatherInfo, WeatherSnapshot};
