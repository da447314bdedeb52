//! Configuration management for `SkiScout`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SkiScoutError;
use crate::enrichment::MatchPolicy;
use crate::models::SentimentScore;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest search radius offered to the user, in miles
pub const MIN_RADIUS_MILES: u32 = 5;
/// Largest search radius offered to the user, in miles
pub const MAX_RADIUS_MILES: u32 = 100;
/// Radius selector granularity, in miles
pub const RADIUS_STEP_MILES: u32 = 5;

/// Root configuration structure for `SkiScout`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkiScoutConfig {
    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// External collaborator endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,
}

/// HTTP client settings shared by every collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-call timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
    /// User agent sent with every request (api.weather.gov rejects anonymous clients)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in minutes
    #[serde(default = "default_cache_ttl")]
    pub ttl_minutes: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search radius in miles
    #[serde(default = "default_search_radius")]
    pub radius_miles: u32,
    /// How resort names are matched against the reputation table
    #[serde(default)]
    pub sentiment_match: MatchPolicy,
    /// Score assigned when no reputation key matches
    #[serde(default = "default_neutral_sentiment")]
    pub neutral_sentiment: f64,
}

// Default value functions
fn default_http_timeout() -> u32 {
    10
}

fn default_http_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("skiscout/{} (https://github.com/skiscout/skiscout)", crate::VERSION)
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_weather_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u32 {
    30
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("skiscout").to_string_lossy().to_string())
        .unwrap_or_else(|| ".skiscout-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_search_radius() -> u32 {
    25
}

fn default_neutral_sentiment() -> f64 {
    SentimentScore::NEUTRAL
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            overpass_url: default_overpass_url(),
            weather_url: default_weather_url(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_minutes: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_miles: default_search_radius(),
            sentiment_match: MatchPolicy::default(),
            neutral_sentiment: default_neutral_sentiment(),
        }
    }
}

/// Check the radius selector rule: within [5, 100] miles and a multiple of 5.
pub fn validate_radius(radius_miles: u32) -> std::result::Result<(), SkiScoutError> {
    if !(MIN_RADIUS_MILES..=MAX_RADIUS_MILES).contains(&radius_miles) {
        return Err(SkiScoutError::validation(format!(
            "Radius must be between {MIN_RADIUS_MILES} and {MAX_RADIUS_MILES} miles, got {radius_miles}"
        )));
    }
    if radius_miles % RADIUS_STEP_MILES != 0 {
        return Err(SkiScoutError::validation(format!(
            "Radius must be a multiple of {RADIUS_STEP_MILES} miles, got {radius_miles}"
        )));
    }
    Ok(())
}

impl SkiScoutConfig {
    /// Load configuration from `config_path` (or the default location) and
    /// `SKISCOUT_` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. SKISCOUT_HTTP__TIMEOUT_SECONDS=5
        builder = builder.add_source(
            Environment::with_prefix("SKISCOUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SkiScoutConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skiscout").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_http_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.endpoints.geocoding_url.is_empty() {
            self.endpoints.geocoding_url = default_geocoding_url();
        }
        if self.endpoints.overpass_url.is_empty() {
            self.endpoints.overpass_url = default_overpass_url();
        }
        if self.endpoints.weather_url.is_empty() {
            self.endpoints.weather_url = default_weather_url();
        }
        if self.cache.ttl_minutes == 0 {
            self.cache.ttl_minutes = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.search.radius_miles == 0 {
            self.search.radius_miles = default_search_radius();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 120 {
            return Err(SkiScoutError::config("HTTP timeout cannot exceed 120 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(SkiScoutError::config("HTTP max retries cannot exceed 10").into());
        }

        if self.cache.ttl_minutes > 10_080 {
            return Err(
                SkiScoutError::config("Cache TTL cannot exceed 10080 minutes (1 week)").into(),
            );
        }

        validate_radius(self.search.radius_miles)
            .map_err(|e| SkiScoutError::config(format!("search.radius_miles: {e}")))?;

        if !(0.0..=SentimentScore::MAX).contains(&self.search.neutral_sentiment) {
            return Err(SkiScoutError::config(format!(
                "Neutral sentiment must be within [0.0, {}]",
                SentimentScore::MAX
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SkiScoutError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SkiScoutError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("geocoding_url", &self.endpoints.geocoding_url),
            ("overpass_url", &self.endpoints.overpass_url),
            ("weather_url", &self.endpoints.weather_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SkiScoutError::config(format!(
                    "Endpoint {name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
