//! Weather data model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current conditions at a resort
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Short forecast text, e.g. "Snow Showers Likely"
    pub summary: String,
    /// Temperature in Fahrenheit, when the forecast period carries one
    pub temperature_f: Option<i32>,
    /// When the conditions were fetched
    pub fetched_at: DateTime<Utc>,
    /// An active weather alert covers the point
    pub alert: bool,
}

impl WeatherSnapshot {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        match self.temperature_f {
            Some(t) => format!("{t}°F"),
            None => "N/A".to_string(),
        }
    }
}

impl fmt::Display for WeatherSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {}", self.format_temperature(), self.summary)?;
        if self.alert {
            write!(f, " ⚠️ Alert")?;
        }
        Ok(())
    }
}

/// Best-effort weather attached after discovery
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WeatherInfo {
    Available(WeatherSnapshot),
    Unavailable,
}

impl WeatherInfo {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, WeatherInfo::Available(_))
    }
}

impl fmt::Display for WeatherInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherInfo::Available(snapshot) => snapshot.fmt(f),
            WeatherInfo::Unavailable => write!(f, "unavailable"),
        }
    }
}
