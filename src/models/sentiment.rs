//! Static reputation score attached to each resort

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pre-scored reputation estimate in [0.0, 0.30]. Not a live text analysis.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SentimentScore(f64);

impl SentimentScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 0.30;
    /// Score used when a resort has no curated entry
    pub const NEUTRAL: f64 = 0.15;

    /// Create a score, clamping into the valid range. NaN becomes neutral.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::NEUTRAL);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    #[must_use]
    pub fn neutral() -> Self {
        Self(Self::NEUTRAL)
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn mood(&self) -> Mood {
        if self.0 > 0.25 {
            Mood::Stoked
        } else if self.0 > Self::NEUTRAL {
            Mood::Positive
        } else {
            Mood::Neutral
        }
    }
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Coarse banding of a reputation score for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Stoked,
    Positive,
    Neutral,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Stoked => write!(f, "😍 stoked"),
            Mood::Positive => write!(f, "😊 positive"),
            Mood::Neutral => write!(f, "😐 neutral"),
        }
    }
}
