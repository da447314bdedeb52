//! Inclusion/exclusion policy over raw map features
//!
//! A feature is kept only when it is tagged as a ski resort (`leisure=ski_resort`)
//! or a skiing area (`sport=skiing`) and carries a name. Exclusion wins over
//! inclusion: any disqualifying substring in the name or tags drops the feature.

use std::fmt;
use tracing::debug;

use super::RawFeature;

/// Substrings that mark trails, roads, car parks and rental shops
pub const DEFAULT_EXCLUSIONS: &[&str] = &["trail", "road", "loop", "parking", "rental", "shop"];

/// Free-text and postal-address tag keys that are not inspected for exclusion
/// terms. An address says where a feature is, not what it is.
const UNINSPECTED_KEY_PREFIXES: &[&str] = &[
    "addr:",
    "website",
    "url",
    "contact:",
    "wikipedia",
    "wikidata",
    "image",
    "source",
    "description",
    "note",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Include,
    MissingName,
    NotSkiArea,
    Excluded { term: String },
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterDecision::Include => write!(f, "include"),
            FilterDecision::MissingName => write!(f, "no name"),
            FilterDecision::NotSkiArea => write!(f, "not tagged as ski area"),
            FilterDecision::Excluded { term } => write!(f, "excluded by '{term}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureFilter {
    exclusions: Vec<String>,
}

impl Default for FeatureFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS.iter().copied())
    }
}

impl FeatureFilter {
    pub fn new<'a>(exclusions: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            exclusions: exclusions.into_iter().map(str::to_lowercase).collect(),
        }
    }

    pub fn decide(&self, feature: &RawFeature) -> FilterDecision {
        if let Some(term) = self.exclusion_hit(feature) {
            return FilterDecision::Excluded {
                term: term.to_string(),
            };
        }
        if !is_ski_area(feature) {
            return FilterDecision::NotSkiArea;
        }
        match feature.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => FilterDecision::Include,
            _ => FilterDecision::MissingName,
        }
    }

    pub fn accepts(&self, feature: &RawFeature) -> bool {
        let decision = self.decide(feature);
        debug!(
            "Feature {} ({}): {}",
            feature.id,
            feature.name.as_deref().unwrap_or("<unnamed>"),
            decision
        );
        decision == FilterDecision::Include
    }

    fn exclusion_hit(&self, feature: &RawFeature) -> Option<&str> {
        let name = feature.name.as_deref().unwrap_or_default().to_lowercase();
        let tag_text: Vec<String> = feature
            .tags
            .iter()
            .filter(|(key, _)| {
                !UNINSPECTED_KEY_PREFIXES
                    .iter()
                    .any(|prefix| key.starts_with(prefix))
            })
            .flat_map(|(key, value)| [key.to_lowercase(), value.to_lowercase()])
            .collect();

        self.exclusions
            .iter()
            .find(|term| name.contains(term.as_str()) || tag_text.iter().any(|t| t.contains(term.as_str())))
            .map(String::as_str)
    }
}

fn is_ski_area(feature: &RawFeature) -> bool {
    let tag = |key: &str| feature.tags.get(key).map(|v| v.trim().to_lowercase());
    if tag("leisure").as_deref() == Some("ski_resort") {
        return true;
    }
    tag("sport").is_some_and(|sport| sport.split(';').any(|s| s.trim() == "skiing"))
}
