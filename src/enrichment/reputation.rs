//! Static reputation table
//!
//! Resort names are scored by lookup against curated keys. This is a
//! pre-scored table, not a live sentiment analysis.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::SentimentScore;

/// How a resort name is compared against curated keys. Comparison is
/// case-insensitive. When several keys match, the longest (most specific) key
/// wins, ties broken alphabetically, so "Palisades Tahoe" matches "palisades"
/// rather than "tahoe".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Whole name equals the key
    Exact,
    /// Name starts with the key
    Prefix,
    /// Key appears anywhere in the name
    #[default]
    Substring,
}

impl MatchPolicy {
    #[must_use]
    pub fn matches(&self, name: &str, key: &str) -> bool {
        let name = normalize(name);
        let key = normalize(key);
        if key.is_empty() {
            return false;
        }
        match self {
            MatchPolicy::Exact => name == key,
            MatchPolicy::Prefix => name.starts_with(&key),
            MatchPolicy::Substring => name.contains(&key),
        }
    }

    /// Value of the most specific matching key
    pub fn best_match<'a, T>(
        &self,
        name: &str,
        candidates: impl IntoIterator<Item = (&'a str, T)>,
    ) -> Option<T> {
        candidates
            .into_iter()
            .filter(|(key, _)| self.matches(name, key))
            .min_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
            .map(|(_, value)| value)
    }
}

/// Lowercase and collapse runs of whitespace
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Read-only name to score mapping, built once and shared
#[derive(Debug, Clone)]
pub struct ReputationTable {
    entries: Vec<(String, SentimentScore)>,
    policy: MatchPolicy,
    neutral: SentimentScore,
}

impl ReputationTable {
    pub fn new(entries: impl IntoIterator<Item = (String, f64)>, policy: MatchPolicy) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, score)| (normalize(&key), SentimentScore::new(score)))
                .collect(),
            policy,
            neutral: SentimentScore::neutral(),
        }
    }

    #[must_use]
    pub fn with_neutral(mut self, neutral: f64) -> Self {
        self.neutral = SentimentScore::new(neutral);
        self
    }

    /// Curated scores for well-known resorts
    pub fn builtin(policy: MatchPolicy) -> Self {
        let entries = [
            ("kirkwood", 0.27),
            ("palisades", 0.24),
            ("squaw", 0.24),
            ("sugar bowl", 0.25),
            ("heavenly", 0.21),
            ("northstar", 0.18),
            ("sierra-at-tahoe", 0.16),
            ("sierra at tahoe", 0.16),
            ("homewood", 0.20),
            ("diamond peak", 0.19),
            ("mt. rose", 0.20),
            ("mount rose", 0.20),
            ("boreal", 0.12),
            ("mammoth", 0.23),
            ("vail", 0.19),
            ("beaver creek", 0.20),
            ("breckenridge", 0.17),
            ("keystone", 0.14),
            ("park city", 0.16),
            ("snowbird", 0.28),
            ("jackson hole", 0.29),
            ("stowe", 0.18),
            ("whistler", 0.26),
            ("tahoe", 0.17),
        ];
        Self::new(
            entries.into_iter().map(|(k, v)| (k.to_string(), v)),
            policy,
        )
    }

    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Score for a resort name, neutral when no key matches
    #[must_use]
    pub fn score(&self, name: &str) -> SentimentScore {
        let hit = self.policy.best_match(
            name,
            self.entries.iter().map(|(key, score)| (key.as_str(), (key, *score))),
        );
        match hit {
            Some((key, score)) => {
                debug!("Reputation for '{}' from key '{}': {:.2}", name, key, score.value());
                score
            }
            None => {
                debug!("No reputation key for '{}', using neutral", name);
                self.neutral
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MatchPolicy::Exact, "Heavenly", "heavenly", true)]
    #[case(MatchPolicy::Exact, "Heavenly Mountain Resort", "heavenly", false)]
    #[case(MatchPolicy::Prefix, "Heavenly Mountain Resort", "heavenly", true)]
    #[case(MatchPolicy::Prefix, "Ski Heavenly", "heavenly", false)]
    #[case(MatchPolicy::Substring, "Ski Heavenly", "heavenly", true)]
    #[case(MatchPolicy::Substring, "Sugar  Bowl Resort", "sugar bowl", true)]
    fn test_policy_matching(
        #[case] policy: MatchPolicy,
        #[case] name: &str,
        #[case] key: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(policy.matches(name, key), expected);
    }

    #[test]
    fn test_most_specific_key_wins() {
        let table = ReputationTable::builtin(MatchPolicy::Substring);
        assert_eq!(table.score("Palisades Tahoe").value(), 0.24);
        assert_eq!(table.score("Tahoe Donner").value(), 0.17);
        assert_eq!(table.score("NORTHSTAR CALIFORNIA").value(), 0.18);
    }

    #[test]
    fn test_unknown_name_is_neutral() {
        let table = ReputationTable::builtin(MatchPolicy::Substring);
        assert_eq!(table.score("Backyard Hill").value(), SentimentScore::NEUTRAL);

        let table = table.with_neutral(0.1);
        assert_eq!(table.score("Backyard Hill").value(), 0.1);
    }

    #[test]
    fn test_exact_policy_is_strict() {
        let table = ReputationTable::builtin(MatchPolicy::Exact);
        assert_eq!(table.score("palisades").value(), 0.24);
        assert_eq!(table.score("Palisades Tahoe").value(), SentimentScore::NEUTRAL);
    }

    #[test]
    fn test_scores_are_bounded() {
        let table = ReputationTable::new(
            [("steep".to_string(), 0.8), ("flat".to_string(), -1.0)],
            MatchPolicy::Substring,
        );
        assert_eq!(table.score("Steep Peak").value(), 0.30);
        assert_eq!(table.score("Flat Hill").value(), 0.0);
    }
}
