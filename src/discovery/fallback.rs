//! Curated resort table used when live discovery comes back empty
//!
//! Entries are pre-vetted, so only the radius filter applies. Some entries also
//! carry pricing and terrain figures that are attached to matching resorts
//! whatever their source.

use async_trait::async_trait;
use tracing::debug;

use super::ResortProvider;
use crate::Result;
use crate::enrichment::MatchPolicy;
use crate::models::{Location, Resort, ResortProfile, ResortSource, resort::sort_by_distance};

#[derive(Debug, Clone)]
pub struct FallbackEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Lowercase keys matched against other resort names, the name itself included
    pub match_keys: Vec<String>,
    pub profile: Option<ResortProfile>,
}

impl FallbackEntry {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
            match_keys: vec![name.to_lowercase()],
            profile: None,
        }
    }

    pub fn alias(mut self, key: &str) -> Self {
        self.match_keys.push(key.to_lowercase());
        self
    }

    pub fn profile(mut self, day_pass_usd: u32, rental_usd: u32, advanced_terrain_pct: u8) -> Self {
        self.profile = Some(ResortProfile {
            day_pass_usd,
            rental_usd,
            advanced_terrain_pct,
        });
        self
    }
}

/// Read-only table, built once at startup and shared
#[derive(Debug, Clone)]
pub struct StaticResortTable {
    entries: Vec<FallbackEntry>,
}

impl StaticResortTable {
    pub fn new(entries: Vec<FallbackEntry>) -> Self {
        Self { entries }
    }

    /// Well-known North American resorts, Tahoe basin first
    pub fn builtin() -> Self {
        Self::new(vec![
            FallbackEntry::new("Northstar California", 39.274, -120.121)
                .alias("northstar")
                .profile(260, 51, 27),
            FallbackEntry::new("Heavenly", 38.935, -119.940).profile(219, 55, 35),
            FallbackEntry::new("Palisades Tahoe", 39.197, -120.235)
                .alias("palisades")
                .alias("squaw valley")
                .profile(269, 60, 33),
            FallbackEntry::new("Kirkwood", 38.685, -120.066).profile(209, 60, 58),
            FallbackEntry::new("Sierra-at-Tahoe", 38.796, -120.080)
                .alias("sierra at tahoe")
                .profile(185, 68, 25),
            FallbackEntry::new("Sugar Bowl", 39.304, -120.334).profile(199, 69, 44),
            FallbackEntry::new("Homewood Mountain Resort", 39.0855, -120.1605).alias("homewood"),
            FallbackEntry::new("Diamond Peak", 39.2540, -119.9230),
            FallbackEntry::new("Mt. Rose Ski Tahoe", 39.3285, -119.8855).alias("mount rose"),
            FallbackEntry::new("Boreal Mountain", 39.3367, -120.3497).alias("boreal"),
            FallbackEntry::new("Mammoth Mountain", 37.6308, -119.0326).alias("mammoth"),
            FallbackEntry::new("Vail", 39.6403, -106.3742),
            FallbackEntry::new("Beaver Creek", 39.6042, -106.5165),
            FallbackEntry::new("Breckenridge", 39.4817, -106.0384),
            FallbackEntry::new("Keystone", 39.6045, -105.9440),
            FallbackEntry::new("Park City Mountain", 40.6514, -111.5080).alias("park city"),
            FallbackEntry::new("Snowbird", 40.5830, -111.6556),
            FallbackEntry::new("Jackson Hole Mountain Resort", 43.5875, -110.8279)
                .alias("jackson hole"),
            FallbackEntry::new("Stowe", 44.5303, -72.7814),
            FallbackEntry::new("Whistler Blackcomb", 50.1163, -122.9574).alias("whistler"),
        ])
    }

    /// Entries within `radius_miles` of `center`, nearest first
    pub fn within(&self, center: &Location, radius_miles: f64) -> Vec<Resort> {
        let mut resorts: Vec<Resort> = self
            .entries
            .iter()
            .map(|entry| Resort {
                name: entry.name.clone(),
                latitude: entry.latitude,
                longitude: entry.longitude,
                distance_miles: center.miles_to(entry.latitude, entry.longitude),
                source: ResortSource::Fallback,
            })
            .filter(|resort| resort.distance_miles <= radius_miles)
            .collect();
        sort_by_distance(&mut resorts);
        resorts
    }

    /// Pricing profile for a resort name, matched with `policy`
    pub fn profile_for(&self, name: &str, policy: MatchPolicy) -> Option<ResortProfile> {
        let entry = policy.best_match(
            name,
            self.entries
                .iter()
                .filter(|entry| entry.profile.is_some())
                .flat_map(|entry| entry.match_keys.iter().map(move |key| (key.as_str(), entry))),
        )?;
        debug!("Profile for '{}' from table entry '{}'", name, entry.name);
        entry.profile
    }
}

#[async_trait]
impl ResortProvider for StaticResortTable {
    fn label(&self) -> &'static str {
        "static table"
    }

    async fn resorts_near(&self, center: &Location, radius_miles: f64) -> Result<Vec<Resort>> {
        Ok(self.within(center, radius_miles))
    }
}
