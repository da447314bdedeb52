//! End-to-end runs of the scouting pipeline against in-memory collaborators

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use skiscout::config::SearchConfig;
use skiscout::logging;
use skiscout::discovery::{BoundingBox, FeatureSource, RawFeature};
use skiscout::enrichment::WeatherSource;
use skiscout::export::export_links;
use skiscout::geocode::Geocoder;
use skiscout::models::{
    BookingOptions, DateRange, LinkProvider, Location, ResortSource, SentimentScore, WeatherInfo,
    WeatherSnapshot,
};
use skiscout::pipeline::{
    Collaborators, ReferenceTables, ScoutPipeline, ScoutReport, SearchRequest,
};
use skiscout::{Result, SkiScoutError};

const TAHOE: (f64, f64) = (39.0968, -120.0324);

/// Knows Lake Tahoe only; counts calls
#[derive(Default)]
struct TahoeGeocoder {
    calls: AtomicUsize,
}

#[async_trait]
impl Geocoder for TahoeGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query.to_lowercase().contains("tahoe") {
            Ok(Some(Location::new(TAHOE.0, TAHOE.1, "Lake Tahoe, California".to_string())))
        } else {
            Ok(None)
        }
    }
}

struct DownGeocoder;

#[async_trait]
impl Geocoder for DownGeocoder {
    async fn geocode(&self, _query: &str) -> Result<Option<Location>> {
        Err(SkiScoutError::api("geocoder unreachable"))
    }
}

struct Features(Vec<RawFeature>);

#[async_trait]
impl FeatureSource for Features {
    async fn search(&self, _bbox: &BoundingBox) -> Result<Vec<RawFeature>> {
        Ok(self.0.clone())
    }
}

struct FeaturesDown;

#[async_trait]
impl FeatureSource for FeaturesDown {
    async fn search(&self, _bbox: &BoundingBox) -> Result<Vec<RawFeature>> {
        Err(SkiScoutError::api("504 Gateway Timeout"))
    }
}

/// Snow everywhere, except it hangs south of 39.0° and fails east of -120.0°
struct PatchyWeather;

#[async_trait]
impl WeatherSource for PatchyWeather {
    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot> {
        if latitude < 39.0 {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if longitude > -120.0 {
            return Err(SkiScoutError::api("outside coverage"));
        }
        Ok(WeatherSnapshot {
            summary: "Snow Showers".to_string(),
            temperature_f: Some(28),
            fetched_at: Utc::now(),
            alert: false,
        })
    }
}

fn feature(id: i64, name: &str, lat: f64, lon: f64, tags: &[(&str, &str)]) -> RawFeature {
    let mut all_tags: BTreeMap<String, String> = tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    all_tags.insert("name".to_string(), name.to_string());
    RawFeature {
        id,
        kind: "way".to_string(),
        name: Some(name.to_string()),
        latitude: lat,
        longitude: lon,
        tags: all_tags,
    }
}

fn pipeline(
    geocoder: Arc<dyn Geocoder>,
    features: Arc<dyn FeatureSource>,
) -> ScoutPipeline {
    ScoutPipeline::new(
        Collaborators {
            geocoder,
            features,
            weather: Arc::new(PatchyWeather),
        },
        ReferenceTables::builtin(&SearchConfig::default()).unwrap(),
        Duration::from_millis(200),
    )
}

fn request(location: &str, radius: u32, options: BookingOptions) -> SearchRequest {
    let dates = DateRange::parse("2024-01-10", "2024-01-15").unwrap();
    SearchRequest::new(location, radius, dates, options).unwrap()
}

#[tokio::test]
async fn test_lake_tahoe_falls_back_to_curated_table() {
    let pipeline = pipeline(Arc::new(TahoeGeocoder::default()), Arc::new(Features(vec![])));
    let report = pipeline
        .run(&request("Lake Tahoe, CA", 20, BookingOptions::default()))
        .await
        .unwrap();

    assert!(report.used_fallback);
    let names: Vec<_> = report.resorts.iter().map(|r| r.resort.name.as_str()).collect();
    assert!(names.contains(&"Heavenly"), "{names:?}");
    assert!(names.contains(&"Northstar California"), "{names:?}");
    assert!(!names.contains(&"Kirkwood"));

    for pair in report.resorts.windows(2) {
        assert!(pair[0].resort.distance_miles <= pair[1].resort.distance_miles);
    }
    for scouted in &report.resorts {
        assert_eq!(scouted.resort.source, ResortSource::Fallback);
        assert!(scouted.resort.distance_miles <= 20.0);
        assert!(scouted.links.tickets_url.starts_with("https://"));
        assert!(scouted.links.lessons_url.is_none());
        let score = scouted.sentiment.value();
        assert!((SentimentScore::MIN..=SentimentScore::MAX).contains(&score));
    }

    let northstar = report
        .resorts
        .iter()
        .find(|r| r.resort.name == "Northstar California")
        .unwrap();
    assert_eq!(
        northstar.links.provider,
        LinkProvider::Template("Vail Resorts".to_string())
    );
    assert_eq!(northstar.profile.unwrap().day_pass_usd, 260);
}

#[tokio::test]
async fn test_live_results_are_filtered_exclusion_first() {
    let features = Features(vec![
        feature(1, "Homewood", 39.0855, -120.1605, &[("leisure", "ski_resort")]),
        feature(2, "Heavenly Rental Shop", 38.936, -119.941, &[("leisure", "ski_resort")]),
        feature(3, "Tahoe Rim Trail", 39.10, -120.05, &[("sport", "skiing")]),
        feature(4, "Granlibakken", 39.155, -120.14, &[("sport", "skiing;sledding")]),
        feature(5, "Lakeside Beach", 39.10, -120.04, &[("leisure", "beach_resort")]),
        feature(6, "Dodge Ridge", 38.19, -119.95, &[("leisure", "ski_resort")]),
        feature(7, "Tahoe Donner Parking", 39.34, -120.25, &[("amenity", "parking"), ("leisure", "ski_resort")]),
    ]);
    let pipeline = pipeline(Arc::new(TahoeGeocoder::default()), Arc::new(features));
    let report = pipeline
        .run(&request("Lake Tahoe", 25, BookingOptions::default()))
        .await
        .unwrap();

    assert!(!report.used_fallback);
    let mut names: Vec<_> = report.resorts.iter().map(|r| r.resort.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Granlibakken", "Homewood"]);
    assert!(report.resorts.iter().all(|r| r.resort.source == ResortSource::Live));
    for pair in report.resorts.windows(2) {
        assert!(pair[0].resort.distance_miles <= pair[1].resort.distance_miles);
    }
}

#[tokio::test]
async fn test_failed_live_search_still_returns_resorts() {
    let pipeline = pipeline(Arc::new(TahoeGeocoder::default()), Arc::new(FeaturesDown));
    let report = pipeline
        .run(&request("Lake Tahoe", 20, BookingOptions::default()))
        .await
        .unwrap();
    assert!(report.used_fallback);
    assert!(!report.resorts.is_empty());
}

#[tokio::test]
async fn test_slow_or_failing_weather_is_unavailable_without_reordering() {
    let pipeline = pipeline(Arc::new(TahoeGeocoder::default()), Arc::new(Features(vec![])));
    let report = pipeline
        .run(&request("Lake Tahoe", 20, BookingOptions::default()))
        .await
        .unwrap();

    for scouted in &report.resorts {
        let expect_weather = scouted.resort.latitude >= 39.0 && scouted.resort.longitude <= -120.0;
        assert_eq!(
            scouted.weather.is_available(),
            expect_weather,
            "{}",
            scouted.resort.name
        );
    }
    // Heavenly (south of 39.0°) times out
    let heavenly = report.resorts.iter().find(|r| r.resort.name == "Heavenly").unwrap();
    assert_eq!(heavenly.weather, WeatherInfo::Unavailable);
    for pair in report.resorts.windows(2) {
        assert!(pair[0].resort.distance_miles <= pair[1].resort.distance_miles);
    }
}

#[tokio::test]
async fn test_unknown_location_ends_run_but_not_pipeline() {
    let geocoder = Arc::new(TahoeGeocoder::default());
    let pipeline = pipeline(geocoder.clone(), Arc::new(Features(vec![])));

    let err = pipeline
        .run(&request("Atlantis", 20, BookingOptions::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, SkiScoutError::LocationNotFound { .. }));

    let report = pipeline
        .run(&request("Lake Tahoe", 20, BookingOptions::default()))
        .await
        .unwrap();
    assert!(!report.resorts.is_empty());
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_geocoder_outage_is_location_not_found() {
    let pipeline = pipeline(Arc::new(DownGeocoder), Arc::new(Features(vec![])));
    let err = pipeline
        .run(&request("Lake Tahoe", 20, BookingOptions::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, SkiScoutError::LocationNotFound { .. }));
}

#[tokio::test]
async fn test_coordinates_skip_the_geocoder() {
    let pipeline = pipeline(Arc::new(DownGeocoder), Arc::new(Features(vec![])));
    let report = pipeline
        .run(&request("39.0968,-120.0324", 20, BookingOptions::default()))
        .await
        .unwrap();
    assert!(report.resorts.iter().any(|r| r.resort.name == "Heavenly"));
}

#[tokio::test]
async fn test_export_document_lists_requested_services() {
    let features = Features(vec![
        feature(1, "Northstar", 39.274, -120.121, &[("leisure", "ski_resort")]),
        feature(2, "Backyard Hill", 39.10, -120.03, &[("sport", "skiing")]),
    ]);
    let pipeline = pipeline(Arc::new(TahoeGeocoder::default()), Arc::new(features));
    let options = BookingOptions {
        lessons: true,
        rental: false,
    };
    let report = pipeline.run(&request("Lake Tahoe", 20, options)).await.unwrap();
    let document = export_links(&report.resorts);
    let lines: Vec<_> = document.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Backyard Hill - Lift Tickets: https://www.google.com/search?q="));
    assert!(lines[1].starts_with("Backyard Hill - Lessons: https://www.google.com/search?q="));
    assert_eq!(
        lines[2],
        "Northstar - Lift Tickets: https://www.northstarcalifornia.com/plan-your-trip/lift-access/tickets.aspx?startDate=2024-01-10&endDate=2024-01-15"
    );
    assert!(lines[3].starts_with("Northstar - Lessons: https://www.northstarcalifornia.com/"));
}

/// Everything in a report that does not depend on wall-clock time
fn stable_view(report: &ScoutReport) -> Vec<(String, String, bool, f64, String)> {
    report
        .resorts
        .iter()
        .map(|r| {
            (
                r.resort.name.clone(),
                format!("{:.6}", r.resort.distance_miles),
                r.weather.is_available(),
                r.sentiment.value(),
                r.links.tickets_url.clone(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_debug_tracing_does_not_change_results() {
    let features = Features(vec![
        feature(1, "Homewood", 39.0855, -120.1605, &[("leisure", "ski_resort")]),
        feature(2, "Heavenly Rental Shop", 38.936, -119.941, &[("leisure", "ski_resort")]),
    ]);
    let pipeline = pipeline(Arc::new(TahoeGeocoder::default()), Arc::new(features));
    let options = BookingOptions {
        lessons: true,
        rental: true,
    };

    let plain = pipeline.run(&request("Lake Tahoe", 20, options)).await.unwrap();

    let filter = logging::apply_debug(tracing_subscriber::EnvFilter::new("warn"), true).unwrap();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .finish();
    let traced = {
        let _guard = tracing::subscriber::set_default(subscriber);
        pipeline.run(&request("Lake Tahoe", 20, options)).await.unwrap()
    };

    assert_eq!(stable_view(&plain), stable_view(&traced));
    assert_eq!(export_links(&plain.resorts), export_links(&traced.resorts));
    assert_eq!(plain.used_fallback, traced.used_fallback);
}
