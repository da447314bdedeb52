//! Text renderings of a scouting run: the link export document and the CLI table

use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::Result;
use crate::models::ScoutedResort;

/// One line per link, `"<Resort Name> - <Service>: <URL>"`, grouped by resort
/// in the given order.
#[must_use]
pub fn export_links(resorts: &[ScoutedResort]) -> String {
    let mut document = String::new();
    for scouted in resorts {
        for (service, url) in scouted.links.links() {
            let _ = writeln!(
                document,
                "{} - {}: {}",
                scouted.resort.name,
                service.label(),
                url
            );
        }
    }
    document
}

/// Write the export document to `path`
pub async fn write_export(path: impl AsRef<Path>, resorts: &[ScoutedResort]) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, export_links(resorts)).await?;
    info!("Exported booking links for {} resorts to {}", resorts.len(), path.display());
    Ok(())
}

/// Plain-text table for terminal output
#[must_use]
pub fn render_table(resorts: &[ScoutedResort], with_rental: bool) -> String {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:<28} {:>7}  {:<8}  {:<36}  {:<16}  {:>8}",
        "Resort", "Miles", "Source", "Weather", "Reputation", "Day cost"
    );
    let _ = writeln!(table, "{}", "-".repeat(112));

    for scouted in resorts {
        let cost = scouted
            .profile
            .map(|p| format!("${}", p.total_day_cost_usd(with_rental)))
            .unwrap_or_else(|| "-".to_string());
        let reputation = format!(
            "{:.2} {}",
            scouted.sentiment.value(),
            scouted.sentiment.mood()
        );
        let _ = writeln!(
            table,
            "{:<28} {:>7.1}  {:<8}  {:<36}  {:<16}  {:>8}",
            truncate(&scouted.resort.name, 28),
            scouted.resort.distance_miles,
            scouted.resort.source,
            truncate(&scouted.weather.to_string(), 36),
            reputation,
            cost
        );
    }
    table
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
