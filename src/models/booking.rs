//! Booking request and link models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SkiScoutError;

/// Date format substituted into every booking URL
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trip length used when no end date is given
pub const DEFAULT_TRIP_DAYS: u32 = 2;

fn parse_date(s: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| SkiScoutError::validation(format!("Invalid date '{s}', expected YYYY-MM-DD")))
}

/// Inclusive trip date range, `from <= to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> crate::Result<Self> {
        if from > to {
            return Err(SkiScoutError::validation(format!(
                "Start date {from} is after end date {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Parse two `YYYY-MM-DD` strings
    pub fn parse(from: &str, to: &str) -> crate::Result<Self> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    /// Today through `days` days from now, local time
    #[must_use]
    pub fn upcoming(days: u32) -> Self {
        let from = chrono::Local::now().date_naive();
        let to = from
            .checked_add_days(chrono::Days::new(u64::from(days)))
            .unwrap_or(from);
        Self { from, to }
    }

    /// Fill in whichever end is missing: the start defaults to today, the end
    /// to two days after the start.
    pub fn parse_or_default(from: Option<&str>, to: Option<&str>) -> crate::Result<Self> {
        let default = Self::upcoming(DEFAULT_TRIP_DAYS);
        let from = match from {
            Some(from) => parse_date(from)?,
            None => default.from,
        };
        let to = match to {
            Some(to) => parse_date(to)?,
            None => from
                .checked_add_days(chrono::Days::new(u64::from(DEFAULT_TRIP_DAYS)))
                .unwrap_or(from),
        };
        Self::new(from, to)
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.from
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.to
    }

    #[must_use]
    pub fn start_str(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    #[must_use]
    pub fn end_str(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }
}

/// Which optional services to produce links for. Tickets are always included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOptions {
    pub lessons: bool,
    pub rental: bool,
}

/// A bookable service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingService {
    Tickets,
    Lessons,
    Rental,
}

impl BookingService {
    /// Label used in exported documents
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            BookingService::Tickets => "Lift Tickets",
            BookingService::Lessons => "Lessons",
            BookingService::Rental => "Rentals",
        }
    }

    /// Keyword used when synthesizing a web-search query
    #[must_use]
    pub fn search_keyword(&self) -> &'static str {
        match self {
            BookingService::Tickets => "lift tickets",
            BookingService::Lessons => "ski lessons",
            BookingService::Rental => "ski rental",
        }
    }
}

impl fmt::Display for BookingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a link set was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum LinkProvider {
    /// Chain-specific template, e.g. "Vail Resorts"
    Template(String),
    /// Synthesized web-search query
    GenericSearch,
}

/// Booking links for one resort. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingLinkSet {
    pub tickets_url: String,
    pub lessons_url: Option<String>,
    pub rental_url: Option<String>,
    pub provider: LinkProvider,
}

impl BookingLinkSet {
    /// Every present link in service order
    #[must_use]
    pub fn links(&self) -> Vec<(BookingService, &str)> {
        let mut links = vec![(BookingService::Tickets, self.tickets_url.as_str())];
        if let Some(url) = &self.lessons_url {
            links.push((BookingService::Lessons, url.as_str()));
        }
        if let Some(url) = &self.rental_url {
            links.push((BookingService::Rental, url.as_str()));
        }
        links
    }
}
