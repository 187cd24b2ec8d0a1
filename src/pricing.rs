//! Premium pricing for travel insurance
//!
//! Pricing depends only on the destination zone and the trip length. The
//! functions here are pure: no I/O, no clock, same inputs give the same quote.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Pricing tier of a destination
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Local,
    Regional,
    International,
}

impl Zone {
    /// Per-diem rate in currency units per day
    #[must_use]
    pub fn daily_rate(self) -> u32 {
        match self {
            Zone::Local => 5,
            Zone::Regional => 10,
            Zone::International => 15,
        }
    }

    /// Minimum premium charged for a trip in this zone
    #[must_use]
    pub fn minimum_charge(self) -> u32 {
        match self {
            Zone::Local => 50,
            Zone::Regional => 100,
            Zone::International => 200,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Local => "local",
            Zone::Regional => "regional",
            Zone::International => "international",
        }
    }

    /// Zone of a destination; exact, case-sensitive match with an international default
    #[must_use]
    pub fn for_destination(destination: &str) -> Self {
        ZONE_LOOKUP
            .get(destination)
            .copied()
            .unwrap_or(Zone::International)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Fixed destination membership per zone, in selection-list order
static DESTINATION_ZONES: [(Zone, &[&str]); 3] = [
    (
        Zone::Local,
        &["السعودية", "الإمارات", "الكويت", "البحرين", "قطر", "عمان"],
    ),
    (
        Zone::Regional,
        &["مصر", "الأردن", "لبنان", "سوريا", "تونس", "المغرب", "تركيا"],
    ),
    (
        Zone::International,
        &[
            "أمريكا",
            "كندا",
            "بريطانيا",
            "فرنسا",
            "ألمانيا",
            "إيطاليا",
            "أستراليا",
            "اليابان",
            "الصين",
        ],
    ),
];

static ZONE_LOOKUP: Lazy<HashMap<&'static str, Zone>> = Lazy::new(|| {
    DESTINATION_ZONES
        .iter()
        .flat_map(|(zone, destinations)| destinations.iter().map(move |d| (*d, *zone)))
        .collect()
});

/// Quote for a single trip
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub zone: Zone,
    /// Trip length in days, both endpoints included
    pub duration: u32,
    pub base_price: u32,
    pub minimum_price: u32,
    pub price: u32,
}

/// The three fixed zone membership sets
#[must_use]
pub fn destinations_by_zone() -> &'static [(Zone, &'static [&'static str]); 3] {
    &DESTINATION_ZONES
}

/// Every known destination, local first, then regional, then international
#[must_use]
pub fn all_destinations() -> Vec<&'static str> {
    DESTINATION_ZONES
        .iter()
        .flat_map(|(_, destinations)| destinations.iter().copied())
        .collect()
}

/// Compute the premium for a trip
///
/// Returns `None` when any input is empty or a date cannot be parsed. Dates
/// are `YYYY-MM-DD` (midnight UTC) or RFC 3339 timestamps. A reversed range
/// is priced from the absolute difference.
#[must_use]
pub fn calculate_price(destination: &str, start_date: &str, end_date: &str) -> Option<PricingResult> {
    if destination.is_empty() || start_date.is_empty() || end_date.is_empty() {
        return None;
    }

    let start = parse_trip_date(start_date)?;
    let end = parse_trip_date(end_date)?;
    Some(price_for_range(destination, start, end))
}

/// Price an already-parsed date range
#[must_use]
pub fn price_for_range(destination: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> PricingResult {
    let zone = Zone::for_destination(destination);
    let duration = trip_duration_days(start, end);
    let base_price = zone.daily_rate().saturating_mul(duration);
    let minimum_price = zone.minimum_charge();

    PricingResult {
        zone,
        duration,
        base_price,
        minimum_price,
        price: base_price.max(minimum_price),
    }
}

/// Whole days between two instants, rounded up, plus one for the inclusive end
fn trip_duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let millis = (end - start).num_milliseconds().unsigned_abs();
    let days = millis.div_ceil(MILLIS_PER_DAY) + 1;
    u32::try_from(days).unwrap_or(u32::MAX)
}

fn parse_trip_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
