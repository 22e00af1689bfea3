//! Projections of a [`ForecastSeries`] into the hourly and daily views.
//!
//! Both functions are pure: they borrow the series, allocate at most a small
//! vector of references, and never fail. Short or empty input yields a short
//! or empty view.

use std::collections::HashSet;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ForecastSample, ForecastSeries};

/// Samples in the hourly view: 8 steps of 3 hours.
pub const HOURLY_LIMIT: usize = 8;

/// Distinct calendar dates in the daily view.
pub const DAILY_LIMIT: usize = 7;

/// Which clock decides the calendar date of a sample.
///
/// Picked once from configuration and shared by the reducer and the
/// date/time formatting so both agree on where a day starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarPolicy {
    #[default]
    Utc,
    /// Use the forecast location's own UTC offset reported by the provider.
    LocationLocal,
}

impl CalendarPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarPolicy::Utc => "utc",
            CalendarPolicy::LocationLocal => "location",
        }
    }

    pub fn offset_for(&self, series: &ForecastSeries) -> FixedOffset {
        match self {
            CalendarPolicy::Utc => Utc.fix(),
            CalendarPolicy::LocationLocal => series.utc_offset(),
        }
    }
}

impl std::fmt::Display for CalendarPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CalendarPolicy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "utc" => Ok(CalendarPolicy::Utc),
            "location" | "location_local" | "local" => Ok(CalendarPolicy::LocationLocal),
            _ => Err(anyhow::anyhow!(
                "Unknown calendar policy '{value}'. Supported policies: utc, location."
            )),
        }
    }
}

/// The earliest [`HOURLY_LIMIT`] samples, i.e. roughly the next 24 hours.
pub fn hourly_view(series: &ForecastSeries) -> &[ForecastSample] {
    let samples = series.samples();
    &samples[..samples.len().min(HOURLY_LIMIT)]
}

/// First sample of each calendar date, in order of first appearance,
/// capped at [`DAILY_LIMIT`] dates.
pub fn daily_view(series: &ForecastSeries, policy: CalendarPolicy) -> Vec<&ForecastSample> {
    let offset = policy.offset_for(series);
    let mut seen: HashSet<NaiveDate> = HashSet::with_capacity(DAILY_LIMIT);

    series
        .samples()
        .iter()
        .filter(|sample| seen.insert(sample.timestamp.with_timezone(&offset).date_naive()))
        .take(DAILY_LIMIT)
        .collect()
}
