use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, InvalidLocation};

/// Free-text place name used as the provider query key.
///
/// Never empty. The text is sent to the provider exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(String);

impl Location {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidLocation> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InvalidLocation);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Location {
    type Err = InvalidLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Location {
    type Error = InvalidLocation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.0
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unit system sent with every provider query. Only metric is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub pressure_hpa: u32,
    pub description: String,
    pub icon: String,
    /// When the request was issued, not the provider's observation time.
    pub fetched_at: DateTime<Utc>,
}

/// One 3-hour step of the provider's forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub icon: String,
    pub description: String,
}

/// Ordered forecast samples as delivered by the provider.
///
/// Timestamps are strictly increasing; `new` refuses anything else so the
/// projections in [`crate::reducer`] can rely on series order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawForecastSeries")]
pub struct ForecastSeries {
    samples: Vec<ForecastSample>,
    /// Offset of the forecast location from UTC, as reported by the provider.
    utc_offset_secs: i32,
}

#[derive(Deserialize)]
struct RawForecastSeries {
    samples: Vec<ForecastSample>,
    utc_offset_secs: i32,
}

impl TryFrom<RawForecastSeries> for ForecastSeries {
    type Error = FetchError;

    fn try_from(raw: RawForecastSeries) -> Result<Self, Self::Error> {
        Self::new(raw.samples, raw.utc_offset_secs)
    }
}

impl ForecastSeries {
    pub fn new(samples: Vec<ForecastSample>, utc_offset_secs: i32) -> Result<Self, FetchError> {
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[0].timestamp >= pair[1].timestamp)
        {
            return Err(FetchError::Malformed(format!(
                "forecast timestamps out of order: {} then {}",
                pair[0].timestamp, pair[1].timestamp
            )));
        }

        if FixedOffset::east_opt(utc_offset_secs).is_none() {
            return Err(FetchError::Malformed(format!(
                "forecast utc offset out of range: {utc_offset_secs}s"
            )));
        }

        Ok(Self { samples, utc_offset_secs })
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self { samples: Vec::new(), utc_offset_secs: 0 }
    }

    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn utc_offset(&self) -> FixedOffset {
        // Range is checked in `new`; `empty` uses zero.
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> ForecastSample {
        ForecastSample {
            timestamp: DateTime::from_timestamp(ts, 0).expect("valid timestamp"),
            temperature_c: 10.0,
            temp_min_c: 9.0,
            temp_max_c: 11.0,
            icon: "01d".into(),
            description: "clear sky".into(),
        }
    }

    #[test]
    fn location_rejects_blank_input() {
        assert!(Location::new("").is_err());
        assert!(Location::new("   ").is_err());
        assert!("\t\n".parse::<Location>().is_err());
    }

    #[test]
    fn location_keeps_text_verbatim() {
        let loc = Location::new(" São Paulo ").expect("non-empty");
        assert_eq!(loc.as_str(), " São Paulo ");
        assert_eq!(loc.to_string(), " São Paulo ");
    }

    #[test]
    fn location_deserialize_validates() {
        let ok: Location = serde_json::from_str("\"London\"").expect("valid");
        assert_eq!(ok.as_str(), "London");

        assert!(serde_json::from_str::<Location>("\"\"").is_err());
    }

    #[test]
    fn series_accepts_increasing_timestamps() {
        let series = ForecastSeries::new(vec![sample(0), sample(10_800), sample(21_600)], 3600)
            .expect("ordered series");

        assert_eq!(series.len(), 3);
        assert_eq!(series.utc_offset().local_minus_utc(), 3600);
    }

    #[test]
    fn series_rejects_duplicate_or_decreasing_timestamps() {
        let err = ForecastSeries::new(vec![sample(10_800), sample(10_800)], 0).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));

        let err = ForecastSeries::new(vec![sample(10_800), sample(0)], 0).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn series_rejects_impossible_offset() {
        let err = ForecastSeries::new(vec![sample(0)], 90_000).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn deserialize_keeps_order_check() {
        let ordered = ForecastSeries::new(vec![sample(0), sample(10_800)], 0).expect("ordered");
        let json = serde_json::to_string(&ordered).expect("serialize");
        let back: ForecastSeries = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ordered);

        let unordered = serde_json::json!({
            "samples": [sample(10_800), sample(0)],
            "utc_offset_secs": 0,
        });
        let err = serde_json::from_value::<ForecastSeries>(unordered).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn deserialize_rejects_impossible_offset() {
        let json = serde_json::json!({ "samples": [sample(0)], "utc_offset_secs": 90_000 });
        assert!(serde_json::from_value::<ForecastSeries>(json).is_err());
    }

    #[test]
    fn empty_series_is_empty() {
        let series = ForecastSeries::empty();
        assert!(series.is_empty());
        assert_eq!(series.utc_offset().local_minus_utc(), 0);
    }

    #[test]
    fn units_query_value() {
        assert_eq!(Units::Metric.as_str(), "metric");
        assert_eq!(Units::default(), Units::Metric);
    }
}
