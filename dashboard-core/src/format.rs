//! Display helpers for the rendering surface. None of these can fail.

use chrono::{DateTime, FixedOffset, Utc};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Image URL for a provider icon id such as `"10d"`.
pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@2x.png")
}

/// Time of day as `HH:MM` (24-hour) at `offset`.
pub fn format_time(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp.with_timezone(&offset).format("%H:%M").to_string()
}

/// Short weekday, month and day, e.g. `Fri, Mar 1`.
pub fn format_date(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp.with_timezone(&offset).format("%a, %b %-d").to_string()
}

/// Whole degrees for display; halves round up, so -2.5 shows as -2.
pub fn round_temp(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid")
    }

    #[test]
    fn icon_url_template() {
        assert_eq!(icon_url("10d"), "https://openweathermap.org/img/wn/10d@2x.png");
    }

    #[test]
    fn time_in_utc_and_offset() {
        let ts = utc(2024, 3, 1, 21, 5);

        assert_eq!(format_time(ts, Utc.fix()), "21:05");

        let plus_three = FixedOffset::east_opt(3 * 3600).expect("valid offset");
        assert_eq!(format_time(ts, plus_three), "00:05");
    }

    #[test]
    fn date_uses_short_names() {
        let ts = utc(2024, 3, 1, 12, 0);
        assert_eq!(format_date(ts, Utc.fix()), "Fri, Mar 1");

        let minus_thirteen = FixedOffset::west_opt(13 * 3600).expect("valid offset");
        assert_eq!(format_date(ts, minus_thirteen), "Thu, Feb 29");
    }

    #[test]
    fn rounding() {
        assert_eq!(round_temp(21.5), 22);
        assert_eq!(round_temp(21.49), 21);
        assert_eq!(round_temp(-0.5), 0);
        assert_eq!(round_temp(-2.5), -2);
        assert_eq!(round_temp(-2.51), -3);
        assert_eq!(round_temp(-3.2), -3);
    }
}
