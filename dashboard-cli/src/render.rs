use std::fmt::Write;

use clap::ValueEnum;
use weather_dashboard_core::{
    CalendarPolicy, RequestState,
    format::{format_date, format_time, icon_url, round_temp},
};

/// Display mode. Only changes the header glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    fn badge(&self) -> &'static str {
        match self {
            Theme::Light => "☀️ Light",
            Theme::Dark => "🌙 Dark",
        }
    }
}

/// Render the whole dashboard for `state` as plain text.
pub fn render(
    state: &RequestState,
    calendar: CalendarPolicy,
    theme: Theme,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_dashboard(&mut out, state, calendar, theme)?;
    Ok(out)
}

fn write_dashboard(
    out: &mut impl Write,
    state: &RequestState,
    calendar: CalendarPolicy,
    theme: Theme,
) -> std::fmt::Result {
    writeln!(out, "Weather Dashboard  [{}]", theme.badge())?;
    writeln!(out)?;

    let (current, forecast) = match state {
        RequestState::Idle => return writeln!(out, "Enter a city name to get started."),
        RequestState::Loading => return writeln!(out, "Loading weather data..."),
        RequestState::Failure { message } => {
            writeln!(out, "{message}")?;
            return writeln!(out, "Try again to reload the default location.");
        }
        RequestState::Success { current, forecast } => (current, forecast),
    };
    let offset = calendar.offset_for(forecast);

    writeln!(out, "Current Weather: {}", current.location_name)?;
    writeln!(
        out,
        "  {}°C  {}  ({})",
        round_temp(current.temperature_c),
        current.description,
        icon_url(&current.icon)
    )?;
    writeln!(out, "  Feels like  {}°C", round_temp(current.feels_like_c))?;
    writeln!(out, "  Humidity    {}%", current.humidity_pct)?;
    writeln!(out, "  Wind        {} m/s", current.wind_speed_mps)?;
    writeln!(out, "  Pressure    {} hPa", current.pressure_hpa)?;
    writeln!(out)?;

    writeln!(out, "24-Hour Forecast")?;
    for sample in state.hourly_view() {
        writeln!(
            out,
            "  {}  {:>4}°  {}",
            format_time(sample.timestamp, offset),
            round_temp(sample.temperature_c),
            sample.description
        )?;
    }
    writeln!(out)?;

    writeln!(out, "7-Day Forecast")?;
    for sample in state.daily_view(calendar) {
        writeln!(
            out,
            "  {:<12} {:>4}° / {:>4}°  {}",
            format_date(sample.timestamp, offset),
            round_temp(sample.temp_max_c),
            round_temp(sample.temp_min_c),
            sample.description
        )?;
    }

    Ok(())
}
