//! Core library for the `weather-dashboard` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider behind the [`WeatherProvider`] trait
//! - The fetch controller that owns [`RequestState`]
//! - Pure hourly/daily projections of the forecast series
//! - Display helpers for icons, times and dates
//!
//! It is used by the `weather-dashboard` binary, but any other front end can
//! drive a [`FetchController`] and render its state.

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod reducer;

pub use config::Config;
pub use controller::{FetchController, FetchOutcome, RequestState};
pub use error::{FetchError, InvalidLocation};
pub use model::{CurrentConditions, ForecastSample, ForecastSeries, Location, Units};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use reducer::{CalendarPolicy, daily_view, hourly_view};
