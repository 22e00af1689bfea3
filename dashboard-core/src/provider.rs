use crate::{
    Config,
    error::FetchError,
    model::{CurrentConditions, ForecastSeries, Location},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// Source of current conditions and forecast data for a place name.
///
/// Both calls are made for the same location and unit system; callers treat
/// them as one logical request.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, location: &Location) -> Result<CurrentConditions, FetchError>;

    async fn forecast(&self, location: &Location) -> Result<ForecastSeries, FetchError>;
}

#[async_trait]
impl<P: WeatherProvider + ?Sized> WeatherProvider for Box<P> {
    async fn current(&self, location: &Location) -> Result<CurrentConditions, FetchError> {
        (**self).current(location).await
    }

    async fn forecast(&self, location: &Location) -> Result<ForecastSeries, FetchError> {
        (**self).forecast(location).await
    }
}

/// Construct the OpenWeather provider from config.
///
/// A missing API key is not an error here: the provider is built with an
/// empty key and every call will fail with the provider's 401.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = match config.api_key() {
        Some(key) => key.to_owned(),
        None => {
            tracing::warn!(
                "No OpenWeather API key configured; requests will fail. \
                 Hint: run `weather-dashboard configure` or set OPENWEATHER_API_KEY."
            );
            String::new()
        }
    };

    let mut provider = OpenWeatherProvider::with_base_url(api_key, &config.base_url);
    if let Some(secs) = config.timeout_secs {
        provider = provider.with_timeout(Duration::from_secs(secs))?;
    }

    Ok(Box::new(provider))
}

pub(crate) fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
