use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{CurrentConditions, ForecastSample, ForecastSeries, Location, Units},
    provider::unix_to_utc,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            units: Units::Metric,
            http: Client::new(),
        }
    }

    /// Rebuild the HTTP client with a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, FetchError> {
        self.http = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    async fn get(&self, endpoint: &str, location: &Location) -> Result<String, FetchError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await?;

        read_body(res).await
    }
}

async fn read_body(res: Response) -> Result<String, FetchError> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(FetchError::Provider { status, body: truncate_body(&body) });
    }

    Ok(body)
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

fn first_weather(weather: Vec<OwWeather>, what: &str) -> Result<OwWeather, FetchError> {
    weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Malformed(format!("{what} has an empty weather list")))
}

fn parse_current(body: &str) -> Result<CurrentConditions, FetchError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)?;
    let weather = first_weather(parsed.weather, "current conditions")?;

    Ok(CurrentConditions {
        location_name: parsed.name,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        pressure_hpa: parsed.main.pressure,
        description: weather.description,
        icon: weather.icon,
        fetched_at: Utc::now(),
    })
}

fn parse_forecast(body: &str) -> Result<ForecastSeries, FetchError> {
    let parsed: OwForecastResponse = serde_json::from_str(body)?;

    let samples = parsed
        .list
        .into_iter()
        .map(|entry| {
            let timestamp = unix_to_utc(entry.dt).ok_or_else(|| {
                FetchError::Malformed(format!("forecast timestamp {} out of range", entry.dt))
            })?;
            let weather = first_weather(entry.weather, "forecast entry")?;

            Ok(ForecastSample {
                timestamp,
                temperature_c: entry.main.temp,
                temp_min_c: entry.main.temp_min,
                temp_max_c: entry.main.temp_max,
                icon: weather.icon,
                description: weather.description,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    ForecastSeries::new(samples, parsed.city.timezone)
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &Location) -> Result<CurrentConditions, FetchError> {
        tracing::debug!(%location, "requesting current conditions");
        let body = self.get("weather", location).await?;
        parse_current(&body)
    }

    async fn forecast(&self, location: &Location) -> Result<ForecastSeries, FetchError> {
        tracing::debug!(%location, "requesting forecast series");
        let body = self.get("forecast", location).await?;
        parse_forecast(&body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_body() -> serde_json::Value {
        json!({
            "name": "London",
            "dt": 1_709_251_200,
            "main": {
                "temp": 7.4, "feels_like": 4.9, "temp_min": 6.1, "temp_max": 8.3,
                "humidity": 81, "pressure": 1012
            },
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "wind": {"speed": 4.6, "deg": 240}
        })
    }

    fn forecast_body(count: i64) -> serde_json::Value {
        let list: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "dt": 1_709_251_200 + i * 10_800,
                    "main": {
                        "temp": 5.0 + i as f64, "feels_like": 3.0, "temp_min": 4.0,
                        "temp_max": 6.0 + i as f64, "humidity": 70, "pressure": 1010
                    },
                    "weather": [{"description": "overcast clouds", "icon": "04n"}],
                    "wind": {"speed": 3.1}
                })
            })
            .collect();

        json!({
            "cod": "200",
            "cnt": count,
            "list": list,
            "city": {"name": "London", "country": "GB", "timezone": 0}
        })
    }

    #[tokio::test]
    async fn fetches_current_conditions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &mock_server.uri());
        let location = Location::new("London").expect("valid");
        let current = provider.current(&location).await.expect("current conditions");

        assert_eq!(current.location_name, "London");
        assert_eq!(current.temperature_c, 7.4);
        assert_eq!(current.feels_like_c, 4.9);
        assert_eq!(current.humidity_pct, 81);
        assert_eq!(current.wind_speed_mps, 4.6);
        assert_eq!(current.pressure_hpa, 1012);
        assert_eq!(current.description, "light rain");
        assert_eq!(current.icon, "10d");
    }

    #[tokio::test]
    async fn fetches_forecast_series() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "London"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(40)))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &mock_server.uri());
        let location = Location::new("London").expect("valid");
        let series = provider.forecast(&location).await.expect("forecast");

        assert_eq!(series.len(), 40);
        let first = &series.samples()[0];
        assert_eq!(first.timestamp.timestamp(), 1_709_251_200);
        assert_eq!(first.temp_max_c, 6.0);
        assert_eq!(first.icon, "04n");
        assert_eq!(series.samples()[39].temperature_c, 44.0);
    }

    #[tokio::test]
    async fn location_is_sent_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "New York, US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &mock_server.uri());
        let location = Location::new("New York, US").expect("valid");

        assert!(provider.current(&location).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_city_is_provider_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &mock_server.uri());
        let location = Location::new("Atlantis").expect("valid");
        let err = provider.current(&location).await.unwrap_err();

        match err {
            FetchError::Provider { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("city not found"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_fields_are_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "London"})))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &mock_server.uri());
        let location = Location::new("London").expect("valid");
        let err = provider.current(&location).await.unwrap_err();

        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn empty_weather_list_is_malformed() {
        let mock_server = MockServer::start().await;
        let mut body = current_body();
        body["weather"] = json!([]);

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &mock_server.uri());
        let location = Location::new("London").expect("valid");
        let err = provider.current(&location).await.unwrap_err();

        assert!(err.to_string().contains("empty weather list"));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Nothing listens on the discard port.
        let provider = OpenWeatherProvider::with_base_url("KEY".into(), "http://127.0.0.1:9");
        let location = Location::new("London").expect("valid");
        let err = provider.forecast(&location).await.unwrap_err();

        assert!(err.is_transport());
    }

    #[test]
    fn out_of_order_forecast_is_malformed() {
        let mut body = forecast_body(3);
        body["list"][2]["dt"] = json!(1_709_251_200);

        let err = parse_forecast(&body.to_string()).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn forecast_keeps_city_offset() {
        let mut body = forecast_body(2);
        body["city"]["timezone"] = json!(-18_000);

        let series = parse_forecast(&body.to_string()).expect("valid forecast");
        assert_eq!(series.utc_offset().local_minus_utc(), -18_000);
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(150);
        let out = truncate_body(&long);

        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
