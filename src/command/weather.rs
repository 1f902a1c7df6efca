//! Weather command / 天气命令
//!
//! Takes a city name and delegates to an external weather provider.
//! The shipped provider goes through Open-Meteo: geocode the city
//! first, then fetch current conditions plus the daily forecast.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use super::CommandHandler;
use crate::models::{CommandOutcome, ForecastDay, OutcomeKind, WeatherData, WeatherNow};

/// External weather provider / 外部天气数据源
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherData>;
}

/// Open-Meteo backed provider / 基于 Open-Meteo 的数据源
pub struct OpenMeteoProvider {
    client: Client,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Option<Vec<GeocodeResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i64,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weathercode: Vec<i64>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherData> {
        // Resolve the city to coordinates first / 先将城市名解析为坐标
        let geocode_url = format!(
            "https://geocoding-api.open-meteo.com/v1/search?name={}&count=1",
            urlencoding::encode(city)
        );
        let geocode: GeocodeResponse = self
            .client
            .get(&geocode_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let place = geocode
            .results
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| anyhow!("City not found: {}", city))?;

        let forecast_url = format!(
            "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}\
             &current_weather=true&daily=temperature_2m_max,temperature_2m_min,weathercode&timezone=auto",
            place.latitude, place.longitude
        );
        let forecast: ForecastResponse = self
            .client
            .get(&forecast_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let daily = &forecast.daily;
        let days = daily
            .time
            .iter()
            .zip(daily.temperature_2m_max.iter())
            .zip(daily.temperature_2m_min.iter())
            .zip(daily.weathercode.iter())
            .map(|(((date, high), low), code)| ForecastDay {
                date: date.clone(),
                high: *high,
                low: *low,
                condition: condition_text(*code).to_string(),
            })
            .collect();

        Ok(WeatherData {
            city: place.name,
            current: WeatherNow {
                temperature: forecast.current_weather.temperature,
                wind_speed: forecast.current_weather.windspeed,
                condition: condition_text(forecast.current_weather.weathercode).to_string(),
            },
            forecast: days,
        })
    }
}

/// WMO weather code to a condition string / WMO 天气代码转文本
fn condition_text(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 | 2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 | 56 | 57 => "Drizzle",
        61 | 63 | 65 | 66 | 67 => "Rain",
        71 | 73 | 75 | 77 => "Snow",
        80 | 81 | 82 => "Showers",
        85 | 86 => "Snow showers",
        95 | 96 | 99 => "Thunderstorm",
        _ => "Unknown",
    }
}

pub struct WeatherCommand {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherCommand {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CommandHandler for WeatherCommand {
    fn kind(&self) -> OutcomeKind {
        OutcomeKind::Weather
    }

    async fn execute(&self, args: &str) -> CommandOutcome {
        let city = args.trim();
        if city.is_empty() {
            return CommandOutcome::fail(self.kind(), "Please provide a city name");
        }

        match self.provider.fetch_weather(city).await {
            Ok(data) => match serde_json::to_value(&data) {
                Ok(value) => CommandOutcome::ok(self.kind(), value),
                Err(e) => {
                    tracing::error!("Failed to serialize weather data: {}", e);
                    CommandOutcome::fail(self.kind(), "Weather lookup failed")
                }
            },
            Err(e) => {
                tracing::warn!("Weather lookup failed for {:?}: {}", city, e);
                CommandOutcome::fail(self.kind(), "Weather lookup failed")
            }
        }
    }
}
