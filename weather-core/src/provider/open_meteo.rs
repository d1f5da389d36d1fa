use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{WeatherFetchError, truncate_body},
    forecast::align_hourly,
    model::{Coordinates, WeatherSnapshot, round_temperature},
};

use super::WeatherSource;

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,is_day";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code,is_day";
// Two days of hourly data always covers the 24 hours starting now.
const FORECAST_DAYS: &str = "2";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i64,
    current: Option<OmCurrent>,
    daily: Option<OmDaily>,
    // Kept loose: a broken hourly section must not fail the snapshot.
    hourly: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    weather_code: i32,
    is_day: u8,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

impl OpenMeteoProvider {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoProvider {
    async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherFetchError> {
        let url = format!("{}/v1/forecast", self.base_url);
        tracing::debug!(lat = coords.latitude, lon = coords.longitude, "fetching weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", coords.latitude.to_string().as_str()),
                ("longitude", coords.longitude.to_string().as_str()),
                ("current", CURRENT_FIELDS),
                ("daily", DAILY_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("timezone", "auto"),
                ("forecast_days", FORECAST_DAYS),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherFetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_forecast(&body, Utc::now())
    }
}

/// Builds a snapshot from a forecast payload. `now` is shifted by the payload's
/// UTC offset so the hourly strip aligns to the location's local hour.
pub fn parse_forecast(body: &str, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherFetchError> {
    let parsed: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| WeatherFetchError::Malformed(format!("forecast payload: {e}")))?;

    let current = parsed
        .current
        .ok_or_else(|| WeatherFetchError::Malformed("forecast payload: missing current".into()))?;

    let (high_temp, low_temp) = match &parsed.daily {
        Some(daily) => (first_rounded(&daily.temperature_2m_max), first_rounded(&daily.temperature_2m_min)),
        None => (None, None),
    };

    let local_now = (now + Duration::seconds(parsed.utc_offset_seconds)).naive_utc();
    let hourly_forecast = align_hourly(parsed.hourly.as_ref(), local_now);

    Ok(WeatherSnapshot {
        temperature: round_temperature(current.temperature_2m),
        weather_code: current.weather_code,
        is_day: current.is_day == 1,
        high_temp,
        low_temp,
        hourly_forecast,
    })
}

fn first_rounded(values: &[Option<f64>]) -> Option<i32> {
    values.first().copied().flatten().map(round_temperature)
}
