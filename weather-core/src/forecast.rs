//! Aligns the raw hourly series to "now plus the next 23 hours".
//!
//! The weather service sends the hourly section as four parallel arrays
//! (`time`, `temperature_2m`, `weather_code`, `is_day`). A broken hourly
//! section never fails the snapshot: it degrades to an empty forecast.

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde_json::Value;

use crate::model::{HourPoint, round_temperature};

pub const WINDOW_HOURS: usize = 24;

/// Validated hourly arrays, all of the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    time: Vec<String>,
    temperature: Vec<f64>,
    weather_code: Vec<i32>,
    is_day: Vec<bool>,
}

impl HourlySeries {
    pub fn new(
        time: Vec<String>,
        temperature: Vec<f64>,
        weather_code: Vec<i32>,
        is_day: Vec<bool>,
    ) -> Option<Self> {
        let len = time.len();
        if temperature.len() != len || weather_code.len() != len || is_day.len() != len {
            return None;
        }

        Some(Self {
            time,
            temperature,
            weather_code,
            is_day,
        })
    }

    /// Reads the `hourly` object of a forecast payload. Returns `None` when any
    /// field is missing, is not an array, holds an element of the wrong type,
    /// or the arrays disagree in length.
    pub fn from_value(hourly: &Value) -> Option<Self> {
        let time = hourly
            .get("time")?
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()?;
        let temperature = hourly
            .get("temperature_2m")?
            .as_array()?
            .iter()
            .map(Value::as_f64)
            .collect::<Option<Vec<_>>>()?;
        let weather_code = hourly
            .get("weather_code")?
            .as_array()?
            .iter()
            .map(|v| v.as_i64().and_then(|code| i32::try_from(code).ok()))
            .collect::<Option<Vec<_>>>()?;
        let is_day = hourly
            .get("is_day")?
            .as_array()?
            .iter()
            .map(day_flag)
            .collect::<Option<Vec<_>>>()?;

        Self::new(time, temperature, weather_code, is_day)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Index of the first point whose hour is at or after `now`'s hour, or 0.
    pub fn start_index(&self, now: NaiveDateTime) -> usize {
        let current_hour = truncate_to_hour(now);

        self.time
            .iter()
            .position(|ts| parse_local_timestamp(ts).is_some_and(|t| truncate_to_hour(t) >= current_hour))
            .unwrap_or(0)
    }

    /// Up to [`WINDOW_HOURS`] contiguous points starting at the current hour.
    pub fn window(&self, now: NaiveDateTime) -> Vec<HourPoint> {
        let start = self.start_index(now);
        let count = WINDOW_HOURS.min(self.len() - start.min(self.len()));

        (start..start + count)
            .map(|i| HourPoint {
                timestamp: self.time[i].clone(),
                temperature: round_temperature(self.temperature[i]),
                weather_code: self.weather_code[i],
                is_day: self.is_day[i],
            })
            .collect()
    }
}

/// Hourly strip for a forecast payload's `hourly` section.
pub fn align_hourly(hourly: Option<&Value>, now: NaiveDateTime) -> Vec<HourPoint> {
    let Some(series) = hourly.and_then(HourlySeries::from_value) else {
        tracing::warn!("hourly data missing or incomplete; hourly forecast left empty");
        return Vec::new();
    };

    let window = series.window(now);
    tracing::debug!(
        points = window.len(),
        start = window.first().map(|p| p.timestamp.as_str()),
        "aligned hourly forecast"
    );
    window
}

pub fn truncate_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Accepts the service's offset-less local form (`2025-02-10T14:00`) as well
/// as full RFC 3339 timestamps.
pub fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.naive_local()))
}

fn day_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n == 1),
        _ => None,
    }
}
