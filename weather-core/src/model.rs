use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// City/district pair resolved from a single reverse-geocode result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceName {
    pub city: Option<String>,
    pub district: Option<String>,
}

impl PlaceName {
    /// Used when reverse geocoding fails.
    pub fn unresolved() -> Self {
        Self::default()
    }
}

/// One hour of the forecast strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourPoint {
    /// Timestamp as sent by the weather service, in the location's local time.
    pub timestamp: String,
    pub temperature: i32,
    pub weather_code: i32,
    pub is_day: bool,
}

/// One complete weather result for a single fetch. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: i32,
    pub weather_code: i32,
    pub is_day: bool,
    pub high_temp: Option<i32>,
    pub low_temp: Option<i32>,
    pub hourly_forecast: Vec<HourPoint>,
}

/// Which of the two tracked locations a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    #[default]
    City,
    District,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::City => "city",
            Slot::District => "district",
        }
    }

    pub const fn all() -> &'static [Slot] {
        &[Slot::City, Slot::District]
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Slot {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "city" => Ok(Slot::City),
            "district" => Ok(Slot::District),
            _ => Err(anyhow::anyhow!(
                "Unknown location slot '{value}'. Supported slots: city, district."
            )),
        }
    }
}

/// Rounds a temperature to whole degrees, halves away from zero.
pub fn round_temperature(value: f64) -> i32 {
    value.round() as i32
}
