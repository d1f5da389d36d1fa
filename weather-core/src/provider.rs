use crate::{
    Config,
    error::WeatherFetchError,
    model::{Coordinates, WeatherSnapshot},
    provider::open_meteo::OpenMeteoProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod open_meteo;

/// Current conditions, today's high/low and the aligned hourly strip for a point.
///
/// Implementations do not retry; a failed fetch is reported once.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherFetchError>;
}

/// Construct the weather source described by config.
pub fn weather_source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let provider = OpenMeteoProvider::new(&config.endpoints.weather, &config.user_agent)?;
    Ok(Box::new(provider))
}
