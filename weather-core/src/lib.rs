//! Core library for the `weather-widget` dashboard.
//!
//! This crate defines:
//! - Configuration (home region, upstream endpoints, geolocation source)
//! - Clients for geolocation, geocoding and the weather service
//! - Hourly forecast alignment and the per-slot weather cache
//! - The location session that ties them together
//!
//! It is used by `weather-widget-cli`, but the session state is plain data and
//! can be rendered by any front end.

pub mod cache;
pub mod condition;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geocoding;
pub mod location;
pub mod model;
pub mod provider;
pub mod session;

pub use cache::WeatherCache;
pub use condition::{Condition, ConditionTable};
pub use config::{Config, GeolocationSource, HomeRegion, condition_table_from_config};
pub use error::{GeocodeError, GeolocationError, WeatherFetchError};
pub use geocoding::{Geocoder, geocoder_from_config};
pub use location::{LocationProvider, locator_from_config};
pub use model::{Coordinates, HourPoint, PlaceName, Slot, WeatherSnapshot};
pub use provider::{WeatherSource, weather_source_from_config};
pub use session::{LocationSession, MarkerSink, SessionState, WeatherView};

/// Build a session from config with the given position provider.
pub fn session_from_config(
    config: &Config,
    locator: Box<dyn LocationProvider>,
) -> anyhow::Result<LocationSession> {
    Ok(LocationSession::new(
        locator,
        geocoder_from_config(config)?,
        weather_source_from_config(config)?,
        config.home_region.clone(),
        config.default_slot,
    ))
}
