//! Device position providers.
//!
//! A provider is asked exactly once per session; it does not poll or retry.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    config::GeolocationSource,
    error::GeolocationError,
    location::ip_api::IpApiLocator,
    model::Coordinates,
};

pub mod ip_api;

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Stands in when geolocation is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Construct the position provider described by config.
pub fn locator_from_config(config: &Config) -> anyhow::Result<Box<dyn LocationProvider>> {
    let boxed: Box<dyn LocationProvider> = match config.geolocation {
        GeolocationSource::Ip => Box::new(IpApiLocator::new(
            &config.endpoints.geolocation,
            &config.user_agent,
            ip_api::DEFAULT_TIMEOUT,
        )?),
        GeolocationSource::Fixed { latitude, longitude } => {
            Box::new(FixedLocation(Coordinates::new(latitude, longitude)))
        }
        GeolocationSource::Disabled => Box::new(NoLocation),
    };

    Ok(boxed)
}
