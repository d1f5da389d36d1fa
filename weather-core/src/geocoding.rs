use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{
    Config,
    config::HomeRegion,
    error::GeocodeError,
    geocoding::nominatim::NominatimGeocoder,
    model::{Coordinates, PlaceName},
};

pub mod nominatim;

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Coordinates ↔ place names. Every call goes upstream; nothing is cached here.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<PlaceName, GeocodeError>;

    /// `Ok(None)` means the service found no match.
    async fn forward_geocode(
        &self,
        place_name: &str,
        context_name: &str,
    ) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Structured address of a reverse-geocode result. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    pub suburb: Option<String>,
    pub district: Option<String>,
    pub city_district: Option<String>,
    pub neighbourhood: Option<String>,
    pub quarter: Option<String>,
    pub borough: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseResult {
    pub address: Option<Address>,
    pub display_name: Option<String>,
}

/// Turns a reverse-geocode result into a city/district pair, forcing the city
/// to the home region's canonical name when the address lies inside it.
pub fn place_from_reverse(result: ReverseResult, home: &HomeRegion) -> PlaceName {
    let Some(addr) = result.address else {
        let display_name = result.display_name.unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        let city = if home.matches(&display_name) {
            home.name.clone()
        } else {
            display_name
                .split(',')
                .next()
                .map(str::trim)
                .unwrap_or(UNKNOWN_LOCATION)
                .to_string()
        };

        return PlaceName {
            city: Some(city),
            district: None,
        };
    };

    let in_home_region = addr.country.as_deref().is_some_and(|c| home.matches(c));

    let district = first_present([
        addr.suburb,
        addr.district,
        addr.city_district,
        addr.neighbourhood,
        addr.quarter,
        addr.borough,
    ]);

    let city = first_present([
        addr.city,
        addr.town,
        addr.village,
        addr.municipality,
        addr.state,
        addr.county,
        addr.country,
    ])
    .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    let city = if in_home_region || home.matches(&city) {
        home.name.clone()
    } else {
        city
    };

    PlaceName {
        city: Some(city),
        district,
    }
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

/// Construct the geocoder described by config.
pub fn geocoder_from_config(config: &Config) -> anyhow::Result<Box<dyn Geocoder>> {
    let geocoder = NominatimGeocoder::new(
        &config.endpoints.geocoding,
        &config.user_agent,
        config.home_region.clone(),
    )?;

    Ok(Box::new(geocoder))
}
