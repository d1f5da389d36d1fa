use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::HomeRegion,
    error::{GeocodeError, truncate_body},
    model::{Coordinates, PlaceName},
};

use super::{Geocoder, ReverseResult, place_from_reverse};

/// OpenStreetMap Nominatim. The service rejects requests without a User-Agent.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    home: HomeRegion,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, home: HomeRegion) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build geocoding HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            home,
            http,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, GeocodeError> {
        let url = format!("{}/{path}", self.base_url);

        let res = self.http.get(&url).query(query).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<PlaceName, GeocodeError> {
        tracing::debug!(lat = coords.latitude, lon = coords.longitude, "reverse geocoding");

        // zoom=18 asks for building-level detail so suburbs come back populated.
        let body = self
            .get(
                "reverse",
                &[
                    ("format", "json".to_string()),
                    ("lat", coords.latitude.to_string()),
                    ("lon", coords.longitude.to_string()),
                    ("zoom", "18".to_string()),
                    ("addressdetails", "1".to_string()),
                ],
            )
            .await?;

        let parsed: ReverseResult = serde_json::from_str(&body)
            .map_err(|e| GeocodeError::Malformed(format!("reverse payload: {e}")))?;

        let place = place_from_reverse(parsed, &self.home);
        tracing::info!(city = ?place.city, district = ?place.district, "reverse geocoded");
        Ok(place)
    }

    async fn forward_geocode(
        &self,
        place_name: &str,
        context_name: &str,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        let q = format!("{place_name}, {context_name}");
        tracing::debug!(query = %q, "forward geocoding");

        let body = self
            .get(
                "search",
                &[
                    ("format", "json".to_string()),
                    ("q", q),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let hits: Vec<SearchHit> = serde_json::from_str(&body)
            .map_err(|e| GeocodeError::Malformed(format!("search payload: {e}")))?;

        let Some(hit) = hits.into_iter().next() else {
            tracing::debug!("forward geocode found no match");
            return Ok(None);
        };

        let latitude = hit
            .lat
            .trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::Malformed(format!("latitude '{}'", hit.lat)))?;
        let longitude = hit
            .lon
            .trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::Malformed(format!("longitude '{}'", hit.lon)))?;

        Ok(Some(Coordinates::new(latitude, longitude)))
    }
}
