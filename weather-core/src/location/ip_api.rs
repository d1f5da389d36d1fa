use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{error::GeolocationError, model::Coordinates};

use super::LocationProvider;

/// Request timeout used when building from config.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Approximate position from the public IP address (ip-api.com JSON format).
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpApiLocator {
    /// A request that outlives `timeout` fails with [`GeolocationError::Timeout`].
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build geolocation HTTP client")?;

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }
}

#[async_trait]
impl LocationProvider for IpApiLocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        tracing::debug!(url = %self.url, "requesting IP geolocation");

        let res = self.http.get(&self.url).send().await.map_err(classify_transport)?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, "geolocation service refused the request");
            return Err(classify_status(status));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| GeolocationError::Other(format!("geolocation payload: {e}")))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => {
                tracing::info!(lat, lon, "geolocation resolved");
                Ok(Coordinates::new(lat, lon))
            }
            _ => {
                tracing::warn!(
                    status = %body.status,
                    message = body.message.as_deref().unwrap_or(""),
                    "geolocation service could not place this address"
                );
                Err(GeolocationError::Unavailable)
            }
        }
    }
}

fn classify_transport(error: reqwest::Error) -> GeolocationError {
    if error.is_timeout() {
        GeolocationError::Timeout
    } else if error.is_connect() {
        GeolocationError::Unavailable
    } else {
        GeolocationError::Other(error.to_string())
    }
}

fn classify_status(status: StatusCode) -> GeolocationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeolocationError::PermissionDenied,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            GeolocationError::Unavailable
        }
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => GeolocationError::Timeout,
        other => GeolocationError::Other(format!("status {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_means_permission_denied() {
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            GeolocationError::PermissionDenied
        );
    }

    #[test]
    fn gateway_timeout_means_timeout() {
        assert_eq!(classify_status(StatusCode::GATEWAY_TIMEOUT), GeolocationError::Timeout);
    }

    #[test]
    fn other_statuses_are_generic() {
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            GeolocationError::Other(_)
        ));
    }
}
