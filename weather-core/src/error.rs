//! Error types for each upstream collaborator.
//!
//! A missing condition-table entry is not an error; see [`crate::condition`].

/// Failure to obtain the device position. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location information unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Geolocation is not supported")]
    Unsupported,
    #[error("Unable to get your location")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoding service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed geocoding response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherFetchError {
    #[error("weather request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("weather service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed weather response: {0}")]
    Malformed(String),
}

/// Shortens an upstream body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
