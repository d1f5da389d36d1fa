use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::{condition::ConditionTable, model::Coordinates, model::Slot};

/// The administrative area that gets name normalization and a fallback point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeRegion {
    /// Canonical name shown for the city slot, e.g. "Hong Kong".
    pub name: String,

    /// Case-insensitive fragments that identify the region in geocoder output.
    #[serde(default)]
    pub markers: Vec<String>,

    /// Used when forward geocoding the region fails or finds nothing.
    pub fallback: Coordinates,
}

impl HomeRegion {
    /// True if `value` names the home region.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        if self.markers.is_empty() {
            return value.contains(&self.name.to_lowercase());
        }

        self.markers
            .iter()
            .any(|marker| value.contains(&marker.to_lowercase()))
    }
}

impl Default for HomeRegion {
    fn default() -> Self {
        Self {
            name: "Hong Kong".to_string(),
            markers: vec!["hong kong".to_string()],
            fallback: Coordinates::new(22.3194, 114.1714),
        }
    }
}

/// Base URLs of the upstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geocoding: String,
    pub weather: String,
    pub geolocation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: "https://nominatim.openstreetmap.org".to_string(),
            weather: "https://api.open-meteo.com".to_string(),
            geolocation: "http://ip-api.com/json".to_string(),
        }
    }
}

/// Where the device position comes from.
///
/// Example TOML:
/// [geolocation]
/// mode = "fixed"
/// latitude = 22.2819
/// longitude = 114.1585
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GeolocationSource {
    #[default]
    Ip,
    Fixed { latitude: f64, longitude: f64 },
    Disabled,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: String,

    /// Slot shown first once the location is known.
    pub default_slot: Slot,

    /// Optional side-loaded condition table; the built-in table is used otherwise.
    pub condition_table: Option<PathBuf>,

    pub home_region: HomeRegion,
    pub endpoints: Endpoints,
    pub geolocation: GeolocationSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: concat!("weather-widget/", env!("CARGO_PKG_VERSION")).to_string(),
            default_slot: Slot::City,
            condition_table: None,
            home_region: HomeRegion::default(),
            endpoints: Endpoints::default(),
            geolocation: GeolocationSource::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-widget", "weather-widget")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Replace the home region, keeping its name as the only marker unless
    /// markers are given.
    pub fn set_home_region(&mut self, name: String, fallback: Coordinates, markers: Vec<String>) {
        let markers = if markers.is_empty() {
            vec![name.to_lowercase()]
        } else {
            markers
        };

        self.home_region = HomeRegion {
            name,
            markers,
            fallback,
        };
    }
}

/// Load the condition table named in config, or the built-in one.
pub fn condition_table_from_config(config: &Config) -> Result<ConditionTable> {
    match &config.condition_table {
        Some(path) => ConditionTable::load(path),
        None => Ok(ConditionTable::builtin()),
    }
}
