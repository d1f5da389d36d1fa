//! Weather code → condition text and icon reference.
//!
//! Codes follow the WMO interpretation codes used by Open-Meteo. The service
//! only sends the numeric code, so the text and icons come from a table: the
//! built-in one below, or a JSON file of the form
//! `{ "61": { "day": { "description": "...", "image": "..." }, "night": { ... } } }`.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

pub const UNKNOWN_DESCRIPTION: &str = "Unknown";
pub const PLACEHOLDER_ICON: &str = "cloud";

/// Resolved condition for one (code, day/night) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition<'a> {
    pub description: &'a str,
    pub icon_ref: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionPair {
    pub day: ConditionEntry,
    pub night: ConditionEntry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTable {
    entries: HashMap<i32, ConditionPair>,
}

// (code, day description, night description, day icon, night icon)
const BUILTIN: &[(i32, &str, &str, &str, &str)] = &[
    (0, "Clear", "Clear", "clear-day", "clear-night"),
    (1, "Mainly Clear", "Mostly Clear", "mostly-clear-day", "mostly-clear-night"),
    (2, "Partly Cloudy", "Partly Cloudy", "partly-cloudy-day", "partly-cloudy-night"),
    (3, "Overcast", "Overcast", "overcast", "overcast"),
    (45, "Foggy", "Foggy", "fog", "fog"),
    (48, "Foggy", "Foggy", "fog", "fog"),
    (51, "Light Drizzle", "Light Drizzle", "drizzle", "drizzle"),
    (53, "Moderate Drizzle", "Moderate Drizzle", "drizzle", "drizzle"),
    (55, "Dense Drizzle", "Dense Drizzle", "drizzle", "drizzle"),
    (56, "Light Freezing Drizzle", "Light Freezing Drizzle", "sleet", "sleet"),
    (57, "Dense Freezing Drizzle", "Dense Freezing Drizzle", "sleet", "sleet"),
    (61, "Slight Rain", "Slight Rain", "rain", "rain"),
    (63, "Moderate Rain", "Moderate Rain", "rain", "rain"),
    (65, "Heavy Rain", "Heavy Rain", "heavy-rain", "heavy-rain"),
    (66, "Light Freezing Rain", "Light Freezing Rain", "sleet", "sleet"),
    (67, "Heavy Freezing Rain", "Heavy Freezing Rain", "sleet", "sleet"),
    (71, "Slight Snow", "Slight Snow", "snow", "snow"),
    (73, "Moderate Snow", "Moderate Snow", "snow", "snow"),
    (75, "Heavy Snow", "Heavy Snow", "snow", "snow"),
    (77, "Snow Grains", "Snow Grains", "snow", "snow"),
    (80, "Slight Rain Showers", "Slight Rain Showers", "showers-day", "showers-night"),
    (81, "Moderate Rain Showers", "Moderate Rain Showers", "showers-day", "showers-night"),
    (82, "Violent Rain Showers", "Violent Rain Showers", "heavy-rain", "heavy-rain"),
    (85, "Slight Snow Showers", "Slight Snow Showers", "snow", "snow"),
    (86, "Heavy Snow Showers", "Heavy Snow Showers", "snow", "snow"),
    (95, "Thunderstorm", "Thunderstorm", "thunderstorm", "thunderstorm"),
    (96, "Thunderstorm with Hail", "Thunderstorm with Hail", "thunderstorm", "thunderstorm"),
    (99, "Thunderstorm with Heavy Hail", "Thunderstorm with Heavy Hail", "thunderstorm", "thunderstorm"),
];

impl ConditionTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|&(code, day_text, night_text, day_icon, night_icon)| {
                let pair = ConditionPair {
                    day: ConditionEntry {
                        description: day_text.to_string(),
                        image: day_icon.to_string(),
                    },
                    night: ConditionEntry {
                        description: night_text.to_string(),
                        image: night_icon.to_string(),
                    },
                };
                (code, pair)
            })
            .collect();

        Self { entries }
    }

    /// Parse a side-loaded table keyed by the string-encoded weather code.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, ConditionPair> =
            serde_json::from_str(json).context("Failed to parse condition table JSON")?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (key, pair) in raw {
            let code: i32 = key
                .trim()
                .parse()
                .map_err(|_| anyhow!("Condition table key '{key}' is not a weather code"))?;
            entries.insert(code, pair);
        }

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read condition table: {}", path.display()))?;

        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid condition table: {}", path.display()))
    }

    /// Never fails: codes missing from the table map to the "Unknown" sentinel.
    pub fn lookup(&self, code: i32, is_day: bool) -> Condition<'_> {
        match self.entries.get(&code) {
            Some(pair) => {
                let entry = if is_day { &pair.day } else { &pair.night };
                Condition {
                    description: &entry.description,
                    icon_ref: &entry.image,
                }
            }
            None => {
                tracing::debug!(code, "weather code missing from condition table");
                Condition {
                    description: UNKNOWN_DESCRIPTION,
                    icon_ref: PLACEHOLDER_ICON,
                }
            }
        }
    }

    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConditionTable {
    fn default() -> Self {
        Self::builtin()
    }
}
