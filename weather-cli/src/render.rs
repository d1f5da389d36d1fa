//! Plain-text rendering of the session state.

use chrono::Timelike;
use std::fmt;

use weather_widget_core::{
    ConditionTable, HourPoint, SessionState, Slot, WeatherSnapshot, WeatherView,
    forecast::parse_local_timestamp, session::LocatePhase,
};

const COLUMN: usize = 7;

/// The full text dashboard for one session state.
pub struct Dashboard<'a> {
    state: &'a SessionState,
    table: &'a ConditionTable,
}

impl<'a> Dashboard<'a> {
    pub fn new(state: &'a SessionState, table: &'a ConditionTable) -> Self {
        Self { state, table }
    }
}

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;

        if state.phase == LocatePhase::Locating {
            writeln!(f, "Getting your location...")?;
        }

        if state.place.city.is_some() || state.place.district.is_some() {
            writeln!(
                f,
                "{}  {}",
                toggle(state, Slot::City),
                toggle(state, Slot::District)
            )?;
        }

        if let Some(status) = &state.location_status {
            writeln!(f, "! {status}")?;
        }

        match &state.weather {
            WeatherView::Pending => {}
            WeatherView::Failed(message) => writeln!(f, "Error: {message}")?,
            WeatherView::Ready(snapshot) => {
                current_panel(f, state.slot_label(state.selected), snapshot, self.table)?;
                writeln!(f, "{}", "─".repeat(COLUMN * 6))?;
                hourly_strip(f, &snapshot.hourly_forecast, self.table)?;
            }
        }

        if let (Some(_), Some(_), Some(coords)) = (
            state.coordinates.city,
            state.coordinates.district,
            state.selected_coordinates(),
        ) {
            writeln!(f, "Coordinates: {coords}")?;
        }

        Ok(())
    }
}

pub fn dashboard(state: &SessionState, table: &ConditionTable) -> String {
    Dashboard::new(state, table).to_string()
}

fn toggle(state: &SessionState, slot: Slot) -> String {
    let label = state.slot_label(slot);
    if state.selected == slot {
        format!("[{label}]")
    } else {
        format!(" {label} ")
    }
}

fn current_panel(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    snapshot: &WeatherSnapshot,
    table: &ConditionTable,
) -> fmt::Result {
    let condition = table.lookup(snapshot.weather_code, snapshot.is_day);

    writeln!(f, "{name}")?;
    writeln!(
        f,
        "{}°  {} {}",
        snapshot.temperature,
        glyph(condition.icon_ref),
        condition.description
    )?;
    writeln!(f, "{}", high_low(snapshot))
}

pub fn high_low(snapshot: &WeatherSnapshot) -> String {
    match (snapshot.high_temp, snapshot.low_temp) {
        (Some(high), Some(low)) => format!("H:{high}° L:{low}°"),
        _ => "--".to_string(),
    }
}

fn hourly_strip(f: &mut fmt::Formatter<'_>, hours: &[HourPoint], table: &ConditionTable) -> fmt::Result {
    if hours.is_empty() {
        return writeln!(f, "Hourly forecast unavailable");
    }

    // Six columns per row keeps the strip inside 80 columns.
    for row in hours.chunks(6) {
        let labels: String = row
            .iter()
            .map(|hour| format!("{:<COLUMN$}", hour_label(&hour.timestamp)))
            .collect();
        let icons: String = row
            .iter()
            .map(|hour| {
                let icon = table.lookup(hour.weather_code, hour.is_day).icon_ref;
                format!("{:<COLUMN$}", glyph(icon))
            })
            .collect();
        let temps: String = row
            .iter()
            .map(|hour| format!("{:<COLUMN$}", format!("{}°", hour.temperature)))
            .collect();

        writeln!(f, "{}", labels.trim_end())?;
        writeln!(f, "{}", icons.trim_end())?;
        writeln!(f, "{}", temps.trim_end())?;
    }

    Ok(())
}

/// "3 PM" style label; unparseable timestamps are shown as-is.
pub fn hour_label(timestamp: &str) -> String {
    let Some(t) = parse_local_timestamp(timestamp) else {
        return timestamp.to_string();
    };

    let (pm, hour) = t.hour12();
    format!("{hour} {}", if pm { "PM" } else { "AM" })
}

pub fn glyph(icon_ref: &str) -> &'static str {
    match icon_ref {
        "clear-day" => "☀",
        "clear-night" | "mostly-clear-night" => "☾",
        "mostly-clear-day" => "🌤",
        "partly-cloudy-day" | "partly-cloudy-night" => "⛅",
        "fog" => "🌫",
        "drizzle" | "showers-day" | "showers-night" => "🌦",
        "rain" | "heavy-rain" => "🌧",
        "sleet" | "snow" => "❄",
        "thunderstorm" => "⛈",
        _ => "☁",
    }
}
