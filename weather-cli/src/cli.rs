use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use weather_widget_core::{
    Config, Coordinates, GeolocationSource, LocationProvider, MarkerSink, Slot,
    condition_table_from_config, location::FixedLocation, locator_from_config,
    session_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Weather for your city and district")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Locate, then print the dashboard once.
    Show {
        /// Slot to display: "city" or "district".
        #[arg(long, value_parser = parse_slot)]
        slot: Option<Slot>,

        #[command(flatten)]
        position: PositionArgs,

        /// Print the session state as JSON instead of the dashboard.
        #[arg(long)]
        json: bool,
    },

    /// Locate, then toggle between city and district from a menu.
    Interactive {
        #[command(flatten)]
        position: PositionArgs,
    },

    /// Configure the home region and geolocation source.
    Configure,

    /// Show the condition text and icon for a weather code.
    Condition {
        code: i32,

        /// Use the night-time variant.
        #[arg(long)]
        night: bool,
    },
}

/// Skip geolocation and use this position instead.
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct PositionArgs {
    /// Latitude in decimal degrees.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude in decimal degrees.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
}

impl PositionArgs {
    fn locator(self, config: &Config) -> anyhow::Result<Box<dyn LocationProvider>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(Box::new(FixedLocation(Coordinates::new(lat, lon)))),
            _ => locator_from_config(config),
        }
    }
}

fn parse_slot(value: &str) -> Result<Slot, String> {
    Slot::try_from(value).map_err(|e| e.to_string())
}

/// Map overlay stand-in: the terminal has no map, so marker moves are logged.
struct LoggedMarker;

impl MarkerSink for LoggedMarker {
    fn update_marker(&mut self, coords: Coordinates) {
        tracing::info!(lat = coords.latitude, lon = coords.longitude, "map marker moved");
    }
}

#[derive(Debug, Clone, Copy)]
enum MenuChoice {
    Show(Slot),
    Refresh,
    Quit,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Show {
                slot,
                position,
                json,
            } => show(slot, position, json).await,
            Command::Interactive { position } => interactive(position).await,
            Command::Configure => configure(),
            Command::Condition { code, night } => {
                let config = Config::load()?;
                let table = condition_table_from_config(&config)?;
                let condition = table.lookup(code, !night);
                println!(
                    "{} {} ({})",
                    render::glyph(condition.icon_ref),
                    condition.description,
                    condition.icon_ref
                );
                Ok(())
            }
        }
    }
}

async fn show(slot: Option<Slot>, position: PositionArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let table = condition_table_from_config(&config)?;
    let mut session = session_from_config(&config, position.locator(&config)?)?
        .with_marker(Box::new(LoggedMarker));

    session.start().await;
    if let Some(slot) = slot {
        session.select(slot).await;
    }

    if json {
        let out = serde_json::to_string_pretty(session.state())
            .context("Failed to serialize session state")?;
        println!("{out}");
    } else {
        print!("{}", render::dashboard(session.state(), &table));
    }

    Ok(())
}

async fn interactive(position: PositionArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let table = condition_table_from_config(&config)?;
    let mut session = session_from_config(&config, position.locator(&config)?)?
        .with_marker(Box::new(LoggedMarker));

    session.start().await;

    loop {
        let state = session.state();
        println!("\n{}", render::dashboard(state, &table));

        // Nothing to toggle once geolocation has failed.
        if state.coordinates.city.is_none() {
            return Ok(());
        }

        let labels = [
            (MenuChoice::Show(Slot::City), state.slot_label(Slot::City).to_string()),
            (MenuChoice::Show(Slot::District), state.slot_label(Slot::District).to_string()),
            (MenuChoice::Refresh, "Refresh".to_string()),
            (MenuChoice::Quit, "Quit".to_string()),
        ];
        let options: Vec<String> = labels.iter().map(|(_, label)| label.clone()).collect();

        let picked = Select::new("Location", options).raw_prompt()?;
        let choice = labels[picked.index].0;

        match choice {
            MenuChoice::Show(slot) => session.select(slot).await,
            MenuChoice::Refresh => session.refresh().await,
            MenuChoice::Quit => return Ok(()),
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let current = config.home_region.clone();

    let name = Text::new("Home region name:")
        .with_default(&current.name)
        .prompt()?;
    let latitude = CustomType::<f64>::new("Fallback latitude:")
        .with_default(current.fallback.latitude)
        .with_error_message("Please enter a number")
        .prompt()?;
    let longitude = CustomType::<f64>::new("Fallback longitude:")
        .with_default(current.fallback.longitude)
        .with_error_message("Please enter a number")
        .prompt()?;

    let markers = if name == current.name {
        current.markers
    } else {
        Vec::new()
    };
    config.set_home_region(name, Coordinates::new(latitude, longitude), markers);

    let source = Select::new("Geolocation source:", vec!["ip", "fixed", "disabled"]).prompt()?;
    config.geolocation = match source {
        "fixed" => GeolocationSource::Fixed {
            latitude: CustomType::<f64>::new("Device latitude:").prompt()?,
            longitude: CustomType::<f64>::new("Device longitude:").prompt()?,
        },
        "disabled" => GeolocationSource::Disabled,
        _ => GeolocationSource::Ip,
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_accepts_slot_and_negative_position() {
        let cli = Cli::try_parse_from([
            "weather-widget",
            "show",
            "--slot",
            "district",
            "--lat",
            "38.72",
            "--lon",
            "-9.14",
        ])
        .expect("parse");

        match cli.command {
            Command::Show { slot, position, json } => {
                assert_eq!(slot, Some(Slot::District));
                assert_eq!(position.lat, Some(38.72));
                assert_eq!(position.lon, Some(-9.14));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn lat_without_lon_is_rejected() {
        let err = Cli::try_parse_from(["weather-widget", "show", "--lat", "22.3"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn unknown_slot_is_rejected() {
        assert!(Cli::try_parse_from(["weather-widget", "show", "--slot", "suburb"]).is_err());
    }
}
