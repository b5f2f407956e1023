use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{
    Confirm, CustomType, CustomUserError, InquireError, Password, PasswordDisplayMode, Select, Text,
    validator::Validation,
};
use weatherlens_core::{Config, Coordinates, OpenWeatherProvider, Session, Theme};

use crate::render::Renderer;

const DASHBOARD_HELP: &str =
    "Enter a city to search, leave empty to retry your location, q to quit";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherlens",
    version,
    about = "Human-centric weather insights in your terminal"
)]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides the configured position for this run.
#[derive(Debug, Default, Args)]
pub struct PositionArgs {
    /// Latitude in degrees, e.g. 47.37.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees, e.g. 8.54.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl PositionArgs {
    fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, an optional fixed location and the theme.
    Configure,

    /// Load the dashboard once and print it.
    Show {
        /// Search a city instead of using the current position.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[command(flatten)]
        position: PositionArgs,

        /// Print the dashboard state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive dashboard: search cities or refresh the current position.
    Dashboard {
        #[command(flatten)]
        position: PositionArgs,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show {
                city,
                position,
                json,
            } => show(city, &position, json).await,
            Command::Dashboard { position } => {
                dashboard(&position).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    // Read the file directly so an environment key is never written to disk.
    let mut config = Config::load_from(&Config::config_file_path()?)?;

    let help = if config.api_key().is_some() {
        "Leave empty to keep the stored key"
    } else {
        "Get one at https://openweathermap.org/api"
    };
    let key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(help)
        .prompt()?;

    if !key.trim().is_empty() {
        config.set_api_key(key);
    } else if config.api_key().is_none() {
        println!(
            "No API key stored. Set {} before running `weatherlens show`.",
            Config::API_KEY_ENV
        );
    }

    let fixed = Confirm::new("Use a fixed location as your current position?")
        .with_default(config.location.coordinates().is_some())
        .with_help_message("Without one, only city search is available")
        .prompt()?;

    if fixed {
        let latitude = prompt_degrees("Latitude:", 90.0, config.location.latitude)?;
        let longitude = prompt_degrees("Longitude:", 180.0, config.location.longitude)?;
        config.set_location(Some(Coordinates::new(latitude, longitude)));
        config.location.enabled = true;
    } else {
        config.set_location(None);
    }

    let themes = Theme::all();
    let cursor = themes.iter().position(|t| *t == config.theme).unwrap_or(0);
    config.theme = Select::new("Theme:", themes.to_vec())
        .with_starting_cursor(cursor)
        .prompt()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn prompt_degrees(message: &str, limit: f64, current: Option<f64>) -> anyhow::Result<f64> {
    let mut prompt = CustomType::<f64>::new(message)
        .with_error_message("Please enter a number")
        .with_validator(move |value: &f64| -> Result<Validation, CustomUserError> {
            if value.abs() <= limit {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Must be between -{limit} and {limit}").into(),
                ))
            }
        });

    if let Some(current) = current {
        prompt = prompt.with_default(current);
    }

    Ok(prompt.prompt()?)
}

/// Provider from config, position from the command line or config.
fn build_session(
    config: &Config,
    position: &PositionArgs,
) -> anyhow::Result<(Session, Renderer)> {
    let provider = OpenWeatherProvider::from_config(config)?;
    let resolver = config.location_resolver(position.coordinates());
    tracing::debug!(
        has_source = resolver.is_supported(),
        theme = %config.theme,
        "building session"
    );

    let session = Session::new(Arc::new(provider), resolver);
    Ok((session, Renderer::new(config.theme)))
}

async fn show(
    city: Option<String>,
    position: &PositionArgs,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let config = Config::load()?;
    let (session, renderer) = build_session(&config, position)?;

    match city.as_deref() {
        Some(city) => session.search_city(city).await,
        None => session.initial_load().await,
    }

    let view = session.view();
    if json {
        let out = serde_json::to_string_pretty(&view).context("Failed to serialize dashboard")?;
        println!("{out}");
    } else {
        print!("{}", renderer.render(&view));
    }

    Ok(if view.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn dashboard(position: &PositionArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let (session, renderer) = build_session(&config, position)?;

    print!("{}", renderer.loading());
    session.initial_load().await;

    loop {
        print!("{}", renderer.render(&session.view()));

        let input = match Text::new("City:")
            .with_help_message(DASHBOARD_HELP)
            .prompt_skippable()
        {
            Ok(input) => input,
            Err(InquireError::OperationInterrupted) => None,
            Err(err) => return Err(err.into()),
        };

        match input.as_deref().map(str::trim) {
            None | Some("q" | "quit") => break,
            Some("") => {
                print!("{}", renderer.loading());
                session.refresh_location().await;
            }
            Some(city) => {
                print!("{}", renderer.loading());
                session.search_city(city).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["weatherlens", "show", "--lat", "-33.87", "--lon", "151.21"])
            .expect("should parse");

        let Command::Show { position, city, json } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(position.coordinates(), Some(Coordinates::new(-33.87, 151.21)));
        assert_eq!(city, None);
        assert!(!json);
    }

    #[test]
    fn latitude_requires_longitude() {
        assert!(Cli::try_parse_from(["weatherlens", "show", "--lat", "10"]).is_err());
    }

    #[test]
    fn city_conflicts_with_coordinates() {
        let parsed = Cli::try_parse_from([
            "weatherlens", "show", "--city", "Bern", "--lat", "1", "--lon", "2",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli =
            Cli::try_parse_from(["weatherlens", "dashboard", "--verbose"]).expect("should parse");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Dashboard { .. }));
    }

    #[test]
    fn show_with_city_and_json() {
        let cli = Cli::try_parse_from(["weatherlens", "show", "--city", "New York", "--json"])
            .expect("should parse");
        let Command::Show { city, json, .. } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(city.as_deref(), Some("New York"));
        assert!(json);
    }
}
